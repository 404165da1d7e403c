//! Global popularity ranking.
//!
//! Products are ranked by their summed counters across all users, weighted
//! with a fixed scheme. The weights here are deliberately independent of
//! [`InteractionWeights`](crate::config::InteractionWeights) passed to the
//! matrix builder: callers rely on the popularity order staying the same no
//! matter how personalization is tuned.

use std::collections::BTreeMap;

use crate::data::InteractionTable;

/// Fixed popularity weights for click, view, favorite and purchase.
pub const POPULARITY_WEIGHTS: [f64; 4] = [1.0, 2.0, 3.0, 5.0];

/// Summed counters for one product.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopularityStats {
    pub click: f64,
    pub view: f64,
    pub favorite: f64,
    pub purchase: f64,
}

impl PopularityStats {
    pub fn popularity(&self) -> f64 {
        let [wc, wv, wf, wp] = POPULARITY_WEIGHTS;
        self.click * wc + self.view * wv + self.favorite * wf + self.purchase * wp
    }
}

/// Products ordered from most to least popular.
#[derive(Debug, Clone, Default)]
pub struct PopularityRanker {
    ranking: Vec<(String, f64)>,
}

impl PopularityRanker {
    /// Rank every product in the table.
    ///
    /// Ties keep ascending product id order.
    pub fn from_table(table: &InteractionTable) -> Self {
        let mut stats: BTreeMap<&str, PopularityStats> = BTreeMap::new();
        for record in table.records() {
            let entry = stats.entry(record.product_id.as_str()).or_default();
            entry.click += record.click;
            entry.view += record.view;
            entry.favorite += record.favorite;
            entry.purchase += record.purchase;
        }

        let mut ranking: Vec<(String, f64)> = stats
            .into_iter()
            .map(|(id, s)| (id.to_string(), s.popularity()))
            .collect();
        // Stable, so equal scores stay in ascending id order.
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));

        Self { ranking }
    }

    /// The top `n` product ids.
    pub fn top(&self, n: usize) -> Vec<String> {
        self.ranking.iter().take(n).map(|(id, _)| id.clone()).collect()
    }

    /// Every ranked product id with its score, most popular first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ranking.iter().map(|(id, score)| (id.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.ranking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranking.is_empty()
    }
}
