//! Weighted user-item matrix.
//!
//! Each interaction record is scored as a weighted sum of its counters and
//! the scores are pivoted into a dense table with one row per user and one
//! column per product, both in ascending id order. Several records for the
//! same (user, product) pair collapse into the mean of their scores.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use log::debug;

use crate::config::InteractionWeights;
use crate::data::InteractionTable;
use crate::error::{Result, VitrineError};

/// Dense user-by-product engagement matrix.
#[derive(Debug, Clone)]
pub struct UserItemMatrix {
    users: Vec<String>,
    items: Vec<String>,
    user_index: AHashMap<String, usize>,
    item_index: AHashMap<String, usize>,
    /// Row-major, `users.len() * items.len()` cells.
    values: Vec<f64>,
    /// Score of every interaction record, aligned with the source table.
    record_scores: Vec<f64>,
}

/// Score every record of a table with the given weights.
pub fn score_column(table: &InteractionTable, weights: &InteractionWeights) -> Vec<f64> {
    table
        .records()
        .iter()
        .map(|r| weights.score(r.click, r.view, r.favorite, r.purchase))
        .collect()
}

impl UserItemMatrix {
    /// Score and pivot an interaction table.
    pub fn build(table: &InteractionTable, weights: &InteractionWeights) -> Result<Self> {
        let record_scores = score_column(table, weights);

        let users: BTreeSet<&str> = table.records().iter().map(|r| r.user_id.as_str()).collect();
        let items: BTreeSet<&str> = table
            .records()
            .iter()
            .map(|r| r.product_id.as_str())
            .collect();

        if users.is_empty() || items.is_empty() {
            return Err(VitrineError::empty("User-item matrix has no rows or columns"));
        }

        let users: Vec<String> = users.into_iter().map(str::to_string).collect();
        let items: Vec<String> = items.into_iter().map(str::to_string).collect();
        let user_index = index_of(&users);
        let item_index = index_of(&items);

        let width = items.len();
        let mut sums = vec![0.0; users.len() * width];
        let mut counts = vec![0u32; users.len() * width];

        for (record, score) in table.records().iter().zip(&record_scores) {
            let cell = user_index[&record.user_id] * width + item_index[&record.product_id];
            sums[cell] += score;
            counts[cell] += 1;
        }

        let values = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
            .collect();

        debug!(
            "Built user-item matrix with {} users and {} products",
            users.len(),
            items.len()
        );

        Ok(Self {
            users,
            items,
            user_index,
            item_index,
            values,
            record_scores,
        })
    }

    pub fn n_users(&self) -> usize {
        self.users.len()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() || self.items.is_empty()
    }

    /// User ids in row order.
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Product ids in column order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Row position of a user.
    pub fn user_row(&self, user_id: &str) -> Option<usize> {
        self.user_index.get(user_id).copied()
    }

    /// Vector of one user by row position.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        let width = self.items.len();
        self.values.get(row * width..(row + 1) * width)
    }

    /// All row vectors in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
        self.values.chunks_exact(self.items.len().max(1))
    }

    /// Cell value for a (user, product) pair.
    pub fn get(&self, user_id: &str, product_id: &str) -> Option<f64> {
        let row = self.user_index.get(user_id)?;
        let col = self.item_index.get(product_id)?;
        self.values.get(row * self.items.len() + col).copied()
    }

    /// Score of the interaction record at `position` in the source table.
    pub fn record_score(&self, position: usize) -> Option<f64> {
        self.record_scores.get(position).copied()
    }

    /// Nested `user -> product -> score` view of the full matrix.
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.users
            .iter()
            .zip(self.rows())
            .map(|(user, row)| {
                let cells = self.items.iter().cloned().zip(row.iter().copied()).collect();
                (user.clone(), cells)
            })
            .collect()
    }
}

fn index_of(ids: &[String]) -> AHashMap<String, usize> {
    ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect()
}
