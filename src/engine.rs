//! Recommendation engine.
//!
//! [`RecommendationEngine`] owns the whole pipeline state: the interaction
//! table, the optional product catalog, the weighted user-item matrix and the
//! fitted neighbor index. Each piece is derived from the one before it, and
//! replacing an upstream piece discards everything downstream, so the three
//! are always mutually consistent.
//!
//! Loading, matrix building and training report failures as errors. Queries
//! never fail: any problem on the personalized path falls back to the global
//! popularity ranking.
//!
//! # Example
//!
//! ```
//! use vitrine::data::{InteractionKind, InteractionRecord, InteractionTable};
//! use vitrine::engine::RecommendationEngine;
//!
//! let mut engine = RecommendationEngine::default();
//! engine.set_interactions(InteractionTable::from_records(vec![
//!     InteractionRecord::new("U1", "P1").with(InteractionKind::Purchase, 1.0),
//!     InteractionRecord::new("U2", "P1").with(InteractionKind::Purchase, 1.0),
//!     InteractionRecord::new("U2", "P2").with(InteractionKind::View, 1.0),
//! ]));
//! engine.fit().unwrap();
//!
//! assert_eq!(engine.recommend("U1", 5), vec!["P2"]);
//! assert_eq!(engine.recommend("someone-new", 1), vec!["P1"]);
//! ```

use std::path::Path;

use ahash::AHashSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{EngineConfig, InteractionWeights};
use crate::data::{InteractionKind, InteractionRecord, InteractionTable, ProductCatalog, ProductRecord};
use crate::error::{Result, VitrineError};
use crate::matrix::UserItemMatrix;
use crate::neighbors::{DistanceMetric, IndexStructure, NeighborIndex};
use crate::popularity::PopularityRanker;

/// Owner of the recommendation pipeline state.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: EngineConfig,
    interactions: Option<InteractionTable>,
    popularity: Option<PopularityRanker>,
    products: Option<ProductCatalog>,
    matrix: Option<UserItemMatrix>,
    index: Option<NeighborIndex>,
}

/// Snapshot of the engine state sizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub interactions: usize,
    pub users: usize,
    pub products: usize,
    pub catalog_products: usize,
    pub trained: bool,
    pub n_neighbors: Option<usize>,
    pub metric: Option<&'static str>,
    pub structure: Option<&'static str>,
}

impl RecommendationEngine {
    /// Create an empty engine.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load interactions, and optionally products, from JSON files.
    ///
    /// Only the interactions source can make this fail. On success any
    /// previously built matrix and index are discarded.
    pub fn load<P: AsRef<Path>>(&mut self, interactions: P, products: Option<&Path>) -> Result<()> {
        let table = InteractionTable::load(interactions)?;
        let catalog = products.map(ProductCatalog::load);

        self.set_interactions(table);
        self.products = catalog;
        Ok(())
    }

    /// Replace the interaction table.
    pub fn set_interactions(&mut self, table: InteractionTable) {
        self.popularity = Some(PopularityRanker::from_table(&table));
        self.interactions = Some(table);
        self.invalidate_matrix();
    }

    /// Replace the product catalog.
    pub fn set_products(&mut self, catalog: ProductCatalog) {
        self.products = Some(catalog);
    }

    /// Build the user-item matrix with the configured weights.
    pub fn build_matrix(&mut self) -> Result<()> {
        let weights = self.config.weights;
        self.build_matrix_with(&weights)
    }

    /// Build the user-item matrix with explicit weights.
    pub fn build_matrix_with(&mut self, weights: &InteractionWeights) -> Result<()> {
        let table = self
            .interactions
            .as_ref()
            .ok_or_else(|| VitrineError::empty("No interaction data loaded"))?;

        let matrix = UserItemMatrix::build(table, weights)?;
        info!(
            "Created user-item matrix: {} users x {} products",
            matrix.n_users(),
            matrix.n_items()
        );

        self.index = None;
        self.matrix = Some(matrix);
        Ok(())
    }

    /// Train the neighbor index with the configured settings.
    pub fn train(&mut self) -> Result<()> {
        let neighbors = self.config.neighbors;
        self.train_with(neighbors.n_neighbors, neighbors.metric, neighbors.structure)
    }

    /// Train the neighbor index with explicit settings.
    pub fn train_with(
        &mut self,
        n_neighbors: usize,
        metric: DistanceMetric,
        structure: IndexStructure,
    ) -> Result<()> {
        let matrix = self
            .matrix
            .as_ref()
            .ok_or_else(|| VitrineError::invalid_operation("User-item matrix not created"))?;

        self.index = Some(NeighborIndex::fit(matrix, n_neighbors, metric, structure)?);
        Ok(())
    }

    /// Build the matrix and train the index with the configured settings.
    pub fn fit(&mut self) -> Result<()> {
        self.build_matrix()?;
        self.train()
    }

    pub fn is_trained(&self) -> bool {
        self.matrix.is_some() && self.index.is_some()
    }

    /// Personalized recommendations for one user.
    ///
    /// Returns at most `n` distinct product ids the user has never interacted
    /// with, drawn from the nearest users and topped up from the popularity
    /// ranking. Unknown users get the popularity ranking directly.
    pub fn recommend(&self, user_id: &str, n: usize) -> Vec<String> {
        self.recommend_with_exclusions(user_id, n, &[])
    }

    /// Like [`recommend`](Self::recommend), additionally never returning any
    /// product in `extra`.
    pub fn recommend_with_exclusions(&self, user_id: &str, n: usize, extra: &[String]) -> Vec<String> {
        let extra: AHashSet<&str> = extra.iter().map(String::as_str).collect();

        let (Some(table), Some(matrix), Some(index)) =
            (&self.interactions, &self.matrix, &self.index)
        else {
            warn!("Model not trained or user-item matrix not created; using popular products");
            return self.popular_excluding(n, &extra);
        };

        if matrix.user_row(user_id).is_none() {
            info!(
                "{}; using popular products",
                VitrineError::UnknownUser(user_id.to_string())
            );
            return self.popular_excluding(n, &extra);
        }

        match self.personalized(user_id, n, &extra, table, matrix, index) {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!("Error getting recommendations for user {user_id}: {e}");
                self.popular_excluding(n, &extra)
            }
        }
    }

    /// Recommendations for many users at once, in input order.
    pub fn recommend_many<S: AsRef<str> + Sync>(&self, user_ids: &[S], n: usize) -> Vec<Vec<String>> {
        user_ids
            .par_iter()
            .map(|user_id| self.recommend(user_id.as_ref(), n))
            .collect()
    }

    /// The `n` most popular products across all users.
    pub fn popular(&self, n: usize) -> Vec<String> {
        match &self.popularity {
            Some(ranker) => ranker.top(n),
            None => {
                warn!("No interaction data available for popular products");
                Vec::new()
            }
        }
    }

    fn popular_excluding(&self, n: usize, excluded: &AHashSet<&str>) -> Vec<String> {
        if excluded.is_empty() {
            return self.popular(n);
        }
        self.popularity
            .iter()
            .flat_map(|ranker| ranker.iter())
            .filter(|(id, _)| !excluded.contains(id))
            .take(n)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn personalized<'a>(
        &'a self,
        user_id: &str,
        n: usize,
        extra: &AHashSet<&'a str>,
        table: &'a InteractionTable,
        matrix: &'a UserItemMatrix,
        index: &NeighborIndex,
    ) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        if index.len() != matrix.n_users() {
            return Err(VitrineError::computation(format!(
                "Index holds {} users but the matrix has {}",
                index.len(),
                matrix.n_users()
            )));
        }

        let row = matrix
            .user_row(user_id)
            .ok_or_else(|| VitrineError::UnknownUser(user_id.to_string()))?;
        let neighbors = index.kneighbors_of_row(row, n.saturating_add(1).min(matrix.n_users()))?;

        let mut excluded: AHashSet<&str> = table
            .records_for_user(user_id)
            .map(|r| r.product_id.as_str())
            .collect();
        excluded.extend(extra.iter().copied());

        let mut recommendations: Vec<String> = Vec::with_capacity(n.min(matrix.n_items()));
        let mut chosen: AHashSet<&str> = AHashSet::new();

        for neighbor in neighbors.iter().skip(1) {
            if recommendations.len() >= n {
                break;
            }
            let neighbor_id = matrix.users().get(neighbor.row).ok_or_else(|| {
                VitrineError::computation(format!("Neighbor row {} has no user", neighbor.row))
            })?;

            for product in self.products_by_score(table, matrix, neighbor_id)? {
                if recommendations.len() >= n {
                    break;
                }
                if !excluded.contains(product) && chosen.insert(product) {
                    recommendations.push(product.to_string());
                }
            }
        }

        if recommendations.len() < n
            && let Some(ranker) = &self.popularity
        {
            for (product, _) in ranker.iter() {
                if recommendations.len() >= n {
                    break;
                }
                if !excluded.contains(product) && chosen.insert(product) {
                    recommendations.push(product.to_string());
                }
            }
        }

        recommendations.truncate(n);
        debug!(
            "Recommended {} products for user {user_id} from {} neighbors",
            recommendations.len(),
            neighbors.len().saturating_sub(1)
        );
        Ok(recommendations)
    }

    /// A user's products by descending record score, first occurrence kept.
    fn products_by_score<'a>(
        &self,
        table: &'a InteractionTable,
        matrix: &UserItemMatrix,
        user_id: &str,
    ) -> Result<Vec<&'a str>> {
        let mut scored = Vec::new();
        for (position, record) in table.records().iter().enumerate() {
            if record.user_id != user_id {
                continue;
            }
            let score = matrix.record_score(position).ok_or_else(|| {
                VitrineError::computation(format!("No score for interaction {position}"))
            })?;
            scored.push((record.product_id.as_str(), score));
        }

        // Stable: equal scores keep table order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut seen = AHashSet::new();
        Ok(scored
            .into_iter()
            .filter_map(|(product, _)| seen.insert(product).then_some(product))
            .collect())
    }

    /// Record one more interaction of `kind` between a user and a product.
    ///
    /// The matrix and index are discarded and must be rebuilt.
    pub fn track_interaction(
        &mut self,
        user_id: &str,
        product_id: &str,
        kind: InteractionKind,
    ) -> InteractionRecord {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let table = self.interactions.get_or_insert_with(InteractionTable::default);
        let record = table.track(user_id, product_id, kind, timestamp).clone();

        self.popularity = Some(PopularityRanker::from_table(table));
        self.invalidate_matrix();
        debug!("Tracked {kind:?} for user {user_id} on product {product_id}");
        record
    }

    /// Persist the engine.
    ///
    /// State lives for the process lifetime only, so this does nothing.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        debug!(
            "save({}) is a no-op; engine state is not persisted",
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn interactions(&self) -> Option<&InteractionTable> {
        self.interactions.as_ref()
    }

    pub fn matrix(&self) -> Option<&UserItemMatrix> {
        self.matrix.as_ref()
    }

    pub fn index(&self) -> Option<&NeighborIndex> {
        self.index.as_ref()
    }

    pub fn products(&self) -> Option<&ProductCatalog> {
        self.products.as_ref()
    }

    /// Look up one product in the catalog.
    pub fn product(&self, product_id: &str) -> Option<&ProductRecord> {
        self.products.as_ref()?.get(product_id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            interactions: self.interactions.as_ref().map_or(0, InteractionTable::len),
            users: self.matrix.as_ref().map_or(0, UserItemMatrix::n_users),
            products: self.matrix.as_ref().map_or(0, UserItemMatrix::n_items),
            catalog_products: self.products.as_ref().map_or(0, ProductCatalog::len),
            trained: self.is_trained(),
            n_neighbors: self.index.as_ref().map(NeighborIndex::n_neighbors),
            metric: self.index.as_ref().map(|i| i.metric().name()),
            structure: self.index.as_ref().map(|i| i.structure().name()),
        }
    }

    fn invalidate_matrix(&mut self) {
        self.matrix = None;
        self.index = None;
    }
}
