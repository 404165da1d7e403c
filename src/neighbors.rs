//! Nearest-neighbor index over user vectors.
//!
//! The index is fitted once over every row of a [`UserItemMatrix`] and is
//! never updated in place; any change to the matrix requires a full retrain.
//! Both search structures are exact, so they differ only in speed.
//!
//! # Example
//!
//! ```
//! use vitrine::config::InteractionWeights;
//! use vitrine::data::{InteractionKind, InteractionRecord, InteractionTable};
//! use vitrine::matrix::UserItemMatrix;
//! use vitrine::neighbors::{DistanceMetric, IndexStructure, NeighborIndex};
//!
//! let table = InteractionTable::from_records(vec![
//!     InteractionRecord::new("U1", "P1").with(InteractionKind::Click, 1.0),
//!     InteractionRecord::new("U2", "P1").with(InteractionKind::Click, 2.0),
//!     InteractionRecord::new("U3", "P2").with(InteractionKind::Click, 1.0),
//! ]);
//! let matrix = UserItemMatrix::build(&table, &InteractionWeights::default()).unwrap();
//! let index = NeighborIndex::fit(&matrix, 5, DistanceMetric::Cosine, IndexStructure::Auto).unwrap();
//!
//! assert_eq!(index.n_neighbors(), 2);
//! let nearest = index.kneighbors_of_row(0, 2).unwrap();
//! assert_eq!(nearest[0].row, 0);
//! assert_eq!(nearest[1].row, 1);
//! ```

pub mod brute_force;
pub mod distance;
pub mod vp_tree;

use std::cmp::Ordering;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub use self::brute_force::BruteForceSearcher;
pub use self::distance::DistanceMetric;
pub use self::vp_tree::VpTreeSearcher;

use crate::error::{Result, VitrineError};
use crate::matrix::UserItemMatrix;

/// Row count from which `Auto` prefers a vantage-point tree.
const VP_TREE_MIN_ROWS: usize = 32;

/// One search hit: a matrix row and its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

impl Neighbor {
    /// Ascending distance, ties broken by ascending row.
    pub fn cmp_by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.row.cmp(&b.row))
    }
}

/// Search structure fitted over the user vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexStructure {
    /// Pick a structure from the metric and the row count.
    #[default]
    Auto,
    /// Compare against every row.
    BruteForce,
    /// Vantage-point tree; true metrics only.
    VpTree,
}

impl IndexStructure {
    pub fn name(&self) -> &'static str {
        match self {
            IndexStructure::Auto => "auto",
            IndexStructure::BruteForce => "brute_force",
            IndexStructure::VpTree => "vp_tree",
        }
    }

    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(IndexStructure::Auto),
            "brute_force" | "brute" => Ok(IndexStructure::BruteForce),
            "vp_tree" | "tree" => Ok(IndexStructure::VpTree),
            _ => Err(VitrineError::invalid_operation(format!(
                "Unknown index structure: {s}"
            ))),
        }
    }

    /// Resolve `Auto` into a concrete structure.
    pub fn resolve(self, metric: DistanceMetric, rows: usize) -> Self {
        match self {
            IndexStructure::Auto if metric.is_true_metric() && rows >= VP_TREE_MIN_ROWS => {
                IndexStructure::VpTree
            }
            IndexStructure::Auto => IndexStructure::BruteForce,
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
enum Searcher {
    BruteForce(BruteForceSearcher),
    VpTree(VpTreeSearcher),
}

impl Searcher {
    fn points(&self) -> &[Vec<f64>] {
        match self {
            Searcher::BruteForce(s) => s.points(),
            Searcher::VpTree(s) => s.points(),
        }
    }

    fn search(&self, query: &[f64], k: usize, exclude: Option<usize>) -> Result<Vec<Neighbor>> {
        match self {
            Searcher::BruteForce(s) => s.search(query, k, exclude),
            Searcher::VpTree(s) => s.search(query, k, exclude),
        }
    }
}

/// A fitted k-nearest-neighbor index over matrix rows.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    metric: DistanceMetric,
    structure: IndexStructure,
    n_neighbors: usize,
    dimension: usize,
    searcher: Searcher,
}

impl NeighborIndex {
    /// Fit an index over every row of `matrix`.
    ///
    /// When the matrix has no more users than `n_neighbors`, the neighbor
    /// count is lowered to `max(1, users - 1)`.
    pub fn fit(
        matrix: &UserItemMatrix,
        n_neighbors: usize,
        metric: DistanceMetric,
        structure: IndexStructure,
    ) -> Result<Self> {
        if matrix.is_empty() {
            return Err(VitrineError::invalid_operation(
                "User-item matrix is empty; nothing to train on",
            ));
        }

        let users = matrix.n_users();
        let mut n_neighbors = n_neighbors;
        if users <= n_neighbors {
            let adjusted = users.saturating_sub(1).max(1);
            warn!(
                "{}; adjusted n_neighbors to {adjusted}",
                VitrineError::InsufficientUsers {
                    requested: n_neighbors,
                    available: users,
                }
            );
            n_neighbors = adjusted;
        }

        let points: Vec<Vec<f64>> = matrix.rows().map(<[f64]>::to_vec).collect();
        let structure = structure.resolve(metric, users);
        let searcher = match structure {
            IndexStructure::VpTree => Searcher::VpTree(VpTreeSearcher::build(points, metric)?),
            _ => Searcher::BruteForce(BruteForceSearcher::new(points, metric)),
        };

        debug!(
            "Fitted {} index over {users} users ({} dims, metric={}, k={n_neighbors})",
            structure.name(),
            matrix.n_items(),
            metric.name()
        );

        Ok(Self {
            metric,
            structure,
            n_neighbors,
            dimension: matrix.n_items(),
            searcher,
        })
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The resolved search structure.
    pub fn structure(&self) -> IndexStructure {
        self.structure
    }

    /// Effective neighbor count after adjustment.
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.searcher.points().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest rows to an arbitrary query vector, or the fitted
    /// neighbor count when `k` is `None`.
    pub fn kneighbors(&self, query: &[f64], k: Option<usize>) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(VitrineError::computation(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimension
            )));
        }
        let k = k.unwrap_or(self.n_neighbors).min(self.len());
        self.searcher.search(query, k, None)
    }

    /// The row itself followed by its `k - 1` nearest other rows.
    pub fn kneighbors_of_row(&self, row: usize, k: usize) -> Result<Vec<Neighbor>> {
        let query = self.searcher.points().get(row).ok_or_else(|| {
            VitrineError::computation(format!("Row {row} is not in the index ({} rows)", self.len()))
        })?;
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors = Vec::with_capacity(k);
        neighbors.push(Neighbor {
            row,
            distance: self.metric.distance(query, query)?,
        });
        neighbors.extend(self.searcher.search(query, k - 1, Some(row))?);
        Ok(neighbors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionWeights;
    use crate::data::{InteractionKind, InteractionRecord, InteractionTable};

    fn matrix(records: Vec<InteractionRecord>) -> UserItemMatrix {
        UserItemMatrix::build(
            &InteractionTable::from_records(records),
            &InteractionWeights::default(),
        )
        .unwrap()
    }

    fn click(user: &str, product: &str, n: f64) -> InteractionRecord {
        InteractionRecord::new(user, product).with(InteractionKind::Click, n)
    }

    #[test]
    fn test_neighbor_count_adjustment() {
        let m = matrix(vec![click("U1", "P1", 1.0), click("U2", "P2", 1.0), click("U3", "P1", 1.0)]);
        let index = NeighborIndex::fit(&m, 5, DistanceMetric::Cosine, IndexStructure::Auto).unwrap();
        assert_eq!(index.n_neighbors(), 2);

        let index = NeighborIndex::fit(&m, 3, DistanceMetric::Cosine, IndexStructure::Auto).unwrap();
        assert_eq!(index.n_neighbors(), 2);

        let index = NeighborIndex::fit(&m, 2, DistanceMetric::Cosine, IndexStructure::Auto).unwrap();
        assert_eq!(index.n_neighbors(), 2);
    }

    #[test]
    fn test_single_user_keeps_one_neighbor() {
        let m = matrix(vec![click("U1", "P1", 1.0)]);
        let index = NeighborIndex::fit(&m, 5, DistanceMetric::Cosine, IndexStructure::Auto).unwrap();
        assert_eq!(index.n_neighbors(), 1);
        let hits = index.kneighbors_of_row(0, 2).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row, 0);
    }

    #[test]
    fn test_kneighbors_of_row_puts_self_first() {
        // U1 and U2 have identical vectors.
        let m = matrix(vec![click("U1", "P1", 1.0), click("U2", "P1", 1.0), click("U3", "P2", 1.0)]);
        let index = NeighborIndex::fit(&m, 5, DistanceMetric::Cosine, IndexStructure::BruteForce)
            .unwrap();

        let hits = index.kneighbors_of_row(1, 3).unwrap();
        let rows: Vec<usize> = hits.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![1, 0, 2]);
    }

    #[test]
    fn test_kneighbors_defaults_to_fitted_k() {
        let m = matrix(vec![
            click("U1", "P1", 1.0),
            click("U2", "P1", 2.0),
            click("U3", "P2", 1.0),
            click("U4", "P2", 3.0),
        ]);
        let index = NeighborIndex::fit(&m, 2, DistanceMetric::Euclidean, IndexStructure::Auto).unwrap();
        assert_eq!(index.structure(), IndexStructure::BruteForce);

        let hits = index.kneighbors(&[1.0, 0.0], None).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].row, 0);

        assert!(matches!(
            index.kneighbors(&[1.0], None),
            Err(VitrineError::ComputationFailure(_))
        ));
    }

    #[test]
    fn test_structure_resolution() {
        assert_eq!(
            IndexStructure::Auto.resolve(DistanceMetric::Cosine, 1000),
            IndexStructure::BruteForce
        );
        assert_eq!(
            IndexStructure::Auto.resolve(DistanceMetric::Euclidean, 1000),
            IndexStructure::VpTree
        );
        assert_eq!(
            IndexStructure::Auto.resolve(DistanceMetric::Euclidean, 3),
            IndexStructure::BruteForce
        );
        assert_eq!(IndexStructure::parse_str("vp-tree").unwrap(), IndexStructure::VpTree);
    }

    #[test]
    fn test_vp_tree_with_cosine_is_rejected() {
        let m = matrix(vec![click("U1", "P1", 1.0), click("U2", "P2", 1.0)]);
        let result = NeighborIndex::fit(&m, 1, DistanceMetric::Cosine, IndexStructure::VpTree);
        assert!(matches!(result, Err(VitrineError::InvalidOperation(_))));
    }
}
