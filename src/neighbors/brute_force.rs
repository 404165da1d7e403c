//! Exhaustive nearest-neighbor search.

use crate::error::Result;
use crate::neighbors::Neighbor;
use crate::neighbors::distance::DistanceMetric;

/// Compares the query against every stored vector.
#[derive(Debug, Clone)]
pub struct BruteForceSearcher {
    points: Vec<Vec<f64>>,
    metric: DistanceMetric,
}

impl BruteForceSearcher {
    pub fn new(points: Vec<Vec<f64>>, metric: DistanceMetric) -> Self {
        Self { points, metric }
    }

    pub fn points(&self) -> &[Vec<f64>] {
        &self.points
    }

    /// The `k` nearest rows to `query`, skipping `exclude`.
    pub fn search(&self, query: &[f64], k: usize, exclude: Option<usize>) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let distances = self.metric.batch_distance_parallel(query, &self.points)?;
        let mut neighbors: Vec<Neighbor> = distances
            .into_iter()
            .enumerate()
            .filter(|(row, _)| Some(*row) != exclude)
            .map(|(row, distance)| Neighbor { row, distance })
            .collect();

        if neighbors.len() > k {
            neighbors.select_nth_unstable_by(k - 1, Neighbor::cmp_by_distance);
            neighbors.truncate(k);
        }
        neighbors.sort_by(Neighbor::cmp_by_distance);

        Ok(neighbors)
    }
}
