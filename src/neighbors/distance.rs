//! Distance metrics between user vectors.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VitrineError};

/// Row count at which batch distance computation switches to rayon.
const PARALLEL_THRESHOLD: usize = 100;

/// Distance metrics for vector similarity calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance (1 - cosine similarity)
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Manhattan (L1) distance
    Manhattan,
    /// Angular distance (arc cosine of the cosine similarity)
    Angular,
    /// Negated dot product (lower is more similar)
    DotProduct,
}

impl DistanceMetric {
    /// Calculate the distance between two vectors using this metric.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(VitrineError::invalid_operation(format!(
                "Vector dimensions must match for distance calculation ({} vs {})",
                a.len(),
                b.len()
            )));
        }

        let result = match self {
            DistanceMetric::Cosine => match cosine_similarity(a, b) {
                Some(cosine) => 1.0 - cosine,
                None => 1.0, // zero vectors are orthogonal to everything
            },
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Angular => match cosine_similarity(a, b) {
                Some(cosine) => cosine.clamp(-1.0, 1.0).acos(),
                None => std::f64::consts::FRAC_PI_2,
            },
            DistanceMetric::DotProduct => -a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<f64>(),
        };

        Ok(result)
    }

    /// Whether the metric satisfies the triangle inequality.
    ///
    /// Only true metrics can be searched with a vantage-point tree.
    pub fn is_true_metric(&self) -> bool {
        matches!(
            self,
            DistanceMetric::Euclidean | DistanceMetric::Manhattan | DistanceMetric::Angular
        )
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Angular => "angular",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse a distance metric from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "manhattan" | "l1" => Ok(DistanceMetric::Manhattan),
            "angular" => Ok(DistanceMetric::Angular),
            "dot_product" | "dot" => Ok(DistanceMetric::DotProduct),
            _ => Err(VitrineError::invalid_operation(format!(
                "Unknown distance metric: {s}"
            ))),
        }
    }

    /// Calculate distance between a query vector and multiple vectors in parallel.
    pub fn batch_distance_parallel(&self, query: &[f64], vectors: &[Vec<f64>]) -> Result<Vec<f64>> {
        if vectors.len() < PARALLEL_THRESHOLD {
            return vectors
                .iter()
                .map(|v| self.distance(query, v))
                .collect::<Result<Vec<_>>>();
        }

        vectors
            .par_iter()
            .map(|v| self.distance(query, v))
            .collect::<Result<Vec<_>>>()
    }
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        None
    } else {
        Some(dot_product / (norm_a * norm_b))
    }
}
