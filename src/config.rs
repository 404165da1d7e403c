//! Engine configuration.
//!
//! Every stage of the pipeline reads its knobs from [`EngineConfig`], which
//! can be built in code, deserialized from a JSON file, or overridden field
//! by field from the command line.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VitrineError};
use crate::neighbors::{DistanceMetric, IndexStructure};

/// Weights applied to each engagement counter when scoring an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionWeights {
    pub click: f64,
    pub view: f64,
    pub favorite: f64,
    pub purchase: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            click: 1.0,
            view: 2.0,
            favorite: 3.0,
            purchase: 5.0,
        }
    }
}

impl InteractionWeights {
    /// Names of the four counters, in scoring order.
    pub const FIELDS: [&'static str; 4] = ["click", "view", "favorite", "purchase"];

    /// Build weights from a name-to-value map.
    ///
    /// All four counters must be present; unknown names are rejected.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        if let Some(unknown) = map.keys().find(|k| !Self::FIELDS.contains(&k.as_str())) {
            return Err(VitrineError::malformed(format!(
                "Unknown interaction weight: {unknown}"
            )));
        }

        let get = |field: &str| {
            map.get(field)
                .copied()
                .ok_or_else(|| VitrineError::missing_field(format!("weights.{field}")))
        };

        Ok(Self {
            click: get("click")?,
            view: get("view")?,
            favorite: get("favorite")?,
            purchase: get("purchase")?,
        })
    }

    /// Parse a `click=1,view=2,favorite=3,purchase=5` specification.
    pub fn parse_spec(spec: &str) -> Result<Self> {
        let mut map = HashMap::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                VitrineError::malformed(format!("Expected name=value in weight spec, got '{pair}'"))
            })?;
            let value: f64 = value.trim().parse().map_err(|_| {
                VitrineError::malformed(format!("Weight '{}' is not a number", name.trim()))
            })?;
            map.insert(name.trim().to_lowercase(), value);
        }
        Self::from_map(&map)
    }

    /// Weighted engagement score for one set of counters.
    pub fn score(&self, click: f64, view: f64, favorite: f64, purchase: f64) -> f64 {
        click * self.click + view * self.view + favorite * self.favorite + purchase * self.purchase
    }
}

/// Settings for the user neighbor index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    /// Requested neighbor count, lowered at training time for small datasets.
    pub n_neighbors: usize,
    /// Distance metric between user vectors.
    pub metric: DistanceMetric,
    /// Search structure fitted over the user vectors.
    pub structure: IndexStructure,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Cosine,
            structure: IndexStructure::Auto,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Matrix scoring weights.
    pub weights: InteractionWeights,
    /// Neighbor index settings.
    pub neighbors: NeighborConfig,
    /// Default number of recommendations.
    pub recommendations: RecommendationDefaults,
}

/// Defaults for recommendation queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationDefaults {
    pub limit: usize,
}

impl Default for RecommendationDefaults {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VitrineError::source_not_found(path));
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| VitrineError::malformed(format!("Invalid config {}: {e}", path.display())))
    }
}
