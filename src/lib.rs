//! # Vitrine
//!
//! Neighborhood-based product recommendations for an online store, built from
//! implicit shopper signals (clicks, views, favorites and purchases).
//!
//! ## Features
//!
//! - Tolerant JSON loaders for interaction logs and product catalogs
//! - Weighted user-item matrix with mean aggregation
//! - k-nearest-neighbor user index (brute force or vantage-point tree)
//! - Popularity ranking used for cold start and top-up
//! - Command line interface that always prints a JSON array
//!
//! ## Example
//!
//! ```
//! use vitrine::prelude::*;
//!
//! let table = InteractionTable::from_records(vec![
//!     InteractionRecord::new("U1", "P1").with(InteractionKind::Purchase, 1.0),
//!     InteractionRecord::new("U2", "P1").with(InteractionKind::Click, 2.0),
//!     InteractionRecord::new("U2", "P2").with(InteractionKind::View, 1.0),
//! ]);
//!
//! let mut engine = RecommendationEngine::default();
//! engine.set_interactions(table);
//! engine.build_matrix()?;
//! engine.train()?;
//!
//! assert_eq!(engine.recommend("U1", 1), vec!["P2".to_string()]);
//! # Ok::<(), vitrine::error::VitrineError>(())
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod matrix;
pub mod neighbors;
pub mod popularity;

pub mod prelude {
    pub use crate::config::{EngineConfig, InteractionWeights, NeighborConfig};
    pub use crate::data::{
        InteractionKind, InteractionRecord, InteractionTable, ProductCatalog, ProductRecord,
    };
    pub use crate::engine::{EngineStats, RecommendationEngine};
    pub use crate::error::{Result, VitrineError};
    pub use crate::matrix::UserItemMatrix;
    pub use crate::neighbors::{DistanceMetric, IndexStructure, Neighbor, NeighborIndex};
    pub use crate::popularity::PopularityRanker;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
