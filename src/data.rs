//! Interaction and product data loading.
//!
//! Raw JSON sources are coerced field by field into typed tables. Bad
//! entries are skipped with a warning; only a source that yields no valid
//! interactions at all is an error.

pub mod coerce;
pub mod interaction;
pub mod product;

pub use self::interaction::{InteractionKind, InteractionRecord, InteractionTable};
pub use self::product::{ProductCatalog, ProductRecord};
