//! Product metadata.
//!
//! The catalog is loaded alongside interactions and kept as a read-only
//! lookup table. Scoring and recommendation never consult it.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::coerce;

/// Descriptive metadata for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub brand: String,
}

impl ProductRecord {
    /// Coerce a raw product document.
    ///
    /// The category name is read from the nested `category.nameCategory`
    /// field and is empty when that path does not exist.
    pub fn from_json(entry: &Value) -> Result<Self, String> {
        let Value::Object(fields) = entry else {
            return Err(format!("expected an object, got {entry}"));
        };

        let category = fields
            .get("category")
            .and_then(Value::as_object)
            .and_then(|c| c.get("nameCategory"));

        Ok(Self {
            product_id: coerce::id_string(fields.get("_id")),
            name: coerce::id_string(fields.get("name")),
            category: coerce::id_string(category),
            price: coerce::real("price", fields.get("price"))?,
            brand: coerce::id_string(fields.get("brand")),
        })
    }
}

/// Products keyed by id, in source order.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<ProductRecord>,
    by_id: AHashMap<String, usize>,
}

impl ProductCatalog {
    pub fn from_records(products: Vec<ProductRecord>) -> Self {
        let by_id = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.product_id.clone(), i))
            .collect();
        Self { products, by_id }
    }

    /// Load products from a JSON file.
    ///
    /// Never fails: a missing file, invalid JSON or bad entries are logged and
    /// whatever could be read is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Products file not found: {}", path.display());
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read products file {}: {e}", path.display());
                return Self::default();
            }
        };

        let catalog = Self::parse(&content);
        info!("Loaded {} products from {}", catalog.len(), path.display());
        catalog
    }

    /// Parse products from JSON text, skipping anything malformed.
    pub fn parse(content: &str) -> Self {
        let entries = match serde_json::from_str::<Value>(content) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!("Products source is not a JSON array; ignoring it");
                return Self::default();
            }
            Err(e) => {
                warn!("Invalid JSON in products source: {e}");
                return Self::default();
            }
        };

        let records = entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| match ProductRecord::from_json(entry) {
                Ok(record) => Some(record),
                Err(reason) => {
                    warn!("Skipping invalid product at index {position}: {reason}");
                    None
                }
            })
            .collect();

        Self::from_records(records)
    }

    pub fn get(&self, product_id: &str) -> Option<&ProductRecord> {
        self.by_id.get(product_id).map(|&i| &self.products[i])
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_product_nested_category() {
        let product = ProductRecord::from_json(&json!({
            "_id": "P1",
            "name": "Lamp",
            "category": {"nameCategory": "Lighting"},
            "price": 19.5,
            "brand": "Lumen"
        }))
        .unwrap();
        assert_eq!(product.category, "Lighting");
        assert_eq!(product.price, 19.5);
    }

    #[test]
    fn test_product_missing_category_defaults_empty() {
        let product = ProductRecord::from_json(&json!({"_id": "P2"})).unwrap();
        assert_eq!(product.category, "");
        assert_eq!(product.price, 0.0);

        let product =
            ProductRecord::from_json(&json!({"_id": "P3", "category": "64f0c1"})).unwrap();
        assert_eq!(product.category, "");
    }

    #[test]
    fn test_catalog_parse_is_lenient() {
        let catalog = ProductCatalog::parse(
            r#"[{"_id": "P1", "price": "9.99"}, {"_id": "P2", "price": "free"}, "junk"]"#,
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("P1").unwrap().price, 9.99);
        assert!(catalog.get("P2").is_none());

        assert!(ProductCatalog::parse("{oops").is_empty());
    }

    #[test]
    fn test_catalog_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ProductCatalog::load(dir.path().join("products.json"));
        assert!(catalog.is_empty());
    }
}
