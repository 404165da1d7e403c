//! Interaction records and the table that holds them.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::coerce;
use crate::error::{Result, VitrineError};

/// One user's engagement counters for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub user_id: String,
    pub product_id: String,
    pub click: f64,
    pub view: f64,
    pub favorite: f64,
    pub purchase: f64,
    /// Opaque timestamp carried through from the source.
    pub timestamp: String,
}

impl InteractionRecord {
    /// Create a record with all counters at zero.
    pub fn new<U: Into<String>, P: Into<String>>(user_id: U, product_id: P) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            click: 0.0,
            view: 0.0,
            favorite: 0.0,
            purchase: 0.0,
            timestamp: String::new(),
        }
    }

    /// Builder-style setter for a single counter.
    pub fn with(mut self, kind: InteractionKind, value: f64) -> Self {
        *self.counter_mut(kind) = value;
        self
    }

    /// Read one counter.
    pub fn counter(&self, kind: InteractionKind) -> f64 {
        match kind {
            InteractionKind::Click => self.click,
            InteractionKind::View => self.view,
            InteractionKind::Favorite => self.favorite,
            InteractionKind::Purchase => self.purchase,
        }
    }

    fn counter_mut(&mut self, kind: InteractionKind) -> &mut f64 {
        match kind {
            InteractionKind::Click => &mut self.click,
            InteractionKind::View => &mut self.view,
            InteractionKind::Favorite => &mut self.favorite,
            InteractionKind::Purchase => &mut self.purchase,
        }
    }

    /// Coerce a raw JSON entry into a record.
    ///
    /// Returns a description of the problem when the entry has to be skipped.
    pub fn from_json(entry: &Value) -> std::result::Result<Self, String> {
        let Value::Object(fields) = entry else {
            return Err(format!("expected an object, got {entry}"));
        };

        let timestamp = match fields.get("timestamp") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            user_id: coerce::id_string(fields.get("userId")),
            product_id: coerce::id_string(fields.get("productId")),
            click: coerce::counter("click", fields.get("click"))?,
            view: coerce::counter("view", fields.get("view"))?,
            favorite: coerce::counter("favorite", fields.get("favorite"))?,
            purchase: coerce::counter("purchase", fields.get("purchase"))?,
            timestamp,
        })
    }
}

/// The four kinds of implicit engagement signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Click,
    View,
    Favorite,
    Purchase,
}

impl InteractionKind {
    /// Parse an interaction kind from its lowercase name.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "click" => Ok(InteractionKind::Click),
            "view" => Ok(InteractionKind::View),
            "favorite" => Ok(InteractionKind::Favorite),
            "purchase" => Ok(InteractionKind::Purchase),
            _ => Err(VitrineError::invalid_operation(format!(
                "Unknown interaction kind: {s}"
            ))),
        }
    }
}

/// Interaction records in source order.
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    records: Vec<InteractionRecord>,
}

impl InteractionTable {
    /// Create a table from already-typed records.
    pub fn from_records(records: Vec<InteractionRecord>) -> Self {
        Self { records }
    }

    /// Load and normalize interactions from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VitrineError::source_not_found(path));
        }

        let content = fs::read_to_string(path)?;
        let table = Self::parse(&content)?;
        info!(
            "Loaded {} interactions from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse and normalize interactions from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| VitrineError::malformed(format!("Invalid JSON in interactions: {e}")))?;

        let Value::Array(entries) = value else {
            return Err(VitrineError::malformed(
                "Interactions must be a JSON array of objects",
            ));
        };

        if entries.is_empty() {
            return Err(VitrineError::empty("Interactions source is empty"));
        }

        let mut records = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match InteractionRecord::from_json(entry) {
                Ok(record) => records.push(record),
                Err(reason) => warn!("Skipping invalid interaction at index {position}: {reason}"),
            }
        }

        if records.is_empty() {
            return Err(VitrineError::empty("No valid interactions found"));
        }

        let skipped = entries.len() - records.len();
        if skipped > 0 {
            debug!("Kept {} of {} interaction entries", records.len(), entries.len());
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over the records belonging to one user, in table order.
    pub fn records_for_user<'a>(
        &'a self,
        user_id: &'a str,
    ) -> impl Iterator<Item = &'a InteractionRecord> + 'a {
        self.records.iter().filter(move |r| r.user_id == user_id)
    }

    /// Increment one counter for a (user, product) pair.
    ///
    /// The first matching record is updated; a new record is appended when
    /// the pair has never been seen. Returns the updated record.
    pub fn track(
        &mut self,
        user_id: &str,
        product_id: &str,
        kind: InteractionKind,
        timestamp: String,
    ) -> &InteractionRecord {
        let position = match self
            .records
            .iter()
            .position(|r| r.user_id == user_id && r.product_id == product_id)
        {
            Some(position) => position,
            None => {
                self.records.push(InteractionRecord::new(user_id, product_id));
                self.records.len() - 1
            }
        };

        let record = &mut self.records[position];
        *record.counter_mut(kind) += 1.0;
        record.timestamp = timestamp;
        record
    }
}
