use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{Result, TrayScanError};

/// One sellable item as known to the shop
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MenuEntry {
    /// Customer-facing name
    #[serde(alias = "vietnamese_name")]
    pub display_name: String,
    /// Unit price in the shop currency's smallest unit
    pub price: u64,
}

/// Classifier label to menu entry lookup, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    entries: HashMap<String, MenuEntry>,
}

impl PriceBook {
    /// Load a price book from a JSON file mapping labels to menu entries
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TrayScanError::PriceBook(format!(
                "Failed to read price book '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse a price book from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, MenuEntry> = serde_json::from_str(json)
            .map_err(|e| TrayScanError::PriceBook(format!("Failed to parse price book: {}", e)))?;

        Ok(Self { entries })
    }

    /// Resolve a classifier label to a menu entry.
    ///
    /// Unknown labels fall back to a zero-priced "Unknown" entry so one
    /// unrecognized crop never fails a whole checkout.
    pub fn resolve(&self, label: &str) -> MenuEntry {
        self.entries.get(label).cloned().unwrap_or(MenuEntry {
            display_name: "Unknown".to_string(),
            price: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "banh_mi": { "display_name": "Bánh mì", "price": 15000 },
        "muffin": { "display_name": "Muffin", "price": 25000 }
    }"#;

    #[test]
    fn known_label_resolves() {
        let book = PriceBook::from_json(SAMPLE).unwrap();
        assert_eq!(book.len(), 2);

        let entry = book.resolve("muffin");
        assert_eq!(entry.display_name, "Muffin");
        assert_eq!(entry.price, 25000);
    }

    #[test]
    fn unknown_label_falls_back_to_zero_price() {
        let book = PriceBook::from_json(SAMPLE).unwrap();
        let entry = book.resolve("croissant");
        assert_eq!(entry.display_name, "Unknown");
        assert_eq!(entry.price, 0);
    }

    #[test]
    fn legacy_field_name_is_accepted() {
        let book = PriceBook::from_json(
            r#"{ "banh_bao": { "vietnamese_name": "Bánh bao", "price": 20000 } }"#,
        )
        .unwrap();
        assert_eq!(book.resolve("banh_bao").display_name, "Bánh bao");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PriceBook::from_json("{ not json").is_err());
    }
}
