use anyhow::Result;
use serde::Deserialize;

pub const DEFAULT_COLUMN_WIDTH: u16 = 10;

fn default_width() -> u16 {
    DEFAULT_COLUMN_WIDTH
}

/// A column that can be added to a dynamic table.
///
/// `id` is globally unique across every column definition and is only used
/// to look the column up. `source` tells the data source where the values of
/// this column live; for the key column it names the record set itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub desc: String,
    #[serde(rename = "iskey", default)]
    pub is_key: bool,
    #[serde(rename = "name")]
    pub header: String,
    pub source: String,
    #[serde(default = "default_width")]
    pub width: u16,
}

/// Resolves a column id into its full definition.
pub trait ColumnCatalog {
    fn resolve(&self, column_id: &str) -> Result<Column>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_definition_with_default_width() {
        let json = r#"{
            "desc": "Ticker symbol",
            "id": "symbol",
            "name": "SYMBOL",
            "source": "stocks",
            "iskey": true
        }"#;
        let col: Column = serde_json::from_str(json).unwrap();
        assert_eq!(col.id, "symbol");
        assert_eq!(col.header, "SYMBOL");
        assert_eq!(col.source, "stocks");
        assert!(col.is_key);
        assert_eq!(col.width, DEFAULT_COLUMN_WIDTH);
    }

    #[test]
    fn parse_definition_with_explicit_width() {
        let json = r#"{"id": "price", "name": "PRICE", "source": "ltp", "width": 12}"#;
        let col: Column = serde_json::from_str(json).unwrap();
        assert!(!col.is_key);
        assert!(col.desc.is_empty());
        assert_eq!(col.width, 12);
    }

    #[test]
    fn parse_definition_missing_source_fails() {
        let json = r#"{"id": "price", "name": "PRICE"}"#;
        assert!(serde_json::from_str::<Column>(json).is_err());
    }
}
