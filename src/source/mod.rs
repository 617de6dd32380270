pub mod fs;

use anyhow::Result;

/// Supplies the values of dynamic tables.
///
/// A record set is named by the key column's source. Each record in it has
/// one latest value per non-key column source.
pub trait DataSource {
    /// Keys of every record in `key_source`, in the order they should be listed.
    fn list_records(&self, key_source: &str) -> Result<Vec<String>>;

    fn latest_value(&self, key_source: &str, record: &str, column_source: &str) -> Result<String>;
}
