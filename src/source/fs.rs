use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::column::{Column, ColumnCatalog};

use super::DataSource;

const LATEST_FILE: &str = "latest";

/// Column definitions stored as one JSON file per column, `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonColumnCatalog {
    dir: PathBuf,
}

impl JsonColumnCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ColumnCatalog for JsonColumnCatalog {
    fn resolve(&self, column_id: &str) -> Result<Column> {
        let path = self.dir.join(format!("{column_id}.json"));
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read column definition {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to decode column definition {}", path.display()))
    }
}

/// Data laid out on disk as
///
/// ```text
/// <root>/<key source>/<record>/<column source>/latest
/// ```
///
/// Every sub-directory of `<root>/<key source>` is one record.
#[derive(Debug, Clone)]
pub struct FsDataSource {
    root: PathBuf,
}

impl FsDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataSource for FsDataSource {
    fn list_records(&self, key_source: &str) -> Result<Vec<String>> {
        let dir = self.root.join(key_source);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to list {}", dir.display()))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            records.push(entry.file_name().to_string_lossy().into_owned());
        }
        records.sort();
        Ok(records)
    }

    fn latest_value(&self, key_source: &str, record: &str, column_source: &str) -> Result<String> {
        let path = self
            .root
            .join(key_source)
            .join(record)
            .join(column_source)
            .join(LATEST_FILE);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read latest file {}", path.display()))?;
        Ok(data.trim_end_matches(['\r', '\n']).to_string())
    }
}
