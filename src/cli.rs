use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

pub const DEFAULT_REFRESH_SECS: u64 = 2;

pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join("stormdash")
}

#[derive(Parser)]
#[command(
    name = "stormdash",
    version,
    about = "Terminal dashboard of stackable table windows"
)]
pub struct Cli {
    /// Seconds between refreshes when there is no input
    #[arg(long, global = true, default_value_t = DEFAULT_REFRESH_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_secs: u64,

    /// Directory for the rolling log file
    #[arg(long, global = true, env = "STORMDASH_LOG_DIR", default_value_os_t = default_log_dir())]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Show a few static tables and a clock
    Demo,

    /// Show live tables backed by a data directory
    Watch {
        /// Directory of JSON column definitions (<id>.json)
        #[arg(long, env = "STORMDASH_COLUMNS_DIR")]
        columns_dir: PathBuf,

        /// Root of the data tree (<key>/<record>/<column>/latest)
        #[arg(long, env = "STORMDASH_DATA_DIR")]
        data_dir: PathBuf,

        /// Table to show, as NAME=KEY_COLUMN[,COLUMN...]; may be repeated
        #[arg(long = "table", required = true)]
        tables: Vec<TableSpec>,
    },
}

/// A table named on the command line together with its column ids, key
/// column first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<String>,
}

impl FromStr for TableSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, columns) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=COLUMN[,COLUMN...], got '{s}'"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing table name in '{s}'"));
        }

        let columns: Vec<String> = columns
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        if columns.is_empty() {
            return Err(format!("table '{name}' has no columns"));
        }

        Ok(Self {
            name: name.to_string(),
            columns,
        })
    }
}
