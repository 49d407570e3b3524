//! Loading configuration and table data from disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dwaudit_core::error::AuditError;
use dwaudit_core::{AuditConfig, Result, TableData};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// A `--data` argument: table name and the file holding its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    /// Table name used in the configuration and reports
    pub name: String,
    /// JSON file with the rows
    pub path: PathBuf,
}

impl std::str::FromStr for TableSource {
    type Err = AuditError;

    /// Parses `<table>=<path>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.is_empty() => Ok(Self {
                name: name.trim().to_string(),
                path: PathBuf::from(path),
            }),
            _ => Err(AuditError::configuration(format!(
                "expected <table>=<path>, got '{}'",
                s
            ))),
        }
    }
}

/// Accepted shapes of a data file.
#[derive(Deserialize)]
#[serde(untagged)]
enum DataFile {
    Rows(Vec<Value>),
    Table {
        rows: Vec<Value>,
        #[serde(default)]
        primary_key: Vec<String>,
    },
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AuditError::Io {
            context: format!("Failed to read {}", path.display()),
            source: e,
        })
}

/// Reads a JSON configuration file and validates its settings.
pub async fn load_config(path: &Path) -> Result<AuditConfig> {
    let json = read_file(path).await?;
    let config = AuditConfig::from_json_str(&json)?;
    debug!(
        "Loaded configuration for {} tables from {}",
        config.tables.len(),
        path.display()
    );
    Ok(config)
}

/// Reads one table. The file holds either an array of row objects or an
/// object with `rows` and an optional `primary_key`.
pub async fn load_table(source: &TableSource) -> Result<TableData> {
    let json = read_file(&source.path).await?;
    let file: DataFile =
        serde_json::from_str(&json).map_err(|e| AuditError::Serialization {
            context: format!("Failed to parse rows from {}", source.path.display()),
            source: e,
        })?;

    let table = match file {
        DataFile::Rows(rows) => TableData::new(source.name.clone(), rows),
        DataFile::Table { rows, primary_key } => {
            TableData::new(source.name.clone(), rows).with_primary_key(primary_key)
        }
    };
    info!(
        "Loaded {} rows for table '{}' from {}",
        table.row_count(),
        table.name,
        source.path.display()
    );
    Ok(table)
}

/// Reads every table, rejecting duplicate table names.
pub async fn load_tables(sources: &[TableSource]) -> Result<Vec<TableData>> {
    let mut seen = HashSet::new();
    let mut tables = Vec::with_capacity(sources.len());
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            return Err(AuditError::configuration(format!(
                "table '{}' supplied more than once",
                source.name
            )));
        }
        tables.push(load_table(source).await?);
    }
    Ok(tables)
}
