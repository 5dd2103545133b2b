//! Catalog source collaborator / 目录数据源协作方
//!
//! The core only needs `load_all`; whether rows come from a spreadsheet
//! export, CSV or a database is outside this crate. An unreadable source is a
//! hard [`LoadError`] to the caller, never retried here.

use std::path::{Path, PathBuf};

use crate::catalog::entry::RawRow;
use crate::error::LoadError;

/// External supplier of catalog rows / 目录行的外部提供方
pub trait CatalogSource: Send + Sync {
    fn load_all(&self) -> Result<Vec<RawRow>, LoadError>;
}

/// JSON file source - one array of row objects / JSON 文件数据源
///
/// The deployment script converts the maintained spreadsheet into this file;
/// the bot itself never touches the spreadsheet.
pub struct JsonCatalogSource {
    path: PathBuf,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonCatalogSource {
    fn load_all(&self) -> Result<Vec<RawRow>, LoadError> {
        if !self.path.exists() {
            return Err(LoadError::NotFound(self.path.display().to_string()));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let rows: Vec<RawRow> =
            serde_json::from_str(&content).map_err(|e| LoadError::Parse(e.to_string()))?;
        Ok(rows)
    }
}

/// Fixed in-memory source / 固定内存数据源
///
/// Used by tests and by embedded deployments that assemble rows elsewhere.
pub struct StaticSource {
    rows: Vec<RawRow>,
}

impl StaticSource {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }
}

impl CatalogSource for StaticSource {
    fn load_all(&self) -> Result<Vec<RawRow>, LoadError> {
        Ok(self.rows.clone())
    }
}
