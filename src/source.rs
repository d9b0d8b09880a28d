//! Data access port: the single seam between the token engine and whatever
//! executes queries.

use crate::data::TableData;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::PathBuf;

/// Executes one query string and returns its tabular result.
///
/// Implementations are injected into the template assembler at call time, so
/// no ambient connection state exists. `execute` must release any per-query
/// resource on every exit path; a failing query must not leak into the next
/// token's execution. Rendering templates concurrently is only safe with one
/// source instance per render, or a source that is itself reentrant.
pub trait DataSource {
    fn execute(&self, query: &str) -> Result<TableData>;
}

/// File-backed source for the CLI and tests: a query names a CSV file
/// (header row required) relative to the source's root directory.
pub struct CsvDataSource {
    root: PathBuf,
}

impl CsvDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for CsvDataSource {
    fn execute(&self, query: &str) -> Result<TableData> {
        let path = self.root.join(query.trim());
        let file = File::open(&path)
            .with_context(|| format!("cannot open query data file {}", path.display()))?;
        TableData::from_csv_reader(file)
            .with_context(|| format!("cannot read query data file {}", path.display()))
    }
}
