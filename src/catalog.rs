//! # Catalog
//!
//! Maps table names to their on-disk relation files and ordered column
//! lists. The catalog is a plain value: build it once at startup with
//! [`Catalog::register`] and pass it by reference to scan construction and
//! the plan builder. There is no ambient global instance.

use eyre::{eyre, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::{ColumnRef, Schema};

#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    file: PathBuf,
    columns: Vec<String>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Schema of this table with every column qualified by `qualifier`
    /// (the scan alias, or the table name when unaliased).
    pub fn schema(&self, qualifier: &str) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|column| ColumnRef::new(qualifier, column))
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, TableDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, table: TableDef) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn table(&self, name: &str) -> Result<&TableDef> {
        self.tables
            .get(name)
            .ok_or_else(|| eyre!("table {name} is not in the catalog"))
    }
}
