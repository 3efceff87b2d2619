//! # Schema
//!
//! An operator's output schema: an immutable, ordered list of column
//! descriptors. Each [`ColumnRef`] carries both a table qualifier (the alias
//! the table was scanned under, or its name when unaliased) and a column
//! name. Two columns are the *same* column only when both parts match; this
//! is what keeps self-joins and repeated table names unambiguous after join
//! schemas are concatenated.
//!
//! Schemas exist to turn a column reference into a positional index exactly
//! once, at operator construction. After that, execution is purely
//! positional.

use eyre::{eyre, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<ColumnRef>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnRef>) -> Self {
        Self { columns }
    }

    /// Schema with every column qualified by `qualifier`.
    pub fn qualified(qualifier: &str, columns: &[&str]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|name| ColumnRef::new(qualifier, *name))
                .collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[inline]
    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, index: usize) -> &ColumnRef {
        &self.columns[index]
    }

    /// Position of `column`, requiring qualifier and name to both match.
    pub fn index_of(&self, column: &ColumnRef) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.table == column.table && c.column == column.column)
    }

    /// Like [`Schema::index_of`], but a missing column is a schema fault.
    pub fn resolve(&self, column: &ColumnRef) -> Result<usize> {
        self.index_of(column)
            .ok_or_else(|| eyre!("column {} not found in schema [{}]", column, self))
    }

    /// Combined schema for a join: `self`'s columns followed by `other`'s,
    /// each keeping its own qualifier.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut columns = Vec::with_capacity(self.columns.len() + other.columns.len());
        columns.extend_from_slice(&self.columns);
        columns.extend_from_slice(&other.columns);
        Schema { columns }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{column}")?;
        }
        Ok(())
    }
}
