//! # In-Memory Sort
//!
//! Buffers the whole child output, sorts it once with a comparator built
//! from the ordered sort-key list, then serves tuples from a cursor. Keys
//! are compared left to right; a tie on one key falls through to the next.
//! The underlying sort is stable, so tuples equal on every key keep their
//! input order.
//!
//! `reset` rewinds the cursor over the retained buffer, so the full sorted
//! sequence is reproducible without re-pulling the child.

use eyre::Result;
use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::exec::Operator;
use crate::types::{ColumnRef, Schema, Tuple};

/// One requested sort key, by column reference (plan level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: ColumnRef,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: ColumnRef) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// One resolved sort key, by tuple position (execution level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub index: usize,
    pub descending: bool,
}

/// Resolve plan-level sort specs against a schema; missing columns are
/// schema faults.
pub fn resolve_sort_keys(specs: &[SortSpec], schema: &Schema) -> Result<SmallVec<[SortKey; 4]>> {
    specs
        .iter()
        .map(|spec| {
            Ok(SortKey {
                index: schema.resolve(&spec.column)?,
                descending: spec.descending,
            })
        })
        .collect()
}

/// Comparator over the ordered key list; ties fall through to the next key.
pub fn compare_by_keys(a: &Tuple, b: &Tuple, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let cmp = a.value(key.index).cmp(&b.value(key.index));
        if cmp != Ordering::Equal {
            return if key.descending { cmp.reverse() } else { cmp };
        }
    }
    Ordering::Equal
}

pub struct Sort {
    child: Box<dyn Operator>,
    schema: Schema,
    keys: SmallVec<[SortKey; 4]>,
    rows: Vec<Tuple>,
    cursor: usize,
    materialized: bool,
}

impl Sort {
    pub fn new(child: Box<dyn Operator>, specs: &[SortSpec]) -> Result<Self> {
        let schema = child.schema().clone();
        let keys = resolve_sort_keys(specs, &schema)?;
        Ok(Self {
            child,
            schema,
            keys,
            rows: Vec::new(),
            cursor: 0,
            materialized: false,
        })
    }
}

impl Operator for Sort {
    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.materialized {
            while let Some(tuple) = self.child.next()? {
                self.rows.push(tuple);
            }
            let keys = &self.keys;
            self.rows.sort_by(|a, b| compare_by_keys(a, b, keys));
            self.materialized = true;
        }

        if self.cursor < self.rows.len() {
            let tuple = self.rows[self.cursor].clone();
            self.cursor += 1;
            Ok(Some(tuple))
        } else {
            Ok(None)
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
