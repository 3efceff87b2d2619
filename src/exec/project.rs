//! Projection: gathers a fixed set of child columns per tuple.

use eyre::Result;

use crate::exec::Operator;
use crate::types::{ColumnRef, Schema, Tuple};

/// Maps each requested output column to a child position at construction;
/// only plain column references are supported. Missing columns are schema
/// faults raised before any tuple flows.
pub struct Project {
    child: Box<dyn Operator>,
    indices: Vec<usize>,
    schema: Schema,
}

impl Project {
    pub fn new(child: Box<dyn Operator>, columns: &[ColumnRef]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|column| child.schema().resolve(column))
            .collect::<Result<Vec<_>>>()?;
        let schema = Schema::new(columns.to_vec());
        Ok(Self {
            child,
            indices,
            schema,
        })
    }
}

impl Operator for Project {
    fn next(&mut self) -> Result<Option<Tuple>> {
        match self.child.next()? {
            Some(tuple) => {
                let values = self.indices.iter().map(|&i| tuple.value(i)).collect();
                Ok(Some(Tuple::new(values)))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.child.reset()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
