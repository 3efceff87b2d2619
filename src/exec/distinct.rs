//! Duplicate elimination over a sorted stream.

use eyre::Result;

use crate::exec::Operator;
use crate::types::{Schema, Tuple};

/// Collapses runs of equal tuples to one. Precondition: the input is sorted
/// on all output columns (the plan builder inserts the sort), so equal
/// tuples are adjacent and one remembered tuple suffices. O(1) extra
/// memory, single pass.
pub struct Distinct {
    child: Box<dyn Operator>,
    last: Option<Tuple>,
}

impl Distinct {
    pub fn new(child: Box<dyn Operator>) -> Self {
        Self { child, last: None }
    }
}

impl Operator for Distinct {
    fn next(&mut self) -> Result<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.last.as_ref() != Some(&tuple) {
                self.last = Some(tuple.clone());
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) -> Result<()> {
        self.last = None;
        self.child.reset()
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::{collect, Values};

    #[test]
    fn collapses_sorted_runs_of_varied_length() {
        let child = Values::new(
            Schema::qualified("T", &["x"]),
            vec![
                vec![1],
                vec![2],
                vec![2],
                vec![3],
                vec![3],
                vec![3],
                vec![4],
            ],
        );
        let mut distinct = Distinct::new(Box::new(child));
        assert_eq!(
            collect(&mut distinct),
            vec![vec![1], vec![2], vec![3], vec![4]]
        );
    }

    #[test]
    fn reset_forgets_the_last_tuple() {
        let child = Values::new(Schema::qualified("T", &["x"]), vec![vec![7], vec![7]]);
        let mut distinct = Distinct::new(Box::new(child));
        assert_eq!(collect(&mut distinct), vec![vec![7]]);
        distinct.reset().unwrap();
        assert_eq!(collect(&mut distinct), vec![vec![7]]);
    }
}
