//! Selection: pulls from the child until the predicate holds.

use eyre::Result;

use crate::exec::Operator;
use crate::expr::{CompiledPredicate, Expr};
use crate::types::{Schema, Tuple};

/// Filters a child stream by a predicate compiled against the child schema.
/// Output schema equals the child schema; nothing is buffered.
pub struct Filter {
    child: Box<dyn Operator>,
    predicate: CompiledPredicate,
    schema: Schema,
}

impl Filter {
    pub fn new(child: Box<dyn Operator>, condition: &Expr) -> Result<Self> {
        let schema = child.schema().clone();
        let predicate = CompiledPredicate::compile(condition, &schema)?;
        Ok(Self {
            child,
            predicate,
            schema,
        })
    }
}

impl Operator for Filter {
    fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            match self.child.next()? {
                Some(tuple) => {
                    if self.predicate.matches(&tuple) {
                        return Ok(Some(tuple));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.child.reset()
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::{collect, Values};
    use crate::expr::CompareOp;

    #[test]
    fn filter_keeps_matching_tuples_only() {
        let child = Values::new(
            Schema::qualified("T", &["id", "x"]),
            vec![vec![1, 5], vec![2, 20], vec![3, 7], vec![4, 30]],
        );
        let condition = Expr::compare(
            CompareOp::GtEq,
            Expr::column("T", "x"),
            Expr::literal(10),
        );
        let mut filter = Filter::new(Box::new(child), &condition).unwrap();

        assert_eq!(collect(&mut filter), vec![vec![2, 20], vec![4, 30]]);
        filter.reset().unwrap();
        assert_eq!(collect(&mut filter), vec![vec![2, 20], vec![4, 30]]);
    }

    #[test]
    fn filter_fails_on_unresolvable_column() {
        let child = Values::new(Schema::qualified("T", &["id"]), vec![]);
        let condition = Expr::equals(Expr::column("T", "nope"), Expr::literal(1));
        assert!(Filter::new(Box::new(child), &condition).is_err());
    }
}
