//! # Expressions and Predicates
//!
//! The condition language the engine consumes from its planning
//! collaborator: integer comparisons over plain column references and
//! literals, combined with `AND`. Disjunction, arithmetic, and non-integer
//! values are out of the grammar entirely.
//!
//! [`CompiledPredicate`] binds an expression to a schema once, at operator
//! construction: every column reference is resolved to a positional index
//! there, so unresolvable columns fail before execution starts and
//! per-tuple evaluation is purely positional.
//!
//! [`split_equi_join`] decomposes a join condition into cross-side equality
//! key pairs (consumed by sort-merge join) plus whatever residual conjuncts
//! remain.

use eyre::{bail, Result};
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;

use crate::types::{ColumnRef, Schema, Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    #[inline]
    pub fn apply(self, left: i32, right: i32) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::NotEq => left != right,
            CompareOp::Lt => left < right,
            CompareOp::LtEq => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::GtEq => left >= right,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "<>",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(i32),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Expr {
        Expr::Column(ColumnRef::new(table, name))
    }

    pub fn literal(value: i32) -> Expr {
        Expr::Literal(value)
    }

    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Expr {
        Expr::compare(CompareOp::Eq, left, right)
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::And(Box::new(left), Box::new(right))
    }

    /// The conjuncts of this expression, left to right: the leaves of the
    /// `AND` spine, or the expression itself if it is not an `AND`.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        fn walk<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
            match expr {
                Expr::And(left, right) => {
                    walk(left, out);
                    walk(right, out);
                }
                other => out.push(other),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Rebuild a conjunction from parts; `None` when there are none.
    pub fn and_all(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
        exprs.into_iter().reduce(Expr::and)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(column) => write!(f, "{column}"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Compare { op, left, right } => write!(f, "{left} {op} {right}"),
            Expr::And(left, right) => write!(f, "{left} AND {right}"),
        }
    }
}

enum ValueNode {
    Column(usize),
    Literal(i32),
}

enum BoolNode {
    Compare {
        op: CompareOp,
        left: ValueNode,
        right: ValueNode,
    },
    And(Box<BoolNode>, Box<BoolNode>),
}

/// A predicate resolved against one schema, evaluated positionally.
pub struct CompiledPredicate {
    root: BoolNode,
}

impl CompiledPredicate {
    pub fn compile(expr: &Expr, schema: &Schema) -> Result<Self> {
        Ok(Self {
            root: compile_bool(expr, schema)?,
        })
    }

    pub fn matches(&self, tuple: &Tuple) -> bool {
        eval_bool(&self.root, tuple)
    }
}

fn compile_bool(expr: &Expr, schema: &Schema) -> Result<BoolNode> {
    match expr {
        Expr::And(left, right) => Ok(BoolNode::And(
            Box::new(compile_bool(left, schema)?),
            Box::new(compile_bool(right, schema)?),
        )),
        Expr::Compare { op, left, right } => Ok(BoolNode::Compare {
            op: *op,
            left: compile_value(left, schema)?,
            right: compile_value(right, schema)?,
        }),
        other => bail!("expression is not a boolean predicate: {other}"),
    }
}

fn compile_value(expr: &Expr, schema: &Schema) -> Result<ValueNode> {
    match expr {
        Expr::Column(column) => Ok(ValueNode::Column(schema.resolve(column)?)),
        Expr::Literal(value) => Ok(ValueNode::Literal(*value)),
        other => bail!("comparison operands must be columns or integer literals: {other}"),
    }
}

fn eval_bool(node: &BoolNode, tuple: &Tuple) -> bool {
    match node {
        BoolNode::Compare { op, left, right } => {
            op.apply(eval_value(left, tuple), eval_value(right, tuple))
        }
        BoolNode::And(left, right) => eval_bool(left, tuple) && eval_bool(right, tuple),
    }
}

#[inline]
fn eval_value(node: &ValueNode, tuple: &Tuple) -> i32 {
    match node {
        ValueNode::Column(index) => tuple.value(*index),
        ValueNode::Literal(value) => *value,
    }
}

/// Equi-join key pairs extracted from a join condition, plus the conjuncts
/// that are not cross-side column equalities.
#[derive(Debug)]
pub struct EquiJoinKeys {
    pub left: SmallVec<[usize; 4]>,
    pub right: SmallVec<[usize; 4]>,
    pub residual: Option<Expr>,
}

/// Split `condition` into equality key pairs between `left` and `right`
/// schema positions and a residual predicate over the concatenated schema.
///
/// A conjunct `l = r` with `l` in the left schema and `r` in the right
/// (either written order) becomes a key pair; everything else lands in the
/// residual. Whether an empty pair list is acceptable is the caller's
/// decision: sort-merge join construction rejects it.
pub fn split_equi_join(condition: &Expr, left: &Schema, right: &Schema) -> EquiJoinKeys {
    let mut keys = EquiJoinKeys {
        left: SmallVec::new(),
        right: SmallVec::new(),
        residual: None,
    };
    let mut residual = Vec::new();

    for conjunct in condition.conjuncts() {
        if let Expr::Compare {
            op: CompareOp::Eq,
            left: l,
            right: r,
        } = conjunct
        {
            if let (Expr::Column(lc), Expr::Column(rc)) = (l.as_ref(), r.as_ref()) {
                if let (Some(li), Some(ri)) = (left.index_of(lc), right.index_of(rc)) {
                    debug!(left = %lc, right = %rc, "equi-join pair");
                    keys.left.push(li);
                    keys.right.push(ri);
                    continue;
                }
                // written with the sides swapped
                if let (Some(li), Some(ri)) = (left.index_of(rc), right.index_of(lc)) {
                    debug!(left = %rc, right = %lc, "equi-join pair (reversed)");
                    keys.left.push(li);
                    keys.right.push(ri);
                    continue;
                }
            }
        }
        residual.push(conjunct.clone());
    }

    keys.residual = Expr::and_all(residual);
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_table_schemas() -> (Schema, Schema) {
        (
            Schema::qualified("A", &["id", "x"]),
            Schema::qualified("B", &["id", "y"]),
        )
    }

    #[test]
    fn predicate_evaluates_comparisons_and_conjunctions() {
        let schema = Schema::qualified("A", &["id", "x"]);
        let expr = Expr::and(
            Expr::compare(
                CompareOp::Gt,
                Expr::column("A", "x"),
                Expr::literal(10),
            ),
            Expr::equals(Expr::column("A", "id"), Expr::literal(1)),
        );
        let predicate = CompiledPredicate::compile(&expr, &schema).unwrap();

        assert!(predicate.matches(&Tuple::new(vec![1, 11])));
        assert!(!predicate.matches(&Tuple::new(vec![1, 10])));
        assert!(!predicate.matches(&Tuple::new(vec![2, 11])));
    }

    #[test]
    fn unknown_column_fails_at_compile_time() {
        let schema = Schema::qualified("A", &["id"]);
        let expr = Expr::equals(Expr::column("A", "missing"), Expr::literal(1));
        assert!(CompiledPredicate::compile(&expr, &schema).is_err());
    }

    #[test]
    fn bare_column_is_not_a_predicate() {
        let schema = Schema::qualified("A", &["id"]);
        assert!(CompiledPredicate::compile(&Expr::column("A", "id"), &schema).is_err());
    }

    #[test]
    fn split_extracts_pairs_in_both_written_orders() {
        let (left, right) = two_table_schemas();
        let condition = Expr::and(
            Expr::equals(Expr::column("A", "id"), Expr::column("B", "id")),
            Expr::equals(Expr::column("B", "y"), Expr::column("A", "x")),
        );

        let keys = split_equi_join(&condition, &left, &right);
        assert_eq!(keys.left.as_slice(), &[0, 1]);
        assert_eq!(keys.right.as_slice(), &[0, 1]);
        assert!(keys.residual.is_none());
    }

    #[test]
    fn split_keeps_non_equality_conjuncts_as_residual() {
        let (left, right) = two_table_schemas();
        let condition = Expr::and(
            Expr::equals(Expr::column("A", "id"), Expr::column("B", "id")),
            Expr::compare(
                CompareOp::Lt,
                Expr::column("A", "x"),
                Expr::column("B", "y"),
            ),
        );

        let keys = split_equi_join(&condition, &left, &right);
        assert_eq!(keys.left.as_slice(), &[0]);
        let residual = keys.residual.unwrap();
        assert_eq!(residual.to_string(), "A.x < B.y");
    }

    #[test]
    fn split_without_cross_side_equality_yields_no_pairs() {
        let (left, right) = two_table_schemas();
        let condition = Expr::compare(
            CompareOp::Gt,
            Expr::column("A", "x"),
            Expr::column("B", "y"),
        );

        let keys = split_equi_join(&condition, &left, &right);
        assert!(keys.left.is_empty());
        assert!(keys.residual.is_some());
    }

    #[test]
    fn same_side_equality_is_residual_not_a_key() {
        let (left, right) = two_table_schemas();
        let condition = Expr::equals(Expr::column("A", "id"), Expr::column("A", "x"));

        let keys = split_equi_join(&condition, &left, &right);
        assert!(keys.left.is_empty());
        assert!(keys.residual.is_some());
    }
}
