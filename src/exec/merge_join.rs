//! # Sort-Merge Join
//!
//! Joins two inputs that are pre-sorted on the equi-join key columns (the
//! plan builder inserts the sorts). The two streams are co-scanned: the
//! side with the smaller key advances; on equal keys the maximal run of
//! right tuples sharing the key is buffered in memory, the current left
//! tuple emits its cross product with the run, and subsequent left tuples
//! with the same key reuse the buffered run before scanning resumes past
//! the group. Residual conjuncts that are not key equalities are re-checked
//! on each concatenated tuple.
//!
//! Within an equal-key group the output preserves each side's input order;
//! across groups only the sort order itself holds.
//!
//! Construction consumes the resolved key pairs from
//! [`crate::expr::split_equi_join`]; a condition with no cross-side
//! equality is unsupported and fails here, not at execution.

use eyre::{ensure, Result};
use smallvec::SmallVec;
use std::cmp::Ordering;

use crate::exec::Operator;
use crate::expr::{CompiledPredicate, EquiJoinKeys};
use crate::types::{Schema, Tuple};

pub struct MergeJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    schema: Schema,
    left_keys: SmallVec<[usize; 4]>,
    right_keys: SmallVec<[usize; 4]>,
    residual: Option<CompiledPredicate>,
    current_left: Option<Tuple>,
    pending_right: Option<Tuple>,
    run: Vec<Tuple>,
    run_pos: usize,
    started: bool,
}

impl MergeJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        keys: EquiJoinKeys,
    ) -> Result<Self> {
        ensure!(
            !keys.left.is_empty(),
            "sort-merge join requires at least one equi-join column pair"
        );
        ensure!(
            keys.left.len() == keys.right.len(),
            "mismatched equi-join key lists: {} left vs {} right",
            keys.left.len(),
            keys.right.len()
        );

        let schema = left.schema().concat(right.schema());
        let residual = keys
            .residual
            .as_ref()
            .map(|expr| CompiledPredicate::compile(expr, &schema))
            .transpose()?;

        Ok(Self {
            left,
            right,
            schema,
            left_keys: keys.left,
            right_keys: keys.right,
            residual,
            current_left: None,
            pending_right: None,
            run: Vec::new(),
            run_pos: 0,
            started: false,
        })
    }

    fn compare_keys(&self, left: &Tuple, right: &Tuple) -> Ordering {
        for (&li, &ri) in self.left_keys.iter().zip(&self.right_keys) {
            let cmp = left.value(li).cmp(&right.value(ri));
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }

    fn right_keys_equal(&self, a: &Tuple, b: &Tuple) -> bool {
        self.right_keys.iter().all(|&i| a.value(i) == b.value(i))
    }

    fn left_matches_run(&self, left: &Tuple) -> bool {
        self.run
            .first()
            .is_some_and(|head| self.compare_keys(left, head) == Ordering::Equal)
    }
}

impl Operator for MergeJoin {
    fn next(&mut self) -> Result<Option<Tuple>> {
        if !self.started {
            self.started = true;
            self.current_left = self.left.next()?;
            self.pending_right = self.right.next()?;
        }

        loop {
            let left_tuple = match self.current_left.clone() {
                Some(tuple) => tuple,
                None => return Ok(None),
            };

            if self.left_matches_run(&left_tuple) {
                while self.run_pos < self.run.len() {
                    let right_tuple = &self.run[self.run_pos];
                    self.run_pos += 1;
                    let joined = left_tuple.concat(right_tuple);
                    if self
                        .residual
                        .as_ref()
                        .map_or(true, |p| p.matches(&joined))
                    {
                        return Ok(Some(joined));
                    }
                }
                // run exhausted for this left tuple; the next left tuple may
                // share the key and reuse the buffered run
                self.current_left = self.left.next()?;
                self.run_pos = 0;
                continue;
            }

            // buffered run (if any) is behind the current left key
            self.run.clear();
            self.run_pos = 0;

            let right_tuple = match self.pending_right.clone() {
                Some(tuple) => tuple,
                None => return Ok(None),
            };
            match self.compare_keys(&left_tuple, &right_tuple) {
                Ordering::Less => {
                    self.current_left = self.left.next()?;
                }
                Ordering::Greater => {
                    self.pending_right = self.right.next()?;
                }
                Ordering::Equal => {
                    // buffer the maximal run of right tuples with this key
                    self.run.push(right_tuple);
                    self.pending_right = self.right.next()?;
                    loop {
                        let extend = match &self.pending_right {
                            Some(next) => self.right_keys_equal(next, &self.run[0]),
                            None => false,
                        };
                        if !extend {
                            break;
                        }
                        let next = self.pending_right.take().unwrap();
                        self.run.push(next);
                        self.pending_right = self.right.next()?;
                    }
                }
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.left.reset()?;
        self.right.reset()?;
        self.current_left = None;
        self.pending_right = None;
        self.run.clear();
        self.run_pos = 0;
        self.started = false;
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
