//! # Nested-Loop Join Family
//!
//! Two variants of the nested-loop join, both binary, both producing the
//! concatenated left-then-right schema with each side's table qualifier
//! preserved (so same-named columns, including self-joins, stay
//! distinguishable). When no condition is given, both degenerate to the
//! cross product.
//!
//! - [`NestedLoopJoin`] holds one left tuple at a time and rescans the
//!   right child once per left tuple.
//! - [`BlockNestedLoopJoin`] pins a block of left tuples bounded by a page
//!   budget and rescans the right child once per *block*, cutting right
//!   rescans from one per left tuple to one per block.

use eyre::{ensure, Result};

use crate::exec::Operator;
use crate::expr::{CompiledPredicate, Expr};
use crate::storage::tuples_per_page;
use crate::types::{Schema, Tuple};

/// Plain tuple-at-a-time nested-loop join.
pub struct NestedLoopJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    predicate: Option<CompiledPredicate>,
    schema: Schema,
    current_left: Option<Tuple>,
}

impl NestedLoopJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        condition: Option<&Expr>,
    ) -> Result<Self> {
        let schema = left.schema().concat(right.schema());
        let predicate = condition
            .map(|expr| CompiledPredicate::compile(expr, &schema))
            .transpose()?;
        Ok(Self {
            left,
            right,
            predicate,
            schema,
            current_left: None,
        })
    }
}

impl Operator for NestedLoopJoin {
    fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                match self.left.next()? {
                    Some(tuple) => self.current_left = Some(tuple),
                    None => return Ok(None),
                }
            }

            while let Some(right_tuple) = self.right.next()? {
                let left_tuple = self.current_left.as_ref().unwrap();
                let joined = left_tuple.concat(&right_tuple);
                if self
                    .predicate
                    .as_ref()
                    .map_or(true, |p| p.matches(&joined))
                {
                    return Ok(Some(joined));
                }
            }

            // right exhausted for this left tuple
            self.right.reset()?;
            self.current_left = None;
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.left.reset()?;
        self.right.reset()?;
        self.current_left = None;
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Block nested-loop join: buffers up to `buffer_pages` worth of left
/// tuples (derived from the real page geometry of the left width) and scans
/// the right child once per block.
pub struct BlockNestedLoopJoin {
    left: Box<dyn Operator>,
    right: Box<dyn Operator>,
    predicate: Option<CompiledPredicate>,
    schema: Schema,
    block: Vec<Tuple>,
    block_capacity: usize,
    block_pos: usize,
    current_right: Option<Tuple>,
}

impl BlockNestedLoopJoin {
    pub fn new(
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        condition: Option<&Expr>,
        buffer_pages: usize,
    ) -> Result<Self> {
        ensure!(
            buffer_pages >= 1,
            "block nested-loop join requires at least one buffer page"
        );
        let block_capacity = buffer_pages * tuples_per_page(left.schema().len());
        ensure!(
            block_capacity > 0,
            "left tuple width {} leaves no room for a block",
            left.schema().len()
        );

        let schema = left.schema().concat(right.schema());
        let predicate = condition
            .map(|expr| CompiledPredicate::compile(expr, &schema))
            .transpose()?;
        Ok(Self {
            left,
            right,
            predicate,
            schema,
            block: Vec::new(),
            block_capacity,
            block_pos: 0,
            current_right: None,
        })
    }

    fn load_block(&mut self) -> Result<()> {
        while self.block.len() < self.block_capacity {
            match self.left.next()? {
                Some(tuple) => self.block.push(tuple),
                None => break,
            }
        }
        Ok(())
    }
}

impl Operator for BlockNestedLoopJoin {
    fn next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.block.is_empty() {
                self.load_block()?;
                if self.block.is_empty() {
                    // left child exhausted
                    return Ok(None);
                }
                self.current_right = None;
            }

            if self.current_right.is_none() {
                match self.right.next()? {
                    Some(tuple) => {
                        self.current_right = Some(tuple);
                        self.block_pos = 0;
                    }
                    None => {
                        // block done against the whole right side
                        self.right.reset()?;
                        self.block.clear();
                        continue;
                    }
                }
            }

            while self.block_pos < self.block.len() {
                let left_tuple = &self.block[self.block_pos];
                self.block_pos += 1;
                let right_tuple = self.current_right.as_ref().unwrap();
                let joined = left_tuple.concat(right_tuple);
                if self
                    .predicate
                    .as_ref()
                    .map_or(true, |p| p.matches(&joined))
                {
                    return Ok(Some(joined));
                }
            }

            self.current_right = None;
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.left.reset()?;
        self.right.reset()?;
        self.block.clear();
        self.block_pos = 0;
        self.current_right = None;
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
