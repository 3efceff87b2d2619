//! # Physical Plan Builder
//!
//! Turns a [`LogicalPlan`] into a tree of physical operators. The builder
//! is injected with everything the operators consume: the catalog (passed
//! by reference, never ambient), the validated strategy configuration, and
//! a temp-directory root for external sorts.
//!
//! Strategy selection:
//!
//! - `Join` nodes build the configured join. For sort-merge, the condition
//!   is split into equi-join key pairs, both children are wrapped in the
//!   configured sort on the key columns, and any residual conjuncts ride
//!   along into the join.
//! - `Sort` nodes build the configured sort variant.
//! - `Distinct` nodes get a sort over all child output columns inserted
//!   beneath them, establishing the adjacency its single-pass algorithm
//!   needs.
//!
//! [`ExecConfig::validate`] is the configuration collaborator from the
//! operators' point of view: it rejects an external-sort budget below three
//! pages and a zero-page BNLJ block before any operator is constructed.

use eyre::{bail, ensure, Result};
use std::path::PathBuf;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::MIN_EXTERNAL_SORT_PAGES;
use crate::exec::{
    BlockNestedLoopJoin, Distinct, ExternalSort, Filter, MergeJoin, NestedLoopJoin, Operator,
    Project, Scan, Sort, SortSpec,
};
use crate::expr::{split_equi_join, Expr};
use crate::plan::LogicalPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    NestedLoop,
    BlockNestedLoop { buffer_pages: usize },
    SortMerge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortStrategy {
    InMemory,
    External { buffer_pages: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecConfig {
    pub join: JoinStrategy,
    pub sort: SortStrategy,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            join: JoinStrategy::NestedLoop,
            sort: SortStrategy::InMemory,
        }
    }
}

impl ExecConfig {
    pub fn validate(&self) -> Result<()> {
        if let JoinStrategy::BlockNestedLoop { buffer_pages } = self.join {
            ensure!(
                buffer_pages >= 1,
                "block nested-loop join requires at least one buffer page"
            );
        }
        if let SortStrategy::External { buffer_pages } = self.sort {
            ensure!(
                buffer_pages >= MIN_EXTERNAL_SORT_PAGES,
                "external sort requires at least {MIN_EXTERNAL_SORT_PAGES} buffer pages, got {buffer_pages}"
            );
        }
        Ok(())
    }
}

pub struct Planner<'a> {
    catalog: &'a Catalog,
    config: ExecConfig,
    temp_dir: PathBuf,
    sort_seq: u64,
}

impl<'a> Planner<'a> {
    pub fn new(
        catalog: &'a Catalog,
        config: ExecConfig,
        temp_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            config,
            temp_dir: temp_dir.into(),
            sort_seq: 0,
        })
    }

    pub fn build(&mut self, plan: &LogicalPlan) -> Result<Box<dyn Operator>> {
        match plan {
            LogicalPlan::Scan { table, alias } => {
                debug!(table = %table, "building scan");
                Ok(Box::new(Scan::new(self.catalog, table, alias.as_deref())?))
            }
            LogicalPlan::Select { input, predicate } => {
                let child = self.build(input)?;
                Ok(Box::new(Filter::new(child, predicate)?))
            }
            LogicalPlan::Project { input, columns } => {
                let child = self.build(input)?;
                Ok(Box::new(Project::new(child, columns)?))
            }
            LogicalPlan::Sort { input, keys } => {
                let child = self.build(input)?;
                self.build_sort(child, keys)
            }
            LogicalPlan::Distinct { input } => {
                let child = self.build(input)?;
                let keys: Vec<SortSpec> = child
                    .schema()
                    .columns()
                    .iter()
                    .cloned()
                    .map(SortSpec::asc)
                    .collect();
                let sorted = self.build_sort(child, &keys)?;
                Ok(Box::new(Distinct::new(sorted)))
            }
            LogicalPlan::Join {
                left,
                right,
                condition,
            } => {
                let left_op = self.build(left)?;
                let right_op = self.build(right)?;
                match self.config.join {
                    JoinStrategy::NestedLoop => Ok(Box::new(NestedLoopJoin::new(
                        left_op,
                        right_op,
                        condition.as_ref(),
                    )?)),
                    JoinStrategy::BlockNestedLoop { buffer_pages } => {
                        Ok(Box::new(BlockNestedLoopJoin::new(
                            left_op,
                            right_op,
                            condition.as_ref(),
                            buffer_pages,
                        )?))
                    }
                    JoinStrategy::SortMerge => {
                        self.build_merge_join(left_op, right_op, condition.as_ref())
                    }
                }
            }
        }
    }

    fn build_merge_join(
        &mut self,
        left: Box<dyn Operator>,
        right: Box<dyn Operator>,
        condition: Option<&Expr>,
    ) -> Result<Box<dyn Operator>> {
        let condition = match condition {
            Some(condition) => condition,
            None => bail!("sort-merge join requires an equi-join condition"),
        };
        let keys = split_equi_join(condition, left.schema(), right.schema());
        ensure!(
            !keys.left.is_empty(),
            "sort-merge join requires an equality between left and right columns: {condition}"
        );
        debug!(pairs = keys.left.len(), "building sort-merge join");

        let left_specs: Vec<SortSpec> = keys
            .left
            .iter()
            .map(|&i| SortSpec::asc(left.schema().column(i).clone()))
            .collect();
        let right_specs: Vec<SortSpec> = keys
            .right
            .iter()
            .map(|&i| SortSpec::asc(right.schema().column(i).clone()))
            .collect();

        let left_sorted = self.build_sort(left, &left_specs)?;
        let right_sorted = self.build_sort(right, &right_specs)?;
        Ok(Box::new(MergeJoin::new(left_sorted, right_sorted, keys)?))
    }

    fn build_sort(
        &mut self,
        child: Box<dyn Operator>,
        keys: &[SortSpec],
    ) -> Result<Box<dyn Operator>> {
        match self.config.sort {
            SortStrategy::InMemory => Ok(Box::new(Sort::new(child, keys)?)),
            SortStrategy::External { buffer_pages } => {
                let id = self.sort_seq;
                self.sort_seq += 1;
                Ok(Box::new(ExternalSort::new(
                    child,
                    keys,
                    buffer_pages,
                    &self.temp_dir,
                    id,
                )?))
            }
        }
    }
}
