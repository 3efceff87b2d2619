//! # relq - Relational Query Execution Engine
//!
//! relq is a single-node query execution engine that evaluates trees of
//! physical operators over relations stored in a fixed-size paged binary
//! format. Results are produced by pulling tuples through the tree: scans at
//! the leaves, filters and projections in the middle, joins, sorts, and
//! duplicate elimination above them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Plan Layer (LogicalPlan/Planner)   │
//! ├─────────────────────────────────────┤
//! │  Operators (scan/filter/join/sort)   │
//! ├─────────────────────────────────────┤
//! │ Expressions │ Catalog │ Sort runs    │
//! ├─────────────────────────────────────┤
//! │   Paged Tuple Codec (reader/writer)  │
//! ├─────────────────────────────────────┤
//! │        4096-byte page files          │
//! └─────────────────────────────────────┘
//! ```
//!
//! Control flows top-down (`next` calls propagate to children), data flows
//! bottom-up (tuples are pulled one at a time). Execution is single-threaded
//! and synchronous; no operator is shared across threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use relq::{Catalog, CompareOp, ExecConfig, Expr, LogicalPlan, Planner, TableDef};
//!
//! let mut catalog = Catalog::new();
//! catalog.register(TableDef::new("Sailors", "data/Sailors.bin", &["id", "age", "rating"]));
//!
//! let plan = LogicalPlan::scan("Sailors", None).select(Expr::compare(
//!     CompareOp::Gt,
//!     Expr::column("Sailors", "age"),
//!     Expr::literal(20),
//! ));
//!
//! let mut planner = Planner::new(&catalog, ExecConfig::default(), "tmp")?;
//! let mut root = planner.build(&plan)?;
//! while let Some(tuple) = root.next()? {
//!     println!("{tuple}");
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: paged binary tuple codec (reader/writer, page header)
//! - [`types`]: tuples and alias-qualified schemas
//! - [`expr`]: conjunctive integer predicates and equi-join analysis
//! - [`catalog`]: table name to file/column mapping, passed explicitly
//! - [`exec`]: the pull-model operators (scan, filter, project, joins,
//!   sorts, duplicate elimination)
//! - [`plan`]: logical plan tree and the physical plan builder
//!
//! ## Memory Model
//!
//! Operators stream wherever their algorithm allows. The exceptions buffer
//! exactly what they must: in-memory sort holds its input, block nested-loop
//! join holds one block of `buffer_pages` worth of left tuples, sort-merge
//! join holds one equal-key run of right tuples, and external sort holds one
//! chunk during run generation and one page per run during merging.

pub mod catalog;
pub mod config;
pub mod exec;
pub mod expr;
pub mod plan;
pub mod storage;
pub mod types;

pub use catalog::{Catalog, TableDef};
pub use exec::{
    BlockNestedLoopJoin, Distinct, ExternalSort, Filter, MergeJoin, NestedLoopJoin, Operator,
    Project, Scan, Sort, SortKey, SortSpec,
};
pub use expr::{split_equi_join, CompareOp, CompiledPredicate, EquiJoinKeys, Expr};
pub use plan::{ExecConfig, JoinStrategy, LogicalPlan, Planner, SortStrategy};
pub use storage::{TupleReader, TupleWriter};
pub use types::{ColumnRef, Schema, Tuple};
