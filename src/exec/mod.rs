//! # Query Executor - Pull Model
//!
//! Every physical operator implements the [`Operator`] trait:
//!
//! - `next()`: produce the next output tuple, `Ok(None)` at end of stream
//! - `reset()`: re-execute from the beginning, recursively resetting
//!   children
//! - `schema()`: the operator's output schema, fixed at construction
//!
//! Operator trees are composed of `Box<dyn Operator>` children and driven by
//! the consumer calling `next` on the root:
//!
//! ```text
//! Project
//!     └── Filter
//!             └── Scan
//!                     └── [paged relation file]
//! ```
//!
//! End of stream is a value (`Ok(None)`), never an error; faults (I/O,
//! corrupt pages) abort the tree through `Err`. Execution is synchronous and
//! single-threaded: a `next` call completes before its caller proceeds, and
//! no operator tolerates concurrent use.
//!
//! No operator materializes its whole output eagerly except where its
//! algorithm requires it: [`Sort`] buffers its input, [`ExternalSort`]
//! spills runs, [`BlockNestedLoopJoin`] pins one block of left tuples, and
//! [`MergeJoin`] buffers one equal-key run of right tuples.

mod distinct;
mod external_sort;
mod filter;
mod merge_join;
mod nested_loop;
mod project;
mod scan;
mod sort;

pub use distinct::Distinct;
pub use external_sort::ExternalSort;
pub use filter::Filter;
pub use merge_join::MergeJoin;
pub use nested_loop::{BlockNestedLoopJoin, NestedLoopJoin};
pub use project::Project;
pub use scan::Scan;
pub use sort::{compare_by_keys, resolve_sort_keys, Sort, SortKey, SortSpec};

use eyre::Result;

use crate::storage::TupleWriter;
use crate::types::{Schema, Tuple};

pub trait Operator {
    /// Next output tuple, or `Ok(None)` once the stream is exhausted.
    fn next(&mut self) -> Result<Option<Tuple>>;

    /// Re-execute from the beginning, recursively resetting children.
    fn reset(&mut self) -> Result<()>;

    /// Output schema, computed once at construction.
    fn schema(&self) -> &Schema;

    /// Drain the remaining output into `writer`, returning the tuple count.
    /// The caller finishes the writer.
    fn dump(&mut self, writer: &mut TupleWriter) -> Result<u64> {
        let mut count = 0;
        while let Some(tuple) = self.next()? {
            writer.write(&tuple)?;
            count += 1;
        }
        Ok(count)
    }
}
