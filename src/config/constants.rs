//! # Format and Execution Constants
//!
//! All relation files share one page geometry. Every page is exactly
//! [`PAGE_SIZE`] bytes: an 8-byte header (two big-endian `int32` fields,
//! attribute count then tuple count) followed by the tuple payload and a
//! zero-padded tail.
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       ├─> PAGE_HEADER_SIZE (8 bytes: 2 x int32)
//!       │
//!       └─> PAGE_DATA_SIZE (derived: PAGE_SIZE - PAGE_HEADER_SIZE)
//!             holds attribute_count * tuple_count values of VALUE_SIZE each
//! ```
//!
//! A page holding `t` tuples of width `a` must satisfy
//! `PAGE_HEADER_SIZE + t * a * VALUE_SIZE <= PAGE_SIZE`; both the writer
//! (when deciding to flush) and the reader (when validating a header)
//! enforce this single invariant.
//!
//! `MIN_EXTERNAL_SORT_PAGES` is the smallest buffer budget under which the
//! external merge sort can make progress: two input runs plus one output
//! page. The budget is validated where the strategy is selected
//! ([`crate::plan::ExecConfig::validate`]), not inside the operator.

/// Size of one on-disk page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Size of the per-page header: `int32 attribute_count`, `int32 tuple_count`.
pub const PAGE_HEADER_SIZE: usize = 8;

/// Bytes available for tuple values on each page.
pub const PAGE_DATA_SIZE: usize = PAGE_SIZE - PAGE_HEADER_SIZE;

/// Width of one tuple value on disk (big-endian `int32`).
pub const VALUE_SIZE: usize = 4;

/// Minimum buffer pages for external sort: 2 input runs + 1 output page.
pub const MIN_EXTERNAL_SORT_PAGES: usize = 3;

const _: () = assert!(PAGE_HEADER_SIZE == 2 * VALUE_SIZE);
const _: () = assert!(PAGE_DATA_SIZE == PAGE_SIZE - PAGE_HEADER_SIZE);
const _: () = assert!(MIN_EXTERNAL_SORT_PAGES >= 3);
