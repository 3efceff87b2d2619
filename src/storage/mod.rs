//! # Storage Layer
//!
//! The paged binary tuple codec. A relation file is an ordered sequence of
//! fixed 4096-byte pages, each holding a batch of uniform-width tuples:
//!
//! ```text
//! Offset  Size           Field
//! ------  -------------  -------------------------------------------
//! 0       4              attribute_count (big-endian int32)
//! 4       4              tuple_count     (big-endian int32)
//! 8       a * t * 4      tuple values, row-major, big-endian int32
//! ...     to 4096        zero padding
//! ```
//!
//! The format is load-bearing: [`writer::TupleWriter`] and
//! [`reader::TupleReader`] must stay bit-exact mirrors of each other. Base
//! relations, query output, and external-sort run files all use it.

pub mod page;
pub mod reader;
pub mod writer;

pub use page::{tuples_per_page, PageHeader};
pub use reader::TupleReader;
pub use writer::TupleWriter;
