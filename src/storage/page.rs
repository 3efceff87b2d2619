//! # Page Header Layout
//!
//! Every page begins with an 8-byte header: the attribute count and the
//! tuple count, both big-endian `int32`. The header is the only structured
//! part of a page; the value area that follows is plain row-major integers.
//!
//! `PageHeader` uses `zerocopy` for safe transmutation from raw page bytes,
//! so the reader can decode a header without copying and the writer can
//! stamp one directly into its page buffer.
//!
//! A header is plausible only if its counts are non-negative and the tuples
//! it declares fit in the page. [`check_counts`] turns anything else into a
//! corrupt-page fault before any value is decoded.

use eyre::{ensure, Result};
use std::mem::size_of;
use zerocopy::big_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::config::{PAGE_DATA_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE, VALUE_SIZE};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct PageHeader {
    attribute_count: I32,
    tuple_count: I32,
}

const _: () = assert!(size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    pub fn new(attribute_count: i32, tuple_count: i32) -> Self {
        Self {
            attribute_count: I32::new(attribute_count),
            tuple_count: I32::new(tuple_count),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read PageHeader: {:?}", e))
    }

    pub fn write_to(&self, data: &mut [u8]) -> Result<()> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for PageHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        data[..size_of::<Self>()].copy_from_slice(self.as_bytes());
        Ok(())
    }

    pub fn attribute_count(&self) -> i32 {
        self.attribute_count.get()
    }

    pub fn tuple_count(&self) -> i32 {
        self.tuple_count.get()
    }
}

/// How many tuples of the given width fit on one page.
pub fn tuples_per_page(attribute_count: usize) -> usize {
    if attribute_count == 0 {
        return 0;
    }
    PAGE_DATA_SIZE / (attribute_count * VALUE_SIZE)
}

/// Rejects headers that could not have been produced by the writer.
pub fn check_counts(attribute_count: i32, tuple_count: i32) -> Result<()> {
    ensure!(
        attribute_count >= 0 && tuple_count >= 0,
        "corrupt page header: negative counts ({attribute_count}, {tuple_count})"
    );
    ensure!(
        tuple_count == 0 || attribute_count > 0,
        "corrupt page header: {tuple_count} tuples with zero attributes"
    );
    let payload = attribute_count as i64 * tuple_count as i64 * VALUE_SIZE as i64;
    ensure!(
        PAGE_HEADER_SIZE as i64 + payload <= PAGE_SIZE as i64,
        "corrupt page header: {tuple_count} tuples of {attribute_count} attributes overflow a {PAGE_SIZE}-byte page"
    );
    Ok(())
}
