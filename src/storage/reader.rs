//! # Tuple Reader
//!
//! Forward-only reader over a paged relation file. One page is resident at a
//! time; [`TupleReader::load_next_page`] pulls the next 4096 bytes and
//! validates the header before anything is decoded.
//!
//! Three conditions are kept strictly apart:
//!
//! - **Exhaustion**: a clean end of file. `load_next_page` returns
//!   `Ok(false)`, [`TupleReader::next_tuple`] returns `Ok(None)`.
//! - **Zero-tuple page**: a valid page that happens to hold no tuples.
//!   `load_next_page` returns `Ok(true)`; `next_tuple` skips over it.
//! - **Faults**: a short read mid-page (I/O fault) or a header whose counts
//!   could not fit the page (corrupt-page fault). Both are errors, never
//!   silently treated as end of stream.
//!
//! [`TupleReader::rewind`] restarts from the beginning of the file; the
//! operators' `reset` paths are built on it.

use eyre::{ensure, Result, WrapErr};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::{PAGE_HEADER_SIZE, PAGE_SIZE, VALUE_SIZE};
use crate::storage::page::{check_counts, PageHeader};
use crate::types::Tuple;

pub struct TupleReader {
    file: File,
    path: PathBuf,
    buf: Box<[u8; PAGE_SIZE]>,
    attribute_count: usize,
    tuple_count: usize,
    next_index: usize,
}

impl TupleReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).wrap_err_with(|| format!("failed to open relation file {path:?}"))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            buf: Box::new([0u8; PAGE_SIZE]),
            attribute_count: 0,
            tuple_count: 0,
            next_index: 0,
        })
    }

    /// Attribute width of the page currently loaded (0 before the first
    /// page).
    pub fn attribute_count(&self) -> usize {
        self.attribute_count
    }

    /// Load the next page into the buffer. `Ok(false)` means the file is
    /// exhausted; a partially present page is an I/O fault.
    pub fn load_next_page(&mut self) -> Result<bool> {
        let mut filled = 0usize;
        while filled < PAGE_SIZE {
            let n = self
                .file
                .read(&mut self.buf[filled..])
                .wrap_err_with(|| format!("failed to read page from {:?}", self.path))?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.attribute_count = 0;
            self.tuple_count = 0;
            self.next_index = 0;
            return Ok(false);
        }
        ensure!(
            filled == PAGE_SIZE,
            "truncated page in {:?}: expected {PAGE_SIZE} bytes, got {filled}",
            self.path
        );

        let header = PageHeader::from_bytes(&self.buf[..])?;
        let attributes = header.attribute_count();
        let tuples = header.tuple_count();
        check_counts(attributes, tuples)
            .wrap_err_with(|| format!("while reading {:?}", self.path))?;

        self.attribute_count = attributes as usize;
        self.tuple_count = tuples as usize;
        self.next_index = 0;
        Ok(true)
    }

    /// Decode the remaining tuples of the currently loaded page.
    pub fn read_tuple_page(&mut self) -> Vec<Tuple> {
        let mut tuples = Vec::with_capacity(self.tuple_count - self.next_index);
        while self.next_index < self.tuple_count {
            tuples.push(self.decode(self.next_index));
            self.next_index += 1;
        }
        tuples
    }

    /// Next tuple in the file, crossing page boundaries as needed.
    /// `Ok(None)` only at end of file; zero-tuple pages are skipped.
    pub fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.next_index < self.tuple_count {
                let tuple = self.decode(self.next_index);
                self.next_index += 1;
                return Ok(Some(tuple));
            }
            if !self.load_next_page()? {
                return Ok(None);
            }
        }
    }

    /// Drain the whole file into memory (scan construction).
    pub fn read_all(&mut self) -> Result<Vec<Tuple>> {
        let mut tuples = Vec::new();
        while let Some(tuple) = self.next_tuple()? {
            tuples.push(tuple);
        }
        Ok(tuples)
    }

    /// Restart from the beginning of the file.
    pub fn rewind(&mut self) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .wrap_err_with(|| format!("failed to rewind {:?}", self.path))?;
        self.attribute_count = 0;
        self.tuple_count = 0;
        self.next_index = 0;
        Ok(())
    }

    fn decode(&self, index: usize) -> Tuple {
        let mut values = Vec::with_capacity(self.attribute_count);
        let mut offset = PAGE_HEADER_SIZE + index * self.attribute_count * VALUE_SIZE;
        for _ in 0..self.attribute_count {
            let bytes: [u8; VALUE_SIZE] = self.buf[offset..offset + VALUE_SIZE]
                .try_into()
                .unwrap();
            values.push(i32::from_be_bytes(bytes));
            offset += VALUE_SIZE;
        }
        Tuple::new(values)
    }
}
