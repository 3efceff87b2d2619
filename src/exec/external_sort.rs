//! # External Merge Sort
//!
//! Sorts inputs too large for memory within a budget of `buffer_pages`
//! pages. The operator owns a private temp subdirectory for its run files
//! and releases it deterministically.
//!
//! ## Algorithm
//!
//! 1. **Run generation**: the child is read in chunks of
//!    `buffer_pages * tuples_per_page(width)` tuples; each chunk is sorted
//!    in memory and written to its own run file through the codec.
//! 2. **Merge passes**: groups of up to `buffer_pages - 1` runs are k-way
//!    merged through a min-heap until one run remains. Each pass deletes its
//!    input runs, so disk usage stays at roughly two copies of the data.
//!    Pass count ≈ `ceil(log_{buffer_pages-1}(initial_runs))`.
//! 3. **Result**: the final run is streamed incrementally through
//!    [`TupleReader`]; `reset` reopens it from the start.
//!
//! ## Heap Ordering and Stability
//!
//! Heap entries carry an order-preserving encoding of the sort key: each
//! `i32` is sign-flipped into `u32` space, and bit-inverted for descending
//! keys, so lexicographic comparison of the encoded vector equals the sort
//! comparator. Ties break on source-run index. Runs are numbered in input
//! order and merge groups are processed in order, so the full sort is
//! stable - its output is identical to the in-memory sort's, as an ordered
//! sequence.
//!
//! ## File Layout
//!
//! ```text
//! {temp_root}/sort_{id}/pass0_run0.bin
//! {temp_root}/sort_{id}/pass0_run1.bin
//! {temp_root}/sort_{id}/pass1_run0.bin
//! ...
//! ```
//!
//! ## Resource Contract
//!
//! The temp subdirectory is created at construction and removed by
//! [`ExternalSort::close`]; after `close`, `next` and `reset` are faults.
//! `Drop` runs the same cleanup best-effort, so the directory is released
//! on every exit path, including errors and early abandonment.
//!
//! `buffer_pages >= 3` (two input runs + one output page) is a
//! precondition validated by the configuration layer
//! ([`crate::plan::ExecConfig::validate`]), not re-checked here.

use eyre::{ensure, Result, WrapErr};
use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::PAGE_SIZE;
use crate::exec::sort::{compare_by_keys, resolve_sort_keys, SortKey, SortSpec};
use crate::exec::Operator;
use crate::storage::{tuples_per_page, TupleReader, TupleWriter};
use crate::types::{Schema, Tuple};

const SIGN_FLIP: u32 = 0x8000_0000;

pub struct ExternalSort {
    child: Box<dyn Operator>,
    schema: Schema,
    keys: SmallVec<[SortKey; 4]>,
    buffer_pages: usize,
    temp_dir: PathBuf,
    result: Option<TupleReader>,
    final_run: Option<PathBuf>,
    sorted: bool,
    closed: bool,
}

struct MergeEntry {
    key: SmallVec<[u32; 4]>,
    run: usize,
    tuple: Tuple,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.run == other.run
    }
}

impl Eq for MergeEntry {}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then(self.run.cmp(&other.run))
    }
}

/// Order-preserving key encoding: lexicographic `u32` comparison of the
/// result equals [`compare_by_keys`] on the originals.
fn encode_sort_key(tuple: &Tuple, keys: &[SortKey]) -> SmallVec<[u32; 4]> {
    keys.iter()
        .map(|key| {
            let raw = (tuple.value(key.index) as u32) ^ SIGN_FLIP;
            if key.descending {
                !raw
            } else {
                raw
            }
        })
        .collect()
}

impl ExternalSort {
    /// `operator_id` distinguishes this operator's temp subdirectory from
    /// sibling sorts sharing `temp_root`; the plan builder assigns it.
    pub fn new(
        child: Box<dyn Operator>,
        specs: &[SortSpec],
        buffer_pages: usize,
        temp_root: &Path,
        operator_id: u64,
    ) -> Result<Self> {
        let schema = child.schema().clone();
        let keys = resolve_sort_keys(specs, &schema)?;

        let temp_dir = temp_root.join(format!("sort_{operator_id}"));
        fs::create_dir_all(&temp_dir)
            .wrap_err_with(|| format!("failed to create sort directory {temp_dir:?}"))?;

        Ok(Self {
            child,
            schema,
            keys,
            buffer_pages,
            temp_dir,
            result: None,
            final_run: None,
            sorted: false,
            closed: false,
        })
    }

    /// Remove the run files and the temp subdirectory. The operator is
    /// unusable afterwards. Idempotent; also invoked best-effort on `Drop`.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.result = None;
        self.final_run = None;
        if self.temp_dir.exists() {
            fs::remove_dir_all(&self.temp_dir)
                .wrap_err_with(|| format!("failed to remove sort directory {:?}", self.temp_dir))?;
        }
        Ok(())
    }

    fn run_path(&self, pass: usize, run: usize) -> PathBuf {
        self.temp_dir.join(format!("pass{pass}_run{run}.bin"))
    }

    fn sort_input(&mut self) -> Result<()> {
        let width = self.schema.len();
        let chunk_capacity = self.buffer_pages * tuples_per_page(width);
        ensure!(
            chunk_capacity > 0,
            "tuple width {width} leaves no room on a {PAGE_SIZE}-byte page"
        );

        // run generation
        let mut run_count = 0usize;
        loop {
            let mut chunk: Vec<Tuple> = Vec::with_capacity(chunk_capacity);
            while chunk.len() < chunk_capacity {
                match self.child.next()? {
                    Some(tuple) => chunk.push(tuple),
                    None => break,
                }
            }
            if chunk.is_empty() {
                break;
            }
            let exhausted = chunk.len() < chunk_capacity;

            let keys = &self.keys;
            chunk.sort_by(|a, b| compare_by_keys(a, b, keys));

            let mut writer = TupleWriter::create(&self.run_path(0, run_count), width)?;
            for tuple in &chunk {
                writer.write(tuple)?;
            }
            writer.finish()?;
            run_count += 1;

            if exhausted {
                break;
            }
        }
        debug!(runs = run_count, "run generation complete");

        if run_count == 0 {
            self.sorted = true;
            return Ok(());
        }

        // merge passes
        let fan_in = self.buffer_pages - 1;
        let mut pass = 0usize;
        let mut runs = run_count;
        while runs > 1 {
            let mut produced = 0usize;
            let mut start = 0usize;
            while start < runs {
                let group = fan_in.min(runs - start);
                self.merge_group(pass, start, group, produced)?;
                start += group;
                produced += 1;
            }
            for run in 0..runs {
                let path = self.run_path(pass, run);
                fs::remove_file(&path)
                    .wrap_err_with(|| format!("failed to remove merged run {path:?}"))?;
            }
            pass += 1;
            runs = produced;
            debug!(pass, runs, "merge pass complete");
        }

        let final_run = self.run_path(pass, 0);
        self.result = Some(TupleReader::open(&final_run)?);
        self.final_run = Some(final_run);
        self.sorted = true;
        Ok(())
    }

    /// K-way merge of `count` runs of `pass` starting at `start` into run
    /// `out_run` of the next pass. One page of each input run and one output
    /// page are resident at a time.
    fn merge_group(&self, pass: usize, start: usize, count: usize, out_run: usize) -> Result<()> {
        let mut readers = Vec::with_capacity(count);
        let mut heap = BinaryHeap::with_capacity(count);
        for run in 0..count {
            let mut reader = TupleReader::open(&self.run_path(pass, start + run))?;
            if let Some(tuple) = reader.next_tuple()? {
                heap.push(Reverse(MergeEntry {
                    key: encode_sort_key(&tuple, &self.keys),
                    run,
                    tuple,
                }));
            }
            readers.push(reader);
        }

        let mut writer = TupleWriter::create(&self.run_path(pass + 1, out_run), self.schema.len())?;
        while let Some(Reverse(entry)) = heap.pop() {
            writer.write(&entry.tuple)?;
            if let Some(tuple) = readers[entry.run].next_tuple()? {
                heap.push(Reverse(MergeEntry {
                    key: encode_sort_key(&tuple, &self.keys),
                    run: entry.run,
                    tuple,
                }));
            }
        }
        writer.finish()
    }
}

impl Operator for ExternalSort {
    fn next(&mut self) -> Result<Option<Tuple>> {
        ensure!(!self.closed, "external sort has been closed");
        if !self.sorted {
            self.sort_input()?;
        }
        match &mut self.result {
            Some(reader) => reader.next_tuple(),
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<()> {
        ensure!(!self.closed, "external sort has been closed");
        if let Some(path) = &self.final_run {
            self.result = Some(TupleReader::open(path)?);
        }
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Drop for ExternalSort {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::{collect, Values};
    use crate::types::ColumnRef;
    use tempfile::tempdir;

    fn asc_keys() -> Vec<SortSpec> {
        vec![
            SortSpec::asc(ColumnRef::new("T", "a")),
            SortSpec::asc(ColumnRef::new("T", "b")),
        ]
    }

    fn values(rows: Vec<Vec<i32>>) -> Box<Values> {
        Box::new(Values::new(Schema::qualified("T", &["a", "b"]), rows))
    }

    #[test]
    fn sorts_including_negative_values() {
        let dir = tempdir().unwrap();
        let rows = vec![vec![3, 0], vec![-7, 1], vec![0, -2], vec![-7, 0]];
        let mut sort =
            ExternalSort::new(values(rows), &asc_keys(), 3, dir.path(), 0).unwrap();

        assert_eq!(
            collect(&mut sort),
            vec![vec![-7, 0], vec![-7, 1], vec![0, -2], vec![3, 0]]
        );
    }

    #[test]
    fn descending_key_is_honored() {
        let dir = tempdir().unwrap();
        let specs = vec![SortSpec::desc(ColumnRef::new("T", "a"))];
        let rows = vec![vec![1, 0], vec![3, 0], vec![2, 0]];
        let mut sort = ExternalSort::new(values(rows), &specs, 3, dir.path(), 0).unwrap();

        assert_eq!(
            collect(&mut sort),
            vec![vec![3, 0], vec![2, 0], vec![1, 0]]
        );
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let dir = tempdir().unwrap();
        let mut sort =
            ExternalSort::new(values(vec![]), &asc_keys(), 3, dir.path(), 0).unwrap();
        assert!(sort.next().unwrap().is_none());
        sort.reset().unwrap();
        assert!(sort.next().unwrap().is_none());
    }

    #[test]
    fn reset_replays_the_final_run() {
        let dir = tempdir().unwrap();
        let rows = vec![vec![2, 0], vec![1, 0]];
        let mut sort =
            ExternalSort::new(values(rows), &asc_keys(), 3, dir.path(), 0).unwrap();
        let first = collect(&mut sort);
        sort.reset().unwrap();
        assert_eq!(collect(&mut sort), first);
    }

    #[test]
    fn close_removes_the_temp_directory_and_poisons_the_operator() {
        let dir = tempdir().unwrap();
        let mut sort =
            ExternalSort::new(values(vec![vec![1, 0]]), &asc_keys(), 3, dir.path(), 9).unwrap();
        let sort_dir = dir.path().join("sort_9");
        assert!(sort_dir.exists());

        sort.next().unwrap();
        sort.close().unwrap();
        assert!(!sort_dir.exists());
        assert!(sort.next().is_err());
        assert!(sort.reset().is_err());
        // idempotent
        sort.close().unwrap();
    }

    #[test]
    fn drop_removes_the_temp_directory() {
        let dir = tempdir().unwrap();
        let sort_dir = dir.path().join("sort_4");
        {
            let mut sort =
                ExternalSort::new(values(vec![vec![2, 0], vec![1, 0]]), &asc_keys(), 3, dir.path(), 4)
                    .unwrap();
            sort.next().unwrap();
            assert!(sort_dir.exists());
        }
        assert!(!sort_dir.exists());
    }

    #[test]
    fn encoded_keys_order_like_the_comparator() {
        let keys = [
            SortKey {
                index: 0,
                descending: false,
            },
            SortKey {
                index: 1,
                descending: true,
            },
        ];
        let rows = [
            Tuple::new(vec![i32::MIN, 5]),
            Tuple::new(vec![-1, 9]),
            Tuple::new(vec![-1, 2]),
            Tuple::new(vec![0, 0]),
            Tuple::new(vec![i32::MAX, 1]),
        ];
        for a in &rows {
            for b in &rows {
                assert_eq!(
                    encode_sort_key(a, &keys).cmp(&encode_sort_key(b, &keys)),
                    compare_by_keys(a, b, &keys),
                    "{a} vs {b}"
                );
            }
        }
    }
}
