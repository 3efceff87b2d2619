//! Leaf operator: reads a base relation through the paged codec.

use eyre::{ensure, Result};
use tracing::debug;

use crate::catalog::Catalog;
use crate::exec::Operator;
use crate::storage::TupleReader;
use crate::types::{Schema, Tuple};

/// Scans a cataloged relation. The whole file is read at construction; a
/// cursor indexes the next tuple to emit, so `reset` is a cursor rewind.
pub struct Scan {
    schema: Schema,
    tuples: Vec<Tuple>,
    cursor: usize,
}

impl Scan {
    pub fn new(catalog: &Catalog, table: &str, alias: Option<&str>) -> Result<Self> {
        let def = catalog.table(table)?;
        let qualifier = alias.unwrap_or(table);
        let schema = def.schema(qualifier);

        let mut reader = TupleReader::open(def.file())?;
        let mut tuples = Vec::new();
        while let Some(tuple) = reader.next_tuple()? {
            ensure!(
                tuple.len() == schema.len(),
                "relation {:?} holds tuples of width {} but the catalog declares {} columns",
                def.file(),
                tuple.len(),
                schema.len()
            );
            tuples.push(tuple);
        }
        debug!(table, rows = tuples.len(), "scan materialized");

        Ok(Self {
            schema,
            tuples,
            cursor: 0,
        })
    }
}

impl Operator for Scan {
    fn next(&mut self) -> Result<Option<Tuple>> {
        if self.cursor < self.tuples.len() {
            let tuple = self.tuples[self.cursor].clone();
            self.cursor += 1;
            Ok(Some(tuple))
        } else {
            Ok(None)
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableDef;
    use crate::storage::TupleWriter;
    use tempfile::tempdir;

    #[test]
    fn scan_reads_and_resets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Boats.bin");
        let mut writer = TupleWriter::create(&path, 2).unwrap();
        writer.write(&Tuple::new(vec![1, 101])).unwrap();
        writer.write(&Tuple::new(vec![2, 102])).unwrap();
        writer.finish().unwrap();

        let mut catalog = Catalog::new();
        catalog.register(TableDef::new("Boats", &path, &["id", "val"]));

        let mut scan = Scan::new(&catalog, "Boats", Some("B")).unwrap();
        assert_eq!(scan.schema().to_string(), "B.id, B.val");
        assert_eq!(scan.next().unwrap(), Some(Tuple::new(vec![1, 101])));
        assert_eq!(scan.next().unwrap(), Some(Tuple::new(vec![2, 102])));
        assert_eq!(scan.next().unwrap(), None);

        scan.reset().unwrap();
        assert_eq!(scan.next().unwrap(), Some(Tuple::new(vec![1, 101])));
    }

    #[test]
    fn scan_rejects_width_mismatch_against_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Boats.bin");
        let mut writer = TupleWriter::create(&path, 2).unwrap();
        writer.write(&Tuple::new(vec![1, 101])).unwrap();
        writer.finish().unwrap();

        let mut catalog = Catalog::new();
        catalog.register(TableDef::new("Boats", &path, &["id", "val", "extra"]));

        assert!(Scan::new(&catalog, "Boats", None).is_err());
    }
}
