use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    aggregation::{AggregationResult, aggregate},
    models::{CanonicalRecord, Dimension},
    normalizer::open_statement,
    registry::SchemaRegistry,
    traits::{CSVExport, CSVWrite},
};

const STATEMENT_EXTENSION: &str = "csv";

/// Lists the statement exports directly inside `dir`, sorted by path.
pub fn discover_statements(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))? {
        let path = entry?.path();
        let is_statement = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(STATEMENT_EXTENSION));
        if is_statement && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Runs statements through detection and normalization, then aggregates the
/// combined records and exports them through `writer`.
pub struct Engine<'a, T> {
    registry: &'a SchemaRegistry,
    writer: T,
}

impl<'a, T> Engine<'a, T>
where
    T: CSVWrite,
{
    pub fn new(registry: &'a SchemaRegistry, writer: T) -> Self {
        Self { registry, writer }
    }

    pub fn into_writer(self) -> T {
        self.writer
    }

    /// Normalizes one statement file completely. Any detection or row error
    /// aborts the file.
    pub fn load_file(&self, path: &Path) -> Result<Vec<CanonicalRecord>> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let stream = open_statement(self.registry, file)
            .with_context(|| format!("detecting format of {}", path.display()))?;
        let issuer = stream.schema().issuer();

        let records = stream
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("normalizing {} statement {}", issuer, path.display()))?;

        info!(
            "{} is a {} statement with {} transactions",
            path.display(),
            issuer,
            records.len()
        );
        Ok(records)
    }

    /// Loads every file in order. The first failing file aborts the whole
    /// batch so no partial totals are ever produced.
    pub fn load(&self, paths: &[PathBuf]) -> Result<Vec<CanonicalRecord>> {
        let mut records = Vec::new();
        for path in paths {
            records.extend(self.load_file(path)?);
        }
        info!("Found {} transactions in {} files", records.len(), paths.len());
        Ok(records)
    }

    pub fn aggregate(
        &self,
        records: &[CanonicalRecord],
        dimensions: &[Dimension],
    ) -> Result<Vec<AggregationResult>> {
        dimensions
            .iter()
            .map(|dimension| {
                debug!("Aggregating {} records by {}", records.len(), dimension);
                aggregate(records, *dimension)
            })
            .collect()
    }

    /// Aggregates once per dimension over the full record set and exports
    /// every result.
    pub fn report(&mut self, records: &[CanonicalRecord], dimensions: &[Dimension]) -> Result<()> {
        for result in self.aggregate(records, dimensions)? {
            info!(
                "By {}: {} keys, spend {:.2}, credit {:.2}",
                result.dimension(),
                result.keys().len(),
                result.total_spending()?,
                result.total_credit()?
            );
            result.export(&mut self.writer)?;
        }
        self.writer.flush()
    }

    /// Writes the normalized records themselves.
    pub fn dump(&mut self, records: &[CanonicalRecord]) -> Result<()> {
        for record in records {
            self.writer.write_record(record)?;
        }
        self.writer.flush()
    }

    pub fn run(&mut self, dir: &Path, dimensions: &[Dimension]) -> Result<()> {
        let paths = discover_statements(dir)?;
        info!("Found {} statement files in {}", paths.len(), dir.display());

        let records = self.load(&paths)?;
        self.report(&records, dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{csv_writer::CSVSink, errors::StatementError};
    use rust_decimal::prelude::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> Result<PathBuf> {
        let path = dir.path().join(name);
        let mut file = File::create(&path)?;
        file.write_all(content.as_bytes())?;
        Ok(path)
    }

    fn output(engine: Engine<'_, CSVSink<Vec<u8>>>) -> Result<String> {
        Ok(String::from_utf8(engine.into_writer().into_inner()?)?)
    }

    #[test]
    fn test_discover_only_csv_files_sorted() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(&dir, "b.csv", "")?;
        write_file(&dir, "a.CSV", "")?;
        write_file(&dir, "notes.txt", "")?;
        fs::create_dir(dir.path().join("nested.csv"))?;

        let names: Vec<_> = discover_statements(dir.path())?
            .iter()
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();

        assert_eq!(names, vec!["a.CSV", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_load_merges_issuers() -> Result<()> {
        let dir = TempDir::new()?;
        let chase = write_file(
            &dir,
            "chase.csv",
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             01/05/2023,01/06/2023,COFFEE SHOP,Food,Sale,-4.50,\n\
             01/09/2023,01/09/2023,PAYMENT,,Payment,100.00,\n",
        )?;
        let citi = write_file(
            &dir,
            "citi.csv",
            "Date,Description,Debit,Credit,Category\n\"Jan 07, 2023\",GROCER,31.20,,Groceries\n",
        )?;

        let registry = SchemaRegistry::builtin();
        let engine = Engine::new(&registry, CSVSink::new(Vec::new()));
        let records = engine.load(&[chase, citi])?;

        let amounts: Vec<Decimal> = records.iter().map(|r| *r.amount()).collect();
        assert_eq!(amounts, vec![dec!(4.50), dec!(-100.00), dec!(31.20)]);
        Ok(())
    }

    #[test]
    fn test_bad_file_aborts_batch_with_path() -> Result<()> {
        let dir = TempDir::new()?;
        let good = write_file(&dir, "a.csv", "Date,Description,Debit,Credit,Category\n")?;
        let bad = write_file(&dir, "b.csv", "Posted,Payee,Amount\n01/01/2023,SHOP,1.00\n")?;

        let registry = SchemaRegistry::builtin();
        let engine = Engine::new(&registry, CSVSink::new(Vec::new()));
        let err = engine.load(&[good, bad]).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StatementError>(),
            Some(StatementError::UnrecognizedFormat { .. })
        ));
        assert!(format!("{err:#}").contains("b.csv"));
        Ok(())
    }

    #[test]
    fn test_report_fails_on_overflowing_totals() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(
            &dir,
            "chase.csv",
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             01/05/2023,01/06/2023,WIRE,Transfer,Sale,-79228162514264337593543950335,\n\
             01/07/2023,01/07/2023,WIRE,Transfer,Sale,-1,\n",
        )?;

        let registry = SchemaRegistry::builtin();
        let mut engine = Engine::new(&registry, CSVSink::new(Vec::new()));
        let err = engine.run(dir.path(), &[Dimension::Total]).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StatementError>(),
            Some(StatementError::ValueOverflow)
        ));
        assert!(output(engine)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_report_writes_every_dimension() -> Result<()> {
        let dir = TempDir::new()?;
        write_file(
            &dir,
            "chase.csv",
            "Transaction Date,Post Date,Description,Category,Type,Amount,Memo\n\
             01/05/2023,01/06/2023,COFFEE SHOP,Food,Sale,4.50,\n",
        )?;

        let registry = SchemaRegistry::builtin();
        let mut engine = Engine::new(&registry, CSVSink::new(Vec::new()));
        engine.run(dir.path(), &Dimension::ALL)?;

        assert_eq!(
            output(engine)?,
            "dimension,key,spend,credit\n\
             month,2023/01,0.00,4.50\n\
             category,Food,0.00,4.50\n\
             merchant,COFFEE SHOP,0.00,4.50\n\
             total,Total,0.00,4.50\n"
        );
        Ok(())
    }

    #[test]
    fn test_dump_writes_canonical_records() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_file(
            &dir,
            "amex.csv",
            "Date,Description,Amount,Extended Details,Appears On Your Statement As,Address,City/State,Zip Code,Country,Reference,Category\n\
             03/14/2024,AIRLINE,350.00,,,,,,,,Travel-Airline\n",
        )?;

        let registry = SchemaRegistry::builtin();
        let mut engine = Engine::new(&registry, CSVSink::new(Vec::new()));
        let records = engine.load_file(&path)?;
        engine.dump(&records)?;

        assert_eq!(
            output(engine)?,
            "Date,Category,Merchant,Amount\n24/03/14,Travel-Airline,AIRLINE,350.00\n"
        );
        Ok(())
    }
}
