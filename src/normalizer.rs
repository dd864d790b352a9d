use std::io::{BufRead, BufReader, Read};

use anyhow::Result;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use rust_decimal::prelude::*;

use crate::{
    detector::{detect, strip_byte_order_mark},
    errors::StatementError,
    models::CanonicalRecord,
    registry::{ColumnIndices, IssuerSchema, SchemaRegistry},
};

/// Rows of the stream start on the second line of the file.
const HEADER_LINES: u64 = 1;

/// Lazy, single-pass sequence of canonical records read from one statement.
///
/// The header line must already be consumed from `reader`. Column positions
/// are resolved once, when the stream is created. The first malformed row
/// yields an error; callers are expected to stop there.
pub struct RecordStream<'a, R> {
    schema: &'a IssuerSchema,
    columns: ColumnIndices,
    rows: StringRecordsIntoIter<R>,
}

impl<'a, R: Read> RecordStream<'a, R> {
    pub fn new(schema: &'a IssuerSchema, reader: R) -> Result<Self> {
        let columns = schema.column_indices()?;
        let rows = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Ok(Self {
            schema,
            columns,
            rows,
        })
    }

    pub fn schema(&self) -> &'a IssuerSchema {
        self.schema
    }

    /// Concatenated exports repeat the header in the middle of the data.
    fn is_repeated_header(&self, row: &StringRecord) -> bool {
        match (row.get(0), self.schema.header().first()) {
            (Some(leading), Some(first_column)) => {
                strip_byte_order_mark(leading).trim() == *first_column
            }
            _ => false,
        }
    }

    fn normalize(&self, row: &StringRecord) -> Result<CanonicalRecord> {
        let line = row.position().map_or(0, |pos| pos.line()) + HEADER_LINES;
        let fields = self.schema.fields();

        let date = self.parse_date(field(row, self.columns.date, fields.date, line)?, line)?;
        let category = field(row, self.columns.category, fields.category, line)?;
        let merchant = field(row, self.columns.merchant, fields.merchant, line)?;
        let raw_amount = parse_amount(field(row, self.columns.amount, fields.amount, line)?, line)?;

        // negating an empty cell must not leave a "-0" behind
        let amount = match self.schema.sign().apply(raw_amount) {
            amount if amount.is_zero() => Decimal::ZERO,
            amount => amount,
        };

        Ok(CanonicalRecord::new(date, category, merchant, amount))
    }

    fn parse_date(&self, value: &str, line: u64) -> Result<NaiveDate> {
        let value = value.trim();
        let date = self
            .schema
            .date_formats()
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .ok_or_else(|| StatementError::MalformedDate {
                line,
                value: value.to_string(),
            })?;
        Ok(date)
    }
}

impl<R: Read> Iterator for RecordStream<'_, R> {
    type Item = Result<CanonicalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(err) => return Some(Err(err.into())),
            };
            if self.is_repeated_header(&row) {
                continue;
            }
            return Some(self.normalize(&row));
        }
    }
}

fn field<'r>(row: &'r StringRecord, index: usize, column: &'static str, line: u64) -> Result<&'r str> {
    let value = row
        .get(index)
        .ok_or(StatementError::MissingField { line, column })?;
    Ok(value)
}

/// An empty amount cell is a zero amount, anything else must be a number.
fn parse_amount(value: &str, line: u64) -> Result<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let amount = Decimal::from_str(value).map_err(|_| StatementError::MalformedAmount {
        line,
        value: value.to_string(),
    })?;
    Ok(amount)
}

/// Reads the header line of a statement, detects its issuer and returns the
/// record stream over the remaining rows.
pub fn open_statement<R: Read>(
    registry: &SchemaRegistry,
    reader: R,
) -> Result<RecordStream<'_, BufReader<R>>> {
    let mut reader = BufReader::new(reader);
    let mut header = String::new();
    reader.read_line(&mut header)?;

    let schema = detect(registry, &header).ok_or_else(|| StatementError::UnrecognizedFormat {
        header: header.trim_end().to_string(),
    })?;

    RecordStream::new(schema, reader)
}
