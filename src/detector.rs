use crate::registry::{IssuerSchema, SchemaRegistry};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Identifies the issuer of a statement from its raw header line.
///
/// A schema matches only when the column count is equal and every column name
/// is equal after trimming surrounding whitespace. The first matching schema
/// in registry order wins. There is no closest-match fallback: a wrong guess
/// would silently flip signs downstream.
pub fn detect<'a>(registry: &'a SchemaRegistry, header_line: &str) -> Option<&'a IssuerSchema> {
    let line = strip_byte_order_mark(header_line.trim_end_matches(['\r', '\n']));
    let columns: Vec<&str> = line.split(',').map(str::trim).collect();

    registry
        .schemas()
        .iter()
        .find(|schema| header_matches(schema.header(), &columns))
}

/// Exports written by spreadsheet tools often start with a UTF-8 byte-order mark.
pub(crate) fn strip_byte_order_mark(text: &str) -> &str {
    text.trim_start_matches(BYTE_ORDER_MARK)
}

fn header_matches(expected: &[&str], columns: &[&str]) -> bool {
    expected.len() == columns.len()
        && expected
            .iter()
            .zip(columns)
            .all(|(want, got)| want.trim() == *got)
}
