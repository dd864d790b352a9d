use thiserror::Error;

use crate::models::Issuer;

#[derive(Debug, Error)]
pub enum StatementError {
    #[error("unrecognized statement format, header: {header:?}")]
    UnrecognizedFormat { header: String },

    #[error("line {line}: malformed date {value:?}")]
    MalformedDate { line: u64, value: String },

    #[error("line {line}: malformed amount {value:?}")]
    MalformedAmount { line: u64, value: String },

    #[error("line {line}: missing field {column:?}")]
    MissingField { line: u64, column: &'static str },

    #[error("value overflow")]
    ValueOverflow,

    #[error("{issuer} schema maps to column {column:?} which is not in its header")]
    UnmappedColumn { issuer: Issuer, column: &'static str },
}
