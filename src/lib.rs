//! Normalizes credit-card statement exports from several issuers into one
//! record shape and totals spend and credit by month, category, merchant or
//! overall.

pub mod aggregation;
pub mod csv_writer;
pub mod detector;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod processor;
pub mod registry;
pub mod traits;

pub use aggregation::{AggregationResult, aggregate};
pub use detector::detect;
pub use errors::StatementError;
pub use models::{CanonicalRecord, Dimension, Issuer, SignTransform};
pub use normalizer::{RecordStream, open_statement};
pub use processor::{Engine, discover_statements};
pub use registry::{IssuerSchema, SchemaRegistry};
