use anyhow::Result;
use getset::CopyGetters;

use crate::{
    errors::StatementError,
    models::{Issuer, SignTransform},
};

const AMEX_HEADER: &[&str] = &[
    "Date",
    "Description",
    "Amount",
    "Extended Details",
    "Appears On Your Statement As",
    "Address",
    "City/State",
    "Zip Code",
    "Country",
    "Reference",
    "Category",
];
const CHASE_HEADER: &[&str] = &[
    "Transaction Date",
    "Post Date",
    "Description",
    "Category",
    "Type",
    "Amount",
    "Memo",
];
const CITI_HEADER: &[&str] = &["Date", "Description", "Debit", "Credit", "Category"];

/// Raw column names backing each canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub date: &'static str,
    pub category: &'static str,
    pub merchant: &'static str,
    pub amount: &'static str,
}

/// Positions of the canonical fields inside a row of one issuer's export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndices {
    pub date: usize,
    pub category: usize,
    pub merchant: usize,
    pub amount: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
pub struct IssuerSchema {
    #[getset(get_copy = "pub")]
    issuer: Issuer,
    #[getset(get_copy = "pub")]
    header: &'static [&'static str],
    #[getset(get_copy = "pub")]
    fields: FieldMap,
    /// Accepted date layouts, tried in order. More than one only when an
    /// issuer changed its export format over time.
    #[getset(get_copy = "pub")]
    date_formats: &'static [&'static str],
    #[getset(get_copy = "pub")]
    sign: SignTransform,
}

impl IssuerSchema {
    pub fn new(
        issuer: Issuer,
        header: &'static [&'static str],
        fields: FieldMap,
        date_formats: &'static [&'static str],
        sign: SignTransform,
    ) -> Self {
        IssuerSchema {
            issuer,
            header,
            fields,
            date_formats,
            sign,
        }
    }

    /// Resolves the field map against the header. Called once per file.
    pub fn column_indices(&self) -> Result<ColumnIndices> {
        Ok(ColumnIndices {
            date: self.position_of(self.fields.date)?,
            category: self.position_of(self.fields.category)?,
            merchant: self.position_of(self.fields.merchant)?,
            amount: self.position_of(self.fields.amount)?,
        })
    }

    fn position_of(&self, column: &'static str) -> Result<usize> {
        let index = self
            .header
            .iter()
            .position(|name| *name == column)
            .ok_or(StatementError::UnmappedColumn {
                issuer: self.issuer,
                column,
            })?;
        Ok(index)
    }
}

/// The fixed set of statement layouts a run understands, in match priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    schemas: Vec<IssuerSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<IssuerSchema>) -> Self {
        SchemaRegistry { schemas }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            IssuerSchema::new(
                Issuer::Amex,
                AMEX_HEADER,
                FieldMap {
                    date: "Date",
                    category: "Category",
                    merchant: "Description",
                    amount: "Amount",
                },
                // %y must come first: %Y would also accept "23" as the year 23.
                &["%m/%d/%y", "%m/%d/%Y"],
                SignTransform::Identity,
            ),
            IssuerSchema::new(
                Issuer::Chase,
                CHASE_HEADER,
                FieldMap {
                    date: "Transaction Date",
                    category: "Category",
                    merchant: "Description",
                    amount: "Amount",
                },
                &["%m/%d/%Y"],
                SignTransform::Negate,
            ),
            IssuerSchema::new(
                Issuer::Citi,
                CITI_HEADER,
                FieldMap {
                    date: "Date",
                    category: "Category",
                    merchant: "Description",
                    amount: "Debit",
                },
                &["%b %d, %Y"],
                SignTransform::Identity,
            ),
        ])
    }

    pub fn schemas(&self) -> &[IssuerSchema] {
        &self.schemas
    }

    pub fn get(&self, issuer: Issuer) -> Option<&IssuerSchema> {
        self.schemas.iter().find(|schema| schema.issuer == issuer)
    }
}
