use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use getset::Getters;
use rust_decimal::prelude::*;
use serde::Serialize;

/// Date layout every canonical record is rendered with, whatever the issuer wrote.
pub const CANONICAL_DATE_FORMAT: &str = "%y/%m/%d";

/// Date layout of a month aggregation key.
pub const MONTH_KEY_FORMAT: &str = "%Y/%m";

fn canonical_date<S>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.collect_str(&date.format(CANONICAL_DATE_FORMAT))
}

fn plain_decimal<S>(x: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.collect_str(x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Issuer {
    Amex,
    Chase,
    Citi,
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Issuer::Amex => "amex",
            Issuer::Chase => "chase",
            Issuer::Citi => "citi",
        };
        f.write_str(name)
    }
}

/// Maps an issuer's raw amount onto the canonical convention where spend is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignTransform {
    Identity,
    Negate,
}

impl SignTransform {
    pub fn apply(&self, amount: Decimal) -> Decimal {
        match self {
            SignTransform::Identity => amount,
            SignTransform::Negate => -amount,
        }
    }

    /// Both transforms are involutions, so the inverse is the transform itself.
    pub fn invert(&self, amount: Decimal) -> Decimal {
        self.apply(amount)
    }
}

/// One normalized transaction. Positive amounts are money going out, negative
/// amounts are payments, refunds and other credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
pub struct CanonicalRecord {
    #[getset(get = "pub")]
    #[serde(rename = "Date", serialize_with = "canonical_date")]
    date: NaiveDate,
    #[getset(get = "pub")]
    #[serde(rename = "Category")]
    category: String,
    #[getset(get = "pub")]
    #[serde(rename = "Merchant")]
    merchant: String,
    #[getset(get = "pub")]
    #[serde(rename = "Amount", serialize_with = "plain_decimal")]
    amount: Decimal,
}

impl CanonicalRecord {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        merchant: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        CanonicalRecord {
            date,
            category: category.into(),
            merchant: merchant.into(),
            amount,
        }
    }

    pub fn canonical_date(&self) -> String {
        self.date.format(CANONICAL_DATE_FORMAT).to_string()
    }

    pub fn is_spend(&self) -> bool {
        self.amount >= Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Month,
    Category,
    Merchant,
    Total,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Month,
        Dimension::Category,
        Dimension::Merchant,
        Dimension::Total,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Month => "month",
            Dimension::Category => "category",
            Dimension::Merchant => "merchant",
            Dimension::Total => "total",
        };
        f.write_str(name)
    }
}
