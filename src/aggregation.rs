use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use getset::{CopyGetters, Getters};
use rust_decimal::prelude::*;
use serde::Serialize;

use crate::{
    errors::StatementError,
    models::{CanonicalRecord, Dimension, MONTH_KEY_FORMAT},
    traits::{CSVExport, CSVWrite},
};

/// Key every record falls under when aggregating by [`Dimension::Total`].
pub const TOTAL_KEY: &str = "Total";

fn two_decimals<S>(x: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&format!("{x:.2}"))
}

/// Spend and credit totals of one dimension, keyed by the dimension value.
///
/// Both maps hold non-negative sums. A key missing from one map has a zero
/// total there.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct AggregationResult {
    #[getset(get_copy = "pub")]
    dimension: Dimension,
    #[getset(get = "pub")]
    spending: BTreeMap<String, Decimal>,
    #[getset(get = "pub")]
    credit: BTreeMap<String, Decimal>,
}

/// One line of the tabular view of an [`AggregationResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub dimension: Dimension,
    pub key: String,
    #[serde(serialize_with = "two_decimals")]
    pub spend: Decimal,
    #[serde(serialize_with = "two_decimals")]
    pub credit: Decimal,
}

impl AggregationResult {
    /// Every key seen in either map, sorted.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.spending
            .keys()
            .chain(self.credit.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn spending_for(&self, key: &str) -> Decimal {
        self.spending.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn credit_for(&self, key: &str) -> Decimal {
        self.credit.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sorted rows with the missing side of each key filled with zero.
    pub fn rows(&self) -> Vec<AggregateRow> {
        self.keys()
            .into_iter()
            .map(|key| AggregateRow {
                dimension: self.dimension,
                key: key.to_string(),
                spend: self.spending_for(key),
                credit: self.credit_for(key),
            })
            .collect()
    }

    pub fn total_spending(&self) -> Result<Decimal> {
        checked_sum(self.spending.values())
    }

    pub fn total_credit(&self) -> Result<Decimal> {
        checked_sum(self.credit.values())
    }

    /// Signed sum of every record: spending minus credit.
    pub fn net(&self) -> Result<Decimal> {
        let net = self
            .total_spending()?
            .checked_sub(self.total_credit()?)
            .ok_or(StatementError::ValueOverflow)?;
        Ok(net)
    }
}

impl CSVExport for AggregationResult {
    fn export(&self, writer: &mut impl CSVWrite) -> Result<()> {
        for row in self.rows() {
            writer.write_record(&row)?;
        }
        Ok(())
    }
}

pub fn aggregation_key(record: &CanonicalRecord, dimension: Dimension) -> String {
    match dimension {
        Dimension::Month => record.date().format(MONTH_KEY_FORMAT).to_string(),
        Dimension::Category => record.category().clone(),
        Dimension::Merchant => record.merchant().clone(),
        Dimension::Total => TOTAL_KEY.to_string(),
    }
}

fn checked_sum<'a>(values: impl Iterator<Item = &'a Decimal>) -> Result<Decimal> {
    let mut total = Decimal::ZERO;
    for value in values {
        total = total
            .checked_add(*value)
            .ok_or(StatementError::ValueOverflow)?;
    }
    Ok(total)
}

fn accumulate(totals: &mut BTreeMap<String, Decimal>, key: String, amount: Decimal) -> Result<()> {
    let total = totals.entry(key).or_default();
    *total = total
        .checked_add(amount)
        .ok_or(StatementError::ValueOverflow)?;
    Ok(())
}

/// Buckets `records` by `dimension`. Non-negative amounts are summed as
/// spending, negative amounts are summed by magnitude as credit. No rounding.
/// Fails only when a bucket outgrows the decimal range.
pub fn aggregate(records: &[CanonicalRecord], dimension: Dimension) -> Result<AggregationResult> {
    let mut spending: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut credit: BTreeMap<String, Decimal> = BTreeMap::new();

    for record in records {
        let key = aggregation_key(record, dimension);
        let amount = *record.amount();
        if record.is_spend() {
            accumulate(&mut spending, key, amount)?;
        } else {
            accumulate(&mut credit, key, amount.abs())?;
        }
    }

    Ok(AggregationResult {
        dimension,
        spending,
        credit,
    })
}
