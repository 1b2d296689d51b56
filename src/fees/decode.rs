//! Decoding of the backend `taxes` field into a [`FeeRuleSet`]
//!
//! The backend sends either a JSON-encoded string or an already-parsed array
//! of `{operator, target, tax}` records. `target` and `tax` may be numbers or
//! numeric strings; an optional `type` of `"fixed"` makes `tax` an absolute
//! amount, otherwise it is a percentage.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::rules::{Charge, FeeRule, FeeRuleSet, Operator};
use crate::validation::json_kind;

#[derive(Error, Debug)]
pub enum RuleDecodeError {
    #[error("Tax rules are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tax rules must be an array, got {0}")]
    NotAnArray(&'static str),

    #[error("Tax rule #{index} is not an {{operator, target, tax}} record: {source}")]
    MalformedRecord {
        index: usize,
        source: serde_json::Error,
    },

    #[error("Tax rule #{index}: unknown operator '{operator}'")]
    UnknownOperator { index: usize, operator: String },

    #[error("Tax rule #{index}: '{field}' is not a number ({value})")]
    InvalidNumber {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("Tax rule #{index}: unknown charge type '{kind}'")]
    UnknownChargeKind { index: usize, kind: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct TaxRecord {
    operator: String,
    target: NumberLike,
    tax: NumberLike,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

pub fn decode_tax_rules(raw: &Value) -> Result<FeeRuleSet, RuleDecodeError> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => match serde_json::from_str::<Value>(s)? {
            Value::Array(records) => decode_records(&records),
            Value::Null => Ok(Vec::new()),
            other => Err(RuleDecodeError::NotAnArray(json_kind(&other))),
        },
        Value::Array(records) => decode_records(records),
        other => Err(RuleDecodeError::NotAnArray(json_kind(other))),
    }
}

/// Lenient variant: a malformed field yields no rules (and therefore no
/// charge) after logging a warning.
pub fn decode_tax_rules_or_empty(raw: &Value) -> FeeRuleSet {
    decode_tax_rules(raw).unwrap_or_else(|err| {
        warn!("Ignoring malformed tax rules, no fee will be charged: {}", err);
        Vec::new()
    })
}

fn decode_records(records: &[Value]) -> Result<FeeRuleSet, RuleDecodeError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| decode_record(index, record))
        .collect()
}

fn decode_record(index: usize, record: &Value) -> Result<FeeRule, RuleDecodeError> {
    let record =
        TaxRecord::deserialize(record).map_err(|source| RuleDecodeError::MalformedRecord { index, source })?;

    let operator: Operator = record
        .operator
        .parse()
        .map_err(|operator| RuleDecodeError::UnknownOperator { index, operator })?;
    let threshold = number(index, "target", record.target)?;
    let tax = number(index, "tax", record.tax)?;

    let charge = match record.kind.as_deref().map(str::trim) {
        None | Some("") | Some("percent") | Some("percentage") => Charge::Percent(tax),
        Some("fixed") => Charge::Fixed(tax),
        Some(other) => {
            return Err(RuleDecodeError::UnknownChargeKind {
                index,
                kind: other.to_string(),
            })
        }
    };

    Ok(FeeRule::new(operator, threshold, charge))
}

fn number(index: usize, field: &'static str, value: NumberLike) -> Result<f64, RuleDecodeError> {
    let parsed = match &value {
        NumberLike::Number(n) => Some(*n),
        NumberLike::Text(s) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(RuleDecodeError::InvalidNumber {
            index,
            field,
            value: match value {
                NumberLike::Number(n) => n.to_string(),
                NumberLike::Text(s) => s,
            },
        }),
    }
}
