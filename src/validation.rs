use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid key parameter '{name}': {kind} values cannot be part of a cache key")]
    InvalidKeyParam { name: String, kind: &'static str },

    #[error("Invalid amount: {0}. Must be a finite, non-negative number")]
    InvalidAmount(f64),

    #[error("Invalid percentage: {0}. Must be between 0 and 100")]
    InvalidPercentage(f64),
}

pub fn validate_amount(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::InvalidAmount(amount));
    }

    Ok(amount)
}

pub fn validate_percentage(percent: f64) -> Result<f64, ValidationError> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ValidationError::InvalidPercentage(percent));
    }

    Ok(percent)
}

/// Name of a JSON value's type, as used in error messages
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Only primitives (and null, meaning "not set") may take part in a cache key.
pub fn validate_key_param(name: &str, value: &Value) -> Result<(), ValidationError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(ValidationError::InvalidKeyParam {
            name: name.to_string(),
            kind: json_kind(value),
        }),
        _ => Ok(()),
    }
}
