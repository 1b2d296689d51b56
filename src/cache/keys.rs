//! Cache key derivation
//!
//! Keys are rendered as `namespace?name=value&name=value` with parameters
//! sorted by name, so the same logical query always maps to the same key no
//! matter how its parameters were assembled.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::validation::{json_kind, validate_key_param, ValidationError};

/// Rendered in place of a declared field that is missing or null.
pub const MISSING_PARAM_PLACEHOLDER: &str = "∅";

/// A derived, canonical cache key
///
/// Remembers the declared field list it was derived with, so a cache only
/// accepts keys built the same way it builds its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    fields: Vec<String>,
    raw: String,
}

impl CacheKey {
    /// The query family this key belongs to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Declared fields, sorted and deduplicated
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Builder for ad hoc parameter sets.
///
/// ```
/// use affiliate_core::cache::KeyParams;
///
/// let key = KeyParams::new()
///     .param("page", 1)
///     .param("status", None::<&str>)
///     .derive("affiliates-list")
///     .unwrap();
/// assert_eq!(key.as_str(), "affiliates-list?page=1");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyParams {
    params: Map<String, Value>,
}

impl KeyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the fields of a serializable filter struct. `Option::None`
    /// fields become null.
    pub fn from_serialize<P: Serialize>(params: &P) -> Result<Self, ValidationError> {
        match serde_json::to_value(params) {
            Ok(Value::Object(params)) => Ok(Self { params }),
            Ok(Value::Null) => Ok(Self::default()),
            Ok(other) => Err(ValidationError::InvalidKeyParam {
                name: "<root>".to_string(),
                kind: json_kind(&other),
            }),
            Err(_) => Err(ValidationError::InvalidKeyParam {
                name: "<root>".to_string(),
                kind: "unserializable",
            }),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.params
    }

    pub fn derive(&self, namespace: &str) -> Result<CacheKey, ValidationError> {
        derive_key(namespace, &self.params)
    }
}

impl From<Map<String, Value>> for KeyParams {
    fn from(params: Map<String, Value>) -> Self {
        Self { params }
    }
}

/// Derive a key with no declared fields: null parameters are dropped.
pub fn derive_key(namespace: &str, params: &Map<String, Value>) -> Result<CacheKey, ValidationError> {
    derive_key_with_fields::<&str>(namespace, &[], params)
}

/// Derive a key for a query family whose fields are known up front.
///
/// Every declared field appears in the key; a declared field that is missing
/// or null renders as [`MISSING_PARAM_PLACEHOLDER`]. Undeclared parameters are
/// included when non-null.
pub fn derive_key_with_fields<S: AsRef<str>>(
    namespace: &str,
    fields: &[S],
    params: &Map<String, Value>,
) -> Result<CacheKey, ValidationError> {
    let mut pairs: Vec<(&str, Option<&Value>)> = Vec::with_capacity(params.len() + fields.len());

    for (name, value) in params {
        validate_key_param(name, value)?;
        let declared = fields.iter().any(|f| f.as_ref() == name);
        if value.is_null() && !declared {
            continue;
        }
        pairs.push((name.as_str(), Some(value)));
    }
    for field in fields {
        let field = field.as_ref();
        if !params.contains_key(field) {
            pairs.push((field, None));
        }
    }

    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);

    let mut raw = escape(namespace);
    for (i, (name, value)) in pairs.iter().enumerate() {
        raw.push(if i == 0 { '?' } else { '&' });
        raw.push_str(&escape(name));
        raw.push('=');
        match value {
            Some(Value::String(s)) => raw.push_str(&escape(s)),
            Some(Value::Null) | None => raw.push_str(MISSING_PARAM_PLACEHOLDER),
            Some(Value::Number(n)) => raw.push_str(&canonical_number(n)),
            Some(other) => raw.push_str(&other.to_string()),
        }
    }

    Ok(CacheKey {
        namespace: namespace.to_string(),
        fields: normalize_fields(fields),
        raw,
    })
}

pub(crate) fn normalize_fields<S: AsRef<str>>(fields: &[S]) -> Vec<String> {
    let mut fields: Vec<String> = fields.iter().map(|f| f.as_ref().to_string()).collect();
    fields.sort();
    fields.dedup();
    fields
}

// `1`, `1.0` and `-0.0` style spellings of one value render identically.
fn canonical_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }

    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

// Separators must not leak out of names or values, otherwise `a=1&b=2` could
// be produced by a single parameter.
fn escape(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '?' => out.push_str("%3F"),
            _ => out.push(c),
        }
    }
    out
}
