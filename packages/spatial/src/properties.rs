//! Typed access to `GeoJSON` feature properties.
//!
//! County layers are inconsistent about types: numeric columns arrive as
//! JSON numbers in one export and as strings in the next, and identifiers
//! are sometimes numbers. These helpers accept both.

use serde_json::{Map, Value};

/// Reads a property as text, keeping blank strings.
///
/// Numbers and booleans are rendered as strings. Missing and `null`
/// values yield `None`; an all-whitespace string is returned as is.
#[must_use]
pub fn text_property(properties: Option<&Map<String, Value>>, name: &str) -> Option<String> {
    match properties?.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a property as text.
///
/// Like [`text_property`], but whitespace-only values also yield `None`.
#[must_use]
pub fn string_property(properties: Option<&Map<String, Value>>, name: &str) -> Option<String> {
    text_property(properties, name).filter(|text| !text.trim().is_empty())
}

/// Result of reading a numeric property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericProperty {
    /// A finite number.
    Value(f64),
    /// Missing, `null`, or an empty string.
    Missing,
    /// Present but not a finite number.
    Invalid,
}

/// Reads a property as a finite `f64`, accepting numeric strings.
#[must_use]
pub fn numeric_property(properties: Option<&Map<String, Value>>, name: &str) -> NumericProperty {
    let Some(value) = properties.and_then(|p| p.get(name)) else {
        return NumericProperty::Missing;
    };

    let parsed = match value {
        Value::Null => return NumericProperty::Missing,
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return NumericProperty::Missing,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => NumericProperty::Value(v),
        _ => NumericProperty::Invalid,
    }
}
