//! Converts values proposed by renderers into schema-typed data.
//!
//! Renderers for text inputs hand back strings even for numeric fields and
//! selectors may report the index of the chosen option. Values that cannot
//! be converted are kept verbatim so validation can flag them.

use serde_json::{Number, Value};

use crate::schema::{SchemaType, effective_type, enum_values};

/// Coerces `raw` against an already resolved schema node.
pub fn coerce_edit(schema: &Value, raw: Value) -> Value {
    if let Some(variants) = enum_values(schema) {
        return coerce_enum(variants, raw);
    }
    match (effective_type(schema, Some(&raw)), raw) {
        (Some(SchemaType::Integer), Value::String(text)) => parse_integer(&text),
        (Some(SchemaType::Number), Value::String(text)) => parse_number(&text),
        (Some(SchemaType::Boolean), Value::String(text)) => match text.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        (_, raw) => raw,
    }
}

/// A member value passes through; an integer is read as an index into the
/// variants, unless the enum has integer members of its own.
fn coerce_enum(variants: &[Value], raw: Value) -> Value {
    if variants.contains(&raw) {
        return raw;
    }
    let numeric_members = variants.iter().any(Value::is_number);
    match raw.as_u64() {
        Some(index) if !numeric_members => variants
            .get(index as usize)
            .cloned()
            .unwrap_or(raw),
        _ => raw,
    }
}

fn parse_integer(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    // `3.0` is still an integer.
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(f as i64),
        Ok(f) => Number::from_f64(f).map(Value::Number).unwrap_or_else(|| Value::String(text.to_string())),
        Err(_) => Value::String(text.to_string()),
    }
}

fn parse_number(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}
