//! `allOf` merging.

use serde_json::{Map, Value, json};

use super::{TypeSet, declared_types};
use crate::error::SchemaError;

const LOWER_BOUNDS: &[&str] = &[
    "minimum",
    "exclusiveMinimum",
    "minLength",
    "minItems",
    "minProperties",
];

const UPPER_BOUNDS: &[&str] = &[
    "maximum",
    "exclusiveMaximum",
    "maxLength",
    "maxItems",
    "maxProperties",
];

/// Merges two already-resolved schema nodes into one node that describes
/// data satisfying both.
///
/// Nested schemas that both sides constrain (`properties` entries, `items`)
/// are combined lazily as `{"allOf": [left, right]}` and merged only when a
/// caller descends into them.
pub fn merge_schemas(left: &Value, right: &Value) -> Result<Value, SchemaError> {
    let left = as_object(left)?;
    let right = as_object(right)?;
    let mut out = left.clone();

    for (key, rhs) in &right {
        let Some(lhs) = left.get(key) else {
            out.insert(key.clone(), rhs.clone());
            continue;
        };
        let merged = match key.as_str() {
            "type" => merge_type(lhs, rhs)?,
            "enum" => merge_enum(lhs, rhs)?,
            "const" => {
                if lhs != rhs {
                    return Err(SchemaError::Unsatisfiable {
                        keyword: "const".into(),
                    });
                }
                lhs.clone()
            }
            "required" => merge_required(lhs, rhs),
            "properties" | "patternProperties" | "definitions" | "$defs" => {
                merge_keyed(lhs, rhs)
            }
            "items" if lhs.is_object() && rhs.is_object() => lazy_all_of(lhs, rhs),
            "additionalProperties" | "additionalItems" => match (lhs, rhs) {
                (Value::Bool(false), _) | (_, Value::Bool(false)) => Value::Bool(false),
                (Value::Object(_), Value::Object(_)) => lazy_all_of(lhs, rhs),
                (Value::Object(_), _) => lhs.clone(),
                _ => rhs.clone(),
            },
            k if LOWER_BOUNDS.contains(&k) => pick_number(lhs, rhs, f64::max),
            k if UPPER_BOUNDS.contains(&k) => pick_number(lhs, rhs, f64::min),
            _ => lhs.clone(),
        };
        out.insert(key.clone(), merged);
    }

    Ok(Value::Object(out))
}

fn as_object(schema: &Value) -> Result<Map<String, Value>, SchemaError> {
    match schema {
        Value::Object(map) => Ok(map.clone()),
        Value::Bool(true) => Ok(Map::new()),
        Value::Bool(false) => Err(SchemaError::Unsatisfiable {
            keyword: "false".into(),
        }),
        other => Err(SchemaError::malformed(
            "allOf",
            format!("expected a schema object, found {other}"),
        )),
    }
}

fn lazy_all_of(lhs: &Value, rhs: &Value) -> Value {
    json!({ "allOf": [lhs, rhs] })
}

fn merge_type(lhs: &Value, rhs: &Value) -> Result<Value, SchemaError> {
    let left = declared_types(&json!({ "type": lhs })).unwrap_or_default();
    let right = declared_types(&json!({ "type": rhs })).unwrap_or_default();
    let both: TypeSet = left.intersect(&right);
    if both.is_empty() {
        return Err(SchemaError::Unsatisfiable {
            keyword: "type".into(),
        });
    }
    Ok(both.to_value())
}

fn merge_enum(lhs: &Value, rhs: &Value) -> Result<Value, SchemaError> {
    let (Some(left), Some(right)) = (lhs.as_array(), rhs.as_array()) else {
        return Err(SchemaError::malformed("enum", "expected a list of values"));
    };
    let both: Vec<Value> = left.iter().filter(|v| right.contains(v)).cloned().collect();
    if both.is_empty() {
        return Err(SchemaError::Unsatisfiable {
            keyword: "enum".into(),
        });
    }
    Ok(Value::Array(both))
}

fn merge_required(lhs: &Value, rhs: &Value) -> Value {
    let mut names: Vec<Value> = lhs.as_array().cloned().unwrap_or_default();
    for name in rhs.as_array().into_iter().flatten() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    Value::Array(names)
}

fn merge_keyed(lhs: &Value, rhs: &Value) -> Value {
    let mut out = lhs.as_object().cloned().unwrap_or_default();
    for (key, schema) in rhs.as_object().into_iter().flatten() {
        let merged = match out.get(key) {
            Some(existing) if existing != schema => lazy_all_of(existing, schema),
            _ => schema.clone(),
        };
        out.insert(key.clone(), merged);
    }
    Value::Object(out)
}

fn pick_number(lhs: &Value, rhs: &Value, pick: fn(f64, f64) -> f64) -> Value {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => {
            if pick(a, b) == a {
                lhs.clone()
            } else {
                rhs.clone()
            }
        }
        (Some(_), None) => lhs.clone(),
        _ => rhs.clone(),
    }
}
