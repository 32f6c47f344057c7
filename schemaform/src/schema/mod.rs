//! JSON Schema handling.
//!
//! Schemas stay plain [`serde_json::Value`]s; this module adds the type
//! vocabulary the rest of the crate reasons with, plus:
//!
//! - [`resolver`] - `$ref` / `allOf` resolution and per-path lookup
//! - [`merge`] - `allOf` intersection rules
//! - [`branch`] - `oneOf` / `anyOf` branch listing and selection

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod branch;
pub mod merge;
pub mod resolver;

pub use branch::{BranchChoice, BranchSelector, Composite, CompositeKind, composite};
pub use resolver::SchemaResolver;

/// One JSON Schema primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl SchemaType {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "integer" => SchemaType::Integer,
            "boolean" => SchemaType::Boolean,
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "null" => SchemaType::Null,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Null => "null",
        }
    }

    /// The type a data value has on its own.
    ///
    /// Whole numbers report `Integer`.
    pub fn of_value(value: &Value) -> SchemaType {
        match value {
            Value::Null => SchemaType::Null,
            Value::Bool(_) => SchemaType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => SchemaType::Integer,
            Value::Number(_) => SchemaType::Number,
            Value::String(_) => SchemaType::String,
            Value::Array(_) => SchemaType::Array,
            Value::Object(_) => SchemaType::Object,
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (SchemaType::Number, Value::Number(_)) => true,
            (SchemaType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            (t, v) => *t == SchemaType::of_value(v),
        }
    }

    /// The zero value used when a schema declares no `default`.
    pub fn zero_value(&self) -> Value {
        match self {
            SchemaType::String => Value::String(String::new()),
            SchemaType::Number | SchemaType::Integer => Value::from(0),
            SchemaType::Boolean => Value::Bool(false),
            SchemaType::Object => Value::Object(Default::default()),
            SchemaType::Array => Value::Array(Vec::new()),
            SchemaType::Null => Value::Null,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, de-duplicated set of [`SchemaType`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(Vec<SchemaType>);

impl TypeSet {
    pub fn single(ty: SchemaType) -> Self {
        TypeSet(vec![ty])
    }

    pub fn insert(&mut self, ty: SchemaType) {
        if !self.0.contains(&ty) {
            self.0.push(ty);
        }
    }

    pub fn contains(&self, ty: SchemaType) -> bool {
        self.0.contains(&ty)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SchemaType> + '_ {
        self.0.iter().copied()
    }

    /// The only member, if there is exactly one.
    pub fn as_single(&self) -> Option<SchemaType> {
        match self.0.as_slice() {
            [ty] => Some(*ty),
            _ => None,
        }
    }

    /// Members present in both sets, in `self`'s order.
    ///
    /// `integer` satisfies `number`.
    pub fn intersect(&self, other: &TypeSet) -> TypeSet {
        let mut out = TypeSet::default();
        for ty in self.iter() {
            if other.contains(ty) {
                out.insert(ty);
            } else if ty == SchemaType::Integer && other.contains(SchemaType::Number) {
                out.insert(SchemaType::Integer);
            } else if ty == SchemaType::Number && other.contains(SchemaType::Integer) {
                out.insert(SchemaType::Integer);
            }
        }
        out
    }

    pub fn to_value(&self) -> Value {
        match self.as_single() {
            Some(ty) => Value::String(ty.as_str().to_string()),
            None => Value::Array(
                self.iter()
                    .map(|t| Value::String(t.as_str().to_string()))
                    .collect(),
            ),
        }
    }
}

/// Types declared by the `type` keyword, if any.
pub fn declared_types(schema: &Value) -> Option<TypeSet> {
    match schema.get("type")? {
        Value::String(name) => SchemaType::parse(name).map(TypeSet::single),
        Value::Array(names) => {
            let mut set = TypeSet::default();
            for ty in names.iter().filter_map(Value::as_str).filter_map(SchemaType::parse) {
                set.insert(ty);
            }
            Some(set)
        }
        _ => None,
    }
}

/// Declared types, or types implied by the keywords present.
pub fn schema_types(schema: &Value) -> TypeSet {
    if let Some(set) = declared_types(schema) {
        return set;
    }
    let mut set = TypeSet::default();
    if let Some(value) = schema.get("const") {
        set.insert(SchemaType::of_value(value));
    } else if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        for value in values {
            set.insert(SchemaType::of_value(value));
        }
    } else if schema.get("properties").is_some() || schema.get("additionalProperties").is_some() {
        set.insert(SchemaType::Object);
    } else if schema.get("items").is_some() {
        set.insert(SchemaType::Array);
    }
    set
}

/// Picks the one type a (resolved) schema node should be treated as.
///
/// A multi-type node is disambiguated by the data's shape, then by the
/// first non-null member.
pub fn effective_type(schema: &Value, data: Option<&Value>) -> Option<SchemaType> {
    let types = schema_types(schema);
    if let Some(ty) = types.as_single() {
        return Some(ty);
    }
    if let Some(value) = data.filter(|v| !v.is_null()) {
        if let Some(ty) = types.iter().find(|ty| ty.accepts(value)) {
            return Some(ty);
        }
    }
    types
        .iter()
        .find(|ty| *ty != SchemaType::Null)
        .or_else(|| types.iter().next())
}

/// `enum` members, if the keyword is present.
pub fn enum_values(schema: &Value) -> Option<&Vec<Value>> {
    schema.get("enum").and_then(Value::as_array)
}

/// The fixed value of a `const` or single-member `enum`.
pub fn fixed_value(schema: &Value) -> Option<&Value> {
    if let Some(value) = schema.get("const") {
        return Some(value);
    }
    match enum_values(schema).map(Vec::as_slice) {
        Some([value]) => Some(value),
        _ => None,
    }
}

/// Names listed under `required`.
pub fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// How an array schema lays out its items.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemsLayout<'a> {
    /// `items` is one schema for every element.
    List(&'a Value),
    /// `items` is a list of per-position schemas.
    Tuple {
        items: &'a [Value],
        additional: AdditionalItems<'a>,
    },
    /// No `items` keyword.
    Unconstrained,
}

/// What a tuple allows past its declared positions.
#[derive(Debug, Clone, PartialEq)]
pub enum AdditionalItems<'a> {
    Forbidden,
    Any,
    Schema(&'a Value),
}

pub fn items_layout(schema: &Value) -> ItemsLayout<'_> {
    match schema.get("items") {
        Some(Value::Array(items)) => {
            let additional = match schema.get("additionalItems") {
                Some(Value::Bool(false)) => AdditionalItems::Forbidden,
                Some(s @ Value::Object(_)) => AdditionalItems::Schema(s),
                _ => AdditionalItems::Any,
            };
            ItemsLayout::Tuple { items, additional }
        }
        Some(items) => ItemsLayout::List(items),
        None => ItemsLayout::Unconstrained,
    }
}

impl ItemsLayout<'_> {
    /// The schema governing the element at `index`.
    pub fn schema_for(&self, index: usize) -> Value {
        match self {
            ItemsLayout::List(items) => (*items).clone(),
            ItemsLayout::Tuple { items, additional } => match items.get(index) {
                Some(schema) => schema.clone(),
                None => match additional {
                    AdditionalItems::Schema(schema) => (*schema).clone(),
                    AdditionalItems::Any | AdditionalItems::Forbidden => Value::Object(Default::default()),
                },
            },
            ItemsLayout::Unconstrained => Value::Object(Default::default()),
        }
    }
}

/// Schema for a property of an object node: `properties[key]`, else an
/// `additionalProperties` schema, else the empty schema.
pub fn property_schema(schema: &Value, key: &str) -> Value {
    if let Some(prop) = schema.get("properties").and_then(|p| p.get(key)) {
        return prop.clone();
    }
    match schema.get("additionalProperties") {
        Some(extra @ Value::Object(_)) => extra.clone(),
        _ => Value::Object(Default::default()),
    }
}

/// A schema's display title, falling back to `name`.
pub fn title_of(schema: &Value, name: Option<&str>) -> Option<String> {
    schema
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| name.map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_inference() {
        assert_eq!(
            schema_types(&json!({"properties": {}})).as_single(),
            Some(SchemaType::Object)
        );
        assert_eq!(
            schema_types(&json!({"enum": ["a", "b"]})).as_single(),
            Some(SchemaType::String)
        );
        assert!(schema_types(&json!({})).is_empty());
    }

    #[test]
    fn test_effective_type_uses_data_shape() {
        let schema = json!({"type": ["null", "string", "number"]});
        assert_eq!(effective_type(&schema, Some(&json!(3.5))), Some(SchemaType::Number));
        assert_eq!(effective_type(&schema, Some(&json!("x"))), Some(SchemaType::String));
        assert_eq!(effective_type(&schema, None), Some(SchemaType::String));
    }

    #[test]
    fn test_intersect_integer_number() {
        let a = TypeSet::single(SchemaType::Integer);
        let b = TypeSet::single(SchemaType::Number);
        assert_eq!(a.intersect(&b).as_single(), Some(SchemaType::Integer));
        assert_eq!(b.intersect(&a).as_single(), Some(SchemaType::Integer));
        let s = TypeSet::single(SchemaType::String);
        assert!(s.intersect(&a).is_empty());
    }

    #[test]
    fn test_items_layout() {
        let tuple = json!({"items": [{"type": "string"}], "additionalItems": false});
        match items_layout(&tuple) {
            ItemsLayout::Tuple { items, additional } => {
                assert_eq!(items.len(), 1);
                assert_eq!(additional, AdditionalItems::Forbidden);
            }
            other => panic!("expected a tuple layout, got {other:?}"),
        }
        let list = json!({"items": {"type": "string"}});
        assert_eq!(items_layout(&list).schema_for(7), json!({"type": "string"}));
    }
}
