//! Default values.
//!
//! [`DefaultComputer`] turns an (optionally partial) data value into one
//! that has every schema-declared property and tuple position filled in.
//! Existing values always win over defaults, except for `const` and
//! single-member `enum` nodes, whose value is fixed.

use serde_json::{Map, Value};

use crate::{
    error::SchemaError,
    schema::{
        AdditionalItems, ItemsLayout, SchemaResolver, SchemaType, effective_type, fixed_value,
        items_layout, schema_types,
    },
};

/// Computes schema-conformant defaults.
///
/// Pure: the same inputs always give the same output, and feeding the
/// output back in returns it unchanged.
#[derive(Debug, Clone, Copy)]
pub struct DefaultComputer<'r> {
    resolver: SchemaResolver<'r>,
    strict: bool,
}

impl<'r> DefaultComputer<'r> {
    pub fn new(resolver: SchemaResolver<'r>) -> Self {
        Self {
            resolver,
            strict: false,
        }
    }

    /// In strict mode a tuple with `additionalItems: false` rejects data
    /// longer than the tuple, and errors in nested schemas are returned
    /// instead of leaving that subtree untouched.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Default for `schema`, repairing `existing` when given.
    pub fn compute(&self, schema: &Value, existing: Option<&Value>) -> Result<Value, SchemaError> {
        Ok(self.fill(schema, existing)?.unwrap_or(Value::Null))
    }

    /// `None` means the node contributes nothing: it has no type, no
    /// `default` and no existing value.
    ///
    /// On `oneOf` / `anyOf` nodes the filled value may fit another branch
    /// better than the one it was filled from. Filling repeats from the
    /// new branch until the choice settles, at most once per branch.
    fn fill(&self, schema: &Value, existing: Option<&Value>) -> Result<Option<Value>, SchemaError> {
        let (effective, choice) = self.resolver.resolve_for_data(schema, existing)?;
        let mut value = self.fill_resolved(&effective, existing)?;
        let Some(choice) = choice else {
            return Ok(value);
        };
        let mut selected = choice.selected;
        for _ in 0..choice.titles.len() {
            let (effective, choice) = self.resolver.resolve_for_data(schema, value.as_ref())?;
            match choice {
                Some(next) if next.selected != selected => {
                    debug!("branch {selected} filled a value fitting branch {}", next.selected);
                    selected = next.selected;
                    value = self.fill_resolved(&effective, value.as_ref())?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn fill_resolved(
        &self,
        schema: &Value,
        existing: Option<&Value>,
    ) -> Result<Option<Value>, SchemaError> {
        if let Some(fixed) = fixed_value(schema) {
            return Ok(Some(fixed.clone()));
        }
        if existing.is_some_and(Value::is_null) && schema_types(schema).contains(SchemaType::Null) {
            return Ok(Some(Value::Null));
        }
        let declared = schema.get("default");
        match effective_type(schema, existing) {
            Some(SchemaType::Object) => self.object(schema, existing).map(Some),
            Some(SchemaType::Array) => self.array(schema, existing).map(Some),
            Some(ty) => Ok(Some(
                existing
                    .or(declared)
                    .cloned()
                    .unwrap_or_else(|| ty.zero_value()),
            )),
            None => Ok(existing.or(declared).cloned()),
        }
    }

    /// Runs [`Self::fill`] on a nested node.
    ///
    /// Outside strict mode a broken nested schema keeps the existing value.
    fn child(&self, schema: &Value, existing: Option<&Value>) -> Result<Option<Value>, SchemaError> {
        match self.fill(schema, existing) {
            Ok(value) => Ok(value),
            Err(err) if !self.strict => {
                warn!("leaving value untouched: {err}");
                Ok(existing.cloned())
            }
            Err(err) => Err(err),
        }
    }

    fn object(&self, schema: &Value, existing: Option<&Value>) -> Result<Value, SchemaError> {
        let mut out: Map<String, Value> = match existing {
            Some(Value::Object(map)) => map.clone(),
            _ => schema
                .get("default")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        };
        let properties = schema.get("properties").and_then(Value::as_object);

        match schema.get("additionalProperties") {
            Some(Value::Bool(false)) => {
                out.retain(|key, _| properties.is_some_and(|p| p.contains_key(key)));
            }
            Some(extra @ Value::Object(_)) => {
                let keys: Vec<String> = out
                    .keys()
                    .filter(|key| !properties.is_some_and(|p| p.contains_key(*key)))
                    .cloned()
                    .collect();
                for key in keys {
                    if let Some(value) = self.child(extra, out.get(&key))? {
                        out.insert(key, value);
                    }
                }
            }
            _ => {}
        }

        for (key, prop) in properties.into_iter().flatten() {
            if let Some(value) = self.child(prop, out.get(key))? {
                out.insert(key.clone(), value);
            }
        }
        Ok(Value::Object(out))
    }

    fn array(&self, schema: &Value, existing: Option<&Value>) -> Result<Value, SchemaError> {
        let current: Vec<Value> = match existing {
            Some(Value::Array(items)) => items.clone(),
            _ => schema
                .get("default")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };

        let out = match items_layout(schema) {
            ItemsLayout::List(items) => {
                let mut out = Vec::with_capacity(current.len());
                for value in &current {
                    out.push(self.child(items, Some(value))?.unwrap_or(Value::Null));
                }
                let min = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
                while out.len() < min {
                    out.push(self.child(items, None)?.unwrap_or(Value::Null));
                }
                out
            }
            ItemsLayout::Tuple { items, additional } => {
                let mut out = Vec::with_capacity(items.len().max(current.len()));
                for (i, position) in items.iter().enumerate() {
                    out.push(self.child(position, current.get(i))?.unwrap_or(Value::Null));
                }
                let extra = current.get(items.len()..).unwrap_or_default();
                match additional {
                    AdditionalItems::Forbidden if self.strict && !extra.is_empty() => {
                        return Err(SchemaError::TupleLengthMismatch {
                            expected: items.len(),
                            actual: current.len(),
                        });
                    }
                    AdditionalItems::Schema(tail) => {
                        for value in extra {
                            out.push(self.child(tail, Some(value))?.unwrap_or(Value::Null));
                        }
                    }
                    AdditionalItems::Forbidden | AdditionalItems::Any => {
                        out.extend(extra.iter().cloned());
                    }
                }
                out
            }
            ItemsLayout::Unconstrained => current,
        };
        Ok(Value::Array(out))
    }
}

/// Default for `schema` within the `root` document.
pub fn compute_default(
    schema: &Value,
    root: &Value,
    existing: Option<&Value>,
) -> Result<Value, SchemaError> {
    DefaultComputer::new(SchemaResolver::new(root)).compute(schema, existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults(schema: &Value, existing: Option<&Value>) -> Value {
        compute_default(schema, schema, existing).unwrap()
    }

    fn assert_idempotent(schema: &Value, existing: Option<&Value>) {
        let once = defaults(schema, existing);
        let twice = defaults(schema, Some(&once));
        assert_eq!(once, twice, "defaults must be idempotent for {schema}");
    }

    #[test]
    fn test_required_string_defaults_to_empty() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        });
        assert_eq!(defaults(&schema, Some(&json!({}))), json!({"name": ""}));
        assert_eq!(defaults(&schema, None), json!({"name": ""}));
    }

    #[test]
    fn test_zero_values_and_explicit_defaults() {
        let schema = json!({
            "type": "object",
            "properties": {
                "s": {"type": "string"},
                "n": {"type": "number"},
                "b": {"type": "boolean"},
                "o": {"type": "object"},
                "a": {"type": "array", "items": {"type": "string"}},
                "z": {"type": "null"},
                "d": {"type": "integer", "default": 7}
            }
        });
        assert_eq!(
            defaults(&schema, None),
            json!({"s": "", "n": 0, "b": false, "o": {}, "a": [], "z": null, "d": 7})
        );
    }

    #[test]
    fn test_existing_keys_kept_and_extras_dropped_when_closed() {
        let open = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert_eq!(
            defaults(&open, Some(&json!({"x": 1}))),
            json!({"x": 1, "a": ""})
        );

        let closed = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "additionalProperties": false
        });
        assert_eq!(defaults(&closed, Some(&json!({"x": 1, "a": "k"}))), json!({"a": "k"}));
    }

    #[test]
    fn test_wrong_typed_scalar_survives() {
        let schema = json!({"type": "object", "properties": {"age": {"type": "integer"}}});
        assert_eq!(
            defaults(&schema, Some(&json!({"age": "twelve"}))),
            json!({"age": "twelve"})
        );
    }

    #[test]
    fn test_const_overrides_existing() {
        let schema = json!({
            "type": "object",
            "properties": {
                "kind": {"const": "cat"},
                "one": {"enum": ["only"]}
            }
        });
        assert_eq!(
            defaults(&schema, Some(&json!({"kind": "dog", "one": "x"}))),
            json!({"kind": "cat", "one": "only"})
        );
    }

    #[test]
    fn test_list_items_repaired_and_padded() {
        let schema = json!({
            "type": "array",
            "minItems": 2,
            "items": {"type": "object", "properties": {"v": {"type": "integer", "default": 1}}}
        });
        assert_eq!(defaults(&schema, None), json!([{"v": 1}, {"v": 1}]));
        assert_eq!(
            defaults(&schema, Some(&json!([{}, {"v": 5}, {}]))),
            json!([{"v": 1}, {"v": 5}, {"v": 1}])
        );
    }

    #[test]
    fn test_tuple_length_reconciled() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": {"type": "object", "properties": {"x": {"type": "boolean"}}}
        });
        assert_eq!(defaults(&schema, Some(&json!(["a"]))), json!(["a", 0]));
        assert_eq!(
            defaults(&schema, Some(&json!(["a", 1, {}]))),
            json!(["a", 1, {"x": false}])
        );
    }

    #[test]
    fn test_tuple_mismatch_only_in_strict_mode() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "string"}],
            "additionalItems": false
        });
        let long = json!(["a", "b"]);
        assert_eq!(defaults(&schema, Some(&long)), long);

        let strict = DefaultComputer::new(SchemaResolver::new(&schema)).strict(true);
        assert_eq!(
            strict.compute(&schema, Some(&long)),
            Err(SchemaError::TupleLengthMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_object_default_keyword_is_starting_point() {
        let schema = json!({
            "type": "object",
            "default": {"a": "from default"},
            "properties": {"a": {"type": "string"}, "b": {"type": "boolean"}}
        });
        assert_eq!(defaults(&schema, None), json!({"a": "from default", "b": false}));
    }

    #[test]
    fn test_one_of_defaults_follow_data() {
        let schema = json!({
            "type": "object",
            "oneOf": [
                {"properties": {"kind": {"const": "cat"}, "lives": {"type": "integer", "default": 9}}, "required": ["kind"]},
                {"properties": {"kind": {"const": "dog"}, "good": {"type": "boolean", "default": true}}, "required": ["kind"]}
            ]
        });
        assert_eq!(defaults(&schema, None), json!({"kind": "cat", "lives": 9}));
        assert_eq!(
            defaults(&schema, Some(&json!({"kind": "dog"}))),
            json!({"kind": "dog", "good": true})
        );
    }

    #[test]
    fn test_one_of_defaults_settle_on_fitting_branch() {
        let schema = json!({
            "type": "object",
            "oneOf": [
                {"properties": {"a": {"type": "string"}}, "required": ["b"]},
                {"properties": {"c": {"type": "integer"}}}
            ]
        });
        let once = defaults(&schema, None);
        assert_eq!(once, json!({"a": "", "c": 0}));
        assert_eq!(defaults(&schema, Some(&once)), once);
        assert_idempotent(&schema, Some(&json!({})));
    }

    #[test]
    fn test_recursive_schema_stops_at_data_depth() {
        let schema = json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/node"}}
                    }
                }
            },
            "$ref": "#/definitions/node"
        });
        assert_eq!(
            defaults(&schema, Some(&json!({"children": [{}]}))),
            json!({"children": [{"name": "", "children": []}], "name": ""})
        );
    }

    #[test]
    fn test_broken_property_left_alone() {
        let schema = json!({
            "type": "object",
            "properties": {
                "bad": {"$ref": "#/definitions/missing"},
                "ok": {"type": "string"}
            }
        });
        assert_eq!(defaults(&schema, Some(&json!({"bad": 1}))), json!({"bad": 1, "ok": ""}));
    }

    #[test]
    fn test_idempotence() {
        let schemas = [
            json!({"type": "object", "properties": {"a": {"type": "string"}, "b": {"type": "array", "items": {"type": "integer"}, "minItems": 1}}}),
            json!({"type": "array", "items": [{"type": "string"}, {"const": 3}], "additionalItems": false}),
            json!({"type": ["null", "object"], "properties": {"x": {"type": "number"}}}),
            json!({"anyOf": [{"type": "string", "default": "x"}, {"type": "number"}]}),
        ];
        let values = [None, Some(json!({})), Some(json!([1, 2, 3])), Some(json!("text")), Some(json!(null))];
        for schema in &schemas {
            for value in &values {
                assert_idempotent(schema, value.as_ref());
            }
        }
    }
}
