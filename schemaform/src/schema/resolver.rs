//! `$ref` and `allOf` resolution.
//!
//! Resolution is shallow: only the node handed to [`SchemaResolver::resolve`]
//! loses its `$ref` / `allOf`. Sub-schemas under `properties`, `items` and
//! friends are resolved when a caller descends into them, which keeps
//! recursive definitions finite for any finite data depth.

use serde_json::{Map, Value};

use super::branch::{BranchChoice, BranchSelector, composite};
use super::merge::merge_schemas;
use super::{items_layout, property_schema};
use crate::error::SchemaError;
use crate::path::{DataPath, PathSegment};

/// Resolves schema nodes against a root schema document.
#[derive(Debug, Clone, Copy)]
pub struct SchemaResolver<'r> {
    root: &'r Value,
}

impl<'r> SchemaResolver<'r> {
    pub fn new(root: &'r Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &'r Value {
        self.root
    }

    /// Resolves `$ref` and merges `allOf` on `schema` itself.
    ///
    /// `oneOf` / `anyOf` are left in place, see [`super::branch`].
    pub fn resolve(&self, schema: &Value) -> Result<Value, SchemaError> {
        let mut visiting = Vec::new();
        self.resolve_with(schema, &mut visiting)
    }

    fn resolve_with(&self, schema: &Value, visiting: &mut Vec<String>) -> Result<Value, SchemaError> {
        let schema = match schema {
            Value::Bool(true) => return Ok(Value::Object(Map::new())),
            Value::Bool(false) => {
                return Err(SchemaError::Unsatisfiable {
                    keyword: "false".into(),
                });
            }
            Value::Object(_) => schema,
            other => {
                return Err(SchemaError::malformed(
                    "schema",
                    format!("expected an object or boolean, found {other}"),
                ));
            }
        };

        if let Some(reference) = schema.get("$ref") {
            let reference = reference
                .as_str()
                .ok_or_else(|| SchemaError::malformed("$ref", "expected a string"))?;
            if visiting.iter().any(|r| r == reference) {
                return Err(SchemaError::CyclicRef {
                    reference: reference.to_string(),
                });
            }
            let target = self.lookup(reference)?;
            debug!("resolved `{reference}`");

            // Sibling keywords of `$ref` override the target's.
            let mut local = schema.as_object().cloned().unwrap_or_default();
            local.remove("$ref");
            let combined = match target {
                Value::Object(map) => {
                    let mut map = map.clone();
                    for (k, v) in local {
                        map.insert(k, v);
                    }
                    Value::Object(map)
                }
                other if local.is_empty() => other.clone(),
                _ => Value::Object(local),
            };

            visiting.push(reference.to_string());
            let resolved = self.resolve_with(&combined, visiting);
            visiting.pop();
            return resolved;
        }

        if let Some(members) = schema.get("allOf") {
            let members = members
                .as_array()
                .ok_or_else(|| SchemaError::malformed("allOf", "expected a list of schemas"))?;
            let mut base = schema.as_object().cloned().unwrap_or_default();
            base.remove("allOf");
            let mut merged = Value::Object(base);
            for member in members {
                let member = self.resolve_with(member, visiting)?;
                merged = merge_schemas(&merged, &member)?;
            }
            return Ok(merged);
        }

        Ok(schema.clone())
    }

    /// Looks a `$ref` up inside the root document.
    ///
    /// Only same-document references are supported.
    fn lookup(&self, reference: &str) -> Result<&'r Value, SchemaError> {
        reference
            .strip_prefix('#')
            .and_then(|pointer| self.root.pointer(pointer))
            .ok_or_else(|| SchemaError::UnresolvableRef {
                reference: reference.to_string(),
            })
    }

    /// Resolves `schema` and, for `oneOf` / `anyOf` nodes, folds in the
    /// branch best matching `data`.
    ///
    /// Returns the effective schema and the branch that was chosen.
    pub fn resolve_for_data(
        &self,
        schema: &Value,
        data: Option<&Value>,
    ) -> Result<(Value, Option<BranchChoice>), SchemaError> {
        let resolved = self.resolve(schema)?;
        let Some(composite) = composite(&resolved) else {
            return Ok((resolved, None));
        };
        let selected = BranchSelector::new(*self).select(&composite, data);
        let branch = self.resolve(&composite.branches[selected])?;
        let effective = merge_schemas(&composite.base, &branch)?;
        let choice = BranchChoice {
            kind: composite.kind,
            selected,
            titles: composite.titles(),
        };
        Ok((effective, Some(choice)))
    }

    /// Effective schema governing the value at `path` inside `data`.
    ///
    /// Each segment is resolved only when reached, and combinator branches
    /// are chosen from the data found along the way.
    pub fn retrieve_at(&self, path: &DataPath, data: &Value) -> Result<Value, SchemaError> {
        let mut schema = self.resolve_for_data(self.root, Some(data))?.0;
        let mut node = Some(data);
        for segment in path.segments() {
            let child = match segment {
                PathSegment::Key(key) => {
                    node = node.and_then(|n| n.get(key));
                    property_schema(&schema, key)
                }
                PathSegment::Index(index) => {
                    node = node.and_then(|n| n.get(*index));
                    items_layout(&schema).schema_for(*index)
                }
            };
            schema = self.resolve_for_data(&child, node)?.0;
        }
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_definition_ref() {
        let root = json!({
            "definitions": {"name": {"type": "string", "title": "Name"}},
            "properties": {"name": {"$ref": "#/definitions/name", "title": "Full name"}}
        });
        let resolver = SchemaResolver::new(&root);
        let resolved = resolver.resolve(&root["properties"]["name"]).unwrap();
        assert_eq!(resolved, json!({"type": "string", "title": "Full name"}));
    }

    #[test]
    fn test_ref_pointer_unescapes_tokens() {
        let root = json!({
            "definitions": {"a/b": {"type": "string"}, "c~d": {"type": "number"}},
            "items": [{"type": "boolean"}]
        });
        let resolver = SchemaResolver::new(&root);
        let resolve = |reference: &str| resolver.resolve(&json!({"$ref": reference}));
        assert_eq!(resolve("#/definitions/a~1b").unwrap(), json!({"type": "string"}));
        assert_eq!(resolve("#/definitions/c~0d").unwrap(), json!({"type": "number"}));
        assert_eq!(resolve("#/items/0").unwrap(), json!({"type": "boolean"}));
        assert!(matches!(
            resolve("#definitions"),
            Err(SchemaError::UnresolvableRef { .. })
        ));
    }

    #[test]
    fn test_unresolvable_ref() {
        let root = json!({"definitions": {}});
        let resolver = SchemaResolver::new(&root);
        assert_eq!(
            resolver.resolve(&json!({"$ref": "#/definitions/missing"})),
            Err(SchemaError::UnresolvableRef {
                reference: "#/definitions/missing".into()
            })
        );
    }

    #[test]
    fn test_cyclic_ref_is_rejected() {
        let root = json!({
            "definitions": {
                "a": {"$ref": "#/definitions/b"},
                "b": {"$ref": "#/definitions/a"}
            }
        });
        let resolver = SchemaResolver::new(&root);
        let err = resolver.resolve(&json!({"$ref": "#/definitions/a"})).unwrap_err();
        assert!(
            matches!(err, SchemaError::CyclicRef { .. }),
            "expected a cycle, got {err:?}"
        );

        let self_root = json!({"$ref": "#"});
        let resolver = SchemaResolver::new(&self_root);
        assert!(matches!(
            resolver.resolve(&self_root),
            Err(SchemaError::CyclicRef { .. })
        ));
    }

    #[test]
    fn test_recursive_definition_resolves_lazily() {
        let root = json!({
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
        let resolver = SchemaResolver::new(&root);
        let resolved = resolver.resolve(&root).unwrap();
        assert_eq!(resolved["type"], json!("object"));

        let data = json!({"name": "a", "children": [{"name": "b", "children": []}]});
        let deep = resolver
            .retrieve_at(&crate::path!["children", 0, "name"], &data)
            .unwrap();
        assert_eq!(deep, json!({"type": "string"}));
    }

    #[test]
    fn test_same_definition_used_twice_is_not_a_cycle() {
        let root = json!({
            "definitions": {"s": {"type": "string"}},
            "allOf": [
                {"properties": {"a": {"$ref": "#/definitions/s"}}},
                {"properties": {"b": {"$ref": "#/definitions/s"}}}
            ]
        });
        let resolver = SchemaResolver::new(&root);
        let resolved = resolver.resolve(&root).unwrap();
        assert_eq!(
            resolver.resolve(&resolved["properties"]["b"]).unwrap(),
            json!({"type": "string"})
        );
    }

    #[test]
    fn test_all_of_merge_and_conflict() {
        let root = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}},
                {"properties": {"b": {"type": "integer"}}, "required": ["b"]}
            ]
        });
        let resolver = SchemaResolver::new(&root);
        let resolved = resolver.resolve(&root).unwrap();
        assert_eq!(resolved["properties"]["b"], json!({"type": "integer"}));
        assert_eq!(resolved["required"], json!(["b"]));

        let bad = json!({"allOf": [{"type": "string"}, {"type": "boolean"}]});
        assert!(matches!(
            SchemaResolver::new(&bad).resolve(&bad),
            Err(SchemaError::Unsatisfiable { .. })
        ));
    }

    #[test]
    fn test_retrieve_tuple_positions() {
        let root = json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": {"type": "boolean"}
        });
        let resolver = SchemaResolver::new(&root);
        let data = json!(["a", 1, true, false]);
        assert_eq!(
            resolver.retrieve_at(&crate::path![1], &data).unwrap(),
            json!({"type": "number"})
        );
        assert_eq!(
            resolver.retrieve_at(&crate::path![3], &data).unwrap(),
            json!({"type": "boolean"})
        );
    }
}
