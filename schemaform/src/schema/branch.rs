//! `oneOf` / `anyOf` handling.
//!
//! Combinators are never merged eagerly. The resolver exposes the branch
//! list and [`BranchSelector`] picks the branch the current data fits best:
//! fewest structural errors, ties broken by declaration order. Selection is
//! recomputed from scratch on every call, so data that sits equally close
//! to two branches can flip the chosen shape between edits.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SchemaResolver;
use crate::validation::JsonSchemaValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeKind {
    #[serde(rename = "oneOf")]
    OneOf,
    #[serde(rename = "anyOf")]
    AnyOf,
}

impl CompositeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CompositeKind::OneOf => "oneOf",
            CompositeKind::AnyOf => "anyOf",
        }
    }
}

/// A combinator node split into its shared part and its branches.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub kind: CompositeKind,
    /// The node without the combinator keyword.
    pub base: Value,
    pub branches: Vec<Value>,
}

impl Composite {
    /// Display titles for the branches (`title`, else `Option N`).
    pub fn titles(&self) -> Vec<String> {
        self.branches
            .iter()
            .enumerate()
            .map(|(i, branch)| {
                branch
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Option {}", i + 1))
            })
            .collect()
    }
}

/// Which branch of a combinator node the data was matched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchChoice {
    pub kind: CompositeKind,
    pub selected: usize,
    pub titles: Vec<String>,
}

/// Splits a resolved node carrying `oneOf` (preferred) or `anyOf`.
///
/// Returns `None` for plain nodes and for empty branch lists.
pub fn composite(schema: &Value) -> Option<Composite> {
    let (kind, branches) = [CompositeKind::OneOf, CompositeKind::AnyOf]
        .into_iter()
        .find_map(|kind| {
            schema
                .get(kind.keyword())
                .and_then(Value::as_array)
                .filter(|b| !b.is_empty())
                .map(|b| (kind, b.clone()))
        })?;
    let mut base = schema.as_object().cloned().unwrap_or_default();
    base.remove(kind.keyword());
    Some(Composite {
        kind,
        base: Value::Object(base),
        branches,
    })
}

/// Compiled branch schemas, shared by every selector.
static BRANCHES: LazyLock<JsonSchemaValidator> =
    LazyLock::new(|| JsonSchemaValidator::with_capacity(64));

/// Chooses a combinator branch for a data value.
#[derive(Debug, Clone, Copy)]
pub struct BranchSelector<'r> {
    resolver: SchemaResolver<'r>,
}

impl<'r> BranchSelector<'r> {
    pub fn new(resolver: SchemaResolver<'r>) -> Self {
        Self { resolver }
    }

    /// Index of the branch with the fewest errors against `data`.
    ///
    /// Without data the first branch is chosen.
    pub fn select(&self, composite: &Composite, data: Option<&Value>) -> usize {
        let Some(data) = data else {
            return 0;
        };
        composite
            .branches
            .iter()
            .enumerate()
            .map(|(i, branch)| {
                let score = match self.resolver.resolve(branch) {
                    Ok(resolved) => {
                        let standalone = with_root_definitions(&resolved, self.resolver.root());
                        BRANCHES.collect(&standalone, data).len()
                    }
                    Err(err) => {
                        debug!("branch {i} of {} is unusable: {err}", composite.kind.keyword());
                        usize::MAX
                    }
                };
                (i, score)
            })
            // `min_by_key` keeps the first of equal minima.
            .min_by_key(|(_, score)| *score)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

/// Copies the root's `definitions` / `$defs` into a sub-schema so its
/// same-document references still resolve when it is validated alone.
fn with_root_definitions(schema: &Value, root: &Value) -> Value {
    let mut map: Map<String, Value> = schema.as_object().cloned().unwrap_or_default();
    for key in ["definitions", "$defs"] {
        if let Some(defs) = root.get(key) {
            map.entry(key.to_string()).or_insert_with(|| defs.clone());
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pets() -> Value {
        json!({
            "oneOf": [
                {
                    "title": "Cat",
                    "type": "object",
                    "properties": {"type": {"const": "cat"}},
                    "required": ["type"]
                },
                {
                    "title": "Dog",
                    "type": "object",
                    "properties": {"type": {"const": "dog"}},
                    "required": ["type"]
                }
            ]
        })
    }

    #[test]
    fn test_selects_matching_branch() {
        let root = pets();
        let resolver = SchemaResolver::new(&root);
        let composite = composite(&root).unwrap();
        assert_eq!(composite.titles(), vec!["Cat", "Dog"]);
        let selector = BranchSelector::new(resolver);
        assert_eq!(selector.select(&composite, Some(&json!({"type": "dog"}))), 1);
        assert_eq!(selector.select(&composite, Some(&json!({"type": "cat"}))), 0);
    }

    #[test]
    fn test_ties_go_to_first_declared() {
        let root = pets();
        let resolver = SchemaResolver::new(&root);
        let composite = composite(&root).unwrap();
        let selector = BranchSelector::new(resolver);
        assert_eq!(selector.select(&composite, Some(&json!({"type": "fish"}))), 0);
        assert_eq!(selector.select(&composite, Some(&json!({}))), 0);
        assert_eq!(selector.select(&composite, None), 0);
    }

    #[test]
    fn test_branch_refs_use_root_definitions() {
        let root = json!({
            "definitions": {
                "num": {"type": "number"},
                "text": {"type": "string"}
            },
            "anyOf": [{"$ref": "#/definitions/num"}, {"$ref": "#/definitions/text"}]
        });
        let resolver = SchemaResolver::new(&root);
        let composite = composite(&root).unwrap();
        assert_eq!(composite.kind, CompositeKind::AnyOf);
        let selector = BranchSelector::new(resolver);
        assert_eq!(selector.select(&composite, Some(&json!("hello"))), 1);
        assert_eq!(selector.select(&composite, Some(&json!(4))), 0);
    }

    #[test]
    fn test_effective_schema_folds_in_branch() {
        let root = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "oneOf": [
                {"properties": {"age": {"type": "integer"}}, "required": ["age"]},
                {"properties": {"email": {"type": "string"}}, "required": ["email"]}
            ]
        });
        let resolver = SchemaResolver::new(&root);
        let (effective, selected) = resolver
            .resolve_for_data(&root, Some(&json!({"email": "a@b.c"})))
            .unwrap();
        assert_eq!(selected.map(|c| c.selected), Some(1));
        assert!(effective["properties"].get("email").is_some());
        assert!(effective["properties"].get("name").is_some());
        assert!(effective.get("oneOf").is_none());
    }
}
