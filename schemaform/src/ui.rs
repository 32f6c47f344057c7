//! UI hints: presentation overrides that run parallel to the schema tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::ConfigurationError,
    path::{DataPath, PathSegment},
};

/// Typed view over a UI hint node.
///
/// Keys are looked up as `ui:<name>` first and then inside `ui:options`.
/// Child nodes are keyed by property name, `items`, `additionalItems`
/// and `additionalProperties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UiHints(Value);

impl UiHints {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn hint(&self, name: &str) -> Option<&Value> {
        self.0.get(format!("ui:{name}")).or_else(|| {
            self.0
                .get("ui:options")
                .and_then(|options| options.get(name))
        })
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.hint(name).and_then(Value::as_str)
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.hint(name).and_then(Value::as_bool)
    }

    pub fn widget(&self) -> Option<&str> {
        self.text("widget")
    }

    /// Name of a registered renderer that takes over this node.
    pub fn field(&self) -> Option<&str> {
        self.text("field")
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    pub fn help(&self) -> Option<&str> {
        self.text("help")
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.text("placeholder")
    }

    pub fn class_names(&self) -> Option<&str> {
        self.0.get("classNames").and_then(Value::as_str)
    }

    pub fn readonly(&self) -> bool {
        self.flag("readonly").unwrap_or(false)
    }

    pub fn disabled(&self) -> bool {
        self.flag("disabled").unwrap_or(false)
    }

    pub fn autofocus(&self) -> bool {
        self.flag("autofocus").unwrap_or(false)
    }

    /// `ui:hidden`, or the `hidden` widget.
    pub fn hidden(&self) -> bool {
        self.flag("hidden").unwrap_or(false) || self.widget() == Some("hidden")
    }

    pub fn orderable(&self) -> bool {
        self.flag("orderable").unwrap_or(true)
    }

    pub fn addable(&self) -> bool {
        self.flag("addable").unwrap_or(true)
    }

    pub fn removable(&self) -> bool {
        self.flag("removable").unwrap_or(true)
    }

    pub fn array_template(&self) -> Option<&str> {
        self.0.get("ui:ArrayFieldTemplate").and_then(Value::as_str)
    }

    pub fn object_template(&self) -> Option<&str> {
        self.0.get("ui:ObjectFieldTemplate").and_then(Value::as_str)
    }

    /// Free-form `ui:options`.
    pub fn options(&self) -> Map<String, Value> {
        self.0
            .get("ui:options")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    fn child(&self, key: &str) -> UiHints {
        UiHints(self.0.get(key).cloned().unwrap_or(Value::Null))
    }

    /// Hints for the property `name`.
    pub fn property(&self, name: &str) -> UiHints {
        self.child(name)
    }

    /// Hints for a property governed by `additionalProperties`.
    pub fn additional_property(&self) -> UiHints {
        self.child("additionalProperties")
    }

    /// Hints for the item at `index`.
    ///
    /// An `items` list gives per-position hints; positions past its end
    /// use `additionalItems`.
    pub fn item(&self, index: usize) -> UiHints {
        match self.0.get("items") {
            Some(Value::Array(positions)) => match positions.get(index) {
                Some(hints) => UiHints(hints.clone()),
                None => self.child("additionalItems"),
            },
            Some(hints) => UiHints(hints.clone()),
            None => UiHints::default(),
        }
    }

    /// Hints for the node at `path`.
    pub fn at(&self, path: &DataPath) -> UiHints {
        path.segments()
            .iter()
            .fold(self.clone(), |hints, segment| match segment {
                PathSegment::Key(key) => hints.property(key),
                PathSegment::Index(index) => hints.item(*index),
            })
    }

    /// Arranges `names` (in schema order) according to `ui:order`.
    ///
    /// A single `*` stands for every property the list does not name, in
    /// schema order. Without a wildcard the list must name every property.
    pub fn order(&self, names: &[String]) -> Result<Vec<String>, ConfigurationError> {
        let Some(order) = self.0.get("ui:order") else {
            return Ok(names.to_vec());
        };
        let order: Vec<&str> = order
            .as_array()
            .ok_or(ConfigurationError::InvalidOrder)?
            .iter()
            .map(|v| v.as_str().ok_or(ConfigurationError::InvalidOrder))
            .collect::<Result<_, _>>()?;

        for (i, name) in order.iter().enumerate() {
            if *name != "*" && order[..i].contains(name) {
                return Err(ConfigurationError::DuplicateOrderEntry {
                    name: name.to_string(),
                });
            }
        }
        let wildcards = order.iter().filter(|n| **n == "*").count();
        if wildcards > 1 {
            return Err(ConfigurationError::MultipleWildcards);
        }
        let extraneous: Vec<String> = order
            .iter()
            .filter(|n| **n != "*" && !names.iter().any(|name| name == *n))
            .map(|n| n.to_string())
            .collect();
        if !extraneous.is_empty() {
            return Err(ConfigurationError::ExtraneousOrderEntry { names: extraneous });
        }

        let rest: Vec<String> = names
            .iter()
            .filter(|name| !order.contains(&name.as_str()))
            .cloned()
            .collect();
        if wildcards == 0 {
            if !rest.is_empty() {
                return Err(ConfigurationError::MissingOrderEntries { names: rest });
            }
            return Ok(order.iter().map(|n| n.to_string()).collect());
        }

        let mut out = Vec::with_capacity(names.len());
        for name in order {
            if name == "*" {
                out.extend(rest.iter().cloned());
            } else {
                out.push(name.to_string());
            }
        }
        Ok(out)
    }
}

impl From<Value> for UiHints {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hint_lookup_prefers_ui_key() {
        let hints = UiHints::new(json!({
            "ui:widget": "textarea",
            "ui:options": {"widget": "password", "placeholder": "type here", "addable": false}
        }));
        assert_eq!(hints.widget(), Some("textarea"));
        assert_eq!(hints.placeholder(), Some("type here"));
        assert!(!hints.addable());
        assert!(hints.removable());
        assert!(!hints.hidden());
    }

    #[test]
    fn test_hidden_widget() {
        assert!(UiHints::new(json!({"ui:widget": "hidden"})).hidden());
        assert!(UiHints::new(json!({"ui:hidden": true})).hidden());
    }

    #[test]
    fn test_child_hints() {
        let hints = UiHints::new(json!({
            "name": {"ui:autofocus": true},
            "items": [{"ui:widget": "a"}, {"ui:widget": "b"}],
            "additionalItems": {"ui:widget": "extra"}
        }));
        assert!(hints.property("name").autofocus());
        assert_eq!(hints.item(1).widget(), Some("b"));
        assert_eq!(hints.item(5).widget(), Some("extra"));
        assert_eq!(hints.property("missing"), UiHints::new(Value::Null));

        let all = UiHints::new(json!({"items": {"ui:widget": "same"}}));
        assert_eq!(all.item(3).widget(), Some("same"));

        let nested = UiHints::new(json!({"list": {"items": {"ui:help": "h"}}}));
        assert_eq!(nested.at(&crate::path!["list", 4]).help(), Some("h"));
    }

    #[test]
    fn test_order_with_wildcard() {
        let hints = UiHints::new(json!({"ui:order": ["c", "*", "a"]}));
        assert_eq!(
            hints.order(&names(&["a", "b", "c", "d"])).unwrap(),
            names(&["c", "b", "d", "a"])
        );
    }

    #[test]
    fn test_order_errors() {
        let all = names(&["a", "b"]);
        let check = |order: Value| UiHints::new(json!({ "ui:order": order })).order(&all);
        assert_eq!(check(json!("a")), Err(ConfigurationError::InvalidOrder));
        assert_eq!(
            check(json!(["a", "a", "b"])),
            Err(ConfigurationError::DuplicateOrderEntry { name: "a".into() })
        );
        assert_eq!(check(json!(["*", "*"])), Err(ConfigurationError::MultipleWildcards));
        assert_eq!(
            check(json!(["a", "b", "z"])),
            Err(ConfigurationError::ExtraneousOrderEntry {
                names: vec!["z".into()]
            })
        );
        assert_eq!(
            check(json!(["b"])),
            Err(ConfigurationError::MissingOrderEntries {
                names: vec!["a".into()]
            })
        );
        assert_eq!(check(json!(["b", "a"])).unwrap(), names(&["b", "a"]));
    }
}
