//! Resolved field plans.
//!
//! A [`FieldPlan`] tree is rebuilt for every render pass from the schema,
//! the UI hints, the data and the current errors. The only state that
//! outlives a pass is the array item identities held in an [`ArrayStore`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    array::{ArrayConstraints, ArrayStore, ItemCapabilities, ItemId},
    config::FormConfig,
    path::{DataPath, PathSegment},
    registry::{FieldRegistry, RendererKind},
    schema::{BranchChoice, SchemaResolver, items_layout, property_schema, required_names},
    ui::UiHints,
    validation::{ErrorEntry, ErrorSet},
};

/// An edit proposed by a renderer or template, applied with
/// [`crate::controller::FormController::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldEdit {
    Change { path: DataPath, value: Value },
    Add { path: DataPath, after: Option<usize> },
    Remove { path: DataPath, index: usize },
    MoveUp { path: DataPath, index: usize },
    MoveDown { path: DataPath, index: usize },
    Replace { path: DataPath, index: usize, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A schema, hint or registry problem pinned to the subtree it affects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub path: DataPath,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayItemPlan {
    pub index: usize,
    pub id: ItemId,
    #[serde(flatten)]
    pub capabilities: ItemCapabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayPlan {
    pub items: Vec<ArrayItemPlan>,
    pub can_add: bool,
    pub fixed: bool,
}

/// One node of the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPlan {
    pub path: DataPath,
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Effective schema: references resolved, chosen branch folded in.
    pub schema: Value,
    pub ui: UiHints,
    pub renderer: RendererKind,
    pub widget: Option<String>,
    pub value: Value,
    pub required: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub hidden: bool,
    pub errors: Vec<ErrorEntry>,
    pub branch: Option<BranchChoice>,
    pub array: Option<ArrayPlan>,
    pub children: Vec<FieldPlan>,
}

impl FieldPlan {
    /// The node at `path`, if it is part of this tree.
    pub fn find(&self, path: &DataPath) -> Option<&FieldPlan> {
        if &self.path == path {
            return Some(self);
        }
        self.children
            .iter()
            .filter(|c| path.starts_with(&c.path))
            .find_map(|c| c.find(path))
    }

    pub fn find_id(&self, id: &str) -> Option<&FieldPlan> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_id(id))
    }
}

/// A plan tree and the problems found while building it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPlan {
    pub root: FieldPlan,
    pub diagnostics: Vec<Diagnostic>,
}

/// Where a node sits and what it inherits from its parent.
struct Slot {
    path: DataPath,
    id: String,
    name: Option<String>,
    required: bool,
    disabled: bool,
    readonly: bool,
}

/// Builds [`FormPlan`]s.
pub struct PlanBuilder<'a> {
    resolver: SchemaResolver<'a>,
    registry: &'a FieldRegistry,
    config: &'a FormConfig,
    arrays: &'a mut ArrayStore,
    errors: Option<&'a ErrorSet>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(
        root: &'a Value,
        registry: &'a FieldRegistry,
        config: &'a FormConfig,
        arrays: &'a mut ArrayStore,
    ) -> Self {
        Self {
            resolver: SchemaResolver::new(root),
            registry,
            config,
            arrays,
            errors: None,
            diagnostics: Vec::new(),
        }
    }

    /// Attaches validation errors to the nodes at their paths.
    pub fn errors(mut self, errors: &'a ErrorSet) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn build(mut self, ui: &UiHints, data: &Value) -> FormPlan {
        let slot = Slot {
            path: DataPath::root(),
            id: self.config.id_prefix.clone(),
            name: None,
            required: false,
            disabled: self.config.disabled,
            readonly: self.config.readonly,
        };
        let root = self.node(self.resolver.root(), ui.clone(), Some(data), slot);
        FormPlan {
            root,
            diagnostics: self.diagnostics,
        }
    }

    fn diagnose(&mut self, path: &DataPath, severity: Severity, message: String) {
        match severity {
            Severity::Warning => warn!("{path}: {message}"),
            Severity::Error => error!("{path}: {message}"),
        }
        self.diagnostics.push(Diagnostic {
            path: path.clone(),
            severity,
            message,
        });
    }

    fn errors_at(&self, path: &DataPath) -> Vec<ErrorEntry> {
        self.errors
            .map(|errors| errors.at(path).cloned().collect())
            .unwrap_or_default()
    }

    fn node(&mut self, raw: &Value, ui: UiHints, value: Option<&Value>, slot: Slot) -> FieldPlan {
        let title = ui
            .title()
            .map(str::to_string)
            .or_else(|| raw.get("title").and_then(Value::as_str).map(str::to_string))
            .or_else(|| slot.name.clone());

        let (schema, branch) = match self.resolver.resolve_for_data(raw, value) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.diagnose(&slot.path, Severity::Error, err.to_string());
                return FieldPlan {
                    errors: self.errors_at(&slot.path),
                    path: slot.path,
                    id: slot.id,
                    name: slot.name,
                    title,
                    description: None,
                    schema: raw.clone(),
                    ui,
                    renderer: RendererKind::Unsupported,
                    widget: None,
                    value: value.cloned().unwrap_or(Value::Null),
                    required: slot.required,
                    disabled: slot.disabled,
                    readonly: slot.readonly,
                    hidden: false,
                    branch: None,
                    array: None,
                    children: Vec::new(),
                };
            }
        };

        let selection = self.registry.select(&schema, &ui, value);
        if let Some(warning) = &selection.warning {
            self.diagnose(&slot.path, Severity::Warning, warning.to_string());
        }

        let title = ui
            .title()
            .map(str::to_string)
            .or_else(|| schema.get("title").and_then(Value::as_str).map(str::to_string))
            .or(title);
        let description = ui
            .description()
            .or_else(|| schema.get("description").and_then(Value::as_str))
            .map(str::to_string);
        let disabled = slot.disabled || ui.disabled();
        let readonly = slot.readonly
            || ui.readonly()
            || schema.get("readOnly").and_then(Value::as_bool).unwrap_or(false);

        let mut plan = FieldPlan {
            errors: self.errors_at(&slot.path),
            path: slot.path,
            id: slot.id,
            name: slot.name,
            title,
            description,
            hidden: ui.hidden(),
            renderer: selection.kind,
            widget: selection.widget,
            value: value.cloned().unwrap_or(Value::Null),
            required: slot.required,
            disabled,
            readonly,
            branch,
            array: None,
            children: Vec::new(),
            schema,
            ui,
        };

        if plan.renderer == RendererKind::Object {
            plan.children = self.object_children(&plan, value);
        } else if plan.renderer == RendererKind::Array {
            let (children, array) = self.array_children(&plan, value);
            plan.children = children;
            plan.array = Some(array);
        }
        plan
    }

    fn object_children(&mut self, parent: &FieldPlan, value: Option<&Value>) -> Vec<FieldPlan> {
        let schema = &parent.schema;
        let declared = schema.get("properties").and_then(Value::as_object);
        let is_declared = |key: &str| declared.is_some_and(|p| p.contains_key(key));

        let mut names: Vec<String> = declared
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        if schema.get("additionalProperties").is_some_and(Value::is_object) {
            if let Some(Value::Object(data)) = value {
                names.extend(data.keys().filter(|k| !is_declared(k)).cloned());
            }
        }

        let names = match parent.ui.order(&names) {
            Ok(ordered) => ordered,
            Err(err) => {
                self.diagnose(&parent.path, Severity::Warning, err.to_string());
                names
            }
        };

        let required = required_names(schema);
        let mut children = Vec::with_capacity(names.len());
        for name in names {
            let ui = if is_declared(&name) {
                parent.ui.property(&name)
            } else {
                parent.ui.additional_property()
            };
            let slot = Slot {
                path: parent.path.join(name.as_str()),
                id: self.config.child_id(&parent.id, &name),
                required: required.contains(&name.as_str()),
                disabled: parent.disabled,
                readonly: parent.readonly,
                name: Some(name.clone()),
            };
            let child_value = value.and_then(|v| v.get(&name));
            children.push(self.node(&property_schema(schema, &name), ui, child_value, slot));
        }
        children
    }

    fn array_children(&mut self, parent: &FieldPlan, value: Option<&Value>) -> (Vec<FieldPlan>, ArrayPlan) {
        let values: Vec<Value> = value
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let constraints = ArrayConstraints::from_schema(&parent.schema, &parent.ui);
        let entries = self.arrays.sync(&parent.path, &values).clone();
        let layout = items_layout(&parent.schema);

        let mut children = Vec::with_capacity(entries.len());
        let mut items = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let slot = Slot {
                path: parent.path.join(PathSegment::Index(index)),
                id: self.config.child_id(&parent.id, index),
                name: None,
                required: false,
                disabled: parent.disabled,
                readonly: parent.readonly,
            };
            children.push(self.node(
                &layout.schema_for(index),
                parent.ui.item(index),
                Some(&entry.value),
                slot,
            ));
            items.push(ArrayItemPlan {
                index,
                id: entry.id,
                capabilities: entries.capabilities(&constraints, index),
            });
        }
        let array = ArrayPlan {
            items,
            can_add: entries.can_add(&constraints),
            fixed: constraints.is_tuple(),
        };
        (children, array)
    }
}
