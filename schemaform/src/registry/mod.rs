//! Field registry.
//!
//! Picks a renderer for each schema node and holds the renderers and
//! templates a form can use. Built-in and caller-supplied renderers share
//! the [`Renderer`] trait and receive the same [`FieldProps`]; the
//! registry never distinguishes between them past selection.

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    path::DataPath,
    plan::{FieldEdit, FieldPlan},
    render::RenderNode,
    schema::{BranchChoice, SchemaType, effective_type, enum_values},
    ui::UiHints,
};

pub mod builtin;
pub mod template;

pub use template::{
    ArrayItemProps, ArrayTemplate, ArrayTemplateProps, DefaultArrayTemplate,
    DefaultObjectTemplate, ObjectTemplate, ObjectTemplateProps, PropertyProps,
};

/// Schema keyword naming a registered renderer for a custom type.
pub const RENDERER_MARKER: &str = "x-renderer";

/// Which renderer draws a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum RendererKind {
    Text,
    Number,
    Toggle,
    Select,
    Object,
    Array,
    Null,
    /// A renderer registered under this name.
    Custom(String),
    /// Inert placeholder for nodes nothing can draw.
    Unsupported,
}

impl RendererKind {
    /// Registry name; registering a renderer under a built-in name
    /// replaces the built-in.
    pub fn name(&self) -> &str {
        match self {
            RendererKind::Text => "text",
            RendererKind::Number => "number",
            RendererKind::Toggle => "toggle",
            RendererKind::Select => "select",
            RendererKind::Object => "object",
            RendererKind::Array => "array",
            RendererKind::Null => "null",
            RendererKind::Custom(name) => name,
            RendererKind::Unsupported => "unsupported",
        }
    }
}

/// Non-fatal problem found while selecting a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryWarning {
    #[error("`ui:field` names unknown renderer `{name}`")]
    UnknownField { name: String },
    #[error("`x-renderer` names unknown renderer `{name}`")]
    UnknownMarker { name: String },
    #[error("no renderer for schema {schema}")]
    Unsupported { schema: String },
}

/// Outcome of [`FieldRegistry::select`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub kind: RendererKind,
    pub widget: Option<String>,
    pub warning: Option<RegistryWarning>,
}

/// Everything a renderer gets to draw one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProps {
    pub id: String,
    pub path: DataPath,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub schema: Value,
    pub ui: UiHints,
    pub value: Value,
    pub widget: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub readonly: bool,
    pub hidden: bool,
    pub errors: Vec<String>,
    pub branch: Option<BranchChoice>,
    /// Children as arranged by the array or object template.
    pub children: Vec<RenderNode>,
}

impl FieldProps {
    pub fn from_plan(plan: &FieldPlan, children: Vec<RenderNode>) -> Self {
        Self {
            id: plan.id.clone(),
            path: plan.path.clone(),
            name: plan.name.clone(),
            title: plan.title.clone(),
            description: plan.description.clone(),
            schema: plan.schema.clone(),
            ui: plan.ui.clone(),
            value: plan.value.clone(),
            widget: plan.widget.clone(),
            required: plan.required,
            disabled: plan.disabled,
            readonly: plan.readonly,
            hidden: plan.hidden,
            errors: plan.errors.iter().map(|e| e.message.clone()).collect(),
            branch: plan.branch.clone(),
            children,
        }
    }

    /// The edit proposing `value` for this field.
    ///
    /// The controller decides how it is merged into the form data.
    pub fn on_change(&self, value: Value) -> FieldEdit {
        FieldEdit::Change {
            path: self.path.clone(),
            value,
        }
    }
}

/// Draws one schema node.
pub trait Renderer: Send + Sync {
    fn render(&self, props: &FieldProps) -> RenderNode;
}

impl<F> Renderer for F
where
    F: Fn(&FieldProps) -> RenderNode + Send + Sync,
{
    fn render(&self, props: &FieldProps) -> RenderNode {
        self(props)
    }
}

/// Named renderers and templates.
#[derive(Clone, Default)]
pub struct FieldRegistry {
    renderers: BTreeMap<String, Arc<dyn Renderer>>,
    array_templates: BTreeMap<String, Arc<dyn ArrayTemplate>>,
    object_templates: BTreeMap<String, Arc<dyn ObjectTemplate>>,
}

impl fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .field("array_templates", &self.array_templates.keys().collect::<Vec<_>>())
            .field("object_templates", &self.object_templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, renderer: Arc<dyn Renderer>) {
        self.renderers.insert(name.into(), renderer);
    }

    pub fn with_renderer(mut self, name: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        self.register(name, renderer);
        self
    }

    pub fn register_array_template(&mut self, name: impl Into<String>, template: Arc<dyn ArrayTemplate>) {
        self.array_templates.insert(name.into(), template);
    }

    pub fn register_object_template(
        &mut self,
        name: impl Into<String>,
        template: Arc<dyn ObjectTemplate>,
    ) {
        self.object_templates.insert(name.into(), template);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    /// Chooses the renderer for a resolved schema node.
    ///
    /// `ui:field` wins, then the schema's [`RENDERER_MARKER`], then
    /// inference from `enum` / `type`. Unknown names are reported and
    /// skipped; a node nothing matches gets [`RendererKind::Unsupported`].
    pub fn select(&self, schema: &Value, ui: &UiHints, value: Option<&Value>) -> Selection {
        let widget = ui.widget().map(str::to_string);
        let mut warning = None;

        if let Some(name) = ui.field() {
            if self.contains(name) {
                return Selection {
                    kind: RendererKind::Custom(name.to_string()),
                    widget,
                    warning,
                };
            }
            warning = Some(RegistryWarning::UnknownField {
                name: name.to_string(),
            });
        }

        if let Some(name) = schema.get(RENDERER_MARKER).and_then(Value::as_str) {
            if self.contains(name) {
                return Selection {
                    kind: RendererKind::Custom(name.to_string()),
                    widget,
                    warning,
                };
            }
            if warning.is_none() {
                warning = Some(RegistryWarning::UnknownMarker {
                    name: name.to_string(),
                });
            }
        }

        let inferred = if enum_values(schema).is_some() {
            Some(RendererKind::Select)
        } else {
            effective_type(schema, value).map(|ty| match ty {
                SchemaType::Boolean => match widget.as_deref() {
                    Some("select" | "radio") => RendererKind::Select,
                    _ => RendererKind::Toggle,
                },
                SchemaType::String => RendererKind::Text,
                SchemaType::Number | SchemaType::Integer => RendererKind::Number,
                SchemaType::Object => RendererKind::Object,
                SchemaType::Array => RendererKind::Array,
                SchemaType::Null => RendererKind::Null,
            })
        };

        match inferred {
            Some(kind) => {
                let widget = match kind {
                    RendererKind::Text => widget.or_else(|| {
                        schema.get("format").and_then(Value::as_str).map(str::to_string)
                    }),
                    _ => widget,
                };
                Selection {
                    kind,
                    widget,
                    warning,
                }
            }
            None => Selection {
                kind: RendererKind::Unsupported,
                widget,
                warning: Some(warning.unwrap_or_else(|| RegistryWarning::Unsupported {
                    schema: schema.to_string(),
                })),
            },
        }
    }

    /// The renderer registered for `kind`, else the built-in one.
    pub fn renderer_for(&self, kind: &RendererKind) -> Arc<dyn Renderer> {
        match self.renderers.get(kind.name()) {
            Some(renderer) => renderer.clone(),
            None => builtin::renderer(kind),
        }
    }

    pub fn array_template(&self, name: Option<&str>) -> Arc<dyn ArrayTemplate> {
        name.and_then(|n| self.array_templates.get(n))
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultArrayTemplate))
    }

    pub fn object_template(&self, name: Option<&str>) -> Arc<dyn ObjectTemplate> {
        name.and_then(|n| self.object_templates.get(n))
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultObjectTemplate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select(registry: &FieldRegistry, schema: Value, ui: Value) -> Selection {
        registry.select(&schema, &UiHints::new(ui), None)
    }

    fn stub() -> Arc<dyn Renderer> {
        Arc::new(|props: &FieldProps| RenderNode::new("stub", props.id.clone()))
    }

    #[test]
    fn test_builtin_inference() {
        let registry = FieldRegistry::new();
        let kind = |schema: Value| select(&registry, schema, Value::Null).kind;
        assert_eq!(kind(json!({"type": "string"})), RendererKind::Text);
        assert_eq!(kind(json!({"type": "integer"})), RendererKind::Number);
        assert_eq!(kind(json!({"type": "boolean"})), RendererKind::Toggle);
        assert_eq!(kind(json!({"type": "object"})), RendererKind::Object);
        assert_eq!(kind(json!({"type": "array"})), RendererKind::Array);
        assert_eq!(kind(json!({"type": "null"})), RendererKind::Null);
        assert_eq!(
            kind(json!({"type": "number", "enum": [1, 2]})),
            RendererKind::Select,
            "enum beats the base type"
        );
    }

    #[test]
    fn test_boolean_widgets() {
        let registry = FieldRegistry::new();
        let schema = json!({"type": "boolean"});
        assert_eq!(
            select(&registry, schema.clone(), json!({"ui:widget": "radio"})).kind,
            RendererKind::Select
        );
        assert_eq!(
            select(&registry, schema, json!({"ui:widget": "checkbox"})).kind,
            RendererKind::Toggle
        );
    }

    #[test]
    fn test_string_widget_from_format() {
        let registry = FieldRegistry::new();
        let selection = select(&registry, json!({"type": "string", "format": "email"}), Value::Null);
        assert_eq!(selection.widget.as_deref(), Some("email"));
        let selection = select(
            &registry,
            json!({"type": "string", "format": "email"}),
            json!({"ui:widget": "textarea"}),
        );
        assert_eq!(selection.widget.as_deref(), Some("textarea"));
    }

    #[test]
    fn test_ui_field_beats_enum() {
        let registry = FieldRegistry::new().with_renderer("colour", stub());
        let selection = select(
            &registry,
            json!({"type": "string", "enum": ["red", "blue"]}),
            json!({"ui:field": "colour"}),
        );
        assert_eq!(selection.kind, RendererKind::Custom("colour".into()));
        assert_eq!(selection.warning, None);
    }

    #[test]
    fn test_marker_selects_custom_renderer() {
        let registry = FieldRegistry::new().with_renderer("geo", stub());
        let selection = select(
            &registry,
            json!({"type": "object", "x-renderer": "geo"}),
            Value::Null,
        );
        assert_eq!(selection.kind, RendererKind::Custom("geo".into()));
    }

    #[test]
    fn test_unknown_names_warn_and_fall_through() {
        let registry = FieldRegistry::new();
        let selection = select(&registry, json!({"type": "string"}), json!({"ui:field": "nope"}));
        assert_eq!(selection.kind, RendererKind::Text);
        assert_eq!(
            selection.warning,
            Some(RegistryWarning::UnknownField {
                name: "nope".into()
            })
        );
    }

    #[test]
    fn test_unsupported_is_not_fatal() {
        let registry = FieldRegistry::new();
        let selection = select(&registry, json!({}), Value::Null);
        assert_eq!(selection.kind, RendererKind::Unsupported);
        assert!(matches!(selection.warning, Some(RegistryWarning::Unsupported { .. })));
    }

    #[test]
    fn test_registered_name_overrides_builtin() {
        let registry = FieldRegistry::new().with_renderer("text", stub());
        let node = registry.renderer_for(&RendererKind::Text).render(&FieldProps {
            id: "root".into(),
            path: DataPath::root(),
            name: None,
            title: None,
            description: None,
            schema: json!({"type": "string"}),
            ui: UiHints::default(),
            value: json!(""),
            widget: None,
            required: false,
            disabled: false,
            readonly: false,
            hidden: false,
            errors: Vec::new(),
            branch: None,
            children: Vec::new(),
        });
        assert_eq!(node.element, "stub");
    }
}
