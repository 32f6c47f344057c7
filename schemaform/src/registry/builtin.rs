//! Built-in renderers.

use std::sync::Arc;

use serde_json::Value;

use super::{FieldProps, Renderer, RendererKind};
use crate::render::RenderNode;

/// The built-in renderer for `kind`.
///
/// Custom names nothing registered fall back to the placeholder.
pub fn renderer(kind: &RendererKind) -> Arc<dyn Renderer> {
    match kind {
        RendererKind::Text => Arc::new(TextRenderer),
        RendererKind::Number => Arc::new(NumberRenderer),
        RendererKind::Toggle => Arc::new(ToggleRenderer),
        RendererKind::Select => Arc::new(SelectRenderer),
        RendererKind::Object => Arc::new(ObjectRenderer),
        RendererKind::Array => Arc::new(ArrayRenderer),
        RendererKind::Null => Arc::new(NullRenderer),
        RendererKind::Custom(_) | RendererKind::Unsupported => Arc::new(UnsupportedRenderer),
    }
}

/// Common attributes of every field element.
fn field(element: &str, props: &FieldProps) -> RenderNode {
    let element = if props.hidden { "hidden" } else { element };
    let mut node = RenderNode::new(element, props.id.clone())
        .attr("title", props.title.clone())
        .attr("description", props.description.clone())
        .attr("help", props.ui.help().map(str::to_string))
        .attr("className", props.ui.class_names().map(str::to_string))
        .attr("widget", props.widget.clone());
    for (key, on) in [
        ("required", props.required),
        ("disabled", props.disabled),
        ("readonly", props.readonly),
        ("autofocus", props.ui.autofocus()),
    ] {
        if on {
            node = node.attr(key, true);
        }
    }
    if !props.errors.is_empty() {
        node = node.attr("errors", props.errors.clone());
    }
    node
}

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        let schema = &props.schema;
        field("text", props)
            .attr("value", props.value.clone())
            .attr("placeholder", props.ui.placeholder().map(str::to_string))
            .attr("minLength", schema.get("minLength").cloned())
            .attr("maxLength", schema.get("maxLength").cloned())
            .attr("pattern", schema.get("pattern").cloned())
    }
}

pub struct NumberRenderer;

impl Renderer for NumberRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        let schema = &props.schema;
        let step = schema.get("multipleOf").cloned().or_else(|| {
            (schema.get("type").and_then(Value::as_str) == Some("integer")).then(|| Value::from(1))
        });
        field("number", props)
            .attr("value", props.value.clone())
            .attr("min", schema.get("minimum").cloned())
            .attr("max", schema.get("maximum").cloned())
            .attr("step", step)
    }
}

pub struct ToggleRenderer;

impl Renderer for ToggleRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        field("toggle", props).attr("checked", props.value.as_bool().unwrap_or(false))
    }
}

/// Enums, and booleans drawn as a choice.
pub struct SelectRenderer;

impl Renderer for SelectRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        let values: Vec<Value> = match props.schema.get("enum").and_then(Value::as_array) {
            Some(values) => values.clone(),
            None => vec![Value::Bool(true), Value::Bool(false)],
        };
        let labels = props
            .ui
            .as_value()
            .get("ui:enumNames")
            .or_else(|| props.schema.get("enumNames"))
            .and_then(Value::as_array);
        let options: Vec<Value> = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let label = labels
                    .and_then(|l| l.get(i))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| match value {
                        Value::String(s) => s.clone(),
                        Value::Bool(true) => "Yes".to_string(),
                        Value::Bool(false) => "No".to_string(),
                        other => other.to_string(),
                    });
                serde_json::json!({"value": value, "label": label})
            })
            .collect();
        let selected = values.iter().position(|v| *v == props.value);
        field("select", props)
            .attr("options", options)
            .attr("selected", selected)
    }
}

pub struct ObjectRenderer;

impl Renderer for ObjectRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        field("object", props).children(props.children.iter().cloned())
    }
}

pub struct ArrayRenderer;

impl Renderer for ArrayRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        field("array", props).children(props.children.iter().cloned())
    }
}

pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        field("null", props)
    }
}

/// Inert placeholder.
pub struct UnsupportedRenderer;

impl Renderer for UnsupportedRenderer {
    fn render(&self, props: &FieldProps) -> RenderNode {
        RenderNode::new("unsupported", props.id.clone())
            .attr("title", props.title.clone())
            .attr("schema", props.schema.clone())
            .attr("errors", props.errors.clone())
    }
}
