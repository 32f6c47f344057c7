//! Render driver.
//!
//! [`render`] turns a [`FieldPlan`] into a [`RenderNode`] tree: children
//! first, then the array / object template arranges them, then the node's
//! renderer wraps the result. Drawing the tree is the host's business.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    plan::{FieldEdit, FieldPlan},
    registry::{
        ArrayItemProps, ArrayTemplateProps, FieldProps, FieldRegistry, ObjectTemplateProps,
        PropertyProps, RendererKind,
    },
};

/// Renderer-neutral output element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    /// What to draw, e.g. `text`, `select`, `array-item`.
    pub element: String,
    pub id: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(element: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            id: id.into(),
            attrs: Map::new(),
            children: Vec::new(),
        }
    }

    /// Sets an attribute; `null` values are skipped.
    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.attrs.insert(key.to_string(), value);
        }
        self
    }

    pub fn child(mut self, node: RenderNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = RenderNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Depth-first search by id.
    pub fn find(&self, id: &str) -> Option<&RenderNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Renders `plan` with the renderers and templates of `registry`.
pub fn render(plan: &FieldPlan, registry: &FieldRegistry) -> RenderNode {
    let rendered: Vec<RenderNode> = plan
        .children
        .iter()
        .map(|child| render(child, registry))
        .collect();

    let arranged = match (&plan.renderer, &plan.array) {
        (RendererKind::Array, Some(array)) => {
            let items = rendered
                .into_iter()
                .zip(&array.items)
                .map(|(element, item)| ArrayItemProps {
                    index: item.index,
                    key: item.id,
                    element,
                    has_move_up: item.capabilities.has_move_up,
                    has_move_down: item.capabilities.has_move_down,
                    has_remove: item.capabilities.has_remove,
                    on_move_up: FieldEdit::MoveUp {
                        path: plan.path.clone(),
                        index: item.index,
                    },
                    on_move_down: FieldEdit::MoveDown {
                        path: plan.path.clone(),
                        index: item.index,
                    },
                    on_remove: FieldEdit::Remove {
                        path: plan.path.clone(),
                        index: item.index,
                    },
                })
                .collect();
            let props = ArrayTemplateProps {
                id: plan.id.clone(),
                title: plan.title.clone(),
                items,
                can_add: array.can_add,
                on_add: FieldEdit::Add {
                    path: plan.path.clone(),
                    after: None,
                },
                disabled: plan.disabled,
                readonly: plan.readonly,
            };
            registry.array_template(plan.ui.array_template()).arrange(&props)
        }
        (RendererKind::Object, _) => {
            let properties = rendered
                .into_iter()
                .zip(&plan.children)
                .map(|(element, child)| PropertyProps {
                    name: child.name.clone().unwrap_or_default(),
                    element,
                    hidden: child.hidden,
                })
                .collect();
            let props = ObjectTemplateProps {
                id: plan.id.clone(),
                title: plan.title.clone(),
                description: plan.description.clone(),
                properties,
            };
            registry
                .object_template(plan.ui.object_template())
                .arrange(&props)
        }
        _ => rendered,
    };

    let props = FieldProps::from_plan(plan, arranged);
    registry.renderer_for(&plan.renderer).render(&props)
}
