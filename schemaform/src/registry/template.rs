//! Array and object templates.
//!
//! Templates only arrange already rendered children. Item identity,
//! capability flags and defaults are computed before they are called.

use serde_json::Value;

use crate::{array::ItemId, plan::FieldEdit, render::RenderNode};

/// One rendered array item plus what may be done with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItemProps {
    pub index: usize,
    /// Stable identity to key the item's widgets on.
    pub key: ItemId,
    pub element: RenderNode,
    pub has_move_up: bool,
    pub has_move_down: bool,
    pub has_remove: bool,
    pub on_move_up: FieldEdit,
    pub on_move_down: FieldEdit,
    pub on_remove: FieldEdit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTemplateProps {
    pub id: String,
    pub title: Option<String>,
    pub items: Vec<ArrayItemProps>,
    pub can_add: bool,
    pub on_add: FieldEdit,
    pub disabled: bool,
    pub readonly: bool,
}

impl ArrayTemplateProps {
    fn editable(&self) -> bool {
        !self.disabled && !self.readonly
    }
}

/// One rendered object property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyProps {
    pub name: String,
    pub element: RenderNode,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTemplateProps {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub properties: Vec<PropertyProps>,
}

pub trait ArrayTemplate: Send + Sync {
    fn arrange(&self, props: &ArrayTemplateProps) -> Vec<RenderNode>;
}

impl<F> ArrayTemplate for F
where
    F: Fn(&ArrayTemplateProps) -> Vec<RenderNode> + Send + Sync,
{
    fn arrange(&self, props: &ArrayTemplateProps) -> Vec<RenderNode> {
        self(props)
    }
}

pub trait ObjectTemplate: Send + Sync {
    fn arrange(&self, props: &ObjectTemplateProps) -> Vec<RenderNode>;
}

impl<F> ObjectTemplate for F
where
    F: Fn(&ObjectTemplateProps) -> Vec<RenderNode> + Send + Sync,
{
    fn arrange(&self, props: &ObjectTemplateProps) -> Vec<RenderNode> {
        self(props)
    }
}

fn action(edit: &FieldEdit) -> Value {
    serde_json::to_value(edit).unwrap_or(Value::Null)
}

/// Wraps each item with its toolbar and appends an add button.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultArrayTemplate;

impl ArrayTemplate for DefaultArrayTemplate {
    fn arrange(&self, props: &ArrayTemplateProps) -> Vec<RenderNode> {
        let editable = props.editable();
        let mut nodes: Vec<RenderNode> = props
            .items
            .iter()
            .map(|item| {
                let id = format!("{}__item", item.element.id);
                let mut toolbar = Vec::new();
                if editable && item.has_move_up {
                    toolbar.push(
                        RenderNode::new("button", format!("{id}__up")).attr("action", action(&item.on_move_up)),
                    );
                }
                if editable && item.has_move_down {
                    toolbar.push(
                        RenderNode::new("button", format!("{id}__down"))
                            .attr("action", action(&item.on_move_down)),
                    );
                }
                if editable && item.has_remove {
                    toolbar.push(
                        RenderNode::new("button", format!("{id}__remove"))
                            .attr("action", action(&item.on_remove)),
                    );
                }
                RenderNode::new("array-item", id)
                    .attr("index", item.index)
                    .attr("key", item.key.get())
                    .child(item.element.clone())
                    .children(toolbar)
            })
            .collect();
        if editable && props.can_add {
            nodes.push(
                RenderNode::new("button", format!("{}__add", props.id)).attr("action", action(&props.on_add)),
            );
        }
        nodes
    }
}

/// Lays properties out in the given order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultObjectTemplate;

impl ObjectTemplate for DefaultObjectTemplate {
    fn arrange(&self, props: &ObjectTemplateProps) -> Vec<RenderNode> {
        props.properties.iter().map(|p| p.element.clone()).collect()
    }
}
