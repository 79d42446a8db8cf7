//! Value to node conversion for render-node outlets.

use super::render::TemplateValue;
use crate::dom::{Mountable, Node};
use crate::error::RenderErrorKind;
use crate::reactive::{ReadSignal, SubscribeMode};
use crate::value::Value;

/// Convert a slot value into the node that replaces its outlet.
///
/// Plain values become text nodes and nodes are inserted as they are.
/// Signals become text nodes that follow the signal while mounted; a signal
/// holding a node contributes that node's text.
pub fn value_to_node(value: &TemplateValue) -> Result<Node, RenderErrorKind> {
    match value {
        TemplateValue::Value(value) => Ok(plain_to_node(value)),
        TemplateValue::Component(component) => Ok(component.node()),
        TemplateValue::Listener(_) => Err(RenderErrorKind::UnrenderableValue),
        TemplateValue::Signal(_) | TemplateValue::Writable(_) | TemplateValue::Derive(_) => value
            .readable()
            .map(|signal| signal_to_node(&signal))
            .ok_or(RenderErrorKind::UnrenderableValue),
    }
}

fn plain_to_node(value: &Value) -> Node {
    match value {
        Value::Node(node) => node.clone(),
        value => Node::text(text_of(value)),
    }
}

fn text_of(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn signal_to_node(signal: &ReadSignal<Value>) -> Node {
    let text = Node::text(text_of(&signal.get()));
    let weak = text.downgrade();
    text.follow(
        signal,
        move |value| {
            if let Some(text) = weak.upgrade() {
                text.set_text(text_of(value));
            }
        },
        SubscribeMode::Immediate,
    );
    text
}
