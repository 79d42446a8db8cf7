//! Template Shape
//!
//! Turns a token stream into the structural description of a template: what
//! each interpolation slot is for, which element it belongs to, and the HTML
//! to build the template fragment from.
//!
//! Slots are classified by the parser state at the end of the token before
//! them:
//!
//! - in text: a value outlet `<x :ref="id"></x>` is appended and the slot
//!   renders a node there;
//! - inside a component outlet tag (`<x ${component}>`): the slot renders a
//!   component in place of the outlet;
//! - in an attribute value: `kind:name` attributes are directives and must be
//!   unquoted; anything else is a plain attribute. Quoted plain attributes
//!   keep the element's ref id in the HTML as a placeholder for each slot, so
//!   values like `class="a ${x} b ${y}"` can be reassembled later.

use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;

use super::ref_id::RefId;
use super::token::{tokenize, StateKind, TemplateToken};
use crate::config::TemplateConfig;
use crate::error::{ParseError, ParseErrorKind};

/// The closed set of directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Class,
    Style,
    On,
    Bind,
    Ref,
}

impl DirectiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "class" => Some(Self::Class),
            "style" => Some(Self::Style),
            "on" => Some(Self::On),
            "bind" => Some(Self::Bind),
            "ref" => Some(Self::Ref),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Style => "style",
            Self::On => "on",
            Self::Bind => "bind",
            Self::Ref => "ref",
        }
    }
}

/// How an attribute value was quoted in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quote {
    None,
    Single,
    Double,
}

impl Quote {
    fn from_state(kind: StateKind) -> Self {
        match kind {
            StateKind::AttributeValueSingleQuoted => Self::Single,
            StateKind::AttributeValueDoubleQuoted => Self::Double,
            _ => Self::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Single => "'",
            Self::Double => "\"",
        }
    }
}

/// What one interpolation slot is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Item {
    Attribute {
        name: String,
        quote: Quote,
        ref_id: RefId,
    },
    Directive {
        kind: DirectiveKind,
        name: String,
        ref_id: RefId,
    },
    RenderElement {
        ref_id: RefId,
    },
    RenderNode {
        ref_id: RefId,
    },
}

impl Item {
    pub fn ref_id(&self) -> &RefId {
        match self {
            Self::Attribute { ref_id, .. }
            | Self::Directive { ref_id, .. }
            | Self::RenderElement { ref_id }
            | Self::RenderNode { ref_id } => ref_id,
        }
    }
}

/// Slots contributing to one quoted attribute, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeData {
    pub indexes: SmallVec<[usize; 4]>,
}

/// Per-element data: quoted attributes with interpolated parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefData {
    pub attributes: IndexMap<String, AttributeData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateShape {
    pub html: String,
    /// One item per interpolation slot.
    pub items: Vec<Item>,
    /// Every ref id used by `items` has an entry.
    pub ref_data: IndexMap<RefId, RefData>,
}

impl TemplateShape {
    /// Tokenize and shape the literal chunks of a template.
    pub fn parse(strings: &[&str], config: &TemplateConfig) -> Result<Self, ParseError> {
        Self::from_tokens(&tokenize(strings, config), config)
    }

    pub fn from_tokens(tokens: &[TemplateToken], config: &TemplateConfig) -> Result<Self, ParseError> {
        let slots = tokens.len().saturating_sub(1);
        let mut html = String::new();
        let mut items = Vec::with_capacity(slots);
        let mut ref_data: IndexMap<RefId, RefData> = IndexMap::new();
        let fail = |kind, html: &str| ParseError::new(kind, html, config.error_context_chars);

        for (index, token) in tokens.iter().enumerate() {
            html.push_str(&token.html);
            if index >= slots {
                break;
            }
            let state = &token.state;

            if state.kind == StateKind::Outer {
                let ref_id = RefId::new();
                html.push_str(&format!(
                    "<{tag} {attribute}=\"{ref_id}\"></{tag}>",
                    tag = config.outlet_tag,
                    attribute = config.ref_attribute,
                ));
                ref_data.entry(ref_id.clone()).or_default();
                items.push(Item::RenderNode { ref_id });
                continue;
            }

            let unexpected = ParseErrorKind::UnexpectedSlot {
                index,
                state: state.kind,
            };
            let Some(ref_id) = state.ref_id.clone().filter(|_| state.kind.is_inside_tag()) else {
                return Err(fail(unexpected, &html));
            };

            if state.kind == StateKind::TagInner
                && state.attribute_name.is_empty()
                && state.tag == config.outlet_tag
            {
                ref_data.entry(ref_id.clone()).or_default();
                items.push(Item::RenderElement { ref_id });
                continue;
            }

            if !state.kind.is_attribute_value() {
                return Err(fail(unexpected, &html));
            }

            let quote = Quote::from_state(state.kind);
            let attributes = &mut ref_data.entry(ref_id.clone()).or_default().attributes;
            match state.attribute_name.split_once(':') {
                Some((kind, name)) => {
                    if quote != Quote::None {
                        let name = state.attribute_name.clone();
                        return Err(fail(ParseErrorKind::QuotedDirective { name }, &html));
                    }
                    let Some(kind) = DirectiveKind::from_name(kind) else {
                        let kind = kind.to_string();
                        return Err(fail(ParseErrorKind::UnknownDirective { kind }, &html));
                    };
                    html.push_str("\"\"");
                    items.push(Item::Directive {
                        kind,
                        name: name.to_string(),
                        ref_id,
                    });
                }
                None => {
                    let name = state.attribute_name.clone();
                    if quote == Quote::None {
                        html.push_str("\"\"");
                    } else {
                        html.push_str(ref_id.as_str());
                        attributes.entry(name.clone()).or_default().indexes.push(index);
                    }
                    items.push(Item::Attribute {
                        name,
                        quote,
                        ref_id,
                    });
                }
            }
        }

        Ok(Self {
            html,
            items,
            ref_data,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.items.len()
    }

    /// Pretty JSON snapshot, for debugging.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
