//! Template Descriptor
//!
//! The render-ready form of a template: the parsed fragment every render
//! clones, what each slot binds to, and for every element with quoted
//! interpolated attributes the program that reassembles each such attribute
//! from literal text and slot values.

use indexmap::IndexMap;
use serde::Serialize;

use super::ref_id::RefId;
use super::shape::{DirectiveKind, Item, Quote, TemplateShape};
use crate::config::TemplateConfig;
use crate::dom::{parse_fragment, Node};
use crate::error::{ParseError, ParseErrorKind};

/// What one slot binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ValueDescriptor {
    RenderNode {
        ref_id: RefId,
    },
    RenderComponent {
        ref_id: RefId,
    },
    Attribute {
        ref_id: RefId,
        name: String,
        quote: Quote,
    },
    Directive {
        ref_id: RefId,
        kind: DirectiveKind,
        name: String,
    },
}

impl ValueDescriptor {
    pub fn ref_id(&self) -> &RefId {
        match self {
            Self::RenderNode { ref_id }
            | Self::RenderComponent { ref_id }
            | Self::Attribute { ref_id, .. }
            | Self::Directive { ref_id, .. } => ref_id,
        }
    }
}

impl From<Item> for ValueDescriptor {
    fn from(item: Item) -> Self {
        match item {
            Item::RenderNode { ref_id } => Self::RenderNode { ref_id },
            Item::RenderElement { ref_id } => Self::RenderComponent { ref_id },
            Item::Attribute {
                name,
                quote,
                ref_id,
            } => Self::Attribute {
                ref_id,
                name,
                quote,
            },
            Item::Directive { kind, name, ref_id } => Self::Directive { ref_id, kind, name },
        }
    }
}

/// One piece of a multi-part attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttributePart {
    Literal(String),
    Slot(usize),
}

/// Attribute name to its parts, per element.
pub type AttributePrograms = IndexMap<String, Vec<AttributePart>>;

#[derive(Debug)]
pub struct TemplateDescriptor {
    template: Node,
    html: String,
    values: Vec<ValueDescriptor>,
    programs: IndexMap<RefId, AttributePrograms>,
    config: TemplateConfig,
}

impl TemplateDescriptor {
    /// Compile the literal chunks of a template with the default config.
    pub fn compile(strings: &[&str]) -> Result<Self, ParseError> {
        Self::compile_with(strings, &TemplateConfig::default())
    }

    pub fn compile_with(strings: &[&str], config: &TemplateConfig) -> Result<Self, ParseError> {
        let shape = TemplateShape::parse(strings, config)?;
        Self::from_shape(shape, config)
    }

    pub fn from_shape(shape: TemplateShape, config: &TemplateConfig) -> Result<Self, ParseError> {
        let context = config.error_context_chars;
        let template = parse_fragment(&shape.html)
            .map_err(|error| ParseError::new(ParseErrorKind::Html(error), &shape.html, context))?;

        let mut programs = IndexMap::new();
        for (ref_id, data) in &shape.ref_data {
            if data.attributes.is_empty() {
                continue;
            }
            let element = template
                .find_by_attribute(&config.ref_attribute, ref_id.as_str())
                .ok_or_else(|| {
                    let kind = ParseErrorKind::MissingReference(ref_id.to_string());
                    ParseError::new(kind, &shape.html, context)
                })?;

            let mut attributes = AttributePrograms::new();
            for (name, attribute) in &data.attributes {
                let mismatch = || {
                    let kind = ParseErrorKind::PlaceholderMismatch { name: name.clone() };
                    ParseError::new(kind, &shape.html, context)
                };
                let value = element.get_attribute(name).ok_or_else(mismatch)?;
                let literals = value.split(ref_id.as_str()).collect::<Vec<_>>();
                if literals.len() != attribute.indexes.len() + 1 {
                    return Err(mismatch());
                }

                let mut parts = Vec::with_capacity(literals.len() + attribute.indexes.len());
                for (position, literal) in literals.iter().enumerate() {
                    if !literal.is_empty() {
                        parts.push(AttributePart::Literal(literal.to_string()));
                    }
                    if let Some(index) = attribute.indexes.get(position) {
                        parts.push(AttributePart::Slot(*index));
                    }
                }
                attributes.insert(name.clone(), parts);
            }
            programs.insert(ref_id.clone(), attributes);
        }

        let values = shape.items.into_iter().map(ValueDescriptor::from).collect::<Vec<_>>();
        tracing::debug!(
            slots = values.len(),
            programs = programs.len(),
            "template compiled"
        );

        Ok(Self {
            template,
            html: shape.html,
            values,
            programs,
            config: config.clone(),
        })
    }

    /// The parsed fragment. Rendering clones it.
    pub fn template(&self) -> &Node {
        &self.template
    }

    /// The compiled HTML the fragment was parsed from.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn value_descriptors(&self) -> &[ValueDescriptor] {
        &self.values
    }

    pub fn programs(&self) -> &IndexMap<RefId, AttributePrograms> {
        &self.programs
    }

    pub fn slot_count(&self) -> usize {
        self.values.len()
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_follow_items() {
        let descriptor = TemplateDescriptor::compile(&["<x ", "></x><p on:click=", ">", "</p>"]).unwrap();
        let kinds = descriptor
            .value_descriptors()
            .iter()
            .map(|value| match value {
                ValueDescriptor::RenderNode { .. } => "node",
                ValueDescriptor::RenderComponent { .. } => "component",
                ValueDescriptor::Attribute { .. } => "attribute",
                ValueDescriptor::Directive { .. } => "directive",
            })
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["component", "directive", "node"]);
    }

    #[test]
    fn multi_part_program() {
        let descriptor = TemplateDescriptor::compile(&["<div title=\"a ", "-", " b\"></div>"]).unwrap();
        let (_, attributes) = descriptor.programs().first().unwrap();
        assert_eq!(
            attributes["title"],
            vec![
                AttributePart::Literal("a ".to_string()),
                AttributePart::Slot(0),
                AttributePart::Literal("-".to_string()),
                AttributePart::Slot(1),
                AttributePart::Literal(" b".to_string()),
            ]
        );
    }

    #[test]
    fn single_quoted_part_has_one_slot() {
        let descriptor = TemplateDescriptor::compile(&["<a href='", "'></a>"]).unwrap();
        let (ref_id, attributes) = descriptor.programs().first().unwrap();
        assert_eq!(attributes["href"], vec![AttributePart::Slot(0)]);
        assert!(descriptor
            .template()
            .find_by_attribute(":ref", ref_id.as_str())
            .is_some());
    }

    #[test]
    fn unquoted_attributes_have_no_program() {
        let descriptor = TemplateDescriptor::compile(&["<a href=", "></a>"]).unwrap();
        assert!(descriptor.programs().is_empty());
        assert_eq!(descriptor.slot_count(), 1);
    }

    #[test]
    fn placeholder_mismatch_is_detected() {
        let mut shape = TemplateShape::parse(&["<div title=\"", "\"></div>"], &TemplateConfig::default()).unwrap();
        let data = shape.ref_data.values_mut().next().unwrap();
        data.attributes["title"].indexes.push(7);

        let error = TemplateDescriptor::from_shape(shape, &TemplateConfig::default()).unwrap_err();
        assert_eq!(
            error.kind,
            ParseErrorKind::PlaceholderMismatch {
                name: "title".to_string()
            }
        );
    }

    #[test]
    fn html_errors_surface_as_parse_errors() {
        let error = TemplateDescriptor::compile(&["<div title=\"", "></div>"]).unwrap_err();
        assert!(matches!(error.kind, ParseErrorKind::Html(_)));
    }
}
