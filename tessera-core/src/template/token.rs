//! Template Tokenizer
//!
//! Walks the literal chunks of a template character by character and records,
//! for every chunk, the parser state at its end. That state is where the
//! following interpolation slot sits: in text, inside a tag, or inside an
//! attribute value.
//!
//! Every start tag gets a fresh [`RefId`]. When a slot lands inside a tag the
//! reference marker (` :ref="<id>"` by default) is spliced in right after the
//! tag name, once per tag, so the renderer can find the element again. The
//! first slot of a tag always ends the chunk that opened the tag, so the
//! marker lands in that chunk's token.

use serde::Serialize;

use super::ref_id::RefId;
use crate::config::TemplateConfig;
use crate::dom::RAW_TEXT_ELEMENTS;

/// Parser states, in an order that matters: every state strictly between
/// [`StateKind::AttributeValueStart`] and [`StateKind::AttributeValueEnd`] is
/// an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StateKind {
    Outer,
    TagOpen,
    TagName,
    EndTag,
    TagInner,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueStart,
    AttributeValueUnquoted,
    AttributeValueSingleQuoted,
    AttributeValueDoubleQuoted,
    AttributeValueEnd,
    SelfClosing,
    Comment,
    RawText,
}

impl StateKind {
    pub fn is_attribute_value(self) -> bool {
        self > Self::AttributeValueStart && self < Self::AttributeValueEnd
    }

    /// States in which a slot belongs to the current start tag.
    pub fn is_inside_tag(self) -> bool {
        matches!(
            self,
            Self::TagInner
                | Self::AttributeName
                | Self::AfterAttributeName
                | Self::BeforeAttributeValue
                | Self::SelfClosing
        ) || self.is_attribute_value()
    }
}

/// Parser state at the end of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenState {
    pub kind: StateKind,
    /// Current (or last) start tag name, lowercased.
    pub tag: String,
    /// Pending attribute name, empty when there is none.
    pub attribute_name: String,
    /// Reference of the current (or last) start tag.
    pub ref_id: Option<RefId>,
}

/// One literal chunk and the state it leaves the parser in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateToken {
    pub html: String,
    pub state: TokenState,
}

struct Tokenizer<'c> {
    config: &'c TemplateConfig,
    tokens: Vec<TemplateToken>,
    html: String,
    kind: StateKind,
    tag: String,
    attribute_name: String,
    ref_id: Option<RefId>,
    /// Byte offset in `html` where the current tag's name ends.
    tag_end: Option<usize>,
    marked: bool,
    raw_text: String,
}

/// Tokenize the literal chunks of a template. `strings.len() - 1` is the
/// number of interpolation slots.
pub fn tokenize(strings: &[&str], config: &TemplateConfig) -> Vec<TemplateToken> {
    let mut tokenizer = Tokenizer {
        config,
        tokens: Vec::with_capacity(strings.len()),
        html: String::new(),
        kind: StateKind::Outer,
        tag: String::new(),
        attribute_name: String::new(),
        ref_id: None,
        tag_end: None,
        marked: false,
        raw_text: String::new(),
    };

    for (index, chunk) in strings.iter().enumerate() {
        tokenizer.feed(chunk);
        let is_slot = index + 1 < strings.len();
        if is_slot {
            tokenizer.slot();
        }
        tokenizer.finish_token();
    }

    tracing::trace!(tokens = tokenizer.tokens.len(), "template tokenized");
    tokenizer.tokens
}

impl Tokenizer<'_> {
    fn feed(&mut self, chunk: &str) {
        let chars = chunk.chars().collect::<Vec<_>>();
        let mut index = 0;
        while index < chars.len() {
            let c = chars[index];
            index += 1;

            match self.kind {
                StateKind::Outer => {
                    if c == '<' {
                        self.kind = StateKind::TagOpen;
                    }
                }
                StateKind::TagOpen => {
                    if c.is_ascii_alphabetic() {
                        self.start_tag(c);
                    } else if c == '/' {
                        self.kind = StateKind::EndTag;
                    } else if c == '!' {
                        if chars[index..].starts_with(&['-', '-']) {
                            self.html.push_str("!--");
                            index += 2;
                            self.kind = StateKind::Comment;
                            continue;
                        }
                        self.kind = StateKind::EndTag;
                    } else {
                        self.kind = StateKind::Outer;
                    }
                }
                StateKind::TagName => {
                    if c.is_whitespace() {
                        self.end_tag_name();
                        self.kind = StateKind::TagInner;
                    } else if c == '/' {
                        self.end_tag_name();
                        self.kind = StateKind::SelfClosing;
                    } else if c == '>' {
                        self.end_tag_name();
                        self.close_start_tag(false);
                    } else {
                        self.tag.push(c.to_ascii_lowercase());
                    }
                }
                StateKind::EndTag => {
                    if c == '>' {
                        self.kind = StateKind::Outer;
                    }
                }
                StateKind::TagInner => self.tag_inner(c),
                StateKind::AttributeName => {
                    if c == '=' {
                        self.kind = StateKind::BeforeAttributeValue;
                    } else if c.is_whitespace() {
                        self.kind = StateKind::AfterAttributeName;
                    } else if c == '/' {
                        self.attribute_name.clear();
                        self.kind = StateKind::SelfClosing;
                    } else if c == '>' {
                        self.close_start_tag(false);
                    } else {
                        self.attribute_name.push(c);
                    }
                }
                StateKind::AfterAttributeName => {
                    if c == '=' {
                        self.kind = StateKind::BeforeAttributeValue;
                    } else if !c.is_whitespace() {
                        self.attribute_name.clear();
                        self.tag_inner(c);
                    }
                }
                StateKind::BeforeAttributeValue => match c {
                    '"' => self.kind = StateKind::AttributeValueDoubleQuoted,
                    '\'' => self.kind = StateKind::AttributeValueSingleQuoted,
                    '>' => self.close_start_tag(false),
                    c if c.is_whitespace() => {}
                    _ => self.kind = StateKind::AttributeValueUnquoted,
                },
                StateKind::AttributeValueUnquoted => {
                    if c.is_whitespace() {
                        self.end_attribute();
                    } else if c == '>' {
                        self.close_start_tag(false);
                    }
                }
                StateKind::AttributeValueSingleQuoted => {
                    if c == '\'' {
                        self.end_attribute();
                    }
                }
                StateKind::AttributeValueDoubleQuoted => {
                    if c == '"' {
                        self.end_attribute();
                    }
                }
                StateKind::SelfClosing => {
                    if c == '>' {
                        self.close_start_tag(true);
                    } else if !c.is_whitespace() {
                        self.tag_inner(c);
                    } else {
                        self.kind = StateKind::TagInner;
                    }
                }
                StateKind::Comment => {
                    if c == '>' && self.html.ends_with("--") {
                        self.kind = StateKind::Outer;
                    }
                }
                StateKind::RawText => {
                    self.raw_text.push(c);
                    if c == '>' {
                        let closing = format!("</{}", self.tag);
                        let text = self.raw_text.to_ascii_lowercase();
                        if text[..text.len() - 1].trim_end().ends_with(&closing) {
                            self.raw_text.clear();
                            self.kind = StateKind::Outer;
                        }
                    }
                }
                StateKind::AttributeValueStart | StateKind::AttributeValueEnd => {}
            }

            self.html.push(c);
        }
    }

    fn tag_inner(&mut self, c: char) {
        match c {
            '/' => self.kind = StateKind::SelfClosing,
            '>' => self.close_start_tag(false),
            c if c.is_whitespace() => self.kind = StateKind::TagInner,
            c => {
                self.attribute_name.clear();
                self.attribute_name.push(c);
                self.kind = StateKind::AttributeName;
            }
        }
    }

    fn start_tag(&mut self, first: char) {
        self.kind = StateKind::TagName;
        self.tag.clear();
        self.tag.push(first.to_ascii_lowercase());
        self.attribute_name.clear();
        self.ref_id = Some(RefId::new());
        self.tag_end = None;
        self.marked = false;
    }

    fn end_tag_name(&mut self) {
        self.tag_end = Some(self.html.len());
    }

    fn end_attribute(&mut self) {
        self.attribute_name.clear();
        self.kind = StateKind::TagInner;
    }

    fn close_start_tag(&mut self, self_closing: bool) {
        self.attribute_name.clear();
        let tag = self.tag.as_str();
        self.kind = if !self_closing && RAW_TEXT_ELEMENTS.contains(&tag) {
            self.raw_text.clear();
            StateKind::RawText
        } else {
            StateKind::Outer
        };
    }

    /// An interpolation slot follows the text fed so far.
    fn slot(&mut self) {
        if self.kind == StateKind::BeforeAttributeValue {
            self.kind = StateKind::AttributeValueUnquoted;
        }
        if self.kind.is_inside_tag() && !self.marked {
            self.insert_marker();
        }
    }

    fn insert_marker(&mut self) {
        let (Some(offset), Some(ref_id)) = (self.tag_end, self.ref_id.as_ref()) else {
            return;
        };
        let marker = format!(" {}=\"{}\"", self.config.ref_attribute, ref_id);
        self.html.insert_str(offset, &marker);
        self.marked = true;
    }

    fn finish_token(&mut self) {
        self.tag_end = None;
        self.tokens.push(TemplateToken {
            html: std::mem::take(&mut self.html),
            state: TokenState {
                kind: self.kind,
                tag: self.tag.clone(),
                attribute_name: self.attribute_name.clone(),
                ref_id: self.ref_id.clone(),
            },
        });
    }
}
