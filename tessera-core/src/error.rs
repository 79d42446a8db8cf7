//! Error types.
//!
//! Compile failures are [`ParseError`]s carrying the tail of the HTML that
//! was accumulated when the fault was found. Render failures are
//! [`RenderError`]s carrying the slot index, the value list and the compiled
//! HTML. Neither is retried; both are logged where they are raised.

use thiserror::Error;

use crate::template::StateKind;

/// Why a template failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("directive `{name}` must not be quoted")]
    QuotedDirective { name: String },

    #[error("unknown directive kind `{kind}`")]
    UnknownDirective { kind: String },

    #[error("interpolation slot {index} in unexpected position ({state:?})")]
    UnexpectedSlot { index: usize, state: StateKind },

    #[error("compiled template is not valid HTML: {0}")]
    Html(#[from] HtmlError),

    #[error("no element carries reference `{0}`")]
    MissingReference(String),

    #[error("attribute `{name}` does not contain the placeholders its slots expect")]
    PlaceholderMismatch { name: String },
}

/// A template compile failure with trailing HTML context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}\n  near: {context}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub context: String,
}

impl ParseError {
    /// Annotate `kind` with the last `limit` characters of `html`.
    pub fn new(kind: ParseErrorKind, html: &str, limit: usize) -> Self {
        let error = Self {
            kind,
            context: tail(html, limit).trim().to_string(),
        };
        tracing::error!(error = %error.kind, context = %error.context, "template compile failed");
        error
    }
}

/// The last `limit` characters of `html`, split on a char boundary.
fn tail(html: &str, limit: usize) -> &str {
    let count = html.chars().count();
    if count <= limit {
        return html;
    }
    let start = html
        .char_indices()
        .nth(count - limit)
        .map_or(0, |(offset, _)| offset);
    &html[start..]
}

/// Why a render call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderErrorKind {
    #[error("no element carries reference `{0}`")]
    MissingReference(String),

    #[error("template has {expected} slots but {actual} values were given")]
    SlotCountMismatch { expected: usize, actual: usize },

    #[error("expected a component")]
    ExpectedComponent,

    #[error("expected an event listener")]
    ExpectedListener,

    #[error("expected a writable signal")]
    ExpectedWritable,

    #[error("unknown binding key `{0}`")]
    UnknownBindingKey(String),

    #[error("value cannot be rendered as a node")]
    UnrenderableValue,
}

/// A render failure annotated with the slot, the values and the template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (slot {index:?})\n  values: {values}\n  html: {html}")]
pub struct RenderError {
    pub kind: RenderErrorKind,
    pub index: Option<usize>,
    pub values: String,
    pub html: String,
}

/// Malformed HTML handed to the fragment parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HtmlError {
    #[error("unexpected end of input inside {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid tag name at byte {0}")]
    InvalidTagName(usize),
}

/// Custom element registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("`{0}` is not a valid custom element name")]
    InvalidName(String),

    #[error("`{0}` is already defined")]
    AlreadyDefined(String),
}

/// Any error raised by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Html(#[from] HtmlError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_the_tail() {
        let html = format!("{}<div>", "a".repeat(300));
        let error = ParseError::new(
            ParseErrorKind::UnknownDirective {
                kind: "foo".to_string(),
            },
            &html,
            10,
        );
        assert_eq!(error.context, "aaaaa<div>");
    }

    #[test]
    fn context_respects_char_boundaries() {
        assert_eq!(tail("héllo wörld", 5), "wörld");
        assert_eq!(tail("short", 256), "short");
    }

    #[test]
    fn render_error_display_names_the_slot() {
        let error = RenderError {
            kind: RenderErrorKind::ExpectedWritable,
            index: Some(2),
            values: "[]".to_string(),
            html: "<div></div>".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("expected a writable signal"));
        assert!(message.contains("Some(2)"));
    }
}
