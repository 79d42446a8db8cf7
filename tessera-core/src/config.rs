//! Template pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Knobs shared by the tokenizer, the shape extractor, the descriptor
/// compiler and the renderer.
///
/// All fields have defaults, so a partial JSON document is enough:
///
/// ```rust,ignore
/// let config = TemplateConfig::from_json(r#"{ "outlet_tag": "slot-x" }"#)?;
/// assert_eq!(config.ref_attribute, ":ref");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Attribute injected into compiled HTML to relocate elements after
    /// cloning.
    pub ref_attribute: String,

    /// Tag name of component outlets.
    pub outlet_tag: String,

    /// Characters of trailing HTML attached to compile errors.
    pub error_context_chars: usize,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            ref_attribute: ":ref".to_string(),
            outlet_tag: "x".to_string(),
            error_context_chars: 256,
        }
    }
}

impl TemplateConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_ref_attribute(mut self, name: impl Into<String>) -> Self {
        self.ref_attribute = name.into();
        self
    }

    pub fn with_outlet_tag(mut self, tag: impl Into<String>) -> Self {
        self.outlet_tag = tag.into();
        self
    }

    pub fn with_error_context_chars(mut self, chars: usize) -> Self {
        self.error_context_chars = chars;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.ref_attribute.is_empty() || self.ref_attribute.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "ref_attribute `{}` is not an attribute name",
                self.ref_attribute
            )));
        }
        if self.outlet_tag.is_empty() || !self.outlet_tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::Config(format!(
                "outlet_tag `{}` is not a tag name",
                self.outlet_tag
            )));
        }
        Ok(())
    }
}
