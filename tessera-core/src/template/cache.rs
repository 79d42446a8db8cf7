use std::cell::OnceCell;

use super::descriptor::TemplateDescriptor;
use super::render::{render, TemplateValue};
use crate::config::TemplateConfig;
use crate::dom::Node;
use crate::error::Error;

/// A template call site: the literal chunks are compiled on first render
/// and the descriptor is reused afterwards.
///
/// A failed compile is returned and not remembered, so the next render
/// tries again.
#[derive(Debug)]
pub struct CachedTemplate {
    strings: Vec<&'static str>,
    config: TemplateConfig,
    descriptor: OnceCell<TemplateDescriptor>,
}

impl CachedTemplate {
    pub fn new(strings: &[&'static str]) -> Self {
        Self::with_config(strings, TemplateConfig::default())
    }

    pub fn with_config(strings: &[&'static str], config: TemplateConfig) -> Self {
        Self {
            strings: strings.to_vec(),
            config,
            descriptor: OnceCell::new(),
        }
    }

    /// The compiled descriptor, compiling it if needed.
    pub fn descriptor(&self) -> Result<&TemplateDescriptor, Error> {
        if let Some(descriptor) = self.descriptor.get() {
            return Ok(descriptor);
        }
        let compiled = TemplateDescriptor::compile_with(&self.strings, &self.config)?;
        Ok(self.descriptor.get_or_init(|| compiled))
    }

    pub fn is_compiled(&self) -> bool {
        self.descriptor.get().is_some()
    }

    pub fn render(&self, values: &[TemplateValue]) -> Result<Vec<Node>, Error> {
        Ok(render(self.descriptor()?, values)?)
    }
}
