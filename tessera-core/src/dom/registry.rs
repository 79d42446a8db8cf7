//! Custom element registry.

use std::cell::RefCell;

use indexmap::IndexMap;

use super::node::Element;
use crate::error::RegistryError;

/// One registered custom tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub tag: String,
    /// Built-in tag this definition customizes, if any.
    pub extends: Option<String>,
}

/// Creates elements for one definition.
#[derive(Debug, Clone)]
pub struct ElementFactory {
    definition: Definition,
}

impl ElementFactory {
    pub fn tag(&self) -> &str {
        &self.definition.tag
    }

    /// A customized built-in is created as its base tag with an `is`
    /// attribute; an autonomous element under its own tag.
    pub fn create(&self) -> Element {
        match &self.definition.extends {
            Some(base) => {
                let element = Element::new(base);
                element.set_attribute("is", &self.definition.tag);
                element
            }
            None => Element::new(&self.definition.tag),
        }
    }
}

/// An explicit registry, passed to whoever defines tags.
#[derive(Debug, Default)]
pub struct CustomElementRegistry {
    definitions: RefCell<IndexMap<String, Definition>>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tag`, optionally customizing the built-in `extends`.
    pub fn define(&self, tag: &str, extends: Option<&str>) -> Result<ElementFactory, RegistryError> {
        if !is_valid_custom_element_name(tag) {
            return Err(RegistryError::InvalidName(tag.to_string()));
        }
        let mut definitions = self.definitions.borrow_mut();
        if definitions.contains_key(tag) {
            return Err(RegistryError::AlreadyDefined(tag.to_string()));
        }

        let definition = Definition {
            tag: tag.to_string(),
            extends: extends.map(str::to_ascii_lowercase),
        };
        definitions.insert(tag.to_string(), definition.clone());
        tracing::debug!(tag, extends, "custom element defined");
        Ok(ElementFactory { definition })
    }

    pub fn get(&self, tag: &str) -> Option<ElementFactory> {
        self.definitions
            .borrow()
            .get(tag)
            .cloned()
            .map(|definition| ElementFactory { definition })
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.borrow().contains_key(tag)
    }
}

/// Lowercase ASCII letter first, at least one hyphen, no uppercase letters.
fn is_valid_custom_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    let starts_lower = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    starts_lower
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| !c.is_ascii_uppercase() && !c.is_whitespace() && c != '/' && c != '>')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_returns_a_factory() {
        let registry = CustomElementRegistry::new();
        let factory = registry.define("todo-item", None).unwrap();
        assert_eq!(factory.create().tag_name(), "todo-item");
        assert!(registry.is_defined("todo-item"));
    }

    #[test]
    fn customized_builtin_uses_is_attribute() {
        let registry = CustomElementRegistry::new();
        let factory = registry.define("fancy-button", Some("button")).unwrap();
        let element = factory.create();
        assert_eq!(element.tag_name(), "button");
        assert_eq!(element.get_attribute("is").as_deref(), Some("fancy-button"));
    }

    #[test]
    fn rejects_invalid_and_duplicate_names() {
        let registry = CustomElementRegistry::new();
        assert_eq!(
            registry.define("nohyphen", None).unwrap_err(),
            RegistryError::InvalidName("nohyphen".to_string())
        );
        assert!(registry.define("1-abc", None).is_err());
        assert!(registry.define("My-tag", None).is_err());

        registry.define("my-tag", None).unwrap();
        assert_eq!(
            registry.define("my-tag", None).unwrap_err(),
            RegistryError::AlreadyDefined("my-tag".to_string())
        );
    }
}
