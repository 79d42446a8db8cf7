//! Events and listeners.

use std::fmt;
use std::rc::Rc;

use super::node::Element;

/// An event delivered to listeners.
#[derive(Debug, Clone)]
pub struct Event {
    name: String,
    target: Element,
}

impl Event {
    pub fn new(name: impl Into<String>, target: Element) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Element {
        &self.target
    }
}

/// An event listener with identity.
///
/// Removal matches by identity, so keep the handle that was added.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&Rc::as_ptr(&self.0)).finish()
    }
}
