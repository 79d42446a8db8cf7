//! Tessera Core
//!
//! This crate provides the core runtime for the Tessera reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (signals, derived signals, match)
//! - A tagged-template compiler that turns literal chunks into a reusable
//!   template descriptor
//! - A renderer that clones the template and binds values, directives and
//!   components into an in-memory DOM
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: signals, subscriptions, derive and match
//! - `template`: tokenizer, shape, descriptor, renderer and call-site cache
//! - `dom`: the DOM templates render into, with mount/unmount lifecycle
//! - `value`: the dynamic value type carried by template slots
//! - `config` / `error`: template settings and error types
//!
//! # Example
//!
//! ```rust
//! use tessera_core::dom::Document;
//! use tessera_core::reactive::Signal;
//! use tessera_core::template::{render, TemplateDescriptor};
//! use tessera_core::Value;
//!
//! let document = Document::new();
//! let name = Signal::new(Value::from("world"));
//!
//! let descriptor = TemplateDescriptor::compile(&["<p>Hello ", "!</p>"]).unwrap();
//! let nodes = render(&descriptor, &[name.clone().into()]).unwrap();
//! document.mount(nodes);
//! assert_eq!(document.body().inner_html(), "<p>Hello world!</p>");
//!
//! name.set(Value::from("Tessera"));
//! assert_eq!(document.body().inner_html(), "<p>Hello Tessera!</p>");
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod reactive;
pub mod template;
pub mod value;

pub use config::TemplateConfig;
pub use error::{Error, ParseError, RenderError, Result};
pub use value::Value;
