//! In-memory DOM
//!
//! A small, single-threaded DOM that templates render into: fragments,
//! elements, text and comments, plus the pieces the renderer relies on.
//!
//! - [`Mountable`]: mount/unmount callbacks and mount-scoped signal
//!   subscriptions. A node is mounted while it is connected to a
//!   [`Document`] body.
//! - [`Component`]: a render target that can replace a component outlet.
//! - [`CustomElementRegistry`]: explicit registration of custom tags.
//! - [`parse_fragment`]: the HTML parser used to build template fragments.

mod component;
mod document;
mod event;
mod lifecycle;
mod node;
mod parse;
mod registry;

pub use component::Component;
pub use document::Document;
pub use event::{Event, Listener};
pub use lifecycle::Mountable;
pub use node::{Element, Node, WeakElement, WeakNode};
pub(crate) use node::RAW_TEXT_ELEMENTS;
pub use parse::parse_fragment;
pub use registry::{CustomElementRegistry, Definition, ElementFactory};
