//! Template Pipeline
//!
//! Templates are written as the literal chunks around interpolation slots,
//! the way a tagged template literal splits them. Compiling and rendering
//! happens in stages:
//!
//! ```text
//! chunks ──tokenize──▶ tokens ──shape──▶ TemplateShape ──▶ TemplateDescriptor
//!                                                              │
//!                                    values ──────────render───┘──▶ nodes
//! ```
//!
//! - [`tokenize`] runs an HTML state machine over the chunks, recording the
//!   parser state at each slot and marking the enclosing element with a
//!   reference attribute.
//! - [`TemplateShape`] classifies every slot: node outlet, component outlet,
//!   plain attribute or directive (`class:`, `style:`, `on:`, `bind:`,
//!   `ref:`).
//! - [`TemplateDescriptor`] parses the compiled HTML once and precomputes
//!   the programs that reassemble quoted multi-part attributes.
//! - [`render`] clones the fragment and binds values into it. Signals stay
//!   live while the bound elements are mounted.
//!
//! [`CachedTemplate`] wraps the compile step for a call site that renders
//! many times.

mod cache;
mod descriptor;
mod node;
mod ref_id;
mod render;
mod shape;
mod token;

pub use cache::CachedTemplate;
pub use descriptor::{AttributePart, AttributePrograms, TemplateDescriptor, ValueDescriptor};
pub use node::value_to_node;
pub use ref_id::RefId;
pub use render::{render, BindingKey, TemplateValue};
pub use shape::{AttributeData, DirectiveKind, Item, Quote, RefData, TemplateShape};
pub use token::{tokenize, StateKind, TemplateToken, TokenState};
