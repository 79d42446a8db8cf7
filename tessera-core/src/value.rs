//! Dynamic values.
//!
//! [`Value`] is what a template slot or a template-bound signal carries. It
//! stringifies the way a browser would when writing attributes and text, and
//! it participates in signal change detection and in match dispatch.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use chrono::NaiveDate;

use crate::dom::{Element, Node};
use crate::reactive::{Matchable, SignalValue, TypeTag};

/// Date format used by date inputs.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(NaiveDate),
    Node(Node),
    Object(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary value as an opaque object.
    pub fn object<T: Any>(value: T) -> Self {
        Self::Object(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Boolean coercion: `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::String(value) => !value.is_empty(),
            Self::Date(_) | Self::Node(_) | Self::Object(_) => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<Element> {
        self.as_node().and_then(Node::as_element)
    }

    /// Recover an opaque object of type `T`.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Self::Object(object) => Rc::clone(object).downcast::<T>().ok(),
            _ => None,
        }
    }
}

/// Format a number the way JavaScript's `String(n)` does.
///
/// Magnitudes from `1e21` up and below `1e-6` use exponent notation with an
/// explicit exponent sign (`1e+21`, `1.5e-7`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let formatted = format!("{value:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::String(value) => f.write_str(value),
            Self::Date(value) => write!(f, "{}", value.format(DATE_FORMAT)),
            Self::Node(node) => f.write_str(&node.text_content()),
            Self::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Number(value) => f.debug_tuple("Number").field(value).finish(),
            Self::String(value) => f.debug_tuple("String").field(value).finish(),
            Self::Date(value) => f.debug_tuple("Date").field(value).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(&node.node_name()).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(&Rc::as_ptr(object)).finish(),
        }
    }
}

fn number_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

/// Structural for scalars and dates, identity for nodes and objects.
/// All NaNs are equal to each other, and `-0` equals `0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => number_bits(*a) == number_bits(*b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(value) => value.hash(state),
            Self::Number(value) => number_bits(*value).hash(state),
            Self::String(value) => value.hash(state),
            Self::Date(value) => value.hash(state),
            Self::Node(node) => node.addr().hash(state),
            Self::Object(object) => (Rc::as_ptr(object) as *const () as usize).hash(state),
        }
    }
}

/// Only primitives are compared; `null`, dates, nodes and objects always
/// notify.
impl SignalValue for Value {
    fn is_same(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Matchable for Value {
    fn type_tag(&self) -> TypeTag {
        match self {
            Self::Bool(_) => TypeTag::Boolean,
            Self::Number(_) => TypeTag::Number,
            Self::String(_) => TypeTag::String,
            Self::Null | Self::Date(_) | Self::Node(_) | Self::Object(_) => TypeTag::Object,
        }
    }

    fn constructor(&self) -> Option<TypeId> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(TypeId::of::<bool>()),
            Self::Number(_) => Some(TypeId::of::<f64>()),
            Self::String(_) => Some(TypeId::of::<String>()),
            Self::Date(_) => Some(TypeId::of::<NaiveDate>()),
            Self::Node(node) => Some(if node.is_element() {
                TypeId::of::<Element>()
            } else {
                TypeId::of::<Node>()
            }),
            Self::Object(object) => Some((**object).type_id()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_number!(f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        Self::Node(element.node().clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
