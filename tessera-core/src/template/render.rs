//! Template Renderer
//!
//! Clones a compiled template and wires the slot values into it.
//!
//! # How Rendering Works
//!
//! 1. The descriptor's fragment is deep-cloned and every slot's target is
//!    found again through its reference marker.
//!
//! 2. Each slot is dispatched on its descriptor. Plain values are applied
//!    once. Signals (and deriver functions, which are promoted to cached
//!    derived signals) are applied once right away and then followed while
//!    the element is mounted.
//!
//! 3. Quoted attributes are assembled last, from their attribute programs.
//!    When any part is a signal the attribute is driven by a derived signal
//!    over those parts.
//!
//! Any failure aborts the render. The error carries the slot index, the
//! value list and the template HTML, and no nodes are returned.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDate;

use super::descriptor::{AttributePart, TemplateDescriptor, ValueDescriptor};
use super::node::value_to_node;
use super::shape::{DirectiveKind, Quote};
use crate::dom::{Component, Element, Listener, Mountable, Node};
use crate::error::{RenderError, RenderErrorKind};
use crate::reactive::{
    create_or_get_derive_of_function, derive, DeriveFn, ReadSignal, Signal, SignalValue,
    SubscribeMode, Tracker,
};
use crate::value::Value;

/// A value passed into a template slot.
///
/// The variant says how the value is bound: applied once, followed as a
/// signal, written back to (two-way bindings and element refs), attached as
/// an event listener, or inserted as a component.
#[derive(Clone)]
pub enum TemplateValue {
    Value(Value),
    Signal(ReadSignal<Value>),
    Writable(Signal<Value>),
    Derive(DeriveFn<Value>),
    Listener(Listener),
    Component(Rc<dyn Component>),
}

impl TemplateValue {
    /// A deriver function slot.
    pub fn derive<F>(function: F) -> Self
    where
        F: Fn(&Tracker) -> Value + 'static,
    {
        Self::Derive(DeriveFn::new(function))
    }

    pub fn listener<F>(handler: F) -> Self
    where
        F: Fn(&crate::dom::Event) + 'static,
    {
        Self::Listener(Listener::new(handler))
    }

    pub fn component<C: Component + 'static>(component: C) -> Self {
        Self::Component(Rc::new(component))
    }

    /// The signal behind this value, promoting deriver functions through the
    /// function-to-signal cache.
    pub fn readable(&self) -> Option<ReadSignal<Value>> {
        match self {
            Self::Signal(signal) => Some(signal.clone()),
            Self::Writable(signal) => Some(signal.read_only()),
            Self::Derive(function) => Some(create_or_get_derive_of_function(function)),
            Self::Value(_) | Self::Listener(_) | Self::Component(_) => None,
        }
    }
}

impl fmt::Debug for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => fmt::Debug::fmt(value, f),
            Self::Signal(signal) => write!(f, "ReadSignal({:?})", signal.get()),
            Self::Writable(signal) => write!(f, "Signal({:?})", signal.get()),
            Self::Derive(function) => fmt::Debug::fmt(function, f),
            Self::Listener(listener) => fmt::Debug::fmt(listener, f),
            Self::Component(component) => write!(f, "Component({:?})", component.node()),
        }
    }
}

macro_rules! impl_from_plain {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for TemplateValue {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

impl_from_plain!(
    Value, bool, f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, &str, String,
    NaiveDate, Node, Element,
);

impl From<ReadSignal<Value>> for TemplateValue {
    fn from(signal: ReadSignal<Value>) -> Self {
        Self::Signal(signal)
    }
}

impl From<Signal<Value>> for TemplateValue {
    fn from(signal: Signal<Value>) -> Self {
        Self::Writable(signal)
    }
}

impl From<DeriveFn<Value>> for TemplateValue {
    fn from(function: DeriveFn<Value>) -> Self {
        Self::Derive(function)
    }
}

impl From<Listener> for TemplateValue {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

struct Failure {
    kind: RenderErrorKind,
    index: Option<usize>,
}

impl Failure {
    fn at(index: usize) -> impl FnOnce(RenderErrorKind) -> Failure {
        move |kind| Failure {
            kind,
            index: Some(index),
        }
    }
}

/// Render `descriptor` with `values`, returning the top-level nodes.
pub fn render(descriptor: &TemplateDescriptor, values: &[TemplateValue]) -> Result<Vec<Node>, RenderError> {
    let fragment = descriptor.template().deep_clone();
    let renderer = Renderer {
        descriptor,
        values,
        fragment: &fragment,
        refs: RefCell::new(Vec::new()),
    };

    match renderer.run() {
        Ok(()) => {
            for (signal, element) in renderer.refs.take() {
                signal.set(Value::from(element));
            }
            tracing::debug!(slots = values.len(), "template rendered");
            Ok(fragment.children())
        }
        Err(Failure { kind, index }) => {
            let error = RenderError {
                kind,
                index,
                values: format!("{values:?}"),
                html: descriptor.html().trim().to_string(),
            };
            tracing::error!(
                error = %error.kind,
                index = ?error.index,
                values = %error.values,
                html = %error.html,
                "template render failed"
            );
            Err(error)
        }
    }
}

struct Renderer<'a> {
    descriptor: &'a TemplateDescriptor,
    values: &'a [TemplateValue],
    fragment: &'a Node,
    /// Ref targets, written only once the whole render has succeeded.
    refs: RefCell<Vec<(Signal<Value>, Element)>>,
}

impl Renderer<'_> {
    fn run(&self) -> Result<(), Failure> {
        let expected = self.descriptor.slot_count();
        if self.values.len() != expected {
            return Err(Failure {
                kind: RenderErrorKind::SlotCountMismatch {
                    expected,
                    actual: self.values.len(),
                },
                index: None,
            });
        }

        for (index, (descriptor, value)) in self
            .descriptor
            .value_descriptors()
            .iter()
            .zip(self.values)
            .enumerate()
        {
            self.slot(descriptor, value).map_err(Failure::at(index))?;
        }

        for (ref_id, attributes) in self.descriptor.programs() {
            let element = self.find(ref_id.as_str()).map_err(|kind| Failure { kind, index: None })?;
            for (name, parts) in attributes {
                self.program(&element, name, parts)?;
            }
        }
        Ok(())
    }

    fn find(&self, ref_id: &str) -> Result<Element, RenderErrorKind> {
        self.fragment
            .find_by_attribute(&self.descriptor.config().ref_attribute, ref_id)
            .ok_or_else(|| RenderErrorKind::MissingReference(ref_id.to_string()))
    }

    fn slot(&self, descriptor: &ValueDescriptor, value: &TemplateValue) -> Result<(), RenderErrorKind> {
        let element = self.find(descriptor.ref_id().as_str())?;
        match descriptor {
            ValueDescriptor::RenderNode { .. } => {
                let node = value_to_node(value)?;
                element.replace_with(&[node]);
            }
            ValueDescriptor::RenderComponent { .. } => {
                let TemplateValue::Component(component) = value else {
                    return Err(RenderErrorKind::ExpectedComponent);
                };
                component.append_children(element.children());
                for (name, value) in element.attributes() {
                    component.set_attribute(&name, &value);
                }
                element.replace_with(&[component.node()]);
            }
            ValueDescriptor::Attribute { name, quote, .. } => {
                // Quoted attributes are assembled from their program.
                if *quote == Quote::None {
                    let name = name.clone();
                    apply(&element, value, move |element, value| set_or_remove(element, &name, value))?;
                }
            }
            ValueDescriptor::Directive { kind, name, .. } => {
                directive(&element, *kind, name, value, &self.refs)?
            }
        }
        Ok(())
    }

    fn program(&self, element: &Element, name: &str, parts: &[AttributePart]) -> Result<(), Failure> {
        // A lone slot keeps the null-removes rule of unquoted attributes.
        if let [AttributePart::Slot(index)] = parts {
            let value = self.values.get(*index).ok_or(Failure {
                kind: RenderErrorKind::UnrenderableValue,
                index: Some(*index),
            })?;
            let name = name.to_string();
            return apply(element, value, move |element, value| set_or_remove(element, &name, value))
                .map_err(Failure::at(*index));
        }

        let mut sources = Vec::with_capacity(parts.len());
        for part in parts {
            let source = match part {
                AttributePart::Literal(text) => Source::Literal(text.clone()),
                AttributePart::Slot(index) => {
                    let value = self.values.get(*index).ok_or(Failure {
                        kind: RenderErrorKind::UnrenderableValue,
                        index: Some(*index),
                    })?;
                    Source::from_value(value).map_err(Failure::at(*index))?
                }
            };
            sources.push(source);
        }

        let name = name.to_string();
        if sources.iter().all(|source| !matches!(source, Source::Signal(_))) {
            let text = sources.iter().map(Source::untracked).collect::<String>();
            element.set_attribute(&name, &text);
            return Ok(());
        }

        let joined = derive(move |tracker| {
            sources
                .iter()
                .map(|source| source.tracked(tracker))
                .collect::<String>()
        });
        bind(element, &joined, move |element, text: &String| element.set_attribute(&name, text));
        Ok(())
    }
}

/// One resolved part of an attribute program.
enum Source {
    Literal(String),
    Value(Value),
    Signal(ReadSignal<Value>),
}

impl Source {
    fn from_value(value: &TemplateValue) -> Result<Self, RenderErrorKind> {
        if let Some(signal) = value.readable() {
            return Ok(Self::Signal(signal));
        }
        match value {
            TemplateValue::Value(value) => Ok(Self::Value(value.clone())),
            TemplateValue::Component(component) => Ok(Self::Value(Value::Node(component.node()))),
            _ => Err(RenderErrorKind::UnrenderableValue),
        }
    }

    fn untracked(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Value(value) => joined_text(value),
            Self::Signal(signal) => signal.with(joined_text),
        }
    }

    fn tracked(&self, tracker: &Tracker) -> String {
        match self {
            Self::Signal(signal) => joined_text(&tracker.get(signal)),
            _ => self.untracked(),
        }
    }
}

/// Text of a value inside a joined attribute; `null` contributes nothing.
fn joined_text(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn set_or_remove(element: &Element, name: &str, value: &Value) {
    if value.is_null() {
        element.remove_attribute(name);
    } else {
        element.set_attribute(name, &value.to_string());
    }
}

/// Apply `effect` once for plain values, or bind it to the signal behind
/// `value`.
fn apply<F>(element: &Element, value: &TemplateValue, effect: F) -> Result<(), RenderErrorKind>
where
    F: Fn(&Element, &Value) + 'static,
{
    if let Some(signal) = value.readable() {
        bind(element, &signal, effect);
        return Ok(());
    }
    match value {
        TemplateValue::Value(value) => effect(element, value),
        TemplateValue::Component(component) => effect(element, &Value::Node(component.node())),
        _ => return Err(RenderErrorKind::UnrenderableValue),
    }
    Ok(())
}

/// Apply the current value now and follow the signal while mounted.
fn bind<T, F>(element: &Element, signal: &ReadSignal<T>, effect: F)
where
    T: SignalValue,
    F: Fn(&Element, &T) + 'static,
{
    signal.with(|value| effect(element, value));
    let weak = element.downgrade();
    element.follow(
        signal,
        move |value| {
            if let Some(element) = weak.upgrade() {
                effect(&element, value);
            }
        },
        SubscribeMode::Immediate,
    );
}

/// Attach `listener` for `event` only while `element` is mounted.
fn listen_while_mounted(element: &Element, event: &str, listener: Listener) {
    let (weak, name, handler) = (element.downgrade(), event.to_string(), listener.clone());
    element.on_mount(move || {
        if let Some(element) = weak.upgrade() {
            element.add_event_listener(&name, &handler);
        }
    });

    let (weak, name) = (element.downgrade(), event.to_string());
    element.on_unmount(move || {
        if let Some(element) = weak.upgrade() {
            element.remove_event_listener(&name, &listener);
        }
    });
}

fn directive(
    element: &Element,
    kind: DirectiveKind,
    name: &str,
    value: &TemplateValue,
    refs: &RefCell<Vec<(Signal<Value>, Element)>>,
) -> Result<(), RenderErrorKind> {
    let name = name.to_string();
    match kind {
        DirectiveKind::Class => apply(element, value, move |element, value| {
            element.toggle_class(&name, value.is_truthy())
        }),
        DirectiveKind::Style => apply(element, value, move |element, value| {
            element.set_style_property(&name, &value.to_string())
        }),
        DirectiveKind::On => {
            let TemplateValue::Listener(listener) = value else {
                return Err(RenderErrorKind::ExpectedListener);
            };
            listen_while_mounted(element, &name, listener.clone());
            Ok(())
        }
        DirectiveKind::Ref => {
            let TemplateValue::Writable(signal) = value else {
                return Err(RenderErrorKind::ExpectedWritable);
            };
            refs.borrow_mut().push((signal.clone(), element.clone()));
            Ok(())
        }
        DirectiveKind::Bind => {
            let TemplateValue::Writable(signal) = value else {
                return Err(RenderErrorKind::ExpectedWritable);
            };
            let key = BindingKey::from_name(&name).ok_or(RenderErrorKind::UnknownBindingKey(name))?;
            two_way(element, signal, key);
            Ok(())
        }
    }
}

/// Typed form bindings: which element property is read on input and
/// written on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKey {
    String,
    Number,
    Date,
    Boolean,
}

impl BindingKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "value:string" => Some(Self::String),
            "value:number" => Some(Self::Number),
            "value:date" => Some(Self::Date),
            "value:boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    fn read(self, element: &Element) -> Value {
        match self {
            Self::String => Value::String(element.value()),
            Self::Number => Value::Number(element.value_as_number()),
            Self::Date => Value::from(element.value_as_date()),
            Self::Boolean => Value::Bool(element.checked()),
        }
    }

    fn write(self, element: &Element, value: &Value) {
        match self {
            Self::String => element.set_value(value.to_string()),
            Self::Number => element.set_value_as_number(to_number(value)),
            Self::Date => element.set_value_as_date(value.as_date()),
            Self::Boolean => element.set_checked(value.is_truthy()),
        }
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => *number,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::String(text) => text.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn two_way(element: &Element, signal: &Signal<Value>, key: BindingKey) {
    let writer = signal.clone();
    let listener = Listener::new(move |event| writer.set(key.read(event.target())));
    listen_while_mounted(element, "input", listener);
    bind(element, signal, move |element, value| key.write(element, value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use std::cell::Cell;

    fn compile(strings: &[&str]) -> TemplateDescriptor {
        TemplateDescriptor::compile(strings).unwrap()
    }

    fn first_element(nodes: &[Node]) -> Element {
        nodes
            .iter()
            .find_map(Node::as_element)
            .expect("rendered an element")
    }

    #[test]
    fn slot_count_must_match() {
        let descriptor = compile(&["<p>", "</p>"]);
        let error = render(&descriptor, &[]).unwrap_err();
        assert_eq!(
            error.kind,
            RenderErrorKind::SlotCountMismatch {
                expected: 1,
                actual: 0
            }
        );
        assert_eq!(error.index, None);
    }

    #[test]
    fn render_node_text() {
        let descriptor = compile(&["<p>Hello ", "!</p>"]);
        let nodes = render(&descriptor, &["world".into()]).unwrap();
        assert_eq!(first_element(&nodes).to_html(), "<p>Hello world!</p>");
    }

    #[test]
    fn renders_are_independent() {
        let descriptor = compile(&["<b>", "</b>"]);
        let first = render(&descriptor, &[1.into()]).unwrap();
        let second = render(&descriptor, &[2.into()]).unwrap();
        assert_eq!(first_element(&first).text_content(), "1");
        assert_eq!(first_element(&second).text_content(), "2");
        assert_eq!(descriptor.template().text_content(), "");
    }

    #[test]
    fn unquoted_attribute_null_removes() {
        let descriptor = compile(&["<input title=", " placeholder=", ">"]);
        let nodes = render(&descriptor, &[Value::Null.into(), "name".into()]).unwrap();
        let input = first_element(&nodes);
        assert!(!input.has_attribute("title"));
        assert_eq!(input.get_attribute("placeholder").as_deref(), Some("name"));
    }

    #[test]
    fn unquoted_attribute_follows_signal() {
        let document = Document::new();
        let title = Signal::new(Value::from("a"));
        let descriptor = compile(&["<div title=", "></div>"]);
        let nodes = render(&descriptor, &[title.clone().into()]).unwrap();
        let div = first_element(&nodes);
        assert_eq!(div.get_attribute("title").as_deref(), Some("a"));

        document.mount(nodes);
        title.set(Value::from("b"));
        assert_eq!(div.get_attribute("title").as_deref(), Some("b"));
        title.set(Value::Null);
        assert!(!div.has_attribute("title"));
    }

    #[test]
    fn style_directive() {
        let descriptor = compile(&["<div style:color=", "></div>"]);
        let nodes = render(&descriptor, &["red".into()]).unwrap();
        assert_eq!(first_element(&nodes).style_property("color").as_deref(), Some("red"));
    }

    #[test]
    fn class_directive_from_derive_function() {
        let document = Document::new();
        let count = Signal::new(Value::from(0));
        let descriptor = compile(&["<div class:many=", "></div>"]);
        let function = TemplateValue::derive({
            let count = count.read_only();
            move |t| Value::Bool(t.get(&count).as_number().unwrap_or(0.0) > 1.0)
        });
        let nodes = render(&descriptor, &[function]).unwrap();
        let div = first_element(&nodes);
        document.mount(nodes);
        assert!(!div.has_class("many"));

        count.set(Value::from(5));
        assert!(div.has_class("many"));
    }

    #[test]
    fn event_listener_is_mount_scoped() {
        let document = Document::new();
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let descriptor = compile(&["<button on:click=", ">+</button>"]);
        let nodes = render(
            &descriptor,
            &[TemplateValue::listener(move |_| counter.set(counter.get() + 1))],
        )
        .unwrap();
        let button = first_element(&nodes);

        button.dispatch_event("click");
        assert_eq!(clicks.get(), 0);

        document.mount(nodes);
        button.dispatch_event("click");
        assert_eq!(clicks.get(), 1);

        button.remove();
        button.dispatch_event("click");
        assert_eq!(clicks.get(), 1);
        assert_eq!(button.listener_count("click"), 0);
    }

    #[test]
    fn on_requires_a_listener() {
        let descriptor = compile(&["<button on:click=", "></button>"]);
        let error = render(&descriptor, &[1.into()]).unwrap_err();
        assert_eq!(error.kind, RenderErrorKind::ExpectedListener);
        assert_eq!(error.index, Some(0));
        assert!(error.html.contains("on:click"));
    }

    #[test]
    fn ref_captures_the_element() {
        let element_ref = Signal::new(Value::Null);
        let descriptor = compile(&["<canvas ref:el=", "></canvas>"]);
        let nodes = render(&descriptor, &[element_ref.clone().into()]).unwrap();
        let canvas = first_element(&nodes);
        let captured = element_ref.get().as_element().expect("element captured");
        assert!(captured.ptr_eq(&canvas));
    }

    #[test]
    fn ref_is_untouched_when_render_fails() {
        let element_ref = Signal::new(Value::Null);
        let descriptor = compile(&["<canvas ref:el=", "></canvas><button on:click=", "></button>"]);
        let error = render(&descriptor, &[element_ref.clone().into(), 1.into()]).unwrap_err();
        assert_eq!(error.kind, RenderErrorKind::ExpectedListener);
        assert_eq!(error.index, Some(1));
        assert!(element_ref.get().is_null());

        let descriptor = compile(&["<canvas ref:el=", "></canvas><a title=\"x ", "\"></a>"]);
        let listener = TemplateValue::listener(|_| {});
        let error = render(&descriptor, &[element_ref.clone().into(), listener]).unwrap_err();
        assert_eq!(error.kind, RenderErrorKind::UnrenderableValue);
        assert!(element_ref.get().is_null());
    }

    #[test]
    fn ref_requires_a_writable() {
        let descriptor = compile(&["<canvas ref:el=", "></canvas>"]);
        let readable = ReadSignal::constant(Value::Null);
        let error = render(&descriptor, &[readable.into()]).unwrap_err();
        assert_eq!(error.kind, RenderErrorKind::ExpectedWritable);
    }

    #[test]
    fn bind_string_is_two_way() {
        let document = Document::new();
        let text = Signal::new(Value::from("hi"));
        let descriptor = compile(&["<input bind:value:string=", ">"]);
        let nodes = render(&descriptor, &[text.clone().into()]).unwrap();
        let input = first_element(&nodes);
        assert_eq!(input.value(), "hi");
        document.mount(nodes);

        input.set_value("typed");
        input.dispatch_event("input");
        assert_eq!(text.get(), Value::from("typed"));

        text.set(Value::from("pushed"));
        assert_eq!(input.value(), "pushed");
    }

    #[test]
    fn bind_number_date_and_boolean() {
        let document = Document::new();
        let number = Signal::new(Value::from(3));
        let date = Signal::new(Value::Null);
        let flag = Signal::new(Value::from(false));
        let descriptor = compile(&[
            "<input bind:value:number=",
            "><input bind:value:date=",
            "><input type=checkbox bind:value:boolean=",
            ">",
        ]);
        let nodes = render(
            &descriptor,
            &[number.clone().into(), date.clone().into(), flag.clone().into()],
        )
        .unwrap();
        let inputs = nodes.iter().filter_map(Node::as_element).collect::<Vec<_>>();
        assert_eq!(inputs[0].value(), "3");
        document.mount(nodes);

        inputs[0].set_value("7.5");
        inputs[0].dispatch_event("input");
        assert_eq!(number.get(), Value::from(7.5));

        inputs[1].set_value("2024-05-01");
        inputs[1].dispatch_event("input");
        assert_eq!(date.get().as_date(), NaiveDate::from_ymd_opt(2024, 5, 1));

        flag.set(Value::from(true));
        assert!(inputs[2].checked());
        inputs[2].set_checked(false);
        inputs[2].dispatch_event("input");
        assert_eq!(flag.get(), Value::from(false));
    }

    #[test]
    fn unknown_binding_key() {
        let descriptor = compile(&["<input bind:value:color=", ">"]);
        let error = render(&descriptor, &[Signal::new(Value::Null).into()]).unwrap_err();
        assert_eq!(
            error.kind,
            RenderErrorKind::UnknownBindingKey("value:color".to_string())
        );
    }

    #[test]
    fn component_replaces_outlet() {
        let card = Element::new("my-card");
        let descriptor = compile(&["<section><x class=\"wide\" ", "><b>inside</b></x></section>"]);
        let nodes = render(&descriptor, &[TemplateValue::component(card.clone())]).unwrap();
        let section = first_element(&nodes);

        assert!(section.first_child().is_some_and(|node| node.ptr_eq(&card)));
        assert_eq!(card.get_attribute("class").as_deref(), Some("wide"));
        assert_eq!(card.text_content(), "inside");
    }

    #[test]
    fn component_slot_requires_component() {
        let descriptor = compile(&["<x ", "></x>"]);
        let error = render(&descriptor, &["text".into()]).unwrap_err();
        assert_eq!(error.kind, RenderErrorKind::ExpectedComponent);
    }

    #[test]
    fn quoted_single_slot_null_removes() {
        let descriptor = compile(&["<div title=\"", "\"></div>"]);
        let nodes = render(&descriptor, &[Value::Null.into()]).unwrap();
        assert!(!first_element(&nodes).has_attribute("title"));

        let document = Document::new();
        let title = Signal::new(Value::from("a"));
        let nodes = render(&descriptor, &[title.clone().into()]).unwrap();
        let div = first_element(&nodes);
        assert_eq!(div.get_attribute("title").as_deref(), Some("a"));

        document.mount(nodes);
        title.set(Value::Null);
        assert!(!div.has_attribute("title"));
        title.set(Value::from(2));
        assert_eq!(div.get_attribute("title").as_deref(), Some("2"));
    }

    #[test]
    fn static_program_is_joined_once() {
        let descriptor = compile(&["<a class=\"btn ", " ", "\"></a>"]);
        let nodes = render(&descriptor, &["primary".into(), Value::Null.into()]).unwrap();
        assert_eq!(
            first_element(&nodes).get_attribute("class").as_deref(),
            Some("btn primary ")
        );
    }
}
