//! Node tree.
//!
//! Nodes are `Rc` handles; clones refer to the same node. Children are owned
//! by their parent, parents are referenced weakly. Moving a node into a new
//! parent detaches it from the old one first, and inserting a fragment moves
//! the fragment's children instead of the fragment itself.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;
use indexmap::IndexMap;

use super::event::{Event, Listener};
use super::lifecycle::Lifecycle;
use crate::value::{format_number, DATE_FORMAT};

/// Elements that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(crate) enum NodeKind {
    Fragment,
    Element(ElementData),
    Text(RefCell<String>),
    Comment(RefCell<String>),
}

pub(crate) struct ElementData {
    tag: String,
    attributes: RefCell<IndexMap<String, String>>,
    listeners: RefCell<Vec<(String, Listener)>>,
    /// Live form value; falls back to the `value` attribute until written.
    value: RefCell<Option<String>>,
    /// Live checkedness; falls back to the `checked` attribute until written.
    checked: Cell<Option<bool>>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Vec::new()),
            value: RefCell::new(None),
            checked: Cell::new(None),
        }
    }
}

pub(crate) struct NodeData {
    kind: NodeKind,
    parent: RefCell<Weak<NodeData>>,
    children: RefCell<Vec<Node>>,
    connected: Cell<bool>,
    pub(crate) lifecycle: Lifecycle,
}

/// A DOM node.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    fn from_kind(kind: NodeKind) -> Self {
        Self(Rc::new(NodeData {
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            connected: Cell::new(false),
            lifecycle: Lifecycle::default(),
        }))
    }

    pub fn fragment() -> Self {
        Self::from_kind(NodeKind::Fragment)
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Text(RefCell::new(data.into())))
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Comment(RefCell::new(data.into())))
    }

    pub(crate) fn data(&self) -> &NodeData {
        &self.0
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.kind, NodeKind::Fragment)
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.kind, NodeKind::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.kind, NodeKind::Text(_))
    }

    pub fn as_element(&self) -> Option<Element> {
        self.is_element().then(|| Element(self.clone()))
    }

    /// `#document-fragment`, `#text`, `#comment` or the element's tag.
    pub fn node_name(&self) -> String {
        match &self.0.kind {
            NodeKind::Fragment => "#document-fragment".to_string(),
            NodeKind::Element(data) => data.tag.clone(),
            NodeKind::Text(_) => "#text".to_string(),
            NodeKind::Comment(_) => "#comment".to_string(),
        }
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    /// Append `child` as the last child. Fragments contribute their children.
    pub fn append_child(&self, child: &Node) {
        for node in child.take_for_insertion() {
            node.detach();
            *node.0.parent.borrow_mut() = Rc::downgrade(&self.0);
            self.0.children.borrow_mut().push(node.clone());
            node.set_connected(self.is_connected());
        }
    }

    pub fn append_children<I>(&self, children: I)
    where
        I: IntoIterator<Item = Node>,
    {
        for child in children {
            self.append_child(&child);
        }
    }

    /// Detach from the parent, if any.
    pub fn remove(&self) {
        if self.detach() {
            self.set_connected(false);
        }
    }

    /// Put `replacements` where this node is, in order, and detach this
    /// node. Without a parent this does nothing.
    pub fn replace_with(&self, replacements: &[Node]) {
        let Some(parent) = self.parent() else {
            return;
        };

        let incoming = replacements
            .iter()
            .filter(|node| !node.ptr_eq(self))
            .flat_map(Node::take_for_insertion)
            .collect::<Vec<_>>();
        for node in &incoming {
            node.detach();
        }

        let Some(position) = parent.index_of(self) else {
            return;
        };
        for node in &incoming {
            *node.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
        }
        {
            let mut children = parent.0.children.borrow_mut();
            children.remove(position);
            for (offset, node) in incoming.iter().enumerate() {
                children.insert(position + offset, node.clone());
            }
        }
        *self.0.parent.borrow_mut() = Weak::new();

        self.set_connected(false);
        let connected = parent.is_connected();
        for node in &incoming {
            node.set_connected(connected);
        }
    }

    /// Copy the subtree. Listeners and lifecycle callbacks are not copied.
    pub fn deep_clone(&self) -> Node {
        let copy = match &self.0.kind {
            NodeKind::Fragment => Node::fragment(),
            NodeKind::Text(data) => Node::text(data.borrow().clone()),
            NodeKind::Comment(data) => Node::comment(data.borrow().clone()),
            NodeKind::Element(data) => {
                let element = ElementData::new(&data.tag);
                *element.attributes.borrow_mut() = data.attributes.borrow().clone();
                *element.value.borrow_mut() = data.value.borrow().clone();
                element.checked.set(data.checked.get());
                Node::from_kind(NodeKind::Element(element))
            }
        };
        for child in self.children() {
            copy.append_child(&child.deep_clone());
        }
        copy
    }

    /// Concatenated text of this node and its descendants, comments
    /// excluded.
    pub fn text_content(&self) -> String {
        match &self.0.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => data.borrow().clone(),
            NodeKind::Fragment | NodeKind::Element(_) => {
                let mut text = String::new();
                for child in self.0.children.borrow().iter() {
                    if !matches!(child.0.kind, NodeKind::Comment(_)) {
                        text.push_str(&child.text_content());
                    }
                }
                text
            }
        }
    }

    /// Text and comment nodes replace their data. Elements and fragments
    /// replace their children with a single text node.
    pub fn set_text(&self, text: impl Into<String>) {
        match &self.0.kind {
            NodeKind::Text(data) | NodeKind::Comment(data) => *data.borrow_mut() = text.into(),
            NodeKind::Fragment | NodeKind::Element(_) => {
                for child in self.children() {
                    child.remove();
                }
                self.append_child(&Node::text(text));
            }
        }
    }

    /// First descendant element, in document order, whose attribute `name`
    /// equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<Element> {
        for child in self.0.children.borrow().iter() {
            if let Some(element) = child.as_element() {
                if element.get_attribute(name).as_deref() == Some(value) {
                    return Some(element);
                }
            }
            if let Some(found) = child.find_by_attribute(name, value) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize the subtree.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html, false);
        html
    }

    /// Serialize the children only.
    pub fn inner_html(&self) -> String {
        let raw = self
            .as_element()
            .is_some_and(|element| RAW_TEXT_ELEMENTS.contains(&element.tag_name()));
        let mut html = String::new();
        for child in self.0.children.borrow().iter() {
            child.write_html(&mut html, raw);
        }
        html
    }

    fn write_html(&self, out: &mut String, raw: bool) {
        match &self.0.kind {
            NodeKind::Text(data) if raw => out.push_str(&data.borrow()),
            NodeKind::Text(data) => out.push_str(&escape_text(&data.borrow())),
            NodeKind::Comment(data) => {
                out.push_str("<!--");
                out.push_str(&data.borrow());
                out.push_str("-->");
            }
            NodeKind::Fragment => {
                for child in self.0.children.borrow().iter() {
                    child.write_html(out, false);
                }
            }
            NodeKind::Element(data) => {
                out.push('<');
                out.push_str(&data.tag);
                for (name, value) in data.attributes.borrow().iter() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&data.tag.as_str()) {
                    return;
                }
                let raw = RAW_TEXT_ELEMENTS.contains(&data.tag.as_str());
                for child in self.0.children.borrow().iter() {
                    child.write_html(out, raw);
                }
                out.push_str("</");
                out.push_str(&data.tag);
                out.push('>');
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.0.connected.get()
    }

    /// Propagate connectedness through the subtree, firing mount callbacks
    /// parent first and unmount callbacks children first.
    pub(crate) fn set_connected(&self, connected: bool) {
        if self.0.connected.get() == connected {
            return;
        }
        self.0.connected.set(connected);
        if connected {
            self.0.lifecycle.mounted();
        }
        for child in self.children() {
            child.set_connected(connected);
        }
        if !connected {
            self.0.lifecycle.unmounted();
        }
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    fn index_of(&self, child: &Node) -> Option<usize> {
        self.0
            .children
            .borrow()
            .iter()
            .position(|candidate| candidate.ptr_eq(child))
    }

    /// Unlink from the parent without touching connectedness.
    fn detach(&self) -> bool {
        let Some(parent) = self.parent() else {
            return false;
        };
        if let Some(position) = parent.index_of(self) {
            parent.0.children.borrow_mut().remove(position);
        }
        *self.0.parent.borrow_mut() = Weak::new();
        true
    }

    /// The nodes to insert when this node is inserted somewhere.
    fn take_for_insertion(&self) -> Vec<Node> {
        if !self.is_fragment() {
            return vec![self.clone()];
        }
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in &children {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        children
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.node_name())
            .field("children", &self.child_count())
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Weak counterpart of [`Node`].
#[derive(Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

/// An element node.
#[derive(Clone, PartialEq)]
pub struct Element(Node);

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self(Node::from_kind(NodeKind::Element(ElementData::new(tag))))
    }

    fn element(&self) -> &ElementData {
        match &self.0 .0.kind {
            NodeKind::Element(data) => data,
            _ => unreachable!("Element always wraps an element node"),
        }
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn tag_name(&self) -> &str {
        &self.element().tag
    }

    // Attribute names are ASCII case-insensitive and stored lowercased.

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.element().attributes.borrow().get(&name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.element().attributes.borrow().contains_key(&name)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.element()
            .attributes
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.element().attributes.borrow_mut().shift_remove(&name);
    }

    /// Attributes in source order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.element()
            .attributes
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|classes| classes.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class_list().iter().any(|class| class == name)
    }

    /// Add `name` to the class list when `force` holds, remove it otherwise.
    pub fn toggle_class(&self, name: &str, force: bool) {
        let mut classes = self.class_list();
        let present = classes.iter().any(|class| class == name);
        if force == present {
            return;
        }
        if force {
            classes.push(name.to_string());
        } else {
            classes.retain(|class| class != name);
        }
        self.set_attribute("class", &classes.join(" "));
    }

    fn style_map(&self) -> IndexMap<String, String> {
        self.get_attribute("style")
            .map(|style| {
                style
                    .split(';')
                    .filter_map(|declaration| declaration.split_once(':'))
                    .map(|(property, value)| (property.trim().to_string(), value.trim().to_string()))
                    .filter(|(property, _)| !property.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.style_map().get(property).cloned()
    }

    /// Set one inline style property. An empty value removes it.
    pub fn set_style_property(&self, property: &str, value: &str) {
        let mut styles = self.style_map();
        if value.is_empty() {
            styles.shift_remove(property);
        } else {
            styles.insert(property.to_string(), value.to_string());
        }
        let style = styles
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attribute("style", &style);
    }

    pub fn value(&self) -> String {
        self.element()
            .value
            .borrow()
            .clone()
            .or_else(|| self.get_attribute("value"))
            .unwrap_or_default()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        *self.element().value.borrow_mut() = Some(value.into());
    }

    /// The value parsed as a number; `NaN` when it does not parse.
    pub fn value_as_number(&self) -> f64 {
        self.value().trim().parse::<f64>().unwrap_or(f64::NAN)
    }

    /// Writing `NaN` clears the value.
    pub fn set_value_as_number(&self, value: f64) {
        if value.is_nan() {
            self.set_value("");
        } else {
            self.set_value(format_number(value));
        }
    }

    pub fn value_as_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.value().trim(), DATE_FORMAT).ok()
    }

    pub fn set_value_as_date(&self, value: Option<NaiveDate>) {
        match value {
            Some(date) => self.set_value(date.format(DATE_FORMAT).to_string()),
            None => self.set_value(""),
        }
    }

    pub fn checked(&self) -> bool {
        self.element()
            .checked
            .get()
            .unwrap_or_else(|| self.has_attribute("checked"))
    }

    pub fn set_checked(&self, checked: bool) {
        self.element().checked.set(Some(checked));
    }

    /// Register `listener` for `name`. Adding the same listener twice for
    /// the same event is a no-op.
    pub fn add_event_listener(&self, name: &str, listener: &Listener) {
        let mut listeners = self.element().listeners.borrow_mut();
        if listeners
            .iter()
            .any(|(event, existing)| event == name && existing.ptr_eq(listener))
        {
            return;
        }
        listeners.push((name.to_string(), listener.clone()));
    }

    pub fn remove_event_listener(&self, name: &str, listener: &Listener) {
        self.element()
            .listeners
            .borrow_mut()
            .retain(|(event, existing)| !(event == name && existing.ptr_eq(listener)));
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.element()
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == name)
            .count()
    }

    /// Invoke every listener registered for `name`, in registration order.
    pub fn dispatch_event(&self, name: &str) {
        let listeners = self
            .element()
            .listeners
            .borrow()
            .iter()
            .filter(|(event, _)| event == name)
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        let event = Event::new(name, self.clone());
        for listener in listeners {
            listener.call(&event);
        }
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement(self.0.downgrade())
    }
}

impl Deref for Element {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.0
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("attributes", &self.attributes())
            .finish()
    }
}

/// Weak counterpart of [`Element`].
#[derive(Clone)]
pub struct WeakElement(WeakNode);

impl WeakElement {
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_with_text(tag: &str, text: &str) -> Element {
        let element = Element::new(tag);
        element.append_child(&Node::text(text));
        element
    }

    #[test]
    fn append_fragment_moves_children() {
        let fragment = Node::fragment();
        fragment.append_child(&Node::text("a"));
        fragment.append_child(&Node::text("b"));

        let div = Element::new("div");
        div.append_child(&fragment);

        assert_eq!(div.child_count(), 2);
        assert_eq!(fragment.child_count(), 0);
        assert_eq!(div.text_content(), "ab");
    }

    #[test]
    fn append_moves_from_old_parent() {
        let first = Element::new("div");
        let second = Element::new("div");
        let child = Node::text("x");
        first.append_child(&child);
        second.append_child(&child);

        assert_eq!(first.child_count(), 0);
        assert!(child.parent().is_some_and(|parent| parent.ptr_eq(&second)));
    }

    #[test]
    fn replace_with_keeps_position() {
        let list = Element::new("ul");
        let a = element_with_text("li", "a");
        let b = element_with_text("li", "b");
        let c = element_with_text("li", "c");
        list.append_children([a.node().clone(), b.node().clone(), c.node().clone()]);

        b.replace_with(&[Node::text("1"), Node::text("2")]);

        assert_eq!(list.to_html(), "<ul><li>a</li>12<li>c</li></ul>");
        assert!(b.parent().is_none());
    }

    #[test]
    fn deep_clone_copies_attributes_but_not_listeners() {
        let div = element_with_text("div", "hi");
        div.set_attribute("id", "main");
        div.add_event_listener("click", &Listener::new(|_| {}));

        let copy = div.deep_clone().as_element().unwrap();
        assert_eq!(copy.get_attribute("id").as_deref(), Some("main"));
        assert_eq!(copy.text_content(), "hi");
        assert_eq!(copy.listener_count("click"), 0);
        assert!(!copy.ptr_eq(&div));
    }

    #[test]
    fn class_toggle_reflects_into_attribute() {
        let div = Element::new("div");
        div.toggle_class("active", true);
        div.toggle_class("active", true);
        div.toggle_class("big", true);
        assert_eq!(div.get_attribute("class").as_deref(), Some("active big"));

        div.toggle_class("active", false);
        assert_eq!(div.class_list(), vec!["big".to_string()]);
    }

    #[test]
    fn style_properties() {
        let div = Element::new("div");
        div.set_attribute("style", "color: red");
        div.set_style_property("width", "10px");
        assert_eq!(div.style_property("color").as_deref(), Some("red"));
        assert_eq!(div.get_attribute("style").as_deref(), Some("color: red; width: 10px;"));

        div.set_style_property("color", "");
        assert_eq!(div.style_property("color"), None);
    }

    #[test]
    fn form_state() {
        let input = Element::new("input");
        input.set_attribute("value", "12");
        assert_eq!(input.value_as_number(), 12.0);

        input.set_value("abc");
        assert!(input.value_as_number().is_nan());

        input.set_value_as_number(3.0);
        assert_eq!(input.value(), "3");

        input.set_value("2024-02-29");
        assert_eq!(input.value_as_date(), NaiveDate::from_ymd_opt(2024, 2, 29));

        assert!(!input.checked());
        input.set_checked(true);
        assert!(input.checked());
    }

    #[test]
    fn listeners_are_removed_by_identity() {
        let button = Element::new("button");
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener = Listener::new(move |event| {
            assert_eq!(event.name(), "click");
            counter.set(counter.get() + 1);
        });

        button.add_event_listener("click", &listener);
        button.add_event_listener("click", &listener);
        button.dispatch_event("click");
        assert_eq!(hits.get(), 1);

        button.remove_event_listener("click", &Listener::new(|_| {}));
        button.dispatch_event("click");
        assert_eq!(hits.get(), 2);

        button.remove_event_listener("click", &listener);
        button.dispatch_event("click");
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn serialization_escapes_and_handles_void_elements() {
        let div = Element::new("div");
        div.set_attribute("title", "a \"b\"");
        div.append_child(&Node::text("1 < 2"));
        div.append_child(Element::new("br").node());
        div.append_child(&Node::comment("note"));

        assert_eq!(
            div.to_html(),
            "<div title=\"a &quot;b&quot;\">1 &lt; 2<br><!--note--></div>"
        );
    }

    #[test]
    fn find_by_attribute_searches_descendants() {
        let root = Node::fragment();
        let outer = Element::new("div");
        let inner = Element::new("span");
        inner.set_attribute("data-id", "7");
        outer.append_child(&inner);
        root.append_child(&outer);

        let found = root.find_by_attribute("data-id", "7");
        assert!(found.is_some_and(|element| element.ptr_eq(&inner)));
        assert!(root.find_by_attribute("data-id", "8").is_none());
    }
}
