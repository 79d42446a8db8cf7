use super::node::{Element, Node};

/// A render target that can stand in for a component outlet.
///
/// The renderer moves the outlet's children into the component, copies the
/// outlet's attributes onto it and puts its node where the outlet was.
pub trait Component {
    /// The node inserted into the tree.
    fn node(&self) -> Node;

    fn append_children(&self, children: Vec<Node>);

    fn set_attribute(&self, name: &str, value: &str);
}

impl Component for Element {
    fn node(&self) -> Node {
        Element::node(self).clone()
    }

    fn append_children(&self, children: Vec<Node>) {
        Node::append_children(self, children);
    }

    fn set_attribute(&self, name: &str, value: &str) {
        Element::set_attribute(self, name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_as_component() {
        let card = Element::new("my-card");
        let component: &dyn Component = &card;
        component.append_children(vec![Node::text("body")]);
        component.set_attribute("title", "t");

        assert!(component.node().ptr_eq(&card));
        assert_eq!(card.to_html(), "<my-card title=\"t\">body</my-card>");
    }
}
