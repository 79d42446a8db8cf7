use super::node::{Element, Node};

/// A document root. Its `body` is always connected, so anything appended to
/// it is mounted.
#[derive(Debug)]
pub struct Document {
    body: Element,
}

impl Document {
    pub fn new() -> Self {
        let body = Element::new("body");
        body.set_connected(true);
        Self { body }
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    /// Append `nodes` to the body, mounting them.
    pub fn mount<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = Node>,
    {
        self.body.append_children(nodes);
    }

    pub fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        Node::text(data)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_connected() {
        let document = Document::new();
        assert!(document.body().is_connected());
    }

    #[test]
    fn mount_connects_nodes() {
        let document = Document::default();
        let div = document.create_element("div");
        let text = document.create_text_node("hi");
        document.mount([div.node().clone(), text.clone()]);

        assert!(div.is_connected());
        assert!(text.is_connected());
        assert_eq!(document.body().to_html(), "<body><div></div>hi</body>");
    }
}
