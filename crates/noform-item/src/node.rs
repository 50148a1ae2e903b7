//! Minimal render tree produced by items, sections and widgets.

/// A rendered node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Empty => {}
            Self::Text(s) => out.push_str(s),
            Self::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

/// A tagged element with a class string, attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: &'static str,
    pub class: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append a child; empty nodes are skipped.
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        let node = node.into();
        if !node.is_empty() {
            self.children.push(node);
        }
        self
    }

    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first search for the first element carrying `class` as one of
    /// its class tokens.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        if self.class.split_whitespace().any(|c| c == class) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|el| el.find_by_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_children_are_skipped() {
        let el = Element::new("span").child(Node::Empty).child(Node::text("a"));
        assert_eq!(el.children.len(), 1);
    }

    #[test]
    fn text_content_walks_tree() {
        let node: Node = Element::new("div")
            .child(Node::text("Age"))
            .child(Element::new("span").child(Node::text(": 30")))
            .into();
        assert_eq!(node.text_content(), "Age: 30");
    }

    #[test]
    fn find_by_class_matches_tokens() {
        let tree = Element::new("div")
            .class("outer")
            .child(Element::new("span").class("a no-form-item-label b"));
        assert_eq!(tree.find_by_class("no-form-item-label").unwrap().tag, "span");
        assert!(tree.find_by_class("no-form").is_none());
    }
}
