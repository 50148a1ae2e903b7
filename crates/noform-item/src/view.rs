#![forbid(unsafe_code)]

//! Render output of an item and in-place class patches.
//!
//! A laid-out item keeps its three patchable class strings (wrapper, label,
//! content) and its section nodes as plain fields of [`ItemView`]. A
//! [`ClassPatch`] replaces one class string and touches nothing else;
//! [`ItemView::set_section`] swaps one section node. Together they let an
//! error or props broadcast update the item without rebuilding the widget
//! subtree.

use crate::node::{Element, Node};
use crate::section::SectionKind;

/// A class-bearing element of the item layout that can be patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchTarget {
    Wrapper,
    Label,
    Content,
}

/// Replace the class string of one patch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPatch {
    pub target: PatchTarget,
    pub class: String,
}

/// Laid-out item: root, wrapper, label, control and content sections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemView {
    pub id: String,
    /// `form-item-{name}`.
    pub name_attr: String,
    pub class: String,
    pub style: Option<String>,
    pub wrapper_class: String,
    pub label_class: String,
    pub label_style: Option<String>,
    pub label: Node,
    pub control_class: String,
    pub top: Node,
    pub content_class: String,
    pub prefix: Node,
    pub body_class: String,
    pub body: Node,
    pub suffix: Node,
    pub help: Node,
    pub error: Node,
    /// Error section inside the control; otherwise it follows the wrapper.
    pub error_inside: bool,
}

impl ItemView {
    #[must_use]
    pub fn class_of(&self, target: PatchTarget) -> &str {
        match target {
            PatchTarget::Wrapper => &self.wrapper_class,
            PatchTarget::Label => &self.label_class,
            PatchTarget::Content => &self.content_class,
        }
    }

    #[must_use]
    pub fn section(&self, kind: SectionKind) -> &Node {
        match kind {
            SectionKind::Label => &self.label,
            SectionKind::Prefix => &self.prefix,
            SectionKind::Suffix => &self.suffix,
            SectionKind::Top => &self.top,
            SectionKind::Help => &self.help,
            SectionKind::Error => &self.error,
        }
    }

    pub fn set_section(&mut self, kind: SectionKind, node: Node) {
        let slot = match kind {
            SectionKind::Label => &mut self.label,
            SectionKind::Prefix => &mut self.prefix,
            SectionKind::Suffix => &mut self.suffix,
            SectionKind::Top => &mut self.top,
            SectionKind::Help => &mut self.help,
            SectionKind::Error => &mut self.error,
        };
        *slot = node;
    }

    pub fn apply(&mut self, patch: &ClassPatch) {
        let slot = match patch.target {
            PatchTarget::Wrapper => &mut self.wrapper_class,
            PatchTarget::Label => &mut self.label_class,
            PatchTarget::Content => &mut self.content_class,
        };
        slot.clone_from(&patch.class);
    }

    /// Concrete element tree.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let mut label = Element::new("span").class(&self.label_class);
        if let Some(style) = &self.label_style {
            label = label.attr("style", style);
        }
        let label = label.child(self.label.clone());

        let content = Element::new("span")
            .class(&self.content_class)
            .child(self.prefix.clone())
            .child(Element::new("span").class(&self.body_class).child(self.body.clone()))
            .child(self.suffix.clone());

        let mut control = Element::new("span")
            .class(&self.control_class)
            .child(self.top.clone())
            .child(content)
            .child(self.help.clone());
        if self.error_inside {
            control = control.child(self.error.clone());
        }

        let wrapper = Element::new("div")
            .class(&self.wrapper_class)
            .child(label)
            .child(control);

        let mut root = Element::new("div")
            .attr("id", &self.id)
            .attr("name", &self.name_attr)
            .class(&self.class);
        if let Some(style) = &self.style {
            root = root.attr("style", style);
        }
        root = root.child(wrapper);
        if !self.error_inside {
            root = root.child(self.error.clone());
        }
        root.into()
    }
}

/// What an item renders while visible.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutput {
    /// Only the base element (`no_layout`).
    Bare(Node),
    Laid(Box<ItemView>),
}

impl ItemOutput {
    #[must_use]
    pub fn view(&self) -> Option<&ItemView> {
        match self {
            Self::Bare(_) => None,
            Self::Laid(view) => Some(view),
        }
    }

    /// Apply a class patch. Bare output has no patch targets.
    pub fn apply(&mut self, patch: &ClassPatch) {
        if let Self::Laid(view) = self {
            view.apply(patch);
        }
    }

    /// Replace one section node. Bare output has no sections.
    pub fn set_section(&mut self, kind: SectionKind, node: Node) {
        if let Self::Laid(view) = self {
            view.set_section(kind, node);
        }
    }

    #[must_use]
    pub fn to_node(&self) -> Node {
        match self {
            Self::Bare(node) => node.clone(),
            Self::Laid(view) => view.to_node(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemView {
        ItemView {
            id: "__noform__field__1".into(),
            name_attr: "form-item-age".into(),
            class: "no-form-item".into(),
            wrapper_class: String::new(),
            label_class: "no-form-item-label".into(),
            label: Node::text("Age"),
            control_class: "no-form-item-control".into(),
            content_class: "no-form-item-content".into(),
            body_class: "no-form-item-content-elem is-edit".into(),
            body: Node::text("[input]"),
            error: Element::new("div").class("no-form-item-error").child(Node::text("bad")).into(),
            error_inside: true,
            ..ItemView::default()
        }
    }

    #[test]
    fn patch_touches_only_its_target() {
        let mut view = sample();
        let before = view.clone();
        view.apply(&ClassPatch {
            target: PatchTarget::Wrapper,
            class: "no-form-item-has-error".into(),
        });
        assert_eq!(view.class_of(PatchTarget::Wrapper), "no-form-item-has-error");
        view.wrapper_class.clone_from(&before.wrapper_class);
        assert_eq!(view, before);
    }

    #[test]
    fn tree_places_error_inside_control() {
        let node = sample().to_node();
        let root = node.as_element().unwrap();
        assert_eq!(root.get_attr("name"), Some("form-item-age"));
        let control = root.find_by_class("no-form-item-control").unwrap();
        assert!(control.find_by_class("no-form-item-error").is_some());
        assert_eq!(node.text_content(), "Age[input]bad");
    }

    #[test]
    fn inset_error_follows_wrapper() {
        let mut view = sample();
        view.error_inside = false;
        let node = view.to_node();
        let root = node.as_element().unwrap();
        assert_eq!(root.children.len(), 2);
        let control = root.find_by_class("no-form-item-control").unwrap();
        assert!(control.find_by_class("no-form-item-error").is_none());
    }

    #[test]
    fn section_swap_touches_only_that_section() {
        let mut view = sample();
        let before = view.clone();
        view.set_section(SectionKind::Help, Node::text("years"));
        assert_eq!(view.section(SectionKind::Help), &Node::text("years"));
        view.help = Node::Empty;
        assert_eq!(view, before);
    }

    #[test]
    fn bare_output_ignores_patches() {
        let mut out = ItemOutput::Bare(Node::text("x"));
        out.apply(&ClassPatch {
            target: PatchTarget::Label,
            class: "changed".into(),
        });
        out.set_section(SectionKind::Error, Node::text("bad"));
        assert_eq!(out.to_node(), Node::text("x"));
        assert!(out.view().is_none());
    }
}
