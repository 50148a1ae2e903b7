#![forbid(unsafe_code)]

//! The widget seam: what an item hands to the input widget it wraps.
//!
//! A widget implements [`FieldWidget`]. Besides rendering, a widget may
//! expose its own configuration props (absorbed into the item's initial
//! props when the form enables it) and may declare that it is itself a form,
//! which turns the item into the parent end of a nested-form mirror.

use std::collections::BTreeMap;

use noform_core::{FieldHandle, Form, FormOptions, Layout, Props};

use crate::config::{Callback, ItemConfig};
use crate::item::ItemHandlers;
use crate::node::Node;

/// Props an item never absorbs from its child component.
pub const RESERVED_PROPS: &[&str] = &[
    "name", "value", "error", "props", "label", "required", "suffix", "prefix", "top", "help",
    "onChange", "onBlur", "onFocus", "key", "children",
];

/// An input widget rendered inside an item.
pub trait FieldWidget {
    fn render(&self, props: &BaseProps, ctx: &ItemContext) -> Node;

    /// The widget's own configuration props.
    fn component_props(&self) -> Props {
        Props::new()
    }

    /// The form this widget renders, if it is a nested form.
    fn declared_form(&self) -> Option<Form> {
        None
    }
}

/// Context made available to the widget.
#[derive(Debug, Clone)]
pub struct ItemContext {
    pub field: FieldHandle,
}

/// Layout props a nested form inherits from the parent form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InheritedLayout {
    pub default_min_width: Option<bool>,
    pub full: Option<bool>,
    pub inline: Option<bool>,
    pub inset: Option<bool>,
    pub layout: Option<Layout>,
    pub colon: Option<bool>,
}

impl From<&FormOptions> for InheritedLayout {
    fn from(opts: &FormOptions) -> Self {
        Self {
            default_min_width: Some(opts.default_min_width),
            full: Some(opts.full),
            inline: Some(opts.inline),
            inset: Some(opts.inset),
            layout: opts.layout,
            colon: Some(opts.colon),
        }
    }
}

/// Props bundle handed to the widget.
#[derive(Clone)]
pub struct BaseProps {
    pub name: String,
    pub mounted: bool,
    pub nested_form: bool,
    pub inset: bool,
    /// Parent layout props; empty unless the widget is a nested form.
    pub form_props: InheritedLayout,
    pub handlers: ItemHandlers,
    /// Wrapped named callbacks (`onKeyDown`, ...), memoized per name.
    pub event_props: BTreeMap<String, Callback>,
}

impl std::fmt::Debug for BaseProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseProps")
            .field("name", &self.name)
            .field("mounted", &self.mounted)
            .field("nested_form", &self.nested_form)
            .field("inset", &self.inset)
            .field("form_props", &self.form_props)
            .field("event_props", &self.event_props.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Drop reserved keys from a component's props.
#[must_use]
pub fn pickup_component_props(props: &Props) -> Props {
    props
        .iter()
        .filter(|(key, _)| !RESERVED_PROPS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Render the base element: the render function if configured, else the
/// child widget, else nothing.
pub(crate) fn render_base(
    config: &ItemConfig,
    props: &BaseProps,
    ctx: &ItemContext,
    form: &Form,
) -> Node {
    if let Some(render) = &config.render {
        return render(&form.get_all(noform_core::Channel::Value));
    }
    match &config.child {
        Some(widget) => widget.render(props, ctx),
        None => Node::Empty,
    }
}
