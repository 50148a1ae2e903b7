#![forbid(unsafe_code)]

//! Item configuration and the listen specification derived from it.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use noform_core::{
    EventOptions, FieldOptions, FormOptions, Interceptor, Layout, Props, PropsSource,
    StatusSource, Value, WhenFn,
};

use crate::base::FieldWidget;
use crate::events::ChangeEvent;
use crate::node::Node;

/// Caller-supplied render function; receives the form's aggregate value.
pub type RenderFn = Rc<dyn Fn(&Value) -> Node>;

/// Custom rendering of the error section; receives the field's error.
pub type ErrorRenderFn = Rc<dyn Fn(&Value) -> Node>;

pub type ChangeCallback = Rc<dyn Fn(&ChangeEvent, &EventOptions)>;

/// Generic named callback (`onKeyDown`, `onSearch`, ...).
pub type Callback = Rc<dyn Fn(&[Value])>;

pub type Hook = Rc<dyn Fn()>;

/// Configuration of one form item.
#[derive(Clone, Default)]
pub struct ItemConfig {
    pub name: String,
    pub id: Option<String>,
    pub value: Option<Value>,
    pub default_value: Option<Value>,
    pub error: Option<Value>,
    pub props: Option<PropsSource>,
    pub status: Option<StatusSource>,
    pub validate_config: Option<Value>,
    pub interceptor: Option<Interceptor>,
    pub when: Option<WhenFn>,

    /// Names to watch when rendering through `render`. Empty means all.
    pub listen_keys: Vec<String>,
    pub render: Option<RenderFn>,
    /// Re-render on error broadcasts, not only patch the wrapper class.
    pub listen_error: bool,
    /// Re-render on props broadcasts, not only patch label/content classes.
    pub listen_props: bool,

    pub label: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub top: Option<String>,
    pub help: Option<String>,
    pub required: bool,

    pub inline: Option<bool>,
    pub inset: Option<bool>,
    pub full: Option<bool>,
    pub colon: Option<bool>,
    pub layout: Option<Layout>,
    pub label_width: Option<String>,
    pub default_min_width: Option<bool>,
    pub flex: bool,
    pub class_name: String,
    pub style: Option<String>,
    /// Render only the base element, without label/section markup.
    pub no_layout: bool,
    pub error_render: Option<ErrorRenderFn>,

    pub child: Option<Rc<dyn FieldWidget>>,

    pub on_change: Option<ChangeCallback>,
    pub on_blur: Option<Hook>,
    pub on_focus: Option<Hook>,
    pub callbacks: BTreeMap<String, Callback>,
}

impl ItemConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn error(mut self, error: Value) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn props(mut self, props: impl Into<PropsSource>) -> Self {
        self.props = Some(props.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: impl Into<StatusSource>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn render(mut self, f: impl Fn(&Value) -> Node + 'static) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn listen_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.listen_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn listen_error(mut self, on: bool) -> Self {
        self.listen_error = on;
        self
    }

    #[must_use]
    pub fn listen_props(mut self, on: bool) -> Self {
        self.listen_props = on;
        self
    }

    #[must_use]
    pub fn child(mut self, widget: impl FieldWidget + 'static) -> Self {
        self.child = Some(Rc::new(widget));
        self
    }

    #[must_use]
    pub fn on_change(mut self, f: impl Fn(&ChangeEvent, &EventOptions) + 'static) -> Self {
        self.on_change = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_blur(mut self, f: impl Fn() + 'static) -> Self {
        self.on_blur = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_focus(mut self, f: impl Fn() + 'static) -> Self {
        self.on_focus = Some(Rc::new(f));
        self
    }

    /// Register a generic named callback, e.g. `"onKeyDown"`.
    #[must_use]
    pub fn callback(mut self, name: impl Into<String>, f: impl Fn(&[Value]) + 'static) -> Self {
        self.callbacks.insert(name.into(), Rc::new(f));
        self
    }

    /// Store registration options for this item.
    ///
    /// `component_props` (absorbed from the child widget) sit under the
    /// item's own fixed props; derived props replace them entirely.
    pub(crate) fn field_options(&self, component_props: Props, scope: Option<&IfScope>) -> FieldOptions {
        let props = match &self.props {
            Some(PropsSource::Fixed(own)) => {
                let mut merged = component_props;
                merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
                PropsSource::Fixed(merged)
            }
            Some(derived @ PropsSource::Derived(_)) => derived.clone(),
            None => PropsSource::Fixed(component_props),
        };

        FieldOptions {
            name: self.name.clone(),
            id: self.id.clone(),
            value: self.value.clone(),
            default_value: self.default_value.clone(),
            error: self.error.clone(),
            props: Some(props),
            status: self.status.clone(),
            validate_config: self.validate_config.clone(),
            interceptor: self.interceptor.clone(),
            when: self
                .when
                .clone()
                .or_else(|| scope.map(|s| Rc::clone(&s.when))),
            parent_if: scope.and_then(|s| s.parent_if.clone()),
        }
    }

    /// Layout props of the form overlaid with this item's overrides.
    pub(crate) fn merged_layout(&self, form: &FormOptions) -> MergedLayout {
        MergedLayout {
            inline: self.inline.unwrap_or(form.inline),
            inset: self.inset.unwrap_or(form.inset),
            full: self.full.unwrap_or(form.full),
            colon: self.colon.unwrap_or(form.colon),
            layout: self.layout.or(form.layout).unwrap_or_default(),
            label_width: self.label_width.clone().or_else(|| form.label_width.clone()),
            default_min_width: self.default_min_width.unwrap_or(form.default_min_width),
        }
    }
}

impl fmt::Debug for ItemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemConfig")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("default_value", &self.default_value)
            .field("status", &self.status)
            .field("listen_keys", &self.listen_keys)
            .field("render", &self.render.is_some())
            .field("listen_error", &self.listen_error)
            .field("listen_props", &self.listen_props)
            .field("child", &self.child.is_some())
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Effective layout after overlaying item options on form options.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct MergedLayout {
    pub inline: bool,
    pub inset: bool,
    pub full: bool,
    pub colon: bool,
    pub layout: Layout,
    pub label_width: Option<String>,
    pub default_min_width: bool,
}

/// Conditional-visibility context inherited from an enclosing `If` block.
#[derive(Clone)]
pub struct IfScope {
    pub when: WhenFn,
    pub parent_if: Option<String>,
}

impl IfScope {
    pub fn new(when: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            when: Rc::new(when),
            parent_if: None,
        }
    }
}

impl fmt::Debug for IfScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IfScope")
            .field("parent_if", &self.parent_if)
            .finish_non_exhaustive()
    }
}

/// Which broadcast names an item reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenSpec {
    /// Exactly this field's name.
    Name(String),
    /// An explicit set of names (render-function items).
    Keys(Vec<String>),
    /// Every name (render-function items without keys).
    All,
}

impl ListenSpec {
    #[must_use]
    pub fn for_config(config: &ItemConfig) -> Self {
        if config.render.is_some() {
            if config.listen_keys.is_empty() {
                Self::All
            } else {
                Self::Keys(config.listen_keys.clone())
            }
        } else {
            Self::Name(config.name.clone())
        }
    }

    #[must_use]
    pub fn hits(&self, name: &str) -> bool {
        match self {
            Self::Name(own) => own == name,
            Self::Keys(keys) => keys.iter().any(|k| k == name),
            Self::All => true,
        }
    }
}
