#![forbid(unsafe_code)]

//! The form item: one rendered field bound to a shared form store.
//!
//! A [`FormItem`] registers its field when constructed, subscribes to the
//! store when mounted and reacts to every broadcast through
//! [`dispatch`](crate::dispatch::dispatch). Reactions are applied to a cached
//! [`ItemOutput`]: class patches rewrite the wrapper, label or content class
//! string in place and refresh the sections that read the patched channel,
//! re-renders rebuild the output and bump the render count.
//!
//! # Lifecycle
//!
//! ```text
//! new ──► mount ──► (broadcasts, interactions, update_config) ──► unmount
//!  │                                                                 ▲
//!  └──────────────────────────── drop ───────────────────────────────┘
//! ```
//!
//! Constructing without a form yields an inert item; every method on it is a
//! no-op.
//!
//! # Invariants
//!
//! 1. A broadcast delivered after unmount never touches the output: the
//!    mounted flag is re-checked right before any patch or re-render.
//! 2. No item borrow is held while store writes or user callbacks run, so
//!    listeners may reenter the item.
//! 3. The ambient origin is `Manual` for exactly the synchronous duration of
//!    a change handler: the commit, the `onChange` signal and the caller's
//!    `on_change` callback.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tracing::{debug, debug_span};

use noform_core::{
    Broadcast, Channel, Commit, EventOptions, FieldHandle, Form, InteractionEvent, Origin, Props,
    Signal, Status, Subscription, Value,
};

use crate::base::{BaseProps, InheritedLayout, ItemContext, pickup_component_props, render_base};
use crate::bridge::ChildFormBridge;
use crate::classes::ClassSet;
use crate::config::{Callback, IfScope, ItemConfig, ListenSpec};
use crate::dispatch::{ListenFlags, PatchTargets, dispatch};
use crate::error::ItemError;
use crate::events::{ChangeEvent, normalize_change};
use crate::node::Node;
use crate::reconcile::reconcile_status;
use crate::section::{DefaultSection, Section, SectionKind, SectionRequest};
use crate::view::{ClassPatch, ItemOutput, ItemView, PatchTarget};

/// Callback names that are handled by dedicated handlers, never wrapped.
const DEDICATED_HANDLERS: &[&str] = &["onChange", "onBlur", "onFocus", "onEvent"];

/// Sections whose content depends on the channel behind a patch target:
/// the wrapper follows the error, label and content follow the props.
fn patched_sections(targets: PatchTargets) -> impl Iterator<Item = SectionKind> {
    let error: &[SectionKind] = if targets.contains(PatchTargets::WRAPPER) {
        &[SectionKind::Error]
    } else {
        &[]
    };
    let label: &[SectionKind] = if targets.contains(PatchTargets::LABEL) {
        &[SectionKind::Label]
    } else {
        &[]
    };
    let content: &[SectionKind] = if targets.contains(PatchTargets::CONTENT) {
        &[
            SectionKind::Top,
            SectionKind::Prefix,
            SectionKind::Suffix,
            SectionKind::Help,
        ]
    } else {
        &[]
    };
    error.iter().chain(label).chain(content).copied()
}

struct ItemInner {
    this: Weak<ItemInner>,
    form: Form,
    field: FieldHandle,
    config: RefCell<ItemConfig>,
    /// Form declared by the child widget.
    nested: Option<Form>,
    mounted: Cell<bool>,
    subscription: RefCell<Option<Subscription>>,
    bridge: RefCell<ChildFormBridge>,
    output: RefCell<Option<ItemOutput>>,
    render_count: Cell<u64>,
    event_props: RefCell<AHashMap<String, Callback>>,
    section: RefCell<Rc<dyn Section>>,
}

impl ItemInner {
    fn update(&self, broadcast: &Broadcast) {
        let (listen, flags) = {
            let config = self.config.borrow();
            (ListenSpec::for_config(&config), ListenFlags::for_config(&config))
        };
        let reaction = dispatch(self.mounted.get(), &listen, flags, broadcast);
        if reaction.is_ignore() || !self.mounted.get() {
            return;
        }
        if !reaction.patch.is_empty() {
            self.patch(reaction.patch);
        }
        if reaction.rerender {
            self.force_update();
        }
    }

    fn patch(&self, targets: PatchTargets) {
        let config = self.config.borrow().clone();
        let classes = ClassSet::new(&self.form, &config);
        let mut patches = Vec::with_capacity(3);
        if targets.contains(PatchTargets::WRAPPER) {
            patches.push(ClassPatch {
                target: PatchTarget::Wrapper,
                class: classes.wrapper(),
            });
        }
        if targets.contains(PatchTargets::CONTENT) {
            patches.push(ClassPatch {
                target: PatchTarget::Content,
                class: classes.content(),
            });
        }
        if targets.contains(PatchTargets::LABEL) {
            patches.push(ClassPatch {
                target: PatchTarget::Label,
                class: classes.label(),
            });
        }

        let section = Rc::clone(&self.section.borrow());
        let sections: Vec<(SectionKind, Node)> = patched_sections(targets)
            .map(|kind| {
                let node = section.render(&SectionRequest {
                    kind,
                    form: &self.form,
                    config: &config,
                });
                (kind, node)
            })
            .collect();

        if !self.mounted.get() {
            return;
        }
        if let Some(output) = self.output.borrow_mut().as_mut() {
            for patch in &patches {
                output.apply(patch);
            }
            for (kind, node) in sections {
                output.set_section(kind, node);
            }
        }
    }

    fn force_update(&self) {
        let output = self.render_output();
        *self.output.borrow_mut() = output;
        self.render_count.set(self.render_count.get() + 1);
    }

    fn render_output(&self) -> Option<ItemOutput> {
        let config = self.config.borrow().clone();
        let _span = debug_span!("item_render", name = %config.name).entered();

        let classes = ClassSet::new(&self.form, &config);
        let status = classes.status();
        if status == Status::Hidden {
            return None;
        }

        let props = self.base_props(&config);
        let ctx = ItemContext {
            field: self.field.clone(),
        };
        let body = render_base(&config, &props, &ctx, &self.form);
        if config.no_layout {
            return Some(ItemOutput::Bare(body));
        }

        let section = Rc::clone(&self.section.borrow());
        let section_node = |kind| {
            section.render(&SectionRequest {
                kind,
                form: &self.form,
                config: &config,
            })
        };
        let layout = classes.layout();

        Some(ItemOutput::Laid(Box::new(ItemView {
            id: self.field.id().to_owned(),
            name_attr: format!("form-item-{}", config.name),
            class: classes.root(),
            style: config.style.clone(),
            wrapper_class: classes.wrapper(),
            label_class: classes.label(),
            label_style: layout
                .label_width
                .as_ref()
                .map(|width| format!("width: {width}; display: inline-block")),
            label: section_node(SectionKind::Label),
            control_class: classes.control(),
            top: section_node(SectionKind::Top),
            content_class: classes.content(),
            prefix: section_node(SectionKind::Prefix),
            body_class: classes.body(status),
            body,
            suffix: section_node(SectionKind::Suffix),
            help: section_node(SectionKind::Help),
            error: section_node(SectionKind::Error),
            error_inside: !layout.inset,
        })))
    }

    fn base_props(&self, config: &ItemConfig) -> BaseProps {
        let nested = self.nested.is_some();
        BaseProps {
            name: self.field.name().to_owned(),
            mounted: self.mounted.get(),
            nested_form: nested,
            inset: config.inset.unwrap_or(false),
            form_props: if nested {
                InheritedLayout::from(&self.form.options())
            } else {
                InheritedLayout::default()
            },
            handlers: ItemHandlers {
                inner: self.this.clone(),
            },
            event_props: self.event_props(config),
        }
    }

    /// Wrapped named callbacks, created once per name.
    fn event_props(&self, config: &ItemConfig) -> BTreeMap<String, Callback> {
        let mut memo = self.event_props.borrow_mut();
        config
            .callbacks
            .keys()
            .filter(|name| name.starts_with("on") && !DEDICATED_HANDLERS.contains(&name.as_str()))
            .map(|name| {
                let wrapped = memo
                    .entry(name.clone())
                    .or_insert_with(|| self.wrap_callback(name))
                    .clone();
                (name.clone(), wrapped)
            })
            .collect()
    }

    fn wrap_callback(&self, name: &str) -> Callback {
        let weak = self.this.clone();
        let name = name.to_owned();
        Rc::new(move |args: &[Value]| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.emit_event(&name, args.to_vec());
            let current = inner.config.borrow().callbacks.get(&name).cloned();
            if let Some(callback) = current {
                callback(args);
            }
        })
    }

    fn emit_event(&self, function: &str, args: Vec<Value>) {
        self.form.emit(Signal::Event(InteractionEvent {
            fire_key: self.field.name().to_owned(),
            function: function.to_owned(),
            args,
        }));
    }

    fn on_change(
        &self,
        event: ChangeEvent,
        options: EventOptions,
    ) -> Result<Option<Commit>, ItemError> {
        let value = normalize_change(&event, options.escape)?;
        let _origin = self.form.enter_origin(Origin::Manual {
            field_id: self.field.id().to_owned(),
            options: options.clone(),
        });
        let commit = self.field.set(Channel::Value, value, options.escape)?;

        self.emit_event("onChange", vec![event.to_value()]);
        let callback = self.config.borrow().on_change.clone();
        if let Some(callback) = callback {
            callback(&event, &options);
        }
        Ok(Some(commit))
    }

    fn on_blur(&self) {
        self.form.emit(Signal::Blur(self.field.name().to_owned()));
        self.emit_event("onBlur", Vec::new());
        let hook = self.config.borrow().on_blur.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn on_focus(&self) {
        self.form.emit(Signal::Focus(self.field.name().to_owned()));
        self.emit_event("onFocus", Vec::new());
        let hook = self.config.borrow().on_focus.clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn unmount(&self) {
        let was_mounted = self.mounted.replace(false);
        self.subscription.borrow_mut().take();
        self.bridge.borrow_mut().deactivate();
        let removed = self.form.remove_field(&self.field);
        self.output.borrow_mut().take();
        if was_mounted || removed {
            debug!(field_id = %self.field.id(), name = %self.field.name(), "item unmounted");
        }
    }
}

/// Outward event handlers handed to the widget.
#[derive(Clone)]
pub struct ItemHandlers {
    inner: Weak<ItemInner>,
}

impl ItemHandlers {
    /// Handlers of an inert or dropped item; every call is a no-op.
    #[must_use]
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn change(
        &self,
        event: ChangeEvent,
        options: EventOptions,
    ) -> Result<Option<Commit>, ItemError> {
        match self.inner.upgrade() {
            Some(inner) => inner.on_change(event, options),
            None => Ok(None),
        }
    }

    pub fn blur(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_blur();
        }
    }

    pub fn focus(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.on_focus();
        }
    }
}

impl fmt::Debug for ItemHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemHandlers")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

enum ItemState {
    Inert,
    Bound(Rc<ItemInner>),
}

/// A field bound to a form store.
pub struct FormItem {
    state: ItemState,
}

impl FormItem {
    /// Bind a field to `form`, or build an inert item when there is none.
    pub fn new(form: Option<&Form>, config: ItemConfig) -> Result<Self, ItemError> {
        Self::in_scope(form, None, config)
    }

    /// Like [`new`](Self::new), inheriting conditional visibility from an
    /// enclosing scope.
    pub fn in_scope(
        form: Option<&Form>,
        scope: Option<&IfScope>,
        config: ItemConfig,
    ) -> Result<Self, ItemError> {
        let Some(form) = form else {
            return Ok(Self {
                state: ItemState::Inert,
            });
        };

        let nested = config.child.as_ref().and_then(|widget| widget.declared_form());
        let component_props = match (&nested, &config.child) {
            (Some(_), Some(widget)) if form.options().enable_receive_props => {
                pickup_component_props(&widget.component_props())
            }
            _ => Props::new(),
        };
        let field = form.add_field(config.field_options(component_props, scope))?;

        let inner = Rc::new_cyclic(|this| ItemInner {
            this: this.clone(),
            form: form.clone(),
            field,
            config: RefCell::new(config),
            nested,
            mounted: Cell::new(false),
            subscription: RefCell::new(None),
            bridge: RefCell::new(ChildFormBridge::new()),
            output: RefCell::new(None),
            render_count: Cell::new(0),
            event_props: RefCell::new(AHashMap::new()),
            section: RefCell::new(Rc::new(DefaultSection)),
        });
        Ok(Self {
            state: ItemState::Bound(inner),
        })
    }

    /// Replace the section renderer.
    #[must_use]
    pub fn with_section(self, section: impl Section + 'static) -> Self {
        if let Some(inner) = self.bound() {
            *inner.section.borrow_mut() = Rc::new(section);
        }
        self
    }

    fn bound(&self) -> Option<&Rc<ItemInner>> {
        match &self.state {
            ItemState::Inert => None,
            ItemState::Bound(inner) => Some(inner),
        }
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.bound().is_none()
    }

    /// Subscribe to the store, start nested-form mirroring and render.
    /// Mounting an unmounted item is a no-op: its field is gone.
    pub fn mount(&self) {
        let Some(inner) = self.bound() else {
            return;
        };
        if inner.mounted.get() || !inner.field.is_registered() {
            return;
        }

        let weak = Rc::downgrade(inner);
        let subscription = inner.form.on_change(move |broadcast| {
            if let Some(inner) = weak.upgrade() {
                inner.update(broadcast);
            }
        });
        *inner.subscription.borrow_mut() = Some(subscription);

        if let Some(child) = &inner.nested {
            inner
                .bridge
                .borrow_mut()
                .activate(&inner.form, inner.field.name(), child);
        }

        inner.mounted.set(true);
        debug!(field_id = %inner.field.id(), name = %inner.field.name(), "item mounted");
        inner.force_update();
    }

    /// Unsubscribe, stop mirroring and release the field name.
    pub fn unmount(&self) {
        if let Some(inner) = self.bound() {
            inner.unmount();
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.bound().is_some_and(|inner| inner.mounted.get())
    }

    /// Deliver one broadcast, as the store subscription does.
    pub fn update(&self, broadcast: &Broadcast) {
        if let Some(inner) = self.bound() {
            inner.update(broadcast);
        }
    }

    /// Receive new configuration. A changed status source is reconciled
    /// silently first. The field name is fixed at construction; a different
    /// name in `config` is ignored.
    pub fn update_config(&self, mut config: ItemConfig) -> Result<(), ItemError> {
        let Some(inner) = self.bound() else {
            return Ok(());
        };
        config.name = inner.field.name().to_owned();
        if let Some(status) = &config.status {
            if !config.name.is_empty() && inner.field.is_registered() {
                reconcile_status(&inner.field, &inner.form, status)?;
            }
        }
        let previous = inner.config.replace(config);
        drop(previous);
        if inner.mounted.get() {
            inner.force_update();
        }
        Ok(())
    }

    /// Render now and cache the result. `None` while hidden.
    pub fn render(&self) -> Option<ItemOutput> {
        let inner = self.bound()?;
        inner.force_update();
        inner.output.borrow().clone()
    }

    /// The cached output of the last render, with class patches applied.
    #[must_use]
    pub fn output(&self) -> Option<ItemOutput> {
        self.bound()
            .and_then(|inner| inner.output.borrow().clone())
    }

    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.bound().map_or(0, |inner| inner.render_count.get())
    }

    #[must_use]
    pub fn field(&self) -> Option<&FieldHandle> {
        self.bound().map(|inner| &inner.field)
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.field().map(FieldHandle::id)
    }

    #[must_use]
    pub fn is_nested_form(&self) -> bool {
        self.bound().is_some_and(|inner| inner.nested.is_some())
    }

    /// Whether nested-form mirroring is running.
    #[must_use]
    pub fn is_mirroring(&self) -> bool {
        self.bound()
            .is_some_and(|inner| inner.bridge.borrow().is_active())
    }

    #[must_use]
    pub fn handlers(&self) -> ItemHandlers {
        match self.bound() {
            Some(inner) => ItemHandlers {
                inner: Rc::downgrade(inner),
            },
            None => ItemHandlers::detached(),
        }
    }

    /// Handle a change interaction. Inert items commit nothing.
    pub fn on_change(
        &self,
        event: ChangeEvent,
        options: EventOptions,
    ) -> Result<Option<Commit>, ItemError> {
        match self.bound() {
            Some(inner) => inner.on_change(event, options),
            None => Ok(None),
        }
    }

    pub fn on_blur(&self) {
        if let Some(inner) = self.bound() {
            inner.on_blur();
        }
    }

    pub fn on_focus(&self) {
        if let Some(inner) = self.bound() {
            inner.on_focus();
        }
    }

    /// The wrapped form of a named callback such as `"onKeyDown"`. The same
    /// wrapper is returned for every call with the same name.
    #[must_use]
    pub fn event_prop(&self, name: &str) -> Option<Callback> {
        let inner = self.bound()?;
        let config = inner.config.borrow().clone();
        inner.event_props(&config).remove(name)
    }
}

impl Drop for FormItem {
    fn drop(&mut self) {
        if let ItemState::Bound(inner) = &self.state {
            inner.unmount();
        }
    }
}

impl fmt::Debug for FormItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound() {
            None => f.write_str("FormItem(inert)"),
            Some(inner) => f
                .debug_struct("FormItem")
                .field("field", &inner.field)
                .field("mounted", &inner.mounted.get())
                .field("nested", &inner.nested.is_some())
                .field("render_count", &inner.render_count.get())
                .finish(),
        }
    }
}
