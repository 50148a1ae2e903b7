#![forbid(unsafe_code)]

//! Class strings derived from item configuration and dynamic store state.
//!
//! Class strings are the only part of an item's markup that error and props
//! broadcasts normally affect, which is what makes in-place patching
//! possible. Every string here is a pure function of the form options, the
//! item configuration and the store's current error/props/status for the
//! item, so the same computation serves full renders and patches.
//!
//! Tokens are joined with single spaces; empty tokens are dropped.

use noform_core::{Form, FormOptions, Status, Value, is_truthy};

use crate::config::{ItemConfig, MergedLayout};

pub const ITEM: &str = "no-form-item";
pub const ITEM_LABEL: &str = "no-form-item-label";
pub const ITEM_CONTROL: &str = "no-form-item-control";
pub const ITEM_CONTENT: &str = "no-form-item-content";
pub const ITEM_CONTENT_ELEM: &str = "no-form-item-content-elem";
pub const ITEM_FULL: &str = "no-form-full";
pub const ITEM_INSET: &str = "no-form-item-inset";
pub const ITEM_FLEX: &str = "no-form-item-flex";
pub const HAS_ERROR: &str = "no-form-item-has-error";
pub const HAS_SUB_ERROR: &str = "no-form-item-has-sub-error";
pub const HAS_LAYOUT: &str = "no-form-item-has-layout";
pub const NO_COLON: &str = "no-form-item-no-colon";
pub const INLINE: &str = "no-form-item-inline";
pub const DEFAULT_WIDTH: &str = "no-form-item-default-width";
pub const NO_DEFAULT_WIDTH: &str = "no-form-item-no-default-width";
pub const REQUIRED: &str = "required";

pub const SECTION_PREFIX: &str = "no-form-item-content-prefix";
pub const SECTION_SUFFIX: &str = "no-form-item-content-suffix";
pub const SECTION_TOP: &str = "no-form-item-top";
pub const SECTION_HELP: &str = "no-form-item-help";
pub const SECTION_ERROR: &str = "no-form-item-error";

fn join(tokens: &[&str]) -> String {
    tokens
        .iter()
        .filter(|t| !t.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn when(cond: bool, token: &str) -> &str {
    if cond { token } else { "" }
}

/// Presence of the main and sub parts of an opaque error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorPresence {
    pub main: bool,
    pub sub: bool,
}

impl ErrorPresence {
    /// Strings and scalars count as a main error; `{main, sub}` objects are
    /// read part by part.
    #[must_use]
    pub fn of(error: Option<&Value>) -> Self {
        match error {
            None => Self::default(),
            Some(Value::Object(parts)) => Self {
                main: parts.get("main").is_some_and(is_truthy),
                sub: parts.get("sub").is_some_and(is_truthy),
            },
            Some(other) => Self {
                main: is_truthy(other),
                sub: false,
            },
        }
    }
}

/// Class computation for one item against the current store state.
pub struct ClassSet<'a> {
    form: &'a Form,
    config: &'a ItemConfig,
    options: FormOptions,
}

impl<'a> ClassSet<'a> {
    pub fn new(form: &'a Form, config: &'a ItemConfig) -> Self {
        Self {
            form,
            config,
            options: form.options(),
        }
    }

    pub(crate) fn layout(&self) -> MergedLayout {
        self.config.merged_layout(&self.options)
    }

    /// Effective status: the store's for named items, the configured one for
    /// anonymous items.
    #[must_use]
    pub fn status(&self) -> Status {
        if self.config.name.is_empty() {
            self.config
                .status
                .as_ref()
                .map(|source| source.resolve(&self.form.get_all(noform_core::Channel::Value)))
                .unwrap_or_default()
        } else {
            self.form
                .get_item_status(&self.config.name)
                .unwrap_or_default()
        }
    }

    /// A flag from the item's dynamic props, falling back to configuration.
    fn dynamic_flag(&self, key: &str, fallback: bool) -> bool {
        self.form
            .get_item_props(&self.config.name)
            .get(key)
            .map_or(fallback, is_truthy)
    }

    /// Outermost element.
    #[must_use]
    pub fn root(&self) -> String {
        let layout = self.layout();
        let has_layout = layout.layout.label.is_some() && layout.layout.control.is_some();
        join(&[
            ITEM,
            &self.config.class_name,
            when(has_layout, HAS_LAYOUT),
            when(!layout.colon, NO_COLON),
            when(layout.inline, INLINE),
            if layout.default_min_width {
                DEFAULT_WIDTH
            } else {
                NO_DEFAULT_WIDTH
            },
        ])
    }

    /// Wrapper around label and control; carries the error state.
    #[must_use]
    pub fn wrapper(&self) -> String {
        let inset = self.config.inset.unwrap_or(false) || self.options.inset;
        let error = if self.config.name.is_empty() {
            self.config.error.clone()
        } else {
            self.form.get_item_error(&self.config.name)
        };
        let presence = ErrorPresence::of(error.as_ref());
        join(&[
            when(inset, ITEM_INSET),
            when(presence.main, HAS_ERROR),
            when(presence.sub, HAS_SUB_ERROR),
            when(self.config.flex, ITEM_FLEX),
        ])
    }

    /// Label element; carries the required marker and label column.
    #[must_use]
    pub fn label(&self) -> String {
        let required = self.dynamic_flag("required", self.config.required);
        let show_required =
            required && (self.status() == Status::Edit || self.config.name.is_empty());
        let column = self
            .layout()
            .layout
            .label
            .map(|n| format!("col-{n}"))
            .unwrap_or_default();
        join(&[ITEM_LABEL, when(show_required, REQUIRED), &column])
    }

    /// Content wrapper around prefix, widget and suffix.
    #[must_use]
    pub fn content(&self) -> String {
        let layout = self.layout();
        let dynamic_full = self.dynamic_flag("full", self.config.full.unwrap_or(false));
        let full = layout.full || dynamic_full || layout.inset;
        join(&[ITEM_CONTENT, when(full, ITEM_FULL)])
    }

    #[must_use]
    pub fn control(&self) -> String {
        let column = self
            .layout()
            .layout
            .control
            .map(|n| format!("col-{n}"))
            .unwrap_or_default();
        join(&[ITEM_CONTROL, &column])
    }

    #[must_use]
    pub fn body(&self, status: Status) -> String {
        format!("{ITEM_CONTENT_ELEM} is-{status}")
    }
}
