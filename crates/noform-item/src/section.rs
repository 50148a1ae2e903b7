#![forbid(unsafe_code)]

//! The section seam: label, prefix, suffix, top, help and error markup.
//!
//! An item asks a [`Section`] for each decorative part of its layout. Text
//! sections read the item's dynamic props first (`props.label`, ...) and
//! fall back to the item configuration, so a props broadcast can retitle a
//! field without the item itself re-rendering. The error section reads the
//! store's error for named items and the configured error for anonymous ones.

use noform_core::{Form, Value};

use crate::classes::{SECTION_ERROR, SECTION_HELP, SECTION_PREFIX, SECTION_SUFFIX, SECTION_TOP};
use crate::config::ItemConfig;
use crate::node::{Element, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Label,
    Prefix,
    Suffix,
    Top,
    Help,
    Error,
}

impl SectionKind {
    /// Dynamic-props key the section reads.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Label => "label",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Top => "top",
            Self::Help => "help",
            Self::Error => "error",
        }
    }

    /// Class of the section's own element. The label renders bare inside
    /// the item's label element.
    #[must_use]
    pub const fn class(self) -> Option<&'static str> {
        match self {
            Self::Label => None,
            Self::Prefix => Some(SECTION_PREFIX),
            Self::Suffix => Some(SECTION_SUFFIX),
            Self::Top => Some(SECTION_TOP),
            Self::Help => Some(SECTION_HELP),
            Self::Error => Some(SECTION_ERROR),
        }
    }
}

/// Everything a section may read.
pub struct SectionRequest<'a> {
    pub kind: SectionKind,
    pub form: &'a Form,
    pub config: &'a ItemConfig,
}

impl SectionRequest<'_> {
    fn configured_text(&self) -> Option<&str> {
        match self.kind {
            SectionKind::Label => self.config.label.as_deref(),
            SectionKind::Prefix => self.config.prefix.as_deref(),
            SectionKind::Suffix => self.config.suffix.as_deref(),
            SectionKind::Top => self.config.top.as_deref(),
            SectionKind::Help => self.config.help.as_deref(),
            SectionKind::Error => None,
        }
    }

    /// Section text: dynamic props over configuration.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let dynamic = self.form.get_item_props(&self.config.name);
        match dynamic.get(self.kind.key()) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => self.configured_text().map(str::to_owned),
            Some(other) => Some(other.to_string()),
        }
    }

    /// Error payload shown by the error section.
    #[must_use]
    pub fn error(&self) -> Option<Value> {
        if self.config.name.is_empty() {
            self.config.error.clone().filter(|e| !e.is_null())
        } else {
            self.form.get_item_error(&self.config.name)
        }
    }
}

/// Renders one decorative part of an item.
pub trait Section {
    fn render(&self, req: &SectionRequest<'_>) -> Node;
}

/// Plain-text sections.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSection;

fn error_text(error: &Value) -> Option<String> {
    match error {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(parts) => parts.get("main").and_then(error_text),
        other => Some(other.to_string()),
    }
}

impl Section for DefaultSection {
    fn render(&self, req: &SectionRequest<'_>) -> Node {
        let body = match req.kind {
            SectionKind::Error => {
                let Some(error) = req.error() else {
                    return Node::Empty;
                };
                match &req.config.error_render {
                    Some(render) => render(&error),
                    None => error_text(&error).map_or(Node::Empty, Node::text),
                }
            }
            _ => req.text().map_or(Node::Empty, Node::text),
        };
        if body.is_empty() {
            return Node::Empty;
        }
        match req.kind.class() {
            Some(class) => Element::new("div").class(class).child(body).into(),
            None => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noform_core::{FieldOptions, FormOptions};
    use serde_json::json;
    use std::rc::Rc;

    fn render(kind: SectionKind, form: &Form, config: &ItemConfig) -> Node {
        DefaultSection.render(&SectionRequest { kind, form, config })
    }

    #[test]
    fn label_renders_bare_text() {
        let form = Form::new(FormOptions::default());
        let config = ItemConfig::new("age").label("Age");
        assert_eq!(render(SectionKind::Label, &form, &config), Node::text("Age"));
    }

    #[test]
    fn dynamic_props_override_configured_text() {
        let form = Form::new(FormOptions::default());
        form.add_field(FieldOptions::named("age")).unwrap();
        form.set_props("age", json!({"help": "whole years"}));
        let mut config = ItemConfig::new("age");
        config.help = Some("years".into());

        let node = render(SectionKind::Help, &form, &config);
        let el = node.as_element().unwrap();
        assert_eq!(el.class, SECTION_HELP);
        assert_eq!(node.text_content(), "whole years");
    }

    #[test]
    fn missing_text_renders_nothing() {
        let form = Form::new(FormOptions::default());
        let config = ItemConfig::new("age");
        assert!(render(SectionKind::Prefix, &form, &config).is_empty());
        assert!(render(SectionKind::Error, &form, &config).is_empty());
    }

    #[test]
    fn error_section_shows_main_error() {
        let form = Form::new(FormOptions::default());
        form.add_field(FieldOptions::named("age")).unwrap();
        form.set_error("age", json!({"main": "too young", "sub": null}));
        let node = render(SectionKind::Error, &form, &ItemConfig::new("age"));
        assert_eq!(node.as_element().unwrap().class, SECTION_ERROR);
        assert_eq!(node.text_content(), "too young");
    }

    #[test]
    fn error_render_is_used_when_configured() {
        let form = Form::new(FormOptions::default());
        let mut config = ItemConfig::new("").error(json!({"main": "a", "sub": "b"}));
        config.error_render = Some(Rc::new(|err: &Value| {
            Node::text(format!("{}/{}", err["main"].as_str().unwrap_or(""), err["sub"].as_str().unwrap_or("")))
        }));
        assert_eq!(render(SectionKind::Error, &form, &config).text_content(), "a/b");
    }
}
