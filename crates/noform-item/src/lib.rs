#![forbid(unsafe_code)]

//! Form items for noform: one rendered field bound to a shared form store.
//!
//! This crate provides:
//! - [`FormItem`], the binding owning a field's lifecycle and cached output
//! - [`dispatch`], the per-broadcast decision of patch, re-render or ignore
//! - [`reconcile_status`], silent status convergence on configuration change
//! - [`ChildFormBridge`], the parent end of a nested-form mirror
//! - [`normalize_change`], change-payload extraction for committed values
//! - [`ClassSet`], class strings derived from configuration and store state
//! - the [`FieldWidget`] and [`Section`] seams for widget and section markup

pub mod base;
pub mod bridge;
pub mod classes;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod item;
pub mod node;
pub mod reconcile;
pub mod section;
pub mod view;

pub use base::{BaseProps, FieldWidget, InheritedLayout, ItemContext, RESERVED_PROPS, pickup_component_props};
pub use bridge::ChildFormBridge;
pub use classes::{ClassSet, ErrorPresence};
pub use config::{Callback, ChangeCallback, ErrorRenderFn, Hook, IfScope, ItemConfig, ListenSpec, RenderFn};
pub use dispatch::{ListenFlags, PatchTargets, Reaction, dispatch};
pub use error::ItemError;
pub use events::{ChangeEvent, EventTarget, StructuredPayload, is_structured, normalize_change};
pub use item::{FormItem, ItemHandlers};
pub use node::{Element, Node};
pub use reconcile::{needs_consist, reconcile_status};
pub use section::{DefaultSection, Section, SectionKind, SectionRequest};
pub use view::{ClassPatch, ItemOutput, ItemView, PatchTarget};
