//! Notifications published by the store.

use crate::channel::Channel;
use crate::origin::Origin;
use crate::Value;

/// A single channel write, delivered to every change listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub channel: Channel,
    pub name: String,
    pub value: Value,
    /// Convergence or seeding write; reacting listeners should ignore it.
    pub silent: bool,
    pub origin: Origin,
}

/// Result of a store write.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub channel: Channel,
    pub name: String,
    pub origin: Origin,
    /// Whether the stored payload differs from the previous one.
    pub changed: bool,
}

/// Generic "interaction occurred" payload.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    /// Name of the field the interaction happened on.
    pub fire_key: String,
    /// Callback name, e.g. `"onChange"` or `"onKeyDown"`.
    pub function: String,
    pub args: Vec<Value>,
}

/// Named lifecycle signals, separate from channel broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Blur(String),
    Focus(String),
    Event(InteractionEvent),
}

impl Signal {
    /// Field name the signal refers to.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            Self::Blur(name) | Self::Focus(name) => name,
            Self::Event(event) => &event.fire_key,
        }
    }
}
