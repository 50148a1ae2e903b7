#![forbid(unsafe_code)]

//! Commit origin: user interaction versus programmatic writes.
//!
//! Every [`Broadcast`](crate::Broadcast) carries the [`Origin`] of the write
//! that produced it. For listeners that only see the store, the origin is
//! also ambient for the synchronous duration of an interaction commit: an
//! [`OriginGuard`] installs it and resets the slot to [`Origin::Api`] when
//! dropped, including during unwinding.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Props;

/// Options accompanying a change interaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventOptions {
    /// Commit the payload verbatim, skipping extraction and normalization.
    pub escape: bool,
    /// Caller-defined extras, passed through untouched.
    pub extra: Props,
}

impl EventOptions {
    #[must_use]
    pub fn escaped() -> Self {
        Self {
            escape: true,
            ..Self::default()
        }
    }
}

/// Who caused a commit.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Origin {
    /// A programmatic store call.
    #[default]
    Api,
    /// Direct user interaction through the binding owning `field_id`.
    Manual {
        field_id: String,
        options: EventOptions,
    },
}

impl Origin {
    /// `"api"` or `"manual"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Manual { .. } => "manual",
        }
    }

    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }

    /// The originating field id, for manual commits.
    #[must_use]
    pub fn field_id(&self) -> Option<&str> {
        match self {
            Self::Api => None,
            Self::Manual { field_id, .. } => Some(field_id),
        }
    }
}

/// RAII guard for an ambient origin. Dropping it resets the slot to
/// [`Origin::Api`] unconditionally.
#[must_use = "dropping this guard clears the ambient origin"]
pub struct OriginGuard {
    slot: Rc<RefCell<Origin>>,
}

impl OriginGuard {
    pub(crate) fn enter(slot: &Rc<RefCell<Origin>>, origin: Origin) -> Self {
        *slot.borrow_mut() = origin;
        Self {
            slot: Rc::clone(slot),
        }
    }
}

impl Drop for OriginGuard {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = Origin::Api;
    }
}

impl std::fmt::Debug for OriginGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginGuard")
            .field("origin", &self.slot.borrow().kind())
            .finish()
    }
}
