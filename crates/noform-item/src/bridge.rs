#![forbid(unsafe_code)]

//! Mirroring between a nested form and its slot in the parent form.
//!
//! An item whose widget declares a nested [`Form`] owns a
//! [`ChildFormBridge`]. The bridge has two states, inactive and active, and
//! leaves the inactive state at most once, when the item mounts.
//!
//! On activation the child's aggregate snapshots of all four channels are
//! written into the parent field **silently**. Afterwards every child
//! broadcast on the `error`, `props` or `status` channel, silent or not, is
//! forwarded as a normal (non-silent) parent write carrying the child's
//! fresh aggregate snapshot for that channel. Child `value` broadcasts are
//! not forwarded; the parent's value slot is seeded once.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | child opts out (`disabled_sync_child_form`) | stays inactive, no seeding |
//! | parent form dropped | forwarding stops silently |
//! | child form dropped | subscription dies with it |

use noform_core::{Channel, Form, Subscription};
use tracing::debug;

#[derive(Default)]
enum BridgeState {
    #[default]
    Inactive,
    Active {
        child: Form,
        _subscription: Subscription,
    },
}

/// Parent-side end of a nested-form mirror.
#[derive(Default)]
pub struct ChildFormBridge {
    state: BridgeState,
    activated_once: bool,
}

impl ChildFormBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `name` in `parent` from `child` and start forwarding. Returns
    /// whether the bridge became active.
    pub fn activate(&mut self, parent: &Form, name: &str, child: &Form) -> bool {
        if self.activated_once {
            return false;
        }
        self.activated_once = true;
        if child.options().disabled_sync_child_form {
            debug!(name, "nested form opted out of mirroring");
            return false;
        }

        parent.set_value_silent(name, child.get_all(Channel::Value));
        parent.set_props(name, child.get_all(Channel::Props));
        parent.set_status(name, child.get_all(Channel::Status));
        parent.set_error(name, child.get_all(Channel::Error));

        let weak_parent = parent.downgrade();
        let weak_child = child.downgrade();
        let slot = name.to_owned();
        let subscription = child.on_change(move |broadcast| {
            if broadcast.channel == Channel::Value {
                return;
            }
            let (Some(parent), Some(child)) = (weak_parent.upgrade(), weak_child.upgrade()) else {
                return;
            };
            parent.set(broadcast.channel, &slot, child.get_all(broadcast.channel));
        });

        debug!(name, "nested form mirroring active");
        self.state = BridgeState::Active {
            child: child.clone(),
            _subscription: subscription,
        };
        true
    }

    /// Stop forwarding. The bridge never re-activates.
    pub fn deactivate(&mut self) {
        if matches!(self.state, BridgeState::Active { .. }) {
            debug!("nested form mirroring stopped");
        }
        self.state = BridgeState::Inactive;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, BridgeState::Active { .. })
    }

    /// The mirrored child form, while active.
    #[must_use]
    pub fn child(&self) -> Option<&Form> {
        match &self.state {
            BridgeState::Active { child, .. } => Some(child),
            BridgeState::Inactive => None,
        }
    }
}

impl std::fmt::Debug for ChildFormBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildFormBridge")
            .field("active", &self.is_active())
            .field("activated_once", &self.activated_once)
            .finish()
    }
}
