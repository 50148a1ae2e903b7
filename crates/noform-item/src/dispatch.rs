#![forbid(unsafe_code)]

//! Update dispatch: how an item reacts to one store broadcast.
//!
//! The dispatcher is a pure decision function. Given the item's mount state,
//! its listen specification, its listen flags and a [`Broadcast`], it returns
//! a [`Reaction`]: whether to re-render, and which cached class strings to
//! patch in place. Applying the reaction is the item's job.
//!
//! # Decision Rule
//!
//! ```text
//! hit        = listen.hits(broadcast.name)
//! can_update = mounted && hit && !broadcast.silent
//! ```
//!
//! When `can_update` is false the reaction is [`Reaction::IGNORE`].
//! Otherwise:
//!
//! | Channel  | Patch               | Re-render              |
//! |----------|---------------------|------------------------|
//! | `status` | none                | always                 |
//! | `error`  | wrapper             | when `listen_error`    |
//! | `props`  | content and label   | when `listen_props`    |
//! | `value`  | none                | when rendering through a render function |
//!
//! A patched target also refreshes the sections inside it that read the
//! same channel: the error section with the wrapper, the label and the
//! top/prefix/suffix/help sections with label and content.
//!
//! # Invariants
//!
//! 1. **Filtering**: a miss or a silent broadcast never patches or renders.
//! 2. **Status supersedes**: an accepted status broadcast always re-renders,
//!    regardless of listen flags.
//! 3. **Deterministic**: same inputs produce the same reaction.

use bitflags::bitflags;
use noform_core::{Broadcast, Channel};
use tracing::trace;

use crate::config::{ItemConfig, ListenSpec};

bitflags! {
    /// Cached render targets whose class string must be recomputed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatchTargets: u8 {
        const WRAPPER = 0b001;
        const LABEL   = 0b010;
        const CONTENT = 0b100;
    }
}

/// Listen flags of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenFlags {
    pub error: bool,
    pub props: bool,
    /// The item renders through a caller-supplied render function.
    pub custom_render: bool,
}

impl ListenFlags {
    #[must_use]
    pub fn for_config(config: &ItemConfig) -> Self {
        Self {
            error: config.listen_error,
            props: config.listen_props,
            custom_render: config.render.is_some(),
        }
    }
}

/// What an item must do in response to a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reaction {
    pub rerender: bool,
    pub patch: PatchTargets,
}

impl Reaction {
    pub const IGNORE: Self = Self {
        rerender: false,
        patch: PatchTargets::empty(),
    };

    #[must_use]
    pub fn is_ignore(&self) -> bool {
        !self.rerender && self.patch.is_empty()
    }
}

/// Decide the reaction of one item to one broadcast.
#[must_use]
pub fn dispatch(
    mounted: bool,
    listen: &ListenSpec,
    flags: ListenFlags,
    broadcast: &Broadcast,
) -> Reaction {
    let hit = listen.hits(&broadcast.name);
    let can_update = mounted && hit && !broadcast.silent;

    let reaction = if can_update {
        match broadcast.channel {
            Channel::Status => Reaction {
                rerender: true,
                patch: PatchTargets::empty(),
            },
            Channel::Error => Reaction {
                rerender: flags.error,
                patch: PatchTargets::WRAPPER,
            },
            Channel::Props => Reaction {
                rerender: flags.props,
                patch: PatchTargets::CONTENT | PatchTargets::LABEL,
            },
            Channel::Value => Reaction {
                rerender: flags.custom_render,
                patch: PatchTargets::empty(),
            },
        }
    } else {
        Reaction::IGNORE
    };

    trace!(
        channel = %broadcast.channel,
        name = %broadcast.name,
        hit,
        silent = broadcast.silent,
        rerender = reaction.rerender,
        patch = ?reaction.patch,
        "dispatch"
    );
    reaction
}
