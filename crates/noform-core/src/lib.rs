#![forbid(unsafe_code)]

//! Form-wide field store for noform.
//!
//! A [`Form`] holds every field's four independently settable channels
//! (value, error, props, status) in a flat namespace keyed by field name,
//! and broadcasts each write synchronously to its listeners.
//!
//! - [`Form`]: shared, single-threaded store handle (`Rc` inside, cheap to clone).
//! - [`FieldHandle`]: non-owning handle returned by [`Form::add_field`].
//! - [`Broadcast`]: the `(channel, name, value, silent, origin)` notification.
//! - [`Signal`]: named lifecycle signals (blur, focus, generic interaction).
//! - [`Subscription`]: RAII guard; dropping it removes the listener.
//!
//! # Invariants
//!
//! 1. Broadcasts are delivered synchronously, in registration order, before
//!    the writing call returns.
//! 2. No store borrow is held while a listener runs, so listeners may read
//!    and write the store reentrantly.
//! 3. A named field is owned by at most one live handle at a time.
//! 4. Outside an [`OriginGuard`] scope the ambient origin is [`Origin::Api`].

pub mod broadcast;
pub mod channel;
pub mod error;
pub mod field;
pub mod form;
pub mod options;
pub mod origin;
pub mod subscription;

pub use broadcast::{Broadcast, Commit, InteractionEvent, Signal};
pub use channel::{Channel, PropsFn, PropsSource, Status, StatusFn, StatusSource, is_truthy};
pub use error::FormError;
pub use field::{FieldHandle, FieldOptions, Interceptor, WhenFn};
pub use form::{Form, WeakForm};
pub use options::{FormOptions, Layout};
pub use origin::{EventOptions, Origin, OriginGuard};
pub use subscription::Subscription;

/// Field values and every other channel payload.
pub use serde_json::Value;

/// Dynamic props of a single field.
pub type Props = serde_json::Map<String, Value>;
