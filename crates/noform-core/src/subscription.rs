#![forbid(unsafe_code)]

//! Listener lists with RAII unsubscription.
//!
//! Listeners are stored as `Weak` callbacks; the strong reference lives in
//! the [`Subscription`] returned to the caller. Dead entries are pruned
//! lazily on the next notification.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. The list is snapshotted before delivery: a listener added during a
//!    notification is first called on the next one, and the list is never
//!    borrowed while a callback runs.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle. A notification already in flight still reaches it;
//!    receivers that tear down state must guard themselves.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<E> = dyn Fn(&E);

pub(crate) struct ListenerList<E: 'static> {
    entries: RefCell<Vec<Weak<Callback<E>>>>,
}

impl<E: 'static> ListenerList<E> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: Rc<Callback<E>> = Rc::new(callback);
        self.entries.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            callback: Some(Box::new(strong)),
        }
    }

    pub(crate) fn notify(&self, event: &E) {
        let live: Vec<Rc<Callback<E>>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|w| w.strong_count() > 0);
            entries.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

/// Keeps a listener registered. Drop it (or call
/// [`unsubscribe`](Self::unsubscribe)) to remove the listener.
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    callback: Option<Box<dyn Any>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.callback.take();
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
