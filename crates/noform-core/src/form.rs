#![forbid(unsafe_code)]

//! The shared field store.
//!
//! # Architecture
//!
//! `Form` wraps an `Rc` so every binding of a form shares one store. The four
//! channels live in flat maps keyed by field name; per-field sources
//! (derived status/props, interceptor, `when`) live in the field table keyed
//! by field id. A write applies to the maps first, then broadcasts, so a
//! listener reading the store during delivery sees the new state.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Duplicate name | Second live binding for a name | `add_field` returns `DuplicateField` |
//! | Write to unregistered name | Seeding before registration | Stored; no error |
//! | Listener panics | User callback | Propagates; ambient origin still resets |

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use tracing::{debug, trace};

use crate::broadcast::{Broadcast, Commit, Signal};
use crate::channel::{Channel, PropsSource, Status, StatusSource};
use crate::error::FormError;
use crate::field::{FieldHandle, FieldMeta, FieldOptions};
use crate::options::FormOptions;
use crate::origin::{Origin, OriginGuard};
use crate::subscription::{ListenerList, Subscription};
use crate::{Props, Value};

/// Global counter for generated field ids.
static FIELD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_field_id() -> String {
    format!(
        "__noform__field__{}",
        FIELD_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

#[derive(Default)]
struct FormState {
    /// Indexed by [`Channel::index`].
    channels: [Props; 4],
    /// Field id -> bookkeeping.
    fields: AHashMap<String, FieldMeta>,
    /// Field name -> id of the owning field.
    owners: AHashMap<String, String>,
}

impl FormState {
    fn read(&self, channel: Channel, name: &str) -> Option<&Value> {
        self.channels[channel.index()].get(name)
    }

    /// Returns whether the stored payload changed.
    fn write(&mut self, channel: Channel, name: &str, value: Value) -> bool {
        let slot = &mut self.channels[channel.index()];
        match slot.get(name) {
            Some(old) if *old == value => false,
            _ => {
                slot.insert(name.to_owned(), value);
                true
            }
        }
    }
}

struct FormInner {
    options: RefCell<FormOptions>,
    state: RefCell<FormState>,
    changes: ListenerList<Broadcast>,
    signals: ListenerList<Signal>,
    origin: Rc<RefCell<Origin>>,
}

/// Shared handle to a form's field store.
#[derive(Clone)]
pub struct Form {
    inner: Rc<FormInner>,
}

/// Weak counterpart of [`Form`], for listeners that must not keep a store alive.
#[derive(Clone, Default)]
pub struct WeakForm {
    inner: Weak<FormInner>,
}

impl WeakForm {
    #[must_use]
    pub fn upgrade(&self) -> Option<Form> {
        self.inner.upgrade().map(|inner| Form { inner })
    }
}

impl Form {
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        Self {
            inner: Rc::new(FormInner {
                options: RefCell::new(options),
                state: RefCell::new(FormState::default()),
                changes: ListenerList::new(),
                signals: ListenerList::new(),
                origin: Rc::new(RefCell::new(Origin::Api)),
            }),
        }
    }

    #[must_use]
    pub fn options(&self) -> FormOptions {
        self.inner.options.borrow().clone()
    }

    pub fn set_options(&self, options: FormOptions) {
        *self.inner.options.borrow_mut() = options;
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakForm {
        WeakForm {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same store.
    #[must_use]
    pub fn ptr_eq(&self, other: &Form) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a field and return its handle.
    ///
    /// Registration itself does not broadcast.
    pub fn add_field(&self, options: FieldOptions) -> Result<FieldHandle, FormError> {
        let FieldOptions {
            name,
            id,
            value,
            default_value,
            error,
            props,
            status,
            validate_config,
            interceptor,
            when,
            parent_if,
        } = options;

        // Derived sources may read the store; resolve them before borrowing.
        let values = self.get_all(Channel::Value);
        let initial_props = props.as_ref().map(|source| source.resolve(&values));
        let initial_status = status.as_ref().map(|source| source.resolve(&values));

        let id = id.unwrap_or_else(next_field_id);
        let mut state = self.inner.state.borrow_mut();
        if !name.is_empty() {
            if state.owners.contains_key(&name) {
                return Err(FormError::DuplicateField { name });
            }
            state.owners.insert(name.clone(), id.clone());

            if let Some(value) = value {
                state.write(Channel::Value, &name, value);
            } else if let Some(value) = default_value {
                if state.read(Channel::Value, &name).is_none() {
                    state.write(Channel::Value, &name, value);
                }
            }
            if let Some(error) = error {
                state.write(Channel::Error, &name, error);
            }
            if let Some(props) = initial_props {
                state.write(Channel::Props, &name, Value::Object(props));
            }
            match initial_status {
                Some(status) => {
                    state.write(Channel::Status, &name, status.to_value());
                }
                None if state.read(Channel::Status, &name).is_none() => {
                    state.write(Channel::Status, &name, Status::Edit.to_value());
                }
                None => {}
            }
        }
        state.fields.insert(
            id.clone(),
            FieldMeta {
                name: name.clone(),
                props_source: props,
                status_source: status,
                interceptor,
                when,
                parent_if,
                validate_config,
            },
        );
        drop(state);

        debug!(field_id = %id, name = %name, "field registered");
        Ok(FieldHandle::new(self.downgrade(), id, name))
    }

    /// Deregister a field. Channel data stays in the store; the name becomes
    /// free for another binding.
    pub fn remove_field(&self, field: &FieldHandle) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let Some(meta) = state.fields.remove(field.id()) else {
            return false;
        };
        if state.owners.get(&meta.name).is_some_and(|id| id == field.id()) {
            state.owners.remove(&meta.name);
        }
        drop(state);
        debug!(field_id = %field.id(), name = %meta.name, "field removed");
        true
    }

    /// Whether a live field owns `name`.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.inner.state.borrow().owners.contains_key(name)
    }

    pub(crate) fn with_meta<R>(&self, id: &str, f: impl FnOnce(&FieldMeta) -> R) -> Option<R> {
        self.inner.state.borrow().fields.get(id).map(f)
    }

    pub(crate) fn with_meta_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut FieldMeta) -> R,
    ) -> Option<R> {
        self.inner.state.borrow_mut().fields.get_mut(id).map(f)
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    /// Subscribe to every channel write of every field.
    pub fn on_change(&self, listener: impl Fn(&Broadcast) + 'static) -> Subscription {
        self.inner.changes.add(listener)
    }

    /// Subscribe to lifecycle signals (blur, focus, generic interaction).
    pub fn on_signal(&self, listener: impl Fn(&Signal) + 'static) -> Subscription {
        self.inner.signals.add(listener)
    }

    /// Number of live change listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.changes.len()
    }

    pub fn emit(&self, signal: Signal) {
        trace!(field = %signal.field_name(), ?signal, "signal");
        self.inner.signals.notify(&signal);
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Non-silent write of one channel.
    pub fn set(&self, channel: Channel, name: &str, value: Value) -> Commit {
        self.commit(channel, name, value, false)
    }

    /// Silent write of one channel.
    pub fn set_silent(&self, channel: Channel, name: &str, value: Value) -> Commit {
        self.commit(channel, name, value, true)
    }

    /// Non-silent value write.
    pub fn set_value(&self, name: &str, value: Value) -> Commit {
        self.commit(Channel::Value, name, value, false)
    }

    pub fn set_value_silent(&self, name: &str, value: Value) -> Commit {
        self.commit(Channel::Value, name, value, true)
    }

    /// Silent props write, used for seeding and mirroring.
    pub fn set_props(&self, name: &str, value: Value) -> Commit {
        self.commit(Channel::Props, name, value, true)
    }

    /// Silent status write, used for seeding and mirroring.
    pub fn set_status(&self, name: &str, value: Value) -> Commit {
        self.commit(Channel::Status, name, value, true)
    }

    /// Silent error write, used for seeding and mirroring.
    pub fn set_error(&self, name: &str, value: Value) -> Commit {
        self.commit(Channel::Error, name, value, true)
    }

    pub(crate) fn commit(&self, channel: Channel, name: &str, value: Value, silent: bool) -> Commit {
        let changed = self
            .inner
            .state
            .borrow_mut()
            .write(channel, name, value.clone());
        let origin = self.current_origin();
        trace!(%channel, name, silent, changed, origin = origin.kind(), "commit");

        let broadcast = Broadcast {
            channel,
            name: name.to_owned(),
            value,
            silent,
            origin: origin.clone(),
        };
        self.inner.changes.notify(&broadcast);

        if channel == Channel::Value && !silent {
            self.refresh_derived();
        }

        Commit {
            channel,
            name: name.to_owned(),
            origin,
            changed,
        }
    }

    /// Recompute derived status/props of every field against the current
    /// aggregate value and broadcast the ones that changed.
    fn refresh_derived(&self) {
        let derived: Vec<(String, Option<StatusSource>, Option<PropsSource>)> = {
            let state = self.inner.state.borrow();
            state
                .fields
                .values()
                .filter(|meta| !meta.name.is_empty())
                .filter_map(|meta| {
                    let status = meta
                        .status_source
                        .clone()
                        .filter(|s| matches!(s, StatusSource::Derived(_)));
                    let props = meta
                        .props_source
                        .clone()
                        .filter(|p| matches!(p, PropsSource::Derived(_)));
                    (status.is_some() || props.is_some()).then(|| (meta.name.clone(), status, props))
                })
                .collect()
        };
        if derived.is_empty() {
            return;
        }

        let values = self.get_all(Channel::Value);
        for (name, status, props) in derived {
            if let Some(source) = status {
                let next = source.resolve(&values).to_value();
                if self.get_item(Channel::Status, &name).as_ref() != Some(&next) {
                    self.commit(Channel::Status, &name, next, false);
                }
            }
            if let Some(source) = props {
                let next = Value::Object(source.resolve(&values));
                if self.get_item(Channel::Props, &name).as_ref() != Some(&next) {
                    self.commit(Channel::Props, &name, next, false);
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Aggregate snapshot of one channel across all fields, as an object
    /// keyed by field name.
    #[must_use]
    pub fn get_all(&self, channel: Channel) -> Value {
        Value::Object(self.inner.state.borrow().channels[channel.index()].clone())
    }

    #[must_use]
    pub fn get_item(&self, channel: Channel, name: &str) -> Option<Value> {
        self.inner.state.borrow().read(channel, name).cloned()
    }

    #[must_use]
    pub fn get_item_value(&self, name: &str) -> Option<Value> {
        self.get_item(Channel::Value, name)
    }

    /// Current error of a field; `None` when absent or `null`.
    #[must_use]
    pub fn get_item_error(&self, name: &str) -> Option<Value> {
        self.get_item(Channel::Error, name).filter(|e| !e.is_null())
    }

    /// Dynamic props of a field; empty when none are set.
    #[must_use]
    pub fn get_item_props(&self, name: &str) -> Props {
        match self.get_item(Channel::Props, name) {
            Some(Value::Object(props)) => props,
            _ => Props::new(),
        }
    }

    /// Effective status of a field. A field whose `when` condition fails
    /// reports [`Status::Hidden`].
    #[must_use]
    pub fn get_item_status(&self, name: &str) -> Option<Status> {
        let (when, stored) = {
            let state = self.inner.state.borrow();
            let when = state
                .owners
                .get(name)
                .and_then(|id| state.fields.get(id))
                .and_then(|meta| meta.when.clone());
            (when, state.read(Channel::Status, name).cloned())
        };
        if let Some(when) = when {
            if !when(&self.get_all(Channel::Value)) {
                return Some(Status::Hidden);
            }
        }
        stored.as_ref().and_then(Status::from_value)
    }

    // ---------------------------------------------------------------------
    // Origin
    // ---------------------------------------------------------------------

    /// Ambient origin of the commit currently being delivered.
    #[must_use]
    pub fn current_origin(&self) -> Origin {
        self.inner.origin.borrow().clone()
    }

    /// Make `origin` ambient until the returned guard drops.
    pub fn enter_origin(&self, origin: Origin) -> OriginGuard {
        OriginGuard::enter(&self.inner.origin, origin)
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Form")
            .field("fields", &state.fields.len())
            .field("listeners", &self.inner.changes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventOptions;
    use serde_json::json;
    use std::cell::Cell;

    fn form() -> Form {
        Form::new(FormOptions::default())
    }

    #[test]
    fn value_takes_precedence_over_default() {
        let form = form();
        form.set_value_silent("a", json!("preset"));
        form.set_value_silent("b", json!("preset"));

        form.add_field(FieldOptions::named("a").value(json!("controlled")))
            .unwrap();
        form.add_field(FieldOptions::named("b").default_value(json!("fallback")))
            .unwrap();
        form.add_field(FieldOptions::named("c").default_value(json!("fallback")))
            .unwrap();

        assert_eq!(form.get_item_value("a"), Some(json!("controlled")));
        assert_eq!(form.get_item_value("b"), Some(json!("preset")));
        assert_eq!(form.get_item_value("c"), Some(json!("fallback")));
    }

    #[test]
    fn duplicate_names_are_rejected_until_removed() {
        let form = form();
        let first = form.add_field(FieldOptions::named("age")).unwrap();
        let err = form.add_field(FieldOptions::named("age")).unwrap_err();
        assert_eq!(err, FormError::DuplicateField { name: "age".into() });

        assert!(form.remove_field(&first));
        assert!(!form.has_field("age"));
        assert!(form.add_field(FieldOptions::named("age")).is_ok());
    }

    #[test]
    fn anonymous_fields_never_collide() {
        let form = form();
        let a = form.add_field(FieldOptions::named("")).unwrap();
        let b = form.add_field(FieldOptions::named("")).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(form.get_all(Channel::Status), json!({}));
    }

    #[test]
    fn explicit_id_is_kept() {
        let form = form();
        let field = form
            .add_field(FieldOptions {
                id: Some("age-input".into()),
                ..FieldOptions::named("age")
            })
            .unwrap();
        assert_eq!(field.id(), "age-input");
    }

    #[test]
    fn default_status_is_edit() {
        let form = form();
        form.add_field(FieldOptions::named("x")).unwrap();
        assert_eq!(form.get_item_status("x"), Some(Status::Edit));
    }

    #[test]
    fn broadcast_sees_applied_state() {
        let form = form();
        let seen = Rc::new(RefCell::new(None));
        let reader = form.clone();
        let s = Rc::clone(&seen);
        let _sub = form.on_change(move |b| {
            *s.borrow_mut() = Some((b.clone(), reader.get_item_value(&b.name)));
        });

        let commit = form.set_value("age", json!("30"));
        assert!(commit.changed);
        let (broadcast, stored) = seen.borrow().clone().unwrap();
        assert_eq!(broadcast.channel, Channel::Value);
        assert_eq!(broadcast.name, "age");
        assert!(!broadcast.silent);
        assert_eq!(broadcast.origin, Origin::Api);
        assert_eq!(stored, Some(json!("30")));
    }

    #[test]
    fn silent_writes_are_flagged() {
        let form = form();
        let flags = Rc::new(RefCell::new(Vec::new()));
        let f = Rc::clone(&flags);
        let _sub = form.on_change(move |b| f.borrow_mut().push((b.channel, b.silent)));

        form.set_value_silent("a", json!(1));
        form.set_props("a", json!({}));
        form.set_status("a", json!("edit"));
        form.set_error("a", json!(null));
        form.set(Channel::Error, "a", json!("bad"));

        assert_eq!(
            *flags.borrow(),
            vec![
                (Channel::Value, true),
                (Channel::Props, true),
                (Channel::Status, true),
                (Channel::Error, true),
                (Channel::Error, false),
            ]
        );
    }

    #[test]
    fn unchanged_write_still_broadcasts() {
        let form = form();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = form.on_change(move |_| h.set(h.get() + 1));
        assert!(form.set_value("a", json!(1)).changed);
        assert!(!form.set_value("a", json!(1)).changed);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn listeners_may_write_reentrantly() {
        let form = form();
        let writer = form.clone();
        let _sub = form.on_change(move |b| {
            if b.name == "first" {
                writer.set_value("second", b.value.clone());
            }
        });
        form.set_value("first", json!("x"));
        assert_eq!(form.get_item_value("second"), Some(json!("x")));
    }

    #[test]
    fn derived_status_follows_value_commits() {
        let form = form();
        form.add_field(FieldOptions::named("kind")).unwrap();
        form.add_field(FieldOptions::named("detail").status(StatusSource::derived(|v| {
            if v["kind"] == json!("none") {
                Status::Hidden
            } else {
                Status::Edit
            }
        })))
        .unwrap();

        let statuses = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&statuses);
        let _sub = form.on_change(move |b| {
            if b.channel == Channel::Status {
                s.borrow_mut().push((b.name.clone(), b.value.clone(), b.silent));
            }
        });

        form.set_value("kind", json!("none"));
        assert_eq!(form.get_item_status("detail"), Some(Status::Hidden));
        // Unchanged derivations are not re-broadcast.
        form.set_value("kind", json!("none"));
        assert_eq!(
            *statuses.borrow(),
            vec![("detail".to_string(), json!("hidden"), false)]
        );
    }

    #[test]
    fn derived_props_follow_value_commits() {
        let form = form();
        form.add_field(FieldOptions::named("qty").props(PropsSource::derived(|v| {
            let mut props = Props::new();
            props.insert("required".into(), json!(v["mode"] == json!("strict")));
            props
        })))
        .unwrap();
        assert_eq!(form.get_item_props("qty")["required"], json!(false));
        form.set_value("mode", json!("strict"));
        assert_eq!(form.get_item_props("qty")["required"], json!(true));
    }

    #[test]
    fn when_hides_field() {
        let form = form();
        form.add_field(FieldOptions::named("reason").when(|v| v["other"] == json!(true)))
            .unwrap();
        assert_eq!(form.get_item_status("reason"), Some(Status::Hidden));
        form.set_value("other", json!(true));
        assert_eq!(form.get_item_status("reason"), Some(Status::Edit));
    }

    #[test]
    fn error_reads_skip_null() {
        let form = form();
        form.set_error("a", json!(null));
        assert_eq!(form.get_item_error("a"), None);
        form.set_error("a", json!({"main": "required", "sub": null}));
        assert!(form.get_item_error("a").is_some());
    }

    #[test]
    fn signals_reach_signal_listeners_only() {
        let form = form();
        let signals = Rc::new(RefCell::new(Vec::new()));
        let changes = Rc::new(Cell::new(0));
        let s = Rc::clone(&signals);
        let c = Rc::clone(&changes);
        let _a = form.on_signal(move |sig| s.borrow_mut().push(sig.clone()));
        let _b = form.on_change(move |_| c.set(c.get() + 1));

        form.emit(Signal::Blur("age".into()));
        assert_eq!(*signals.borrow(), vec![Signal::Blur("age".into())]);
        assert_eq!(changes.get(), 0);
    }

    #[test]
    fn commits_carry_ambient_origin() {
        let form = form();
        let origins = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&origins);
        let _sub = form.on_change(move |b| o.borrow_mut().push(b.origin.kind()));

        {
            let _guard = form.enter_origin(Origin::Manual {
                field_id: "f".into(),
                options: EventOptions::default(),
            });
            let commit = form.set_value("a", json!(1));
            assert!(commit.origin.is_manual());
        }
        form.set_value("a", json!(2));
        assert_eq!(*origins.borrow(), vec!["manual", "api"]);
        assert_eq!(form.current_origin(), Origin::Api);
    }

    #[test]
    fn dropped_listener_stops_receiving() {
        let form = form();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = form.on_change(move |_| h.set(h.get() + 1));
        assert_eq!(form.listener_count(), 1);
        form.set_value("a", json!(1));
        drop(sub);
        form.set_value("a", json!(2));
        assert_eq!(hits.get(), 1);
        assert_eq!(form.listener_count(), 0);
    }
}
