#![forbid(unsafe_code)]

//! Field registration options and the handle a binding keeps.

use std::fmt;
use std::rc::Rc;

use crate::broadcast::{Commit, Signal};
use crate::channel::{Channel, PropsSource, Status, StatusSource};
use crate::error::FormError;
use crate::form::{Form, WeakForm};
use crate::Value;

/// Rewrites a value on its way into the value channel.
pub type Interceptor = Rc<dyn Fn(Value) -> Value>;

/// Conditional visibility: the field is shown while this holds for the
/// form's aggregate value.
pub type WhenFn = Rc<dyn Fn(&Value) -> bool>;

/// Options for [`Form::add_field`].
///
/// `value` and `default_value` are distinct: a present `value` always
/// overwrites the store (controlled), a `default_value` only seeds a name
/// that has no value yet (uncontrolled).
#[derive(Clone, Default)]
pub struct FieldOptions {
    pub name: String,
    pub id: Option<String>,
    pub value: Option<Value>,
    pub default_value: Option<Value>,
    pub error: Option<Value>,
    pub props: Option<PropsSource>,
    pub status: Option<StatusSource>,
    /// Stored for the validation layer; never evaluated here.
    pub validate_config: Option<Value>,
    pub interceptor: Option<Interceptor>,
    pub when: Option<WhenFn>,
    pub parent_if: Option<String>,
}

impl FieldOptions {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn status(mut self, status: impl Into<StatusSource>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn props(mut self, props: impl Into<PropsSource>) -> Self {
        self.props = Some(props.into());
        self
    }

    #[must_use]
    pub fn interceptor(mut self, f: impl Fn(Value) -> Value + 'static) -> Self {
        self.interceptor = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn when(mut self, f: impl Fn(&Value) -> bool + 'static) -> Self {
        self.when = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("value", &self.value)
            .field("default_value", &self.default_value)
            .field("error", &self.error)
            .field("props", &self.props)
            .field("status", &self.status)
            .field("interceptor", &self.interceptor.is_some())
            .field("when", &self.when.is_some())
            .finish()
    }
}

/// Per-field bookkeeping kept by the store.
pub(crate) struct FieldMeta {
    pub(crate) name: String,
    pub(crate) props_source: Option<PropsSource>,
    pub(crate) status_source: Option<StatusSource>,
    pub(crate) interceptor: Option<Interceptor>,
    pub(crate) when: Option<WhenFn>,
    pub(crate) parent_if: Option<String>,
    pub(crate) validate_config: Option<Value>,
}

/// Non-owning handle to a registered field.
///
/// Holds the store weakly; every operation fails with
/// [`FormError::Detached`] once the store is gone and with
/// [`FormError::UnknownField`] once the field has been removed.
#[derive(Clone)]
pub struct FieldHandle {
    form: WeakForm,
    id: String,
    name: String,
}

impl FieldHandle {
    pub(crate) fn new(form: WeakForm, id: String, name: String) -> Self {
        Self { form, id, name }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owning store, if it is still alive.
    #[must_use]
    pub fn form(&self) -> Option<Form> {
        self.form.upgrade()
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.form
            .upgrade()
            .is_some_and(|form| form.with_meta(&self.id, |_| ()).is_some())
    }

    fn attached(&self) -> Result<Form, FormError> {
        let form = self.form.upgrade().ok_or(FormError::Detached)?;
        if form.with_meta(&self.id, |_| ()).is_none() {
            return Err(FormError::UnknownField {
                name: self.name.clone(),
            });
        }
        Ok(form)
    }

    /// Write one channel of this field (non-silent).
    ///
    /// Value writes pass through the field's interceptor unless `escape`.
    pub fn set(&self, channel: Channel, value: Value, escape: bool) -> Result<Commit, FormError> {
        let form = self.attached()?;
        let value = if channel == Channel::Value && !escape {
            match form.with_meta(&self.id, |meta| meta.interceptor.clone()).flatten() {
                Some(intercept) => intercept(value),
                None => value,
            }
        } else {
            value
        };
        Ok(form.commit(channel, &self.name, value, false))
    }

    /// Publish a lifecycle signal on the owning store.
    pub fn emit(&self, signal: Signal) -> Result<(), FormError> {
        let form = self.form.upgrade().ok_or(FormError::Detached)?;
        form.emit(signal);
        Ok(())
    }

    /// Current payload of one channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<Value> {
        self.form
            .upgrade()
            .and_then(|form| form.get_item(channel, &self.name))
    }

    /// Effective status, `Edit` when none is recorded.
    #[must_use]
    pub fn status(&self) -> Status {
        self.form
            .upgrade()
            .and_then(|form| form.get_item_status(&self.name))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn status_source(&self) -> Option<StatusSource> {
        self.form
            .upgrade()
            .and_then(|form| form.with_meta(&self.id, |meta| meta.status_source.clone()))
            .flatten()
    }

    /// Record a new status source without writing the status channel.
    pub fn set_status_source(&self, source: StatusSource) -> Result<(), FormError> {
        let form = self.attached()?;
        form.with_meta_mut(&self.id, |meta| meta.status_source = Some(source));
        Ok(())
    }

    /// Recompute the effective status from the recorded source and push it
    /// into the status channel. Returns `None` when no source is recorded.
    pub fn consist_status(&self, values: &Value, silent: bool) -> Result<Option<Status>, FormError> {
        let form = self.attached()?;
        let Some(source) = form
            .with_meta(&self.id, |meta| meta.status_source.clone())
            .flatten()
        else {
            return Ok(None);
        };
        let status = source.resolve(values);
        form.commit(Channel::Status, &self.name, status.to_value(), silent);
        Ok(Some(status))
    }

    #[must_use]
    pub fn parent_if(&self) -> Option<String> {
        self.form
            .upgrade()
            .and_then(|form| form.with_meta(&self.id, |meta| meta.parent_if.clone()))
            .flatten()
    }

    #[must_use]
    pub fn validate_config(&self) -> Option<Value> {
        self.form
            .upgrade()
            .and_then(|form| form.with_meta(&self.id, |meta| meta.validate_config.clone()))
            .flatten()
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
