#![forbid(unsafe_code)]

//! Status consistency after a configuration change.
//!
//! When an item receives a status source that differs from the one recorded
//! on its field (a different fixed status, a different function, or a switch
//! between the two), the field's status is recomputed from the current
//! aggregate value and written back **silently**. The write is a convergence
//! step: listeners see it with `silent = true` and do not react, so a status
//! derived from form values cannot feed back into the broadcast loop.

use noform_core::{Channel, FieldHandle, Form, FormError, Status, StatusSource};
use tracing::debug;

/// Whether `incoming` differs from the recorded source.
#[must_use]
pub fn needs_consist(recorded: Option<&StatusSource>, incoming: &StatusSource) -> bool {
    recorded.is_none_or(|recorded| !recorded.same_source(incoming))
}

/// Record `incoming` on the field and converge its status when the source
/// changed. Returns the recomputed status, or `None` when nothing changed.
pub fn reconcile_status(
    field: &FieldHandle,
    form: &Form,
    incoming: &StatusSource,
) -> Result<Option<Status>, FormError> {
    if !needs_consist(field.status_source().as_ref(), incoming) {
        return Ok(None);
    }
    field.set_status_source(incoming.clone())?;
    let status = field.consist_status(&form.get_all(Channel::Value), true)?;
    debug!(field = %field.name(), ?status, "status source changed; converged");
    Ok(status)
}
