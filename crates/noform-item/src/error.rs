//! Errors reported by item bindings.

use noform_core::FormError;

#[derive(Debug, Clone, PartialEq)]
pub enum ItemError {
    /// The underlying store rejected the operation.
    Form(FormError),
    /// An escaped change payload has no field-value representation.
    Unrepresentable(String),
}

impl std::fmt::Display for ItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form(err) => write!(f, "form store error: {err}"),
            Self::Unrepresentable(msg) => write!(f, "change payload cannot be stored: {msg}"),
        }
    }
}

impl std::error::Error for ItemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Form(err) => Some(err),
            Self::Unrepresentable(_) => None,
        }
    }
}

impl From<FormError> for ItemError {
    fn from(err: FormError) -> Self {
        Self::Form(err)
    }
}
