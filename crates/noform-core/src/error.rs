//! Errors reported by the field store.

/// Errors from store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// A named field is already owned by another live handle.
    DuplicateField { name: String },
    /// The handle's field is no longer registered (its binding unmounted).
    UnknownField { name: String },
    /// The store behind a handle has been dropped.
    Detached,
    /// Form options could not be parsed.
    Config(String),
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateField { name } => write!(f, "field '{name}' is already registered"),
            Self::UnknownField { name } => write!(f, "field '{name}' is not registered"),
            Self::Detached => write!(f, "form store has been dropped"),
            Self::Config(msg) => write!(f, "invalid form options: {msg}"),
        }
    }
}

impl std::error::Error for FormError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        let err = FormError::DuplicateField {
            name: "age".into(),
        };
        assert_eq!(err.to_string(), "field 'age' is already registered");
        assert_eq!(
            FormError::Config("expected a table".into()).to_string(),
            "invalid form options: expected a table"
        );
    }
}
