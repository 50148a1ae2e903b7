#![forbid(unsafe_code)]

//! Channels, statuses and the fixed-or-derived sources behind them.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::{Props, Value};

/// One of the four independently updatable facets of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Value,
    Error,
    Props,
    Status,
}

impl Channel {
    /// Every channel, in storage order.
    pub const ALL: [Channel; 4] = [
        Channel::Value,
        Channel::Error,
        Channel::Props,
        Channel::Status,
    ];

    /// Wire name of the channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Error => "error",
            Self::Props => "props",
            Self::Status => "status",
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Value => 0,
            Self::Error => 1,
            Self::Props => 2,
            Self::Status => 3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display status of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Edit,
    Preview,
    Disabled,
    Hidden,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Preview => "preview",
            Self::Disabled => "disabled",
            Self::Hidden => "hidden",
        }
    }

    /// Parse a status name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "edit" => Some(Self::Edit),
            "preview" => Some(Self::Preview),
            "disabled" => Some(Self::Disabled),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }

    /// Read a status out of a channel payload (only plain strings qualify).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    #[must_use]
    pub fn to_value(self) -> Value {
        Value::String(self.as_str().to_owned())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status computed from the form's aggregate value.
pub type StatusFn = Rc<dyn Fn(&Value) -> Status>;

/// Props computed from the form's aggregate value.
pub type PropsFn = Rc<dyn Fn(&Value) -> Props>;

/// Where a field's status comes from.
///
/// Two sources are the same when both are `Fixed` with equal statuses, or
/// both are `Derived` from the very same function (pointer identity).
#[derive(Clone)]
pub enum StatusSource {
    Fixed(Status),
    Derived(StatusFn),
}

impl StatusSource {
    /// Wrap a closure as a derived status source.
    pub fn derived(f: impl Fn(&Value) -> Status + 'static) -> Self {
        Self::Derived(Rc::new(f))
    }

    /// Effective status for the given aggregate value snapshot.
    #[must_use]
    pub fn resolve(&self, values: &Value) -> Status {
        match self {
            Self::Fixed(status) => *status,
            Self::Derived(f) => f(values),
        }
    }

    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Derived(a), Self::Derived(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Status> for StatusSource {
    fn from(status: Status) -> Self {
        Self::Fixed(status)
    }
}

impl fmt::Debug for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(status) => f.debug_tuple("Fixed").field(status).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Where a field's dynamic props come from.
#[derive(Clone)]
pub enum PropsSource {
    Fixed(Props),
    Derived(PropsFn),
}

impl PropsSource {
    pub fn derived(f: impl Fn(&Value) -> Props + 'static) -> Self {
        Self::Derived(Rc::new(f))
    }

    #[must_use]
    pub fn resolve(&self, values: &Value) -> Props {
        match self {
            Self::Fixed(props) => props.clone(),
            Self::Derived(f) => f(values),
        }
    }
}

impl From<Props> for PropsSource {
    fn from(props: Props) -> Self {
        Self::Fixed(props)
    }
}

impl fmt::Debug for PropsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(props) => f.debug_tuple("Fixed").field(props).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Presence test used wherever a payload is interpreted only as "set or not".
///
/// `null`, `false`, `0` and `""` are absent; arrays and objects are always
/// present, even when empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_names_round_trip() {
        for channel in Channel::ALL {
            let encoded = serde_json::to_value(channel).unwrap();
            assert_eq!(encoded, json!(channel.as_str()));
            assert_eq!(Channel::ALL[channel.index()], channel);
        }
    }

    #[test]
    fn status_parse_accepts_only_known_names() {
        assert_eq!(Status::parse("hidden"), Some(Status::Hidden));
        assert_eq!(Status::parse("Hidden"), None);
        assert_eq!(Status::from_value(&json!({"a": "edit"})), None);
        assert_eq!(Status::from_value(&Status::Preview.to_value()), Some(Status::Preview));
    }

    #[test]
    fn fixed_sources_compare_by_status() {
        let a = StatusSource::Fixed(Status::Edit);
        assert!(a.same_source(&StatusSource::Fixed(Status::Edit)));
        assert!(!a.same_source(&StatusSource::Fixed(Status::Preview)));
    }

    #[test]
    fn derived_sources_compare_by_identity() {
        let f: StatusFn = Rc::new(|_| Status::Preview);
        let a = StatusSource::Derived(Rc::clone(&f));
        let b = StatusSource::Derived(f);
        let c = StatusSource::derived(|_| Status::Preview);
        assert!(a.same_source(&b));
        assert!(!a.same_source(&c));
        assert!(!a.same_source(&StatusSource::Fixed(Status::Preview)));
    }

    #[test]
    fn derived_status_reads_aggregate() {
        let source = StatusSource::derived(|values| {
            if values["locked"] == json!(true) {
                Status::Disabled
            } else {
                Status::Edit
            }
        });
        assert_eq!(source.resolve(&json!({"locked": true})), Status::Disabled);
        assert_eq!(source.resolve(&json!({})), Status::Edit);
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("required")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(0.5)));
    }
}
