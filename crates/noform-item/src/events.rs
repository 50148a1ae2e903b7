#![forbid(unsafe_code)]

//! Change payloads and their normalization into field values.
//!
//! A change interaction carries one of three payload shapes:
//!
//! - [`ChangeEvent::Input`]: a native input event with a target exposing
//!   `value` and/or `checked`.
//! - [`ChangeEvent::Value`]: a plain value handed over by a widget.
//! - [`ChangeEvent::Structured`]: any `Serialize` structure owned by the
//!   caller.
//!
//! # Normalization
//!
//! Unless the caller escapes the payload, the committed value is extracted as
//! `target.value`, else `target.checked`, else the payload itself. A
//! structured result (object or array) is round-tripped through JSON text;
//! if that pass fails the committed value is `{}`, never the raw failure.
//!
//! Escaped payloads skip extraction and the round trip: inputs commit the
//! whole event object, plain values commit as-is. A structured payload has
//! no field-value form other than its JSON encoding; when that encoding
//! fails under escape the change is rejected with
//! [`ItemError::Unrepresentable`].

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;
use tracing::warn;

use noform_core::{Props, Value};

use crate::error::ItemError;

/// Target of a native input event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventTarget {
    pub value: Option<Value>,
    pub checked: Option<bool>,
}

type Encoder = Rc<dyn Fn() -> serde_json::Result<String>>;

/// A caller-owned structure, encoded lazily.
#[derive(Clone)]
pub struct StructuredPayload {
    encode: Encoder,
}

impl StructuredPayload {
    pub fn new<T: Serialize + 'static>(payload: T) -> Self {
        let payload = Rc::new(payload);
        Self {
            encode: Rc::new(move || serde_json::to_string(&*payload)),
        }
    }

    fn encode(&self) -> serde_json::Result<String> {
        (self.encode)()
    }
}

impl fmt::Debug for StructuredPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StructuredPayload(..)")
    }
}

/// Payload of a change interaction.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Input(EventTarget),
    Value(Value),
    Structured(StructuredPayload),
}

impl ChangeEvent {
    /// Input event whose target has a `value`.
    pub fn input(value: impl Into<Value>) -> Self {
        Self::Input(EventTarget {
            value: Some(value.into()),
            checked: None,
        })
    }

    /// Input event whose target only has `checked`.
    #[must_use]
    pub fn checked(checked: bool) -> Self {
        Self::Input(EventTarget {
            value: None,
            checked: Some(checked),
        })
    }

    pub fn structured<T: Serialize + 'static>(payload: T) -> Self {
        Self::Structured(StructuredPayload::new(payload))
    }

    /// JSON form of the whole event, used as the escaped commit of an input
    /// and as the argument list of the outward `onChange` signal.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Input(target) => {
                let mut t = Props::new();
                if let Some(value) = &target.value {
                    t.insert("value".into(), value.clone());
                }
                if let Some(checked) = target.checked {
                    t.insert("checked".into(), Value::Bool(checked));
                }
                json!({ "target": t })
            }
            Self::Value(value) => value.clone(),
            Self::Structured(payload) => payload
                .encode()
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
                .unwrap_or(Value::Null),
        }
    }
}

impl From<Value> for ChangeEvent {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Object or array.
#[must_use]
pub fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn round_trip(encoded: serde_json::Result<String>) -> Value {
    match encoded.and_then(|text| serde_json::from_str::<Value>(&text)) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "change payload failed to serialize; committing empty object");
            Value::Object(Props::new())
        }
    }
}

/// Compute the value a change interaction commits.
pub fn normalize_change(event: &ChangeEvent, escape: bool) -> Result<Value, ItemError> {
    if escape {
        return match event {
            ChangeEvent::Input(_) | ChangeEvent::Value(_) => Ok(event.to_value()),
            ChangeEvent::Structured(payload) => payload
                .encode()
                .and_then(|text| serde_json::from_str(&text))
                .map_err(|e| ItemError::Unrepresentable(e.to_string())),
        };
    }

    let extracted = match event {
        ChangeEvent::Input(EventTarget {
            value: Some(value), ..
        }) => value.clone(),
        ChangeEvent::Input(EventTarget {
            value: None,
            checked: Some(checked),
        }) => Value::Bool(*checked),
        ChangeEvent::Input(_) => event.to_value(),
        ChangeEvent::Value(value) => value.clone(),
        ChangeEvent::Structured(payload) => return Ok(round_trip(payload.encode())),
    };

    if is_structured(&extracted) {
        Ok(round_trip(serde_json::to_string(&extracted)))
    } else {
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn prefers_target_value() {
        let event = ChangeEvent::Input(EventTarget {
            value: Some(json!("x")),
            checked: Some(true),
        });
        assert_eq!(normalize_change(&event, false).unwrap(), json!("x"));
    }

    #[test]
    fn falls_back_to_checked() {
        assert_eq!(
            normalize_change(&ChangeEvent::checked(true), false).unwrap(),
            json!(true)
        );
    }

    #[test]
    fn bare_target_commits_event_object() {
        let event = ChangeEvent::Input(EventTarget::default());
        assert_eq!(normalize_change(&event, false).unwrap(), json!({"target": {}}));
    }

    #[test]
    fn strings_are_not_coerced() {
        assert_eq!(
            normalize_change(&ChangeEvent::input("30"), false).unwrap(),
            json!("30")
        );
    }

    #[test]
    fn structured_value_round_trips() {
        let event = ChangeEvent::Value(json!({"a": 1}));
        assert_eq!(normalize_change(&event, false).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn structured_target_value_round_trips() {
        let event = ChangeEvent::input(json!(["a", {"b": 2}]));
        assert_eq!(normalize_change(&event, false).unwrap(), json!(["a", {"b": 2}]));
    }

    #[test]
    fn serializable_struct_is_normalized() {
        #[derive(Serialize)]
        struct Range {
            start: u32,
            end: u32,
        }
        let event = ChangeEvent::structured(Range { start: 1, end: 5 });
        assert_eq!(
            normalize_change(&event, false).unwrap(),
            json!({"start": 1, "end": 5})
        );
    }

    #[test]
    fn unserializable_payload_degrades_to_empty_object() {
        // JSON object keys must be strings.
        let mut grid = HashMap::new();
        grid.insert((1, 2), "cell");
        let event = ChangeEvent::structured(grid);
        assert_eq!(normalize_change(&event, false).unwrap(), json!({}));
    }

    #[test]
    fn escape_commits_input_verbatim() {
        let event = ChangeEvent::input("x");
        assert_eq!(
            normalize_change(&event, true).unwrap(),
            json!({"target": {"value": "x"}})
        );
    }

    #[test]
    fn escape_commits_value_verbatim() {
        let event = ChangeEvent::Value(json!({"nested": {"deep": [1, 2]}}));
        assert_eq!(
            normalize_change(&event, true).unwrap(),
            json!({"nested": {"deep": [1, 2]}})
        );
    }

    #[test]
    fn escaped_unrepresentable_payload_is_rejected() {
        let mut grid = HashMap::new();
        grid.insert((0, 0), 1);
        let err = normalize_change(&ChangeEvent::structured(grid), true).unwrap_err();
        assert!(matches!(err, ItemError::Unrepresentable(_)));
    }

    #[test]
    fn event_value_shapes() {
        assert_eq!(ChangeEvent::checked(false).to_value(), json!({"target": {"checked": false}}));
        assert_eq!(ChangeEvent::from(json!(3)).to_value(), json!(3));
    }
}
