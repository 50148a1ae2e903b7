#![forbid(unsafe_code)]

//! Form-level options: inherited layout props and feature flags.
//!
//! Options are plain data and can be loaded from JSON, or from TOML with the
//! `form-config` feature. Missing keys take their defaults.
//!
//! ```
//! use noform_core::FormOptions;
//!
//! let opts = FormOptions::from_json_str(r#"{"inset": true, "layout": {"label": 4, "control": 20}}"#)
//!     .unwrap();
//! assert!(opts.inset);
//! assert!(opts.default_min_width);
//! assert_eq!(opts.layout.unwrap().control, Some(20));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Grid spans for the label and control columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub label: Option<u8>,
    pub control: Option<u8>,
}

impl Layout {
    #[must_use]
    pub const fn new(label: u8, control: u8) -> Self {
        Self {
            label: Some(label),
            control: Some(control),
        }
    }
}

/// Options shared by every item of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub inline: bool,
    pub inset: bool,
    pub full: bool,
    pub colon: bool,
    pub layout: Option<Layout>,
    pub label_width: Option<String>,
    pub default_min_width: bool,
    /// Fold a nested component's own configuration props into its item's
    /// initial props.
    pub enable_receive_props: bool,
    /// When this form is rendered inside another form's item, skip state
    /// mirroring into the parent.
    pub disabled_sync_child_form: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            inline: false,
            inset: false,
            full: false,
            colon: true,
            layout: None,
            label_width: None,
            default_min_width: true,
            enable_receive_props: false,
            disabled_sync_child_form: false,
        }
    }
}

impl FormOptions {
    /// Parse options from a JSON document.
    pub fn from_json_str(src: &str) -> Result<Self, FormError> {
        serde_json::from_str(src).map_err(|e| FormError::Config(e.to_string()))
    }

    /// Parse options from a TOML document.
    #[cfg(feature = "form-config")]
    pub fn from_toml_str(src: &str) -> Result<Self, FormError> {
        toml::from_str(src).map_err(|e| FormError::Config(e.to_string()))
    }
}
