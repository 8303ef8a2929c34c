//! Behavior switches shared by the reader and the writer.
//!
//! A [`Settings`] value is fixed when a [`Json`](crate::Json) context is
//! created. Registry caches depend on [`MemberSelection`] and
//! `include_read_only`, so changing them means building a new context.

use serde::{Deserialize, Serialize};

use crate::error::{JsonError, JsonResult};

/// Default maximum object nesting depth for the serializer.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Which declared members take part in serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MemberSelection {
    /// Every member is included unless explicitly ignored.
    #[default]
    OptOut,
    /// Only members explicitly marked for inclusion are used.
    OptIn,
}

/// Reader and writer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Write guids as base64 of their 16 bytes instead of the hyphenated form.
    pub use_fast_guid: bool,
    /// Convert local dates to UTC on write and append `Z`.
    pub use_utc_datetime: bool,
    /// Emit and honor `$type` tags for polymorphic values.
    pub use_type_extension: bool,
    /// Write members whose value is null or the member default.
    pub serialize_null_values: bool,
    /// Include members that have a getter but no setter.
    pub include_read_only: bool,
    /// Member selection policy.
    pub member_selection: MemberSelection,
    /// Deepest object nesting the serializer accepts.
    pub max_depth: usize,
}

impl Settings {
    /// The default settings.
    pub const fn standard() -> Self {
        Self {
            use_fast_guid: true,
            use_utc_datetime: true,
            use_type_extension: false,
            serialize_null_values: true,
            include_read_only: true,
            member_selection: MemberSelection::OptOut,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Standard settings with `$type` tagging enabled.
    pub const fn polymorphic() -> Self {
        let mut settings = Self::standard();
        settings.use_type_extension = true;
        settings
    }

    /// Settings for values without a declared contract: every readable
    /// member is written and no type tag is emitted.
    pub const fn anonymous() -> Self {
        let mut settings = Self::standard();
        settings.include_read_only = true;
        settings.member_selection = MemberSelection::OptOut;
        settings.use_type_extension = false;
        settings
    }

    /// Load settings from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(text: &str) -> JsonResult<Self> {
        serde_json::from_str(text).map_err(|e| JsonError::InvalidFormat {
            text: e.to_string(),
            target: "Settings",
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::standard()
    }
}
