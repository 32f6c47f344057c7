//! Form-wide configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings shared by every field of a form.
///
/// Every field is optional when deserialising, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct FormConfig {
    /// Validate after every accepted edit, not only on submit.
    pub live_validate: bool,
    /// Id of the root field; child ids extend it.
    pub id_prefix: String,
    /// Joins id segments, e.g. `root_list_0`.
    pub id_separator: String,
    /// Reject data longer than a closed tuple instead of keeping the extra items.
    pub strict_tuples: bool,
    /// Disable every field.
    pub disabled: bool,
    /// Make every field read-only.
    pub readonly: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            live_validate: false,
            id_prefix: "root".to_string(),
            id_separator: "_".to_string(),
            strict_tuples: false,
            disabled: false,
            readonly: false,
        }
    }
}

impl FormConfig {
    /// Id for `segment` under the field with id `parent`.
    pub fn child_id(&self, parent: &str, segment: impl std::fmt::Display) -> String {
        format!("{parent}{}{segment}", self.id_separator)
    }
}
