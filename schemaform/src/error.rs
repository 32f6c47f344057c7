//! Error types for schema resolution, array operations and UI hints.
//!
//! Validation failures are not errors in this sense: they are data
//! ([`crate::validation::ErrorEntry`]) and never block editing.

use serde::Serialize;
use thiserror::Error;

use crate::path::DataPath;

/// A malformed or unsatisfiable schema.
///
/// Fatal to the subtree it was raised for; the subtree renders as the
/// unsupported placeholder while its siblings are unaffected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A `$ref` points at nothing inside the root schema.
    #[error("unresolvable reference `{reference}`")]
    UnresolvableRef { reference: String },
    /// A `$ref` chain loops back onto itself without ever reaching a schema.
    #[error("cyclic reference `{reference}`")]
    CyclicRef { reference: String },
    /// `allOf` members that can never hold at the same time.
    #[error("unsatisfiable `allOf`: conflicting `{keyword}`")]
    Unsatisfiable { keyword: String },
    /// A strict default pass found more items than a closed tuple allows.
    #[error("tuple holds at most {expected} items, found {actual}")]
    TupleLengthMismatch { expected: usize, actual: usize },
    /// The schema node is not shaped like a schema.
    #[error("malformed schema at `{keyword}`: {reason}")]
    Malformed { keyword: String, reason: String },
}

impl SchemaError {
    pub(crate) fn malformed(keyword: &str, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            keyword: keyword.to_string(),
            reason: reason.into(),
        }
    }
}

/// An array operation the schema (or UI hints) does not permit.
///
/// Reported to the host; the array is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CapabilityError {
    /// Closed tuple: no items can be added, and tuple positions cannot be removed.
    #[error("array has a fixed length of {len}")]
    FixedLength { len: usize },
    /// Removing would drop below `minItems`.
    #[error("array needs at least {min} items")]
    BelowMinimum { min: usize },
    /// Adding would exceed `maxItems`.
    #[error("array holds at most {max} items")]
    AboveMaximum { max: usize },
    /// Reordering is forbidden by the schema or the UI hints.
    #[error("array items cannot be reordered")]
    NotOrderable,
    /// `ui:options.addable` is false.
    #[error("array items cannot be added")]
    NotAddable,
    /// `ui:options.removable` is false.
    #[error("array items cannot be removed")]
    NotRemovable,
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    /// The targeted path does not hold an array.
    #[error("no array at `{path}`")]
    NotAnArray { path: DataPath },
}

/// Malformed UI hints.
///
/// Surfaced once at resolution time; the affected node falls back to the
/// schema-declared behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("`ui:order` must be a list of property names")]
    InvalidOrder,
    #[error("`ui:order` lists `{name}` more than once")]
    DuplicateOrderEntry { name: String },
    #[error("`ui:order` contains extraneous properties {names:?}")]
    ExtraneousOrderEntry { names: Vec<String> },
    #[error("`ui:order` does not contain properties {names:?}")]
    MissingOrderEntries { names: Vec<String> },
    #[error("`ui:order` contains more than one wildcard")]
    MultipleWildcards,
}
