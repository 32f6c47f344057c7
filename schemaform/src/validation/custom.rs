//! Host-supplied validation hooks.

use serde_json::Value;

use super::{ErrorEntry, ErrorKind};
use crate::path::DataPath;

/// Validation logic beyond what the schema expresses.
///
/// Receives the form data and a collector pre-bound to the structural pass,
/// so it can add entries, drop structural ones or annotate them.
pub trait CustomValidator: Send + Sync {
    fn validate(&self, data: &Value, errors: &mut CustomErrors);
}

impl<F> CustomValidator for F
where
    F: Fn(&Value, &mut CustomErrors) + Send + Sync,
{
    fn validate(&self, data: &Value, errors: &mut CustomErrors) {
        self(data, errors)
    }
}

/// Rewrites the message of a finished entry; `None` keeps it.
pub trait ErrorTransform: Send + Sync {
    fn transform(&self, error: &ErrorEntry) -> Option<String>;
}

impl<F> ErrorTransform for F
where
    F: Fn(&ErrorEntry) -> Option<String> + Send + Sync,
{
    fn transform(&self, error: &ErrorEntry) -> Option<String> {
        self(error)
    }
}

/// Collects what a [`CustomValidator`] reports.
#[derive(Debug, Default)]
pub struct CustomErrors {
    added: Vec<ErrorEntry>,
    suppressed: Vec<(DataPath, Option<ErrorKind>)>,
    notes: Vec<(DataPath, ErrorKind, String)>,
}

impl CustomErrors {
    /// Reports a [`ErrorKind::Custom`] entry at `path`.
    pub fn add_error(&mut self, path: DataPath, message: impl Into<String>) {
        self.added
            .push(ErrorEntry::new(path, ErrorKind::Custom, message));
    }

    /// Drops structural entries at `path`, all of them when `kind` is `None`.
    pub fn suppress(&mut self, path: DataPath, kind: Option<ErrorKind>) {
        self.suppressed.push((path, kind));
    }

    /// Appends `note` to structural entries of `kind` at `path`.
    pub fn annotate(&mut self, path: DataPath, kind: ErrorKind, note: impl Into<String>) {
        self.notes.push((path, kind, note.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.suppressed.is_empty() && self.notes.is_empty()
    }

    pub(crate) fn apply(self, structural: Vec<ErrorEntry>) -> Vec<ErrorEntry> {
        let mut out: Vec<ErrorEntry> = structural
            .into_iter()
            .filter(|entry| {
                !self.suppressed.iter().any(|(path, kind)| {
                    *path == entry.path && kind.as_ref().is_none_or(|k| *k == entry.kind)
                })
            })
            .collect();
        for entry in &mut out {
            for (path, kind, note) in &self.notes {
                if *path == entry.path && *kind == entry.kind {
                    entry.message = format!("{} ({note})", entry.message);
                }
            }
        }
        out.extend(self.added);
        out
    }
}
