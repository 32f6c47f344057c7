//! Validation adapter.
//!
//! Structural validation is delegated to a [`SchemaValidator`] (by default
//! [`JsonSchemaValidator`], backed by the `jsonschema` crate). Its entries
//! then pass through an optional [`CustomValidator`] and an optional
//! [`ErrorTransform`], in that order.

use std::{collections::BTreeMap, fmt, sync::Arc};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::DataPath;

mod custom;
mod structural;

pub use custom::{CustomErrors, CustomValidator, ErrorTransform};
pub use structural::JsonSchemaValidator;

/// Keyword-level tag of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Required,
    Type,
    Enum,
    Const,
    Format,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MultipleOf,
    MinLength,
    MaxLength,
    Pattern,
    MinItems,
    MaxItems,
    UniqueItems,
    MinProperties,
    MaxProperties,
    AdditionalProperties,
    AdditionalItems,
    OneOf,
    AnyOf,
    Not,
    /// Raised by a custom validator.
    Custom,
    /// The schema itself could not be compiled.
    InvalidSchema,
    Other,
}

impl ErrorKind {
    /// Maps a JSON Schema keyword to its tag.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "required" => ErrorKind::Required,
            "type" => ErrorKind::Type,
            "enum" => ErrorKind::Enum,
            "const" => ErrorKind::Const,
            "format" => ErrorKind::Format,
            "minimum" => ErrorKind::Minimum,
            "maximum" => ErrorKind::Maximum,
            "exclusiveMinimum" => ErrorKind::ExclusiveMinimum,
            "exclusiveMaximum" => ErrorKind::ExclusiveMaximum,
            "multipleOf" => ErrorKind::MultipleOf,
            "minLength" => ErrorKind::MinLength,
            "maxLength" => ErrorKind::MaxLength,
            "pattern" => ErrorKind::Pattern,
            "minItems" => ErrorKind::MinItems,
            "maxItems" => ErrorKind::MaxItems,
            "uniqueItems" => ErrorKind::UniqueItems,
            "minProperties" => ErrorKind::MinProperties,
            "maxProperties" => ErrorKind::MaxProperties,
            "additionalProperties" => ErrorKind::AdditionalProperties,
            "additionalItems" => ErrorKind::AdditionalItems,
            "oneOf" => ErrorKind::OneOf,
            "anyOf" => ErrorKind::AnyOf,
            "not" => ErrorKind::Not,
            _ => ErrorKind::Other,
        }
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub path: DataPath,
    pub message: String,
    pub kind: ErrorKind,
}

impl ErrorEntry {
    pub fn new(path: DataPath, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The outcome of one validation pass.
///
/// Built once per pass and replaced wholesale by the next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet(Vec<ErrorEntry>);

impl ErrorSet {
    pub fn new(entries: Vec<ErrorEntry>) -> Self {
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.0.iter()
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.0
    }

    /// Entries reported exactly at `path`.
    pub fn at<'a>(&'a self, path: &'a DataPath) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
        self.0.iter().filter(move |e| &e.path == path)
    }

    /// Entries grouped per path.
    pub fn by_path(&self) -> BTreeMap<DataPath, Vec<&ErrorEntry>> {
        let mut map: BTreeMap<DataPath, Vec<&ErrorEntry>> = BTreeMap::new();
        for entry in &self.0 {
            map.entry(entry.path.clone()).or_default().push(entry);
        }
        map
    }
}

impl IntoIterator for ErrorSet {
    type Item = ErrorEntry;
    type IntoIter = std::vec::IntoIter<ErrorEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A validation result that is either available now or still running.
pub enum Validation<T> {
    Ready(T),
    Deferred(BoxFuture<'static, T>),
}

impl<T: fmt::Debug> fmt::Debug for Validation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Validation::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Structural (schema) validation backend.
pub trait SchemaValidator: Send + Sync {
    /// Validates `data` against `schema`.
    fn validate(&self, schema: &Value, data: &Value) -> Validation<Vec<ErrorEntry>>;
}

/// Runs structural validation, custom validation and error transforms.
#[derive(Clone)]
pub struct ValidationAdapter {
    validator: Arc<dyn SchemaValidator>,
    custom: Option<Arc<dyn CustomValidator>>,
    transform: Option<Arc<dyn ErrorTransform>>,
}

impl Default for ValidationAdapter {
    fn default() -> Self {
        Self::new(Arc::new(JsonSchemaValidator::default()))
    }
}

impl fmt::Debug for ValidationAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationAdapter")
            .field("custom", &self.custom.is_some())
            .field("transform", &self.transform.is_some())
            .finish_non_exhaustive()
    }
}

impl ValidationAdapter {
    pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            validator,
            custom: None,
            transform: None,
        }
    }

    pub fn set_validator(&mut self, validator: Arc<dyn SchemaValidator>) {
        self.validator = validator;
    }

    pub fn set_custom(&mut self, custom: Arc<dyn CustomValidator>) {
        self.custom = Some(custom);
    }

    pub fn set_transform(&mut self, transform: Arc<dyn ErrorTransform>) {
        self.transform = Some(transform);
    }

    /// Validates `data` against the root `schema`.
    ///
    /// The structural pass sees [`validation_view`] of the data; custom
    /// validators see the data as edited.
    pub fn validate(&self, schema: &Value, data: &Value) -> Validation<ErrorSet> {
        let view = validation_view(data);
        match self.validator.validate(schema, &view) {
            Validation::Ready(structural) => Validation::Ready(self.finish(data, structural)),
            Validation::Deferred(pending) => {
                let this = self.clone();
                let data = data.clone();
                Validation::Deferred(Box::pin(async move {
                    let structural = pending.await;
                    this.finish(&data, structural)
                }))
            }
        }
    }

    fn finish(&self, data: &Value, structural: Vec<ErrorEntry>) -> ErrorSet {
        let mut entries = match &self.custom {
            Some(custom) => {
                let mut collector = CustomErrors::default();
                custom.validate(data, &mut collector);
                collector.apply(structural)
            }
            None => structural,
        };
        if let Some(transform) = &self.transform {
            for entry in &mut entries {
                if let Some(message) = transform.transform(entry) {
                    entry.message = message;
                }
            }
        }
        ErrorSet::new(entries)
    }
}

/// The data as structural validation should see it.
///
/// An empty string inside an object counts as "not filled in", so the
/// property is dropped; an empty required text field then fails `required`.
pub fn validation_view(data: &Value) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| v.as_str() != Some(""))
                .map(|(k, v)| (k.clone(), validation_view(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(validation_view).collect()),
        other => other.clone(),
    }
}
