use std::{
    fmt,
    sync::{Arc, Mutex},
};

use jsonschema::{Draft, Validator, error::ValidationErrorKind};
use serde_json::Value;

use super::{ErrorEntry, ErrorKind, SchemaValidator, Validation};
use crate::path::DataPath;

/// Synchronous validator backed by the `jsonschema` crate.
///
/// Schemas without `$schema` are compiled as draft 7. Compiled schemas are
/// kept in a small most-recently-used cache: a form validates against the
/// same root on every pass, and branch scoring against the same few
/// combinator branches.
pub struct JsonSchemaValidator {
    capacity: usize,
    cache: Mutex<Vec<(Value, Arc<Validator>)>>,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// A validator keeping up to `capacity` compiled schemas.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            cache: Mutex::new(Vec::new()),
        }
    }

    /// Validates `data` and returns every failure.
    ///
    /// A schema that does not compile yields a single
    /// [`ErrorKind::InvalidSchema`] entry at the root.
    pub fn collect(&self, schema: &Value, data: &Value) -> Vec<ErrorEntry> {
        let validator = match self.compiled(schema) {
            Ok(validator) => validator,
            Err(message) => {
                warn!("schema does not compile: {message}");
                return vec![ErrorEntry::new(
                    DataPath::root(),
                    ErrorKind::InvalidSchema,
                    message,
                )];
            }
        };
        validator
            .iter_errors(data)
            .map(|e| to_entry(&e, data))
            .collect()
    }

    fn compiled(&self, schema: &Value) -> Result<Arc<Validator>, String> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(pos) = cache.iter().position(|(cached, _)| cached == schema) {
                let hit = cache.remove(pos);
                let validator = hit.1.clone();
                cache.insert(0, hit);
                return Ok(validator);
            }
        }
        let built = if schema.get("$schema").is_some() {
            jsonschema::validator_for(schema)
        } else {
            jsonschema::options().with_draft(Draft::Draft7).build(schema)
        };
        let validator = Arc::new(built.map_err(|e| e.to_string())?);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(0, (schema.clone(), validator.clone()));
            cache.truncate(self.capacity);
        }
        Ok(validator)
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, data: &Value) -> Validation<Vec<ErrorEntry>> {
        Validation::Ready(self.collect(schema, data))
    }
}

fn to_entry(error: &jsonschema::ValidationError<'_>, data: &Value) -> ErrorEntry {
    let mut path = DataPath::from_pointer_in(&error.instance_path.to_string(), data);
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().unwrap_or_default();
    let kind = ErrorKind::from_keyword(keyword);
    // Missing properties are reported on the property, not its parent.
    if let ValidationErrorKind::Required { property } = &error.kind {
        if let Some(name) = property.as_str() {
            path.push(name);
        }
    }
    ErrorEntry {
        path,
        message: error.to_string(),
        kind,
    }
}
