//! # schemaform
//!
//! A JSON Schema driven form engine. Given a schema, optional UI hints and
//! optional initial data, it keeps a valid-by-construction data snapshot,
//! resolves which renderer draws each node, tracks stable identities for
//! array items, and validates on change or submit.
//!
//! Drawing is left to the host: the engine produces a renderer-neutral
//! [`RenderNode`] tree and accepts [`FieldEdit`]s back.
//!
//! ## Quick Start
//!
//! ```rust
//! use schemaform::{FormController, FormProps, Submission};
//! use serde_json::json;
//!
//! let mut form = FormController::default();
//! form.receive(FormProps::new(json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string"}},
//!     "required": ["name"]
//! })));
//! assert_eq!(**form.data(), json!({"name": ""}));
//!
//! form.change(&schemaform::path!["name"], json!("Ada")).unwrap();
//! assert!(matches!(form.submit(), Submission::Accepted(_)));
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - `$ref` / `allOf` resolution and `oneOf` / `anyOf` branch selection
//! - [`defaults`] - default data computation
//! - [`registry`] - renderer selection, built-in renderers and templates
//! - [`array`] - array item identities and capabilities
//! - [`controller`] - the form state machine
//! - [`validation`] - structural and custom validation

#[macro_use]
extern crate log;

pub mod array;
pub mod coerce;
pub mod config;
pub mod controller;
pub mod defaults;
pub mod error;
pub mod path;
pub mod plan;
pub mod registry;
pub mod render;
pub mod schema;
pub mod ui;
pub mod validation;

pub use array::{ArrayEntries, ArrayEntry, ItemCapabilities, ItemId};
pub use config::FormConfig;
pub use controller::{
    EventCallback, FormController, FormEvent, FormProps, FormStatus, PendingValidation, Submission,
    ValidationTicket,
};
pub use defaults::{DefaultComputer, compute_default};
pub use error::{CapabilityError, ConfigurationError, SchemaError};
pub use path::{DataPath, PathSegment};
pub use plan::{Diagnostic, FieldEdit, FieldPlan, FormPlan, Severity};
pub use registry::{FieldProps, FieldRegistry, Renderer, RendererKind};
pub use render::{RenderNode, render};
pub use schema::SchemaResolver;
pub use ui::UiHints;
pub use validation::{
    CustomErrors, ErrorEntry, ErrorKind, ErrorSet, SchemaValidator, Validation, ValidationAdapter,
};
