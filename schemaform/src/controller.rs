//! Form state controller.
//!
//! [`FormController`] owns the data snapshot, the latest [`ErrorSet`] and
//! the array identities of one form. Every transition is synchronous;
//! deferred validation hands a [`PendingValidation`] back to the host,
//! which drives it and reports through
//! [`FormController::complete_validation`].

use std::{collections::HashSet, fmt, sync::Arc};

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use crate::{
    array::{ArrayConstraints, ArrayEntries, ArrayStore},
    coerce::coerce_edit,
    config::FormConfig,
    defaults::DefaultComputer,
    error::{CapabilityError, SchemaError},
    path::{DataPath, PathSegment},
    plan::{Diagnostic, FieldEdit, FormPlan, PlanBuilder, Severity},
    registry::FieldRegistry,
    render::{self, RenderNode},
    schema::{SchemaResolver, SchemaType, items_layout, schema_types},
    ui::UiHints,
    validation::{
        CustomValidator, ErrorSet, ErrorTransform, SchemaValidator, Validation, ValidationAdapter,
    },
};

/// What the host hands to [`FormController::receive`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormProps {
    pub schema: Value,
    pub ui_schema: UiHints,
    /// Initial data; defaults fill in whatever is missing.
    pub form_data: Option<Value>,
}

impl FormProps {
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            ui_schema: UiHints::default(),
            form_data: None,
        }
    }

    pub fn with_ui(mut self, ui_schema: impl Into<UiHints>) -> Self {
        self.ui_schema = ui_schema.into();
        self
    }

    pub fn with_data(mut self, form_data: Value) -> Self {
        self.form_data = Some(form_data);
        self
    }

    /// Props for a form editing a `T`, with the schema generated by schemars.
    pub fn for_type<T: JsonSchema>() -> Self {
        Self::new(schemars::schema_for!(T).to_value())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormStatus {
    Uninitialized,
    Ready,
    Editing,
    Validating,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// Data changed. `errors` is the latest completed validation.
    Change {
        form_data: Arc<Value>,
        errors: ErrorSet,
    },
    /// Submit passed validation.
    Submit { form_data: Arc<Value> },
    Error(ErrorSet),
    Warning(Diagnostic),
    Blur { id: String, value: Value },
    Focus { id: String, value: Value },
}

pub type EventCallback = Arc<dyn Fn(&FormEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPurpose {
    Live,
    Submit,
}

/// Identifies one validation request. Only the most recent ticket is
/// honoured by [`FormController::complete_validation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationTicket {
    pub generation: u64,
    pub purpose: ValidationPurpose,
}

/// A validation still running. Await `future`, then pass its output to
/// [`FormController::complete_validation`] with `ticket`.
pub struct PendingValidation {
    pub ticket: ValidationTicket,
    pub future: BoxFuture<'static, ErrorSet>,
}

impl fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingValidation")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum Submission {
    Accepted(Arc<Value>),
    Rejected(ErrorSet),
    Pending(PendingValidation),
}

pub struct FormController {
    config: FormConfig,
    registry: FieldRegistry,
    adapter: ValidationAdapter,
    listeners: Vec<EventCallback>,
    props: FormProps,
    data: Arc<Value>,
    errors: ErrorSet,
    status: FormStatus,
    arrays: ArrayStore,
    generation: u64,
    in_flight: Option<ValidationTicket>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new(FormConfig::default())
    }
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl FormController {
    pub fn new(config: FormConfig) -> Self {
        Self {
            config,
            registry: FieldRegistry::new(),
            adapter: ValidationAdapter::default(),
            listeners: Vec::new(),
            props: FormProps::new(Value::Bool(true)),
            data: Arc::new(Value::Null),
            errors: ErrorSet::default(),
            status: FormStatus::Uninitialized,
            arrays: ArrayStore::default(),
            generation: 0,
            in_flight: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: FieldRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the structural validator.
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.adapter.set_validator(validator);
        self
    }

    pub fn with_custom_validator(mut self, custom: impl CustomValidator + 'static) -> Self {
        self.adapter.set_custom(Arc::new(custom));
        self
    }

    pub fn with_transform(mut self, transform: impl ErrorTransform + 'static) -> Self {
        self.adapter.set_transform(Arc::new(transform));
        self
    }

    pub fn subscribe(&mut self, callback: impl Fn(&FormEvent) + Send + Sync + 'static) {
        self.listeners.push(Arc::new(callback));
    }

    pub fn data(&self) -> &Arc<Value> {
        &self.data
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    /// Problems found by the last [`FormController::receive`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn props(&self) -> &FormProps {
        &self.props
    }

    /// Entries of the array at `path` as of the last plan or array edit.
    pub fn array_entries(&self, path: &DataPath) -> Option<&ArrayEntries> {
        self.arrays.get(path)
    }

    fn emit(&self, event: FormEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    fn computer(&self) -> DefaultComputer<'_> {
        DefaultComputer::new(SchemaResolver::new(&self.props.schema)).strict(self.config.strict_tuples)
    }

    fn report(&self, path: &DataPath, err: &SchemaError) {
        warn!("{path}: {err}");
        self.emit(FormEvent::Warning(Diagnostic {
            path: path.clone(),
            severity: Severity::Warning,
            message: err.to_string(),
        }));
    }

    /// Starts over with new props.
    ///
    /// Array identities and pending validations are dropped, defaults are
    /// computed for the whole data, and each distinct diagnostic of the new
    /// schema is emitted once.
    pub fn receive(&mut self, props: FormProps) {
        self.generation += 1;
        self.in_flight = None;
        self.arrays.clear();
        self.errors = ErrorSet::default();
        self.diagnostics.clear();
        self.props = props;

        let mut diagnostics = Vec::new();
        let data = match self.computer().compute(&self.props.schema, self.props.form_data.as_ref()) {
            Ok(data) => data,
            Err(err) => {
                diagnostics.push(Diagnostic {
                    path: DataPath::root(),
                    severity: Severity::Error,
                    message: err.to_string(),
                });
                self.props.form_data.clone().unwrap_or(Value::Null)
            }
        };
        self.data = Arc::new(data);

        diagnostics.extend(self.build_plan().diagnostics);
        let mut seen = HashSet::new();
        for diagnostic in diagnostics {
            if seen.insert(diagnostic.clone()) {
                self.emit(FormEvent::Warning(diagnostic.clone()));
                self.diagnostics.push(diagnostic);
            }
        }
        debug!("form received, {} diagnostics", self.diagnostics.len());
        self.status = FormStatus::Ready;
    }

    fn build_plan(&mut self) -> FormPlan {
        PlanBuilder::new(&self.props.schema, &self.registry, &self.config, &mut self.arrays)
            .errors(&self.errors)
            .build(&self.props.ui_schema, &self.data)
    }

    /// The field plan for the current snapshot.
    pub fn plan(&mut self) -> FormPlan {
        self.build_plan()
    }

    /// The render tree for the current snapshot.
    pub fn render(&mut self) -> RenderNode {
        let plan = self.build_plan();
        render::render(&plan.root, &self.registry)
    }

    /// Proposes `raw` as the value at `path`.
    ///
    /// The field's schema is looked up with `raw` in place, so combinator
    /// branches follow the edit. The value is coerced to that schema and
    /// its subtree repaired with defaults. Clearing an optional property
    /// removes it.
    ///
    /// An index may address an existing item or append one; anything
    /// further is refused with [`CapabilityError::IndexOutOfRange`].
    pub fn change(
        &mut self,
        path: &DataPath,
        raw: Value,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        if let Some((index, len)) = path.out_of_range(&self.data) {
            let err = CapabilityError::IndexOutOfRange { index, len };
            warn!("{path}: {err}");
            return Err(err);
        }
        let resolver = SchemaResolver::new(&self.props.schema);
        let proposed = path.set(&self.data, raw.clone());
        let mut problem = None;
        let next = match resolver.retrieve_at(path, &proposed) {
            Ok(schema) => {
                let coerced = coerce_edit(&schema, raw);
                let clears_key = coerced.is_null()
                    && matches!(path.last(), Some(PathSegment::Key(_)))
                    && !schema_types(&schema).contains(SchemaType::Null);
                if clears_key {
                    path.remove(&self.data)
                } else {
                    match self.computer().compute(&schema, Some(&coerced)) {
                        Ok(repaired) => path.set(&self.data, repaired),
                        Err(err) => {
                            problem = Some(err);
                            path.set(&self.data, coerced)
                        }
                    }
                }
            }
            Err(err) => {
                problem = Some(err);
                proposed
            }
        };
        if let Some(err) = problem {
            self.report(path, &err);
        }
        self.data = Arc::new(next);
        self.arrays.prune(&self.data);
        Ok(self.finish_edit())
    }

    /// Applies an edit proposed by a renderer or template.
    pub fn apply(&mut self, edit: FieldEdit) -> Result<Option<PendingValidation>, CapabilityError> {
        match edit {
            FieldEdit::Change { path, value } => self.change(&path, value),
            FieldEdit::Add { path, after } => self.array_add(&path, after),
            FieldEdit::Remove { path, index } => self.array_remove(&path, index),
            FieldEdit::MoveUp { path, index } => self.array_move_up(&path, index),
            FieldEdit::MoveDown { path, index } => self.array_move_down(&path, index),
            FieldEdit::Replace { path, index, value } => self.array_replace(&path, index, value),
        }
    }

    fn array_state(
        &mut self,
        path: &DataPath,
    ) -> Result<(Value, ArrayConstraints, ArrayEntries), CapabilityError> {
        let values = match path.get(&self.data) {
            Some(Value::Array(values)) => values.clone(),
            _ => {
                let err = CapabilityError::NotAnArray { path: path.clone() };
                warn!("{err}");
                return Err(err);
            }
        };
        let schema = SchemaResolver::new(&self.props.schema)
            .retrieve_at(path, &self.data)
            .unwrap_or_else(|err| {
                warn!("{path}: {err}");
                Value::Object(Default::default())
            });
        let constraints = ArrayConstraints::from_schema(&schema, &self.props.ui_schema.at(path));
        let entries = self.arrays.sync(path, &values).clone();
        Ok((schema, constraints, entries))
    }

    /// Writes `next` back or reports why the operation was refused.
    fn settle(
        &mut self,
        path: &DataPath,
        before: &ArrayEntries,
        next: Result<ArrayEntries, CapabilityError>,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let after = next.inspect_err(|err| warn!("{path}: {err}"))?;
        self.arrays
            .remap(path, |old| before.get(old).and_then(|e| after.position(e.id)));
        self.data = Arc::new(path.set(&self.data, after.to_value()));
        self.arrays.insert(path.clone(), after);
        Ok(self.finish_edit())
    }

    /// Adds a defaulted item after `after`, or at the end.
    pub fn array_add(
        &mut self,
        path: &DataPath,
        after: Option<usize>,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let (schema, constraints, entries) = self.array_state(path)?;
        let at = entries.insertion_index(&constraints, after);
        let value = self
            .computer()
            .compute(&items_layout(&schema).schema_for(at), None)
            .unwrap_or_else(|err| {
                warn!("{}: {err}", path.join(at));
                Value::Null
            });
        let next = entries.add(&constraints, after, value, self.arrays.ids());
        self.settle(path, &entries, next)
    }

    pub fn array_remove(
        &mut self,
        path: &DataPath,
        index: usize,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let (_, constraints, entries) = self.array_state(path)?;
        let next = entries.remove(&constraints, index);
        self.settle(path, &entries, next)
    }

    pub fn array_move_up(
        &mut self,
        path: &DataPath,
        index: usize,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let (_, constraints, entries) = self.array_state(path)?;
        let next = entries.move_up(&constraints, index);
        self.settle(path, &entries, next)
    }

    pub fn array_move_down(
        &mut self,
        path: &DataPath,
        index: usize,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let (_, constraints, entries) = self.array_state(path)?;
        let next = entries.move_down(&constraints, index);
        self.settle(path, &entries, next)
    }

    /// Replaces the value of one item, keeping its identity.
    pub fn array_replace(
        &mut self,
        path: &DataPath,
        index: usize,
        value: Value,
    ) -> Result<Option<PendingValidation>, CapabilityError> {
        let (_, _, entries) = self.array_state(path)?;
        let next = entries.replace(index, value);
        self.settle(path, &entries, next)
    }

    fn issue(&mut self, purpose: ValidationPurpose) -> ValidationTicket {
        let ticket = ValidationTicket {
            generation: self.generation,
            purpose,
        };
        self.in_flight = Some(ticket);
        ticket
    }

    /// Common tail of every accepted edit. An edit supersedes whatever
    /// validation is in flight, submit included.
    fn finish_edit(&mut self) -> Option<PendingValidation> {
        self.generation += 1;
        self.in_flight = None;
        self.status = FormStatus::Editing;
        if !self.config.live_validate {
            self.emit(FormEvent::Change {
                form_data: self.data.clone(),
                errors: self.errors.clone(),
            });
            return None;
        }

        self.status = FormStatus::Validating;
        match self.adapter.validate(&self.props.schema, &self.data) {
            Validation::Ready(errors) => {
                self.conclude_live(errors);
                None
            }
            Validation::Deferred(future) => {
                let ticket = self.issue(ValidationPurpose::Live);
                self.emit(FormEvent::Change {
                    form_data: self.data.clone(),
                    errors: self.errors.clone(),
                });
                Some(PendingValidation { ticket, future })
            }
        }
    }

    fn conclude_live(&mut self, errors: ErrorSet) {
        self.errors = errors;
        self.status = FormStatus::Ready;
        self.emit(FormEvent::Change {
            form_data: self.data.clone(),
            errors: self.errors.clone(),
        });
        if !self.errors.is_empty() {
            self.emit(FormEvent::Error(self.errors.clone()));
        }
    }

    fn conclude_submit(&mut self, errors: ErrorSet) -> Submission {
        self.errors = errors;
        if self.errors.is_empty() {
            self.status = FormStatus::Ready;
            self.emit(FormEvent::Submit {
                form_data: self.data.clone(),
            });
            Submission::Accepted(self.data.clone())
        } else {
            self.status = FormStatus::Error;
            self.emit(FormEvent::Error(self.errors.clone()));
            Submission::Rejected(self.errors.clone())
        }
    }

    /// Validates the current data and submits it when it is valid.
    pub fn submit(&mut self) -> Submission {
        self.generation += 1;
        self.in_flight = None;
        self.status = FormStatus::Validating;
        match self.adapter.validate(&self.props.schema, &self.data) {
            Validation::Ready(errors) => self.conclude_submit(errors),
            Validation::Deferred(future) => {
                let ticket = self.issue(ValidationPurpose::Submit);
                Submission::Pending(PendingValidation { ticket, future })
            }
        }
    }

    /// Applies the outcome of a deferred validation.
    ///
    /// Returns `false`, changing nothing, when a newer edit or request has
    /// superseded `ticket`.
    pub fn complete_validation(&mut self, ticket: ValidationTicket, errors: ErrorSet) -> bool {
        if self.in_flight != Some(ticket) {
            debug!("dropping superseded validation result {ticket:?}");
            return false;
        }
        self.in_flight = None;
        match ticket.purpose {
            ValidationPurpose::Live => self.conclude_live(errors),
            ValidationPurpose::Submit => {
                self.conclude_submit(errors);
            }
        }
        true
    }

    pub fn blur(&self, id: &str, value: Value) {
        self.emit(FormEvent::Blur {
            id: id.to_string(),
            value,
        });
    }

    pub fn focus(&self, id: &str, value: Value) {
        self.emit(FormEvent::Focus {
            id: id.to_string(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use crate::validation::{ErrorEntry, ErrorKind};
    use serde_json::json;
    use std::sync::Mutex;

    fn recorded(controller: &mut FormController) -> Arc<Mutex<Vec<FormEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        controller.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[test]
    fn test_receive_fills_defaults() {
        let mut controller = FormController::default();
        assert_eq!(controller.status(), FormStatus::Uninitialized);
        controller.receive(
            FormProps::new(json!({
                "type": "object",
                "properties": {"name": {"type": "string"}, "n": {"type": "integer", "default": 3}}
            }))
            .with_data(json!({"name": "Ada"})),
        );
        assert_eq!(controller.status(), FormStatus::Ready);
        assert_eq!(**controller.data(), json!({"name": "Ada", "n": 3}));
    }

    #[test]
    fn test_change_coerces_and_emits() {
        let mut controller = FormController::default();
        let events = recorded(&mut controller);
        controller.receive(FormProps::new(json!({
            "type": "object",
            "properties": {"n": {"type": "integer"}}
        })));
        let before = controller.data().clone();
        assert!(controller.change(&path!["n"], json!("42")).unwrap().is_none());
        assert_eq!(controller.data()["n"], json!(42));
        assert!(!Arc::ptr_eq(&before, controller.data()), "a fresh snapshot per edit");
        assert_eq!(*before, json!({"n": 0}), "old snapshots are untouched");
        assert_eq!(controller.status(), FormStatus::Editing);
        let events = events.lock().unwrap();
        assert!(matches!(events.last(), Some(FormEvent::Change { .. })));
    }

    #[test]
    fn test_clearing_optional_number_removes_key() {
        let mut controller = FormController::default();
        controller.receive(
            FormProps::new(json!({"type": "object", "properties": {"n": {"type": "number"}}}))
                .with_data(json!({"n": 1.5})),
        );
        controller.change(&path!["n"], json!("")).unwrap();
        assert_eq!(**controller.data(), json!({}));
    }

    #[test]
    fn test_diagnostics_emitted_once_per_receive() {
        let mut controller = FormController::default();
        let events = recorded(&mut controller);
        let props = FormProps::new(json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}}
        }))
        .with_ui(json!({"ui:order": ["a"]}));
        controller.receive(props.clone());
        controller.plan();
        controller.render();
        let warnings = |events: &[FormEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, FormEvent::Warning(_)))
                .count()
        };
        assert_eq!(warnings(&events.lock().unwrap()), 1);
        assert_eq!(controller.diagnostics().len(), 1);
        controller.receive(props);
        assert_eq!(warnings(&events.lock().unwrap()), 2, "again after a reset");
    }

    #[test]
    fn test_array_ops_keep_identity() {
        let mut controller = FormController::default();
        controller.receive(
            FormProps::new(json!({
                "type": "object",
                "properties": {"list": {"type": "array", "items": {"type": "string", "default": "new"}}}
            }))
            .with_data(json!({"list": ["a", "b"]})),
        );
        let list = path!["list"];
        let ids = controller.array_entries(&list).unwrap().ids();

        controller.array_add(&list, Some(0)).unwrap();
        assert_eq!(controller.data()["list"], json!(["a", "new", "b"]));
        let after_add = controller.array_entries(&list).unwrap().ids();
        assert_eq!(after_add[0], ids[0]);
        assert_eq!(after_add[2], ids[1]);

        controller.array_move_up(&list, 2).unwrap();
        assert_eq!(controller.data()["list"], json!(["a", "b", "new"]));
        assert_eq!(controller.array_entries(&list).unwrap().ids()[1], ids[1]);

        controller.array_replace(&list, 0, json!("A")).unwrap();
        assert_eq!(controller.array_entries(&list).unwrap().ids()[0], ids[0]);
    }

    #[test]
    fn test_rejected_array_op_leaves_state() {
        let mut controller = FormController::default();
        controller.receive(
            FormProps::new(json!({"type": "array", "items": {"type": "string"}, "minItems": 1}))
                .with_data(json!(["only"])),
        );
        let before = controller.data().clone();
        assert_eq!(
            controller.array_remove(&DataPath::root(), 0).unwrap_err(),
            CapabilityError::BelowMinimum { min: 1 }
        );
        assert!(Arc::ptr_eq(&before, controller.data()));
        assert_eq!(controller.status(), FormStatus::Ready);
        assert!(matches!(
            controller.array_add(&path!["nope"], None),
            Err(CapabilityError::NotAnArray { .. })
        ));
    }

    #[test]
    fn test_nested_array_state_follows_moves() {
        let mut controller = FormController::default();
        controller.receive(
            FormProps::new(json!({
                "type": "array",
                "items": {"type": "array", "items": {"type": "integer"}}
            }))
            .with_data(json!([[1], [2, 3]])),
        );
        let inner = controller.array_entries(&path![1]).unwrap().ids();
        controller.array_move_up(&DataPath::root(), 1).unwrap();
        assert_eq!(controller.array_entries(&path![0]).unwrap().ids(), inner);
    }

    #[test]
    fn test_apply_dispatches_edits() {
        let mut controller = FormController::default();
        controller.receive(FormProps::new(json!({"type": "array", "items": {"type": "boolean"}})));
        controller
            .apply(FieldEdit::Add {
                path: DataPath::root(),
                after: None,
            })
            .unwrap();
        controller
            .apply(FieldEdit::Change {
                path: path![0],
                value: json!("true"),
            })
            .unwrap();
        assert_eq!(**controller.data(), json!([true]));
    }

    #[test]
    fn test_change_refuses_indices_past_the_end() {
        let mut controller = FormController::default();
        controller.receive(
            FormProps::new(json!({"type": "array", "items": {"type": "string"}}))
                .with_data(json!(["a"])),
        );
        let before = controller.data().clone();
        for index in [2, 1_000_000_000, usize::MAX] {
            assert_eq!(
                controller.change(&path![index], json!("z")).unwrap_err(),
                CapabilityError::IndexOutOfRange { index, len: 1 }
            );
        }
        assert_eq!(
            controller
                .apply(FieldEdit::Change {
                    path: path![usize::MAX],
                    value: json!("z"),
                })
                .unwrap_err(),
            CapabilityError::IndexOutOfRange {
                index: usize::MAX,
                len: 1
            }
        );
        assert!(Arc::ptr_eq(&before, controller.data()), "refused edits change nothing");
        assert_eq!(controller.status(), FormStatus::Ready);

        controller.change(&path![1], json!("b")).unwrap();
        assert_eq!(**controller.data(), json!(["a", "b"]));
    }

    /// Defers its first answer, then validates synchronously.
    struct DeferredOnce(std::sync::atomic::AtomicBool);

    impl SchemaValidator for DeferredOnce {
        fn validate(&self, _schema: &Value, _data: &Value) -> Validation<Vec<ErrorEntry>> {
            if self.0.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Validation::Ready(Vec::new());
            }
            Validation::Deferred(Box::pin(async {
                vec![ErrorEntry::new(path!["code"], ErrorKind::Custom, "stale")]
            }))
        }
    }

    #[test]
    fn test_submit_supersedes_pending_live_validation() {
        let mut controller = FormController::new(FormConfig {
            live_validate: true,
            ..FormConfig::default()
        })
        .with_validator(Arc::new(DeferredOnce(Default::default())));
        controller.receive(FormProps::new(json!({
            "type": "object",
            "properties": {"code": {"type": "string"}}
        })));
        let live = controller
            .change(&path!["code"], json!("x"))
            .unwrap()
            .expect("the first validation is deferred");
        assert!(matches!(controller.submit(), Submission::Accepted(_)));

        let stale = tokio_test::block_on(live.future);
        assert!(!controller.complete_validation(live.ticket, stale));
        assert!(controller.errors().is_empty());
        assert_eq!(controller.status(), FormStatus::Ready);
    }

    #[test]
    fn test_blur_and_focus_events() {
        let mut controller = FormController::default();
        let events = recorded(&mut controller);
        controller.focus("root_name", json!("x"));
        controller.blur("root_name", json!("y"));
        let events = events.lock().unwrap();
        assert_eq!(
            events[1],
            FormEvent::Blur {
                id: "root_name".into(),
                value: json!("y")
            }
        );
    }
}
