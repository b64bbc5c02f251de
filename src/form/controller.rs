use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use futures::task::{Spawn, SpawnExt};
use indexmap::IndexMap;

use super::message::Message;
use super::observer::{self, ChangeObserver};
use super::outcome::Outcome;
use super::rule::{DEFAULT_REQUIRED_MESSAGE, FieldValidation, ValidateFn, ValidationEvent};
use super::state::{FieldRecord, FieldState, MessageState, Notice, Refresh};
use super::value::{FieldKey, Value, Values};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FormId {
    Auto(u64),
    Named(Arc<str>),
}

impl FormId {
    pub fn next() -> Self {
        Self::Auto(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }

    pub fn named(name: impl AsRef<str>) -> Self {
        Self::Named(Arc::from(name.as_ref()))
    }
}

impl Display for FormId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormId::Auto(id) => write!(f, "form-{id}"),
            FormId::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for FormId {
    fn from(value: &str) -> Self {
        Self::named(value)
    }
}

impl From<String> for FormId {
    fn from(value: String) -> Self {
        Self::Named(Arc::from(value))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    MissingField(FieldKey),
    TypeMismatch {
        field: FieldKey,
        expected: &'static str,
    },
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::MissingField(field) => write!(f, "form has no value for field `{field}`"),
            FormError::TypeMismatch { field, expected } => {
                write!(f, "field `{field}` does not hold a {expected}")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub type FieldValidations = IndexMap<FieldKey, FieldValidation>;

/// Construction-time configuration of a form.
#[derive(Clone)]
pub struct FormOptions {
    /// Initial values, and the values `reset_values(None, ..)` restores.
    pub default_values: Values,
    pub validation: FieldValidations,
    /// Trigger for rules and fields that do not name one.
    pub validation_event: ValidationEvent,
    /// Check used by `required` rules that bring no check of their own.
    pub required_validate: Option<ValidateFn>,
    pub required_message: String,
    pub observer: Option<Arc<dyn ChangeObserver>>,
    /// Executor that drives pending validations started by value writes and blurs.
    pub spawner: Option<Arc<dyn Spawn + Send + Sync>>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            default_values: Values::new(),
            validation: FieldValidations::new(),
            validation_event: ValidationEvent::OnBlur,
            required_validate: None,
            required_message: DEFAULT_REQUIRED_MESSAGE.to_string(),
            observer: None,
            spawner: None,
        }
    }
}

impl FormOptions {
    pub fn with_default_values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<FieldKey>,
        V: Into<Value>,
    {
        self.default_values = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self
    }

    pub fn with_validation(
        mut self,
        field: impl Into<FieldKey>,
        validation: FieldValidation,
    ) -> Self {
        self.validation.insert(field.into(), validation);
        self
    }

    pub fn with_validation_event(mut self, event: ValidationEvent) -> Self {
        self.validation_event = event;
        self
    }

    pub fn with_required_validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.required_validate = Some(Arc::new(move |value: &Value, _: Option<&Values>| {
            Outcome::Immediate(f(value))
        }));
        self
    }

    pub fn with_required_message(mut self, message: impl Into<String>) -> Self {
        self.required_message = message.into();
        self
    }

    pub fn with_observer(mut self, observer: impl ChangeObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn with_spawner(mut self, spawner: impl Spawn + Send + Sync + 'static) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }
}

impl Debug for FormOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("default_values", &self.default_values)
            .field("validation", &self.validation)
            .field("validation_event", &self.validation_event)
            .field("required_message", &self.required_message)
            .field("observer", &self.observer.is_some())
            .field("spawner", &self.spawner.is_some())
            .finish_non_exhaustive()
    }
}

/// How a value write runs through the post-change pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SetOptions {
    /// The write comes from direct user interaction: bumps `touched` and validates
    /// with [`ValidationEvent::OnTouch`].
    pub by_user: bool,
    /// Update the `changed`/`touched` counters.
    pub track: bool,
    /// Fire value-change notifications.
    pub notify: bool,
    pub validate: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            by_user: false,
            track: true,
            notify: true,
            validate: true,
        }
    }
}

impl SetOptions {
    pub fn user() -> Self {
        Self {
            by_user: true,
            ..Self::default()
        }
    }

    /// Writes the value only: no counters, notifications or validation.
    pub fn quiet() -> Self {
        Self {
            by_user: false,
            track: false,
            notify: false,
            validate: false,
        }
    }

    fn event(self) -> ValidationEvent {
        if self.by_user {
            ValidationEvent::OnTouch
        } else {
            ValidationEvent::OnChange
        }
    }
}

#[derive(Default)]
pub(super) struct FormState {
    pub(super) values: Values,
    pub(super) fields: IndexMap<FieldKey, FieldRecord>,
    pub(super) validation: FieldValidations,
}

impl FormState {
    pub(super) fn ensure_record(&mut self, field: &str) -> &mut FieldRecord {
        self.fields.entry(FieldKey::from(field)).or_default()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WriteMode {
    Merge,
    Replace,
}

/// Form-state controller. Clones are handles to the same form.
#[derive(Clone)]
pub struct FormController {
    pub(super) id: FormId,
    pub(super) options: Arc<FormOptions>,
    pub(super) state: Arc<RwLock<FormState>>,
}

impl FormController {
    pub fn new(id: impl Into<FormId>, options: FormOptions) -> Self {
        let state = FormState {
            values: options.default_values.clone(),
            fields: IndexMap::new(),
            validation: options.validation.clone(),
        };
        Self {
            id: id.into(),
            options: Arc::new(options),
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn id(&self) -> &FormId {
        &self.id
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn get_value(&self, field: &str) -> Value {
        read_lock(&self.state, "reading field value")
            .values
            .get(field)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_values(&self) -> Values {
        read_lock(&self.state, "reading all values").values.clone()
    }

    /// Exactly the requested fields, `Undefined` for those never set.
    pub fn get_values_of<K>(&self, fields: impl IntoIterator<Item = K>) -> Values
    where
        K: Into<FieldKey>,
    {
        let state = read_lock(&self.state, "reading selected values");
        fields
            .into_iter()
            .map(|field| {
                let key = field.into();
                let value = state.values.get(&key).cloned().unwrap_or_default();
                (key, value)
            })
            .collect()
    }

    pub fn set_value(
        &self,
        field: impl Into<FieldKey>,
        value: impl Into<Value>,
        options: SetOptions,
    ) -> Outcome {
        self.write_values(
            vec![(field.into(), value.into())],
            WriteMode::Merge,
            options,
        )
    }

    pub fn set_values<K, V>(
        &self,
        values: impl IntoIterator<Item = (K, V)>,
        options: SetOptions,
    ) -> Outcome
    where
        K: Into<FieldKey>,
        V: Into<Value>,
    {
        let writes = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.write_values(writes, WriteMode::Merge, options)
    }

    pub fn clear_values(&self, options: SetOptions) -> Outcome {
        self.write_values(Vec::new(), WriteMode::Replace, options)
    }

    /// Replaces every value with `values`, or with the configured defaults.
    pub fn reset_values(&self, values: Option<Values>, options: SetOptions) -> Outcome {
        let values = values.unwrap_or_else(|| self.options.default_values.clone());
        self.write_values(values.into_iter().collect(), WriteMode::Replace, options)
    }

    pub fn get_field_state(&self, field: &str) -> FieldState {
        if let Some(record) = read_lock(&self.state, "reading field state").fields.get(field) {
            return record.state.clone();
        }
        write_lock(&self.state, "creating field state")
            .ensure_record(field)
            .state
            .clone()
    }

    /// Drops the field's state and message sources. Returns whether a state existed.
    pub fn clear_field_state(&self, field: &str) -> bool {
        let mut notices = Vec::new();
        let removed = write_lock(&self.state, "clearing field state")
            .fields
            .shift_remove_entry(field);
        if let Some((key, record)) = &removed {
            record.removal_notices(key, &mut notices);
        }
        self.notify(notices);
        removed.is_some()
    }

    pub fn clear_field_states(&self) {
        let mut notices = Vec::new();
        let fields = std::mem::take(&mut write_lock(&self.state, "clearing field states").fields);
        for (key, record) in &fields {
            record.removal_notices(key, &mut notices);
        }
        self.notify(notices);
    }

    /// Whether any field currently reports an error.
    pub fn has_errors(&self) -> bool {
        read_lock(&self.state, "checking field errors")
            .fields
            .values()
            .any(|record| record.state.error)
    }

    pub fn force_field_error(&self, field: &str, error: bool) {
        self.update_sources(field, Refresh::Error, |sources| {
            sources.error_override = Some(error);
        });
    }

    pub fn force_field_warning(&self, field: &str, warning: bool) {
        self.update_sources(field, Refresh::Warning, |sources| {
            sources.warning_override = Some(warning);
        });
    }

    pub fn unforce_field_error(&self, field: &str) {
        self.update_sources(field, Refresh::Error, |sources| {
            sources.error_override = None;
        });
    }

    pub fn unforce_field_warning(&self, field: &str) {
        self.update_sources(field, Refresh::Warning, |sources| {
            sources.warning_override = None;
        });
    }

    /// Drops required, rule and custom messages. Force overrides stay in place.
    pub fn clear_field_messages(&self, field: &str) {
        self.update_sources(field, Refresh::All, |sources| {
            sources.clear_validation();
            sources.custom.clear();
        });
    }

    /// Drops required and rule messages, keeping custom ones.
    pub fn clear_field_validation_messages(&self, field: &str) {
        self.update_sources(field, Refresh::All, MessageState::clear_validation);
    }

    pub fn clear_field_custom_messages(&self, field: &str) {
        self.update_sources(field, Refresh::All, |sources| sources.custom.clear());
    }

    pub fn add_field_custom_messages(
        &self,
        field: &str,
        messages: impl IntoIterator<Item = Message>,
    ) {
        let messages = messages.into_iter().collect::<Vec<_>>();
        self.update_sources(field, Refresh::All, move |sources| {
            sources.custom.extend(messages);
        });
    }

    pub fn reset_field_custom_messages(
        &self,
        field: &str,
        messages: impl IntoIterator<Item = Message>,
    ) {
        let messages = messages.into_iter().collect::<Vec<_>>();
        self.update_sources(field, Refresh::All, move |sources| {
            sources.custom = messages;
        });
    }

    /// Records a blur and runs the blur-triggered rules.
    pub fn handle_blur(&self, field: &str) -> Outcome {
        {
            let mut state = write_lock(&self.state, "recording blur");
            let counters = &mut state.ensure_record(field).state;
            counters.blurred = counters.blurred.saturating_add(1);
        }
        let outcome = self.validate_field(field, ValidationEvent::OnBlur);
        self.drive(outcome)
    }

    pub fn field_validation(&self, field: &str) -> Option<FieldValidation> {
        read_lock(&self.state, "reading field validation")
            .validation
            .get(field)
            .cloned()
    }

    /// Replaces the field's validation settings. Existing messages stay until the
    /// next validation pass.
    pub fn set_field_validation(&self, field: impl Into<FieldKey>, validation: FieldValidation) {
        write_lock(&self.state, "setting field validation")
            .validation
            .insert(field.into(), validation);
    }

    pub fn remove_field_validation(&self, field: &str) -> bool {
        write_lock(&self.state, "removing field validation")
            .validation
            .shift_remove(field)
            .is_some()
    }

    fn write_values(
        &self,
        writes: Vec<(FieldKey, Value)>,
        mode: WriteMode,
        options: SetOptions,
    ) -> Outcome {
        let changes = {
            let mut state = write_lock(&self.state, "writing values");
            let mut changes = Vec::with_capacity(writes.len());
            match mode {
                WriteMode::Merge => {
                    for (key, value) in writes {
                        let before = state
                            .values
                            .insert(key.clone(), value.clone())
                            .unwrap_or_default();
                        changes.push((key, before, value));
                    }
                }
                WriteMode::Replace => {
                    let mut previous = std::mem::take(&mut state.values);
                    for (key, value) in writes {
                        let before = previous.shift_remove(&key).unwrap_or_default();
                        state.values.insert(key.clone(), value.clone());
                        changes.push((key, before, value));
                    }
                    changes.extend(
                        previous
                            .into_iter()
                            .map(|(key, before)| (key, before, Value::Undefined)),
                    );
                }
            }
            changes
        };
        tracing::debug!(
            form = %self.id,
            fields = changes.len(),
            by_user = options.by_user,
            "values written"
        );

        if options.notify {
            let notices = changes
                .iter()
                .filter(|(_, before, after)| !before.same(after))
                .map(|(field, before, after)| Notice::Value {
                    field: field.clone(),
                    before: before.clone(),
                    after: after.clone(),
                })
                .collect();
            self.notify(notices);
        }

        if options.track {
            let mut state = write_lock(&self.state, "counting value changes");
            for (field, _, _) in &changes {
                let counters = &mut state.ensure_record(field.as_str()).state;
                counters.changed = counters.changed.saturating_add(1);
                if options.by_user {
                    counters.touched = counters.touched.saturating_add(1);
                }
            }
        }

        if !options.validate {
            return Outcome::Immediate(true);
        }
        let outcome = self.validate(
            changes.iter().map(|(field, _, _)| field.as_str()),
            options.event(),
        );
        self.drive(outcome)
    }

    /// Mutates the field's message sources, recomputes and notifies.
    pub(super) fn update_sources(
        &self,
        field: &str,
        scope: Refresh,
        mutate: impl FnOnce(&mut MessageState),
    ) {
        let mut notices = Vec::new();
        {
            let mut state = write_lock(&self.state, "updating field messages");
            let key = FieldKey::from(field);
            let record = state.fields.entry(key.clone()).or_default();
            mutate(&mut record.sources);
            record.refresh(&key, scope, &mut notices);
        }
        self.notify(notices);
    }

    pub(super) fn notify(&self, notices: Vec<Notice>) {
        observer::dispatch(self.options.observer.as_ref(), notices);
    }

    /// Hands pending outcomes to the configured spawner so they settle even when the
    /// caller drops the returned handle.
    pub(super) fn drive(&self, outcome: Outcome) -> Outcome {
        match (outcome, self.options.spawner.as_ref()) {
            (Outcome::Pending(future), Some(spawner)) => {
                let shared = future.shared();
                if let Err(error) = spawner.spawn(shared.clone().map(|_| ())) {
                    tracing::warn!(form = %self.id, %error, "failed to spawn pending validation");
                }
                Outcome::pending(shared)
            }
            (outcome, _) => outcome,
        }
    }
}

impl Debug for FormController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::warn!(context, "recovering poisoned form state lock");
        poisoned.into_inner()
    })
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::warn!(context, "recovering poisoned form state lock");
        poisoned.into_inner()
    })
}
