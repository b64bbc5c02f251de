use std::sync::Arc;

use super::message::Message;
use super::state::Notice;
use super::value::{FieldKey, Value};

/// Hooks a host environment implements to react to form changes, typically by
/// scheduling a re-render. Every method is called only when the observed part
/// actually changed, and never while the form's state lock is held.
pub trait ChangeObserver: Send + Sync {
    fn on_value_change(&self, _field: &FieldKey, _before: &Value, _after: &Value) {}

    fn on_messages_change(
        &self,
        _field: &FieldKey,
        _before: Option<&[Message]>,
        _after: Option<&[Message]>,
    ) {
    }

    fn on_error_change(&self, _field: &FieldKey, _before: bool, _after: bool) {}

    fn on_warning_change(&self, _field: &FieldKey, _before: bool, _after: bool) {}
}

type ValueCallback = Arc<dyn Fn(&FieldKey, &Value, &Value) + Send + Sync>;
type MessagesCallback =
    Arc<dyn Fn(&FieldKey, Option<&[Message]>, Option<&[Message]>) + Send + Sync>;
type FlagCallback = Arc<dyn Fn(&FieldKey, bool, bool) + Send + Sync>;

/// A [`ChangeObserver`] assembled from individual closures.
#[derive(Clone, Default)]
pub struct ChangeCallbacks {
    on_value_change: Option<ValueCallback>,
    on_messages_change: Option<MessagesCallback>,
    on_error_change: Option<FlagCallback>,
    on_warning_change: Option<FlagCallback>,
}

impl ChangeCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_value_change(
        mut self,
        f: impl Fn(&FieldKey, &Value, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_value_change = Some(Arc::new(f));
        self
    }

    pub fn on_messages_change(
        mut self,
        f: impl Fn(&FieldKey, Option<&[Message]>, Option<&[Message]>) + Send + Sync + 'static,
    ) -> Self {
        self.on_messages_change = Some(Arc::new(f));
        self
    }

    pub fn on_error_change(
        mut self,
        f: impl Fn(&FieldKey, bool, bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_error_change = Some(Arc::new(f));
        self
    }

    pub fn on_warning_change(
        mut self,
        f: impl Fn(&FieldKey, bool, bool) + Send + Sync + 'static,
    ) -> Self {
        self.on_warning_change = Some(Arc::new(f));
        self
    }
}

impl ChangeObserver for ChangeCallbacks {
    fn on_value_change(&self, field: &FieldKey, before: &Value, after: &Value) {
        if let Some(callback) = &self.on_value_change {
            callback(field, before, after);
        }
    }

    fn on_messages_change(
        &self,
        field: &FieldKey,
        before: Option<&[Message]>,
        after: Option<&[Message]>,
    ) {
        if let Some(callback) = &self.on_messages_change {
            callback(field, before, after);
        }
    }

    fn on_error_change(&self, field: &FieldKey, before: bool, after: bool) {
        if let Some(callback) = &self.on_error_change {
            callback(field, before, after);
        }
    }

    fn on_warning_change(&self, field: &FieldKey, before: bool, after: bool) {
        if let Some(callback) = &self.on_warning_change {
            callback(field, before, after);
        }
    }
}

pub(super) fn dispatch(observer: Option<&Arc<dyn ChangeObserver>>, notices: Vec<Notice>) {
    let Some(observer) = observer else {
        return;
    };
    for notice in notices {
        match notice {
            Notice::Value {
                field,
                before,
                after,
            } => {
                tracing::trace!(%field, "value changed");
                observer.on_value_change(&field, &before, &after);
            }
            Notice::Messages {
                field,
                before,
                after,
            } => {
                tracing::trace!(%field, "messages changed");
                observer.on_messages_change(&field, before.as_deref(), after.as_deref());
            }
            Notice::Error {
                field,
                before,
                after,
            } => observer.on_error_change(&field, before, after),
            Notice::Warning {
                field,
                before,
                after,
            } => observer.on_warning_change(&field, before, after),
        }
    }
}
