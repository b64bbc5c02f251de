use super::controller::{FormController, SetOptions};
use super::outcome::Outcome;
use super::state::FieldState;
use super::value::{FieldKey, Value};

/// Minimal view of an input-like element, as seen through a change event.
///
/// Every accessor is optional so partial or generic event shapes are tolerated.
pub trait InputTarget {
    /// The element's `type`, e.g. `"text"`, `"checkbox"`, `"radio"`, `"select-multiple"`.
    fn input_type(&self) -> Option<&str>;

    fn checked(&self) -> Option<bool> {
        None
    }

    fn value(&self) -> Option<&str> {
        None
    }

    /// Values of the selected options of a multi-select.
    fn selected_values(&self) -> Option<Vec<String>> {
        None
    }
}

/// A change event carrying the element that changed.
#[derive(Clone, Debug, Default)]
pub struct ChangeEvent<T> {
    pub target: Option<T>,
}

impl<T> ChangeEvent<T> {
    pub fn new(target: T) -> Self {
        Self {
            target: Some(target),
        }
    }
}

/// Plain-data input element, handy for hosts that copy element state out of
/// their widget tree, and for tests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InputSnapshot {
    pub input_type: Option<String>,
    pub checked: Option<bool>,
    pub value: Option<String>,
    pub selected: Option<Vec<String>>,
}

impl InputSnapshot {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            input_type: Some("text".to_string()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn checkbox(checked: bool) -> Self {
        Self {
            input_type: Some("checkbox".to_string()),
            checked: Some(checked),
            ..Self::default()
        }
    }

    pub fn radio(value: impl Into<String>, checked: bool) -> Self {
        Self {
            input_type: Some("radio".to_string()),
            checked: Some(checked),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn select_multiple<S: Into<String>>(selected: impl IntoIterator<Item = S>) -> Self {
        Self {
            input_type: Some("select-multiple".to_string()),
            selected: Some(selected.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

impl InputTarget for InputSnapshot {
    fn input_type(&self) -> Option<&str> {
        self.input_type.as_deref()
    }

    fn checked(&self) -> Option<bool> {
        self.checked
    }

    fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn selected_values(&self) -> Option<Vec<String>> {
        self.selected.clone()
    }
}

/// The value an input element currently represents, or `None` when the element
/// does not expose enough to tell.
pub fn extract_input_value<T>(target: &T) -> Option<Value>
where
    T: InputTarget + ?Sized,
{
    match target.input_type()? {
        "checkbox" => target.checked().map(Value::Bool),
        "radio" => {
            if target.checked()? {
                target.value().map(Value::from)
            } else {
                Some(Value::Undefined)
            }
        }
        "select-multiple" => target
            .selected_values()
            .map(|selected| Value::list(selected.into_iter().map(Value::from))),
        _ => target.value().map(Value::from),
    }
}

impl FormController {
    /// Writes the value carried by a user's change event. Malformed events are
    /// ignored.
    pub fn handle_input<T>(&self, field: impl Into<FieldKey>, event: &ChangeEvent<T>) -> Outcome
    where
        T: InputTarget,
    {
        let field = field.into();
        let Some(value) = event.target.as_ref().and_then(extract_input_value) else {
            tracing::trace!(form = %self.id, %field, "ignoring malformed change event");
            return Outcome::Immediate(true);
        };
        self.set_value(field, value, SetOptions::user())
    }

    pub fn register_field(&self, field: impl Into<FieldKey>) -> FieldBinding {
        FieldBinding {
            controller: self.clone(),
            field: field.into(),
        }
    }
}

/// One field of a form bound to an input element.
#[derive(Clone, Debug)]
pub struct FieldBinding {
    controller: FormController,
    field: FieldKey,
}

impl FieldBinding {
    pub fn field(&self) -> &FieldKey {
        &self.field
    }

    pub fn value(&self) -> Value {
        self.controller.get_value(self.field.as_str())
    }

    pub fn state(&self) -> FieldState {
        self.controller.get_field_state(self.field.as_str())
    }

    pub fn on_input<T>(&self, event: &ChangeEvent<T>) -> Outcome
    where
        T: InputTarget,
    {
        self.controller.handle_input(&self.field, event)
    }

    pub fn on_blur(&self) -> Outcome {
        self.controller.handle_blur(self.field.as_str())
    }

    /// First error message, once the user has interacted with the field.
    pub fn error_for_display(&self) -> Option<String> {
        let state = self.state();
        if state.touched == 0 && state.blurred == 0 {
            return None;
        }
        state.first_error().and_then(|message| message.message.clone())
    }
}
