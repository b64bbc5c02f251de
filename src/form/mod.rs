mod binding;
mod controller;
mod message;
mod model;
mod observer;
mod outcome;
mod registry;
mod rule;
mod state;
mod validation;
mod value;


pub use binding::{ChangeEvent, FieldBinding, InputSnapshot, InputTarget, extract_input_value};
pub use calmform_derive::FormValues;
pub use controller::{
    FieldValidations, FormController, FormError, FormId, FormOptions, FormResult, SetOptions,
};
pub use message::{Message, MessageType};
pub use model::{FormValues, field_from_values};
pub use observer::{ChangeCallbacks, ChangeObserver};
pub use outcome::{IntoPassed, Outcome};
pub use registry::FormRegistry;
pub use rule::{
    DEFAULT_REQUIRED_MESSAGE, FieldValidation, MoreValues, Required, Rule, ValidateFn,
    ValidationEvent,
};
pub use state::FieldState;
pub use value::{FieldKey, FromValue, UnrepresentableNumber, Value, Values};
