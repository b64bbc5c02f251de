use super::controller::{FormController, FormError, FormResult, SetOptions};
use super::outcome::Outcome;
use super::value::{FieldKey, FromValue, Value, Values};

/// A typed view over a form's values, usually derived with
/// `#[derive(FormValues)]`.
pub trait FormValues: Sized {
    type Fields;

    fn fields() -> Self::Fields;

    fn field_keys() -> &'static [&'static str];

    fn to_values(&self) -> Values;

    fn from_values(values: &Values) -> FormResult<Self>;
}

/// Reads one typed field out of `values`. Used by the derive.
#[doc(hidden)]
pub fn field_from_values<T>(values: &Values, field: &'static str) -> FormResult<T>
where
    T: FromValue,
{
    let value = values.get(field).unwrap_or(&Value::Undefined);
    T::from_value(value).ok_or_else(|| {
        if value.is_undefined() {
            FormError::MissingField(FieldKey::from(field))
        } else {
            FormError::TypeMismatch {
                field: FieldKey::from(field),
                expected: T::EXPECTED,
            }
        }
    })
}

impl FormController {
    /// The model's fields read out of the current values.
    pub fn values_as<M>(&self) -> FormResult<M>
    where
        M: FormValues,
    {
        M::from_values(&self.get_values_of(M::field_keys().iter().copied()))
    }

    pub fn reset_values_from<M>(&self, model: &M, options: SetOptions) -> Outcome
    where
        M: FormValues,
    {
        self.reset_values(Some(model.to_values()), options)
    }
}
