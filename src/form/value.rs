use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Field values keyed by name, enumerated in insertion order.
pub type Values = IndexMap<FieldKey, Value>;

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(Arc<str>);

impl FieldKey {
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&String> for FieldKey {
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

/// A dynamically typed field value.
///
/// `PartialEq` compares structurally. Change detection uses [`Value::same`] instead,
/// which treats lists and objects by identity.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Decimal),
    Text(Arc<str>),
    List(Arc<[Value]>),
    Object(Arc<Values>),
}

impl Value {
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn object(entries: impl IntoIterator<Item = (FieldKey, Value)>) -> Self {
        Self::Object(Arc::new(entries.into_iter().collect()))
    }

    /// Identity comparison: value equality for scalars, pointer identity for
    /// lists and objects.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Blank values fail the default `required` check: undefined, null, the empty
    /// string and zero.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => true,
            Value::Text(text) => text.is_empty(),
            Value::Number(number) => number.is_zero(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_decimal().and_then(|number| number.to_f64())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Values> {
        match self {
            Value::Object(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(Arc::from(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Number(value)
    }
}

macro_rules! impl_value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Decimal::from(value))
                }
            }
        )*
    };
}

impl_value_from_int!(i32, i64, u32, u64, usize);

/// A float that has no faithful [`Decimal`] counterpart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnrepresentableNumber(pub f64);

impl Display for UnrepresentableNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} cannot be stored as a decimal number", self.0)
    }
}

impl std::error::Error for UnrepresentableNumber {}

/// Converts through the float's shortest decimal form, rounded to 28 decimal
/// places. Non-finite floats, magnitudes above [`Decimal::MAX`] and non-zero
/// floats that would round to zero are rejected.
impl TryFrom<f64> for Value {
    type Error = UnrepresentableNumber;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        decimal_from_f64(value)
            .map(Value::Number)
            .ok_or(UnrepresentableNumber(value))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Undefined, Into::into)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::list(value.into_iter().map(Into::into))
    }
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    let decimal = Decimal::from_str(&value.to_string()).ok()?;
    (value == 0.0 || !decimal.is_zero()).then_some(decimal)
}

/// Conversion out of a [`Value`], used by typed form models.
pub trait FromValue: Sized {
    /// Human-readable name of the expected shape, reported on mismatch.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromValue for Decimal {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_decimal()
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty => $convert:ident),*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = "integer";

                fn from_value(value: &Value) -> Option<Self> {
                    let number = value.as_decimal()?;
                    if !number.fract().is_zero() {
                        return None;
                    }
                    number.$convert()
                }
            }
        )*
    };
}

impl_from_value_int!(i32 => to_i32, i64 => to_i64, u32 => to_u32, u64 => to_u64, usize => to_usize);

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Undefined | Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T> FromValue for Vec<T>
where
    T: FromValue,
{
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list()?.iter().map(T::from_value).collect()
    }
}
