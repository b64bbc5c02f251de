use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;

use super::message::{Message, MessageType};
use super::outcome::{IntoPassed, Outcome};
use super::value::{FieldKey, Value, Values};

pub const DEFAULT_REQUIRED_MESSAGE: &str = "This field is required";

/// Rule predicate: the field's current value plus, when requested, a snapshot of
/// other values.
pub type ValidateFn = Arc<dyn Fn(&Value, Option<&Values>) -> Outcome + Send + Sync>;

/// Interaction that triggers validation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ValidationEvent {
    /// A value change made by the user.
    OnTouch,
    /// Any value change.
    OnChange,
    #[default]
    OnBlur,
    All,
}

impl ValidationEvent {
    /// Whether a rule triggered by `self` runs for a validation pass requested with
    /// `requested`. A touch also satisfies change-triggered rules, not the reverse.
    pub fn applies_to(self, requested: ValidationEvent) -> bool {
        requested == ValidationEvent::All
            || self == ValidationEvent::All
            || self == requested
            || (requested == ValidationEvent::OnTouch && self == ValidationEvent::OnChange)
    }
}

/// Extra values handed to a rule alongside the field's own value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum MoreValues {
    #[default]
    None,
    All,
    Fields(Vec<FieldKey>),
}

#[derive(Clone, Default)]
pub struct Rule {
    pub message: Option<String>,
    pub kind: Option<MessageType>,
    pub kind_if_passed: Option<MessageType>,
    pub validate: Option<ValidateFn>,
    pub more_values: MoreValues,
    pub event: Option<ValidationEvent>,
}

impl Rule {
    /// A synchronous rule. `f` may return `bool` or `Result<bool, E>`.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&Value, Option<&Values>) -> R + Send + Sync + 'static,
        R: IntoPassed,
    {
        Self::with_outcome(move |value, values| Outcome::Immediate(f(value, values).into_passed()))
    }

    /// An asynchronous rule. The future may resolve to `bool` or `Result<bool, E>`.
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&Value, Option<&Values>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoPassed,
    {
        Self::with_outcome(move |value, values| {
            let future = f(value, values);
            Outcome::pending(async move { future.await.into_passed() })
        })
    }

    /// A rule that decides per call whether it settles right away.
    pub fn with_outcome<F>(f: F) -> Self
    where
        F: Fn(&Value, Option<&Values>) -> Outcome + Send + Sync + 'static,
    {
        Self {
            validate: Some(Arc::new(f)),
            ..Self::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn kind(mut self, kind: MessageType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn kind_if_passed(mut self, kind: MessageType) -> Self {
        self.kind_if_passed = Some(kind);
        self
    }

    pub fn on(mut self, event: ValidationEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_all_values(mut self) -> Self {
        self.more_values = MoreValues::All;
        self
    }

    pub fn with_values<K>(mut self, fields: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<FieldKey>,
    {
        self.more_values = MoreValues::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The message recorded for a given check result, if any.
    pub(super) fn message_for(&self, passed: bool) -> Option<Message> {
        if passed {
            self.kind_if_passed
                .map(|kind| Message::new(self.message.clone(), Some(kind)))
        } else {
            Some(Message::new(
                self.message.clone(),
                Some(self.kind.unwrap_or(MessageType::Error)),
            ))
        }
    }
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("kind_if_passed", &self.kind_if_passed)
            .field("validate", &self.validate.as_ref().map(|_| ".."))
            .field("more_values", &self.more_values)
            .field("event", &self.event)
            .finish()
    }
}

/// Shorthand for "this field must not be blank".
#[derive(Clone, Debug)]
pub enum Required {
    /// Uses the configured required check and message.
    Default,
    /// Uses the configured required check with this message.
    Message(String),
    /// A full rule; unset parts fall back to the required defaults.
    Rule(Rule),
}

impl From<&str> for Required {
    fn from(value: &str) -> Self {
        Required::Message(value.to_string())
    }
}

impl From<String> for Required {
    fn from(value: String) -> Self {
        Required::Message(value)
    }
}

impl From<Rule> for Required {
    fn from(value: Rule) -> Self {
        Required::Rule(value)
    }
}

/// Validation settings of one field.
#[derive(Clone, Default)]
pub struct FieldValidation {
    pub event: Option<ValidationEvent>,
    pub rules: Vec<Rule>,
    pub required: Option<Required>,
    pub required_validate: Option<ValidateFn>,
}

impl FieldValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn on(mut self, event: ValidationEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = Some(Required::Default);
        self
    }

    pub fn required_with(mut self, required: impl Into<Required>) -> Self {
        self.required = Some(required.into());
        self
    }

    pub fn required_validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.required_validate = Some(Arc::new(move |value: &Value, _: Option<&Values>| {
            Outcome::Immediate(f(value))
        }));
        self
    }
}

impl Debug for FieldValidation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldValidation")
            .field("event", &self.event)
            .field("rules", &self.rules)
            .field("required", &self.required)
            .field(
                "required_validate",
                &self.required_validate.as_ref().map(|_| ".."),
            )
            .finish()
    }
}

/// Form-level fallbacks used when synthesizing the required rule.
pub(super) struct RequiredDefaults<'a> {
    pub(super) validate: Option<&'a ValidateFn>,
    pub(super) message: &'a str,
}

impl FieldValidation {
    /// The synthetic leading rule for `required`, if configured.
    pub(super) fn required_rule(&self, defaults: &RequiredDefaults<'_>) -> Option<Rule> {
        let fallback_validate = || -> ValidateFn {
            self.required_validate
                .as_ref()
                .or(defaults.validate)
                .cloned()
                .unwrap_or_else(|| {
                    Arc::new(|value: &Value, _: Option<&Values>| {
                        Outcome::Immediate(!value.is_blank())
                    })
                })
        };
        let rule = match self.required.as_ref()? {
            Required::Default => Rule {
                message: Some(defaults.message.to_string()),
                ..Rule::default()
            },
            Required::Message(message) => Rule {
                message: Some(message.clone()),
                ..Rule::default()
            },
            Required::Rule(rule) => {
                let mut rule = rule.clone();
                if rule.message.is_none() {
                    rule.message = Some(defaults.message.to_string());
                }
                rule
            }
        };
        Some(Rule {
            kind: rule.kind.or(Some(MessageType::Error)),
            validate: rule.validate.clone().or_else(|| Some(fallback_validate())),
            ..rule
        })
    }
}
