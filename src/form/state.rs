use std::sync::Arc;

use super::message::Message;
use super::value::{FieldKey, Value};

/// Read-only snapshot of one field's interaction counters and validation result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldState {
    /// Value changes attributed to direct user interaction.
    pub touched: u32,
    /// All value changes, user or programmatic.
    pub changed: u32,
    pub blurred: u32,
    pub error: bool,
    pub warning: bool,
    /// `None` when no message is active. The `Arc` is kept across recomputes that
    /// produce an equal list, so `Arc::ptr_eq` detects "nothing changed".
    pub messages: Option<Arc<[Message]>>,
}

impl FieldState {
    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or_default()
    }

    pub fn first_error(&self) -> Option<&Message> {
        self.messages().iter().find(|message| message.is_error())
    }
}

/// Where a validation message came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Slot {
    Required,
    Rule(usize),
}

/// Decomposed message sources that [`FieldState`] is recomputed from.
#[derive(Clone, Debug, Default)]
pub(super) struct MessageState {
    pub(super) required: Option<Message>,
    pub(super) rules: Vec<Option<Message>>,
    pub(super) custom: Vec<Message>,
    pub(super) error_override: Option<bool>,
    pub(super) warning_override: Option<bool>,
}

impl MessageState {
    pub(super) fn slot(&self, slot: Slot) -> Option<&Message> {
        match slot {
            Slot::Required => self.required.as_ref(),
            Slot::Rule(index) => self.rules.get(index).and_then(Option::as_ref),
        }
    }

    /// Stores `message` in `slot`; returns whether the stored message changed.
    pub(super) fn set_slot(&mut self, slot: Slot, message: Option<Message>) -> bool {
        if self.slot(slot) == message.as_ref() {
            return false;
        }
        match slot {
            Slot::Required => self.required = message,
            Slot::Rule(index) => {
                if self.rules.len() <= index {
                    self.rules.resize(index + 1, None);
                }
                self.rules[index] = message;
            }
        }
        true
    }

    /// Keeps the required slot only when `required` is set and the first `rules`
    /// rule slots. Returns whether a stored message was dropped.
    pub(super) fn retain_slots(&mut self, required: bool, rules: usize) -> bool {
        let mut dropped = false;
        if !required {
            dropped |= self.required.take().is_some();
        }
        if self.rules.len() > rules {
            dropped |= self.rules.drain(rules..).any(|message| message.is_some());
        }
        dropped
    }

    pub(super) fn clear_validation(&mut self) {
        self.required = None;
        self.rules.clear();
    }

    fn active(&self) -> impl Iterator<Item = &Message> {
        self.required
            .iter()
            .chain(self.rules.iter().flatten())
            .chain(self.custom.iter())
    }

    fn compose_error(&self) -> bool {
        self.error_override
            .unwrap_or_else(|| self.active().any(Message::is_error))
    }

    fn compose_warning(&self) -> bool {
        self.warning_override
            .unwrap_or_else(|| self.active().any(Message::is_warning))
    }
}

/// Which derived parts of [`FieldState`] to rebuild.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Refresh {
    All,
    Error,
    Warning,
}

/// A change the observer must hear about, collected under the state lock and
/// dispatched after it is released.
#[derive(Clone, Debug)]
pub(super) enum Notice {
    Value {
        field: FieldKey,
        before: Value,
        after: Value,
    },
    Messages {
        field: FieldKey,
        before: Option<Arc<[Message]>>,
        after: Option<Arc<[Message]>>,
    },
    Error {
        field: FieldKey,
        before: bool,
        after: bool,
    },
    Warning {
        field: FieldKey,
        before: bool,
        after: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub(super) struct FieldRecord {
    pub(super) state: FieldState,
    pub(super) sources: MessageState,
}

impl FieldRecord {
    /// Recomputes the derived flags (and, for [`Refresh::All`], the message list)
    /// from the message sources, reporting what visibly changed.
    pub(super) fn refresh(&mut self, field: &FieldKey, scope: Refresh, notices: &mut Vec<Notice>) {
        if scope == Refresh::All {
            let composed = self.sources.active().cloned().collect::<Vec<_>>();
            let unchanged = match &self.state.messages {
                Some(current) => current.as_ref() == composed.as_slice(),
                None => composed.is_empty(),
            };
            if !unchanged {
                let next = (!composed.is_empty()).then(|| Arc::<[Message]>::from(composed));
                let before = std::mem::replace(&mut self.state.messages, next.clone());
                notices.push(Notice::Messages {
                    field: field.clone(),
                    before,
                    after: next,
                });
            }
        }

        if matches!(scope, Refresh::All | Refresh::Error) {
            let error = self.sources.compose_error();
            if error != self.state.error {
                notices.push(Notice::Error {
                    field: field.clone(),
                    before: self.state.error,
                    after: error,
                });
                self.state.error = error;
            }
        }

        if matches!(scope, Refresh::All | Refresh::Warning) {
            let warning = self.sources.compose_warning();
            if warning != self.state.warning {
                notices.push(Notice::Warning {
                    field: field.clone(),
                    before: self.state.warning,
                    after: warning,
                });
                self.state.warning = warning;
            }
        }
    }

    /// Notices describing the visible difference between this record and a fresh one.
    pub(super) fn removal_notices(&self, field: &FieldKey, notices: &mut Vec<Notice>) {
        if self.state.messages.is_some() {
            notices.push(Notice::Messages {
                field: field.clone(),
                before: self.state.messages.clone(),
                after: None,
            });
        }
        if self.state.error {
            notices.push(Notice::Error {
                field: field.clone(),
                before: true,
                after: false,
            });
        }
        if self.state.warning {
            notices.push(Notice::Warning {
                field: field.clone(),
                before: true,
                after: false,
            });
        }
    }
}
