use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use futures::future::{self, BoxFuture};

use super::controller::{FormController, read_lock, write_lock};
use super::message::Message;
use super::outcome::Outcome;
use super::rule::{MoreValues, RequiredDefaults, Rule, ValidationEvent};
use super::state::{Refresh, Slot};
use super::value::{FieldKey, Value, Values};

/// Slots the field's current settings can write.
#[derive(Clone, Copy)]
struct Layout {
    required: bool,
    rules: usize,
}

/// One applicable rule, with its inputs captured under the state lock.
struct Check {
    slot: Slot,
    rule: Rule,
    more_values: Option<Values>,
}

impl FormController {
    /// Runs the field's rules that apply to `event`.
    ///
    /// A field without validation settings passes without side effects. Messages of
    /// synchronous rules are recomputed before this returns; when any rule is still
    /// pending, the recompute happens once, after every pending rule has settled.
    pub fn validate_field(&self, field: &str, event: ValidationEvent) -> Outcome {
        let Some((value, checks, layout)) = self.collect_checks(field, event) else {
            return Outcome::Immediate(true);
        };
        let key = FieldKey::from(field);

        let mut settled = true;
        let mut changed = self.retain_slots(&key, layout);
        let mut pending: Vec<BoxFuture<'static, (bool, bool)>> = Vec::new();
        for Check {
            slot,
            rule,
            more_values,
        } in checks
        {
            match run_rule(&rule, &value, more_values.as_ref()) {
                Outcome::Immediate(passed) => {
                    settled &= passed;
                    changed |= self.store_message(&key, slot, rule.message_for(passed));
                }
                Outcome::Pending(check) => {
                    let controller = self.clone();
                    let key = key.clone();
                    pending.push(
                        async move {
                            let passed = check.await;
                            let changed =
                                controller.store_message(&key, slot, rule.message_for(passed));
                            (passed, changed)
                        }
                        .boxed(),
                    );
                }
            }
        }

        if pending.is_empty() {
            if changed {
                self.update_sources(field, Refresh::All, |_| {});
            }
            tracing::debug!(form = %self.id, %key, ?event, passed = settled, "field validated");
            return Outcome::Immediate(settled);
        }

        tracing::debug!(
            form = %self.id,
            %key,
            ?event,
            pending = pending.len(),
            "field validation pending"
        );
        let controller = self.clone();
        Outcome::pending(async move {
            let mut passed = settled;
            for (rule_passed, rule_changed) in future::join_all(pending).await {
                passed &= rule_passed;
                changed |= rule_changed;
            }
            if changed {
                controller.update_sources(key.as_str(), Refresh::All, |_| {});
            }
            tracing::debug!(form = %controller.id, %key, ?event, passed, "field validated");
            passed
        })
    }

    /// Validates each field, combining the results with a logical AND.
    pub fn validate<K>(
        &self,
        fields: impl IntoIterator<Item = K>,
        event: ValidationEvent,
    ) -> Outcome
    where
        K: AsRef<str>,
    {
        Outcome::all(
            fields
                .into_iter()
                .map(|field| self.validate_field(field.as_ref(), event))
                .collect::<Vec<_>>(),
        )
    }

    /// Validates every field that has validation settings.
    pub fn validate_all(&self, event: ValidationEvent) -> Outcome {
        let fields = read_lock(&self.state, "listing validated fields")
            .validation
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        self.validate(fields, event)
    }

    fn collect_checks(
        &self,
        field: &str,
        event: ValidationEvent,
    ) -> Option<(Value, Vec<Check>, Layout)> {
        let state = read_lock(&self.state, "collecting validation rules");
        let settings = state.validation.get(field)?;
        let layout = Layout {
            required: settings.required.is_some(),
            rules: settings.rules.len(),
        };
        let defaults = RequiredDefaults {
            validate: self.options.required_validate.as_ref(),
            message: &self.options.required_message,
        };
        let fallback_event = settings.event.unwrap_or(self.options.validation_event);

        let rules = settings
            .required_rule(&defaults)
            .map(|rule| (Slot::Required, rule))
            .into_iter()
            .chain(
                settings
                    .rules
                    .iter()
                    .cloned()
                    .enumerate()
                    .map(|(index, rule)| (Slot::Rule(index), rule)),
            );

        let checks = rules
            .filter(|(_, rule)| rule.event.unwrap_or(fallback_event).applies_to(event))
            .map(|(slot, rule)| {
                let more_values = match &rule.more_values {
                    MoreValues::None => None,
                    MoreValues::All => Some(state.values.clone()),
                    MoreValues::Fields(fields) => Some(
                        fields
                            .iter()
                            .map(|key| {
                                (key.clone(), state.values.get(key).cloned().unwrap_or_default())
                            })
                            .collect(),
                    ),
                };
                Check {
                    slot,
                    rule,
                    more_values,
                }
            })
            .collect();
        let value = state.values.get(field).cloned().unwrap_or_default();
        Some((value, checks, layout))
    }

    /// Drops messages left behind by rules the settings no longer contain.
    fn retain_slots(&self, key: &FieldKey, layout: Layout) -> bool {
        write_lock(&self.state, "dropping stale validation messages")
            .fields
            .get_mut(key.as_str())
            .is_some_and(|record| record.sources.retain_slots(layout.required, layout.rules))
    }

    fn store_message(&self, key: &FieldKey, slot: Slot, message: Option<Message>) -> bool {
        write_lock(&self.state, "storing validation message")
            .ensure_record(key.as_str())
            .sources
            .set_slot(slot, message)
    }
}

/// Invokes the rule's check. A missing check, a panic or a rejected future all
/// count as a failure.
fn run_rule(rule: &Rule, value: &Value, more_values: Option<&Values>) -> Outcome {
    let Some(validate) = rule.validate.as_ref() else {
        return Outcome::Immediate(false);
    };
    match panic::catch_unwind(AssertUnwindSafe(|| validate(value, more_values))) {
        Ok(Outcome::Pending(check)) => Outcome::pending(AssertUnwindSafe(check).catch_unwind().map(
            |result| {
                result.unwrap_or_else(|_| {
                    tracing::warn!("async validation rule panicked");
                    false
                })
            },
        )),
        Ok(settled) => settled,
        Err(_) => {
            tracing::warn!("validation rule panicked");
            Outcome::Immediate(false)
        }
    }
}
