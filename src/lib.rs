//! Framework-agnostic form state: field values, interaction counters, validation
//! messages and change notifications.

pub mod form;

pub use form::{FormController, FormOptions, FormRegistry, Outcome, SetOptions};
