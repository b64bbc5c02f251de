use std::fmt::{Debug, Formatter};
use std::future::{Future, IntoFuture};

use futures::FutureExt;
use futures::future::{self, BoxFuture};

/// Result of a validation step: either known right away or still settling.
///
/// Pending outcomes are lazy futures. They make progress only when awaited, or when
/// the controller has a spawner configured.
#[must_use = "pending validation outcomes only settle when awaited or spawned"]
pub enum Outcome {
    Immediate(bool),
    Pending(BoxFuture<'static, bool>),
}

impl Outcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = bool> + Send + 'static,
    {
        Outcome::Pending(future.boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending(_))
    }

    /// The settled value, or `None` while pending.
    pub fn immediate(&self) -> Option<bool> {
        match self {
            Outcome::Immediate(value) => Some(*value),
            Outcome::Pending(_) => None,
        }
    }

    /// Logical AND over every outcome.
    ///
    /// Stays `Immediate` when nothing is pending. Otherwise every pending outcome is
    /// awaited to completion, even once the result is known to be `false`.
    pub fn all(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
        let mut settled = true;
        let mut pending = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Immediate(value) => settled &= value,
                Outcome::Pending(future) => pending.push(future),
            }
        }
        if pending.is_empty() {
            return Outcome::Immediate(settled);
        }
        Outcome::pending(async move {
            let results = future::join_all(pending).await;
            settled && results.into_iter().all(|value| value)
        })
    }

    pub async fn resolve(self) -> bool {
        match self {
            Outcome::Immediate(value) => value,
            Outcome::Pending(future) => future.await,
        }
    }

    /// Blocks the current thread until the outcome settles.
    pub fn wait(self) -> bool {
        match self {
            Outcome::Immediate(value) => value,
            Outcome::Pending(future) => futures::executor::block_on(future),
        }
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        Outcome::Immediate(value)
    }
}

impl IntoFuture for Outcome {
    type Output = bool;
    type IntoFuture = BoxFuture<'static, bool>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Outcome::Immediate(value) => future::ready(value).boxed(),
            Outcome::Pending(future) => future,
        }
    }
}

impl Debug for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Immediate(value) => f.debug_tuple("Immediate").field(value).finish(),
            Outcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Return types accepted from rule functions.
///
/// An `Err` counts as a failed check; the error is logged and never propagated.
pub trait IntoPassed {
    fn into_passed(self) -> bool;
}

impl IntoPassed for bool {
    fn into_passed(self) -> bool {
        self
    }
}

impl<E> IntoPassed for Result<bool, E>
where
    E: std::fmt::Display,
{
    fn into_passed(self) -> bool {
        match self {
            Ok(passed) => passed,
            Err(error) => {
                tracing::debug!(%error, "validation rule rejected");
                false
            }
        }
    }
}
