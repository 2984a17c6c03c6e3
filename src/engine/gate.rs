//! Single-shot completion gate with any number of waiters.
//!
//! The owner of a task holds the [`Signal`] and publishes the outcome exactly
//! once; everyone else clones a [`Waiter`] and suspends until that happens.
//! Outcomes are published through a `watch` channel, so whatever the owner
//! wrote before publishing is visible to a waiter once it wakes up.

use tokio::sync::watch;

use crate::error::ExecError;

pub(crate) type Outcome = Result<(), ExecError>;

pub(crate) fn gate() -> (Signal, Waiter) {
    let (tx, rx) = watch::channel(None);
    (Signal(tx), Waiter(rx))
}

pub(crate) struct Signal(watch::Sender<Option<Outcome>>);

impl Signal {
    /// Releases all current and future waiters.
    pub fn open(self, outcome: Outcome) {
        self.0.send_replace(Some(outcome));
    }
}

#[derive(Clone)]
pub(crate) struct Waiter(watch::Receiver<Option<Outcome>>);

impl Waiter {
    /// Suspends until the owner publishes. A signal dropped without
    /// publishing means the owner was cancelled, reported as
    /// [`ExecError::Abandoned`].
    pub async fn wait(mut self, name: &str) -> Outcome {
        match self.0.wait_for(Option::is_some).await {
            Ok(outcome) => outcome
                .as_ref()
                .cloned()
                .unwrap_or_else(|| Err(ExecError::Abandoned(name.to_string()))),
            Err(_) => Err(ExecError::Abandoned(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskFailure;

    #[tokio::test]
    async fn test_waiters_released_together() {
        let (signal, waiter) = gate();
        let first = tokio::spawn(waiter.clone().wait("a"));
        let second = tokio::spawn(waiter.clone().wait("a"));

        signal.open(Ok(()));

        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
        // Late waiters see the stored outcome too.
        assert!(waiter.wait("a").await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_reaches_waiters() {
        let (signal, waiter) = gate();
        signal.open(Err(ExecError::Task(
            "a".into(),
            TaskFailure::new(anyhow::anyhow!("boom")),
        )));

        let err = waiter.wait("a").await.unwrap_err();
        assert!(matches!(err, ExecError::Task(name, _) if name == "a"));
    }

    #[tokio::test]
    async fn test_dropped_signal_is_abandoned() {
        let (signal, waiter) = gate();
        drop(signal);

        let err = waiter.wait("a").await.unwrap_err();
        assert!(matches!(err, ExecError::Abandoned(name) if name == "a"));
    }
}
