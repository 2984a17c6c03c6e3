mod gate;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tracing::Instrument;

use crate::engine::gate::{Outcome, Signal, Waiter, gate};
use crate::error::{ExecError, TaskFailure};
use crate::outputs::Outputs;
use crate::registry::Registry;
use crate::task::Task;

/// Executor settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Reject graphs containing a cycle before any task body runs. With this
    /// turned off a cycle reachable from the terminal task never resolves.
    pub detect_cycles: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detect_cycles: true,
        }
    }
}

/// Resolves a [`Registry`] starting from its terminal task.
///
/// Every call to [`Executor::run`] uses fresh resolution state, so the same
/// executor and registry can be run any number of times.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    config: Config,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every task reachable from the terminal task, each exactly once.
    ///
    /// The algorithm works as follows:
    /// 1. The terminal task is the only registered task that no other task
    ///    lists as upstream.
    /// 2. Resolving a task first claims its gate. The first resolver to claim
    ///    it becomes the owner, everyone after that waits on the gate.
    /// 3. The owner resolves all upstream tasks concurrently, collects their
    ///    results in declaration order and runs the body with them.
    /// 4. The result is stored, then the gate is opened for the waiters.
    ///
    /// On failure no partial results are returned.
    pub async fn run<V>(&self, registry: &Registry<V>) -> Result<Outputs<V>, ExecError>
    where
        V: Clone + Send + Sync + 'static,
    {
        let terminal = registry.terminal()?;

        if self.config.detect_cycles {
            registry.check_acyclic()?;
        }

        tracing::info!(terminal, tasks = registry.len(), "resolving task graph");

        let resolution = Resolution::new(registry);
        resolution.resolve(terminal).await?;

        let results = resolution.into_results();
        tracing::info!(resolved = results.len(), "task graph complete");

        Ok(Outputs::new(terminal.to_string(), results))
    }
}

enum Claim {
    Owner(Signal),
    Waiter(Waiter),
}

/// State owned by a single run.
struct Resolution<'r, V> {
    registry: &'r Registry<V>,
    results: Mutex<HashMap<String, V>>,
    gates: Mutex<HashMap<String, Waiter>>,
}

impl<'r, V> Resolution<'r, V>
where
    V: Clone + Send + Sync + 'static,
{
    fn new(registry: &'r Registry<V>) -> Self {
        Self {
            registry,
            results: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn into_results(self) -> HashMap<String, V> {
        self.results
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn results(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically decides between owner and waiter for `name`.
    fn claim(&self, name: &str) -> Claim {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        match gates.entry(name.to_string()) {
            Entry::Occupied(entry) => Claim::Waiter(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (signal, waiter) = gate();
                entry.insert(waiter);
                Claim::Owner(signal)
            }
        }
    }

    fn resolve<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Outcome> {
        async move {
            let task = self.registry.get(name)?;

            match self.claim(name) {
                Claim::Waiter(waiter) => {
                    tracing::debug!(task = name, "already in flight, waiting");
                    waiter.wait(name).await
                }
                Claim::Owner(signal) => {
                    tracing::debug!(task = name, "claimed");
                    let outcome = self.execute(task).await;
                    signal.open(outcome.clone());
                    outcome
                }
            }
        }
        .boxed()
    }

    async fn execute(&self, task: &Arc<dyn Task<V>>) -> Outcome {
        let name = task.name();
        let upstream = task.upstream();

        try_join_all(upstream.iter().map(|dependency| self.resolve(dependency))).await?;

        let inputs = {
            let results = self.results();
            upstream
                .iter()
                .map(|dependency| {
                    results
                        .get(dependency)
                        .cloned()
                        .ok_or_else(|| ExecError::Abandoned(dependency.clone()))
                })
                .collect::<Result<Vec<V>, ExecError>>()?
        };

        // The body closure runs inside the guarded future too.
        let span = tracing::info_span!("task", name);
        let output = AssertUnwindSafe(async move { task.execute(inputs).await })
            .catch_unwind()
            .instrument(span)
            .await;

        let output = match output {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::error!(task = name, "task failed: {err:#}");
                return Err(ExecError::Task(name.to_string(), TaskFailure::from(err)));
            }
            Err(panic) => {
                let msg = if let Some(s) = panic.downcast_ref::<&str>() {
                    format!("Task panicked: {s}")
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    format!("Task panicked: {s}")
                } else {
                    String::from("Task panicked with unknown payload")
                };

                tracing::error!(task = name, "{msg}");
                return Err(ExecError::Task(
                    name.to_string(),
                    TaskFailure::new(anyhow::anyhow!(msg)),
                ));
            }
        };

        self.results().insert(name.to_string(), output);
        Ok(())
    }
}
