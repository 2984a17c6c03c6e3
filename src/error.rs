use std::sync::Arc;

use thiserror::Error;

/// A failure raised by a task body, shared between every resolver waiting on
/// that task.
#[derive(Debug, Error, Clone)]
#[error(transparent)]
pub struct TaskFailure(#[from] pub(crate) Arc<anyhow::Error>);

impl TaskFailure {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(Arc::new(err.into()))
    }

    /// The underlying error returned by the task body.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(e: anyhow::Error) -> Self {
        TaskFailure(Arc::new(e))
    }
}

#[derive(Debug, Error, Clone)]
pub enum ExecError {
    #[error("Task '{0}' is not registered")]
    UnknownTask(String),

    #[error("No terminal task: every task is an upstream of another task")]
    NoTerminalTask,

    #[error("Ambiguous terminal task, candidates: {}", .0.join(", "))]
    AmbiguousTerminalTask(Vec<String>),

    #[error("Cycle detected in task graph at '{0}'")]
    Cycle(String),

    #[error("Task '{0}':\n{1}")]
    Task(String, TaskFailure),

    #[error("Task '{0}' was abandoned before it completed")]
    Abandoned(String),
}

impl ExecError {
    /// Name of the task this error is attributed to, if any.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            ExecError::UnknownTask(name)
            | ExecError::Cycle(name)
            | ExecError::Task(name, _)
            | ExecError::Abandoned(name) => Some(name),
            ExecError::NoTerminalTask | ExecError::AmbiguousTerminalTask(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("Task '{0}' is registered more than once")]
    DuplicateTask(String),
}
