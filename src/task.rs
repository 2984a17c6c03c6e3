//! All the task-related abstractions.
use std::borrow::Cow;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

/// The core trait for all tasks in the registry.
///
/// Most users will register closures through [`Blueprint`](crate::Blueprint),
/// but any type implementing this trait can be added with
/// [`Blueprint::add`](crate::Blueprint::add).
pub trait Task<V>: Send + Sync {
    /// Unique name of the task.
    fn name(&self) -> &str;

    /// Names of the tasks this one depends on, in declaration order.
    fn upstream(&self) -> &[String];

    /// Runs the task body. `inputs` holds one result per upstream entry, in
    /// the same order as [`Task::upstream`].
    fn execute(&self, inputs: Vec<V>) -> BoxFuture<'static, anyhow::Result<V>>;
}

/// A task backed by an async closure.
pub(crate) struct TaskNode<F> {
    pub name: Cow<'static, str>,
    pub upstream: Vec<String>,
    pub callback: F,
}

impl<V, F, Fut> Task<V> for TaskNode<F>
where
    V: Send + 'static,
    F: Fn(Vec<V>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn upstream(&self) -> &[String] {
        &self.upstream
    }

    fn execute(&self, inputs: Vec<V>) -> BoxFuture<'static, anyhow::Result<V>> {
        (self.callback)(inputs).boxed()
    }
}
