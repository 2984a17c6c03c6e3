use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use crate::error::BlueprintError;
use crate::registry::Registry;
use crate::task::{Task, TaskNode};

/// The blueprint for a task graph.
///
/// `Blueprint` is used to declare every task together with the names of the
/// tasks it depends on. Once configured, you convert it into an immutable
/// [`Registry`] which can then be handed to an [`Executor`](crate::Executor).
///
/// # Example
///
/// ```rust
/// use upstream::Blueprint;
///
/// let mut blueprint: Blueprint<u32> = Blueprint::new();
///
/// blueprint.task("one").run(|_| async { Ok(1) });
/// blueprint
///     .task("two")
///     .depends_on(["one"])
///     .run(|inputs| async move { Ok(inputs[0] + 1) });
///
/// let registry = blueprint.finish().unwrap();
/// assert_eq!(registry.len(), 2);
/// ```
pub struct Blueprint<V> {
    tasks: Vec<Arc<dyn Task<V>>>,
}

impl<V: Send + 'static> Blueprint<V> {
    /// Creates a new, empty blueprint.
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// The entry point for declaring a closure-backed task.
    pub fn task(&mut self, name: impl Into<Cow<'static, str>>) -> TaskDef<'_, V> {
        TaskDef {
            blueprint: self,
            name: name.into(),
        }
    }

    /// Adds a hand-written [`Task`] implementation.
    pub fn add<T>(&mut self, task: T) -> &mut Self
    where
        T: Task<V> + 'static,
    {
        self.tasks.push(Arc::new(task));
        self
    }

    /// Freezes the blueprint into a [`Registry`].
    ///
    /// Upstream names are not checked here, an unregistered upstream is
    /// reported when the executor first tries to resolve it.
    pub fn finish(self) -> Result<Registry<V>, BlueprintError> {
        Registry::new(self.tasks)
    }
}

impl<V: Send + 'static> Default for Blueprint<V> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TaskDef<'a, V> {
    blueprint: &'a mut Blueprint<V>,
    name: Cow<'static, str>,
}

impl<'a, V: Send + 'static> TaskDef<'a, V> {
    pub fn depends_on<I, S>(self, upstream: I) -> TaskBinder<'a, V>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskBinder {
            blueprint: self.blueprint,
            name: self.name,
            upstream: upstream.into_iter().map(Into::into).collect(),
        }
    }

    /// Registers a task without upstream dependencies. The body receives an
    /// empty input list.
    pub fn run<F, Fut>(self, callback: F)
    where
        F: Fn(Vec<V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.blueprint.add(TaskNode {
            name: self.name,
            upstream: Vec::new(),
            callback,
        });
    }
}

pub struct TaskBinder<'a, V> {
    blueprint: &'a mut Blueprint<V>,
    name: Cow<'static, str>,
    upstream: Vec<String>,
}

impl<V: Send + 'static> TaskBinder<'_, V> {
    /// Appends one more upstream name after the ones already declared.
    pub fn and(mut self, name: impl Into<String>) -> Self {
        self.upstream.push(name.into());
        self
    }

    /// Registers the task. The body receives one input per upstream name, in
    /// declaration order.
    pub fn run<F, Fut>(self, callback: F)
    where
        F: Fn(Vec<V>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        self.blueprint.add(TaskNode {
            name: self.name,
            upstream: self.upstream,
            callback,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_task_rejected() {
        let mut blueprint: Blueprint<()> = Blueprint::new();
        blueprint.task("a").run(|_| async { Ok(()) });
        blueprint.task("a").run(|_| async { Ok(()) });

        let err = blueprint.finish().err().unwrap();
        assert!(matches!(err, BlueprintError::DuplicateTask(name) if name == "a"));
    }

    #[test]
    fn test_upstream_declaration_order() {
        let mut blueprint: Blueprint<()> = Blueprint::new();
        blueprint
            .task("d")
            .depends_on(["c", "a"])
            .and("b")
            .run(|_| async { Ok(()) });

        let registry = blueprint.finish().unwrap();
        assert_eq!(registry.get("d").unwrap().upstream(), ["c", "a", "b"]);
    }

    struct Constant(String, u8);

    impl Task<u8> for Constant {
        fn name(&self) -> &str {
            &self.0
        }

        fn upstream(&self) -> &[String] {
            &[]
        }

        fn execute(&self, _: Vec<u8>) -> futures::future::BoxFuture<'static, anyhow::Result<u8>> {
            let value = self.1;
            Box::pin(async move { Ok(value) })
        }
    }

    #[tokio::test]
    async fn test_hand_written_task() {
        let mut blueprint = Blueprint::new();
        blueprint.add(Constant("seven".into(), 7));

        let registry = blueprint.finish().unwrap();
        let outputs = crate::run(&registry).await.unwrap();
        assert_eq!(outputs.get("seven"), Some(&7));
    }
}
