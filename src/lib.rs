#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod blueprint;
mod engine;
mod error;
mod outputs;
mod registry;
mod task;
#[cfg(feature = "logging")]
mod utils;

pub use crate::blueprint::{Blueprint, TaskBinder, TaskDef};
pub use crate::engine::{Config, Executor};
pub use crate::error::*;
pub use crate::outputs::Outputs;
pub use crate::registry::Registry;
pub use crate::task::Task;
#[cfg(feature = "logging")]
pub use crate::utils::init_logging;

/// Runs `registry` with the default [`Config`].
pub async fn run<V>(registry: &Registry<V>) -> Result<Outputs<V>, ExecError>
where
    V: Clone + Send + Sync + 'static,
{
    Executor::new().run(registry).await
}
