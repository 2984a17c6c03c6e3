//! The immutable task registry.
//!
//! A [`Registry`] is produced by [`Blueprint::finish`](crate::Blueprint::finish)
//! and never changes afterwards. Under the hood every task becomes a node in a
//! `petgraph` graph, with an edge from each upstream task to its dependent.
//! Edges are only created between registered tasks; an upstream name without
//! a matching task stays in the task's declaration and is reported as
//! [`ExecError::UnknownTask`] once the executor reaches it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::Graph;
use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;

use crate::error::{BlueprintError, ExecError};
use crate::task::Task;

pub struct Registry<V> {
    graph: Graph<Arc<dyn Task<V>>, ()>,
    index: HashMap<String, NodeIndex>,
}

impl<V> Registry<V> {
    pub(crate) fn new(tasks: Vec<Arc<dyn Task<V>>>) -> Result<Self, BlueprintError> {
        let mut graph = Graph::with_capacity(tasks.len(), tasks.len());
        let mut index = HashMap::with_capacity(tasks.len());

        for task in tasks {
            let name = task.name().to_string();
            if index.contains_key(&name) {
                return Err(BlueprintError::DuplicateTask(name));
            }
            let node = graph.add_node(task);
            index.insert(name, node);
        }

        for node in graph.node_indices() {
            let dependencies: Vec<NodeIndex> = graph[node]
                .upstream()
                .iter()
                .filter_map(|name| index.get(name).copied())
                .collect();

            for dependency in dependencies {
                graph.add_edge(dependency, node, ());
            }
        }

        Ok(Self { graph, index })
    }

    /// Looks a task up by name.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Task<V>>, ExecError> {
        self.index
            .get(name)
            .map(|&node| &self.graph[node])
            .ok_or_else(|| ExecError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every registered task, in registration order.
    pub fn list_all(&self) -> impl Iterator<Item = &Arc<dyn Task<V>>> {
        self.graph.node_indices().map(|node| &self.graph[node])
    }

    /// Every registered task name, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.list_all().map(|task| task.name())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// `(upstream, dependent)` pairs between registered tasks, for rendering
    /// the dependency graph elsewhere.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.raw_edges().iter().map(|edge| {
            (
                self.graph[edge.source()].name(),
                self.graph[edge.target()].name(),
            )
        })
    }

    /// Renders the dependency graph in Graphviz DOT format, one node per task
    /// labelled with its name and one edge per upstream link.
    pub fn to_dot(&self) -> String {
        let names = self.graph.map(|_, task| task.name(), |_, _| "");
        Dot::with_config(&names, &[Config::EdgeNoLabel]).to_string()
    }

    /// Finds the unique task that no other task lists as upstream.
    pub fn terminal(&self) -> Result<&str, ExecError> {
        let referenced: HashSet<&str> = self
            .list_all()
            .flat_map(|task| task.upstream().iter().map(String::as_str))
            .collect();

        let mut candidates: Vec<&str> = self
            .names()
            .filter(|name| !referenced.contains(name))
            .collect();

        match candidates.len() {
            0 => Err(ExecError::NoTerminalTask),
            1 => Ok(candidates.remove(0)),
            _ => Err(ExecError::AmbiguousTerminalTask(
                candidates.into_iter().map(String::from).collect(),
            )),
        }
    }

    /// Topological feasibility check over the whole registry.
    pub fn check_acyclic(&self) -> Result<(), ExecError> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|cycle| ExecError::Cycle(self.graph[cycle.node_id()].name().to_string()))
    }
}
