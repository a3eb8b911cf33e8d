// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph model contract: the validation gate every mutation passes
//! through before the view commits any visual state.
//!
//! Models are polymorphic; different domains back the same graph
//! surface with different validity rules, selected by name at runtime
//! through the [`ModelRegistry`].

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::node::{EdgeId, NodeId, NodeInfo};

/// Follow-up mutation a model requests after a node was committed.
///
/// `post_add_node` returns these instead of mutating the view directly;
/// the view executes them once the triggering node is fully wired,
/// skipping requests whose target already exists.
#[derive(Debug, Clone)]
pub enum GraphCommand {
    /// Instantiate a node of `type_name` named `name`
    AddNode {
        /// Node type to instantiate
        type_name: String,
        /// Name for the new node
        name: String,
        /// Spawn position
        x: f64,
        /// Spawn position
        y: f64,
    },
    /// Wire an edge from its endpoint quadruple
    AddEdge(Value),
}

/// Validation gate and canonical data owner for one graph.
pub trait GraphModel {
    /// Stable model name, used for registry selection and persistence
    fn model_name(&self) -> &str;

    /// Validate and record a node. Rejects when a node with the same
    /// `name` already exists.
    fn add_node(&mut self, id: NodeId, node: &Value) -> bool;

    /// Validate and record an edge keyed by id. Node/port existence is
    /// the view's responsibility; implementations only enforce
    /// domain-specific topology rules.
    fn add_edge(&mut self, id: EdgeId, edge: &Value) -> bool;

    /// True iff an existing edge matches on all four of
    /// (`fromNode`, `toNode`, `fromNodeOutput`, `toNodeInput`).
    fn has_edge(&self, edge: &Value) -> bool;

    /// Replace a node's stored attributes wholesale; no-op on unknown id
    fn update_node(&mut self, id: NodeId, node: Value) -> bool;

    /// Replace an edge's stored attributes wholesale; no-op on unknown id
    fn update_edge(&mut self, id: EdgeId, edge: Value) -> bool;

    /// Remove a node from the owned table
    fn remove_node(&mut self, id: NodeId) -> bool;

    /// Remove an edge from the owned table
    fn remove_edge(&mut self, id: EdgeId) -> bool;

    /// Post-commit hook, invoked once a node is fully wired into the
    /// view. Returns dependent mutations to apply (for example
    /// `meta`-declared software nodes); runs only on first add, never
    /// when loading a persisted file.
    fn post_add_node(&mut self, id: NodeId) -> Vec<GraphCommand>;

    /// Establish (`Some(parent)`) or clear (`None`) a parent/child
    /// grouping. Models without grouping support return false
    /// unconditionally, signaling the caller to reset the parent
    /// reference.
    fn group_nodes(&mut self, _parent: Option<NodeId>, _child: NodeId) -> bool {
        false
    }

    /// Register a subgraph file as a node type; false when already
    /// registered or the file is unusable.
    fn load_subgraph_info(&mut self, _filename: &str, _base_path: &Path) -> bool {
        false
    }

    /// Scan a directory for extern node definitions
    fn scan_extern_nodes(&mut self, _path: &str, _root: Option<&Path>) {}

    /// Look up a node type definition
    fn node_info(&self, type_name: &str) -> Option<&NodeInfo>;

    /// The full node-type catalog this model resolves against
    fn node_info_map(&self) -> &IndexMap<String, NodeInfo>;

    /// True if a type definition with this name is registered
    fn has_node_info(&self, type_name: &str) -> bool {
        self.node_info(type_name).is_some()
    }

    /// True if a live node carries this name
    fn has_node(&self, name: &str) -> bool;

    /// True if any edge starts or ends at the named node
    fn has_connection(&self, name: &str) -> bool;

    /// Extern scan path to persist with the graph, if any
    fn extern_node_path(&self) -> Option<&str> {
        None
    }

    /// Attach model-level info carried through the persisted file
    fn set_model_info(&mut self, info: Value);

    /// Model-level info carried through the persisted file
    fn model_info(&self) -> &Value;
}

/// Factory producing a fresh model with its own type catalog.
pub type ModelFactory = Box<dyn Fn() -> Box<dyn GraphModel>>;

/// Name-to-factory registry for runtime model selection.
///
/// Every `create` call builds an independent model instance, so
/// multiple open graphs never share or race on a type catalog.
#[derive(Default)]
pub struct ModelRegistry {
    factories: IndexMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model factory under its name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn GraphModel> + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Build a fresh model instance by name
    pub fn create(&self, name: &str) -> Option<Box<dyn GraphModel>> {
        self.factories.get(name).map(|f| f())
    }

    /// Registered model names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
