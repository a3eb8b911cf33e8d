// SPDX-License-Identifier: MIT OR Apache-2.0
//! Default dataflow model backend.
//!
//! Owns the canonical node/edge tables, enforces name uniqueness,
//! answers endpoint-quadruple queries, and expands `meta`-declared
//! software dependencies after a node is committed.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::config;
use crate::library::{LibraryError, NodeTypeLibrary};
use crate::model::{GraphCommand, GraphModel};
use crate::node::{EdgeId, NodeId, NodeInfo};

/// Dataflow network model: name-unique nodes, unrestricted topology.
#[derive(Debug, Default)]
pub struct DataflowModel {
    library: NodeTypeLibrary,
    nodes: IndexMap<NodeId, Value>,
    edges: IndexMap<EdgeId, Value>,
    model_info: Value,
}

impl DataflowModel {
    /// Registry name of this backend
    pub const NAME: &'static str = "dataflow";

    /// Create a model over an already-populated type library
    pub fn new(library: NodeTypeLibrary) -> Self {
        Self {
            library,
            ..Self::default()
        }
    }

    /// Create a model and load its type catalog from a definition file
    pub fn with_definitions(path: &Path) -> Result<Self, LibraryError> {
        let mut library = NodeTypeLibrary::new();
        library.load_definitions(path)?;
        Ok(Self::new(library))
    }

    /// Borrow the stored data of the named node
    pub fn node_by_name(&self, name: &str) -> Option<&Value> {
        self.nodes
            .values()
            .find(|node| config::str_of(node, "name") == Some(name))
    }

    /// Borrow the owned type library
    pub fn library(&self) -> &NodeTypeLibrary {
        &self.library
    }

    /// Mutable access to the owned type library
    pub fn library_mut(&mut self) -> &mut NodeTypeLibrary {
        &mut self.library
    }

    /// Number of stored nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // Expand `meta`-declared software references into dependent
    // node/edge requests. Driven by the per-reference `once` flag so a
    // reference is instantiated a single time.
    fn expand_meta(node: &Value) -> Vec<GraphCommand> {
        let mut commands = Vec::new();
        let node_name = config::string_of(node, "name");
        for meta in config::items(node, "meta") {
            for software in config::items(meta, "software") {
                let reference = config::string_of(software, "reference");
                if reference.is_empty() {
                    continue;
                }
                let once = config::bool_of(software, "once").unwrap_or(true);
                if !once {
                    tracing::debug!(%reference, "non-once software reference skipped");
                    continue;
                }
                let dep_name = strip_suffix(&reference);
                commands.push(GraphCommand::AddNode {
                    type_name: reference.clone(),
                    name: dep_name.to_string(),
                    x: 0.0,
                    y: 0.0,
                });
                for connect in config::items(software, "connect") {
                    commands.push(GraphCommand::AddEdge(json!({
                        "fromNode": dep_name,
                        "fromNodeOutput": config::string_of(connect, "from"),
                        "toNode": node_name,
                        "toNodeInput": config::string_of(connect, "to"),
                        "weight": 1.0,
                        "ignore_for_sort": 0,
                        "decouple": true,
                    })));
                }
            }
        }
        commands
    }
}

/// Strip a trailing file suffix, keeping everything else.
fn strip_suffix(file: &str) -> &str {
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

impl GraphModel for DataflowModel {
    fn model_name(&self) -> &str {
        Self::NAME
    }

    fn add_node(&mut self, id: NodeId, node: &Value) -> bool {
        let name = config::string_of(node, "name");
        if self.has_node(&name) {
            return false;
        }
        self.nodes.insert(id, node.clone());
        true
    }

    fn add_edge(&mut self, id: EdgeId, edge: &Value) -> bool {
        self.edges.insert(id, edge.clone());
        true
    }

    fn has_edge(&self, edge: &Value) -> bool {
        self.edges.values().any(|stored| {
            stored.get("fromNode") == edge.get("fromNode")
                && stored.get("toNode") == edge.get("toNode")
                && stored.get("fromNodeOutput") == edge.get("fromNodeOutput")
                && stored.get("toNodeInput") == edge.get("toNodeInput")
        })
    }

    fn update_node(&mut self, id: NodeId, node: Value) -> bool {
        match self.nodes.get_mut(&id) {
            Some(stored) => {
                *stored = node;
                true
            }
            None => false,
        }
    }

    fn update_edge(&mut self, id: EdgeId, edge: Value) -> bool {
        match self.edges.get_mut(&id) {
            Some(stored) => {
                *stored = edge;
                true
            }
            None => false,
        }
    }

    fn remove_node(&mut self, id: NodeId) -> bool {
        self.nodes.shift_remove(&id);
        true
    }

    fn remove_edge(&mut self, id: EdgeId) -> bool {
        self.edges.shift_remove(&id);
        true
    }

    fn post_add_node(&mut self, id: NodeId) -> Vec<GraphCommand> {
        match self.nodes.get(&id) {
            Some(node) => Self::expand_meta(node),
            None => Vec::new(),
        }
    }

    fn load_subgraph_info(&mut self, filename: &str, base_path: &Path) -> bool {
        self.library.load_subgraph_info(filename, base_path)
    }

    fn scan_extern_nodes(&mut self, path: &str, root: Option<&Path>) {
        self.library.scan_extern_nodes(path, root);
    }

    fn node_info(&self, type_name: &str) -> Option<&NodeInfo> {
        self.library.lookup(type_name)
    }

    fn node_info_map(&self) -> &IndexMap<String, NodeInfo> {
        self.library.info_map()
    }

    fn has_node(&self, name: &str) -> bool {
        self.nodes
            .values()
            .any(|node| config::str_of(node, "name") == Some(name))
    }

    fn has_connection(&self, name: &str) -> bool {
        self.edges.values().any(|edge| {
            config::str_of(edge, "fromNode") == Some(name)
                || config::str_of(edge, "toNode") == Some(name)
        })
    }

    fn extern_node_path(&self) -> Option<&str> {
        self.library.extern_node_path()
    }

    fn set_model_info(&mut self, info: Value) {
        self.model_info = info;
    }

    fn model_info(&self) -> &Value {
        &self.model_info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Value {
        json!({"name": name, "type": "SIN"})
    }

    #[test]
    fn test_add_node_rejects_duplicate_name() {
        let mut model = DataflowModel::default();
        assert!(model.add_node(NodeId(1), &named("osc")));
        assert!(!model.add_node(NodeId(2), &named("osc")));
        assert!(model.add_node(NodeId(2), &named("osc2")));
        assert_eq!(model.node_count(), 2);
    }

    #[test]
    fn test_name_freed_after_removal_but_id_space_untouched() {
        let mut model = DataflowModel::default();
        assert!(model.add_node(NodeId(1), &named("osc")));
        assert!(model.remove_node(NodeId(1)));
        assert!(!model.has_node("osc"));
        assert!(model.add_node(NodeId(2), &named("osc")));
    }

    #[test]
    fn test_has_edge_matches_full_quadruple() {
        let mut model = DataflowModel::default();
        let edge = json!({
            "fromNode": "a", "fromNodeOutput": "out1",
            "toNode": "b", "toNodeInput": "in1",
        });
        assert!(model.add_edge(EdgeId(1), &edge));
        assert!(model.has_edge(&edge));

        let mut other = edge.clone();
        other["toNodeInput"] = json!("in2");
        assert!(!model.has_edge(&other));
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut model = DataflowModel::default();
        assert!(!model.update_node(NodeId(9), named("ghost")));
        assert!(!model.update_edge(EdgeId(9), json!({})));
    }

    #[test]
    fn test_has_connection() {
        let mut model = DataflowModel::default();
        model.add_edge(
            EdgeId(1),
            &json!({"fromNode": "a", "toNode": "b", "fromNodeOutput": "o", "toNodeInput": "i"}),
        );
        assert!(model.has_connection("a"));
        assert!(model.has_connection("b"));
        assert!(!model.has_connection("c"));
    }

    #[test]
    fn test_meta_expansion_emits_dependent_commands() {
        let mut model = DataflowModel::default();
        let node = json!({
            "name": "walker",
            "type": "SUBGRAPH",
            "meta": [{
                "software": [{
                    "reference": "controller.json",
                    "connect": [{"from": "cmd", "to": "in1"}],
                }],
            }],
        });
        assert!(model.add_node(NodeId(1), &node));
        let commands = model.post_add_node(NodeId(1));
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            GraphCommand::AddNode { type_name, name, .. } => {
                assert_eq!(type_name, "controller.json");
                assert_eq!(name, "controller");
            }
            other => panic!("expected AddNode, got {other:?}"),
        }
        match &commands[1] {
            GraphCommand::AddEdge(edge) => {
                assert_eq!(config::str_of(edge, "fromNode"), Some("controller"));
                assert_eq!(config::str_of(edge, "toNode"), Some("walker"));
                assert_eq!(config::str_of(edge, "toNodeInput"), Some("in1"));
            }
            other => panic!("expected AddEdge, got {other:?}"),
        }
    }

    #[test]
    fn test_meta_expansion_respects_once_flag() {
        let node = json!({
            "name": "n",
            "meta": [{"software": [{"reference": "x.json", "once": false}]}],
        });
        assert!(DataflowModel::expand_meta(&node).is_empty());
    }

    #[test]
    fn test_grouping_unsupported() {
        let mut model = DataflowModel::default();
        model.add_node(NodeId(1), &named("a"));
        model.add_node(NodeId(2), &named("b"));
        assert!(!model.group_nodes(Some(NodeId(1)), NodeId(2)));
    }
}
