// SPDX-License-Identifier: MIT OR Apache-2.0
//! Component-network model backend.
//!
//! Same graph surface as the dataflow model, stricter topology rules:
//! duplicate parallel edges and cycles are rejected at `add_edge` time,
//! and parent/child grouping is supported.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::config;
use crate::library::NodeTypeLibrary;
use crate::model::{GraphCommand, GraphModel};
use crate::node::{EdgeId, NodeId, NodeInfo};

/// Component network model: acyclic topology, grouping support.
#[derive(Debug, Default)]
pub struct ComponentModel {
    library: NodeTypeLibrary,
    nodes: IndexMap<NodeId, Value>,
    edges: IndexMap<EdgeId, Value>,
    parents: IndexMap<NodeId, NodeId>,
    model_info: Value,
}

impl ComponentModel {
    /// Registry name of this backend
    pub const NAME: &'static str = "component";

    /// Create a model over an already-populated type library
    pub fn new(library: NodeTypeLibrary) -> Self {
        Self {
            library,
            ..Self::default()
        }
    }

    /// The registered parent of a node, if grouped
    pub fn parent_of(&self, child: NodeId) -> Option<NodeId> {
        self.parents.get(&child).copied()
    }

    // Depth-first reachability over edge endpoints by node name,
    // adapted from the evaluation-order cycle check.
    fn reaches(&self, from: &str, target: &str, visited: &mut HashSet<String>) -> bool {
        if from == target {
            return true;
        }
        if !visited.insert(from.to_string()) {
            return false;
        }
        self.edges
            .values()
            .filter(|edge| config::str_of(edge, "fromNode") == Some(from))
            .any(|edge| {
                let next = config::string_of(edge, "toNode");
                self.reaches(&next, target, visited)
            })
    }

    fn would_cycle(&self, edge: &Value) -> bool {
        let from = config::string_of(edge, "fromNode");
        let to = config::string_of(edge, "toNode");
        if from.is_empty() || to.is_empty() {
            return false;
        }
        self.reaches(&to, &from, &mut HashSet::new())
    }
}

impl GraphModel for ComponentModel {
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
        if self.has_edge(edge) {
            tracing::warn!("rejected duplicate parallel edge");
            return false;
        }
        if self.would_cycle(edge) {
            tracing::warn!(
                from = %config::string_of(edge, "fromNode"),
                to = %config::string_of(edge, "toNode"),
                "rejected edge that would create a cycle"
            );
            return false;
        }
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
        self.parents.shift_remove(&id);
        // node may have been a group parent
        self.parents.retain(|_, parent| *parent != id);
        true
    }

    fn remove_edge(&mut self, id: EdgeId) -> bool {
        self.edges.shift_remove(&id);
        true
    }

    fn post_add_node(&mut self, _id: NodeId) -> Vec<GraphCommand> {
        Vec::new()
    }

    fn group_nodes(&mut self, parent: Option<NodeId>, child: NodeId) -> bool {
        if !self.nodes.contains_key(&child) {
            return false;
        }
        match parent {
            Some(parent) => {
                if !self.nodes.contains_key(&parent) || parent == child {
                    return false;
                }
                self.parents.insert(child, parent);
            }
            None => {
                self.parents.shift_remove(&child);
            }
        }
        true
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
    use serde_json::json;

    fn edge(from: &str, to: &str) -> Value {
        json!({
            "fromNode": from, "fromNodeOutput": "out1",
            "toNode": to, "toNodeInput": "in1",
        })
    }

    fn node(name: &str) -> Value {
        json!({"name": name, "type": "task"})
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut model = ComponentModel::default();
        assert!(model.add_edge(EdgeId(1), &edge("a", "b")));
        assert!(!model.add_edge(EdgeId(2), &edge("a", "b")));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut model = ComponentModel::default();
        assert!(model.add_edge(EdgeId(1), &edge("a", "b")));
        assert!(model.add_edge(EdgeId(2), &edge("b", "c")));
        assert!(!model.add_edge(EdgeId(3), &edge("c", "a")));
        // non-cyclic additions still pass
        assert!(model.add_edge(EdgeId(4), &edge("a", "c")));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut model = ComponentModel::default();
        assert!(!model.add_edge(EdgeId(1), &edge("a", "a")));
    }

    #[test]
    fn test_grouping() {
        let mut model = ComponentModel::default();
        model.add_node(NodeId(1), &node("deployment"));
        model.add_node(NodeId(2), &node("task"));

        assert!(model.group_nodes(Some(NodeId(1)), NodeId(2)));
        assert_eq!(model.parent_of(NodeId(2)), Some(NodeId(1)));

        // ungroup via empty parent
        assert!(model.group_nodes(None, NodeId(2)));
        assert_eq!(model.parent_of(NodeId(2)), None);

        // unknown participants fail
        assert!(!model.group_nodes(Some(NodeId(9)), NodeId(2)));
        assert!(!model.group_nodes(Some(NodeId(1)), NodeId(9)));
    }

    #[test]
    fn test_removing_parent_clears_grouping() {
        let mut model = ComponentModel::default();
        model.add_node(NodeId(1), &node("deployment"));
        model.add_node(NodeId(2), &node("task"));
        model.group_nodes(Some(NodeId(1)), NodeId(2));
        model.remove_node(NodeId(1));
        assert_eq!(model.parent_of(NodeId(2)), None);
    }
}
