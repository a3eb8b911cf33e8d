// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node and edge identities and the node-type catalog entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config;

/// Unique identifier for a node.
///
/// Allocated monotonically by the view; never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Get the raw id value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an edge, independent from node identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl EdgeId {
    /// Get the raw id value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type marker for nodes backed by an externally discovered definition file.
pub const EXTERN: &str = "EXTERN";
/// Type marker for nodes whose port schema comes from another graph file.
pub const SUBGRAPH: &str = "SUBGRAPH";
/// Type marker for graph input stubs (one output port).
pub const INPUT: &str = "INPUT";
/// Type marker for graph output stubs (input ports only).
pub const OUTPUT: &str = "OUTPUT";
/// Type marker for free-text description records.
pub const DES: &str = "DES";
/// Type marker for meta annotation records.
pub const META: &str = "META";

/// Default merge type for newly synthesized input ports.
pub const DEFAULT_MERGE: &str = "SUM";

/// A node-type catalog entry: the port schema plus the default data
/// template instantiated for every node of this type.
///
/// Also used as the carrier on the load path, where `redraw_edges`
/// records whether reconciliation rebuilt a port list and edges must be
/// re-resolved against shifted port indices.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Type name, unique within one library
    pub type_name: String,
    /// Number of input ports in the current schema
    pub num_inputs: usize,
    /// Number of output ports in the current schema
    pub num_outputs: usize,
    /// Default node data template (Config Tree)
    pub map: Value,
    /// Set when a stored port list was rebuilt against the library
    pub redraw_edges: bool,
}

impl NodeInfo {
    /// Create an entry from a data template, counting the port lists.
    pub fn from_template(type_name: impl Into<String>, map: Value) -> Self {
        let num_inputs = config::items(&map, "inputs").len();
        let num_outputs = config::items(&map, "outputs").len();
        Self {
            type_name: type_name.into(),
            num_inputs,
            num_outputs,
            map,
            redraw_edges: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_template_counts_ports() {
        let info = NodeInfo::from_template(
            "pipe",
            json!({
                "name": "",
                "inputs": [{"name": "in1"}, {"name": "in2"}],
                "outputs": [{"name": "out1"}],
            }),
        );
        assert_eq!(info.num_inputs, 2);
        assert_eq!(info.num_outputs, 1);
        assert!(!info.redraw_edges);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(NodeId(7).to_string(), "7");
        assert_eq!(EdgeId(9).value(), 9);
    }
}
