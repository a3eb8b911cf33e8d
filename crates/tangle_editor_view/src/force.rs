// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental force-directed layout.
//!
//! Each step accumulates a repulsion force between overlapping sibling nodes
//! and an attraction force along edges, then moves every node by its summed
//! force. The first node in the arena acts as the anchor and never moves, so
//! repeated steps converge instead of drifting.

use std::collections::HashMap;

use indexmap::IndexMap;
use tangle_editor_graph::{EdgeId, NodeId};

use crate::view::{ViewEdge, ViewNode};

/// Extra spacing kept between node rectangles beyond their half extents.
const NODE_MARGIN: f64 = 20.0;
/// Target length of an edge between its two port anchors.
const EDGE_TARGET: f64 = 20.0;
/// Fraction of the distance error applied per step.
const GAIN: f64 = 0.1;
/// Distances below this are treated as coincident points.
const EPSILON: f64 = 1e-9;

/// Force accumulator reused across steps.
#[derive(Debug, Default)]
pub(crate) struct ForceLayout {
    fx: HashMap<NodeId, f64>,
    fy: HashMap<NodeId, f64>,
}

impl ForceLayout {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Runs one relaxation step over the given nodes and edges.
    pub(crate) fn step(
        &mut self,
        nodes: &mut IndexMap<NodeId, ViewNode>,
        edges: &IndexMap<EdgeId, ViewEdge>,
    ) {
        self.fx.clear();
        self.fy.clear();
        let Some(anchor) = nodes.keys().next().copied() else {
            return;
        };
        for id in nodes.keys() {
            self.fx.insert(*id, 0.0);
            self.fy.insert(*id, 0.0);
        }

        let ids: Vec<NodeId> = nodes.keys().copied().collect();
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let a = &nodes[&ids[i]];
                let b = &nodes[&ids[j]];
                // Grouped nodes only repel their siblings.
                if a.parent != b.parent {
                    continue;
                }
                let (ax1, ax2, ay1, ay2) = a.rectangle();
                let (bx1, bx2, by1, by2) = b.rectangle();
                let ca = ((ax1 + ax2) / 2.0, (ay1 + ay2) / 2.0);
                let cb = ((bx1 + bx2) / 2.0, (by1 + by2) / 2.0);
                let dx = ca.0 - cb.0;
                let dy = ca.1 - cb.1;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < EPSILON {
                    continue;
                }
                // wanted distance is half the diagonal of the summed boxes
                let sum_w = ax2 - ax1 + (bx2 - bx1);
                let sum_h = ay2 - ay1 + (by2 - by1);
                let wanted = (sum_w * sum_w + sum_h * sum_h).sqrt() / 2.0 + NODE_MARGIN;
                // Pushes apart only, never pulls together.
                let disp = (((dist - wanted) * GAIN) / dist).min(0.0);
                self.add_force(ids[i], dx * disp, dy * disp);
                self.add_force(ids[j], -dx * disp, -dy * disp);
            }
        }

        for edge in edges.values() {
            let Some(from) = nodes.get(&edge.from) else {
                continue;
            };
            let Some(to) = nodes.get(&edge.to) else {
                continue;
            };
            let start = from.out_port_pos(edge.from_port);
            let end = to.in_port_pos(edge.to_port);
            let dx = start.0 - end.0;
            let dy = start.1 - end.1;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < EPSILON {
                continue;
            }
            // Pulls together only, never pushes apart.
            let disp = (((dist - EDGE_TARGET) * GAIN) / dist).max(0.0);
            self.add_force(edge.from, dx * disp, dy * disp);
            self.add_force(edge.to, -dx * disp, -dy * disp);
        }

        self.fx.insert(anchor, 0.0);
        self.fy.insert(anchor, 0.0);

        for (id, node) in nodes.iter_mut() {
            let fx = self.fx.get(id).copied().unwrap_or(0.0);
            let fy = self.fy.get(id).copied().unwrap_or(0.0);
            node.pos.0 -= fx;
            node.pos.1 -= fy;
        }
    }

    fn add_force(&mut self, id: NodeId, fx: f64, fy: f64) {
        if let Some(f) = self.fx.get_mut(&id) {
            *f += fx;
        }
        if let Some(f) = self.fy.get_mut(&id) {
            *f += fy;
        }
    }
}
