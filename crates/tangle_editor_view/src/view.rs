// SPDX-License-Identifier: MIT OR Apache-2.0

//! The graph view arena.
//!
//! [`GraphView`] owns the drawable state of one graph: nodes with positions,
//! edges with routing vertices, the active layout, the snapshot history and
//! the force layout accumulator. Every mutation is gated by the active
//! [`GraphModel`]; a rejected mutation leaves the arena untouched.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{json, Value};
use tangle_editor_graph::{config, node, EdgeId, GraphCommand, GraphModel, NodeId, NodeInfo};

use crate::force::ForceLayout;
use crate::history::History;
use crate::layout::{LayoutError, LayoutSnapshot, NodePosition, ViewTransform};

/// Width of a node rectangle.
const NODE_WIDTH: f64 = 150.0;
/// Height of the title area above the port rows.
const HEADER_HEIGHT: f64 = 30.0;
/// Height of one port row.
const PORT_ROW_HEIGHT: f64 = 20.0;

/// A node as placed in the view.
#[derive(Debug, Clone)]
pub struct ViewNode {
    pub(crate) data: Value,
    pub(crate) pos: (f64, f64),
    pub(crate) parent: Option<NodeId>,
    pub(crate) redraw_edges: bool,
}

impl ViewNode {
    fn new(data: Value, pos: (f64, f64)) -> Self {
        Self {
            data,
            pos,
            parent: None,
            redraw_edges: false,
        }
    }

    /// Name of the node.
    pub fn name(&self) -> &str {
        config::str_of(&self.data, "name").unwrap_or("")
    }

    /// Full configuration map of the node.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Current position of the top left corner.
    pub fn position(&self) -> (f64, f64) {
        self.pos
    }

    /// Moves the node to the given position.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.pos = (x, y);
    }

    /// Id of the enclosing group node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn num_inputs(&self) -> usize {
        config::items(&self.data, "inputs").len()
    }

    fn num_outputs(&self) -> usize {
        config::items(&self.data, "outputs").len()
    }

    /// Width and height of the node rectangle.
    pub fn size(&self) -> (f64, f64) {
        let rows = self.num_inputs().max(self.num_outputs());
        (NODE_WIDTH, HEADER_HEIGHT + rows as f64 * PORT_ROW_HEIGHT)
    }

    /// Bounding rectangle as (x1, x2, y1, y2).
    pub fn rectangle(&self) -> (f64, f64, f64, f64) {
        let (w, h) = self.size();
        (self.pos.0, self.pos.0 + w, self.pos.1, self.pos.1 + h)
    }

    /// Anchor point of the input port at `idx` on the left edge.
    pub fn in_port_pos(&self, idx: usize) -> (f64, f64) {
        (self.pos.0, self.port_row_y(idx))
    }

    /// Anchor point of the output port at `idx` on the right edge.
    pub fn out_port_pos(&self, idx: usize) -> (f64, f64) {
        (self.pos.0 + NODE_WIDTH, self.port_row_y(idx))
    }

    fn port_row_y(&self, idx: usize) -> f64 {
        self.pos.1 + HEADER_HEIGHT + idx as f64 * PORT_ROW_HEIGHT + PORT_ROW_HEIGHT / 2.0
    }

    /// Name of the input port at `idx`.
    pub fn in_port_name(&self, idx: usize) -> Option<&str> {
        config::items(&self.data, "inputs")
            .get(idx)
            .and_then(|p| config::str_of(p, "name"))
    }

    /// Name of the output port at `idx`.
    pub fn out_port_name(&self, idx: usize) -> Option<&str> {
        config::items(&self.data, "outputs")
            .get(idx)
            .and_then(|p| config::str_of(p, "name"))
    }

    fn in_port_index(&self, name: &str) -> Option<usize> {
        config::items(&self.data, "inputs")
            .iter()
            .position(|p| config::str_of(p, "name") == Some(name))
    }

    fn out_port_index(&self, name: &str) -> Option<usize> {
        config::items(&self.data, "outputs")
            .iter()
            .position(|p| config::str_of(p, "name") == Some(name))
    }
}

/// An edge as placed in the view, with resolved endpoint indices.
#[derive(Debug, Clone)]
pub struct ViewEdge {
    pub(crate) data: Value,
    pub(crate) from: NodeId,
    pub(crate) from_port: usize,
    pub(crate) to: NodeId,
    pub(crate) to_port: usize,
    pub(crate) start_offset: f64,
    pub(crate) end_offset: f64,
}

impl ViewEdge {
    /// Full configuration map of the edge.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Id of the source node.
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Id of the target node.
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Output port index on the source node.
    pub fn from_port(&self) -> usize {
        self.from_port
    }

    /// Input port index on the target node.
    pub fn to_port(&self) -> usize {
        self.to_port
    }

    /// Vertical offsets of the preserved route relative to the port anchors.
    pub fn route_offsets(&self) -> (f64, f64) {
        (self.start_offset, self.end_offset)
    }
}

/// Drawable graph state gated by a validation model.
pub struct GraphView {
    model: Box<dyn GraphModel>,
    model_name: String,
    nodes: IndexMap<NodeId, ViewNode>,
    edges: IndexMap<EdgeId, ViewEdge>,
    pub(crate) next_node_id: u64,
    pub(crate) next_edge_id: u64,
    pub(crate) next_order: u64,
    current_layout: LayoutSnapshot,
    history: History,
    force: ForceLayout,
    force_enabled: bool,
    default_spawn: (f64, f64),
    view_transform: ViewTransform,
    context_node: Option<NodeId>,
}

impl std::fmt::Debug for GraphView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphView")
            .field("model_name", &self.model_name)
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl GraphView {
    /// Creates an empty view gated by the given model.
    pub fn new(model: Box<dyn GraphModel>) -> Self {
        let model_name = model.model_name().to_string();
        Self {
            model,
            model_name,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            next_node_id: 1,
            next_edge_id: 1,
            next_order: 1,
            current_layout: LayoutSnapshot::new(),
            history: History::new(),
            force: ForceLayout::new(),
            force_enabled: false,
            default_spawn: (0.0, 0.0),
            view_transform: ViewTransform::default(),
            context_node: None,
        }
    }

    /// Replaces the validation model. The graph should be empty when
    /// switching, otherwise existing state is no longer gated consistently.
    pub fn set_model(&mut self, model: Box<dyn GraphModel>) {
        self.model_name = model.model_name().to_string();
        self.model = model;
    }

    /// The active validation model.
    pub fn model(&self) -> &dyn GraphModel {
        self.model.as_ref()
    }

    /// Mutable access to the active validation model.
    pub fn model_mut(&mut self) -> &mut dyn GraphModel {
        self.model.as_mut()
    }

    /// Name of the active validation model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Sets where nodes added without an explicit position appear.
    pub fn set_default_spawn(&mut self, x: f64, y: f64) {
        self.default_spawn = (x, y);
    }

    /// Marks a node as the current interaction context.
    pub fn set_context_node(&mut self, id: Option<NodeId>) {
        self.context_node = id;
    }

    /// The current interaction context, if any.
    pub fn context_node(&self) -> Option<NodeId> {
        self.context_node
    }

    /// Adds a node of a known type interactively.
    ///
    /// An empty `name` is derived from the type; a colliding name gets a
    /// numeric suffix. Position (0, 0) means "use the default spawn point",
    /// and a position stored in the current layout under the final name wins
    /// over both. Returns `None` when the type is unknown or the model
    /// rejects the node.
    pub fn add_node(&mut self, type_name: &str, name: &str, x: f64, y: f64) -> Option<NodeId> {
        let Some(info) = self.model.node_info(type_name) else {
            tracing::warn!(%type_name, "cannot add node of unknown type");
            return None;
        };
        let mut map = info.map.clone();
        let name = self.handle_node_name(name, type_name);
        map["name"] = json!(name);
        map["id"] = json!(self.next_node_id);
        let id = NodeId(self.next_node_id);
        if !self.model.add_node(id, &map) {
            return None;
        }
        self.next_node_id += 1;
        map["order"] = json!(self.next_order);
        self.next_order += 1;

        let (mut px, mut py) = if x == 0.0 && y == 0.0 {
            self.default_spawn
        } else {
            (x, y)
        };
        if let Some(p) = self.current_layout.positions.get(&name) {
            px = p.x;
            py = p.y;
        }
        self.nodes.insert(id, ViewNode::new(map, (px, py)));

        let commands = self.model.post_add_node(id);
        self.run_commands(commands);
        Some(id)
    }

    /// Adds a node from an already normalized template, as used by the
    /// loader.
    ///
    /// `id` of 0 requests a fresh id; a nonzero `id` is adopted and the id
    /// counter advanced past it. During a reload the node position refreshes
    /// an already tracked layout entry, during a plain load the layout entry
    /// overrides the node position. `on_load` suppresses follow-up commands
    /// from the model.
    pub fn add_node_from_info(
        &mut self,
        info: &mut NodeInfo,
        x: f64,
        y: f64,
        id: &mut u64,
        on_load: bool,
        reload: bool,
    ) -> Option<NodeId> {
        if *id >= self.next_node_id {
            self.next_node_id = *id + 1;
        } else if *id == 0 {
            *id = self.next_node_id;
            self.next_node_id += 1;
        }
        if let Some(order) = config::u64_of(&info.map, "order") {
            if order >= self.next_order {
                self.next_order = order + 1;
            }
        }

        let type_name = config::string_of(&info.map, "type");
        let given_name = config::string_of(&info.map, "name");
        let name = self.handle_node_name(&given_name, &type_name);
        info.map["name"] = json!(name);
        info.map["id"] = json!(*id);

        let node_id = NodeId(*id);
        if !self.model.add_node(node_id, &info.map) {
            return None;
        }

        let (mut px, mut py) = (x, y);
        if reload {
            // a reload only refreshes entries the layout already tracks
            if let Some(p) = self.current_layout.positions.get_mut(&name) {
                *p = NodePosition { x, y };
            }
        } else if let Some(p) = self.current_layout.positions.get(&name) {
            px = p.x;
            py = p.y;
        }

        let mut node = ViewNode::new(info.map.clone(), (px, py));
        node.redraw_edges = info.redraw_edges;
        self.nodes.insert(node_id, node);

        let parent_name = config::string_of(&info.map, "parentName");
        if !parent_name.is_empty() {
            let parent_id = self.node_id_by_name(&parent_name);
            if parent_id.is_some() && self.model.group_nodes(parent_id, node_id) {
                if let Some(n) = self.nodes.get_mut(&node_id) {
                    n.parent = parent_id;
                }
            } else {
                tracing::warn!(node = %name, parent = %parent_name, "ungrouping node, parent not accepted");
                info.map["parentName"] = json!("");
                if let Some(n) = self.nodes.get_mut(&node_id) {
                    n.data["parentName"] = json!("");
                }
            }
        }

        if !on_load {
            let commands = self.model.post_add_node(node_id);
            self.run_commands(commands);
        }
        Some(node_id)
    }

    /// Executes follow-up commands emitted by the model after a node was
    /// added. Targets that already exist are skipped.
    fn run_commands(&mut self, commands: Vec<GraphCommand>) {
        for command in commands {
            match command {
                GraphCommand::AddNode {
                    type_name,
                    name,
                    x,
                    y,
                } => {
                    if self.model.has_node(&name) {
                        continue;
                    }
                    self.add_node(&type_name, &name, x, y);
                }
                GraphCommand::AddEdge(edge) => {
                    if self.has_edge(&edge) {
                        continue;
                    }
                    self.add_edge(edge, false);
                }
            }
        }
    }

    /// Produces a unique node name.
    ///
    /// An empty name becomes the type name plus an integer counted up from 1.
    /// A colliding name is stripped of a trailing `_` plus three digits and
    /// re-suffixed with `_001`, `_002` and so on until it is free.
    fn handle_node_name(&self, name: &str, type_name: &str) -> String {
        let mut candidate = name.to_string();
        if candidate.is_empty() {
            let mut i = 1;
            candidate = format!("{type_name}{i}");
            while self.node_id_by_name(&candidate).is_some() {
                i += 1;
                candidate = format!("{type_name}{i}");
            }
            return candidate;
        }
        if self.node_id_by_name(&candidate).is_none() {
            return candidate;
        }
        let base = strip_numeric_suffix(&candidate).to_string();
        let mut i = 1;
        loop {
            candidate = format!("{base}_{i:03}");
            if self.node_id_by_name(&candidate).is_none() {
                return candidate;
            }
            i += 1;
        }
    }

    /// Adds an edge described by a configuration map with `fromNode`,
    /// `fromNodeOutput`, `toNode` and `toNodeInput` keys.
    ///
    /// Endpoints and ports are resolved before the model is consulted, so a
    /// failed resolution leaves the model untouched. Stored routing vertices
    /// are kept when neither endpoint had its port schema rebuilt; a reload
    /// trusts them unconditionally since snapshots are self-consistent.
    /// Otherwise the route is rebuilt from the current port anchors.
    pub fn add_edge(&mut self, mut edge: Value, reload: bool) -> Option<EdgeId> {
        for key in ["fromNode", "fromNodeOutput", "toNode", "toNodeInput"] {
            if !config::has_key(&edge, key) {
                tracing::warn!(key, "edge is missing required key");
                return None;
            }
        }
        let from_name = config::string_of(&edge, "fromNode");
        let to_name = config::string_of(&edge, "toNode");
        let out_port = config::string_of(&edge, "fromNodeOutput");
        let in_port = config::string_of(&edge, "toNodeInput");

        let Some((from_id, from_node)) = self.node_entry_by_name(&from_name) else {
            tracing::warn!(from = %from_name, "edge ignored, source node not found");
            return None;
        };
        let Some(from_port) = from_node.out_port_index(&out_port) else {
            tracing::warn!(from = %from_name, port = %out_port, "edge ignored, output port not found");
            return None;
        };
        let from_redraw = from_node.redraw_edges;
        let out_pos = from_node.out_port_pos(from_port);

        let Some((to_id, to_node)) = self.node_entry_by_name(&to_name) else {
            tracing::warn!(to = %to_name, "edge ignored, target node not found");
            return None;
        };
        let Some(to_port) = to_node.in_port_index(&in_port) else {
            tracing::warn!(to = %to_name, port = %in_port, "edge ignored, input port not found");
            return None;
        };
        let to_redraw = to_node.redraw_edges;
        let in_pos = to_node.in_port_pos(to_port);

        let id = EdgeId(self.next_edge_id);
        if !self.model.add_edge(id, &edge) {
            return None;
        }
        self.next_edge_id += 1;
        edge["id"] = json!(id.value());

        let mut start_offset = 0.0;
        let mut end_offset = 0.0;
        let stored = config::items(&edge, "vertices");
        if stored.len() >= 2 && (reload || (!from_redraw && !to_redraw)) {
            start_offset = config::f64_of(&stored[0], "y").unwrap_or(out_pos.1) - out_pos.1;
            let last = &stored[stored.len() - 1];
            end_offset = config::f64_of(last, "y").unwrap_or(in_pos.1) - in_pos.1;
        } else {
            let mut vertices = stored.to_vec();
            if vertices.len() < 2 {
                vertices.resize(2, json!({}));
            }
            vertices[0] = json!({"x": out_pos.0, "y": out_pos.1});
            let last = vertices.len() - 1;
            vertices[last] = json!({"x": in_pos.0, "y": in_pos.1});
            edge["vertices"] = Value::Array(vertices);
        }

        self.edges.insert(
            id,
            ViewEdge {
                data: edge,
                from: from_id,
                from_port,
                to: to_id,
                to_port,
                start_offset,
                end_offset,
            },
        );
        Some(id)
    }

    /// Removes a node and every edge touching it. Returns false when the
    /// node is unknown or the model rejects the removal.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        if !self.model.remove_node(id) {
            return false;
        }
        let dependent: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.from == id || e.to == id)
            .map(|(eid, _)| *eid)
            .collect();
        for eid in dependent {
            self.model.remove_edge(eid);
            self.edges.shift_remove(&eid);
        }
        self.nodes.shift_remove(&id);
        for n in self.nodes.values_mut() {
            if n.parent == Some(id) {
                n.parent = None;
                n.data["parentName"] = json!("");
            }
        }
        if self.context_node == Some(id) {
            self.context_node = None;
        }
        true
    }

    /// Removes the node with the given name.
    pub fn remove_node_by_name(&mut self, name: &str) -> bool {
        match self.node_id_by_name(name) {
            Some(id) => self.remove_node(id),
            None => false,
        }
    }

    /// Removes a single edge. Returns false when the edge is unknown or the
    /// model rejects the removal.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        if !self.edges.contains_key(&id) {
            return false;
        }
        if !self.model.remove_edge(id) {
            return false;
        }
        self.edges.shift_remove(&id);
        true
    }

    /// Whether an edge with the same endpoint quadruple already exists.
    pub fn has_edge(&self, edge: &Value) -> bool {
        for key in ["fromNode", "fromNodeOutput", "toNode", "toNodeInput"] {
            if !config::has_key(edge, key) {
                return false;
            }
        }
        self.model.has_edge(edge)
    }

    /// Puts `child_name` into the group `parent_name`, or ungroups it when
    /// `parent_name` is empty. Returns false when either node is unknown or
    /// the model rejects the grouping.
    pub fn group_nodes(&mut self, parent_name: &str, child_name: &str) -> bool {
        let Some(child_id) = self.node_id_by_name(child_name) else {
            return false;
        };
        let parent_id = if parent_name.is_empty() {
            None
        } else {
            match self.node_id_by_name(parent_name) {
                Some(id) => Some(id),
                None => return false,
            }
        };
        if !self.model.group_nodes(parent_id, child_id) {
            return false;
        }
        if let Some(n) = self.nodes.get_mut(&child_id) {
            n.parent = parent_id;
            n.data["parentName"] = json!(parent_name);
        }
        true
    }

    /// Replaces the configuration map of a named node, keeping its position.
    pub fn update_node_data(&mut self, name: &str, data: Value) -> bool {
        let Some(id) = self.node_id_by_name(name) else {
            return false;
        };
        if !self.model.update_node(id, data.clone()) {
            return false;
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.data = data;
        }
        true
    }

    /// Serializes the whole graph into one configuration map.
    ///
    /// Nodes are partitioned by marker type into `descriptions`, `meta` and
    /// `nodes` lists; positions are written into each entry. The map can be
    /// fed back through the loader to rebuild an equal graph.
    pub fn create_config_map(&self) -> Value {
        let mut conf = json!({"model": self.model.model_name()});
        if let Some(path) = self.model.extern_node_path() {
            conf["externNodePath"] = json!(path);
        }
        let mut nodes = Vec::new();
        let mut descriptions = Vec::new();
        let mut meta = Vec::new();
        for n in self.nodes.values() {
            let mut map = n.data.clone();
            map["pos"] = json!({"x": n.pos.0, "y": n.pos.1});
            match config::str_of(&map, "type") {
                Some(node::DES) => descriptions.push(map),
                Some(node::META) => meta.push(map),
                _ => nodes.push(map),
            }
        }
        if !nodes.is_empty() {
            conf["nodes"] = Value::Array(nodes);
        }
        if !descriptions.is_empty() {
            conf["descriptions"] = Value::Array(descriptions);
        }
        if !meta.is_empty() {
            conf["meta"] = Value::Array(meta);
        }
        let edges: Vec<Value> = self.edges.values().map(|e| e.data.clone()).collect();
        if !edges.is_empty() {
            conf["edges"] = Value::Array(edges);
        }
        conf
    }

    /// Removes every node and edge and resets the id and order counters.
    pub fn clear_graph(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            if !self.remove_node(id) {
                tracing::warn!(id = id.value(), "clearing graph stopped, node removal rejected");
                return;
            }
        }
        let eids: Vec<EdgeId> = self.edges.keys().copied().collect();
        for eid in eids {
            self.remove_edge(eid);
        }
        self.next_node_id = 1;
        self.next_edge_id = 1;
        self.next_order = 1;
    }

    /// Records the current graph as a history entry. Without a label the
    /// entry is named `history: N`.
    pub fn add_history_entry(&mut self, label: Option<&str>) {
        let label = match label {
            Some(l) => l.to_string(),
            None => format!("history: {}", self.history.len() + 1),
        };
        let snapshot = self.create_config_map();
        self.history.push(label, snapshot);
    }

    /// Replaces the current graph with the history entry at `index`.
    pub fn load_history(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index) else {
            return false;
        };
        let snapshot = entry.snapshot.clone();
        self.clear_graph();
        crate::loader::load_graph(self, &snapshot, None, true);
        true
    }

    /// Recorded history entries.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Copies every node position and the view transform into the current
    /// layout.
    pub fn capture_layout(&mut self) {
        self.current_layout.positions.clear();
        for n in self.nodes.values() {
            self.current_layout.positions.insert(
                n.name().to_string(),
                NodePosition {
                    x: n.pos.0,
                    y: n.pos.1,
                },
            );
        }
        self.current_layout.view = self.view_transform;
    }

    /// Moves nodes to the positions stored in the current layout and applies
    /// its view transform. Ungrouped nodes are placed before grouped ones so
    /// children land relative to already placed parents.
    pub fn restore_layout(&mut self) {
        let mut grouped = Vec::new();
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let has_parent = self.nodes.get(&id).map_or(false, |n| n.parent.is_some());
            if has_parent {
                grouped.push(id);
            } else {
                self.restore_node_position(id);
            }
        }
        for id in grouped {
            self.restore_node_position(id);
        }
        self.view_transform = self.current_layout.view;
    }

    fn restore_node_position(&mut self, id: NodeId) {
        let Some(name) = self.nodes.get(&id).map(|n| n.name().to_string()) else {
            return;
        };
        if let Some(p) = self.current_layout.positions.get(&name).copied() {
            if let Some(n) = self.nodes.get_mut(&id) {
                n.set_position(p.x, p.y);
            }
        }
    }

    /// Captures and returns the current layout.
    pub fn get_layout(&mut self) -> LayoutSnapshot {
        self.capture_layout();
        self.current_layout.clone()
    }

    /// Installs a layout and applies it to the graph.
    pub fn apply_layout(&mut self, layout: LayoutSnapshot) {
        self.current_layout = layout;
        self.restore_layout();
    }

    /// Captures the current layout and writes it to a file.
    pub fn save_layout(&mut self, path: &Path) -> Result<(), LayoutError> {
        self.capture_layout();
        self.current_layout.to_file(path)
    }

    /// Reads a layout file and applies it. A missing file is not an error.
    pub fn load_layout(&mut self, path: &Path) -> Result<(), LayoutError> {
        if !path.exists() {
            return Ok(());
        }
        let layout = LayoutSnapshot::from_file(path)?;
        self.apply_layout(layout);
        Ok(())
    }

    /// Enables or disables the force layout.
    pub fn set_force_layout(&mut self, enabled: bool) {
        self.force_enabled = enabled;
    }

    /// Whether the force layout is currently enabled.
    pub fn force_layout_enabled(&self) -> bool {
        self.force_enabled
    }

    /// Runs one force layout step when enabled.
    pub fn layout_step(&mut self) {
        if self.force_enabled {
            self.force.step(&mut self.nodes, &self.edges);
        }
    }

    /// Current pan and zoom of the view.
    pub fn view_transform(&self) -> ViewTransform {
        self.view_transform
    }

    /// Sets the pan and zoom of the view.
    pub fn set_view_transform(&mut self, transform: ViewTransform) {
        self.view_transform = transform;
    }

    /// Id of the node with the given name.
    pub fn node_id_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name() == name)
            .map(|(id, _)| *id)
    }

    fn node_entry_by_name(&self, name: &str) -> Option<(NodeId, &ViewNode)> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name() == name)
            .map(|(id, n)| (*id, n))
    }

    /// The node with the given id.
    pub fn node(&self, id: NodeId) -> Option<&ViewNode> {
        self.nodes.get(&id)
    }

    /// Name of the node with the given id.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(ViewNode::name)
    }

    /// Position of the node with the given id.
    pub fn node_position(&self, id: NodeId) -> Option<(f64, f64)> {
        self.nodes.get(&id).map(|n| n.pos)
    }

    /// The edge with the given id.
    pub fn edge(&self, id: EdgeId) -> Option<&ViewEdge> {
        self.edges.get(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ViewNode)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &ViewEdge)> {
        self.edges.iter().map(|(id, e)| (*id, e))
    }

    /// Number of nodes in the view.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the view.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Strips a trailing `_` plus exactly three ASCII digits from a name.
fn strip_numeric_suffix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() >= 4 {
        let tail = &bytes[bytes.len() - 4..];
        if tail[0] == b'_' && tail[1..].iter().all(u8::is_ascii_digit) {
            return &name[..name.len() - 4];
        }
    }
    name
}
