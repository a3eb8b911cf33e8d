// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading and saving persisted graphs.
//!
//! A persisted graph is one configuration map with `model`, optional
//! `externNodePath`, node lists (`nodes`, `descriptions`, `meta`) and an
//! `edges` list. Loading normalizes legacy entries, reconciles extern and
//! subgraph nodes against the current type library and feeds everything
//! through the view so the model gates every entry. Malformed entries are
//! logged and skipped, never fatal.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tangle_editor_graph::{
    config, node, reconcile_ports, DataflowModel, ModelRegistry, NodeId, NodeInfo,
};

use crate::view::GraphView;

/// Errors raised while reading or writing a graph file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The graph file could not be read or written.
    #[error("graph file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The graph file did not contain valid JSON.
    #[error("graph file parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads persisted graphs into a view, switching models through a registry.
#[derive(Debug)]
pub struct GraphLoader<'a> {
    registry: &'a ModelRegistry,
}

impl<'a> GraphLoader<'a> {
    /// Creates a loader over the given model registry.
    pub fn new(registry: &'a ModelRegistry) -> Self {
        Self { registry }
    }

    /// Reads a graph file and loads it into the view.
    pub fn load_file(&self, view: &mut GraphView, path: &Path) -> Result<(), LoadError> {
        let text = fs::read_to_string(path)?;
        let map: Value = serde_json::from_str(&text)?;
        self.load(view, &map, path.parent(), false);
        Ok(())
    }

    /// Loads a configuration map into the view.
    ///
    /// On a plain load the `model` entry may switch the active model through
    /// the registry and `externNodePath` triggers a library scan, both
    /// relative to `load_path`. A reload skips the model and library setup
    /// and replays the map into the already configured view.
    pub fn load(&self, view: &mut GraphView, map: &Value, load_path: Option<&Path>, reload: bool) {
        if !reload {
            if let Some(model_name) = config::str_of(map, "model") {
                if model_name != view.model_name() {
                    match self.registry.create(model_name) {
                        Some(model) => view.set_model(model),
                        None => {
                            tracing::warn!(model = %model_name, "unknown model, keeping current one")
                        }
                    }
                }
            }
            if let Some(dir) = config::str_of(map, "externNodePath") {
                view.model_mut().scan_extern_nodes(dir, load_path);
            }
        }
        load_graph(view, map, load_path, reload);
    }

    /// Serializes the view into a graph file.
    ///
    /// Nodes are written in `order`, and subgraph references are folded into
    /// a single path relative to the file so the graph stays relocatable.
    pub fn save(&self, view: &GraphView, path: &Path) -> Result<(), LoadError> {
        let mut map = view.create_config_map();
        for key in ["nodes", "descriptions", "meta"] {
            if let Some(Value::Array(list)) = map.get_mut(key) {
                list.sort_by_key(|n| config::u64_of(n, "order").unwrap_or(u64::MAX));
                for entry in list.iter_mut() {
                    relativize_subgraph(entry, path.parent());
                }
            }
        }
        fs::write(path, serde_json::to_string_pretty(&map)?)?;
        Ok(())
    }
}

/// Replays a configuration map into the view. Shared by the loader and by
/// history restoration, which runs it as a reload.
pub(crate) fn load_graph(view: &mut GraphView, map: &Value, load_path: Option<&Path>, reload: bool) {
    for key in ["nodes", "descriptions", "meta"] {
        for entry in config::items(map, key) {
            if load_node(view, entry, load_path, reload).is_none() {
                tracing::warn!(
                    name = %config::string_of(entry, "name"),
                    "node entry could not be loaded"
                );
            }
        }
    }
    for entry in config::items(map, "edges") {
        let edge = translate_legacy_edge(view, entry.clone());
        if view.add_edge(edge, reload).is_none() {
            tracing::warn!(
                from = %config::string_of(entry, "fromNode"),
                to = %config::string_of(entry, "toNode"),
                "edge entry could not be loaded"
            );
        }
    }
}

fn load_node(
    view: &mut GraphView,
    entry: &Value,
    load_path: Option<&Path>,
    reload: bool,
) -> Option<NodeId> {
    // Normalization indexes into the entry, anything but an object is junk.
    if !entry.is_object() {
        return None;
    }
    let type_name = config::string_of(entry, "type");
    let mut info = NodeInfo::from_template(type_name, entry.clone());
    normalize_node(view, &mut info, load_path, reload);
    info.map["order"] = json!(view.next_order);

    let mut id = config::u64_of(entry, "id").unwrap_or(0);
    let pos = entry.get("pos");
    let x = pos.and_then(|p| config::f64_of(p, "x")).unwrap_or(0.0);
    let y = pos.and_then(|p| config::f64_of(p, "y")).unwrap_or(0.0);
    view.add_node_from_info(&mut info, x, y, &mut id, true, reload)
}

/// Brings a stored node entry up to the current schema before it is added.
fn normalize_node(
    view: &mut GraphView,
    info: &mut NodeInfo,
    load_path: Option<&Path>,
    reload: bool,
) {
    match config::string_of(&info.map, "type").as_str() {
        node::INPUT => {
            // A graph input is drawn with exactly one output port.
            if config::items(&info.map, "outputs").is_empty() {
                info.map["outputs"] = json!([{"name": "out1"}]);
            } else {
                info.map["outputs"][0]["name"] = json!("out1");
            }
        }
        node::OUTPUT => {
            backfill_port_names(&mut info.map, "inputs", "in");
        }
        node::EXTERN => {
            let extern_name = config::string_of(&info.map, "extern_name");
            match view.model().node_info(&extern_name).cloned() {
                Some(lib) => {
                    seed_missing_ports(&mut info.map, &lib);
                    if !reload {
                        info.redraw_edges = reconcile_ports(&mut info.map, &lib);
                    }
                }
                None => {
                    tracing::warn!(%extern_name, "extern node type not in library, keeping stored ports");
                }
            }
        }
        node::SUBGRAPH => {
            normalize_subgraph(view, info, load_path, reload);
        }
        node::DES | node::META => {}
        _ => {
            backfill_port_names(&mut info.map, "inputs", "in");
            backfill_port_names(&mut info.map, "outputs", "out");
            backfill_single_output(view, &mut info.map);
        }
    }
    info.num_inputs = config::items(&info.map, "inputs").len();
    info.num_outputs = config::items(&info.map, "outputs").len();
}

fn normalize_subgraph(
    view: &mut GraphView,
    info: &mut NodeInfo,
    load_path: Option<&Path>,
    reload: bool,
) {
    let name = config::string_of(&info.map, "subgraph_name");
    let stored_dir = config::string_of(&info.map, "path");
    let (dir, file) = if stored_dir.is_empty() {
        // The stored name may be a path relative to the graph file.
        let full = match load_path {
            Some(base) => base.join(&name),
            None => PathBuf::from(&name),
        };
        let dir = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(name);
        (dir, file)
    } else {
        (PathBuf::from(stored_dir), name)
    };
    view.model_mut().load_subgraph_info(&file, &dir);
    info.map["subgraph_name"] = json!(file);
    info.map["path"] = json!(dir.display().to_string());

    if let Some(lib) = view.model().node_info(&file).cloned() {
        seed_missing_ports(&mut info.map, &lib);
        if !reload {
            info.redraw_edges = reconcile_ports(&mut info.map, &lib);
        }
    } else {
        tracing::warn!(subgraph = %file, "subgraph type not in library, keeping stored ports");
    }
    backfill_single_output(view, &mut info.map);
}

/// Copies port lists from the library template into a stored entry that
/// carries none at all. Reconciliation only rewrites lists that exist.
fn seed_missing_ports(map: &mut Value, lib: &NodeInfo) {
    for key in ["inputs", "outputs"] {
        if !config::has_key(map, key) {
            if let Some(ports) = lib.map.get(key) {
                map[key] = ports.clone();
            }
        }
    }
}

/// Gives every port in `key` a generated name when the stored entry has
/// none, as written by early graph files.
fn backfill_port_names(map: &mut Value, key: &str, prefix: &str) {
    if let Some(Value::Array(ports)) = map.get_mut(key) {
        for (i, port) in ports.iter_mut().enumerate() {
            if config::str_of(port, "name").map_or(true, str::is_empty) {
                port["name"] = json!(format!("{prefix}{}", i + 1));
            }
        }
    }
}

/// Early dataflow files omitted the output list entirely; those nodes all
/// had a single output.
fn backfill_single_output(view: &GraphView, map: &mut Value) {
    if view.model_name() == DataflowModel::NAME && config::items(map, "outputs").is_empty() {
        map["outputs"] = json!([{"name": "out1"}]);
    }
}

/// Rewrites id- and index-based endpoint fields of early graph files into
/// the name-based quadruple.
fn translate_legacy_edge(view: &GraphView, mut edge: Value) -> Value {
    for (id_key, name_key) in [("fromNodeId", "fromNode"), ("toNodeId", "toNode")] {
        if config::has_key(&edge, name_key) {
            continue;
        }
        if let Some(raw) = config::u64_of(&edge, id_key) {
            if let Some(name) = view.node_name(NodeId(raw)) {
                edge[name_key] = json!(name);
            }
        }
    }
    if !config::has_key(&edge, "fromNodeOutput") {
        if let Some(idx) = config::u64_of(&edge, "fromNodeOutputIdx") {
            let port = view
                .node_id_by_name(&config::string_of(&edge, "fromNode"))
                .and_then(|id| view.node(id))
                .and_then(|n| n.out_port_name(idx as usize).map(str::to_string));
            if let Some(port) = port {
                edge["fromNodeOutput"] = json!(port);
            }
        }
    }
    if !config::has_key(&edge, "toNodeInput") {
        if let Some(idx) = config::u64_of(&edge, "toNodeInputIdx") {
            let port = view
                .node_id_by_name(&config::string_of(&edge, "toNode"))
                .and_then(|id| view.node(id))
                .and_then(|n| n.in_port_name(idx as usize).map(str::to_string));
            if let Some(port) = port {
                edge["toNodeInput"] = json!(port);
            }
        }
    }
    if let Some(obj) = edge.as_object_mut() {
        for key in ["fromNodeId", "toNodeId", "fromNodeOutputIdx", "toNodeInputIdx"] {
            obj.shift_remove(key);
        }
    }
    edge
}

/// Folds the split subgraph reference back into one path relative to the
/// save location and drops the absolute directory.
fn relativize_subgraph(entry: &mut Value, base: Option<&Path>) {
    if config::str_of(entry, "type") != Some(node::SUBGRAPH) {
        return;
    }
    let stored_dir = config::string_of(entry, "path");
    if stored_dir.is_empty() {
        return;
    }
    let name = config::string_of(entry, "subgraph_name");
    let full = Path::new(&stored_dir).join(&name);
    let reference = match base.and_then(|b| full.strip_prefix(b).ok()) {
        Some(rel) => rel.display().to_string(),
        None => full.display().to_string(),
    };
    entry["subgraph_name"] = json!(reference);
    if let Some(obj) = entry.as_object_mut() {
        obj.shift_remove("path");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tangle_editor_graph::{ComponentModel, GraphModel, NodeTypeLibrary};

    fn make_library() -> NodeTypeLibrary {
        let mut lib = NodeTypeLibrary::new();
        lib.register_definition(json!({
            "name": "motor",
            "type": "motor",
            "inputs": [{"name": "in1"}, {"name": "in2"}],
            "outputs": [{"name": "out1"}],
        }));
        lib.register_definition(json!({
            "name": "sensor",
            "type": "sensor",
            "outputs": [{"name": "out1"}, {"name": "out2"}],
        }));
        for marker in [node::INPUT, node::OUTPUT] {
            lib.register_definition(json!({"name": marker, "type": marker}));
        }
        lib
    }

    fn make_registry() -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        registry.register(DataflowModel::NAME, || -> Box<dyn GraphModel> {
            Box::new(DataflowModel::new(make_library()))
        });
        registry.register(ComponentModel::NAME, || -> Box<dyn GraphModel> {
            Box::new(ComponentModel::new(make_library()))
        });
        registry
    }

    fn dataflow_view() -> GraphView {
        GraphView::new(Box::new(DataflowModel::new(make_library())))
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);

        let mut view = dataflow_view();
        view.add_node("sensor", "eye", 10.0, 20.0).unwrap();
        view.add_node("motor", "drive", 300.0, 40.0).unwrap();
        view.add_edge(
            json!({
                "fromNode": "eye",
                "fromNodeOutput": "out1",
                "toNode": "drive",
                "toNodeInput": "in2",
            }),
            false,
        )
        .unwrap();
        let before = view.create_config_map();
        loader.save(&view, &path).unwrap();

        let mut restored = dataflow_view();
        loader.load_file(&mut restored, &path).unwrap();
        assert_eq!(restored.create_config_map(), before);
        assert_eq!(restored.node_position(restored.node_id_by_name("eye").unwrap()), Some((10.0, 20.0)));
    }

    #[test]
    fn test_load_switches_model_through_registry() {
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = dataflow_view();

        loader.load(&mut view, &json!({"model": ComponentModel::NAME}), None, false);
        assert_eq!(view.model_name(), ComponentModel::NAME);

        // An unknown model name keeps the current one.
        loader.load(&mut view, &json!({"model": "bogus"}), None, false);
        assert_eq!(view.model_name(), ComponentModel::NAME);
    }

    #[test]
    fn test_legacy_edge_fields_are_translated() {
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = dataflow_view();

        let map = json!({
            "model": DataflowModel::NAME,
            "nodes": [
                {"name": "eye", "type": "sensor", "id": 1,
                 "outputs": [{"name": "out1"}, {"name": "out2"}]},
                {"name": "drive", "type": "motor", "id": 2,
                 "inputs": [{"name": "in1"}, {"name": "in2"}],
                 "outputs": [{"name": "out1"}]},
            ],
            "edges": [
                {"fromNodeId": 1, "fromNodeOutputIdx": 1, "toNodeId": 2, "toNodeInputIdx": 0},
            ],
        });
        loader.load(&mut view, &map, None, false);

        assert_eq!(view.edge_count(), 1);
        let (_, edge) = view.edges().next().unwrap();
        assert_eq!(config::str_of(edge.data(), "fromNode"), Some("eye"));
        assert_eq!(config::str_of(edge.data(), "fromNodeOutput"), Some("out2"));
        assert_eq!(config::str_of(edge.data(), "toNodeInput"), Some("in1"));
        assert!(!config::has_key(edge.data(), "fromNodeId"));
    }

    #[test]
    fn test_malformed_node_entries_are_skipped() {
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = dataflow_view();

        let map = json!({
            "model": DataflowModel::NAME,
            "nodes": [
                "garbage entry",
                {"name": "drive", "type": "motor",
                 "inputs": [{"name": "in1"}, {"name": "in2"}],
                 "outputs": [{"name": "out1"}]},
                17,
                null,
            ],
        });
        loader.load(&mut view, &map, None, false);

        assert_eq!(view.node_count(), 1);
        assert!(view.node_id_by_name("drive").is_some());
    }

    #[test]
    fn test_marker_nodes_are_normalized() {
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = dataflow_view();

        let map = json!({
            "model": DataflowModel::NAME,
            "nodes": [
                {"name": "speed", "type": node::INPUT},
                {"name": "goal", "type": node::OUTPUT, "inputs": [{}, {}]},
                {"name": "raw", "type": "sensor", "outputs": [{}, {}]},
            ],
        });
        loader.load(&mut view, &map, None, false);

        let speed = view.node(view.node_id_by_name("speed").unwrap()).unwrap();
        assert_eq!(speed.out_port_name(0), Some("out1"));

        let goal = view.node(view.node_id_by_name("goal").unwrap()).unwrap();
        assert_eq!(goal.in_port_name(0), Some("in1"));
        assert_eq!(goal.in_port_name(1), Some("in2"));

        let raw = view.node(view.node_id_by_name("raw").unwrap()).unwrap();
        assert_eq!(raw.out_port_name(1), Some("out2"));
    }

    #[test]
    fn test_extern_node_is_reconciled_against_library() {
        let mut lib = make_library();
        lib.add_extern_node(&json!({
            "name": "filter",
            "inputs": [{"name": "raw"}, {"name": "gain"}],
            "outputs": [{"name": "smoothed"}],
        }));
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = GraphView::new(Box::new(DataflowModel::new(lib)));

        // The stored schema predates the current definition.
        let map = json!({
            "model": DataflowModel::NAME,
            "nodes": [
                {"name": "smooth", "type": node::EXTERN, "extern_name": "filter",
                 "inputs": [{"name": "raw", "bias": 0.5, "type": "SUM", "default": 0.0}],
                 "outputs": [{"name": "smoothed"}]},
            ],
        });
        loader.load(&mut view, &map, None, false);

        let smooth = view.node(view.node_id_by_name("smooth").unwrap()).unwrap();
        assert_eq!(smooth.in_port_name(0), Some("raw"));
        assert_eq!(smooth.in_port_name(1), Some("gain"));
        // Metadata of the surviving port is carried over.
        let inputs = config::items(smooth.data(), "inputs");
        assert_eq!(config::f64_of(&inputs[0], "bias"), Some(0.5));
    }

    #[test]
    fn test_subgraph_reference_is_resolved_and_relativized() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("subs")).unwrap();
        fs::write(
            dir.path().join("subs").join("walker.json"),
            serde_json::to_string(&json!({
                "nodes": [
                    {"name": "speed", "type": node::INPUT},
                    {"name": "left", "type": node::OUTPUT},
                ],
            }))
            .unwrap(),
        )
        .unwrap();
        let graph_path = dir.path().join("graph.json");
        fs::write(
            &graph_path,
            serde_json::to_string(&json!({
                "model": DataflowModel::NAME,
                "nodes": [
                    {"name": "legs", "type": node::SUBGRAPH, "subgraph_name": "subs/walker.json"},
                ],
            }))
            .unwrap(),
        )
        .unwrap();

        let registry = make_registry();
        let loader = GraphLoader::new(&registry);
        let mut view = dataflow_view();
        loader.load_file(&mut view, &graph_path).unwrap();

        let legs = view.node(view.node_id_by_name("legs").unwrap()).unwrap();
        assert_eq!(legs.in_port_name(0), Some("speed"));
        assert_eq!(legs.out_port_name(0), Some("left"));

        let saved_path = dir.path().join("saved.json");
        loader.save(&view, &saved_path).unwrap();
        let saved: Value = serde_json::from_str(&fs::read_to_string(&saved_path).unwrap()).unwrap();
        let entry = &config::items(&saved, "nodes")[0];
        assert_eq!(
            config::str_of(entry, "subgraph_name"),
            Some("subs/walker.json")
        );
        assert!(!config::has_key(entry, "path"));
    }

    #[test]
    fn test_nodes_are_saved_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let registry = make_registry();
        let loader = GraphLoader::new(&registry);

        let mut view = dataflow_view();
        view.add_node("motor", "a", 0.0, 0.0).unwrap();
        view.add_node("motor", "b", 0.0, 0.0).unwrap();
        view.add_node("motor", "c", 0.0, 0.0).unwrap();
        loader.save(&view, &path).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let names: Vec<&str> = config::items(&saved, "nodes")
            .iter()
            .map(|n| config::str_of(n, "name").unwrap_or(""))
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
