// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-type library: the catalog of known node type definitions.
//!
//! Definitions come from three sources: definition files (a `nodes`
//! list), recursive extern-node directory scans, and subgraph files
//! whose `INPUT`/`OUTPUT` marker nodes define the port schema. Type
//! names are unique; the first-loaded definition wins for the session
//! and later collisions are logged and ignored.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::config;
use crate::node::{NodeInfo, DEFAULT_MERGE, EXTERN, INPUT, OUTPUT, SUBGRAPH};

/// File suffix recognized as one node definition during directory scans.
pub const DEFINITION_SUFFIX: &str = "json";

/// Error loading a definition source.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    /// Definition file could not be read
    #[error("failed to read definition file: {0}")]
    Io(#[from] std::io::Error),

    /// Definition file is not a valid Config Tree
    #[error("failed to parse definition file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Catalog of node type definitions, keyed by type name.
#[derive(Debug, Default)]
pub struct NodeTypeLibrary {
    info: IndexMap<String, NodeInfo>,
    extern_node_path: Option<String>,
}

impl NodeTypeLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one definition file and populate the catalog from its
    /// `nodes` list, `subgraphs` list, and `ExternNodesPath` entry.
    ///
    /// Malformed individual entries are logged and skipped; only
    /// failing to read or parse the file itself is an error.
    pub fn load_definitions(&mut self, path: &Path) -> Result<(), LibraryError> {
        let text = fs::read_to_string(path)?;
        let map: Value = serde_json::from_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        for node in config::items(&map, "nodes") {
            if !self.register_definition(node.clone()) {
                tracing::warn!(
                    file = %path.display(),
                    "skipped node definition without usable name"
                );
            }
        }

        for entry in config::items(&map, "subgraphs") {
            let Some(file) = entry.as_str() else {
                tracing::warn!(file = %path.display(), "subgraph entry is not a path");
                continue;
            };
            let full = resolve_relative(base, file);
            let (dir, name) = split_path(&full);
            self.load_subgraph_info(&name, &dir);
        }

        if let Some(dir) = config::str_of(&map, "ExternNodesPath") {
            self.scan_extern_nodes(dir, Some(base));
            // scans driven by a definition file are not round-tripped
            self.extern_node_path = None;
        }
        Ok(())
    }

    /// Register one definition map keyed by its declared `name` field.
    ///
    /// Returns false when the map carries no name. A colliding name is
    /// rejected with a warning; the first registration stays
    /// authoritative.
    pub fn register_definition(&mut self, mut map: Value) -> bool {
        let type_name = config::string_of(&map, "name");
        if type_name.is_empty() {
            return false;
        }
        // instances get their own names
        map["name"] = json!("");
        if self.info.contains_key(&type_name) {
            tracing::warn!(%type_name, "'{type_name}' was already loaded and is ignored now");
            return true;
        }
        self.info
            .insert(type_name.clone(), NodeInfo::from_template(type_name, map));
        true
    }

    /// Recursively scan a directory for extern node definitions.
    ///
    /// Every file with the recognized definition suffix is one extern
    /// node; hidden entries are skipped; subdirectories are recursed.
    /// `root` resolves a relative `path` (the relative form is what
    /// gets persisted for round-tripping).
    pub fn scan_extern_nodes(&mut self, path: &str, root: Option<&Path>) {
        let full = match root {
            Some(root) => resolve_relative(root, path),
            None => PathBuf::from(path),
        };
        if !full.is_dir() {
            tracing::warn!(path = %full.display(), "specified path is not a valid directory");
            return;
        }
        self.extern_node_path = Some(path.to_string());

        let walk = WalkDir::new(&full)
            .into_iter()
            .filter_entry(|e| !is_hidden(e));
        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |e| e != DEFINITION_SUFFIX)
            {
                continue;
            }
            match fs::read_to_string(entry.path()).map_err(LibraryError::from).and_then(|text| {
                Ok(serde_json::from_str::<Value>(&text)?)
            }) {
                Ok(map) => self.add_extern_node(&map),
                Err(err) => {
                    tracing::warn!(file = %entry.path().display(), %err, "skipping extern node definition");
                }
            }
        }
    }

    /// Register an extern node definition from its raw map.
    ///
    /// Files without a `name` field are not extern nodes and are
    /// ignored. Input ports get default metadata; outputs keep only
    /// their names.
    pub fn add_extern_node(&mut self, extern_map: &Value) {
        let name = config::string_of(extern_map, "name");
        if name.is_empty() {
            return;
        }

        let inputs: Vec<Value> = config::items(extern_map, "inputs")
            .iter()
            .enumerate()
            .map(|(i, port)| {
                json!({
                    "name": config::string_of(port, "name"),
                    "type": DEFAULT_MERGE,
                    "bias": 0.0,
                    "default": 0.0,
                    "idx": i,
                })
            })
            .collect();
        let outputs: Vec<Value> = config::items(extern_map, "outputs")
            .iter()
            .map(|port| json!({"name": config::string_of(port, "name")}))
            .collect();

        let map = json!({
            "name": "",
            "extern_name": name,
            "type": EXTERN,
            "inputs": inputs,
            "outputs": outputs,
        });
        if self.info.contains_key(&name) {
            tracing::warn!(type_name = %name, "'{name}' was already loaded and is ignored now");
            return;
        }
        self.info
            .insert(name.clone(), NodeInfo::from_template(name, map));
    }

    /// Synthesize a node type for a subgraph file by collecting its
    /// `INPUT`/`OUTPUT` marker nodes in declaration order.
    ///
    /// Returns false without touching the catalog when the type is
    /// already registered or the file has no node list.
    pub fn load_subgraph_info(&mut self, filename: &str, base_path: &Path) -> bool {
        if self.info.contains_key(filename) {
            return false;
        }
        let full = base_path.join(filename);
        let subgraph: Value = match fs::read_to_string(&full)
            .map_err(LibraryError::from)
            .and_then(|text| Ok(serde_json::from_str(&text)?))
        {
            Ok(map) => map,
            Err(err) => {
                tracing::warn!(file = %full.display(), %err, "could not read subgraph file");
                return false;
            }
        };
        if !config::has_key(&subgraph, "nodes") {
            tracing::warn!(file = %full.display(), "information for subgraph '{filename}' not correct");
            return false;
        }

        let mut in_names = Vec::new();
        let mut out_names = Vec::new();
        for node in config::items(&subgraph, "nodes") {
            match config::str_of(node, "type") {
                Some(t) if t == INPUT => in_names.push(config::string_of(node, "name")),
                Some(t) if t == OUTPUT => out_names.push(config::string_of(node, "name")),
                _ => {}
            }
        }

        let inputs: Vec<Value> = in_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                json!({
                    "name": name,
                    "type": DEFAULT_MERGE,
                    "bias": 0.0,
                    "default": 0.0,
                    "idx": i,
                })
            })
            .collect();
        let outputs: Vec<Value> = out_names
            .iter()
            .map(|name| json!({"name": name}))
            .collect();

        let mut map = json!({
            "name": "",
            "type": SUBGRAPH,
            "subgraph_name": filename,
            "path": base_path.display().to_string(),
            "inputs": inputs,
            "outputs": outputs,
        });
        if let Some(meta) = subgraph.get("meta") {
            map["meta"] = meta.clone();
        }

        self.info
            .insert(filename.to_string(), NodeInfo::from_template(filename, map));
        true
    }

    /// Look up a type definition by name
    pub fn lookup(&self, type_name: &str) -> Option<&NodeInfo> {
        self.info.get(type_name)
    }

    /// True if a definition with this type name is registered
    pub fn contains(&self, type_name: &str) -> bool {
        self.info.contains_key(type_name)
    }

    /// The full catalog, ordered by registration
    pub fn info_map(&self) -> &IndexMap<String, NodeInfo> {
        &self.info
    }

    /// Registered type names, in registration order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.info.keys().map(String::as_str)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.info.len()
    }

    /// True if no types are registered
    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    /// The most recent extern scan path, if one should be persisted
    pub fn extern_node_path(&self) -> Option<&str> {
        self.extern_node_path.as_deref()
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn resolve_relative(base: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn split_path(full: &Path) -> (PathBuf, String) {
    let dir = full.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    let name = full
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, value: &Value) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(serde_json::to_string_pretty(value).unwrap().as_bytes())
            .unwrap();
    }

    #[test]
    fn test_first_definition_wins() {
        let mut lib = NodeTypeLibrary::new();
        assert!(lib.register_definition(json!({
            "name": "PID",
            "inputs": [{"name": "target"}],
        })));
        assert!(lib.register_definition(json!({
            "name": "PID",
            "inputs": [{"name": "other"}, {"name": "ports"}],
        })));
        let info = lib.lookup("PID").unwrap();
        assert_eq!(info.num_inputs, 1);
        assert_eq!(
            config::str_of(&info.map["inputs"][0], "name"),
            Some("target")
        );
    }

    #[test]
    fn test_definition_name_cleared_in_template() {
        let mut lib = NodeTypeLibrary::new();
        lib.register_definition(json!({"name": "SIN", "outputs": [{"name": "out1"}]}));
        let info = lib.lookup("SIN").unwrap();
        assert_eq!(config::str_of(&info.map, "name"), Some(""));
    }

    #[test]
    fn test_scan_extern_nodes_recurses_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("motors")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        write_file(
            dir.path(),
            "filter.json",
            &json!({"name": "filter", "inputs": [{"name": "raw"}], "outputs": [{"name": "smoothed"}]}),
        );
        write_file(
            &dir.path().join("motors"),
            "servo.json",
            &json!({"name": "servo", "inputs": [{"name": "angle"}]}),
        );
        write_file(&dir.path().join(".git"), "config.json", &json!({"name": "bogus"}));
        write_file(dir.path(), "notes.json", &json!({"comment": "no name field"}));

        let mut lib = NodeTypeLibrary::new();
        lib.scan_extern_nodes(&dir.path().display().to_string(), None);

        assert!(lib.contains("filter"));
        assert!(lib.contains("servo"));
        assert!(!lib.contains("bogus"));
        assert_eq!(lib.len(), 2);

        let filter = lib.lookup("filter").unwrap();
        assert_eq!(config::str_of(&filter.map, "type"), Some(EXTERN));
        assert_eq!(config::str_of(&filter.map, "extern_name"), Some("filter"));
        assert_eq!(
            config::str_of(&filter.map["inputs"][0], "type"),
            Some(DEFAULT_MERGE)
        );
        assert_eq!(config::f64_of(&filter.map["inputs"][0], "bias"), Some(0.0));
    }

    #[test]
    fn test_load_subgraph_info() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "walker.json",
            &json!({
                "nodes": [
                    {"name": "speed", "type": "INPUT"},
                    {"name": "gain", "type": "INPUT"},
                    {"name": "left_leg", "type": "OUTPUT"},
                    {"name": "pipe3", "type": "PIPE"},
                ],
            }),
        );

        let mut lib = NodeTypeLibrary::new();
        assert!(lib.load_subgraph_info("walker.json", dir.path()));
        // second registration is a no-op
        assert!(!lib.load_subgraph_info("walker.json", dir.path()));

        let info = lib.lookup("walker.json").unwrap();
        assert_eq!(info.num_inputs, 2);
        assert_eq!(info.num_outputs, 1);
        assert_eq!(config::str_of(&info.map, "type"), Some(SUBGRAPH));
        assert_eq!(
            config::str_of(&info.map["inputs"][1], "name"),
            Some("gain")
        );
        assert_eq!(
            config::str_of(&info.map["outputs"][0], "name"),
            Some("left_leg")
        );
    }

    #[test]
    fn test_subgraph_without_nodes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "broken.json", &json!({"edges": []}));
        let mut lib = NodeTypeLibrary::new();
        assert!(!lib.load_subgraph_info("broken.json", dir.path()));
        assert!(!lib.contains("broken.json"));
    }

    #[test]
    fn test_load_definitions_file() {
        let dir = tempfile::tempdir().unwrap();
        let extern_dir = dir.path().join("externs");
        fs::create_dir(&extern_dir).unwrap();
        write_file(&extern_dir, "greater.json", &json!({"name": ">0", "outputs": [{"name": "out1"}]}));
        write_file(
            dir.path(),
            "sub.json",
            &json!({"nodes": [{"name": "x", "type": "INPUT"}]}),
        );
        write_file(
            dir.path(),
            "defs.json",
            &json!({
                "nodes": [
                    {"name": "SIN", "inputs": [{"name": "in1"}], "outputs": [{"name": "out1"}]},
                ],
                "subgraphs": ["sub.json"],
                "ExternNodesPath": "externs",
            }),
        );

        let mut lib = NodeTypeLibrary::new();
        lib.load_definitions(&dir.path().join("defs.json")).unwrap();
        assert!(lib.contains("SIN"));
        assert!(lib.contains("sub.json"));
        assert!(lib.contains(">0"));
        // config-file-driven scans are not round-tripped
        assert_eq!(lib.extern_node_path(), None);
    }
}
