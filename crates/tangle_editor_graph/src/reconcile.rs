// SPDX-License-Identifier: MIT OR Apache-2.0
//! Library-change reconciliation.
//!
//! A stored `EXTERN` or `SUBGRAPH` node may have been saved against an
//! older version of its type: ports renamed, added, or removed
//! upstream. Reconciliation rebuilds the stored port lists from the
//! library's current schema while carrying user-entered per-port
//! metadata over by port name, so library upgrades are non-destructive
//! as long as port names stay stable. Runs once per affected node at
//! load time; history restores are assumed self-consistent and skip it.

use serde_json::{json, Value};

use crate::config;
use crate::node::{NodeInfo, DEFAULT_MERGE};

/// Reconcile one stored node against the library's current definition.
///
/// Each port direction is checked independently: a count mismatch or
/// any pairwise name mismatch marks that direction for a rebuild. A
/// rebuilt list follows the library's ordering and names; ports whose
/// name existed before keep their stored `type`/`bias`/`default`
/// (inputs only), genuinely new inputs get defaults.
///
/// Returns true when any direction was rebuilt; the caller must then
/// re-resolve edges whose port indices may have shifted.
pub fn reconcile_ports(stored: &mut Value, lib: &NodeInfo) -> bool {
    let mut redraw_edges = false;
    for direction in ["inputs", "outputs"] {
        let num_ports = if direction == "inputs" {
            lib.num_inputs
        } else {
            lib.num_outputs
        };
        // redraw is decided per direction, never carried across
        let mut redraw = false;

        match stored.get(direction).and_then(Value::as_array) {
            Some(current) => {
                if current.len() == num_ports {
                    let lib_ports = config::items(&lib.map, direction);
                    for (cur, lib_port) in current.iter().zip(lib_ports) {
                        if config::str_of(cur, "name") != config::str_of(lib_port, "name") {
                            redraw = true;
                            break;
                        }
                    }
                } else {
                    redraw = true;
                }
            }
            // a node saved without this port list is left alone
            None => continue,
        }
        if !redraw {
            continue;
        }
        redraw_edges = true;
        tracing::debug!(
            node = %config::string_of(stored, "name"),
            direction,
            "port schema drift, rebuilding from library"
        );

        let previous = config::items(stored, direction).to_vec();
        let mut rebuilt = Vec::with_capacity(num_ports);
        for lib_port in config::items(&lib.map, direction).iter().take(num_ports) {
            let name = config::string_of(lib_port, "name");
            let carried = previous
                .iter()
                .find(|old| config::str_of(old, "name") == Some(name.as_str()));
            let port = if direction == "inputs" {
                match carried {
                    Some(old) => json!({
                        "name": name,
                        "type": old.get("type").cloned().unwrap_or(json!(DEFAULT_MERGE)),
                        "bias": old.get("bias").cloned().unwrap_or(json!(0.0)),
                        "default": old.get("default").cloned().unwrap_or(json!(0.0)),
                    }),
                    None => json!({
                        "name": name,
                        "type": DEFAULT_MERGE,
                        "bias": 0.0,
                        "default": 0.0,
                    }),
                }
            } else {
                json!({"name": name})
            };
            rebuilt.push(port);
        }
        stored[direction] = Value::Array(rebuilt);
    }
    redraw_edges
}
