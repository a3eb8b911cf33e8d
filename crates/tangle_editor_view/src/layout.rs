// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named layout snapshots that can be saved and restored independently of
//! graph structure.
//!
//! A [`LayoutSnapshot`] keys positions by node name rather than by id, so a
//! layout file survives a round trip through save and load even when ids are
//! reassigned.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Errors raised while reading or writing a layout file.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The layout file could not be read or written.
    #[error("layout i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The layout file did not contain valid JSON.
    #[error("layout parse failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Position of a single node within a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    /// Horizontal scene coordinate.
    pub x: f64,
    /// Vertical scene coordinate.
    pub y: f64,
}

/// Pan and zoom state of the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Zoom factor, 1.0 is unscaled.
    pub scale: f64,
    /// Horizontal pan offset.
    pub x: f64,
    /// Vertical pan offset.
    pub y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

/// A complete layout: node positions keyed by name plus the view transform.
///
/// The file form is flat: every node name is a top level key next to the
/// `view` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    /// Positions keyed by node name, kept in insertion order.
    #[serde(flatten)]
    pub positions: IndexMap<String, NodePosition>,
    /// Pan and zoom of the view when the layout was captured.
    #[serde(default)]
    pub view: ViewTransform,
}

impl LayoutSnapshot {
    /// Creates an empty layout with the default view transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the layout as pretty printed JSON.
    pub fn to_file(&self, path: &Path) -> Result<(), LayoutError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Reads a layout previously written with [`LayoutSnapshot::to_file`].
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
