// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutation surface for Tangle Editor graphs.
//!
//! [`GraphView`] holds the drawable arena of one graph and routes every
//! mutation through the active [`tangle_editor_graph::GraphModel`]. Around it
//! live the persisted-file loader, the full-snapshot history, named layout
//! snapshots and an incremental force layout.

pub mod history;
pub mod layout;
pub mod loader;
pub mod view;

mod force;

pub use history::{History, HistoryEntry};
pub use layout::{LayoutError, LayoutSnapshot, NodePosition, ViewTransform};
pub use loader::{GraphLoader, LoadError};
pub use view::{GraphView, ViewEdge, ViewNode};
