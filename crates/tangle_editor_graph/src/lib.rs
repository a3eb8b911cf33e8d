// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data layer for Tangle Editor.
//!
//! This crate owns the authoritative side of the node/edge graph:
//! - Node and edge identities and the Config Tree interchange helpers
//! - The node-type library (definition files, extern discovery,
//!   subgraph port synthesis)
//! - The [`model::GraphModel`] validation gate with two backends
//!   ([`dataflow::DataflowModel`], [`component::ComponentModel`])
//! - Library-change reconciliation that migrates stored port metadata
//!   onto an updated schema
//!
//! The visual/mutation surface lives in `tangle_editor_view`.

pub mod component;
pub mod config;
pub mod dataflow;
pub mod library;
pub mod model;
pub mod node;
pub mod reconcile;

pub use component::ComponentModel;
pub use dataflow::DataflowModel;
pub use library::{LibraryError, NodeTypeLibrary};
pub use model::{GraphCommand, GraphModel, ModelRegistry};
pub use node::{EdgeId, NodeId, NodeInfo};
pub use reconcile::reconcile_ports;
