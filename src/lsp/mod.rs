//! Language Server Protocol implementation for PScript.
//!
//! This module wires the analysis core to an LSP connection:
//! - Definition and references
//! - Document and workspace symbols
//! - Semantic tokens, full and delta

mod documents;
mod server;
mod tracing_layer;

pub use server::serve;
pub use tracing_layer::LspLayer;
