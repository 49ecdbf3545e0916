//! Analysis core of the PScript language server.
//!
//! Everything here works on plain strings and parsed [`pscript_syntax`]
//! trees; the LSP transport lives in the `pscript` binary. Positions are
//! 0-based UTF-16 [`lsp_types::Position`]s unless a function says otherwise.

pub mod config;
pub mod error;
pub mod indexer;
pub mod position;
pub mod references;
pub mod resolver;
pub mod semantic_tokens;
pub mod symbols;
pub mod text_edit;
pub mod uri;
pub mod workspace_index;

pub use config::AnalysisConfig;
pub use error::{IndexError, RangeError};
pub use indexer::{IndexStats, PscriptParser, SourceParser, WorkspaceIndexer};
pub use position::{LineIndex, word_at};
pub use references::{ScopeFilter, find_references};
pub use resolver::{Resolver, ScopeInfo, ScopeKind, scope_at};
pub use semantic_tokens::{
    Legend, SemanticToken, TokenCache, TokensResponse, compute_semantic_tokens,
    compute_semantic_tokens_delta, encode_semantic_tokens,
};
pub use symbols::{SymbolDefinition, collect_definitions};
pub use text_edit::{apply_content_changes, apply_incremental_edit};
pub use workspace_index::{Location, SymbolKind, SymbolLocation, WorkspaceIndex};
