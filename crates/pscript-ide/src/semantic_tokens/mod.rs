//! Semantic highlighting: classification, wire encoding and deltas between
//! successive snapshots of a document's tokens.

mod cache;
mod collect;
mod delta;
mod encode;
pub mod legend;

pub use cache::TokenCache;
pub use collect::compute_semantic_tokens;
pub use delta::{
    DEFAULT_DELTA_THRESHOLD, TokenEdit, TokensResponse, align_edit, apply_edits,
    compute_semantic_tokens_delta,
};
pub use encode::{encode_semantic_tokens, to_lsp_tokens};
pub use legend::{Legend, Modifier, Modifiers, TokenKind};

/// One classified identifier or literal, in editor coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SemanticToken {
    pub line: u32,
    pub start_char: u32,
    /// Length in UTF-16 code units.
    pub length: u32,
    /// Index into the legend's token types.
    pub token_type: u32,
    /// Bitmask over the legend's modifiers.
    pub modifiers: u32,
}
