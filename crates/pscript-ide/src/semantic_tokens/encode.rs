use super::SemanticToken;

/// Relative 5-tuple encoding. `tokens` must already be sorted by position.
pub fn encode_semantic_tokens(tokens: &[SemanticToken]) -> Vec<u32> {
    let mut data = Vec::with_capacity(tokens.len() * 5);
    let mut prev_line = 0;
    let mut prev_start = 0;
    for token in tokens {
        let delta_line = token.line - prev_line;
        let delta_start = if delta_line == 0 {
            token.start_char - prev_start
        } else {
            token.start_char
        };
        data.extend_from_slice(&[
            delta_line,
            delta_start,
            token.length,
            token.token_type,
            token.modifiers,
        ]);
        prev_line = token.line;
        prev_start = token.start_char;
    }
    data
}

/// Regroup an encoded array into the tuples `lsp_types` serializes.
/// A trailing partial tuple is dropped.
pub fn to_lsp_tokens(data: &[u32]) -> Vec<lsp_types::SemanticToken> {
    data.chunks_exact(5)
        .map(|chunk| lsp_types::SemanticToken {
            delta_line: chunk[0],
            delta_start: chunk[1],
            length: chunk[2],
            token_type: chunk[3],
            token_modifiers_bitset: chunk[4],
        })
        .collect()
}
