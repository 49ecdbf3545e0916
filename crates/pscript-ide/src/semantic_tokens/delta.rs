//! Minimal edit scripts between two encoded token arrays.

use tracing::debug;

pub const DEFAULT_DELTA_THRESHOLD: f64 = 0.70;

const TUPLE: usize = 5;

/// Replace `delete_count` values at `start` with `data`. Offsets count
/// `u32` values, not tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEdit {
    pub start: u32,
    pub delete_count: u32,
    pub data: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokensResponse {
    Full { result_id: String, data: Vec<u32> },
    Delta { result_id: String, edits: Vec<TokenEdit> },
}

impl TokensResponse {
    pub fn result_id(&self) -> &str {
        match self {
            TokensResponse::Full { result_id, .. } | TokensResponse::Delta { result_id, .. } => {
                result_id
            }
        }
    }
}

/// Diff `old` against `new`, falling back to a full payload when the single
/// edit would carry more than `threshold` of the new array.
pub fn compute_semantic_tokens_delta(
    old: Option<&[u32]>,
    new: &[u32],
    new_result_id: &str,
    threshold: f64,
) -> TokensResponse {
    let full = || TokensResponse::Full {
        result_id: new_result_id.to_string(),
        data: new.to_vec(),
    };
    let delta = |edits| TokensResponse::Delta {
        result_id: new_result_id.to_string(),
        edits,
    };

    let Some(old) = old.filter(|old| !old.is_empty()) else {
        return full();
    };
    if new.is_empty() {
        return delta(vec![TokenEdit {
            start: 0,
            delete_count: old.len() as u32,
            data: Vec::new(),
        }]);
    }
    if old == new {
        return delta(Vec::new());
    }

    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let limit = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(limit)
        .take_while(|(a, b)| a == b)
        .count();

    let inserted = &new[prefix..new.len() - suffix];
    if (2 + inserted.len()) as f64 > threshold * new.len() as f64 {
        debug!(
            inserted = inserted.len(),
            total = new.len(),
            "token delta too large, sending full"
        );
        return full();
    }
    delta(vec![TokenEdit {
        start: prefix as u32,
        delete_count: (old.len() - prefix - suffix) as u32,
        data: inserted.to_vec(),
    }])
}

/// Apply `edits` to `old`. Edits are applied back to front so each one's
/// offsets refer to the original array.
pub fn apply_edits(old: &[u32], edits: &[TokenEdit]) -> Vec<u32> {
    let mut result = old.to_vec();
    let mut ordered: Vec<&TokenEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| std::cmp::Reverse(edit.start));
    for edit in ordered {
        let start = (edit.start as usize).min(result.len());
        let end = (start + edit.delete_count as usize).min(result.len());
        result.splice(start..end, edit.data.iter().copied());
    }
    result
}

/// Widen `edit` to whole 5-value tuples so it can travel as
/// `lsp_types::SemanticTokensEdit`, whose payload is a list of tokens.
pub fn align_edit(edit: &TokenEdit, old: &[u32], new: &[u32]) -> TokenEdit {
    let start = edit.start as usize / TUPLE * TUPLE;
    let old_end = edit.start as usize + edit.delete_count as usize;
    let suffix = old.len().saturating_sub(old_end);
    let suffix = suffix - suffix % TUPLE;
    let old_end = old.len() - suffix;
    let new_end = new.len().saturating_sub(suffix).max(start);
    TokenEdit {
        start: start as u32,
        delete_count: old_end.saturating_sub(start) as u32,
        data: new.get(start..new_end).map(<[u32]>::to_vec).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten tokens on consecutive lines.
    fn snapshot() -> Vec<u32> {
        (0..10u32).flat_map(|i| [1, i, 3, 7, 0]).collect()
    }

    fn assert_reconstructs(old: Option<&[u32]>, new: &[u32]) -> TokensResponse {
        let response = compute_semantic_tokens_delta(old, new, "2", DEFAULT_DELTA_THRESHOLD);
        match &response {
            TokensResponse::Full { data, .. } => assert_eq!(data, new),
            TokensResponse::Delta { edits, .. } => {
                let old = old.expect("delta needs a previous snapshot");
                assert!(edits.len() <= 1);
                assert_eq!(apply_edits(old, edits), new);
            }
        }
        assert_eq!(response.result_id(), "2");
        response
    }

    #[test]
    fn test_missing_or_empty_old_is_full() {
        let new = snapshot();
        assert!(matches!(
            assert_reconstructs(None, &new),
            TokensResponse::Full { .. }
        ));
        assert!(matches!(
            assert_reconstructs(Some(&[]), &new),
            TokensResponse::Full { .. }
        ));
        assert!(matches!(
            assert_reconstructs(Some(&[]), &[]),
            TokensResponse::Full { .. }
        ));
    }

    #[test]
    fn test_empty_new_deletes_everything() {
        let old = snapshot();
        let response = assert_reconstructs(Some(&old), &[]);
        assert_eq!(
            response,
            TokensResponse::Delta {
                result_id: "2".to_string(),
                edits: vec![TokenEdit {
                    start: 0,
                    delete_count: 50,
                    data: vec![],
                }],
            }
        );
    }

    #[test]
    fn test_identical_yields_no_edits() {
        let old = snapshot();
        let response = assert_reconstructs(Some(&old), &old.clone());
        assert_eq!(
            response,
            TokensResponse::Delta {
                result_id: "2".to_string(),
                edits: vec![],
            }
        );
    }

    #[test]
    fn test_single_difference() {
        let old = snapshot();
        let mut new = old.clone();
        new[22] = 9;
        let response = assert_reconstructs(Some(&old), &new);
        assert_eq!(
            response,
            TokensResponse::Delta {
                result_id: "2".to_string(),
                edits: vec![TokenEdit {
                    start: 22,
                    delete_count: 1,
                    data: vec![9],
                }],
            }
        );
    }

    #[test]
    fn test_inserted_and_removed_tokens() {
        let old = snapshot();
        let mut grown = old.clone();
        grown.splice(10..10, [0, 5, 2, 10, 1]);
        assert!(matches!(
            assert_reconstructs(Some(&old), &grown),
            TokensResponse::Delta { .. }
        ));

        let mut shrunk = old.clone();
        shrunk.drain(40..45);
        assert!(matches!(
            assert_reconstructs(Some(&old), &shrunk),
            TokensResponse::Delta { .. }
        ));
    }

    #[test]
    fn test_many_differences_fall_back_to_full() {
        let old = snapshot();
        let new: Vec<u32> = old.iter().map(|v| v + 1).collect();
        assert!(matches!(
            assert_reconstructs(Some(&old), &new),
            TokensResponse::Full { .. }
        ));
    }

    #[test]
    fn test_threshold_is_respected() {
        let old = snapshot();
        let mut new = old.clone();
        for v in &mut new[5..25] {
            *v += 1;
        }
        // 2 + 20 inserted values against 50 total.
        assert!(matches!(
            compute_semantic_tokens_delta(Some(&old), &new, "3", 0.5),
            TokensResponse::Delta { .. }
        ));
        assert!(matches!(
            compute_semantic_tokens_delta(Some(&old), &new, "3", 0.4),
            TokensResponse::Full { .. }
        ));
    }

    #[test]
    fn test_align_edit_covers_whole_tuples() {
        let old = snapshot();
        let mut new = old.clone();
        new[22] = 9;
        let edit = TokenEdit {
            start: 22,
            delete_count: 1,
            data: vec![9],
        };
        let aligned = align_edit(&edit, &old, &new);
        assert_eq!(aligned.start, 20);
        assert_eq!(aligned.delete_count, 5);
        assert_eq!(aligned.data, vec![1, 4, 9, 7, 0]);
        assert_eq!(apply_edits(&old, &[aligned]), new);

        let mut grown = old.clone();
        grown.splice(12..12, [4, 4, 4, 4, 4]);
        let TokensResponse::Delta { edits, .. } =
            compute_semantic_tokens_delta(Some(&old), &grown, "4", 1.0)
        else {
            panic!("expected delta");
        };
        let aligned = align_edit(&edits[0], &old, &grown);
        assert_eq!(aligned.start % 5, 0);
        assert_eq!(aligned.delete_count % 5, 0);
        assert_eq!(aligned.data.len() % 5, 0);
        assert_eq!(apply_edits(&old, &[aligned]), grown);
    }
}
