//! Applying editor edits to document text.

use lsp_types::{Range, TextDocumentContentChangeEvent};

use crate::error::RangeError;
use crate::position::LineIndex;

/// Replace `range` (0-based UTF-16 positions) of `text` with `replacement`.
pub fn apply_incremental_edit(
    text: &str,
    range: Range,
    replacement: &str,
) -> Result<String, RangeError> {
    let offsets = LineIndex::new(text).offsets(range)?;
    let mut result = String::with_capacity(text.len() - offsets.len() + replacement.len());
    result.push_str(&text[..offsets.start]);
    result.push_str(replacement);
    result.push_str(&text[offsets.end..]);
    Ok(result)
}

/// Apply `didChange` content changes in order.
///
/// A change without a range replaces the whole text. The first invalid
/// change aborts the whole batch; `text` itself is never modified.
pub fn apply_content_changes(
    text: &str,
    changes: &[TextDocumentContentChangeEvent],
) -> Result<String, RangeError> {
    let mut current = text.to_string();
    for change in changes {
        current = match change.range {
            Some(range) => apply_incremental_edit(&current, range, &change.text)?,
            None => change.text.clone(),
        };
    }
    Ok(current)
}
