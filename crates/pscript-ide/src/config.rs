//! Analysis settings, read from the client's `initializationOptions`.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::semantic_tokens::DEFAULT_DELTA_THRESHOLD;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub semantic_tokens: SemanticTokensConfig,
    pub indexing: IndexingConfig,
    pub workspace_symbols: WorkspaceSymbolsConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SemanticTokensConfig {
    /// Largest share of the new array a delta edit may carry before a full
    /// payload is sent instead. Kept in (0, 1].
    pub delta_threshold: f64,
}

impl Default for SemanticTokensConfig {
    fn default() -> Self {
        Self {
            delta_threshold: DEFAULT_DELTA_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexingConfig {
    pub enabled: bool,
    pub max_depth: usize,
    pub max_files: usize,
    /// Extensions without the leading dot, matched case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 10,
            max_files: 10_000,
            extensions: ["pas", "pp", "inc"].map(String::from).to_vec(),
        }
    }
}

impl IndexingConfig {
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceSymbolsConfig {
    /// Zero means unlimited.
    pub max_results: usize,
}

impl Default for WorkspaceSymbolsConfig {
    fn default() -> Self {
        Self { max_results: 100 }
    }
}

impl AnalysisConfig {
    /// Parse `initializationOptions`, falling back to defaults for anything
    /// missing or malformed.
    pub fn from_init_options(options: Option<&serde_json::Value>) -> Self {
        let config = match options {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(value) => Self::deserialize(value).unwrap_or_else(|e| {
                warn!(error = %e, "invalid initializationOptions, using defaults");
                Self::default()
            }),
        };
        config.validated()
    }

    /// Clamp out-of-range values.
    pub fn validated(mut self) -> Self {
        let threshold = self.semantic_tokens.delta_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            let clamped = if threshold > 1.0 {
                1.0
            } else {
                DEFAULT_DELTA_THRESHOLD
            };
            warn!(threshold, clamped, "semanticTokens.deltaThreshold out of range");
            self.semantic_tokens.delta_threshold = clamped;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_init_options(None);
        assert_eq!(config.semantic_tokens.delta_threshold, 0.70);
        assert_eq!(config.indexing.max_depth, 10);
        assert_eq!(config.indexing.max_files, 10_000);
        assert!(config.indexing.enabled);
        assert!(config.indexing.accepts_extension("PAS"));
        assert!(!config.indexing.accepts_extension("rs"));
        assert_eq!(config.workspace_symbols.max_results, 100);
    }

    #[test]
    fn test_partial_options() {
        let options = json!({
            "semanticTokens": { "deltaThreshold": 0.5 },
            "indexing": { "extensions": ["dws"] },
        });
        let config = AnalysisConfig::from_init_options(Some(&options));
        assert_eq!(config.semantic_tokens.delta_threshold, 0.5);
        assert_eq!(config.indexing.extensions, vec!["dws".to_string()]);
        assert_eq!(config.indexing.max_depth, 10);
    }

    #[test]
    fn test_threshold_is_clamped() {
        let high = json!({ "semanticTokens": { "deltaThreshold": 3.0 } });
        assert_eq!(
            AnalysisConfig::from_init_options(Some(&high))
                .semantic_tokens
                .delta_threshold,
            1.0
        );
        let zero = json!({ "semanticTokens": { "deltaThreshold": 0.0 } });
        assert_eq!(
            AnalysisConfig::from_init_options(Some(&zero))
                .semantic_tokens
                .delta_threshold,
            0.70
        );
    }

    #[test]
    fn test_malformed_options_fall_back() {
        let options = json!({ "indexing": { "maxDepth": "deep" } });
        assert_eq!(
            AnalysisConfig::from_init_options(Some(&options)),
            AnalysisConfig::default()
        );
    }
}
