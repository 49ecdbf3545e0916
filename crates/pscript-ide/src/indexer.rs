//! Background scan of workspace folders into the [`WorkspaceIndex`].

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use pscript_syntax::Program;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::IndexingConfig;
use crate::error::IndexError;
use crate::symbols::collect_definitions;
use crate::uri::path_to_uri;
use crate::workspace_index::WorkspaceIndex;

/// Directories that hold build output rather than sources.
const BUILD_DIRS: &[&str] = &[
    "target",
    "node_modules",
    "build",
    "out",
    "obj",
    "bin",
    "__history",
    "__recovery",
];

/// Turns file contents into a syntax tree for indexing.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, text: &str) -> Result<Program, IndexError>;
}

/// The PScript parser. Recovered trees are indexed as they are.
#[derive(Clone, Copy, Debug, Default)]
pub struct PscriptParser;

impl SourceParser for PscriptParser {
    fn parse(&self, path: &Path, text: &str) -> Result<Program, IndexError> {
        let result = pscript_syntax::parse(text);
        if result.has_errors() {
            debug!(
                path = %path.display(),
                errors = result.diagnostics.len(),
                "indexing partially parsed file"
            );
        }
        Ok(result.program)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub files_failed: usize,
    /// Files left alone because an open document owns them.
    pub files_skipped: usize,
    pub symbols_added: usize,
    /// The scan stopped at `max_files`.
    pub truncated: bool,
}

#[derive(Clone)]
pub struct WorkspaceIndexer {
    index: Arc<WorkspaceIndex>,
    parser: Arc<dyn SourceParser>,
    config: IndexingConfig,
}

impl WorkspaceIndexer {
    pub fn new(index: Arc<WorkspaceIndex>, config: IndexingConfig) -> Self {
        Self::with_parser(index, Arc::new(PscriptParser), config)
    }

    pub fn with_parser(
        index: Arc<WorkspaceIndex>,
        parser: Arc<dyn SourceParser>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            index,
            parser,
            config,
        }
    }

    pub fn index(&self) -> &Arc<WorkspaceIndex> {
        &self.index
    }

    /// Walk `roots` and index every matching file.
    pub fn scan(&self, roots: &[PathBuf]) -> IndexStats {
        let mut stats = IndexStats::default();
        info!(roots = roots.len(), "workspace scan started");

        'roots: for root in roots {
            let walker = WalkDir::new(root)
                .max_depth(self.config.max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_excluded(e));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !self.selects(entry.path()) {
                    continue;
                }
                if stats.files_indexed + stats.files_failed + stats.files_skipped
                    >= self.config.max_files
                {
                    stats.truncated = true;
                    break 'roots;
                }

                match self.index_file(entry.path()) {
                    Ok(Some(count)) => {
                        stats.files_indexed += 1;
                        stats.symbols_added += count;
                    }
                    // Open in the editor; the live buffer wins.
                    Ok(None) => stats.files_skipped += 1,
                    Err(e) => {
                        warn!(error = %e, "failed to index file");
                        stats.files_failed += 1;
                    }
                }
            }
        }

        info!(
            indexed = stats.files_indexed,
            failed = stats.files_failed,
            skipped = stats.files_skipped,
            symbols = stats.symbols_added,
            truncated = stats.truncated,
            "workspace scan finished"
        );
        stats
    }

    /// Replace the index entries of one on-disk file. Returns the number of
    /// definitions added, or `None` when an open document owns the file.
    ///
    /// Definitions are committed one at a time; the commit stops as soon as
    /// an editor buffer takes the file over.
    pub fn index_file(&self, path: &Path) -> Result<Option<usize>, IndexError> {
        let uri = path_to_uri(path);
        if self.index.file_version(&uri).is_some_and(|v| v > 0) {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let program = self.parser.parse(path, &text)?;
        let definitions = collect_definitions(&program);

        let Some(generation) = self.index.begin_file(&uri) else {
            return Ok(None);
        };
        let mut added = 0;
        for def in &definitions {
            if !self.index.add_file_symbol(generation, &uri, def) {
                debug!(uri = %uri, added, "open document took over during indexing");
                return Ok(None);
            }
            added += 1;
        }
        debug!(uri = %uri, symbols = added, "indexed file");
        Ok(Some(added))
    }

    /// Run [`scan`](Self::scan) on a named background thread.
    pub fn spawn(&self, roots: Vec<PathBuf>) -> io::Result<JoinHandle<IndexStats>> {
        let indexer = self.clone();
        thread::Builder::new()
            .name("pscript-indexer".to_string())
            .spawn(move || indexer.scan(&roots))
    }

    fn selects(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.accepts_extension(ext))
    }
}

fn is_excluded(entry: &DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return false;
    };
    name.starts_with('.') || (entry.file_type().is_dir() && BUILD_DIRS.contains(&name))
}
