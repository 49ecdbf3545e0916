//! Workspace-wide symbol index.
//!
//! Maps every symbol name to all of its known definition sites, plus a
//! reverse uri → [`FileInfo`] registry so a file's contributions can be
//! dropped without scanning every name. All state sits behind a single
//! reader/writer lock; readers get owned copies.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lsp_types::Range;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::symbols::SymbolDefinition;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Variable,
    Constant,
    Class,
    Struct,
    Enum,
    EnumMember,
    Interface,
    Field,
    Property,
    TypeAlias,
    Helper,
    Module,
}

impl SymbolKind {
    pub fn to_lsp(self) -> lsp_types::SymbolKind {
        use lsp_types::SymbolKind as Lsp;
        match self {
            SymbolKind::Function => Lsp::FUNCTION,
            SymbolKind::Method => Lsp::METHOD,
            SymbolKind::Constructor => Lsp::CONSTRUCTOR,
            SymbolKind::Variable => Lsp::VARIABLE,
            SymbolKind::Constant => Lsp::CONSTANT,
            SymbolKind::Class | SymbolKind::Helper => Lsp::CLASS,
            SymbolKind::Struct => Lsp::STRUCT,
            SymbolKind::Enum => Lsp::ENUM,
            SymbolKind::EnumMember => Lsp::ENUM_MEMBER,
            SymbolKind::Interface => Lsp::INTERFACE,
            SymbolKind::Field => Lsp::FIELD,
            SymbolKind::Property => Lsp::PROPERTY,
            SymbolKind::TypeAlias => Lsp::TYPE_PARAMETER,
            SymbolKind::Module => Lsp::MODULE,
        }
    }
}

/// A uri plus an editor range.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }

    /// Ordering by uri, then start, then end.
    pub fn sort_key(&self) -> (&str, u32, u32, u32, u32) {
        let Range { start, end } = self.range;
        (&self.uri, start.line, start.character, end.line, end.character)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolLocation {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
    /// Enclosing type, empty when there is none.
    pub container_name: String,
    /// Rendered signature.
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub uri: String,
    pub version: i32,
    /// Contents come from an editor buffer rather than the disk.
    pub open: bool,
    pub names: BTreeSet<String>,
    /// Changes whenever the file's contributions are replaced wholesale.
    generation: u64,
}

#[derive(Default)]
struct IndexState {
    symbols: BTreeMap<String, Vec<SymbolLocation>>,
    files: HashMap<String, FileInfo>,
    next_generation: u64,
}

impl IndexState {
    fn register(&mut self, uri: &str, version: i32, open: bool) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.files.insert(
            uri.to_string(),
            FileInfo {
                uri: uri.to_string(),
                version,
                open,
                names: BTreeSet::new(),
                generation,
            },
        );
        generation
    }

    fn insert(&mut self, symbol: SymbolLocation) {
        if !self.files.contains_key(&symbol.location.uri) {
            self.register(&symbol.location.uri, 0, false);
        }
        let Some(file) = self.files.get_mut(&symbol.location.uri) else {
            return;
        };
        file.names.insert(symbol.name.clone());
        self.symbols
            .entry(symbol.name.clone())
            .or_default()
            .push(symbol);
    }

    fn remove_file(&mut self, uri: &str) -> Option<FileInfo> {
        let info = self.files.remove(uri)?;
        for name in &info.names {
            if let Some(locations) = self.symbols.get_mut(name) {
                locations.retain(|s| s.location.uri != uri);
                if locations.is_empty() {
                    self.symbols.remove(name);
                }
            }
        }
        Some(info)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum MatchTier {
    Exact = 0,
    Prefix = 1,
    Substring = 2,
}

#[derive(Default)]
pub struct WorkspaceIndex {
    state: RwLock<IndexState>,
}

impl WorkspaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one definition site. Duplicates are kept.
    pub fn add_symbol(
        &self,
        name: impl Into<String>,
        kind: SymbolKind,
        uri: impl Into<String>,
        range: Range,
        container_name: impl Into<String>,
        detail: impl Into<String>,
    ) {
        let symbol = SymbolLocation {
            name: name.into(),
            kind,
            location: Location::new(uri, range),
            container_name: container_name.into(),
            detail: detail.into(),
        };
        self.state.write().insert(symbol);
    }

    /// Drop every location contributed by `uri`.
    pub fn remove_file(&self, uri: &str) {
        self.state.write().remove_file(uri);
    }

    /// Replace everything `uri` contributes with `symbols` in one step.
    ///
    /// Returns `false`, leaving the index untouched, when the registered
    /// version of the file is newer than `version`.
    pub fn update_file(&self, uri: &str, version: i32, symbols: &[SymbolDefinition]) -> bool {
        let mut state = self.state.write();
        if state.files.get(uri).is_some_and(|f| f.version > version) {
            return false;
        }
        state.remove_file(uri);
        state.register(uri, version, true);
        for def in symbols {
            state.insert(def.to_location(uri));
        }
        true
    }

    /// Clear the on-disk contribution of `uri` ahead of a re-index.
    ///
    /// Returns the generation to pass to [`add_file_symbol`](Self::add_file_symbol),
    /// or `None` when an open document owns the file.
    pub fn begin_file(&self, uri: &str) -> Option<u64> {
        let mut state = self.state.write();
        if state.files.get(uri).is_some_and(|f| f.open || f.version > 0) {
            return None;
        }
        state.remove_file(uri);
        Some(state.register(uri, 0, false))
    }

    /// Add one on-disk definition to the file started by
    /// [`begin_file`](Self::begin_file). Returns `false`, adding nothing, once
    /// the file has been replaced or removed since.
    pub fn add_file_symbol(&self, generation: u64, uri: &str, def: &SymbolDefinition) -> bool {
        let mut state = self.state.write();
        if state.files.get(uri).is_none_or(|f| f.generation != generation) {
            return false;
        }
        state.insert(def.to_location(uri));
        true
    }

    pub fn file_version(&self, uri: &str) -> Option<i32> {
        self.state.read().files.get(uri).map(|f| f.version)
    }

    pub fn files(&self) -> Vec<FileInfo> {
        let mut files: Vec<_> = self.state.read().files.values().cloned().collect();
        files.sort_by(|a, b| a.uri.cmp(&b.uri));
        files
    }

    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    /// Number of distinct names.
    pub fn symbol_count(&self) -> usize {
        self.state.read().symbols.len()
    }

    pub fn location_count(&self) -> usize {
        self.state.read().symbols.values().map(Vec::len).sum()
    }

    pub fn find_symbol(&self, name: &str) -> Vec<SymbolLocation> {
        self.state
            .read()
            .symbols
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn find_symbols_by_kind(&self, kind: SymbolKind) -> Vec<SymbolLocation> {
        self.state
            .read()
            .symbols
            .values()
            .flatten()
            .filter(|s| s.kind == kind)
            .cloned()
            .collect()
    }

    pub fn find_symbols_in_file(&self, uri: &str) -> Vec<SymbolLocation> {
        let state = self.state.read();
        let Some(info) = state.files.get(uri) else {
            return Vec::new();
        };
        info.names
            .iter()
            .filter_map(|name| state.symbols.get(name))
            .flatten()
            .filter(|s| s.location.uri == uri)
            .cloned()
            .collect()
    }

    /// Case-insensitive ranked search: exact matches, then prefix matches,
    /// then substring matches. `max_results == 0` means unlimited.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<SymbolLocation> {
        let limit = if max_results == 0 {
            usize::MAX
        } else {
            max_results
        };
        let state = self.state.read();

        if query.is_empty() {
            return state
                .symbols
                .values()
                .flatten()
                .take(limit)
                .cloned()
                .collect();
        }

        let query = query.to_lowercase();
        let mut matches: Vec<(MatchTier, &SymbolLocation)> = Vec::new();
        for (name, locations) in &state.symbols {
            let lower = name.to_lowercase();
            let tier = if lower == query {
                MatchTier::Exact
            } else if lower.starts_with(&query) {
                MatchTier::Prefix
            } else if lower.contains(&query) {
                MatchTier::Substring
            } else {
                continue;
            };
            matches.extend(locations.iter().map(|s| (tier, s)));
        }
        // Stable: encounter order survives within a tier.
        matches.sort_by_key(|(tier, _)| *tier);
        matches
            .into_iter()
            .take(limit)
            .map(|(_, s)| s.clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.symbols.clear();
        state.files.clear();
    }
}
