//! Scope-aware go-to-definition.
//!
//! A name at a cursor is resolved by trying, in order, and stopping at the
//! first step with a result:
//!
//! 1. locals: parameters, then declarations of the enclosing routine that
//!    precede the cursor (nested blocks only when they contain it)
//! 2. members of the enclosing class and its ancestors
//! 3. top-level declarations of the file
//! 4. definitions in units named by `uses` clauses
//! 5. any other file in the workspace index, nearest directory first
//!
//! Names are matched exactly.

mod globals;
mod members;
mod scope;

use std::collections::HashSet;

use lsp_types::Position;
use pscript_syntax::{Ident, Pos, Program, RoutineDecl, TypeDecl};

use crate::position::{span_to_range, to_compiler_position};
use crate::uri::{uri_directory, uri_stem};
use crate::workspace_index::{Location, SymbolKind, WorkspaceIndex};

use self::globals::find_globals;
use self::members::{find_member, find_type};
use self::scope::{enclosing_at, find_local, find_param, find_script_local};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Local,
    Parameter,
    ClassMember,
    Global,
    Unknown,
}

/// Where a name resolves within one file.
#[derive(Clone, Debug)]
pub struct ScopeInfo<'a> {
    pub kind: ScopeKind,
    /// Innermost routine containing the cursor.
    pub routine: Option<&'a RoutineDecl>,
    /// Innermost class containing the cursor, or the owner of the method
    /// implementation containing it.
    pub class: Option<&'a TypeDecl>,
    /// Declaration sites found in the file, empty for [`ScopeKind::Unknown`].
    pub declarations: Vec<&'a Ident>,
}

/// Classify `name` at an editor position using only `program`.
pub fn scope_at<'a>(program: &'a Program, position: Position, name: &str) -> ScopeInfo<'a> {
    file_scope(program, to_compiler_position(position), name)
}

fn file_scope<'a>(program: &'a Program, pos: Pos, name: &str) -> ScopeInfo<'a> {
    let enclosing = enclosing_at(program, pos);
    let routine = enclosing.routines.first().copied();
    let class = enclosing.type_decl.or_else(|| {
        enclosing
            .routines
            .iter()
            .find_map(|r| r.class_name.as_ref())
            .and_then(|owner| find_type(program, &owner.name))
    });
    let info = |kind, declarations| ScopeInfo {
        kind,
        routine,
        class,
        declarations,
    };

    for routine in enclosing.routines.iter().copied() {
        if let Some(param) = find_param(routine, name) {
            return info(ScopeKind::Parameter, vec![param]);
        }
        if let Some(local) = find_local(routine, pos, name) {
            return info(ScopeKind::Local, vec![local]);
        }
    }
    if enclosing.routines.is_empty()
        && let Some(local) = find_script_local(program, pos, name)
    {
        return info(ScopeKind::Local, vec![local]);
    }

    if let Some(class) = class
        && let Some(member) = find_member(program, class, name)
    {
        return info(ScopeKind::ClassMember, vec![member]);
    }

    let globals = find_globals(program, name);
    if !globals.is_empty() {
        return info(ScopeKind::Global, globals);
    }

    info(ScopeKind::Unknown, Vec::new())
}

/// Definition lookup for one request.
#[derive(Clone, Copy, Default)]
pub struct Resolver<'a> {
    index: Option<&'a WorkspaceIndex>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: Option<&'a WorkspaceIndex>) -> Self {
        Self { index }
    }

    /// Definition sites of `name` referenced at `position` in `uri`.
    pub fn resolve_definition(
        &self,
        uri: &str,
        program: Option<&Program>,
        position: Position,
        name: &str,
    ) -> Vec<Location> {
        let Some(program) = program else {
            return Vec::new();
        };
        if name.is_empty() {
            return Vec::new();
        }

        let scope = scope_at(program, position, name);
        if scope.kind != ScopeKind::Unknown {
            tracing::debug!(uri, name, scope = ?scope.kind, "resolved in file");
            return scope
                .declarations
                .iter()
                .map(|ident| Location::new(uri, span_to_range(ident.span)))
                .collect();
        }

        let Some(index) = self.index else {
            return Vec::new();
        };

        let imported = self.resolve_in_imports(index, uri, program, name);
        if !imported.is_empty() {
            tracing::debug!(uri, name, count = imported.len(), "resolved in imported units");
            return imported;
        }

        let mut hits: Vec<Location> = index
            .find_symbol(name)
            .into_iter()
            .map(|s| s.location)
            .filter(|l| l.uri != uri)
            .collect();
        let directory = uri_directory(uri);
        hits.sort_by(|a, b| {
            let rank = |l: &Location| uri_directory(&l.uri) != directory;
            rank(a)
                .cmp(&rank(b))
                .then_with(|| a.sort_key().cmp(&b.sort_key()))
        });
        tracing::debug!(uri, name, count = hits.len(), "resolved in workspace");
        hits
    }

    fn resolve_in_imports(
        &self,
        index: &WorkspaceIndex,
        uri: &str,
        program: &Program,
        name: &str,
    ) -> Vec<Location> {
        let units: Vec<&str> = program.imported_units().map(|u| u.name.as_str()).collect();
        if units.is_empty() {
            return Vec::new();
        }
        let candidates = unit_uris(index, &units);
        let mut hits: Vec<Location> = index
            .find_symbol(name)
            .into_iter()
            .map(|s| s.location)
            .filter(|l| l.uri != uri && candidates.contains(&l.uri))
            .collect();
        hits.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        hits
    }
}

/// Files that may define one of `units`: files declaring a unit of that
/// name and files whose stem is that name, ignoring ASCII case.
fn unit_uris(index: &WorkspaceIndex, units: &[&str]) -> HashSet<String> {
    let matches = |candidate: &str| units.iter().any(|u| u.eq_ignore_ascii_case(candidate));
    let mut uris: HashSet<String> = index
        .find_symbols_by_kind(SymbolKind::Module)
        .into_iter()
        .filter(|module| matches(&module.name))
        .map(|module| module.location.uri)
        .collect();
    uris.extend(
        index
            .files()
            .into_iter()
            .filter(|file| uri_stem(&file.uri).is_some_and(|stem| matches(&stem)))
            .map(|file| file.uri),
    );
    uris
}
