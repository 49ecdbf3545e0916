//! Flattening a parsed file into workspace index entries.

pub mod signature;

use lsp_types::Range;
use pscript_syntax::*;

use crate::position::span_to_range;
use crate::workspace_index::{Location, SymbolKind, SymbolLocation};

/// A definition found in one file, not yet bound to a uri.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolDefinition {
    pub name: String,
    pub kind: SymbolKind,
    /// Range of the defining name.
    pub range: Range,
    pub container_name: String,
    pub detail: String,
}

impl SymbolDefinition {
    fn new(ident: &Ident, kind: SymbolKind, container: &str, detail: String) -> Self {
        Self {
            name: ident.name.clone(),
            kind,
            range: span_to_range(ident.span),
            container_name: container.to_string(),
            detail,
        }
    }

    pub fn to_location(&self, uri: &str) -> SymbolLocation {
        SymbolLocation {
            name: self.name.clone(),
            kind: self.kind,
            location: Location::new(uri, self.range),
            container_name: self.container_name.clone(),
            detail: self.detail.clone(),
        }
    }
}

/// Kind of the symbol a type declaration introduces.
pub fn type_kind(def: &TypeDef) -> SymbolKind {
    match def {
        TypeDef::Class(_) => SymbolKind::Class,
        TypeDef::Record(_) => SymbolKind::Struct,
        TypeDef::Interface(_) => SymbolKind::Interface,
        TypeDef::Enum(_) => SymbolKind::Enum,
        TypeDef::Helper(_) => SymbolKind::Helper,
        TypeDef::Array(_) | TypeDef::Set(_) | TypeDef::Alias(_) => SymbolKind::TypeAlias,
    }
}

pub fn routine_kind(routine: &RoutineDecl) -> SymbolKind {
    match routine.kind {
        RoutineKind::Constructor => SymbolKind::Constructor,
        _ if routine.class_name.is_some() => SymbolKind::Method,
        _ => SymbolKind::Function,
    }
}

/// Top-level definitions of `program` in source order, including type
/// members, enum members and method implementations.
pub fn collect_definitions(program: &Program) -> Vec<SymbolDefinition> {
    let mut defs = Vec::new();

    if let Some(name) = &program.name {
        let keyword = match program.kind {
            ProgramKind::Unit => "unit",
            _ => "program",
        };
        defs.push(SymbolDefinition::new(
            name,
            SymbolKind::Module,
            "",
            format!("{keyword} {}", name.name),
        ));
    }

    for decl in program.decls() {
        collect_decl(decl, &mut defs);
    }
    defs
}

fn collect_decl(decl: &Decl, defs: &mut Vec<SymbolDefinition>) {
    match decl {
        Decl::Var(var) => {
            for name in &var.names {
                defs.push(SymbolDefinition::new(
                    name,
                    SymbolKind::Variable,
                    "",
                    signature::var(name, var),
                ));
            }
        }
        Decl::Const(c) => defs.push(SymbolDefinition::new(
            &c.name,
            SymbolKind::Constant,
            "",
            signature::constant(c),
        )),
        Decl::Type(ty) => collect_type(ty, defs),
        Decl::Routine(routine) => {
            let container = routine
                .class_name
                .as_ref()
                .map_or("", |c| c.name.as_str());
            defs.push(SymbolDefinition::new(
                &routine.name,
                routine_kind(routine),
                container,
                signature::routine(routine),
            ));
        }
    }
}

fn collect_type(decl: &TypeDecl, defs: &mut Vec<SymbolDefinition>) {
    let owner = decl.name.name.as_str();
    defs.push(SymbolDefinition::new(
        &decl.name,
        type_kind(&decl.def),
        "",
        signature::type_decl(decl),
    ));

    if let TypeDef::Enum(def) = &decl.def {
        for member in &def.members {
            defs.push(SymbolDefinition::new(
                &member.name,
                SymbolKind::EnumMember,
                owner,
                format!("{owner}.{}", member.name.name),
            ));
        }
    }

    for member in decl.members() {
        match member {
            Member::Field(field) => {
                for name in &field.names {
                    defs.push(SymbolDefinition::new(
                        name,
                        SymbolKind::Field,
                        owner,
                        signature::field(name, field),
                    ));
                }
            }
            Member::Method(method) => {
                let kind = match method.kind {
                    RoutineKind::Constructor => SymbolKind::Constructor,
                    _ => SymbolKind::Method,
                };
                defs.push(SymbolDefinition::new(
                    &method.name,
                    kind,
                    owner,
                    signature::routine(method),
                ));
            }
            Member::Property(property) => defs.push(SymbolDefinition::new(
                &property.name,
                SymbolKind::Property,
                owner,
                signature::property(property),
            )),
        }
    }
}
