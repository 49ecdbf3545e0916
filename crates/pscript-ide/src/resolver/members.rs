//! Class member lookup along the inheritance chain.

use std::collections::HashSet;

use pscript_syntax::*;

/// Top-level type declaration named `name`. A full declaration wins over
/// a forward one (`TFoo = class;`).
pub(crate) fn find_type<'a>(program: &'a Program, name: &str) -> Option<&'a TypeDecl> {
    let mut candidates = program.decls().filter_map(|decl| match decl {
        Decl::Type(ty) if ty.name.is(name) => Some(ty),
        _ => None,
    });
    let first = candidates.next()?;
    if !first.members().is_empty() {
        return Some(first);
    }
    Some(
        candidates
            .find(|ty| !ty.members().is_empty())
            .unwrap_or(first),
    )
}

/// Declaration of member `name` in `ty` or its ancestors.
///
/// Stops at the first ancestor that is not declared in `program`, and on
/// inheritance cycles.
pub(crate) fn find_member<'a>(
    program: &'a Program,
    ty: &'a TypeDecl,
    name: &str,
) -> Option<&'a Ident> {
    let mut visited = HashSet::new();
    let mut current = Some(ty);
    while let Some(ty) = current {
        if !visited.insert(ty.name.name.as_str()) {
            break;
        }
        if let Some(ident) = own_member(ty, name) {
            return Some(ident);
        }
        current = parent_name(ty).and_then(|parent| find_type(program, parent));
    }
    None
}

fn own_member<'a>(ty: &'a TypeDecl, name: &str) -> Option<&'a Ident> {
    ty.members().iter().find_map(|member| match member {
        Member::Field(field) => field.names.iter().find(|n| n.is(name)),
        Member::Method(method) => method.name.is(name).then_some(&method.name),
        Member::Property(property) => property.name.is(name).then_some(&property.name),
    })
}

pub(crate) fn parent_name(ty: &TypeDecl) -> Option<&str> {
    match &ty.def {
        TypeDef::Class(class) => class.parent.as_ref().map(|p| p.name.as_str()),
        TypeDef::Interface(def) => def.parent.as_ref().map(|p| p.name.as_str()),
        _ => None,
    }
}
