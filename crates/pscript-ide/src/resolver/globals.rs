//! File-global declarations.

use pscript_syntax::*;

/// Every top-level declaration site of `name`, in source order.
///
/// Enum members resolve to the enum's own name. Method implementations
/// (`procedure TFoo.Bar`) are not globals.
pub(crate) fn find_globals<'a>(program: &'a Program, name: &str) -> Vec<&'a Ident> {
    let mut found = Vec::new();
    for decl in program.decls() {
        match decl {
            Decl::Var(var) => found.extend(var.names.iter().filter(|n| n.is(name))),
            Decl::Const(c) if c.name.is(name) => found.push(&c.name),
            Decl::Type(ty) => {
                let member_match = match &ty.def {
                    TypeDef::Enum(def) => def.members.iter().any(|m| m.name.is(name)),
                    _ => false,
                };
                if ty.name.is(name) || member_match {
                    found.push(&ty.name);
                }
            }
            Decl::Routine(routine) if routine.class_name.is_none() && routine.name.is(name) => {
                found.push(&routine.name)
            }
            _ => {}
        }
    }
    found
}
