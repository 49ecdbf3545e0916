//! Textual reference search over parsed documents.
//!
//! Every identifier occurrence spelled exactly like the target counts:
//! declarations, uses in expressions, member accesses, type references,
//! heritage lists and `uses` clauses. Scoping is left to the caller, who
//! narrows the search with a [`ScopeFilter`] for locals and parameters.

use lsp_types::{Position, Range};
use pscript_syntax::visit::walk_program;
use pscript_syntax::*;

use crate::position::span_to_range;
use crate::workspace_index::Location;

/// Restricts a reference search to one document, optionally to a range in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeFilter {
    pub uri: String,
    pub range: Option<Range>,
}

impl ScopeFilter {
    fn admits_uri(&self, uri: &str) -> bool {
        self.uri == uri
    }

    fn admits(&self, range: Range) -> bool {
        self.range.is_none_or(|outer| {
            key(outer.start) <= key(range.start) && key(range.end) <= key(outer.end)
        })
    }
}

fn key(pos: Position) -> (u32, u32) {
    (pos.line, pos.character)
}

/// Occurrences of `name` across `documents`, sorted by uri and position.
pub fn find_references<'a>(
    documents: impl IntoIterator<Item = (&'a str, &'a Program)>,
    name: &str,
    scope_filter: Option<&ScopeFilter>,
) -> Vec<Location> {
    let mut locations = Vec::new();
    if name.is_empty() {
        return locations;
    }
    for (uri, program) in documents {
        if scope_filter.is_some_and(|f| !f.admits_uri(uri)) {
            continue;
        }
        for ident in occurrences(program, name) {
            let range = span_to_range(ident.span);
            if scope_filter.is_none_or(|f| f.admits(range)) {
                locations.push(Location::new(uri, range));
            }
        }
    }
    locations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    locations.dedup();
    locations
}

/// Identifier nodes of `program` spelled `name`, in traversal order.
pub fn occurrences<'a>(program: &'a Program, name: &str) -> Vec<&'a Ident> {
    let mut found: Vec<&'a Ident> = Vec::new();
    let mut push = |ident: &'a Ident| {
        if ident.is(name) {
            found.push(ident);
        }
    };
    walk_program(program, &mut |node: NodeRef<'a>| {
        match node {
            NodeRef::Uses(clause) => clause.units.iter().for_each(&mut push),
            NodeRef::Var(var) => var.names.iter().for_each(&mut push),
            NodeRef::Const(c) => push(&c.name),
            NodeRef::Type(ty) => {
                push(&ty.name);
                match &ty.def {
                    TypeDef::Class(class) => {
                        class.parent.iter().chain(&class.interfaces).for_each(&mut push)
                    }
                    TypeDef::Interface(def) => def.parent.iter().for_each(&mut push),
                    _ => {}
                }
            }
            NodeRef::Routine(routine) => {
                routine.class_name.iter().for_each(&mut push);
                push(&routine.name);
            }
            NodeRef::Param(param) => push(&param.name),
            NodeRef::Field(field) => field.names.iter().for_each(&mut push),
            NodeRef::Property(property) => {
                push(&property.name);
                property
                    .read
                    .iter()
                    .chain(&property.write)
                    .for_each(&mut push);
            }
            NodeRef::EnumMember(member) => push(&member.name),
            NodeRef::TypeRef(ty) => push(&ty.name),
            NodeRef::Stmt(Stmt::For { var, .. }) => push(var),
            NodeRef::Expr(expr) => match &expr.kind {
                ExprKind::Ident(ident) => push(ident),
                ExprKind::Member { member, .. } => push(member),
                ExprKind::Inherited(Some(ident)) => push(ident),
                _ => {}
            },
            NodeRef::Program(_) | NodeRef::Block(_) | NodeRef::Stmt(_) => {}
        }
        VisitFlow::Continue
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    const SHAPES: &str = "\
type
  TShape = class
    FArea: Float;
    property Area: Float read FArea;
  end;
  TSquare = class(TShape)
  end;
var s: TShape;
";

    #[test]
    fn test_finds_declarations_and_uses() {
        let main = parse(SHAPES).program;
        let refs = find_references([("file:///shapes.pas", &main)], "TShape", None);
        let ranges: Vec<_> = refs.into_iter().map(|l| l.range).collect();
        assert_eq!(ranges, vec![at(1, 2, 8), at(5, 18, 24), at(7, 7, 13)]);

        let fields = find_references([("file:///shapes.pas", &main)], "FArea", None);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_spans_multiple_documents() {
        let shapes = parse(SHAPES).program;
        let user = parse("uses Shapes;\nvar t: TShape;\nbegin\n  t := TShape.Create;\nend.").program;
        let refs = find_references(
            [("file:///b.pas", &user), ("file:///a.pas", &shapes)],
            "TShape",
            None,
        );
        let uris: Vec<_> = refs.iter().map(|l| l.uri.as_str()).collect();
        assert_eq!(
            uris,
            [
                "file:///a.pas",
                "file:///a.pas",
                "file:///a.pas",
                "file:///b.pas",
                "file:///b.pas"
            ]
        );
    }

    #[test]
    fn test_scope_filter_limits_region() {
        let source = "\
procedure A;
var n: Integer;
begin
  n := 1;
end;
procedure B;
var n: Integer;
begin
  n := 2;
end;
";
        let program = parse(source).program;
        let filter = ScopeFilter {
            uri: "file:///x.pas".to_string(),
            range: Some(Range::new(Position::new(5, 0), Position::new(9, 4))),
        };
        let refs = find_references(
            [("file:///x.pas", &program), ("file:///y.pas", &program)],
            "n",
            Some(&filter),
        );
        let ranges: Vec<_> = refs.into_iter().map(|l| l.range).collect();
        assert_eq!(ranges, vec![at(6, 4, 5), at(8, 2, 3)]);
    }
}
