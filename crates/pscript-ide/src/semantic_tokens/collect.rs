//! Classifying a parsed file into semantic tokens.

use std::collections::HashMap;

use pscript_syntax::visit::{Visitor, walk_program};
use pscript_syntax::*;

use super::SemanticToken;
use super::legend::{Legend, Modifier, Modifiers, TokenKind};

const BUILTIN_TYPES: &[&str] = &[
    "Boolean", "Byte", "Cardinal", "Char", "Currency", "Double", "Extended", "Float", "Int64",
    "Integer", "Real", "Single", "String", "TDateTime", "Variant", "Word",
];

fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.iter().any(|b| b.eq_ignore_ascii_case(name))
}

fn type_token(def: &TypeDef) -> (TokenKind, Modifiers) {
    let kind = match def {
        TypeDef::Class(_) | TypeDef::Helper(_) => TokenKind::Class,
        TypeDef::Record(_) => TokenKind::Struct,
        TypeDef::Interface(_) => TokenKind::Interface,
        TypeDef::Enum(_) => TokenKind::Enum,
        TypeDef::Array(_) | TypeDef::Set(_) | TypeDef::Alias(_) => TokenKind::Type,
    };
    let is_abstract = matches!(def, TypeDef::Class(class) if class.is_abstract);
    (kind, Modifiers::NONE.with_if(Modifier::Abstract, is_abstract))
}

/// Tokens for `program`, sorted by position, in the indices of `legend`.
pub fn compute_semantic_tokens(program: &Program, legend: &Legend) -> Vec<SemanticToken> {
    let mut collector = Collector::new(program);
    walk_program(program, &mut collector);

    let mut tokens: Vec<SemanticToken> = collector
        .raw
        .into_iter()
        .filter_map(|(span, kind, modifiers)| {
            let token_type = legend.type_index(kind)?;
            if !span.is_valid() || span.start.line != span.end.line || span.end.col <= span.start.col
            {
                return None;
            }
            Some(SemanticToken {
                line: span.start.line - 1,
                start_char: span.start.col - 1,
                length: span.end.col - span.start.col,
                token_type,
                modifiers: legend.modifier_bits(modifiers),
            })
        })
        .collect();
    tokens.sort_by_key(|t| (t.line, t.start_char));
    tokens.dedup_by_key(|t| (t.line, t.start_char));
    tokens
}

struct Collector<'a> {
    /// Classification of names declared at file level.
    declared: HashMap<&'a str, (TokenKind, Modifiers)>,
    current_type: Option<Span>,
    routines: Vec<&'a RoutineDecl>,
    raw: Vec<(Span, TokenKind, Modifiers)>,
}

impl<'a> Collector<'a> {
    fn new(program: &'a Program) -> Self {
        let mut declared = HashMap::new();
        for decl in program.decls() {
            match decl {
                Decl::Const(c) => {
                    declared.insert(
                        c.name.name.as_str(),
                        (TokenKind::Variable, Modifiers::NONE.with(Modifier::Readonly)),
                    );
                }
                Decl::Type(ty) => {
                    declared.insert(ty.name.name.as_str(), type_token(&ty.def));
                    if let TypeDef::Enum(def) = &ty.def {
                        for member in &def.members {
                            declared.insert(
                                member.name.name.as_str(),
                                (TokenKind::EnumMember, Modifiers::NONE.with(Modifier::Readonly)),
                            );
                        }
                    }
                }
                Decl::Routine(routine) if routine.class_name.is_none() => {
                    declared.insert(
                        routine.name.name.as_str(),
                        (TokenKind::Function, Modifiers::NONE),
                    );
                }
                Decl::Var(_) | Decl::Routine(_) => {}
            }
        }
        Self {
            declared,
            current_type: None,
            routines: Vec::new(),
            raw: Vec::new(),
        }
    }

    fn push(&mut self, ident: &Ident, kind: TokenKind, modifiers: Modifiers) {
        self.raw.push((ident.span, kind, modifiers));
    }

    fn declare(&mut self, ident: &Ident, kind: TokenKind, modifiers: Modifiers) {
        self.push(ident, kind, modifiers.with(Modifier::Declaration));
    }

    fn type_name(&mut self, ident: &Ident, fallback: TokenKind) {
        let (kind, modifiers) = if is_builtin_type(&ident.name) {
            (TokenKind::Type, Modifiers::NONE.with(Modifier::DefaultLibrary))
        } else {
            self.declared
                .get(ident.name.as_str())
                .copied()
                .unwrap_or((fallback, Modifiers::NONE))
        };
        // Only the modifiers that describe the type itself carry over.
        let modifiers = Modifiers::NONE
            .with_if(Modifier::DefaultLibrary, modifiers.contains(Modifier::DefaultLibrary));
        self.push(ident, kind, modifiers);
    }

    fn is_parameter(&self, ident: &Ident) -> bool {
        self.routines
            .iter()
            .filter(|r| r.span.contains(ident.span.start))
            .any(|r| r.params.iter().any(|p| p.name.is(&ident.name)))
    }

    fn name_use(&mut self, ident: &Ident) {
        if self.is_parameter(ident) {
            self.push(ident, TokenKind::Parameter, Modifiers::NONE);
            return;
        }
        let (kind, modifiers) = self
            .declared
            .get(ident.name.as_str())
            .copied()
            .unwrap_or((TokenKind::Variable, Modifiers::NONE));
        self.push(ident, kind, modifiers);
    }

    fn routine(&mut self, routine: &'a RoutineDecl) {
        self.routines.retain(|r| r.span.encloses(&routine.span));
        self.routines.push(routine);

        if let Some(class_name) = &routine.class_name {
            self.type_name(class_name, TokenKind::Class);
        }
        let is_member = self
            .current_type
            .is_some_and(|ty| ty.encloses(&routine.span));
        let kind = if is_member || routine.class_name.is_some() {
            TokenKind::Method
        } else {
            TokenKind::Function
        };
        let modifiers = Modifiers::NONE
            .with_if(Modifier::Static, routine.is_class_method)
            .with_if(Modifier::Abstract, routine.has_directive("abstract"));
        self.declare(&routine.name, kind, modifiers);
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(ident) => self.name_use(ident),
            ExprKind::Call { callee, .. } => match &callee.kind {
                ExprKind::Ident(ident) if !self.is_parameter(ident) => {
                    let declared = self.declared.get(ident.name.as_str()).map(|(kind, _)| *kind);
                    match declared {
                        // `TFoo(x)` is a cast, not a call.
                        Some(kind) if kind != TokenKind::Function => self.type_name(ident, kind),
                        _ => self.push(ident, TokenKind::Function, Modifiers::NONE),
                    }
                }
                ExprKind::Member { member, .. } => {
                    self.push(member, TokenKind::Method, Modifiers::NONE)
                }
                _ => {}
            },
            ExprKind::Member { member, .. } => {
                self.push(member, TokenKind::Property, Modifiers::NONE)
            }
            ExprKind::Inherited(Some(ident)) => {
                self.push(ident, TokenKind::Method, Modifiers::NONE)
            }
            ExprKind::Int(_) | ExprKind::Float(_) => {
                self.raw.push((expr.span, TokenKind::Number, Modifiers::NONE))
            }
            ExprKind::Str(_) => self.raw.push((expr.span, TokenKind::String, Modifiers::NONE)),
            _ => {}
        }
    }
}

impl<'a> Visitor<'a> for Collector<'a> {
    fn enter(&mut self, node: NodeRef<'a>) -> VisitFlow {
        match node {
            NodeRef::Program(program) => {
                if let Some(name) = &program.name {
                    self.declare(name, TokenKind::Namespace, Modifiers::NONE);
                }
            }
            NodeRef::Uses(clause) => {
                for unit in &clause.units {
                    self.push(unit, TokenKind::Namespace, Modifiers::NONE);
                }
            }
            NodeRef::Var(var) => {
                for name in &var.names {
                    self.declare(name, TokenKind::Variable, Modifiers::NONE);
                }
            }
            NodeRef::Const(c) => {
                self.declare(
                    &c.name,
                    TokenKind::Variable,
                    Modifiers::NONE.with(Modifier::Readonly),
                );
            }
            NodeRef::Type(ty) => {
                self.current_type = Some(ty.span);
                let (kind, modifiers) = type_token(&ty.def);
                self.declare(&ty.name, kind, modifiers);
                match &ty.def {
                    TypeDef::Class(class) => {
                        if let Some(parent) = &class.parent {
                            self.type_name(parent, TokenKind::Class);
                        }
                        for interface in &class.interfaces {
                            self.type_name(interface, TokenKind::Interface);
                        }
                    }
                    TypeDef::Interface(def) => {
                        if let Some(parent) = &def.parent {
                            self.type_name(parent, TokenKind::Interface);
                        }
                    }
                    _ => {}
                }
            }
            NodeRef::Routine(routine) => self.routine(routine),
            NodeRef::Param(param) => {
                self.declare(&param.name, TokenKind::Parameter, Modifiers::NONE);
            }
            NodeRef::Field(field) => {
                let modifiers = Modifiers::NONE.with_if(Modifier::Static, field.is_class_var);
                for name in &field.names {
                    self.declare(name, TokenKind::Property, modifiers);
                }
            }
            NodeRef::Property(property) => {
                let modifiers = Modifiers::NONE
                    .with_if(Modifier::Readonly, property.write.is_none())
                    .with_if(Modifier::Static, property.is_class_property);
                self.declare(&property.name, TokenKind::Property, modifiers);
                for accessor in property.read.iter().chain(&property.write) {
                    self.push(accessor, TokenKind::Property, Modifiers::NONE);
                }
            }
            NodeRef::EnumMember(member) => {
                self.declare(
                    &member.name,
                    TokenKind::EnumMember,
                    Modifiers::NONE.with(Modifier::Readonly),
                );
            }
            NodeRef::TypeRef(ty) => self.type_name(&ty.name, TokenKind::Type),
            NodeRef::Stmt(Stmt::For { var, declares, .. }) => {
                let modifiers = Modifiers::NONE.with_if(Modifier::Declaration, *declares);
                self.push(var, TokenKind::Variable, modifiers);
            }
            NodeRef::Expr(expr) => self.expr(expr),
            NodeRef::Block(_) | NodeRef::Stmt(_) => {}
        }
        VisitFlow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        let result = parse(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        compute_semantic_tokens(&result.program, &Legend::standard())
            .iter()
            .map(|t| {
                let kind = TokenKind::ALL[t.token_type as usize];
                let modifiers: Vec<String> = Modifier::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| t.modifiers & (1 << i) != 0)
                    .map(|(_, m)| format!("{m:?}"))
                    .collect();
                format!(
                    "{}:{} {} {kind:?} [{}]",
                    t.line,
                    t.start_char,
                    t.length,
                    modifiers.join(",")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_classifies_declarations_and_uses() {
        let source = "\
type TPoint = class
  X: Integer;
  class var Count: Integer;
  property Len: Integer read X;
  procedure Move; abstract;
end;
const Max = 3;
var p: TPoint;
begin
  p.Move(Max, 'a');
end.
";
        insta::assert_snapshot!(render(source), @r"
        0:5 6 Class [Declaration]
        1:2 1 Property [Declaration]
        1:5 7 Type [DefaultLibrary]
        2:12 5 Property [Declaration,Static]
        2:19 7 Type [DefaultLibrary]
        3:11 3 Property [Declaration,Readonly]
        3:16 7 Type [DefaultLibrary]
        3:29 1 Property []
        4:12 4 Method [Declaration,Abstract]
        6:6 3 Variable [Declaration,Readonly]
        6:12 1 Number []
        7:4 1 Variable [Declaration]
        7:7 6 Class []
        9:2 1 Variable []
        9:4 4 Method []
        9:9 3 Variable [Readonly]
        9:14 3 String []
        ");
    }

    #[test]
    fn test_parameters_and_calls() {
        let source = "\
function Twice(N: Integer): Integer;
begin
  Result := N * 2;
end;
begin
  Twice(4);
end.
";
        insta::assert_snapshot!(render(source), @r"
        0:9 5 Function [Declaration]
        0:15 1 Parameter [Declaration]
        0:18 7 Type [DefaultLibrary]
        0:28 7 Type [DefaultLibrary]
        2:2 6 Variable []
        2:12 1 Parameter []
        2:16 1 Number []
        5:2 5 Function []
        5:8 1 Number []
        ");
    }

    #[test]
    fn test_kinds_missing_from_legend_are_skipped() {
        let legend = Legend::from_lsp(&lsp_types::SemanticTokensLegend {
            token_types: vec![lsp_types::SemanticTokenType::NUMBER],
            token_modifiers: vec![],
        });
        let program = parse("var x: Integer;\nx := 10;").program;
        let tokens = compute_semantic_tokens(&program, &legend);
        assert_eq!(
            tokens,
            vec![SemanticToken {
                line: 1,
                start_char: 5,
                length: 2,
                token_type: 0,
                modifiers: 0,
            }]
        );
    }
}
