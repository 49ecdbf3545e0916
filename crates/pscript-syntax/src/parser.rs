//! Recursive-descent parser producing a [`Program`].
//!
//! The parser never fails outright: malformed input is reported through
//! [`ParseDiagnostic`]s and the parser resynchronizes on `;` or a section
//! keyword, so tooling always gets a (possibly partial) tree.

use std::ops::Range;

use derive_more::{Display, Error};

use crate::ast::*;
use crate::lexer::{Lexeme, Token, tokenize};
use crate::span::{LineMap, Span};

/// A syntax error with the span it was reported at.
#[derive(Debug, Clone, PartialEq, Display, Error)]
#[display("{span}: {message}")]
pub struct ParseDiagnostic {
    pub message: String,
    pub span: Span,
}

/// Output of [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub program: Program,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Parse a complete source file.
pub fn parse(source: &str) -> ParseResult {
    let (lexemes, lex_errors) = tokenize(source);
    let mut parser = Parser::new(source, lexemes);
    for range in lex_errors {
        let span = parser.lines.span(range);
        parser.diagnostics.push(ParseDiagnostic {
            message: "unrecognized character".to_string(),
            span,
        });
    }
    let program = parser.parse_program();
    let mut diagnostics = parser.diagnostics;
    diagnostics.sort_by_key(|d| d.span.start);
    ParseResult {
        program,
        diagnostics,
    }
}

const ROUTINE_DIRECTIVES: &[&str] = &[
    "virtual",
    "override",
    "abstract",
    "overload",
    "forward",
    "reintroduce",
    "static",
    "external",
    "deprecated",
    "inline",
    "final",
    "empty",
];

const VISIBILITY: &[&str] = &["private", "protected", "public", "published", "strict"];

struct Parser<'src> {
    source: &'src str,
    lexemes: Vec<Lexeme>,
    cursor: usize,
    lines: LineMap<'src>,
    diagnostics: Vec<ParseDiagnostic>,
    /// Inside the `interface` section of a unit routine headers have no body.
    in_interface_section: bool,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, lexemes: Vec<Lexeme>) -> Self {
        Self {
            source,
            lexemes,
            cursor: 0,
            lines: LineMap::new(source),
            diagnostics: Vec::new(),
            in_interface_section: false,
        }
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.lexemes.get(self.cursor + n).map(|l| l.token)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn at_any(&self, tokens: &[Token]) -> bool {
        self.peek().is_some_and(|t| tokens.contains(&t))
    }

    fn at_eof(&self) -> bool {
        self.cursor >= self.lexemes.len()
    }

    /// Current token is an identifier spelled `word` (ignoring case).
    fn at_word(&self, word: &str) -> bool {
        self.nth_is_word(0, word)
    }

    fn nth_is_word(&self, n: usize, word: &str) -> bool {
        match self.lexemes.get(self.cursor + n) {
            Some(l) if l.token == Token::Ident => {
                self.source[l.range.clone()].eq_ignore_ascii_case(word)
            }
            _ => false,
        }
    }

    fn at_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.at_word(w))
    }

    fn bump(&mut self) -> Option<Range<usize>> {
        let lexeme = self.lexemes.get(self.cursor)?;
        let range = lexeme.range.clone();
        self.cursor += 1;
        Some(range)
    }

    fn eat(&mut self, token: Token) -> Option<Range<usize>> {
        if self.at(token) { self.bump() } else { None }
    }

    fn expect(&mut self, token: Token) -> Option<Range<usize>> {
        if let Some(range) = self.eat(token) {
            return Some(range);
        }
        let found = self.peek().map_or("end of file", |t| t.describe());
        self.error(format!("expected {}, found {}", token.describe(), found));
        None
    }

    fn start_offset(&self) -> usize {
        self.lexemes
            .get(self.cursor)
            .map_or(self.source.len(), |l| l.range.start)
    }

    fn prev_end(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.lexemes.get(i))
            .map_or(0, |l| l.range.end)
    }

    fn span_from(&self, start: usize) -> Span {
        let end = self.prev_end().max(start);
        self.lines.span(start..end)
    }

    fn current_span(&self) -> Span {
        match self.lexemes.get(self.cursor) {
            Some(l) => self.lines.span(l.range.clone()),
            None => self.lines.span(self.source.len()..self.source.len()),
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.diagnostics.push(ParseDiagnostic {
            message: message.into(),
            span,
        });
    }

    /// Skip tokens until one of `stops` (not consumed) or a `;` (consumed).
    fn recover(&mut self, stops: &[Token]) {
        while let Some(token) = self.peek() {
            if stops.contains(&token) {
                return;
            }
            self.bump();
            if token == Token::Semicolon {
                return;
            }
        }
    }

    fn ident(&mut self) -> Option<Ident> {
        if self.at(Token::Ident) {
            let range = self.bump()?;
            let span = self.lines.span(range.clone());
            return Some(Ident::new(&self.source[range], span));
        }
        let found = self.peek().map_or("end of file", |t| t.describe());
        self.error(format!("expected identifier, found {}", found));
        None
    }

    /// `A` or `A.B.C`, spelled back with dots.
    fn qualified_ident(&mut self) -> Option<Ident> {
        let first = self.ident()?;
        let mut name = first.name;
        let mut span = first.span;
        while self.at(Token::Dot) && self.peek_nth(1) == Some(Token::Ident) {
            self.bump();
            let next = self.ident()?;
            name.push('.');
            name.push_str(&next.name);
            span = span.to(next.span);
        }
        Some(Ident::new(name, span))
    }

    fn ident_list(&mut self) -> Vec<Ident> {
        let mut names = Vec::new();
        if let Some(first) = self.ident() {
            names.push(first);
        }
        while self.eat(Token::Comma).is_some() {
            match self.ident() {
                Some(name) => names.push(name),
                None => break,
            }
        }
        names
    }

    // =========================================================================
    // Program structure
    // =========================================================================

    fn parse_program(&mut self) -> Program {
        let mut program = Program::empty();
        program.span = self.lines.span(0..self.source.len());

        if self.eat(Token::Program).is_some() {
            program.kind = ProgramKind::Program;
            program.name = self.qualified_ident();
            self.expect(Token::Semicolon);
        } else if self.eat(Token::Unit).is_some() {
            program.kind = ProgramKind::Unit;
            program.name = self.qualified_ident();
            self.expect(Token::Semicolon);
        }

        while !self.at_eof() {
            let before = self.cursor;
            match self.peek() {
                Some(Token::Uses) => {
                    let clause = self.parse_uses();
                    program.uses.push(clause);
                }
                Some(Token::Interface) if program.kind == ProgramKind::Unit => {
                    self.bump();
                    self.in_interface_section = true;
                }
                Some(Token::Implementation) => {
                    self.bump();
                    self.in_interface_section = false;
                }
                Some(
                    Token::Var
                    | Token::Const
                    | Token::Type
                    | Token::Procedure
                    | Token::Function
                    | Token::Constructor
                    | Token::Destructor,
                ) => {
                    let decls = self.parse_declaration_section();
                    program.items.extend(decls.into_iter().map(Item::Decl));
                }
                Some(Token::Class)
                    if matches!(
                        self.peek_nth(1),
                        Some(Token::Procedure | Token::Function)
                    ) =>
                {
                    let decls = self.parse_declaration_section();
                    program.items.extend(decls.into_iter().map(Item::Decl));
                }
                Some(Token::Begin) => {
                    let block = self.parse_block();
                    if self.eat(Token::Dot).is_some() {
                        program.main = Some(block);
                        break;
                    }
                    self.eat(Token::Semicolon);
                    program.items.push(Item::Stmt(Stmt::Block(block)));
                }
                Some(Token::End) => {
                    self.bump();
                    self.eat(Token::Dot);
                    break;
                }
                Some(Token::Dot | Token::Semicolon) => {
                    self.bump();
                }
                Some(_) => {
                    if let Some(stmt) = self.parse_stmt() {
                        program.items.push(Item::Stmt(stmt));
                    }
                    self.statement_terminator(&[Token::End]);
                }
                None => break,
            }
            if self.cursor == before {
                self.error("unexpected token");
                self.bump();
            }
        }

        if !self.at_eof() {
            self.error("unexpected input after end of program");
        }

        program
    }

    fn parse_uses(&mut self) -> UsesClause {
        let start = self.start_offset();
        self.expect(Token::Uses);
        let mut units = Vec::new();
        loop {
            match self.qualified_ident() {
                Some(unit) => units.push(unit),
                None => break,
            }
            // `in 'path'` for program-style uses
            if self.eat(Token::In).is_some() {
                self.eat(Token::String);
            }
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::Semicolon);
        UsesClause {
            units,
            span: self.span_from(start),
        }
    }

    /// One `var`/`const`/`type` section or one routine.
    fn parse_declaration_section(&mut self) -> Vec<Decl> {
        match self.peek() {
            Some(Token::Var) => {
                let start = self.start_offset();
                self.bump();
                self.parse_var_entries(start)
                    .into_iter()
                    .map(Decl::Var)
                    .collect()
            }
            Some(Token::Const) => self.parse_const_section().into_iter().map(Decl::Const).collect(),
            Some(Token::Type) => self.parse_type_section().into_iter().map(Decl::Type).collect(),
            _ => self
                .parse_routine(false)
                .map(Decl::Routine)
                .into_iter()
                .collect(),
        }
    }

    fn var_entry_follows(&self) -> bool {
        self.at(Token::Ident) && matches!(self.peek_nth(1), Some(Token::Comma | Token::Colon))
    }

    /// Entries of a `var` section; the keyword was consumed at `start`.
    fn parse_var_entries(&mut self, start: usize) -> Vec<VarDecl> {
        let mut decls = Vec::new();
        let mut entry_start = start;
        loop {
            match self.parse_var_entry(entry_start) {
                Some(decl) => {
                    decls.push(decl);
                    if self.expect(Token::Semicolon).is_none() {
                        self.recover(&[Token::Begin, Token::End]);
                    }
                }
                None => self.recover(&[Token::Begin, Token::End]),
            }
            if !self.var_entry_follows() {
                break;
            }
            entry_start = self.start_offset();
        }
        decls
    }

    fn parse_var_entry(&mut self, start: usize) -> Option<VarDecl> {
        let names = self.ident_list();
        if names.is_empty() {
            return None;
        }
        let ty = if self.eat(Token::Colon).is_some() {
            self.parse_type_ref()
        } else {
            None
        };
        let init = if self.eat(Token::Assign).is_some() || self.eat(Token::Eq).is_some() {
            Some(self.parse_expr())
        } else {
            None
        };
        Some(VarDecl {
            names,
            ty,
            init,
            span: self.span_from(start),
        })
    }

    fn parse_const_section(&mut self) -> Vec<ConstDecl> {
        let mut start = self.start_offset();
        self.expect(Token::Const);
        let mut decls = Vec::new();
        while self.at(Token::Ident) && matches!(self.peek_nth(1), Some(Token::Eq | Token::Colon)) {
            let Some(name) = self.ident() else { break };
            let ty = if self.eat(Token::Colon).is_some() {
                self.parse_type_ref()
            } else {
                None
            };
            let value = if self.eat(Token::Eq).is_some() || self.eat(Token::Assign).is_some() {
                Some(self.parse_expr())
            } else {
                None
            };
            let span = self.span_from(start);
            if self.expect(Token::Semicolon).is_none() {
                self.recover(&[Token::Begin, Token::End]);
            }
            decls.push(ConstDecl {
                name,
                ty,
                value,
                span,
            });
            start = self.start_offset();
        }
        decls
    }

    fn parse_type_section(&mut self) -> Vec<TypeDecl> {
        let mut start = self.start_offset();
        self.expect(Token::Type);
        let mut decls = Vec::new();
        while self.at(Token::Ident) && self.peek_nth(1) == Some(Token::Eq) {
            let Some(name) = self.ident() else { break };
            self.bump();
            let def = self.parse_type_def();
            let span = self.span_from(start);
            if self.expect(Token::Semicolon).is_none() {
                self.recover(&[Token::Begin]);
            }
            decls.push(TypeDecl { name, def, span });
            start = self.start_offset();
        }
        decls
    }

    fn parse_type_def(&mut self) -> TypeDef {
        let start = self.start_offset();
        match self.peek() {
            Some(Token::Class) => {
                self.bump();
                if self.at_word("helper") {
                    return self.parse_helper(start);
                }
                if self.eat(Token::Of).is_some() {
                    return match self.parse_type_ref() {
                        Some(ty) => TypeDef::Alias(ty),
                        None => TypeDef::Class(self.empty_class(start)),
                    };
                }
                self.parse_class(start)
            }
            Some(Token::Record) => {
                self.bump();
                if self.at_word("helper") {
                    return self.parse_helper(start);
                }
                let members = self.parse_members();
                self.expect(Token::End);
                TypeDef::Record(RecordDef {
                    members,
                    span: self.span_from(start),
                })
            }
            Some(Token::Interface) => {
                self.bump();
                let mut parent = None;
                if self.eat(Token::LParen).is_some() {
                    parent = self.qualified_ident();
                    self.expect(Token::RParen);
                }
                let members = self.parse_members();
                self.expect(Token::End);
                TypeDef::Interface(InterfaceDef {
                    parent,
                    members,
                    span: self.span_from(start),
                })
            }
            Some(Token::LParen) => self.parse_enum(start),
            Some(Token::Ident) if self.at_word("enum") && self.peek_nth(1) == Some(Token::LParen) => {
                self.bump();
                self.parse_enum(start)
            }
            Some(Token::Ident) if self.at_word("helper") => self.parse_helper(start),
            Some(Token::Array) => {
                self.bump();
                let mut bounds = None;
                if self.eat(Token::LBracket).is_some() {
                    let low = self.parse_expr();
                    self.expect(Token::DotDot);
                    let high = self.parse_expr();
                    bounds = Some((low, high));
                    // Additional dimensions are accepted but not modelled.
                    while self.eat(Token::Comma).is_some() {
                        self.parse_expr();
                        self.expect(Token::DotDot);
                        self.parse_expr();
                    }
                    self.expect(Token::RBracket);
                }
                self.expect(Token::Of);
                match self.parse_type_ref() {
                    Some(element) => TypeDef::Array(ArrayDef {
                        bounds,
                        element,
                        span: self.span_from(start),
                    }),
                    None => TypeDef::Alias(self.error_type_ref(start)),
                }
            }
            Some(Token::Set) => {
                self.bump();
                self.expect(Token::Of);
                match self.parse_type_ref() {
                    Some(element) => TypeDef::Set(SetDef {
                        element,
                        span: self.span_from(start),
                    }),
                    None => TypeDef::Alias(self.error_type_ref(start)),
                }
            }
            Some(Token::Procedure | Token::Function) => {
                // Procedural type: kept as an alias named after the keyword.
                let range = self.bump().unwrap_or(start..start);
                let keyword = Ident::new(&self.source[range.clone()], self.lines.span(range));
                if self.at(Token::LParen) {
                    self.parse_params();
                }
                if self.eat(Token::Colon).is_some() {
                    self.parse_type_ref();
                }
                if self.eat(Token::Of).is_some() {
                    self.ident();
                }
                TypeDef::Alias(TypeRef {
                    name: keyword,
                    is_array: false,
                    span: self.span_from(start),
                })
            }
            _ => match self.parse_type_ref() {
                Some(ty) => TypeDef::Alias(ty),
                None => TypeDef::Alias(self.error_type_ref(start)),
            },
        }
    }

    fn error_type_ref(&self, start: usize) -> TypeRef {
        let span = self.span_from(start);
        TypeRef {
            name: Ident::new("", span),
            is_array: false,
            span,
        }
    }

    fn empty_class(&self, start: usize) -> ClassDef {
        ClassDef {
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            members: Vec::new(),
            span: self.span_from(start),
        }
    }

    /// After `class`.
    fn parse_class(&mut self, start: usize) -> TypeDef {
        let mut class = self.empty_class(start);
        if self.at_word("abstract") || self.at_word("sealed") || self.at_word("partial") {
            class.is_abstract = self.at_word("abstract");
            self.bump();
        }
        if self.eat(Token::LParen).is_some() {
            let mut heritage = Vec::new();
            loop {
                match self.qualified_ident() {
                    Some(name) => heritage.push(name),
                    None => break,
                }
                if self.eat(Token::Comma).is_none() {
                    break;
                }
            }
            self.expect(Token::RParen);
            let mut heritage = heritage.into_iter();
            class.parent = heritage.next();
            class.interfaces = heritage.collect();
        }
        // Forward declaration `TFoo = class;` or `TFoo = class(TBase);`
        if !self.at(Token::Semicolon) {
            class.members = self.parse_members();
            self.expect(Token::End);
        }
        class.span = self.span_from(start);
        TypeDef::Class(class)
    }

    fn parse_helper(&mut self, start: usize) -> TypeDef {
        self.bump(); // `helper`
        self.expect(Token::For);
        let target = match self.parse_type_ref() {
            Some(ty) => ty,
            None => self.error_type_ref(start),
        };
        let members = self.parse_members();
        self.expect(Token::End);
        TypeDef::Helper(HelperDef {
            target,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_enum(&mut self, start: usize) -> TypeDef {
        self.expect(Token::LParen);
        let mut members = Vec::new();
        while self.at(Token::Ident) {
            let member_start = self.start_offset();
            let Some(name) = self.ident() else { break };
            let value = if self.eat(Token::Eq).is_some() {
                Some(self.parse_expr())
            } else {
                None
            };
            members.push(EnumMember {
                name,
                value,
                span: self.span_from(member_start),
            });
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen);
        TypeDef::Enum(EnumDef {
            members,
            span: self.span_from(start),
        })
    }

    /// Members of a class/record/interface/helper up to (not including) `end`.
    fn parse_members(&mut self) -> Vec<Member> {
        let mut members = Vec::new();
        while !self.at_eof() && !self.at(Token::End) {
            let before = self.cursor;
            let start = self.start_offset();

            if self.at(Token::Ident) && self.at_any_word(VISIBILITY) {
                self.bump();
                continue;
            }

            let is_class = self.at(Token::Class)
                && matches!(
                    self.peek_nth(1),
                    Some(
                        Token::Var
                            | Token::Procedure
                            | Token::Function
                            | Token::Property
                            | Token::Constructor
                            | Token::Destructor
                    )
                );
            if is_class {
                self.bump();
            }

            match self.peek() {
                Some(Token::Var) => {
                    self.bump();
                    for decl in self.parse_var_entries(start) {
                        members.push(Member::Field(FieldDecl {
                            names: decl.names,
                            ty: decl.ty,
                            is_class_var: is_class,
                            span: decl.span,
                        }));
                    }
                }
                Some(Token::Const) => {
                    // Nested constants are parsed for recovery only.
                    self.parse_const_section();
                }
                Some(Token::Procedure | Token::Function | Token::Constructor | Token::Destructor) => {
                    if let Some(mut method) = self.parse_routine(true) {
                        method.is_class_method |= is_class;
                        method.span = self.span_from(start).to(method.span);
                        members.push(Member::Method(method));
                    }
                }
                Some(Token::Property) => {
                    if let Some(mut property) = self.parse_property() {
                        property.is_class_property = is_class;
                        members.push(Member::Property(property));
                    }
                }
                Some(Token::Ident) => {
                    if let Some(decl) = self.parse_var_entry(start) {
                        self.expect(Token::Semicolon);
                        members.push(Member::Field(FieldDecl {
                            names: decl.names,
                            ty: decl.ty,
                            is_class_var: false,
                            span: decl.span,
                        }));
                    } else {
                        self.recover(&[Token::End]);
                    }
                }
                _ => {
                    self.error("unexpected token in type declaration");
                    self.recover(&[Token::End]);
                }
            }

            if self.cursor == before {
                self.bump();
            }
        }
        members
    }

    fn parse_property(&mut self) -> Option<PropertyDecl> {
        let start = self.start_offset();
        self.expect(Token::Property);
        let name = self.ident()?;
        let mut params = Vec::new();
        if self.eat(Token::LBracket).is_some() {
            params = self.parse_param_groups(Token::RBracket);
            self.expect(Token::RBracket);
        }
        let ty = if self.eat(Token::Colon).is_some() {
            self.parse_type_ref()
        } else {
            None
        };
        let mut read = None;
        let mut write = None;
        loop {
            if self.at_word("read") {
                self.bump();
                read = self.qualified_ident();
            } else if self.at_word("write") {
                self.bump();
                write = self.qualified_ident();
            } else if self.at_word("default") || self.at_word("index") {
                self.bump();
                self.parse_expr();
            } else {
                break;
            }
        }
        let span = self.span_from(start);
        self.expect(Token::Semicolon);
        // `default;` directive after the property
        if self.at_word("default") && self.peek_nth(1) == Some(Token::Semicolon) {
            self.bump();
            self.bump();
        }
        Some(PropertyDecl {
            name,
            params,
            ty,
            read,
            write,
            is_class_property: false,
            span,
        })
    }

    /// A routine header plus, outside type declarations and unit interfaces,
    /// its locals and body.
    fn parse_routine(&mut self, in_type: bool) -> Option<RoutineDecl> {
        let start = self.start_offset();
        let is_class_method = self.eat(Token::Class).is_some();
        let kind = match self.peek() {
            Some(Token::Procedure) => RoutineKind::Procedure,
            Some(Token::Function) => RoutineKind::Function,
            Some(Token::Constructor) => RoutineKind::Constructor,
            Some(Token::Destructor) => RoutineKind::Destructor,
            _ => {
                self.error("expected routine declaration");
                self.recover(&[Token::Begin, Token::End]);
                return None;
            }
        };
        self.bump();

        let Some(first) = self.ident() else {
            self.recover(&[Token::Begin, Token::End]);
            return None;
        };
        let (class_name, name) = if !in_type && self.eat(Token::Dot).is_some() {
            match self.ident() {
                Some(name) => (Some(first), name),
                None => (None, first),
            }
        } else {
            (None, first)
        };

        let params = if self.at(Token::LParen) {
            self.parse_params()
        } else {
            Vec::new()
        };
        let return_type = if self.eat(Token::Colon).is_some() {
            self.parse_type_ref()
        } else {
            None
        };
        self.expect(Token::Semicolon);

        let mut directives = Vec::new();
        while self.at(Token::Ident) && self.at_any_word(ROUTINE_DIRECTIVES) {
            if let Some(directive) = self.ident() {
                directives.push(directive);
            }
            // Directive arguments such as `external 'name'`.
            while !self.at_eof() && !self.at(Token::Semicolon) {
                self.bump();
            }
            self.expect(Token::Semicolon);
        }

        let mut routine = RoutineDecl {
            kind,
            class_name,
            name,
            params,
            return_type,
            is_class_method,
            directives,
            locals: Vec::new(),
            body: None,
            span: Span::default(),
        };

        let header_only = self.in_interface_section
            || routine.has_directive("forward")
            || routine.has_directive("external")
            || routine.has_directive("abstract");
        let body_follows = if in_type {
            self.at(Token::Begin)
        } else {
            // A bodiless header followed by another routine opens a nested one.
            self.at_any(&[
                Token::Var,
                Token::Const,
                Token::Type,
                Token::Begin,
                Token::Procedure,
                Token::Function,
            ])
        };

        if !header_only && body_follows {
            if !in_type {
                routine.locals = self.parse_locals();
            }
            if self.at(Token::Begin) {
                routine.body = Some(self.parse_block());
                routine.span = self.span_from(start);
                self.eat(Token::Semicolon);
            } else {
                self.error("expected 'begin'");
                routine.span = self.span_from(start);
            }
        } else {
            routine.span = self.span_from(start);
        }
        Some(routine)
    }

    fn parse_locals(&mut self) -> Vec<Decl> {
        let mut locals = Vec::new();
        loop {
            let before = self.cursor;
            match self.peek() {
                Some(Token::Var | Token::Const | Token::Type) => {
                    locals.extend(self.parse_declaration_section());
                }
                Some(Token::Procedure | Token::Function) => {
                    locals.extend(self.parse_routine(false).map(Decl::Routine));
                }
                _ => break,
            }
            if self.cursor == before {
                break;
            }
        }
        locals
    }

    fn parse_params(&mut self) -> Vec<Param> {
        self.expect(Token::LParen);
        let params = self.parse_param_groups(Token::RParen);
        self.expect(Token::RParen);
        params
    }

    fn parse_param_groups(&mut self, close: Token) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.at_eof() && !self.at(close) {
            let start = self.start_offset();
            let modifier = match self.peek() {
                Some(Token::Var) => {
                    self.bump();
                    ParamModifier::Var
                }
                Some(Token::Const) => {
                    self.bump();
                    ParamModifier::Const
                }
                Some(Token::Ident) if self.at_word("out") && self.peek_nth(1) == Some(Token::Ident) => {
                    self.bump();
                    ParamModifier::Out
                }
                Some(Token::Ident) if self.at_word("lazy") && self.peek_nth(1) == Some(Token::Ident) => {
                    self.bump();
                    ParamModifier::Lazy
                }
                _ => ParamModifier::None,
            };
            let names = self.ident_list();
            if names.is_empty() {
                self.recover(&[close]);
                break;
            }
            let ty = if self.eat(Token::Colon).is_some() {
                self.parse_type_ref()
            } else {
                None
            };
            let default = if self.eat(Token::Eq).is_some() {
                Some(self.parse_expr())
            } else {
                None
            };
            let span = self.span_from(start);
            for name in names {
                params.push(Param {
                    name,
                    modifier,
                    ty: ty.clone(),
                    default: default.clone(),
                    span,
                });
            }
            if self.eat(Token::Semicolon).is_none() {
                break;
            }
        }
        params
    }

    fn parse_type_ref(&mut self) -> Option<TypeRef> {
        let start = self.start_offset();
        if self.eat(Token::Array).is_some() {
            self.expect(Token::Of);
            let inner = self.parse_type_ref()?;
            return Some(TypeRef {
                name: inner.name,
                is_array: true,
                span: self.span_from(start),
            });
        }
        let name = self.qualified_ident()?;
        Some(TypeRef {
            span: name.span,
            name,
            is_array: false,
        })
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Block {
        let start = self.start_offset();
        self.expect(Token::Begin);
        let stmts = self.parse_stmt_list(&[Token::End]);
        self.expect(Token::End);
        Block {
            stmts,
            span: self.span_from(start),
        }
    }

    fn parse_stmt_list(&mut self, terminators: &[Token]) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.at_eof() && !self.at_any(terminators) {
            let before = self.cursor;
            if self.eat(Token::Semicolon).is_some() {
                continue;
            }
            if let Some(stmt) = self.parse_stmt() {
                stmts.push(stmt);
            }
            self.statement_terminator(terminators);
            if self.cursor == before {
                self.error("unexpected token in statement");
                self.bump();
            }
        }
        stmts
    }

    fn statement_terminator(&mut self, terminators: &[Token]) {
        if self.eat(Token::Semicolon).is_some() || self.at_eof() || self.at_any(terminators) {
            return;
        }
        // `else` after a statement inside `case` or `if` is fine.
        if self.at(Token::Else) || self.at(Token::Until) {
            return;
        }
        self.error("expected ';'");
        let mut stops = terminators.to_vec();
        stops.push(Token::End);
        self.recover(&stops);
    }

    fn parse_stmt(&mut self) -> Option<Stmt> {
        let start = self.start_offset();
        match self.peek()? {
            Token::Begin => Some(Stmt::Block(self.parse_block())),
            Token::Var => {
                self.bump();
                self.parse_var_entry(start).map(Stmt::Var)
            }
            Token::If => {
                self.bump();
                let cond = self.parse_expr();
                self.expect(Token::Then);
                let then_branch = self.parse_branch();
                let else_branch = if self.eat(Token::Else).is_some() {
                    Some(Box::new(self.parse_branch()))
                } else {
                    None
                };
                Some(Stmt::If {
                    cond,
                    then_branch: Box::new(then_branch),
                    else_branch,
                    span: self.span_from(start),
                })
            }
            Token::While => {
                self.bump();
                let cond = self.parse_expr();
                self.expect(Token::Do);
                let body = self.parse_branch();
                Some(Stmt::While {
                    cond,
                    body: Box::new(body),
                    span: self.span_from(start),
                })
            }
            Token::Repeat => {
                self.bump();
                let body = self.parse_stmt_list(&[Token::Until]);
                self.expect(Token::Until);
                let cond = self.parse_expr();
                Some(Stmt::Repeat {
                    body,
                    cond,
                    span: self.span_from(start),
                })
            }
            Token::For => {
                self.bump();
                let declares = self.eat(Token::Var).is_some();
                let var = self.ident()?;
                let (start_expr, end_expr) = if self.eat(Token::In).is_some() {
                    (self.parse_expr(), None)
                } else {
                    self.expect(Token::Assign);
                    let from = self.parse_expr();
                    if self.eat(Token::To).is_none() {
                        self.expect(Token::Downto);
                    }
                    (from, Some(self.parse_expr()))
                };
                self.expect(Token::Do);
                let body = self.parse_branch();
                Some(Stmt::For {
                    var,
                    declares,
                    start: start_expr,
                    end: end_expr,
                    body: Box::new(body),
                    span: self.span_from(start),
                })
            }
            Token::Case => Some(self.parse_case(start)),
            Token::Try => {
                self.bump();
                let body = self.parse_stmt_list(&[Token::Except, Token::Finally, Token::End]);
                let is_finally = self.at(Token::Finally);
                if self.eat(Token::Except).is_none() && self.eat(Token::Finally).is_none() {
                    self.error("expected 'except' or 'finally'");
                }
                let handler = self.parse_handler_list();
                self.expect(Token::End);
                Some(Stmt::Try {
                    body,
                    handler,
                    is_finally,
                    span: self.span_from(start),
                })
            }
            Token::Raise => {
                self.bump();
                let value = if self.at_any(&[Token::Semicolon, Token::End]) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                Some(Stmt::Raise {
                    value,
                    span: self.span_from(start),
                })
            }
            Token::Ident if self.at_word("exit") => {
                self.bump();
                let value = if self.at_any(&[Token::Semicolon, Token::End, Token::Else]) || self.at_eof() {
                    None
                } else {
                    Some(self.parse_expr())
                };
                Some(Stmt::Exit {
                    value,
                    span: self.span_from(start),
                })
            }
            Token::Ident if self.at_word("break") => {
                self.bump();
                Some(Stmt::Break(self.span_from(start)))
            }
            Token::Ident if self.at_word("continue") => {
                self.bump();
                Some(Stmt::Continue(self.span_from(start)))
            }
            Token::Semicolon | Token::End | Token::Else | Token::Until => None,
            _ => {
                let target = self.parse_expr();
                if self.eat(Token::Assign).is_some() {
                    let value = self.parse_expr();
                    Some(Stmt::Assign {
                        target,
                        value,
                        span: self.span_from(start),
                    })
                } else {
                    Some(Stmt::Expr(target))
                }
            }
        }
    }

    /// The single statement after `then`/`else`/`do`; an empty branch is an
    /// empty block.
    fn parse_branch(&mut self) -> Stmt {
        let start = self.start_offset();
        match self.parse_stmt() {
            Some(stmt) => stmt,
            None => Stmt::Block(Block {
                stmts: Vec::new(),
                span: self.lines.span(start..start),
            }),
        }
    }

    fn parse_case(&mut self, start: usize) -> Stmt {
        self.expect(Token::Case);
        let subject = self.parse_expr();
        self.expect(Token::Of);
        let mut arms = Vec::new();
        let mut else_branch = Vec::new();
        while !self.at_eof() && !self.at(Token::End) {
            let before = self.cursor;
            if self.eat(Token::Else).is_some() {
                else_branch = self.parse_stmt_list(&[Token::End]);
                break;
            }
            let arm_start = self.start_offset();
            let mut labels = vec![self.parse_expr()];
            loop {
                if self.eat(Token::DotDot).is_some() {
                    labels.push(self.parse_expr());
                } else if self.eat(Token::Comma).is_some() {
                    labels.push(self.parse_expr());
                } else {
                    break;
                }
            }
            self.expect(Token::Colon);
            let body = self.parse_branch();
            arms.push(CaseArm {
                labels,
                body,
                span: self.span_from(arm_start),
            });
            if self.eat(Token::Semicolon).is_none() && !self.at_any(&[Token::End, Token::Else]) {
                self.error("expected ';'");
                self.recover(&[Token::End, Token::Else]);
            }
            if self.cursor == before {
                self.bump();
            }
        }
        self.expect(Token::End);
        Stmt::Case {
            subject,
            arms,
            else_branch,
            span: self.span_from(start),
        }
    }

    /// Statements of an `except`/`finally` section; `on E: T do stmt`
    /// handlers are flattened into their statements.
    fn parse_handler_list(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.at_eof() && !self.at(Token::End) {
            let before = self.cursor;
            if self.at_word("on") && self.peek_nth(1) == Some(Token::Ident) {
                self.bump();
                self.ident();
                if self.eat(Token::Colon).is_some() {
                    self.parse_type_ref();
                }
                self.expect(Token::Do);
                stmts.push(self.parse_branch());
                self.statement_terminator(&[Token::End]);
            } else if self.eat(Token::Else).is_some() {
                stmts.extend(self.parse_stmt_list(&[Token::End]));
            } else {
                stmts.extend(self.parse_stmt_list(&[Token::End]));
            }
            if self.cursor == before {
                self.bump();
            }
        }
        stmts
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expr(&mut self) -> Expr {
        let start = self.start_offset();
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                Some(Token::In) => BinaryOp::In,
                Some(Token::Is) => BinaryOp::Is,
                Some(Token::As) => BinaryOp::As,
                _ => return lhs,
            };
            self.bump();
            let rhs = self.parse_additive();
            lhs = self.binary(start, op, lhs, rhs);
        }
    }

    fn parse_additive(&mut self) -> Expr {
        let start = self.start_offset();
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                Some(Token::Or) => BinaryOp::Or,
                Some(Token::Xor) => BinaryOp::Xor,
                _ => return lhs,
            };
            self.bump();
            let rhs = self.parse_multiplicative();
            lhs = self.binary(start, op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let start = self.start_offset();
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Div) => BinaryOp::IntDiv,
                Some(Token::Mod) => BinaryOp::Mod,
                Some(Token::And) => BinaryOp::And,
                Some(Token::Shl) => BinaryOp::Shl,
                Some(Token::Shr) => BinaryOp::Shr,
                _ => return lhs,
            };
            self.bump();
            let rhs = self.parse_unary();
            lhs = self.binary(start, op, lhs, rhs);
        }
    }

    fn binary(&self, start: usize, op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span: self.span_from(start),
        }
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.start_offset();
        let op = match self.peek() {
            Some(Token::Not) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus | Token::At) => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        self.bump();
        let operand = self.parse_unary();
        Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span: self.span_from(start),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let start = self.start_offset();
        let mut expr = self.parse_primary();
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.bump();
                    let args = self.parse_args(Token::RParen);
                    self.expect(Token::RParen);
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span: self.span_from(start),
                    };
                }
                Some(Token::LBracket) => {
                    self.bump();
                    let indices = self.parse_args(Token::RBracket);
                    self.expect(Token::RBracket);
                    expr = Expr {
                        kind: ExprKind::Index {
                            object: Box::new(expr),
                            indices,
                        },
                        span: self.span_from(start),
                    };
                }
                Some(Token::Dot) if self.peek_nth(1) == Some(Token::Ident) => {
                    self.bump();
                    let Some(member) = self.ident() else {
                        return expr;
                    };
                    expr = Expr {
                        kind: ExprKind::Member {
                            object: Box::new(expr),
                            member,
                        },
                        span: self.span_from(start),
                    };
                }
                Some(Token::Caret) => {
                    self.bump();
                }
                _ => return expr,
            }
        }
    }

    fn parse_args(&mut self, close: Token) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.at(close) {
            return args;
        }
        loop {
            args.push(self.parse_expr());
            if self.eat(Token::Comma).is_none() {
                break;
            }
        }
        args
    }

    fn parse_primary(&mut self) -> Expr {
        let start = self.start_offset();
        let kind = match self.peek() {
            Some(Token::Ident) => match self.ident() {
                Some(ident) => ExprKind::Ident(ident),
                None => ExprKind::Error,
            },
            Some(Token::Number) => self.parse_number(),
            Some(Token::String | Token::CharCode) => ExprKind::Str(self.parse_string()),
            Some(Token::True) => {
                self.bump();
                ExprKind::Bool(true)
            }
            Some(Token::False) => {
                self.bump();
                ExprKind::Bool(false)
            }
            Some(Token::Nil) => {
                self.bump();
                ExprKind::Nil
            }
            Some(Token::Inherited) => {
                self.bump();
                let name = if self.at(Token::Ident) {
                    self.ident()
                } else {
                    None
                };
                ExprKind::Inherited(name)
            }
            Some(Token::LParen) => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(Token::RParen);
                return Expr {
                    kind: inner.kind,
                    span: self.span_from(start),
                };
            }
            Some(Token::LBracket) => {
                self.bump();
                let mut elements = Vec::new();
                while !self.at_eof() && !self.at(Token::RBracket) {
                    elements.push(self.parse_expr());
                    if self.eat(Token::DotDot).is_some() {
                        elements.push(self.parse_expr());
                    }
                    if self.eat(Token::Comma).is_none() {
                        break;
                    }
                }
                self.expect(Token::RBracket);
                ExprKind::SetLiteral(elements)
            }
            _ => {
                let found = self.peek().map_or("end of file", |t| t.describe());
                self.error(format!("expected expression, found {}", found));
                let stop = [
                    Token::Semicolon,
                    Token::End,
                    Token::Else,
                    Token::Then,
                    Token::Do,
                    Token::RParen,
                    Token::RBracket,
                ];
                if !self.at_eof() && !self.at_any(&stop) {
                    self.bump();
                }
                ExprKind::Error
            }
        };
        Expr {
            kind,
            span: self.span_from(start),
        }
    }

    /// Integers, `$FF` hex, and `1.5` floats. The lexer has no float token so
    /// that `1..10` stays a range; adjacent `Number . Number` is joined here.
    fn parse_number(&mut self) -> ExprKind {
        let Some(range) = self.bump() else {
            return ExprKind::Error;
        };
        let text = &self.source[range.clone()];
        if let Some(hex) = text.strip_prefix('$') {
            return i64::from_str_radix(hex, 16).map_or(ExprKind::Error, ExprKind::Int);
        }
        let fraction = match (self.lexemes.get(self.cursor), self.lexemes.get(self.cursor + 1)) {
            (Some(dot), Some(digits))
                if dot.token == Token::Dot
                    && digits.token == Token::Number
                    && dot.range.start == range.end
                    && digits.range.start == dot.range.end =>
            {
                Some(digits.range.clone())
            }
            _ => None,
        };
        match fraction {
            Some(digits) => {
                self.bump();
                self.bump();
                let literal = &self.source[range.start..digits.end];
                literal.parse().map_or(ExprKind::Error, ExprKind::Float)
            }
            None => text.parse().map_or(ExprKind::Error, ExprKind::Int),
        }
    }

    /// Adjacent string literals and `#13` char codes form one string.
    fn parse_string(&mut self) -> String {
        let mut value = String::new();
        while let Some(token @ (Token::String | Token::CharCode)) = self.peek() {
            let Some(range) = self.bump() else { break };
            let text = &self.source[range];
            if token == Token::CharCode {
                let digits = &text[1..];
                let code = match digits.strip_prefix('$') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => digits.parse().ok(),
                };
                if let Some(c) = code.and_then(char::from_u32) {
                    value.push(c);
                }
            } else {
                let quote = &text[..1];
                let inner = &text[1..text.len() - 1];
                value.push_str(&inner.replace(&format!("{quote}{quote}"), quote));
            }
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Pos;

    fn parse_ok(source: &str) -> Program {
        let result = parse(source);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
        result.program
    }

    #[test]
    fn test_script_var_and_assignment() {
        let program = parse_ok("var x: Integer;\nx := 10;");
        assert_eq!(program.kind, ProgramKind::Script);
        assert_eq!(program.items.len(), 2);
        let Item::Decl(Decl::Var(var)) = &program.items[0] else {
            panic!("expected var declaration");
        };
        assert_eq!(var.names[0].name, "x");
        assert_eq!(var.names[0].span.start, Pos::new(1, 5));
        assert!(matches!(&program.items[1], Item::Stmt(Stmt::Assign { .. })));
    }

    #[test]
    fn test_var_list_in_one_statement() {
        let program = parse_ok("var a, b, c: Integer;");
        let Some(Decl::Var(var)) = program.decls().next() else {
            panic!("expected var declaration");
        };
        let names: Vec<_> = var.names.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_class_with_members() {
        let source = "\
type
  TAnimal = class(TObject, IPrintable)
  private
    FName: String;
    class var Count: Integer;
  public
    constructor Create(const AName: String);
    function Speak: String; virtual;
    property Name: String read FName;
  end;
";
        let program = parse_ok(source);
        let Some(Decl::Type(decl)) = program.decls().next() else {
            panic!("expected type declaration");
        };
        let class = decl.as_class().expect("class");
        assert_eq!(class.parent.as_ref().map(|p| p.name.as_str()), Some("TObject"));
        assert_eq!(class.interfaces.len(), 1);
        assert_eq!(class.members.len(), 5);
        let Member::Field(count) = &class.members[1] else {
            panic!("expected field");
        };
        assert!(count.is_class_var);
        let Member::Method(speak) = &class.members[3] else {
            panic!("expected method");
        };
        assert!(speak.has_directive("virtual"));
        assert!(speak.body.is_none());
        let Member::Property(name) = &class.members[4] else {
            panic!("expected property");
        };
        assert!(name.write.is_none());
    }

    #[test]
    fn test_method_implementation_with_locals() {
        let source = "\
procedure TAnimal.Rename(NewName: String);
var
  Old: String;
begin
  Old := FName;
  FName := NewName;
end;
";
        let program = parse_ok(source);
        let Some(Decl::Routine(routine)) = program.decls().next() else {
            panic!("expected routine");
        };
        assert_eq!(routine.class_name.as_ref().map(|c| c.name.as_str()), Some("TAnimal"));
        assert_eq!(routine.name.name, "Rename");
        assert_eq!(routine.params.len(), 1);
        assert_eq!(routine.locals.len(), 1);
        assert_eq!(routine.body.as_ref().map(|b| b.stmts.len()), Some(2));
        assert_eq!(routine.span.start, Pos::new(1, 1));
        assert_eq!(routine.span.end, Pos::new(7, 4));
    }

    #[test]
    fn test_unit_sections() {
        let source = "\
unit Shapes;
interface
uses Math;
function Area(R: Float): Float;
implementation
function Area(R: Float): Float;
begin
  Result := Pi * R * R;
end;
end.
";
        let program = parse_ok(source);
        assert_eq!(program.kind, ProgramKind::Unit);
        assert_eq!(program.name.as_ref().map(|n| n.name.as_str()), Some("Shapes"));
        let units: Vec<_> = program.imported_units().map(|u| u.name.as_str()).collect();
        assert_eq!(units, ["Math"]);
        let routines: Vec<_> = program
            .decls()
            .filter_map(|d| match d {
                Decl::Routine(r) => Some(r.body.is_some()),
                _ => None,
            })
            .collect();
        assert_eq!(routines, [false, true]);
    }

    #[test]
    fn test_enum_array_set_and_helper() {
        let source = "\
type
  TColor = (Red, Green = 5, Blue);
  TGrid = array [0..9] of Integer;
  TColors = set of TColor;
  TIntHelper = helper for Integer
    function Double: Integer;
  end;
";
        let program = parse_ok(source);
        let defs: Vec<_> = program
            .decls()
            .filter_map(|d| match d {
                Decl::Type(t) => Some(&t.def),
                _ => None,
            })
            .collect();
        assert!(matches!(defs[0], TypeDef::Enum(e) if e.members.len() == 3));
        assert!(matches!(defs[1], TypeDef::Array(a) if a.bounds.is_some()));
        assert!(matches!(defs[2], TypeDef::Set(_)));
        assert!(matches!(defs[3], TypeDef::Helper(h) if h.members.len() == 1));
    }

    #[test]
    fn test_statements() {
        let source = "\
begin
  for var i := 1 to 10 do
    if i mod 2 = 0 then
      PrintLn(i)
    else
      Continue;
  while x < 3 do x := x + 1;
  repeat Dec(x) until x = 0;
  case x of
    1, 2: y := 'low';
    3..5: y := 'mid';
  else
    y := 'high';
  end;
  try
    Risky;
  except
    on E: Exception do PrintLn(E.Message);
  end;
end.
";
        let program = parse_ok(source);
        let main = program.main.expect("main block");
        assert_eq!(main.stmts.len(), 5);
        assert!(matches!(&main.stmts[0], Stmt::For { declares: true, .. }));
        assert!(matches!(&main.stmts[4], Stmt::Try { is_finally: false, .. }));
    }

    #[test]
    fn test_float_and_string_literals() {
        let program = parse_ok("x := 3.25 + Length('it''s' + #33);");
        let Some(Item::Stmt(Stmt::Assign { value, .. })) = program.items.first() else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { lhs, rhs, .. } = &value.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(lhs.kind, ExprKind::Float(3.25));
        let ExprKind::Call { args, .. } = &rhs.kind else {
            panic!("expected call");
        };
        let ExprKind::Binary { rhs: s, .. } = &args[0].kind else {
            panic!("expected concatenation");
        };
        assert_eq!(s.kind, ExprKind::Str("!".to_string()));
    }

    #[test]
    fn test_recovers_from_garbage() {
        let result = parse("var x: Integer;\nx := ;\nvar y: String;");
        assert!(result.has_errors());
        let names: Vec<_> = result
            .program
            .decls()
            .filter_map(|d| match d {
                Decl::Var(v) => Some(v.names[0].name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    fn test_empty_source() {
        let result = parse("");
        assert!(result.diagnostics.is_empty());
        assert!(result.program.items.is_empty());
    }
}
