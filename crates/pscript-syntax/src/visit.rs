//! Generic pre-order traversal over the AST.
//!
//! Visitors only get an `enter` callback; returning
//! [`VisitFlow::SkipChildren`] prunes the subtree below the node.

use crate::ast::*;
use crate::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitFlow {
    Continue,
    SkipChildren,
}

/// A borrowed view of any node the walker visits.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Program(&'a Program),
    Uses(&'a UsesClause),
    Var(&'a VarDecl),
    Const(&'a ConstDecl),
    Type(&'a TypeDecl),
    Routine(&'a RoutineDecl),
    Param(&'a Param),
    Field(&'a FieldDecl),
    Property(&'a PropertyDecl),
    EnumMember(&'a EnumMember),
    TypeRef(&'a TypeRef),
    Block(&'a Block),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl NodeRef<'_> {
    pub fn span(&self) -> Span {
        match self {
            NodeRef::Program(n) => n.span,
            NodeRef::Uses(n) => n.span,
            NodeRef::Var(n) => n.span,
            NodeRef::Const(n) => n.span,
            NodeRef::Type(n) => n.span,
            NodeRef::Routine(n) => n.span,
            NodeRef::Param(n) => n.span,
            NodeRef::Field(n) => n.span,
            NodeRef::Property(n) => n.span,
            NodeRef::EnumMember(n) => n.span,
            NodeRef::TypeRef(n) => n.span,
            NodeRef::Block(n) => n.span,
            NodeRef::Stmt(n) => n.span(),
            NodeRef::Expr(n) => n.span,
        }
    }
}

pub trait Visitor<'a> {
    fn enter(&mut self, node: NodeRef<'a>) -> VisitFlow;
}

impl<'a, F> Visitor<'a> for F
where
    F: FnMut(NodeRef<'a>) -> VisitFlow,
{
    fn enter(&mut self, node: NodeRef<'a>) -> VisitFlow {
        self(node)
    }
}

pub fn walk_program<'a, V: Visitor<'a> + ?Sized>(program: &'a Program, visitor: &mut V) {
    if visitor.enter(NodeRef::Program(program)) == VisitFlow::SkipChildren {
        return;
    }
    for clause in &program.uses {
        visitor.enter(NodeRef::Uses(clause));
    }
    for item in &program.items {
        match item {
            Item::Decl(decl) => walk_decl(decl, visitor),
            Item::Stmt(stmt) => walk_stmt(stmt, visitor),
        }
    }
    if let Some(main) = &program.main {
        walk_block(main, visitor);
    }
}

pub fn walk_decl<'a, V: Visitor<'a> + ?Sized>(decl: &'a Decl, visitor: &mut V) {
    match decl {
        Decl::Var(var) => walk_var(var, visitor),
        Decl::Const(c) => {
            if visitor.enter(NodeRef::Const(c)) == VisitFlow::SkipChildren {
                return;
            }
            if let Some(ty) = &c.ty {
                visitor.enter(NodeRef::TypeRef(ty));
            }
            if let Some(value) = &c.value {
                walk_expr(value, visitor);
            }
        }
        Decl::Type(ty) => walk_type(ty, visitor),
        Decl::Routine(routine) => walk_routine(routine, visitor),
    }
}

fn walk_var<'a, V: Visitor<'a> + ?Sized>(var: &'a VarDecl, visitor: &mut V) {
    if visitor.enter(NodeRef::Var(var)) == VisitFlow::SkipChildren {
        return;
    }
    if let Some(ty) = &var.ty {
        visitor.enter(NodeRef::TypeRef(ty));
    }
    if let Some(init) = &var.init {
        walk_expr(init, visitor);
    }
}

fn walk_type<'a, V: Visitor<'a> + ?Sized>(decl: &'a TypeDecl, visitor: &mut V) {
    if visitor.enter(NodeRef::Type(decl)) == VisitFlow::SkipChildren {
        return;
    }
    match &decl.def {
        TypeDef::Enum(def) => {
            for member in &def.members {
                if visitor.enter(NodeRef::EnumMember(member)) == VisitFlow::Continue
                    && let Some(value) = &member.value
                {
                    walk_expr(value, visitor);
                }
            }
        }
        TypeDef::Array(def) => {
            if let Some((low, high)) = &def.bounds {
                walk_expr(low, visitor);
                walk_expr(high, visitor);
            }
            visitor.enter(NodeRef::TypeRef(&def.element));
        }
        TypeDef::Set(def) => {
            visitor.enter(NodeRef::TypeRef(&def.element));
        }
        TypeDef::Helper(def) => {
            visitor.enter(NodeRef::TypeRef(&def.target));
        }
        TypeDef::Alias(ty) => {
            visitor.enter(NodeRef::TypeRef(ty));
        }
        TypeDef::Class(_) | TypeDef::Record(_) | TypeDef::Interface(_) => {}
    }
    for member in decl.members() {
        walk_member(member, visitor);
    }
}

fn walk_member<'a, V: Visitor<'a> + ?Sized>(member: &'a Member, visitor: &mut V) {
    match member {
        Member::Field(field) => {
            if visitor.enter(NodeRef::Field(field)) == VisitFlow::Continue
                && let Some(ty) = &field.ty
            {
                visitor.enter(NodeRef::TypeRef(ty));
            }
        }
        Member::Method(method) => walk_routine(method, visitor),
        Member::Property(property) => {
            if visitor.enter(NodeRef::Property(property)) == VisitFlow::SkipChildren {
                return;
            }
            for param in &property.params {
                walk_param(param, visitor);
            }
            if let Some(ty) = &property.ty {
                visitor.enter(NodeRef::TypeRef(ty));
            }
        }
    }
}

fn walk_param<'a, V: Visitor<'a> + ?Sized>(param: &'a Param, visitor: &mut V) {
    if visitor.enter(NodeRef::Param(param)) == VisitFlow::SkipChildren {
        return;
    }
    if let Some(ty) = &param.ty {
        visitor.enter(NodeRef::TypeRef(ty));
    }
    if let Some(default) = &param.default {
        walk_expr(default, visitor);
    }
}

pub fn walk_routine<'a, V: Visitor<'a> + ?Sized>(routine: &'a RoutineDecl, visitor: &mut V) {
    if visitor.enter(NodeRef::Routine(routine)) == VisitFlow::SkipChildren {
        return;
    }
    for param in &routine.params {
        walk_param(param, visitor);
    }
    if let Some(ty) = &routine.return_type {
        visitor.enter(NodeRef::TypeRef(ty));
    }
    for local in &routine.locals {
        walk_decl(local, visitor);
    }
    if let Some(body) = &routine.body {
        walk_block(body, visitor);
    }
}

pub fn walk_block<'a, V: Visitor<'a> + ?Sized>(block: &'a Block, visitor: &mut V) {
    if visitor.enter(NodeRef::Block(block)) == VisitFlow::SkipChildren {
        return;
    }
    for stmt in &block.stmts {
        walk_stmt(stmt, visitor);
    }
}

pub fn walk_stmt<'a, V: Visitor<'a> + ?Sized>(stmt: &'a Stmt, visitor: &mut V) {
    if visitor.enter(NodeRef::Stmt(stmt)) == VisitFlow::SkipChildren {
        return;
    }
    match stmt {
        Stmt::Block(block) => walk_block(block, visitor),
        Stmt::Var(var) => walk_var(var, visitor),
        Stmt::Assign { target, value, .. } => {
            walk_expr(target, visitor);
            walk_expr(value, visitor);
        }
        Stmt::Expr(expr) => walk_expr(expr, visitor),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            walk_expr(cond, visitor);
            walk_stmt(then_branch, visitor);
            if let Some(else_branch) = else_branch {
                walk_stmt(else_branch, visitor);
            }
        }
        Stmt::While { cond, body, .. } => {
            walk_expr(cond, visitor);
            walk_stmt(body, visitor);
        }
        Stmt::Repeat { body, cond, .. } => {
            for stmt in body {
                walk_stmt(stmt, visitor);
            }
            walk_expr(cond, visitor);
        }
        Stmt::For {
            start, end, body, ..
        } => {
            walk_expr(start, visitor);
            if let Some(end) = end {
                walk_expr(end, visitor);
            }
            walk_stmt(body, visitor);
        }
        Stmt::Case {
            subject,
            arms,
            else_branch,
            ..
        } => {
            walk_expr(subject, visitor);
            for arm in arms {
                for label in &arm.labels {
                    walk_expr(label, visitor);
                }
                walk_stmt(&arm.body, visitor);
            }
            for stmt in else_branch {
                walk_stmt(stmt, visitor);
            }
        }
        Stmt::Try { body, handler, .. } => {
            for stmt in body.iter().chain(handler) {
                walk_stmt(stmt, visitor);
            }
        }
        Stmt::Raise { value, .. } | Stmt::Exit { value, .. } => {
            if let Some(value) = value {
                walk_expr(value, visitor);
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) => {}
    }
}

pub fn walk_expr<'a, V: Visitor<'a> + ?Sized>(expr: &'a Expr, visitor: &mut V) {
    if visitor.enter(NodeRef::Expr(expr)) == VisitFlow::SkipChildren {
        return;
    }
    match &expr.kind {
        ExprKind::Call { callee, args } => {
            walk_expr(callee, visitor);
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        ExprKind::Member { object, .. } => walk_expr(object, visitor),
        ExprKind::Index { object, indices } => {
            walk_expr(object, visitor);
            for index in indices {
                walk_expr(index, visitor);
            }
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, visitor),
        ExprKind::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, visitor);
            walk_expr(rhs, visitor);
        }
        ExprKind::SetLiteral(elements) => {
            for element in elements {
                walk_expr(element, visitor);
            }
        }
        ExprKind::Ident(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::Nil
        | ExprKind::Inherited(_)
        | ExprKind::Error => {}
    }
}
