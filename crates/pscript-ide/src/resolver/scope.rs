//! Enclosing-node search and local (routine-level) lookup.

use pscript_syntax::visit::walk_program;
use pscript_syntax::*;

/// Nodes lexically enclosing a cursor.
#[derive(Default)]
pub(crate) struct Enclosing<'a> {
    /// Routines containing the cursor, innermost first.
    pub routines: Vec<&'a RoutineDecl>,
    /// Innermost type declaration containing the cursor.
    pub type_decl: Option<&'a TypeDecl>,
}

pub(crate) fn enclosing_at<'a>(program: &'a Program, pos: Pos) -> Enclosing<'a> {
    let mut enclosing = Enclosing::default();
    walk_program(program, &mut |node: NodeRef<'a>| match node {
        NodeRef::Program(_) => VisitFlow::Continue,
        NodeRef::Routine(routine) if routine.span.contains(pos) => {
            enclosing.routines.push(routine);
            VisitFlow::Continue
        }
        NodeRef::Type(decl) if decl.span.contains(pos) => {
            let replace = enclosing
                .type_decl
                .is_none_or(|best| is_tighter(decl.span, best.span));
            if replace {
                enclosing.type_decl = Some(decl);
            }
            VisitFlow::Continue
        }
        // Routines and types never appear below statements.
        _ => VisitFlow::SkipChildren,
    });
    enclosing
        .routines
        .sort_by(|a, b| tightness(a.span).cmp(&tightness(b.span)));
    enclosing
}

/// Strictly smaller, or the same size and starting later.
fn is_tighter(candidate: Span, best: Span) -> bool {
    tightness(candidate) < tightness(best)
}

fn tightness(span: Span) -> ((u32, u32), std::cmp::Reverse<Pos>) {
    (span.extent(), std::cmp::Reverse(span.start))
}

/// Nearest declaration of `name` visible at `pos` among statements.
///
/// Declarations count when they start at or before the cursor. Nested
/// blocks are searched only when they contain the cursor, so a variable
/// declared in a sibling block is not visible.
pub(crate) struct LocalSearch<'a, 'n> {
    pos: Pos,
    name: &'n str,
    best: Option<&'a Ident>,
}

impl<'a, 'n> LocalSearch<'a, 'n> {
    pub(crate) fn new(pos: Pos, name: &'n str) -> Self {
        Self {
            pos,
            name,
            best: None,
        }
    }

    pub(crate) fn finish(self) -> Option<&'a Ident> {
        self.best
    }

    fn consider(&mut self, ident: &'a Ident) {
        if ident.is(self.name)
            && ident.span.start <= self.pos
            && self
                .best
                .is_none_or(|best| best.span.start <= ident.span.start)
        {
            self.best = Some(ident);
        }
    }

    pub(crate) fn decls(&mut self, decls: &'a [Decl]) {
        for decl in decls {
            match decl {
                Decl::Var(var) => var.names.iter().for_each(|n| self.consider(n)),
                Decl::Const(c) => self.consider(&c.name),
                Decl::Routine(routine) => self.consider(&routine.name),
                Decl::Type(ty) => self.consider(&ty.name),
            }
        }
    }

    pub(crate) fn stmts(&mut self, stmts: impl IntoIterator<Item = &'a Stmt>) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Var(var) => var.names.iter().for_each(|n| self.consider(n)),
            _ if !stmt.span().contains(self.pos) => {}
            Stmt::Block(block) => self.stmts(&block.stmts),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                self.stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While { body, .. } => self.stmt(body),
            Stmt::Repeat { body, .. } => self.stmts(body),
            Stmt::For {
                var, declares, body, ..
            } => {
                if *declares {
                    self.consider(var);
                }
                self.stmt(body);
            }
            Stmt::Case {
                arms, else_branch, ..
            } => {
                for arm in arms {
                    self.stmt(&arm.body);
                }
                self.stmts(else_branch);
            }
            Stmt::Try { body, handler, .. } => {
                self.stmts(body);
                self.stmts(handler);
            }
            Stmt::Assign { .. }
            | Stmt::Expr(_)
            | Stmt::Raise { .. }
            | Stmt::Exit { .. }
            | Stmt::Break(_)
            | Stmt::Continue(_) => {}
        }
    }
}

pub(crate) fn find_param<'a>(routine: &'a RoutineDecl, name: &str) -> Option<&'a Ident> {
    routine
        .params
        .iter()
        .map(|p| &p.name)
        .find(|ident| ident.is(name))
}

/// Locals of `routine` (its declaration sections and body) visible at `pos`.
pub(crate) fn find_local<'a>(routine: &'a RoutineDecl, pos: Pos, name: &str) -> Option<&'a Ident> {
    let mut search = LocalSearch::new(pos, name);
    search.decls(&routine.locals);
    if let Some(body) = &routine.body {
        search.stmts(&body.stmts);
    }
    search.finish()
}

/// Inline declarations among a script's top-level statements and main block.
pub(crate) fn find_script_local<'a>(program: &'a Program, pos: Pos, name: &str) -> Option<&'a Ident> {
    let mut search = LocalSearch::new(pos, name);
    search.stmts(program.items.iter().filter_map(|item| match item {
        Item::Stmt(stmt) => Some(stmt),
        Item::Decl(_) => None,
    }));
    if let Some(main) = &program.main
        && main.span.contains(pos)
    {
        search.stmts(&main.stmts);
    }
    search.finish()
}
