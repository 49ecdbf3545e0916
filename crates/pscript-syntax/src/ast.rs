//! Abstract syntax tree for PScript.
//!
//! Every node carries the [`Span`] it was parsed from. Nodes do not know
//! their parents; traverse them with [`crate::visit`].
//!
//! A source file is either a script (declarations and statements mixed at
//! the top level), a `program`, or a `unit` with `interface` and
//! `implementation` sections. All three share the [`Program`] root; the
//! unit sections are flattened into [`Program::items`] in source order.

use crate::span::Span;

/// A name together with where it was spelled.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    Script,
    Program,
    Unit,
}

/// Root node of a source file.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub kind: ProgramKind,
    /// Name from a `program` or `unit` header.
    pub name: Option<Ident>,
    pub uses: Vec<UsesClause>,
    pub items: Vec<Item>,
    /// The final `begin ... end.` block of a program.
    pub main: Option<Block>,
    pub span: Span,
}

impl Program {
    pub fn empty() -> Self {
        Self {
            kind: ProgramKind::Script,
            name: None,
            uses: Vec::new(),
            items: Vec::new(),
            main: None,
            span: Span::default(),
        }
    }

    /// Top-level declarations, skipping script statements.
    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.items.iter().filter_map(|item| match item {
            Item::Decl(decl) => Some(decl),
            Item::Stmt(_) => None,
        })
    }

    /// Names of all units imported by `uses` clauses.
    pub fn imported_units(&self) -> impl Iterator<Item = &Ident> {
        self.uses.iter().flat_map(|clause| clause.units.iter())
    }
}

/// `uses A, B.C;`
#[derive(Clone, Debug, PartialEq)]
pub struct UsesClause {
    pub units: Vec<Ident>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Decl(Decl),
    Stmt(Stmt),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decl {
    Var(VarDecl),
    Const(ConstDecl),
    Type(TypeDecl),
    Routine(RoutineDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Const(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Routine(d) => d.span,
        }
    }
}

/// `var a, b: Integer := 1;`
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub names: Vec<Ident>,
    pub ty: Option<TypeRef>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// `const Max: Integer = 10;`
#[derive(Clone, Debug, PartialEq)]
pub struct ConstDecl {
    pub name: Ident,
    pub ty: Option<TypeRef>,
    pub value: Option<Expr>,
    pub span: Span,
}

/// `type Name = <definition>;`
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub name: Ident,
    pub def: TypeDef,
    pub span: Span,
}

impl TypeDecl {
    pub fn as_class(&self) -> Option<&ClassDef> {
        match &self.def {
            TypeDef::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Members of classes, records, interfaces and helpers.
    pub fn members(&self) -> &[Member] {
        match &self.def {
            TypeDef::Class(def) => &def.members,
            TypeDef::Record(def) => &def.members,
            TypeDef::Interface(def) => &def.members,
            TypeDef::Helper(def) => &def.members,
            TypeDef::Enum(_)
            | TypeDef::Array(_)
            | TypeDef::Set(_)
            | TypeDef::Alias(_) => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeDef {
    Class(ClassDef),
    Record(RecordDef),
    Interface(InterfaceDef),
    Enum(EnumDef),
    Array(ArrayDef),
    Set(SetDef),
    Helper(HelperDef),
    Alias(TypeRef),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    /// First name of the heritage list.
    pub parent: Option<Ident>,
    /// Remaining heritage names (implemented interfaces).
    pub interfaces: Vec<Ident>,
    pub is_abstract: bool,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordDef {
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceDef {
    pub parent: Option<Ident>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumDef {
    pub members: Vec<EnumMember>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnumMember {
    pub name: Ident,
    pub value: Option<Expr>,
    pub span: Span,
}

/// `array [0..9] of Integer` or `array of String`.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDef {
    pub bounds: Option<(Expr, Expr)>,
    pub element: TypeRef,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SetDef {
    pub element: TypeRef,
    pub span: Span,
}

/// `helper for Integer ... end` (also `record helper` / `class helper`).
#[derive(Clone, Debug, PartialEq)]
pub struct HelperDef {
    pub target: TypeRef,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(RoutineDecl),
    Property(PropertyDecl),
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::Field(f) => f.span,
            Member::Method(m) => m.span,
            Member::Property(p) => p.span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub names: Vec<Ident>,
    pub ty: Option<TypeRef>,
    /// Declared with `class var`.
    pub is_class_var: bool,
    pub span: Span,
}

/// `property Name[Index: Integer]: String read GetName write SetName;`
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ty: Option<TypeRef>,
    pub read: Option<Ident>,
    pub write: Option<Ident>,
    pub is_class_property: bool,
    pub span: Span,
}

/// A reference to a named type, possibly `array of T`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub name: Ident,
    /// Set for the open array form `array of T`; `name` is then `T`.
    pub is_array: bool,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutineKind {
    Procedure,
    Function,
    Constructor,
    Destructor,
}

impl RoutineKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "procedure",
            RoutineKind::Function => "function",
            RoutineKind::Constructor => "constructor",
            RoutineKind::Destructor => "destructor",
        }
    }
}

/// A procedure, function, constructor or destructor.
///
/// Used for free routines, method declarations inside a type, and method
/// implementations (`procedure TFoo.Bar;`), which carry `class_name`.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutineDecl {
    pub kind: RoutineKind,
    pub class_name: Option<Ident>,
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    /// Declared with `class procedure` / `class function`.
    pub is_class_method: bool,
    /// `virtual`, `override`, `abstract`, `forward`, ...
    pub directives: Vec<Ident>,
    /// `var` / `const` / `type` sections between the header and `begin`.
    pub locals: Vec<Decl>,
    pub body: Option<Block>,
    pub span: Span,
}

impl RoutineDecl {
    pub fn is_method_implementation(&self) -> bool {
        self.class_name.is_some()
    }

    pub fn has_directive(&self, directive: &str) -> bool {
        self.directives
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(directive))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamModifier {
    None,
    Var,
    Const,
    Out,
    Lazy,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub modifier: ParamModifier,
    pub ty: Option<TypeRef>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaseArm {
    pub labels: Vec<Expr>,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Block),
    /// Inline `var` statement.
    Var(VarDecl),
    Assign {
        target: Expr,
        value: Expr,
        span: Span,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Repeat {
        body: Vec<Stmt>,
        cond: Expr,
        span: Span,
    },
    /// `for [var] i := a to b do` or `for [var] x in xs do`.
    For {
        var: Ident,
        /// The loop variable is declared by the statement (`for var i`).
        declares: bool,
        start: Expr,
        end: Option<Expr>,
        body: Box<Stmt>,
        span: Span,
    },
    Case {
        subject: Expr,
        arms: Vec<CaseArm>,
        else_branch: Vec<Stmt>,
        span: Span,
    },
    Try {
        body: Vec<Stmt>,
        handler: Vec<Stmt>,
        is_finally: bool,
        span: Span,
    },
    Raise {
        value: Option<Expr>,
        span: Span,
    },
    Exit {
        value: Option<Expr>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(block) => block.span,
            Stmt::Var(decl) => decl.span,
            Stmt::Expr(expr) => expr.span,
            Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Repeat { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Case { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Raise { span, .. }
            | Stmt::Exit { span, .. } => *span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    Is,
    As,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Nil,
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: Ident,
    },
    Index {
        object: Box<Expr>,
        indices: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `inherited` or `inherited Name`.
    Inherited(Option<Ident>),
    /// `[a, b, c]`
    SetLiteral(Vec<Expr>),
    /// Placeholder produced by error recovery.
    Error,
}
