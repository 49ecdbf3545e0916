//! Front end for PScript: lexer, parser, AST and a pre-order visitor.
//!
//! ```
//! let result = pscript_syntax::parse("var x: Integer;\nx := 10;");
//! assert!(result.diagnostics.is_empty());
//! assert_eq!(result.program.items.len(), 2);
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod visit;

pub use ast::*;
pub use parser::{ParseDiagnostic, ParseResult, parse};
pub use span::{Pos, Span};
pub use visit::{NodeRef, VisitFlow, Visitor, walk_program};
