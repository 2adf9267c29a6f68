// js2py core library
//
// A lexer, recursive-descent parser, tree-walking interpreter, and Python
// transpiler for a small JavaScript-like scripting language.

// Public modules
pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod transpiler;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use error::{Error, ErrorKind, Span};
pub use interpreter::{Environment, Interpreter};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use transpiler::Transpiler;
pub use value::Value;

// Re-export main entry points
pub use repl::start as start_repl;
pub use runner::{interpret, parse_source, transpile};
