use crate::ast::Program;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::transpiler::Transpiler;

/// Tokenizes and parses a whole program.
pub fn parse_source(source: &str) -> Result<Program, Error> {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens()?;

    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Parses and runs a program against a fresh environment.
pub fn interpret(source: &str) -> Result<(), Error> {
    let program = parse_source(source)?;
    let mut interpreter = Interpreter::new();
    interpreter.run(&program)
}

/// Parses a program and renders it as Python source text.
pub fn transpile(source: &str) -> Result<String, Error> {
    let program = parse_source(source)?;
    let mut transpiler = Transpiler::new();
    transpiler.render(&program)
}
