use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use std::io::{self, Write};

/// Interactive interpreter loop. State persists between commands: one
/// interpreter (and therefore one environment) lives for the whole session.
pub fn start() {
    println!("js2py interpreter v0.1.0");
    println!("Type 'exit' or press Ctrl+C to quit");
    println!();

    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                run_repl_command(line, &mut interpreter);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_repl_command(source: &str, interpreter: &mut Interpreter) {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = match lexer.scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    let mut parser = Parser::new(tokens);
    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // A lone expression statement echoes its value
    if program.statements.len() == 1 {
        if let crate::ast::Stmt::Expr { expr } = &program.statements[0] {
            match interpreter.eval_expression(expr) {
                Ok(Value::Null) => {}
                Ok(value) => println!("{}", value),
                Err(error) => error.report(source, None),
            }
            return;
        }
    }

    if let Err(error) = interpreter.run(&program) {
        error.report(source, None);
    }
}
