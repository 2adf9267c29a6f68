mod ast;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod repl;
mod runner;
mod transpiler;
mod value;

use clap::{Arg, Command};
use std::fs;
use std::path::Path;

enum Mode {
    Transpile,
    Interpret,
    All,
}

fn main() {
    let matches = Command::new("js2py")
        .about("Interpreter and Python transpiler for a small JavaScript-like language")
        .arg(
            Arg::new("file")
                .help("The script file to process")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("interpret")
                .short('i')
                .long("interpret")
                .help("Run the program instead of transpiling it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("transpile")
                .short('t')
                .long("transpile")
                .help("Transpile the program to Python (default)")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("all")
                .short('a')
                .long("all")
                .help("Print the transpiled Python, then run the program")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write the transpiled output to a file instead of stdout")
                .value_name("OUT"),
        )
        .get_matches();

    let mode = if matches.get_flag("all") {
        Mode::All
    } else if matches.get_flag("interpret") {
        Mode::Interpret
    } else {
        Mode::Transpile
    };

    match matches.get_one::<String>("file") {
        Some(file_path) => {
            let output = matches.get_one::<String>("output").map(String::as_str);
            run_file(file_path, mode, output);
        }
        None => repl::start(),
    }
}

fn run_file(path: &str, mode: Mode, output: Option<&str>) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        std::process::exit(1);
    }

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };
    let filename = path.to_str();

    match mode {
        Mode::Transpile => transpile_source(&source, filename, output),
        Mode::Interpret => interpret_source(&source, filename),
        Mode::All => {
            transpile_source(&source, filename, output);
            println!();
            interpret_source(&source, filename);
        }
    }
}

fn transpile_source(source: &str, filename: Option<&str>, output: Option<&str>) {
    let code = match runner::transpile(source) {
        Ok(code) => code,
        Err(error) => {
            error.report(source, filename);
            std::process::exit(1);
        }
    };

    match output {
        Some(out_path) => {
            if let Err(e) = fs::write(out_path, format!("{}\n", code)) {
                eprintln!("Error writing '{}': {}", out_path, e);
                std::process::exit(1);
            }
        }
        None => println!("{}", code),
    }
}

fn interpret_source(source: &str, filename: Option<&str>) {
    if let Err(error) = runner::interpret(source) {
        error.report(source, filename);
        std::process::exit(1);
    }
}
