use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

#[derive(Debug, Clone)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Name,
    Type,
    Attribute,
    Transpilation,
}

/// One error type for every pass. Lexer and parser errors carry a byte span
/// into the source; runtime and transpiler errors usually do not, since AST
/// nodes carry no positions.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub message: String,
    pub help: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Option<Span>, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn lexical(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Lexical, Some(span), message)
    }

    pub fn syntax(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Syntax, Some(span), message)
    }

    pub fn name(message: String) -> Self {
        Self::new(ErrorKind::Name, None, message)
    }

    pub fn type_error(message: String) -> Self {
        Self::new(ErrorKind::Type, None, message)
    }

    pub fn attribute(message: String) -> Self {
        Self::new(ErrorKind::Attribute, None, message)
    }

    pub fn transpilation(message: String) -> Self {
        Self::new(ErrorKind::Transpilation, None, message)
    }

    fn kind_str(&self) -> &'static str {
        match self.kind {
            ErrorKind::Lexical => "Lexical Error",
            ErrorKind::Syntax => "Syntax Error",
            ErrorKind::Name => "Name Error",
            ErrorKind::Type => "Type Error",
            ErrorKind::Attribute => "Attribute Error",
            ErrorKind::Transpilation => "Transpilation Error",
        }
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::Lexical => Color::Red,
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Transpilation => Color::Cyan,
            _ => Color::Magenta,
        };

        let span = match &self.span {
            Some(span) => span.clone(),
            None => {
                // Runtime errors have no source position to point at.
                eprintln!("{}: {}", self.kind_str().fg(color), self.message);
                if let Some(ref help_text) = self.help {
                    eprintln!("{}: {}", "help".fg(Color::Cyan), help_text);
                }
                return;
            }
        };

        let mut report_builder = Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("{}: {}", self.kind_str().fg(color), self.message))
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .print((filename, Source::from(source)))
            .ok();
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind_str(), self.message)
    }
}

impl std::error::Error for Error {}
