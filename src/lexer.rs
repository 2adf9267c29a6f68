use crate::error::{Error, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,
    Greater,
    Less,

    // Multi-character operators
    EqEq,
    EqEqEq,
    BangEq,
    BangEqEq,
    GreaterEq,
    LessEq,
    AmpAmp,
    PipePipe,
    Arrow,
    PlusPlus,
    MinusMinus,
    PlusEq,
    MinusEq,

    // Literals
    Identifier,
    Str,
    Number,

    // Comments are kept as tokens: the parser turns them into AST nodes
    Comment,
    MultilineComment,

    // Keywords
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    While,
    For,
    In,
    Of,
    New,
    Class,
    Constructor,
    This,
    True,
    False,
    Console,

    // Special
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
    /// 1-based source line, used to attach trailing comments to statements.
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            kind,
            lexeme,
            span,
            line,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    start_line: usize,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("var", TokenKind::Var);
        keywords.insert("let", TokenKind::Let);
        keywords.insert("const", TokenKind::Const);
        keywords.insert("function", TokenKind::Function);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("if", TokenKind::If);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("while", TokenKind::While);
        keywords.insert("for", TokenKind::For);
        keywords.insert("in", TokenKind::In);
        keywords.insert("of", TokenKind::Of);
        keywords.insert("new", TokenKind::New);
        keywords.insert("class", TokenKind::Class);
        keywords.insert("constructor", TokenKind::Constructor);
        keywords.insert("this", TokenKind::This);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("console", TokenKind::Console);

        Self {
            source,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            start_line: 1,
            keywords,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, Error> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            "".to_string(),
            Span::single(self.current),
            self.line,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), Error> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ':' => self.add_token(TokenKind::Colon),
            ';' => self.add_token(TokenKind::Semicolon),
            '.' => self.add_token(TokenKind::Dot),
            '*' => self.add_token(TokenKind::Star),
            '%' => self.add_token(TokenKind::Percent),
            '+' => {
                let kind = if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                };
                self.add_token(kind);
            }
            '-' => {
                let kind = if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                };
                self.add_token(kind);
            }
            '=' => {
                // '=>' and '===' before their shorter prefixes
                let kind = if self.match_char('>') {
                    TokenKind::Arrow
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Eq
                };
                self.add_token(kind);
            }
            '!' => {
                let kind = if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::BangEqEq
                    } else {
                        TokenKind::BangEq
                    }
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEq
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEq
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '&' => {
                if self.match_char('&') {
                    self.add_token(TokenKind::AmpAmp);
                } else {
                    return Err(self.unexpected_char('&'));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenKind::PipePipe);
                } else {
                    return Err(self.unexpected_char('|'));
                }
            }
            '/' => {
                if self.match_char('/') {
                    self.line_comment();
                } else if self.match_char('*') {
                    self.multiline_comment()?;
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {
                // Whitespace is discarded
            }
            '\n' => {
                self.line += 1;
            }
            '"' | '\'' => self.string(c)?,
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            c => {
                return Err(self.unexpected_char(c));
            }
        }

        Ok(())
    }

    /// Lexical errors report the 1-based line and column of the offending
    /// character plus the full source line for display.
    fn unexpected_char(&self, c: char) -> Error {
        let offset = self.start;
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = self.source[offset..]
            .find('\n')
            .map_or(self.source.len(), |i| offset + i);
        let column = self.source[line_start..offset].chars().count() + 1;
        let line_text = &self.source[line_start..line_end];

        Error::lexical(
            Span::single(offset),
            format!(
                "Unrecognized character '{}' at line {}, column {}: {}",
                c, self.start_line, column, line_text
            ),
        )
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current..].chars().next().unwrap_or('\0');
        self.current += c.len_utf8();
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn line_comment(&mut self) {
        while self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }
        let text = self.source[self.start + 2..self.current].trim().to_string();
        self.add_token_with_content(TokenKind::Comment, text);
    }

    /// Matches non-greedily up to the first '*/'. Running off the end of the
    /// input is a lexical error, not a comment to end of file.
    fn multiline_comment(&mut self) -> Result<(), Error> {
        loop {
            if self.is_at_end() {
                return Err(Error::lexical(
                    Span::new(self.start, self.current),
                    "Unterminated multiline comment".to_string(),
                ));
            }
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                break;
            }
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        let text = self.source[self.start + 2..self.current - 2].to_string();
        self.add_token_with_content(TokenKind::MultilineComment, text);
        Ok(())
    }

    fn string(&mut self, quote: char) -> Result<(), Error> {
        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                // Escaped characters pass through verbatim; decoding is not
                // this layer's job.
                self.advance();
                if self.is_at_end() {
                    break;
                }
            }
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::lexical(
                Span::new(self.start, self.current),
                "Unterminated string".to_string(),
            ));
        }

        // Consume the closing quote
        self.advance();

        let content = self.source[self.start + 1..self.current - 1].to_string();
        self.add_token_with_content(TokenKind::Str, content);
        Ok(())
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(TokenKind::Number);
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let kind = self
            .keywords
            .get(text)
            .cloned()
            .unwrap_or(TokenKind::Identifier);

        self.add_token(kind);
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_content(kind, text.to_string());
    }

    fn add_token_with_content(&mut self, kind: TokenKind, lexeme: String) {
        self.tokens.push(Token::new(
            kind,
            lexeme,
            Span::new(self.start, self.current),
            self.start_line,
        ));
    }
}
