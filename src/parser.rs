use crate::ast::{
    AssignOp, BinaryOp, ConstructorDecl, DeclKind, Expr, IterKind, LambdaBody, Literal,
    MethodDecl, Program, Stmt, UnaryOp, UpdateOp,
};
use crate::error::{Error, Span};
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, Error> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
        }

        Ok(Program { statements })
    }

    fn statement(&mut self) -> Result<Stmt, Error> {
        let stmt = self.dispatch_statement()?;

        // A comment on the same line as the statement it follows wraps the
        // statement rather than standing alone.
        if self.check(&TokenKind::Comment) && self.peek().line == self.previous().line {
            let comment = self.advance().lexeme.clone();
            return Ok(Stmt::Commented {
                stmt: Box::new(stmt),
                comment,
            });
        }

        Ok(stmt)
    }

    fn dispatch_statement(&mut self) -> Result<Stmt, Error> {
        match self.peek().kind {
            TokenKind::Comment => {
                let text = self.advance().lexeme.clone();
                Ok(Stmt::Comment { text })
            }
            TokenKind::MultilineComment => {
                let text = self.advance().lexeme.clone();
                Ok(Stmt::MultilineComment { text })
            }
            TokenKind::Class => self.class_declaration(),
            TokenKind::Var | TokenKind::Let | TokenKind::Const => self.var_declaration(),
            TokenKind::Console => self.console_log(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Function => self.function_declaration(),
            TokenKind::Return => self.return_statement(),
            TokenKind::This | TokenKind::Identifier => {
                let stmt = self.simple_statement()?;
                self.consume(TokenKind::Semicolon, "Expected ';' after statement")?;
                Ok(stmt)
            }
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block {
                    statements: self.block()?,
                })
            }
            _ => Err(self.error_at_current("Unexpected token at start of statement")),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, Error> {
        let mut statements = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(statements)
    }

    fn braced_block(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::LeftBrace, "Expected '{' before block")?;
        Ok(Stmt::Block {
            statements: self.block()?,
        })
    }

    fn var_declaration(&mut self) -> Result<Stmt, Error> {
        let kind = match self.advance().kind {
            TokenKind::Let => DeclKind::Let,
            TokenKind::Const => DeclKind::Const,
            _ => DeclKind::Var,
        };
        let name = self
            .consume(TokenKind::Identifier, "Expected variable name")?
            .lexeme
            .clone();

        // `var x;` declares with a null initializer
        if self.match_kinds(&[TokenKind::Semicolon]) {
            return Ok(Stmt::VarDecl {
                kind,
                name,
                init: Expr::Literal {
                    value: Literal::Null,
                },
            });
        }

        self.consume(TokenKind::Eq, "Expected '=' after variable name")?;

        let init = if self.check(&TokenKind::LeftParen) {
            match self.try_arrow_function()? {
                Some(func) => func,
                None => self.expression()?,
            }
        } else {
            self.expression()?
        };

        self.consume(
            TokenKind::Semicolon,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::VarDecl { kind, name, init })
    }

    /// A `(` after `=` is ambiguous: arrow-function parameter list or
    /// parenthesized expression. No fixed lookahead depth settles it, so we
    /// skip the parenthesized group, commit to an arrow function only if
    /// `=>` follows, and rewind otherwise.
    fn try_arrow_function(&mut self) -> Result<Option<Expr>, Error> {
        let checkpoint = self.current;

        self.advance(); // '('
        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            self.advance();
        }
        if !self.check(&TokenKind::RightParen) {
            self.current = checkpoint;
            return Ok(None);
        }
        self.advance(); // ')'

        if self.check(&TokenKind::Arrow) {
            self.current = checkpoint;
            return Ok(Some(self.arrow_function()?));
        }

        self.current = checkpoint;
        Ok(None)
    }

    fn arrow_function(&mut self) -> Result<Expr, Error> {
        let params = self.parameters()?;
        self.consume(TokenKind::Arrow, "Expected '=>' after parameter list")?;

        if self.check(&TokenKind::LeftBrace) {
            self.advance();
            let body = self.block()?;
            Ok(Expr::Lambda {
                params,
                body: LambdaBody::Block(body),
            })
        } else {
            let expr = self.expression()?;
            Ok(Expr::Lambda {
                params,
                body: LambdaBody::Expr(Box::new(expr)),
            })
        }
    }

    /// An expression-headed statement: a call or method call, an update
    /// expression, or an assignment (`=`, `+=`, `-=`) whose target is the
    /// parsed expression. Does not consume the terminator.
    fn simple_statement(&mut self) -> Result<Stmt, Error> {
        let expr = self.expression()?;

        if self.match_kinds(&[TokenKind::Eq]) {
            let value = self.expression()?;
            return Ok(Stmt::Assign {
                target: expr,
                op: AssignOp::Set,
                value,
            });
        }
        if self.match_kinds(&[TokenKind::PlusEq]) {
            let value = self.expression()?;
            return Ok(Stmt::Assign {
                target: expr,
                op: AssignOp::Add,
                value,
            });
        }
        if self.match_kinds(&[TokenKind::MinusEq]) {
            let value = self.expression()?;
            return Ok(Stmt::Assign {
                target: expr,
                op: AssignOp::Sub,
                value,
            });
        }

        Ok(Stmt::Expr { expr })
    }

    fn console_log(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::Console, "Expected 'console'")?;
        self.consume(TokenKind::Dot, "Expected '.' after 'console'")?;
        let method = self.consume(TokenKind::Identifier, "Expected 'log' after 'console.'")?;
        if method.lexeme != "log" {
            return Err(Error::syntax(
                method.span.clone(),
                format!("Unknown console method '{}'", method.lexeme),
            ));
        }
        self.consume(TokenKind::LeftParen, "Expected '(' after 'console.log'")?;
        let args = self.arguments_after_paren()?;
        self.consume(TokenKind::Semicolon, "Expected ';' after console.log")?;
        Ok(Stmt::ConsoleLog { args })
    }

    fn if_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::If, "Expected 'if'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_branch = Box::new(self.braced_block()?);

        // `else if` becomes a nested if-statement in the else branch
        let else_branch = if self.match_kinds(&[TokenKind::Else]) {
            if self.check(&TokenKind::If) {
                Some(Box::new(self.if_statement()?))
            } else {
                Some(Box::new(self.braced_block()?))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::While, "Expected 'while'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;
        let body = Box::new(self.braced_block()?);

        Ok(Stmt::While { condition, body })
    }

    /// `for (` heads either a for-each (`for (var x of arr)`) or a
    /// traditional three-clause loop; which one is only known after the
    /// loop variable, so we scan ahead and rewind if `in`/`of` is absent.
    fn for_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::For, "Expected 'for'")?;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'for'")?;

        let checkpoint = self.current;
        if matches!(
            self.peek().kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            self.advance();
        }
        if self.check(&TokenKind::Identifier) {
            let var = self.advance().lexeme.clone();
            let kind = match self.peek().kind {
                TokenKind::In => Some(IterKind::In),
                TokenKind::Of => Some(IterKind::Of),
                _ => None,
            };
            if let Some(kind) = kind {
                self.advance();
                let iterable = self.expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after for-each header")?;
                let body = Box::new(self.braced_block()?);
                return Ok(Stmt::ForEach {
                    var,
                    kind,
                    iterable,
                    body,
                });
            }
        }
        self.current = checkpoint;

        let init = if self.match_kinds(&[TokenKind::Semicolon]) {
            None
        } else {
            let stmt = self.for_clause()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after for initializer")?;
            Some(Box::new(stmt))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after for condition")?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.for_clause()?))
        };
        self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.braced_block()?);

        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    /// Init and update clauses of a traditional for: a declaration, an
    /// assignment, a compound assignment, `++`/`--`, or a bare expression.
    fn for_clause(&mut self) -> Result<Stmt, Error> {
        if matches!(
            self.peek().kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let kind = match self.advance().kind {
                TokenKind::Let => DeclKind::Let,
                TokenKind::Const => DeclKind::Const,
                _ => DeclKind::Var,
            };
            let name = self
                .consume(TokenKind::Identifier, "Expected variable name")?
                .lexeme
                .clone();
            self.consume(TokenKind::Eq, "Expected '=' after variable name")?;
            let init = self.expression()?;
            return Ok(Stmt::VarDecl { kind, name, init });
        }

        self.simple_statement()
    }

    fn function_declaration(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::Function, "Expected 'function'")?;
        let name = self
            .consume(TokenKind::Identifier, "Expected function name")?
            .lexeme
            .clone();
        let params = self.parameters()?;
        self.consume(TokenKind::LeftBrace, "Expected '{' before function body")?;
        let body = self.block()?;

        Ok(Stmt::FunctionDecl { name, params, body })
    }

    fn return_statement(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::Return, "Expected 'return'")?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expected ';' after return value")?;
        Ok(Stmt::Return { value })
    }

    fn class_declaration(&mut self) -> Result<Stmt, Error> {
        self.consume(TokenKind::Class, "Expected 'class'")?;
        let name = self
            .consume(TokenKind::Identifier, "Expected class name")?
            .lexeme
            .clone();
        self.consume(TokenKind::LeftBrace, "Expected '{' after class name")?;

        let mut constructor = None;
        let mut methods = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            match self.peek().kind {
                TokenKind::Constructor => {
                    if constructor.is_some() {
                        return Err(self.error_at_current("Class already has a constructor"));
                    }
                    self.advance();
                    let params = self.parameters()?;
                    self.consume(TokenKind::LeftBrace, "Expected '{' before constructor body")?;
                    let body = self.block()?;
                    constructor = Some(ConstructorDecl { params, body });
                }
                TokenKind::Identifier => {
                    let method_name = self.advance().lexeme.clone();
                    let params = self.parameters()?;
                    self.consume(TokenKind::LeftBrace, "Expected '{' before method body")?;
                    let body = self.block()?;
                    methods.push(MethodDecl {
                        name: method_name,
                        params,
                        body,
                    });
                }
                TokenKind::Comment | TokenKind::MultilineComment => {
                    self.advance();
                }
                _ => {
                    return Err(self.error_at_current("Unexpected token inside class body"));
                }
            }
        }

        self.consume(TokenKind::RightBrace, "Expected '}' after class body")?;

        Ok(Stmt::ClassDecl {
            name,
            constructor,
            methods,
        })
    }

    // --- Expressions, precedence low to high ---

    fn expression(&mut self) -> Result<Expr, Error> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, Error> {
        let mut expr = self.logical_and()?;

        while self.match_kinds(&[TokenKind::PipePipe]) {
            let right = self.logical_and()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinaryOp::Or,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, Error> {
        let mut expr = self.comparison()?;

        while self.match_kinds(&[TokenKind::AmpAmp]) {
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op: BinaryOp::And,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, Error> {
        let mut expr = self.additive()?;

        while self.match_kinds(&[
            TokenKind::Greater,
            TokenKind::GreaterEq,
            TokenKind::Less,
            TokenKind::LessEq,
            TokenKind::EqEq,
            TokenKind::BangEq,
            TokenKind::EqEqEq,
            TokenKind::BangEqEq,
        ]) {
            let op = match self.previous().kind {
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEq => BinaryOp::GreaterEq,
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEq => BinaryOp::LessEq,
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                _ => BinaryOp::StrictNotEq,
            };
            let right = self.additive()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, Error> {
        let mut expr = self.multiplicative()?;

        while self.match_kinds(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = match self.previous().kind {
                TokenKind::Plus => BinaryOp::Add,
                _ => BinaryOp::Sub,
            };
            let right = self.multiplicative()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, Error> {
        let mut expr = self.unary()?;

        while self.match_kinds(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent]) {
            let op = match self.previous().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => BinaryOp::Mod,
            };
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, Error> {
        if self.match_kinds(&[TokenKind::Bang, TokenKind::Minus, TokenKind::Plus]) {
            let op = match self.previous().kind {
                TokenKind::Bang => UnaryOp::Not,
                TokenKind::Minus => UnaryOp::Negate,
                _ => UnaryOp::Plus,
            };
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        if self.match_kinds(&[TokenKind::PlusPlus, TokenKind::MinusMinus]) {
            let op = match self.previous().kind {
                TokenKind::PlusPlus => UpdateOp::Increment,
                _ => UpdateOp::Decrement,
            };
            let target = self.unary()?;
            return Ok(Expr::Update {
                op,
                prefix: true,
                target: Box::new(target),
            });
        }

        let expr = self.primary()?;
        self.postfix(expr)
    }

    /// Trailing `.prop`, `.method(args)`, `[index]`, direct call `(args)`
    /// on a bare identifier, and postfix `++`/`--`.
    fn postfix(&mut self, mut node: Expr) -> Result<Expr, Error> {
        loop {
            if self.match_kinds(&[TokenKind::Dot]) {
                let property = self
                    .consume(TokenKind::Identifier, "Expected property name after '.'")?
                    .lexeme
                    .clone();
                if self.match_kinds(&[TokenKind::LeftParen]) {
                    let args = self.arguments_after_paren()?;
                    node = Expr::MethodCall {
                        object: Box::new(node),
                        method: property,
                        args,
                    };
                } else {
                    node = Expr::PropertyAccess {
                        object: Box::new(node),
                        property,
                    };
                }
            } else if self.match_kinds(&[TokenKind::LeftBracket]) {
                let index = self.expression()?;
                self.consume(TokenKind::RightBracket, "Expected ']' after index")?;
                node = Expr::Index {
                    object: Box::new(node),
                    index: Box::new(index),
                };
            } else if self.check(&TokenKind::LeftParen) {
                let name = match &node {
                    Expr::Identifier { name } => name.clone(),
                    _ => break,
                };
                self.advance();
                let args = self.arguments_after_paren()?;
                node = Expr::Call { name, args };
            } else if self.match_kinds(&[TokenKind::PlusPlus]) {
                node = Expr::Update {
                    op: UpdateOp::Increment,
                    prefix: false,
                    target: Box::new(node),
                };
            } else if self.match_kinds(&[TokenKind::MinusMinus]) {
                node = Expr::Update {
                    op: UpdateOp::Decrement,
                    prefix: false,
                    target: Box::new(node),
                };
            } else {
                break;
            }
        }

        Ok(node)
    }

    fn primary(&mut self) -> Result<Expr, Error> {
        if self.is_at_end() {
            return Err(self.error_at_current("Unexpected end of input, expected expression"));
        }

        let token = self.advance().clone();

        match token.kind {
            TokenKind::Number => {
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    Error::syntax(
                        token.span.clone(),
                        format!("Invalid number literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Literal {
                    value: Literal::Number(value),
                })
            }
            TokenKind::Str => Ok(Expr::Literal {
                value: Literal::Str(token.lexeme),
            }),
            TokenKind::True => Ok(Expr::Literal {
                value: Literal::Bool(true),
            }),
            TokenKind::False => Ok(Expr::Literal {
                value: Literal::Bool(false),
            }),
            TokenKind::Identifier => Ok(Expr::Identifier { name: token.lexeme }),
            TokenKind::This => Ok(Expr::This),
            TokenKind::New => {
                let class_name = self
                    .consume(TokenKind::Identifier, "Expected class name after 'new'")?
                    .lexeme
                    .clone();
                self.consume(TokenKind::LeftParen, "Expected '(' after class name")?;
                let args = self.arguments_after_paren()?;
                Ok(Expr::New { class_name, args })
            }
            TokenKind::LeftParen => {
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_kinds(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RightBracket, "Expected ']' after array elements")?;
                Ok(Expr::Array { elements })
            }
            TokenKind::LeftBrace => {
                let mut pairs = Vec::new();
                if !self.check(&TokenKind::RightBrace) {
                    loop {
                        let key = match self.peek().kind {
                            TokenKind::Identifier | TokenKind::Str => {
                                self.advance().lexeme.clone()
                            }
                            _ => {
                                return Err(
                                    self.error_at_current("Expected property name in object")
                                )
                            }
                        };
                        self.consume(TokenKind::Colon, "Expected ':' after object key")?;
                        let value = self.expression()?;
                        pairs.push((key, value));
                        if !self.match_kinds(&[TokenKind::Comma]) {
                            break;
                        }
                    }
                }
                self.consume(TokenKind::RightBrace, "Expected '}' after object literal")?;
                Ok(Expr::Object { pairs })
            }
            _ => Err(Error::syntax(
                token.span,
                format!(
                    "Expected expression, found {:?} '{}'",
                    token.kind, token.lexeme
                ),
            )),
        }
    }

    // --- Shared pieces ---

    /// Comma-separated argument list; `(` already consumed, consumes `)`.
    fn arguments_after_paren(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_kinds(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    /// Parenthesized parameter-name list, consuming both parens.
    fn parameters(&mut self) -> Result<Vec<String>, Error> {
        self.consume(TokenKind::LeftParen, "Expected '(' before parameter list")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                let param = self
                    .consume(TokenKind::Identifier, "Expected parameter name")?
                    .lexeme
                    .clone();
                params.push(param);
                if !self.match_kinds(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameter list")?;
        Ok(params)
    }

    fn match_kinds(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().kind == kind
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, Error> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(&format!(
                "{}, found {:?} '{}'",
                message,
                self.peek().kind,
                self.peek().lexeme
            )))
        }
    }

    fn error_at_current(&self, message: &str) -> Error {
        let span = if self.is_at_end() && self.current > 0 {
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            self.peek().span.clone()
        };
        Error::syntax(span, message.to_string())
    }
}
