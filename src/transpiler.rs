use crate::ast::{
    AssignOp, BinaryOp, Expr, LambdaBody, Literal, Program, Stmt, UnaryOp, UpdateOp,
};
use crate::error::Error;
use crate::value::format_number;

const INDENT: &str = "    ";
const COMMENT_BORDER: &str = "# --------------------";

/// Renders a parsed program as Python source text.
pub struct Transpiler {
    uses_math: bool,
    uses_random: bool,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transpiler {
    pub fn new() -> Self {
        Self {
            uses_math: false,
            uses_random: false,
        }
    }

    pub fn render(&mut self, program: &Program) -> Result<String, Error> {
        let mut fragments = Vec::new();

        for (i, stmt) in program.statements.iter().enumerate() {
            let fragment = self.stmt(stmt)?;
            if i > 0 && needs_blank_line(&program.statements[i - 1], stmt) {
                fragments.push(String::new());
            }
            fragments.push(fragment);
        }

        let body = fragments.join("\n");

        let mut imports = Vec::new();
        if self.uses_math {
            imports.push("import math");
        }
        if self.uses_random {
            imports.push("import random");
        }

        if imports.is_empty() {
            Ok(body)
        } else {
            Ok(format!("{}\n\n{}", imports.join("\n"), body))
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<String, Error> {
        match stmt {
            Stmt::VarDecl { name, init, .. } => match init {
                Expr::Lambda {
                    params,
                    body: LambdaBody::Expr(expr),
                } => Ok(format!(
                    "{} = lambda {}: {}",
                    name,
                    params.join(", "),
                    self.expr(expr)?
                )),
                Expr::Lambda {
                    params,
                    body: LambdaBody::Block(statements),
                } => Ok(format!(
                    "def {}({}):\n{}",
                    name,
                    params.join(", "),
                    indent(&self.stmts_body(statements)?)
                )),
                _ => Ok(format!("{} = {}", name, self.expr(init)?)),
            },
            Stmt::Assign { target, op, value } => {
                let op = match op {
                    AssignOp::Set => "=",
                    AssignOp::Add => "+=",
                    AssignOp::Sub => "-=",
                };
                Ok(format!(
                    "{} {} {}",
                    self.expr(target)?,
                    op,
                    self.expr(value)?
                ))
            }
            Stmt::ConsoleLog { args } => {
                if args.is_empty() {
                    return Ok("print()".to_string());
                }
                let prints = args
                    .iter()
                    .map(|arg| Ok(format!("print({})", self.expr(arg)?)))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(prints.join("\n"))
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut code = format!(
                    "if {}:\n{}",
                    self.expr(condition)?,
                    indent(&self.block_body(then_branch)?)
                );
                if let Some(else_branch) = else_branch {
                    // `else if` renders as an if-statement nested under else:
                    let rendered = match else_branch.as_ref() {
                        Stmt::If { .. } => self.stmt(else_branch)?,
                        other => self.block_body(other)?,
                    };
                    code.push_str(&format!("\nelse:\n{}", indent(&rendered)));
                }
                Ok(code)
            }
            Stmt::While { condition, body } => Ok(format!(
                "while {}:\n{}",
                self.expr(condition)?,
                indent(&self.block_body(body)?)
            )),
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                let condition = match condition {
                    Some(condition) => self.expr(condition)?,
                    None => "True".to_string(),
                };

                // the update clause moves to the end of the while body
                let mut body = self.block_body(body)?;
                if let Some(update) = update {
                    let update = self.stmt(update)?;
                    if body == "pass" {
                        body = update;
                    } else {
                        body.push('\n');
                        body.push_str(&update);
                    }
                }

                let loop_code = format!("while {}:\n{}", condition, indent(&body));
                match init {
                    Some(init) => Ok(format!("{}\n{}", self.stmt(init)?, loop_code)),
                    None => Ok(loop_code),
                }
            }
            Stmt::ForEach {
                var,
                iterable,
                body,
                ..
            } => Ok(format!(
                "for {} in {}:\n{}",
                var,
                self.expr(iterable)?,
                indent(&self.block_body(body)?)
            )),
            Stmt::Block { statements } => self.stmts_body(statements),
            Stmt::FunctionDecl { name, params, body } => Ok(format!(
                "def {}({}):\n{}",
                name,
                params.join(", "),
                indent(&self.stmts_body(body)?)
            )),
            Stmt::Return { value } => match value {
                Some(value) => Ok(format!("return {}", self.expr(value)?)),
                None => Ok("return".to_string()),
            },
            Stmt::ClassDecl {
                name,
                constructor,
                methods,
            } => {
                let mut code = format!("class {}:", name);

                if constructor.is_none() && methods.is_empty() {
                    code.push_str(&format!("\n{}pass", INDENT));
                    return Ok(code);
                }

                if let Some(constructor) = constructor {
                    let mut params = vec!["self".to_string()];
                    params.extend(constructor.params.iter().cloned());
                    let init = format!(
                        "def __init__({}):\n{}",
                        params.join(", "),
                        indent(&self.stmts_body(&constructor.body)?)
                    );
                    code.push_str(&format!("\n{}", indent(&init)));
                }

                for method in methods {
                    let mut params = vec!["self".to_string()];
                    params.extend(method.params.iter().cloned());
                    let rendered = format!(
                        "def {}({}):\n{}",
                        method.name,
                        params.join(", "),
                        indent(&self.stmts_body(&method.body)?)
                    );
                    code.push_str(&format!("\n{}", indent(&rendered)));
                }

                Ok(code)
            }
            Stmt::Expr { expr } => match expr {
                Expr::Update { op, target, .. } => self.update_stmt(*op, target),
                Expr::Lambda { .. } => Err(Error::transpilation(
                    "an anonymous function cannot stand alone as a statement".to_string(),
                )),
                _ => self.expr(expr),
            },
            Stmt::Comment { text } => Ok(format!("# {}", text)),
            Stmt::MultilineComment { text } => {
                let mut lines = vec![COMMENT_BORDER.to_string()];
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        lines.push("#".to_string());
                    } else {
                        lines.push(format!("# {}", line));
                    }
                }
                lines.push(COMMENT_BORDER.to_string());
                Ok(lines.join("\n"))
            }
            Stmt::Commented { stmt, comment } => {
                let rendered = self.stmt(stmt)?;
                // the comment rides on the last rendered line
                match rendered.rfind('\n') {
                    Some(pos) => Ok(format!(
                        "{}{}  # {}",
                        &rendered[..pos + 1],
                        &rendered[pos + 1..],
                        comment
                    )),
                    None => Ok(format!("{}  # {}", rendered, comment)),
                }
            }
        }
    }

    /// `i++` in statement position renders as `i += 1`; array-length
    /// updates render as the equivalent append/pop.
    fn update_stmt(&mut self, op: UpdateOp, target: &Expr) -> Result<String, Error> {
        if let Expr::PropertyAccess { object, property } = target {
            if property == "length" {
                let object = self.expr(object)?;
                return Ok(match op {
                    UpdateOp::Increment => format!("{}.append(None)", object),
                    UpdateOp::Decrement => format!("{}.pop()", object),
                });
            }
        }
        let target = self.expr(target)?;
        Ok(match op {
            UpdateOp::Increment => format!("{} += 1", target),
            UpdateOp::Decrement => format!("{} -= 1", target),
        })
    }

    /// Renders a loop/branch body (always a block node); empty bodies
    /// render `pass`.
    fn block_body(&mut self, stmt: &Stmt) -> Result<String, Error> {
        match stmt {
            Stmt::Block { statements } => self.stmts_body(statements),
            other => self.stmt(other),
        }
    }

    fn stmts_body(&mut self, statements: &[Stmt]) -> Result<String, Error> {
        if statements.is_empty() {
            return Ok("pass".to_string());
        }
        let rendered = statements
            .iter()
            .map(|stmt| self.stmt(stmt))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(rendered.join("\n"))
    }

    fn expr(&mut self, expr: &Expr) -> Result<String, Error> {
        match expr {
            Expr::Literal { value } => Ok(render_literal(value)),
            Expr::Identifier { name } => Ok(name.clone()),
            Expr::Binary { left, op, right } => {
                let l = self.expr(left)?;
                let r = self.expr(right)?;
                match op {
                    BinaryOp::Eq | BinaryOp::StrictEq => Ok(format!("({} == {})", l, r)),
                    BinaryOp::NotEq | BinaryOp::StrictNotEq => Ok(format!("({} != {})", l, r)),
                    BinaryOp::And => Ok(format!("({} and {})", l, r)),
                    BinaryOp::Or => Ok(format!("({} or {})", l, r)),
                    BinaryOp::Add => {
                        if might_be_string(left) || might_be_string(right) {
                            Ok(format!("(str({}) + str({}))", l, r))
                        } else {
                            Ok(format!("({} + {})", l, r))
                        }
                    }
                    other => Ok(format!("({} {} {})", l, other.as_str(), r)),
                }
            }
            Expr::Unary { op, operand } => {
                let operand = self.expr(operand)?;
                Ok(match op {
                    UnaryOp::Not => format!("(not {})", operand),
                    UnaryOp::Negate => format!("(-{})", operand),
                    UnaryOp::Plus => format!("(+{})", operand),
                })
            }
            Expr::Update { .. } => Err(Error::transpilation(
                "an increment/decrement has no rendering inside an expression".to_string(),
            )),
            Expr::Call { name, args } => Ok(format!("{}({})", name, self.args(args)?)),
            Expr::Array { elements } => Ok(format!("[{}]", self.args(elements)?)),
            Expr::Object { pairs } => {
                let rendered = pairs
                    .iter()
                    .map(|(key, value)| Ok(format!("\"{}\": {}", key, self.expr(value)?)))
                    .collect::<Result<Vec<_>, Error>>()?;
                Ok(format!("{{{}}}", rendered.join(", ")))
            }
            Expr::Index { object, index } => {
                Ok(format!("{}[{}]", self.expr(object)?, self.expr(index)?))
            }
            Expr::PropertyAccess { object, property } => {
                if is_math_name(object) {
                    return match property.as_str() {
                        "PI" => {
                            self.uses_math = true;
                            Ok("math.pi".to_string())
                        }
                        "E" => {
                            self.uses_math = true;
                            Ok("math.e".to_string())
                        }
                        other => Ok(format!("Math.{}", other)),
                    };
                }
                let object = self.expr(object)?;
                if property == "length" {
                    Ok(format!("len({})", object))
                } else {
                    Ok(format!("{}.{}", object, property))
                }
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => self.method_call(object, method, args),
            Expr::Lambda {
                params,
                body: LambdaBody::Expr(expr),
            } => Ok(format!("lambda {}: {}", params.join(", "), self.expr(expr)?)),
            Expr::Lambda { .. } => Err(Error::transpilation(
                "a block-bodied arrow function cannot be rendered inline".to_string(),
            )),
            Expr::New { class_name, args } => {
                Ok(format!("{}({})", class_name, self.args(args)?))
            }
            Expr::This => Ok("self".to_string()),
        }
    }

    fn args(&mut self, args: &[Expr]) -> Result<String, Error> {
        let rendered = args
            .iter()
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(rendered.join(", "))
    }

    fn method_call(
        &mut self,
        object: &Expr,
        method: &str,
        args: &[Expr],
    ) -> Result<String, Error> {
        if is_math_name(object) {
            return self.math_call(method, args);
        }

        let obj = self.expr(object)?;
        let args = args.iter().map(|a| self.expr(a)).collect::<Result<Vec<_>, Error>>()?;

        match method {
            "charAt" => {
                if args.len() != 1 {
                    return Err(Error::type_error(format!(
                        "charAt() takes exactly 1 argument ({} given)",
                        args.len()
                    )));
                }
                Ok(format!(
                    "{obj}[{i}] if 0 <= {i} < len({obj}) else ''",
                    obj = obj,
                    i = args[0]
                ))
            }
            "substr" => match args.len() {
                1 => Ok(format!("{}[{}:]", obj, args[0])),
                2 => Ok(format!("{}[{}:{}+{}]", obj, args[0], args[0], args[1])),
                n => Err(Error::type_error(format!(
                    "substr() takes 1 or 2 arguments ({} given)",
                    n
                ))),
            },
            "substring" => match args.len() {
                1 => Ok(format!("{}[{}:]", obj, args[0])),
                2 => Ok(format!("{}[{}:{}]", obj, args[0], args[1])),
                n => Err(Error::type_error(format!(
                    "substring() takes 1 or 2 arguments ({} given)",
                    n
                ))),
            },
            "toUpperCase" => Ok(format!("{}.upper()", obj)),
            "toLowerCase" => Ok(format!("{}.lower()", obj)),
            "push" => Ok(format!("{}.append({})", obj, args.join(", "))),
            "pop" => Ok(format!("{}.pop()", obj)),
            "toFixed" => {
                if args.len() != 1 {
                    return Err(Error::type_error(format!(
                        "toFixed() takes exactly 1 argument ({} given)",
                        args.len()
                    )));
                }
                Ok(format!("format({}, \".\" + str({}) + \"f\")", obj, args[0]))
            }
            "toString" => Ok(format!("str({})", obj)),
            // anything else passes through under the same name
            _ => Ok(format!("{}.{}({})", obj, method, args.join(", "))),
        }
    }

    fn math_call(&mut self, method: &str, args: &[Expr]) -> Result<String, Error> {
        let args = self.args(args)?;
        match method {
            "floor" | "ceil" | "sqrt" | "pow" => {
                self.uses_math = true;
                Ok(format!("math.{}({})", method, args))
            }
            "round" | "abs" | "max" | "min" => Ok(format!("{}({})", method, args)),
            "random" => {
                self.uses_random = true;
                Ok("random.random()".to_string())
            }
            other => Ok(format!("Math.{}({})", other, args)),
        }
    }
}

fn render_literal(value: &Literal) -> String {
    match value {
        Literal::Number(n) => format_number(*n),
        Literal::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::Null => "None".to_string(),
    }
}

/// The conservative syntactic concatenation test: a string literal or a
/// nested `+` might produce a string, nothing else is considered.
fn might_be_string(expr: &Expr) -> bool {
    match expr {
        Expr::Literal {
            value: Literal::Str(_),
        } => true,
        Expr::Binary {
            op: BinaryOp::Add, ..
        } => true,
        _ => false,
    }
}

fn is_math_name(expr: &Expr) -> bool {
    matches!(expr, Expr::Identifier { name } if name == "Math")
}

/// Blank-line policy between consecutive top-level statements: one blank
/// after a function or class, and one before a function or class unless a
/// comment introduces it.
fn needs_blank_line(prev: &Stmt, current: &Stmt) -> bool {
    let prev = unwrap_commented(prev);
    let current = unwrap_commented(current);

    if matches!(prev, Stmt::FunctionDecl { .. } | Stmt::ClassDecl { .. }) {
        return true;
    }
    if matches!(current, Stmt::FunctionDecl { .. } | Stmt::ClassDecl { .. }) {
        return !matches!(prev, Stmt::Comment { .. } | Stmt::MultilineComment { .. });
    }
    false
}

fn unwrap_commented(stmt: &Stmt) -> &Stmt {
    match stmt {
        Stmt::Commented { stmt, .. } => stmt,
        other => other,
    }
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", INDENT, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
