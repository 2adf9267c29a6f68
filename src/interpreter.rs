use std::collections::HashMap;
use std::mem;
use std::rc::Rc;

use indexmap::IndexMap;
use rand::Rng;

use crate::ast::{
    AssignOp, BinaryOp, Expr, IterKind, LambdaBody, Literal, Program, Stmt, UnaryOp, UpdateOp,
};
use crate::error::Error;
use crate::value::{format_number, ClassDef, Closure, InstanceData, LambdaClosure, Value};

/// A flat name-to-value table. Scoping works by full-copy snapshots:
/// closures capture a clone at creation time, calls swap in a clone of the
/// captured table and restore the caller's afterwards. Later mutations to
/// outer variables are therefore not visible inside earlier closures.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn remove(&mut self, name: &str) {
        self.values.remove(name);
    }
}

/// Outcome of executing one statement. `Return` carries a value upward
/// until a call frame absorbs it.
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    env: Environment,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn run(&mut self, program: &Program) -> Result<(), Error> {
        for stmt in &program.statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                break;
            }
        }
        Ok(())
    }

    /// Final binding for `name`, for inspecting the environment after a run.
    pub fn env_get(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }

    /// Evaluates a single expression against the current environment.
    /// Used by the REPL to echo expression values.
    pub fn eval_expression(&mut self, expr: &Expr) -> Result<Value, Error> {
        self.eval(expr)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, Error> {
        match stmt {
            Stmt::VarDecl { name, init, .. } => {
                let value = self.eval(init)?;
                self.env.define(name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, op, value } => {
                let rhs = self.eval(value)?;
                let value = match op {
                    AssignOp::Set => rhs,
                    AssignOp::Add => {
                        let current = self.eval(target)?;
                        self.add_values(&current, &rhs)?
                    }
                    AssignOp::Sub => {
                        let current = self.eval(target)?;
                        self.numeric_op(&current, &rhs, "-", |l, r| l - r)?
                    }
                };
                self.assign(target, value)?;
                Ok(Flow::Normal)
            }
            Stmt::ConsoleLog { args } => {
                // no arguments still prints one empty line, like print()
                if args.is_empty() {
                    println!();
                }
                for arg in args {
                    let value = self.eval(arg)?;
                    println!("{}", value);
                }
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { condition, body } => {
                while self.eval(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                condition,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.execute(init)?;
                }
                loop {
                    if let Some(condition) = condition {
                        if !self.eval(condition)?.is_truthy() {
                            break;
                        }
                    }
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                    if let Some(update) = update {
                        self.execute(update)?;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForEach {
                var,
                kind,
                iterable,
                body,
            } => self.execute_for_each(var, *kind, iterable, body),
            Stmt::Block { statements } => {
                for stmt in statements {
                    if let Flow::Return(value) = self.execute(stmt)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::FunctionDecl { name, params, body } => {
                let closure = Closure {
                    params: params.clone(),
                    body: body.clone(),
                    env: self.env.clone(),
                };
                self.env.define(name, Value::Function(Rc::new(closure)));
                Ok(Flow::Normal)
            }
            Stmt::Return { value } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::ClassDecl {
                name,
                constructor,
                methods,
            } => {
                let mut table = IndexMap::new();
                for method in methods {
                    table.insert(method.name.clone(), method.clone());
                }
                let class = ClassDef {
                    name: name.clone(),
                    constructor: constructor.clone(),
                    methods: table,
                };
                self.env.define(name, Value::Class(Rc::new(class)));
                Ok(Flow::Normal)
            }
            Stmt::Expr { expr } => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Comment { .. } | Stmt::MultilineComment { .. } => Ok(Flow::Normal),
            Stmt::Commented { stmt, .. } => self.execute(stmt),
        }
    }

    fn execute_for_each(
        &mut self,
        var: &str,
        kind: IterKind,
        iterable: &Expr,
        body: &Stmt,
    ) -> Result<Flow, Error> {
        let items: Vec<Value> = match (kind, self.eval(iterable)?) {
            (IterKind::Of, Value::List(list)) => list.borrow().clone(),
            (IterKind::In, Value::Map(map)) => {
                map.borrow().keys().cloned().map(Value::Str).collect()
            }
            // kind/value mismatch iterates nothing
            (_, Value::List(_)) | (_, Value::Map(_)) => Vec::new(),
            (_, other) => {
                return Err(Error::type_error(format!(
                    "For...{} requires an iterable, got {}",
                    if kind == IterKind::Of { "of" } else { "in" },
                    other.type_name()
                )))
            }
        };

        // a shadowed outer binding of the loop variable is restored after
        let shadowed = self.env.get(var);

        let mut outcome = Ok(Flow::Normal);
        for item in items {
            self.env.define(var, item);
            match self.execute(body) {
                Ok(Flow::Normal) => {}
                other => {
                    outcome = other;
                    break;
                }
            }
        }

        match shadowed {
            Some(value) => self.env.define(var, value),
            None => self.env.remove(var),
        }

        outcome
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<(), Error> {
        match target {
            Expr::Identifier { name } => {
                self.env.define(name, value);
                Ok(())
            }
            Expr::PropertyAccess { object, property } => {
                let object = self.eval(object)?;
                match object {
                    Value::Instance(instance) => {
                        instance
                            .borrow_mut()
                            .properties
                            .insert(property.clone(), value);
                        Ok(())
                    }
                    Value::Map(map) => {
                        map.borrow_mut().insert(property.clone(), value);
                        Ok(())
                    }
                    other => Err(Error::type_error(format!(
                        "Cannot assign property '{}' on {}",
                        property,
                        other.type_name()
                    ))),
                }
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                match (object, index) {
                    (Value::List(list), Value::Number(n)) => {
                        let mut list = list.borrow_mut();
                        let len = list.len();
                        match integral_index(n, len) {
                            Some(i) => {
                                list[i] = value;
                                Ok(())
                            }
                            None => Err(Error::type_error(format!(
                                "Array index {} out of range (length {})",
                                format_number(n),
                                len
                            ))),
                        }
                    }
                    (Value::Map(map), Value::Str(key)) => {
                        map.borrow_mut().insert(key, value);
                        Ok(())
                    }
                    (Value::Instance(instance), Value::Str(key)) => {
                        instance.borrow_mut().properties.insert(key, value);
                        Ok(())
                    }
                    (object, index) => Err(Error::type_error(format!(
                        "Cannot assign to {} index of {}",
                        index.type_name(),
                        object.type_name()
                    ))),
                }
            }
            other => Err(Error::type_error(format!(
                "Invalid assignment target: {}",
                other.kind_name()
            ))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, Error> {
        match expr {
            Expr::Literal { value } => Ok(match value {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Identifier { name } => self.env.get(name).ok_or_else(|| {
                Error::name(format!("Variable '{}' is not defined", name))
            }),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                    UnaryOp::Negate => match operand {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        other => Err(Error::type_error(format!(
                            "Unary '-' requires a number, got {}",
                            other.type_name()
                        ))),
                    },
                    UnaryOp::Plus => match operand {
                        Value::Number(n) => Ok(Value::Number(n)),
                        other => Err(Error::type_error(format!(
                            "Unary '+' requires a number, got {}",
                            other.type_name()
                        ))),
                    },
                }
            }
            Expr::Update { op, prefix, target } => self.eval_update(*op, *prefix, target),
            Expr::Call { name, args } => {
                let callee = self.env.get(name).ok_or_else(|| {
                    Error::name(format!("Function '{}' is not defined", name))
                })?;
                let args = self.eval_args(args)?;
                match callee {
                    Value::Function(closure) => self.call_function(name, &closure, args),
                    Value::Lambda(lambda) => self.call_lambda(&lambda, args),
                    other => Err(Error::type_error(format!(
                        "'{}' is not a function (it is a {})",
                        name,
                        other.type_name()
                    ))),
                }
            }
            Expr::Array { elements } => {
                let values = self.eval_args(elements)?;
                Ok(Value::new_list(values))
            }
            Expr::Object { pairs } => {
                let mut map = IndexMap::new();
                for (key, value) in pairs {
                    map.insert(key.clone(), self.eval(value)?);
                }
                Ok(Value::new_map(map))
            }
            Expr::Index { object, index } => {
                let object = self.eval(object)?;
                let index = self.eval(index)?;
                self.eval_index(object, index)
            }
            Expr::PropertyAccess { object, property } => {
                if self.is_math_namespace(object) {
                    return math_property(property);
                }
                let object = self.eval(object)?;
                self.eval_property(object, property)
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                if self.is_math_namespace(object) {
                    let args = self.eval_args(args)?;
                    return math_method(method, &args);
                }
                let receiver = self.eval(object)?;
                let args = self.eval_args(args)?;
                self.eval_method(receiver, method, args)
            }
            Expr::Lambda { params, body } => match body {
                LambdaBody::Expr(expr) => Ok(Value::Lambda(Rc::new(LambdaClosure {
                    params: params.clone(),
                    expr: (**expr).clone(),
                    env: self.env.clone(),
                }))),
                LambdaBody::Block(statements) => Ok(Value::Function(Rc::new(Closure {
                    params: params.clone(),
                    body: statements.clone(),
                    env: self.env.clone(),
                }))),
            },
            Expr::New { class_name, args } => self.eval_new(class_name, args),
            Expr::This => self.env.get("this").ok_or_else(|| {
                Error::name("'this' is only valid inside methods and constructors".to_string())
            }),
        }
    }

    /// `Math.x` resolves to the built-in namespace unless the user has
    /// bound the name themselves.
    fn is_math_namespace(&self, object: &Expr) -> bool {
        matches!(object, Expr::Identifier { name } if name == "Math" && !self.env.contains("Math"))
    }

    fn eval_binary(&mut self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<Value, Error> {
        // && and || short-circuit and yield an operand, not a boolean
        if op == BinaryOp::And {
            let left = self.eval(left)?;
            return if left.is_truthy() {
                self.eval(right)
            } else {
                Ok(left)
            };
        }
        if op == BinaryOp::Or {
            let left = self.eval(left)?;
            return if left.is_truthy() {
                Ok(left)
            } else {
                self.eval(right)
            };
        }

        let left = self.eval(left)?;
        let right = self.eval(right)?;

        match op {
            BinaryOp::Add => self.add_values(&left, &right),
            BinaryOp::Sub => self.numeric_op(&left, &right, "-", |l, r| l - r),
            BinaryOp::Mul => self.numeric_op(&left, &right, "*", |l, r| l * r),
            BinaryOp::Mod => self.numeric_op(&left, &right, "%", |l, r| l % r),
            BinaryOp::Div => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => {
                    if *r == 0.0 {
                        // divide-by-zero follows floating-point semantics
                        Ok(Value::Number(if *l > 0.0 {
                            f64::INFINITY
                        } else if *l < 0.0 {
                            f64::NEG_INFINITY
                        } else {
                            f64::NAN
                        }))
                    } else {
                        Ok(Value::Number(l / r))
                    }
                }
                _ => Err(Error::type_error(format!(
                    "Operator '/' requires numbers, got {} and {}",
                    left.type_name(),
                    right.type_name()
                ))),
            },
            BinaryOp::Eq | BinaryOp::StrictEq => Ok(Value::Bool(left.equals(&right))),
            BinaryOp::NotEq | BinaryOp::StrictNotEq => Ok(Value::Bool(!left.equals(&right))),
            BinaryOp::Greater => self.compare(&left, &right, ">", |o| o.is_gt()),
            BinaryOp::GreaterEq => self.compare(&left, &right, ">=", |o| o.is_ge()),
            BinaryOp::Less => self.compare(&left, &right, "<", |o| o.is_lt()),
            BinaryOp::LessEq => self.compare(&left, &right, "<=", |o| o.is_le()),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    /// `+` concatenates when either side is a string, otherwise adds.
    fn add_values(&self, left: &Value, right: &Value) -> Result<Value, Error> {
        match (left, right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Ok(Value::Str(format!("{}{}", left, right)))
            }
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            _ => Err(Error::type_error(format!(
                "Cannot add {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    fn numeric_op(
        &self,
        left: &Value,
        right: &Value,
        op: &str,
        apply: fn(f64, f64) -> f64,
    ) -> Result<Value, Error> {
        match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(apply(*l, *r))),
            _ => Err(Error::type_error(format!(
                "Operator '{}' requires numbers, got {} and {}",
                op,
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    fn compare(
        &self,
        left: &Value,
        right: &Value,
        op: &str,
        accept: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Value, Error> {
        let ordering = match (left, right) {
            (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
            (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
            _ => {
                return Err(Error::type_error(format!(
                    "Cannot compare {} and {} with '{}'",
                    left.type_name(),
                    right.type_name(),
                    op
                )))
            }
        };
        // NaN comparisons are false
        Ok(Value::Bool(ordering.map_or(false, accept)))
    }

    fn eval_update(
        &mut self,
        op: UpdateOp,
        prefix: bool,
        target: &Expr,
    ) -> Result<Value, Error> {
        let delta = match op {
            UpdateOp::Increment => 1.0,
            UpdateOp::Decrement => -1.0,
        };

        match target {
            Expr::Identifier { name } => {
                let current = self.env.get(name).ok_or_else(|| {
                    Error::name(format!("Variable '{}' is not defined", name))
                })?;
                let old = match current {
                    Value::Number(n) => n,
                    other => {
                        return Err(Error::type_error(format!(
                            "'{}' requires a number, got {}",
                            if op == UpdateOp::Increment { "++" } else { "--" },
                            other.type_name()
                        )))
                    }
                };
                let new = old + delta;
                self.env.define(name, Value::Number(new));
                Ok(Value::Number(if prefix { new } else { old }))
            }
            // arr.length++ appends a null, arr.length-- drops the last element
            Expr::PropertyAccess { object, property } if property == "length" => {
                let object = self.eval(object)?;
                match object {
                    Value::List(list) => {
                        let mut list = list.borrow_mut();
                        let old = list.len() as f64;
                        match op {
                            UpdateOp::Increment => list.push(Value::Null),
                            UpdateOp::Decrement => {
                                list.pop();
                            }
                        }
                        let new = list.len() as f64;
                        Ok(Value::Number(if prefix { new } else { old }))
                    }
                    other => Err(Error::type_error(format!(
                        "Cannot update length of {}",
                        other.type_name()
                    ))),
                }
            }
            Expr::PropertyAccess { object, property } => {
                let object = self.eval(object)?;
                match object {
                    Value::Instance(instance) => {
                        let old = match instance.borrow().properties.get(property) {
                            Some(Value::Number(n)) => *n,
                            _ => {
                                return Err(Error::type_error(format!(
                                    "Property '{}' is not a number",
                                    property
                                )))
                            }
                        };
                        let new = old + delta;
                        instance
                            .borrow_mut()
                            .properties
                            .insert(property.clone(), Value::Number(new));
                        Ok(Value::Number(if prefix { new } else { old }))
                    }
                    other => Err(Error::type_error(format!(
                        "Cannot update property '{}' of {}",
                        property,
                        other.type_name()
                    ))),
                }
            }
            other => Err(Error::type_error(format!(
                "Invalid update target: {}",
                other.kind_name()
            ))),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, Error> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn call_function(
        &mut self,
        name: &str,
        closure: &Rc<Closure>,
        args: Vec<Value>,
    ) -> Result<Value, Error> {
        let saved = mem::replace(&mut self.env, closure.env.clone());
        // the callee stays visible under its own name for recursive calls
        self.env.define(name, Value::Function(closure.clone()));
        bind_params(&mut self.env, &closure.params, args);

        let result = self.run_body(&closure.body);
        self.env = saved;
        result
    }

    fn call_lambda(&mut self, lambda: &Rc<LambdaClosure>, args: Vec<Value>) -> Result<Value, Error> {
        let saved = mem::replace(&mut self.env, lambda.env.clone());
        bind_params(&mut self.env, &lambda.params, args);

        let result = self.eval(&lambda.expr);
        self.env = saved;
        result
    }

    /// Executes a callee body, absorbing a `return` into the call result.
    /// The caller is responsible for swapping environments around this.
    fn run_body(&mut self, body: &[Stmt]) -> Result<Value, Error> {
        for stmt in body {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}
                Ok(Flow::Return(value)) => return Ok(value),
                Err(err) => return Err(err),
            }
        }
        Ok(Value::Null)
    }

    fn eval_new(&mut self, class_name: &str, args: &[Expr]) -> Result<Value, Error> {
        let class = match self.env.get(class_name) {
            Some(Value::Class(class)) => class,
            Some(other) => {
                return Err(Error::type_error(format!(
                    "'{}' is not a class (it is a {})",
                    class_name,
                    other.type_name()
                )))
            }
            None => {
                return Err(Error::name(format!(
                    "Class '{}' is not defined",
                    class_name
                )))
            }
        };

        let instance = Rc::new(std::cell::RefCell::new(InstanceData {
            class_name: class_name.to_string(),
            properties: IndexMap::new(),
        }));

        if let Some(constructor) = &class.constructor {
            let args = self.eval_args(args)?;
            let saved = self.env.clone();
            self.env.define("this", Value::Instance(instance.clone()));
            bind_params(&mut self.env, &constructor.params, args);

            // the constructor runs for side effects; its return is discarded
            let result = self.run_body(&constructor.body);
            self.env = saved;
            result?;
        }

        Ok(Value::Instance(instance))
    }

    fn eval_index(&self, object: Value, index: Value) -> Result<Value, Error> {
        match (&object, &index) {
            (Value::List(list), Value::Number(n)) => {
                let list = list.borrow();
                Ok(integral_index(*n, list.len())
                    .map(|i| list[i].clone())
                    .unwrap_or(Value::Null))
            }
            (Value::Map(map), Value::Str(key)) => {
                Ok(map.borrow().get(key).cloned().unwrap_or(Value::Null))
            }
            (Value::Map(_), _) => Ok(Value::Null),
            (Value::Instance(instance), Value::Str(key)) => Ok(instance
                .borrow()
                .properties
                .get(key)
                .cloned()
                .unwrap_or(Value::Null)),
            _ => Err(Error::type_error(format!(
                "Cannot index {} with {}",
                object.type_name(),
                index.type_name()
            ))),
        }
    }

    fn eval_property(&self, object: Value, property: &str) -> Result<Value, Error> {
        match &object {
            Value::Str(s) if property == "length" => {
                Ok(Value::Number(s.chars().count() as f64))
            }
            Value::List(list) if property == "length" => {
                Ok(Value::Number(list.borrow().len() as f64))
            }
            Value::Map(map) => Ok(map.borrow().get(property).cloned().unwrap_or(Value::Null)),
            Value::Instance(instance) => Ok(instance
                .borrow()
                .properties
                .get(property)
                .cloned()
                .unwrap_or(Value::Null)),
            _ => Err(Error::type_error(format!(
                "Cannot access property '{}' of {}",
                property,
                object.type_name()
            ))),
        }
    }

    fn eval_method(
        &mut self,
        receiver: Value,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, Error> {
        match receiver {
            Value::Str(s) => string_method(&s, method, &args),
            Value::List(list) => {
                let mut list = list.borrow_mut();
                match method {
                    "push" => {
                        list.extend(args);
                        Ok(Value::Number(list.len() as f64))
                    }
                    "pop" => Ok(list.pop().unwrap_or(Value::Null)),
                    _ => Err(Error::attribute(format!(
                        "Array has no method '{}'",
                        method
                    ))),
                }
            }
            Value::Number(n) => number_method(n, method, &args),
            Value::Instance(instance) => {
                let class_name = instance.borrow().class_name.clone();
                let class = match self.env.get(&class_name) {
                    Some(Value::Class(class)) => class,
                    Some(_) => {
                        return Err(Error::type_error(format!(
                            "'{}' is no longer a class",
                            class_name
                        )))
                    }
                    None => {
                        return Err(Error::name(format!(
                            "Class '{}' not found",
                            class_name
                        )))
                    }
                };
                let decl = class.methods.get(method).cloned().ok_or_else(|| {
                    Error::attribute(format!(
                        "Method '{}' not found on class '{}'",
                        method, class_name
                    ))
                })?;

                let saved = self.env.clone();
                self.env.define("this", Value::Instance(instance.clone()));
                bind_params(&mut self.env, &decl.params, args);

                let result = self.run_body(&decl.body);
                self.env = saved;
                result
            }
            Value::Map(_) => Err(Error::attribute(format!(
                "Object has no method '{}'",
                method
            ))),
            other => Err(Error::type_error(format!(
                "Cannot call method '{}' on {}",
                method,
                other.type_name()
            ))),
        }
    }
}

/// Binds parameters positionally: missing arguments become null, extra
/// arguments are ignored.
fn bind_params(env: &mut Environment, params: &[String], args: Vec<Value>) {
    let mut args = args.into_iter();
    for param in params {
        env.define(param, args.next().unwrap_or(Value::Null));
    }
}

/// A non-negative integral f64 within `0..len`, or None.
fn integral_index(n: f64, len: usize) -> Option<usize> {
    if n.fract() != 0.0 || n < 0.0 {
        return None;
    }
    let i = n as usize;
    if i < len {
        Some(i)
    } else {
        None
    }
}

fn expect_number(value: &Value, what: &str) -> Result<f64, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::type_error(format!(
            "{} requires a number, got {}",
            what,
            other.type_name()
        ))),
    }
}

fn math_property(property: &str) -> Result<Value, Error> {
    match property {
        "PI" => Ok(Value::Number(std::f64::consts::PI)),
        "E" => Ok(Value::Number(std::f64::consts::E)),
        _ => Err(Error::attribute(format!(
            "Math has no member '{}'",
            property
        ))),
    }
}

fn math_method(method: &str, args: &[Value]) -> Result<Value, Error> {
    let unary = |apply: fn(f64) -> f64| -> Result<Value, Error> {
        if args.len() != 1 {
            return Err(Error::type_error(format!(
                "Math.{}() takes exactly 1 argument ({} given)",
                method,
                args.len()
            )));
        }
        let n = expect_number(&args[0], &format!("Math.{}()", method))?;
        Ok(Value::Number(apply(n)))
    };

    match method {
        "floor" => unary(f64::floor),
        "ceil" => unary(f64::ceil),
        "round" => unary(f64::round),
        "abs" => unary(f64::abs),
        "sqrt" => unary(f64::sqrt),
        "pow" => {
            if args.len() != 2 {
                return Err(Error::type_error(format!(
                    "Math.pow() takes exactly 2 arguments ({} given)",
                    args.len()
                )));
            }
            let base = expect_number(&args[0], "Math.pow()")?;
            let exp = expect_number(&args[1], "Math.pow()")?;
            Ok(Value::Number(base.powf(exp)))
        }
        "max" | "min" => {
            if args.is_empty() {
                return Err(Error::type_error(format!(
                    "Math.{}() takes at least 1 argument",
                    method
                )));
            }
            let mut best = expect_number(&args[0], "Math.max()/Math.min()")?;
            for arg in &args[1..] {
                let n = expect_number(arg, "Math.max()/Math.min()")?;
                best = if method == "max" {
                    best.max(n)
                } else {
                    best.min(n)
                };
            }
            Ok(Value::Number(best))
        }
        "random" => {
            if !args.is_empty() {
                return Err(Error::type_error(
                    "Math.random() takes no arguments".to_string(),
                ));
            }
            Ok(Value::Number(rand::thread_rng().gen::<f64>()))
        }
        _ => Err(Error::attribute(format!(
            "Math has no method '{}'",
            method
        ))),
    }
}

fn string_method(s: &str, method: &str, args: &[Value]) -> Result<Value, Error> {
    let chars: Vec<char> = s.chars().collect();

    match method {
        "charAt" => {
            if args.len() != 1 {
                return Err(Error::type_error(format!(
                    "charAt() takes exactly 1 argument ({} given)",
                    args.len()
                )));
            }
            let i = expect_number(&args[0], "charAt()")?;
            // out-of-range yields the empty string
            Ok(Value::Str(
                integral_index(i, chars.len())
                    .map(|i| chars[i].to_string())
                    .unwrap_or_default(),
            ))
        }
        "substr" => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::type_error(format!(
                    "substr() takes 1 or 2 arguments ({} given)",
                    args.len()
                )));
            }
            let start = expect_number(&args[0], "substr()")?;
            let end = match args.get(1) {
                Some(len) => Some(start + expect_number(len, "substr()")?),
                None => None,
            };
            Ok(Value::Str(slice_chars(&chars, start, end)))
        }
        "substring" => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::type_error(format!(
                    "substring() takes 1 or 2 arguments ({} given)",
                    args.len()
                )));
            }
            let start = expect_number(&args[0], "substring()")?;
            let end = match args.get(1) {
                Some(end) => Some(expect_number(end, "substring()")?),
                None => None,
            };
            Ok(Value::Str(slice_chars(&chars, start, end)))
        }
        "toLowerCase" => Ok(Value::Str(s.to_lowercase())),
        "toUpperCase" => Ok(Value::Str(s.to_uppercase())),
        _ => Err(Error::attribute(format!(
            "String has no method '{}'",
            method
        ))),
    }
}

/// Slice with clamping: negative bounds count from the end, out-of-range
/// bounds clamp, an inverted range yields the empty string.
fn slice_chars(chars: &[char], start: f64, end: Option<f64>) -> String {
    let len = chars.len() as f64;
    let clamp = |bound: f64| -> usize {
        let bound = if bound < 0.0 { len + bound } else { bound };
        bound.clamp(0.0, len) as usize
    };
    let start = clamp(start);
    let end = end.map(clamp).unwrap_or(chars.len());
    if start >= end {
        String::new()
    } else {
        chars[start..end].iter().collect()
    }
}

fn number_method(n: f64, method: &str, args: &[Value]) -> Result<Value, Error> {
    match method {
        "toFixed" => {
            if args.len() != 1 {
                return Err(Error::type_error(format!(
                    "toFixed() takes exactly 1 argument ({} given)",
                    args.len()
                )));
            }
            let digits = expect_number(&args[0], "toFixed()")?;
            if digits.fract() != 0.0 || digits < 0.0 {
                return Err(Error::type_error(
                    "toFixed() requires a non-negative integer".to_string(),
                ));
            }
            Ok(Value::Str(format!("{:.*}", digits as usize, n)))
        }
        "toString" => {
            if !args.is_empty() {
                return Err(Error::type_error(
                    "toString() takes no arguments".to_string(),
                ));
            }
            Ok(Value::Str(format_number(n)))
        }
        _ => Err(Error::attribute(format!(
            "Number has no method '{}'",
            method
        ))),
    }
}
