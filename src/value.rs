use crate::ast::{ConstructorDecl, Expr, MethodDecl, Stmt};
use crate::interpreter::Environment;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Dynamically-typed runtime value. Lists, mappings and instances are
/// reference-shared: copying an environment copies bindings, not payloads.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Rc<Closure>),
    Lambda(Rc<LambdaClosure>),
    Class(Rc<ClassDef>),
    Instance(Rc<RefCell<InstanceData>>),
}

/// A function closure: parameters, statement body, and a snapshot of the
/// environment taken when the declaration was executed.
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub env: Environment,
}

/// An expression-bodied arrow function.
#[derive(Debug)]
pub struct LambdaClosure {
    pub params: Vec<String>,
    pub expr: Expr,
    pub env: Environment,
}

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub constructor: Option<ConstructorDecl>,
    pub methods: IndexMap<String, MethodDecl>,
}

#[derive(Debug)]
pub struct InstanceData {
    pub class_name: String,
    pub properties: IndexMap<String, Value>,
}

impl Value {
    pub fn new_list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn new_map(pairs: IndexMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(pairs)))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "array",
            Value::Map(_) => "object",
            Value::Function(_) => "function",
            Value::Lambda(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Value equality. `==` and `===` are both mapped here; closures,
    /// classes and instances compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::List(l), Value::List(r)) => {
                let (l, r) = (l.borrow(), r.borrow());
                l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| a.equals(b))
            }
            (Value::Map(l), Value::Map(r)) => {
                let (l, r) = (l.borrow(), r.borrow());
                l.len() == r.len()
                    && l.iter()
                        .all(|(k, v)| r.get(k).map_or(false, |w| v.equals(w)))
            }
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            (Value::Lambda(l), Value::Lambda(r)) => Rc::ptr_eq(l, r),
            (Value::Class(l), Value::Class(r)) => Rc::ptr_eq(l, r),
            (Value::Instance(l), Value::Instance(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

/// Integral numbers print without a decimal point; infinities and NaN are
/// spelled out the way the source language prints them.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, item) in l.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (key, value)) in m.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(_) => write!(f, "[function]"),
            Value::Lambda(_) => write!(f, "[function]"),
            Value::Class(c) => write!(f, "[class {}]", c.name),
            Value::Instance(i) => write!(f, "[object {}]", i.borrow().class_name),
        }
    }
}
