//! AST node set. Nodes are plain data, built bottom-up by the parser and
//! never mutated afterwards; children are exclusively owned by their parent.

#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterKind {
    In,
    Of,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        kind: DeclKind,
        name: String,
        init: Expr,
    },
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    ConsoleLog {
        args: Vec<Expr>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        /// Either a block or, for `else if`, a nested if-statement.
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    ForEach {
        var: String,
        kind: IterKind,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    FunctionDecl {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    Return {
        value: Option<Expr>,
    },
    ClassDecl {
        name: String,
        constructor: Option<ConstructorDecl>,
        methods: Vec<MethodDecl>,
    },
    /// A call, method call, or update expression in statement position.
    Expr {
        expr: Expr,
    },
    Comment {
        text: String,
    },
    MultilineComment {
        text: String,
    },
    /// A statement with a trailing comment on the same source line.
    Commented {
        stmt: Box<Stmt>,
        comment: String,
    },
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Literal,
    },
    Identifier {
        name: String,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Array {
        elements: Vec<Expr>,
    },
    Object {
        pairs: Vec<(String, Expr)>,
    },
    /// Computed member access: `obj[index]`.
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    PropertyAccess {
        object: Box<Expr>,
        property: String,
    },
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    Lambda {
        params: Vec<String>,
        body: LambdaBody,
    },
    New {
        class_name: String,
        args: Vec<Expr>,
    },
    This,
}

impl Expr {
    /// Human-readable variant name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal { .. } => "literal",
            Expr::Identifier { .. } => "identifier",
            Expr::Binary { .. } => "binary operation",
            Expr::Unary { .. } => "unary operation",
            Expr::Update { .. } => "update expression",
            Expr::Call { .. } => "function call",
            Expr::Array { .. } => "array literal",
            Expr::Object { .. } => "object literal",
            Expr::Index { .. } => "member access",
            Expr::PropertyAccess { .. } => "property access",
            Expr::MethodCall { .. } => "method call",
            Expr::Lambda { .. } => "lambda",
            Expr::New { .. } => "new expression",
            Expr::This => "this expression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::StrictEq => "===",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}
