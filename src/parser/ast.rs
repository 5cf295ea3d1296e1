// AST (Abstract Syntax Tree) definitions for the Python subset

use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Source location information for error reporting and line events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    /// Operator spelling, used in `TypeError` messages
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,    // -x
    Pos,    // +x
    Invert, // ~x
    Not,    // not x
}

/// Short-circuit boolean operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators (chainable)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}

/// A piece of an f-string
#[derive(Debug, Clone)]
pub enum FStringPart {
    Literal(String),
    Field {
        expr: Expr,
        /// `!r` or `!s`
        conversion: Option<char>,
        spec: Option<String>,
    },
}

/// One `for ... in ... if ...` clause of a comprehension
#[derive(Debug, Clone)]
pub struct CompClause {
    pub target: Target,
    pub iter: Expr,
    pub conditions: Vec<Expr>,
}

/// Expressions
#[derive(Debug, Clone)]
pub enum Expr {
    None(SourceLocation),
    Bool(bool, SourceLocation),
    Int(i64, SourceLocation),
    BigInt(Rc<num_bigint::BigInt>, SourceLocation),
    Float(f64, SourceLocation),
    Str(String, SourceLocation),
    FString {
        parts: Vec<FStringPart>,
        location: SourceLocation,
    },
    Name(String, SourceLocation),
    List(Vec<Expr>, SourceLocation),
    Tuple(Vec<Expr>, SourceLocation),
    Dict(Vec<(Expr, Expr)>, SourceLocation),
    ListComp {
        element: Box<Expr>,
        clauses: Vec<CompClause>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    BoolOp {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
        location: SourceLocation,
    },
    IfExp {
        condition: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(String, Expr)>,
        location: SourceLocation,
    },
    Attribute {
        object: Box<Expr>,
        name: String,
        location: SourceLocation,
    },
    Subscript {
        object: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
    /// Only valid as the index of a subscript
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        location: SourceLocation,
    },
}

impl Expr {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::None(loc)
            | Expr::Bool(_, loc)
            | Expr::Int(_, loc)
            | Expr::BigInt(_, loc)
            | Expr::Float(_, loc)
            | Expr::Str(_, loc)
            | Expr::Name(_, loc)
            | Expr::List(_, loc)
            | Expr::Tuple(_, loc)
            | Expr::Dict(_, loc) => *loc,
            Expr::FString { location, .. }
            | Expr::ListComp { location, .. }
            | Expr::BinaryOp { location, .. }
            | Expr::UnaryOp { location, .. }
            | Expr::BoolOp { location, .. }
            | Expr::Compare { location, .. }
            | Expr::IfExp { location, .. }
            | Expr::Call { location, .. }
            | Expr::Attribute { location, .. }
            | Expr::Subscript { location, .. }
            | Expr::Slice { location, .. } => *location,
        }
    }
}

/// Assignment targets
#[derive(Debug, Clone)]
pub enum Target {
    Name(String, SourceLocation),
    Subscript {
        object: Expr,
        index: Expr,
        location: SourceLocation,
    },
    Tuple(Vec<Target>, SourceLocation),
}

/// Function parameter with optional default value
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// A `def` statement.
///
/// `locals` is filled by scope analysis after the body is parsed: every name
/// bound anywhere in the body (minus `global` declarations) is local to the
/// function.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub locals: FxHashSet<String>,
    pub globals: FxHashSet<String>,
    pub filename: Rc<str>,
    pub location: SourceLocation,
}

/// One `except` clause
#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub class: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// `name` or `name as alias` in an import
#[derive(Debug, Clone)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportName {
    /// The name bound in the importing namespace
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Statements
#[derive(Debug, Clone)]
pub enum Stmt {
    Expr {
        expr: Expr,
        location: SourceLocation,
    },
    Assign {
        targets: Vec<Target>,
        value: Expr,
        location: SourceLocation,
    },
    AugAssign {
        target: Target,
        op: BinOp,
        value: Expr,
        location: SourceLocation,
    },
    Pass {
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    /// `elif` is an `If` nested as the sole statement of `orelse`
    If {
        condition: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    For {
        target: Target,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        location: SourceLocation,
    },
    FunctionDef(Rc<FunctionDef>),
    Global {
        names: Vec<String>,
        location: SourceLocation,
    },
    Del {
        targets: Vec<Target>,
        location: SourceLocation,
    },
    Assert {
        test: Expr,
        message: Option<Expr>,
        location: SourceLocation,
    },
    Raise {
        exception: Option<Expr>,
        location: SourceLocation,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finally: Vec<Stmt>,
        location: SourceLocation,
    },
    Import {
        modules: Vec<ImportName>,
        location: SourceLocation,
    },
    ImportFrom {
        module: String,
        names: Vec<ImportName>,
        location: SourceLocation,
    },
}

impl Stmt {
    /// Get the source location of this statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::FunctionDef(def) => def.location,
            Stmt::Expr { location, .. }
            | Stmt::Assign { location, .. }
            | Stmt::AugAssign { location, .. }
            | Stmt::Pass { location }
            | Stmt::Break { location }
            | Stmt::Continue { location }
            | Stmt::Return { location, .. }
            | Stmt::If { location, .. }
            | Stmt::While { location, .. }
            | Stmt::For { location, .. }
            | Stmt::Global { location, .. }
            | Stmt::Del { location, .. }
            | Stmt::Assert { location, .. }
            | Stmt::Raise { location, .. }
            | Stmt::Try { location, .. }
            | Stmt::Import { location, .. }
            | Stmt::ImportFrom { location, .. } => *location,
        }
    }
}

/// A compiled program unit, tagged with the (possibly synthetic) filename it
/// was compiled under.
#[derive(Debug, Clone)]
pub struct Program {
    pub filename: Rc<str>,
    pub body: Vec<Stmt>,
}
