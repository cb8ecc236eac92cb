// ABOUTME: Typed AST: the Expr and Stmt variant families produced by the
// parser and walked by the evaluator

use crate::token::Token;
use std::rc::Rc;

/// Comparison operators, separated from raw token kinds because `not in`
/// spans two tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

impl CmpOp {
    /// The operator spelling used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
        }
    }
}

/// Literal constants as parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// One fragment of an f-string after parsing: verbatim text or an embedded
/// expression with optional format specifier.
#[derive(Debug, Clone)]
pub enum FStringPiece {
    Literal(String),
    Expr {
        expr: Box<Expr>,
        format_spec: Option<String>,
    },
}

/// One clause of a comprehension, in source order.
#[derive(Debug, Clone)]
pub enum CompClause {
    For { targets: Vec<Token>, iterable: Expr },
    If { condition: Expr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    List,
    Set,
    Dict,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        token: Token,
    },
    FString {
        pieces: Vec<FStringPiece>,
        token: Token,
    },
    Variable {
        name: Token,
    },
    ListLiteral {
        elements: Vec<Expr>,
        token: Token,
    },
    TupleLiteral {
        elements: Vec<Expr>,
        token: Token,
    },
    SetLiteral {
        elements: Vec<Expr>,
        token: Token,
    },
    DictLiteral {
        pairs: Vec<(Expr, Expr)>,
        token: Token,
    },
    IndexGet {
        object: Box<Expr>,
        index: Box<Expr>,
        token: Token,
    },
    IndexSet {
        object: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
        token: Token,
    },
    AttrGet {
        object: Box<Expr>,
        name: Token,
    },
    AttrSet {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },
    Slice {
        object: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
        token: Token,
    },
    Unary {
        op: Token,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    /// Chained comparison: `a < b < c` keeps one operand list so each is
    /// evaluated exactly once.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CmpOp, Token, Expr)>,
    },
    Logical {
        left: Box<Expr>,
        op: Token,
        right: Box<Expr>,
    },
    Assign {
        name: Token,
        value: Box<Expr>,
    },
    AugAssign {
        target: Box<Expr>,
        op: Token,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<(Token, Expr)>,
        token: Token,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
        token: Token,
    },
    Comprehension {
        kind: ComprehensionKind,
        element: Box<Expr>,
        /// Dict comprehensions carry the value expression; the element is
        /// the key.
        value: Option<Box<Expr>>,
        clauses: Vec<CompClause>,
        token: Token,
    },
    SuperCall {
        token: Token,
        method: Token,
    },
}

impl Expr {
    /// The reference token used for error positions.
    pub fn token(&self) -> &Token {
        match self {
            Expr::Literal { token, .. }
            | Expr::FString { token, .. }
            | Expr::ListLiteral { token, .. }
            | Expr::TupleLiteral { token, .. }
            | Expr::SetLiteral { token, .. }
            | Expr::DictLiteral { token, .. }
            | Expr::IndexGet { token, .. }
            | Expr::IndexSet { token, .. }
            | Expr::Slice { token, .. }
            | Expr::Call { token, .. }
            | Expr::Lambda { token, .. }
            | Expr::Comprehension { token, .. }
            | Expr::SuperCall { token, .. } => token,
            Expr::Variable { name } => name,
            Expr::AttrGet { name, .. } | Expr::AttrSet { name, .. } => name,
            Expr::Unary { op, .. } => op,
            Expr::Binary { op, .. } => op,
            Expr::Logical { op, .. } => op,
            Expr::Compare { first, .. } => first.token(),
            Expr::Assign { name, .. } => name,
            Expr::AugAssign { op, .. } => op,
        }
    }
}

/// Parameter positions in a declaration: plain (optionally defaulted),
/// `*args`, or `**kwargs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Plain,
    VarArgs,
    KwArgs,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Token,
    pub kind: ParamKind,
    pub default: Option<Expr>,
}

/// A function or method declaration, shared between the AST and the
/// function values created from it.
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// One `except` arm of a try statement.
#[derive(Debug, Clone)]
pub struct ExceptHandler {
    pub token: Token,
    /// `None` for an unqualified `except:` that catches everything.
    pub class: Option<Expr>,
    pub binding: Option<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        token: Token,
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        token: Token,
        targets: Vec<Token>,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    FunctionDef {
        decl: Rc<FunctionDecl>,
    },
    ClassDef {
        name: Token,
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
    Return {
        token: Token,
        value: Option<Expr>,
    },
    Pass,
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
    Global {
        names: Vec<Token>,
    },
    Nonlocal {
        names: Vec<Token>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        else_branch: Option<Vec<Stmt>>,
        finally: Option<Vec<Stmt>>,
    },
    Raise {
        token: Token,
        exception: Expr,
    },
}
