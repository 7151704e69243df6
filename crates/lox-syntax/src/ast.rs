use lox_common::types::{Span, Spanned};

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

pub type ExprS = Spanned<Expr>;
pub type StmtS = Spanned<Stmt>;

#[derive(Debug, Default)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

#[remain::sorted]
#[derive(Debug, PartialEq)]
pub enum Stmt {
    Block(StmtBlock),
    Expr(StmtExpr),
    Func(Rc<StmtFunc>),
    If(Box<StmtIf>),
    Print(StmtPrint),
    Return(StmtReturn),
    Var(StmtVar),
    While(Box<StmtWhile>),
}

#[derive(Debug, PartialEq)]
pub struct StmtBlock {
    pub stmts: Vec<StmtS>,
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

/// Shared with every function object created from it, so a closure never
/// copies its body.
#[derive(Debug, PartialEq)]
pub struct StmtFunc {
    pub name: String,
    pub params: Vec<String>,
    pub body: StmtBlock,
}

#[derive(Debug, PartialEq)]
pub struct StmtIf {
    pub cond: ExprS,
    pub then: StmtS,
    pub else_: Option<StmtS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtPrint {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtReturn {
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtVar {
    pub name: String,
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtWhile {
    pub cond: ExprS,
    pub body: StmtS,
}

#[remain::sorted]
#[derive(Debug, PartialEq)]
pub enum Expr {
    Assign(Box<ExprAssign>),
    Call(Box<ExprCall>),
    Grouping(Box<ExprGrouping>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Logical(Box<ExprLogical>),
    Prefix(Box<ExprPrefix>),
    Variable(ExprVariable),
}

#[derive(Debug, PartialEq)]
pub struct ExprAssign {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprCall {
    pub callee: ExprS,
    /// The closing parenthesis; runtime errors raised by the call point here.
    pub paren: Span,
    pub args: Vec<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct ExprGrouping {
    pub inner: ExprS,
}

#[derive(Debug, PartialEq)]
pub enum ExprLiteral {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// Short-circuiting `and`/`or`. Kept apart from [`ExprInfix`] because the
/// right operand is evaluated conditionally.
#[derive(Debug, PartialEq)]
pub struct ExprLogical {
    pub lt: ExprS,
    pub op: OpLogical,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpLogical {
    And,
    Or,
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Negate,
    Not,
}

#[derive(Debug, Eq, PartialEq)]
pub struct ExprVariable {
    pub name: String,
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpInfix::Equal => "==",
            OpInfix::NotEqual => "!=",
            OpInfix::Greater => ">",
            OpInfix::GreaterEqual => ">=",
            OpInfix::Less => "<",
            OpInfix::LessEqual => "<=",
            OpInfix::Add => "+",
            OpInfix::Subtract => "-",
            OpInfix::Multiply => "*",
            OpInfix::Divide => "/",
        };
        write!(f, "{op}")
    }
}

impl Display for OpLogical {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OpLogical::And => write!(f, "and"),
            OpLogical::Or => write!(f, "or"),
        }
    }
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OpPrefix::Negate => write!(f, "-"),
            OpPrefix::Not => write!(f, "!"),
        }
    }
}
