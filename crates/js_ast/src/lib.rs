//! AST definitions and the front-end (lexer + recursive descent parser) for
//! the JavaScript subset the inference engine understands.
//!
//! Nodes live in arenas and reference each other by id; spans are kept in
//! side tables so the nodes themselves stay small and comparable.

use std::ops::Index;

use la_arena::{Arena, ArenaMap, Idx};
use smol_str::SmolStr;
use thiserror::Error;

mod lexer;
mod parser;

pub use parser::parse;

pub type ExprId = Idx<Expr>;
pub type StmtId = Idx<Stmt>;

/// Byte range into the original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(SmolStr),
    Bool(bool),
    Ident(SmolStr),
    Function {
        name: Option<SmolStr>,
        params: Vec<Param>,
        body: FnBody,
    },
    Call {
        callee: ExprId,
        args: Vec<ExprId>,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Conditional {
        test: ExprId,
        consequent: ExprId,
        alternate: ExprId,
    },
    Object {
        properties: Vec<ObjectProperty>,
    },
    Array {
        elements: Vec<ExprId>,
    },
    Member {
        object: ExprId,
        property: MemberKey,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(ExprId),
    Return(Option<ExprId>),
    Declaration(Vec<Declarator>),
    FunctionDecl { name: SmolStr, function: ExprId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: SmolStr,
    pub init: ExprId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Ident(SmolStr),
    /// Object destructuring: `({ result, nextState: state }) => ...`
    Object(Vec<PatternProp>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternProp {
    pub key: SmolStr,
    pub binding: SmolStr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FnBody {
    Expr(ExprId),
    Block(Vec<StmtId>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    Static { key: SmolStr, value: ExprId },
    Computed { key: ExprId, value: ExprId },
    Spread(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKey {
    /// `obj.name`
    Static(SmolStr),
    /// `obj[expr]`
    Computed(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Render a numeric literal the way JavaScript coerces it to a property key:
/// integral values lose the fraction dot.
pub fn number_key(value: f64) -> SmolStr {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        SmolStr::from(format!("{}", value as i64))
    } else {
        SmolStr::from(format!("{value}"))
    }
}

/// A parsed program: arenas of nodes, span side tables, and the top-level
/// statement list.
#[derive(Debug, Default, PartialEq)]
pub struct Module {
    exprs: Arena<Expr>,
    stmts: Arena<Stmt>,
    expr_spans: ArenaMap<ExprId, Span>,
    stmt_spans: ArenaMap<StmtId, Span>,
    pub body: Vec<StmtId>,
    pub span: Span,
}

impl Module {
    pub fn alloc_expr(&mut self, expr: Expr, span: Span) -> ExprId {
        let id = self.exprs.alloc(expr);
        self.expr_spans.insert(id, span);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt, span: Span) -> StmtId {
        let id = self.stmts.alloc(stmt);
        self.stmt_spans.insert(id, span);
        id
    }

    pub fn expr_span(&self, id: ExprId) -> Span {
        self.expr_spans[id]
    }
}

impl Index<ExprId> for Module {
    type Output = Expr;

    fn index(&self, id: ExprId) -> &Expr {
        &self.exprs[id]
    }
}

impl Index<StmtId> for Module {
    type Output = Stmt;

    fn index(&self, id: StmtId) -> &Stmt {
        &self.stmts[id]
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {found}, expected {expected}")]
    Unexpected {
        found: String,
        expected: &'static str,
        span: Span,
    },
    #[error("unexpected end of input, expected {expected}")]
    Eof { expected: &'static str, span: Span },
    #[error("unexpected character `{ch}`")]
    UnexpectedChar { ch: char, span: Span },
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("invalid number literal")]
    InvalidNumber { span: Span },
    #[error("unsupported syntax: {what}")]
    Unsupported { what: &'static str, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Unexpected { span, .. }
            | ParseError::Eof { span, .. }
            | ParseError::UnexpectedChar { span, .. }
            | ParseError::UnterminatedString { span }
            | ParseError::UnterminatedComment { span }
            | ParseError::InvalidNumber { span }
            | ParseError::Unsupported { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_drop_integral_fraction() {
        assert_eq!(number_key(4.0), "4");
        assert_eq!(number_key(0.0), "0");
        assert_eq!(number_key(1.5), "1.5");
    }

    #[test]
    fn spans_merge_to_the_hull() {
        let a = Span::new(3, 8);
        let b = Span::new(5, 12);
        assert_eq!(a.merge(b), Span::new(3, 12));
    }
}
