use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::{Literal, Token};

/// Identity of a name‑referencing expression node.
///
/// The resolver's side‑table is keyed by this id rather than by structure, so
/// two textually identical `a` references are distinct entries.  Ids are
/// process‑unique, which keeps them valid across interactive‑session lines
/// whose syntax trees stay alive inside closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A variable reference: the name token plus the node identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Token,
    pub id: ExprId,
}

impl Variable {
    pub fn new(name: Token) -> Self {
        Self {
            name,
            id: ExprId::fresh(),
        }
    }
}

/// Constant leaf value written directly in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Str(String),
    True,
    False,
    Nil,
}

impl From<Literal> for LiteralValue {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Number(n) => LiteralValue::Number(n),
            Literal::Str(s) => LiteralValue::Str(s),
        }
    }
}

/// **Abstract‑Syntax‑Tree node** for every kind of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Infix arithmetic / comparison / equality: `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// number, string, `true`, `false` or `nil`
    Literal(LiteralValue),

    /// Prefix `!` or `-`.
    Unary { operator: Token, right: Box<Expr> },

    Variable(Variable),

    /// `name = value`
    Assign {
        name: Token,
        value: Box<Expr>,
        id: ExprId,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This { keyword: Token, id: ExprId },

    /// `super.method`
    Super {
        keyword: Token,
        method: Token,
        id: ExprId,
    },
}
