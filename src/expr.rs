//! Expression nodes of the Stellar AST.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::stmt::FunctionDecl;
use crate::token::Token;

/// Identity of a variable reference (`Variable` or `Assign`). The resolver
/// keys its depth map by this value, so it must be unique across every
/// compilation unit an interpreter ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),

    /// String literal without surrounding quotes.
    Str(Rc<str>),
}

/// How an assignment combines the new value with the old one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AssignOp {
    /// `target = value`
    Plain,

    /// `target op= value`; carries the arithmetic operator (`+` for `+=`).
    Compound(Token),

    /// `target++` / `target--`; carries `+` or `-`, the value operand is the
    /// literal `1` and the expression yields the pre‑mutation value.
    Postfix(Token),
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression
    /// *Example:* `!isReady`, `-42`, `~mask`
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`, `n // 2`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// `condition ? then_branch : else_branch`
    Conditional {
        condition: Box<Expr>,
        question: Token,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment to a variable, including compound and postfix forms.
    Assign {
        id: ExprId,
        name: Token,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value (and the compound / postfix forms)
    Set {
        object: Box<Expr>,
        name: Token,
        op: AssignOp,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { keyword: Token },

    /// `super.method`
    Super { keyword: Token, method: Token },

    /// Anonymous function: `func (a, b) { … }` or `(a, b) => { … }`.
    Function(Rc<FunctionDecl>),
}

impl Expr {
    /// Best source line for diagnostics about this expression.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,

            Expr::Grouping(expr) => expr.line(),

            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => operator.line,

            Expr::Conditional { question, .. } => question.line,

            Expr::Variable { name, .. }
            | Expr::Assign { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => name.line,

            Expr::Call { paren, .. } => paren.line,

            Expr::This { keyword, .. } | Expr::Super { keyword, .. } => keyword.line,

            Expr::Function(decl) => decl.line,
        }
    }
}
