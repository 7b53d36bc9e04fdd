//! Statement nodes of the Stellar AST.

use std::rc::Rc;

use serde::Serialize;

use crate::expr::Expr;
use crate::token::{Literal, Token, TokenType};

/// A function body shared between the AST and every runtime closure created
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// `None` for anonymous and arrow functions.
    pub name: Option<Token>,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,

    /// Line of the declaration, for diagnostics.
    pub line: usize,
}

impl FunctionDecl {
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|t| t.lexeme.as_str())
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|t| t.lexeme.as_str())
    }
}

/// **Abstract‑Syntax‑Tree node** for *statements*. A program is a sequence of
/// these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Constant declaration: `"const" IDENT "=" initializer ";"`.
    Const { name: Token, initializer: Expr },

    /// Grouped declarations `var { a = 1; b; }`. Introduces no scope.
    Group(Vec<Stmt>),

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    Break(Token),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Named function declaration.
    Function(Rc<FunctionDecl>),

    Class {
        name: Token,

        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,

        methods: Vec<Rc<FunctionDecl>>,
    },

    /// `del a, b;`
    Del { keyword: Token, names: Vec<Token> },

    /// `import name;` / `import (a, "dir/b")`
    Import { keyword: Token, modules: Vec<Token> },
}

/// Module path named by an import token: string literals contribute their
/// contents, identifiers their lexeme.
pub fn module_path(token: &Token) -> &str {
    match (&token.kind, &token.literal) {
        (TokenType::STRING, Some(Literal::Str(s))) => s,
        _ => &token.lexeme,
    }
}
