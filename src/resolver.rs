//! Static resolver pass.
//!
//! One walk over the AST that
//! 1. mirrors the scopes the interpreter will create (blocks and function
//!    frames; the top level is the global frame and is not tracked),
//! 2. reports static problems (duplicate locals, reads in their own
//!    initializer, misplaced `return` / `this` / `super`, unused locals),
//! 3. tells the interpreter, for every variable reference, how many frames
//!    out its binding lives. References found in no tracked scope are left
//!    to global lookup by name.
//!
//! `this` and `super` need no scope of their own: the interpreter finds them
//! through the receiver slot of the enclosing method frame.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::error::{Severity, StellarError};
use crate::expr::{AssignOp, Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::keywords::{Keyword, KeywordTable};
use crate::object::INITIALIZER;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body are we in?  Used to validate `this` / `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Declared,
    Defined,
    Read,
}

#[derive(Debug)]
struct Local {
    state: State,
    line: usize,
    is_param: bool,
    deleted: bool,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'i> {
    interpreter: &'i mut Interpreter,
    keywords: Rc<KeywordTable>,
    scopes: Vec<HashMap<String, Local>>,
    current_function: FunctionType,
    current_class: ClassType,
    diagnostics: Vec<StellarError>,
}

impl<'i> Resolver<'i> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter) -> Self {
        info!("Resolver instantiated");

        let keywords: Rc<KeywordTable> = interpreter.keywords();

        Resolver {
            interpreter,
            keywords,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            diagnostics: Vec::new(),
        }
    }

    /// Walk all top‑level statements and return every diagnostic found.
    /// Only [`Severity::Error`] diagnostics should block execution.
    pub fn resolve(mut self, statements: &[Stmt]) -> Vec<StellarError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        info!(
            "Resolve pass finished with {} diagnostic(s)",
            self.diagnostics.len()
        );

        self.diagnostics
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Var { name, initializer } => {
                self.declare(name, false);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Const { name, initializer } => {
                self.declare(name, false);
                self.resolve_expr(initializer);
                self.define(name);
            }

            Stmt::Group(statements) => {
                for stmt in statements {
                    self.resolve_stmt(stmt);
                }
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                for stmt in statements {
                    self.resolve_stmt(stmt);
                }
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch.as_deref() {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Break(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }

            Stmt::Function(decl) => {
                // The name is visible inside its own body.
                if let Some(name) = &decl.name {
                    self.declare(name, false);
                    self.define(name);
                }
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Del { names, .. } => {
                for name in names {
                    self.forget(name);
                }
            }

            // Modules are resolved when they are loaded.
            Stmt::Import { .. } => {}
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        let enclosing_class: ClassType = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name, false);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);
        }

        for method in methods {
            let kind: FunctionType = match method.name() {
                Some(INITIALIZER) => FunctionType::Initializer,
                _ => FunctionType::Method,
            };

            self.resolve_function(method, kind);
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                let declared_only: bool = self
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    .is_some_and(|local| local.state == State::Declared);

                if declared_only {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign {
                id,
                name,
                op,
                value,
            } => {
                self.resolve_expr(value);

                // `x += 1` and `x++` read the old value.
                let reads: bool = !matches!(op, AssignOp::Plain);
                self.resolve_local(*id, name, reads);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { keyword } => {
                if self.current_class == ClassType::None {
                    let this_kw: String = self.kw(Keyword::This);
                    self.error(keyword, format!("Can't use '{}' outside of a class.", this_kw));
                }
            }

            Expr::Super { keyword, .. } => {
                let super_kw: String = self.kw(Keyword::Super);

                match self.current_class {
                    ClassType::None => self.error(
                        keyword,
                        format!("Can't use '{}' outside of a class.", super_kw),
                    ),
                    ClassType::Class => self.error(
                        keyword,
                        format!("Can't use '{}' in a class with no superclass.", super_kw),
                    ),
                    ClassType::Subclass => {}
                }
            }

            Expr::Function(decl) => self.resolve_function(decl, FunctionType::Function),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and body share one scope, matching the single frame the
    /// interpreter creates per call.
    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param, true);
            self.define(param);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, warning about locals nobody read.
    fn end_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };

        let mut unused: Vec<(String, usize)> = scope
            .into_iter()
            .filter(|(_, local)| !local.is_param && local.state != State::Read)
            .map(|(name, local)| (name, local.line))
            .collect();

        unused.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (name, line) in unused {
            self.diagnostics.push(StellarError::resolve(
                line,
                format!(" at '{}'", name),
                Severity::Warning,
                format!("Local variable '{}' is never used.", name),
            ));
        }
    }

    fn declare(&mut self, name: &Token, is_param: bool) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.get(&name.lexeme).is_some_and(|local| !local.deleted) {
            let message: String = format!(
                "Variable with the name '{}' already declared in this scope.",
                name.lexeme
            );
            self.error(name, message);
            return;
        }

        scope.insert(
            name.lexeme.clone(),
            Local {
                state: State::Declared,
                line: name.line,
                is_param,
                deleted: false,
            },
        );
    }

    fn define(&mut self, name: &Token) {
        if let Some(local) = self
            .scopes
            .last_mut()
            .and_then(|scope| scope.get_mut(&name.lexeme))
        {
            if local.state == State::Declared {
                local.state = State::Defined;
            }
        }
    }

    /// `del name` counts as a read. The binding keeps its scope entry, since
    /// the `del` may never run; a later declaration may reuse the name.
    fn forget(&mut self, name: &Token) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(local) = scope.get_mut(&name.lexeme) {
                local.state = State::Read;
                local.deleted = true;
                debug!("Marked '{}' as deleted", name.lexeme);
                return;
            }
        }

        debug!("Deleting global '{}'", name.lexeme);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either a local at depth `d` or a
    /// global if it is found in no scope.
    fn resolve_local(&mut self, id: ExprId, name: &Token, reads: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(local) = scope.get_mut(&name.lexeme) {
                if reads {
                    local.state = State::Read;
                }

                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Diagnostics
    // ─────────────────────────────────────────────────────────────────────────

    #[inline(always)]
    fn kw(&self, keyword: Keyword) -> String {
        self.keywords.spelling(keyword).to_owned()
    }

    fn error<S: Into<String>>(&mut self, token: &Token, message: S) {
        let location: String = match token.kind {
            TokenType::EOF => " at end".to_string(),
            _ => format!(" at '{}'", token.lexeme),
        };

        debug!("Resolve error at line {}", token.line);

        self.diagnostics.push(StellarError::resolve(
            token.line,
            location,
            Severity::Error,
            message,
        ));
    }
}
