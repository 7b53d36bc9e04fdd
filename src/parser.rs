/*!
Recursive‑descent parser for Stellar
====================================

Consumes the token slice produced by the [`Scanner`](crate::scanner::Scanner)
and builds the statement list defined in [`crate::stmt`] / [`crate::expr`].
Errors never stop the parse: each one is recorded, the parser
**synchronizes** on the next statement boundary and carries on, so a single
run reports every independent problem.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`error`, etc.)  | `debug`| Context before recording the diagnostic.  |

--------------------------------------------------------------------------------
Grammar (condensed EBNF, keywords shown with their canonical spelling)
--------------------------------------------------------------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | constDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" method* "}" ;
method         → IDENT "(" parameters? ")" block ;
funDecl        → "func" IDENT "(" parameters? ")" block ;
varDecl        → "var" ( binding ";" | "{" ( binding ";" )* "}" ";"? ) ;
constDecl      → "const" ( cbinding ";" | "{" ( cbinding ";" )* "}" ";"? ) ;
binding        → IDENT ( "=" expression )? ;
cbinding       → IDENT "=" expression ;
statement      → exprStmt | printStmt | ifStmt | whileStmt | forStmt
               | breakStmt | returnStmt | delStmt | importStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";"
                 expression? ")" statement ;
delStmt        → "del" IDENT ( "," IDENT )* ";" ;
importStmt     → "import" ( module | "(" module ( "," module )* ")" ) ";"? ;
module         → IDENT | STRING ;
expression     → assignment ;
assignment     → ( call "." )? IDENT ( "=" | "+=" | "-=" | "*=" | "/="
                 | "//=" | "%=" | "**=" ) assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → conditional ( "and" conditional )* ;
conditional    → equality ( "?" expression ":" conditional )? ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" | "<<" | ">>" ) factor )* ;
factor         → unary ( ( "/" | "//" | "%" | "*" | "**" ) unary )* ;
unary          → ( "!" | "-" | "~" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ( "++" | "--" )? ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | "super" "." IDENT | IDENT | "func" "(" parameters? ")" block
               | "(" parameters? ")" "=>" block | "(" ")" | "(" expression ")" ;
```
*/

use std::rc::Rc;

use crate::error::{Result, StellarError};
use crate::expr::{AssignOp, Expr, ExprId, LiteralValue};
use crate::keywords::{Keyword, KeywordTable};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenType};

use log::{debug, info};

const MAX_PARAMS: usize = 255;

/// Top‑level parser over an immutable slice of tokens.
pub struct Parser<'a> {
    tokens: &'a [Token],
    keywords: &'a KeywordTable,
    current: usize,
    loop_depth: usize,
    errors: Vec<StellarError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. `tokens` must end with an `EOF` token.
    pub fn new(tokens: &'a [Token], keywords: &'a KeywordTable) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            keywords,
            current: 0,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program. Returns every statement that parsed cleanly
    /// together with the diagnostics collected along the way.
    pub fn parse(mut self) -> (Vec<Stmt>, Vec<StellarError>) {
        info!("Beginning parse phase");

        // No EOF token to stop at.
        if self.tokens.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!(
            "Parsed {} statement(s) with {} error(s)",
            statements.len(),
            self.errors.len()
        );

        (statements, self.errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Parse one declaration; on error record it, synchronize and yield `None`.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result: Result<Stmt> = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUNC) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function_declaration()
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else if self.matches(TokenType::CONST) {
            self.const_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let class_kw: String = self.kw(Keyword::Class).to_owned();
        let name: Token = self
            .consume(TokenType::IDENTIFIER, &format!("Expected '{}' name.", class_kw))?
            .clone();

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name: Token = self
                .consume(TokenType::IDENTIFIER, "Expected superclass name after '<'.")?
                .clone();

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body.", class_kw),
        )?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            let method_name: Token = self
                .consume(TokenType::IDENTIFIER, "Expected method name.")?
                .clone();

            methods.push(self.function_body(Some(method_name), "method")?);
        }

        self.consume(
            TokenType::RIGHT_BRACE,
            &format!("Expected closing '}}' after {} body.", class_kw),
        )?;

        debug!(
            "Parsed class '{}' with {} method(s)",
            name.lexeme,
            methods.len()
        );

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected function name.")?
            .clone();

        Ok(Stmt::Function(self.function_body(Some(name), "function")?))
    }

    /// Parameters and body shared by named functions, methods and anonymous
    /// `func (…) {…}` expressions. The `(` has not been consumed yet.
    fn function_body(&mut self, name: Option<Token>, kind: &str) -> Result<Rc<FunctionDecl>> {
        let func_kw: String = self.kw(Keyword::Func).to_owned();
        let line: usize = name
            .as_ref()
            .map(|t| t.line)
            .unwrap_or_else(|| self.previous().line);

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("'{}' expected '(' after {} name.", func_kw, kind),
        )?;

        let params: Vec<Token> = self.parameters()?;

        self.consume(
            TokenType::RIGHT_PAREN,
            &format!("'{}' expected ')' after params.", func_kw),
        )?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("'{}' expected '{{' before {} body.", func_kw, kind),
        )?;

        let body: Vec<Stmt> = self.function_block()?;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            body,
            line,
        }))
    }

    /// `IDENT ( "," IDENT )*`, possibly empty; stops before `)`.
    fn parameters(&mut self) -> Result<Vec<Token>> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_PARAMS {
                    return Err(self.error_at_current("Cannot have more than 255 parameters."));
                }

                params.push(
                    self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?
                        .clone(),
                );

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        Ok(params)
    }

    /// A block parsed as a function body: loops outside the function do not
    /// make `break` legal inside it.
    fn function_block(&mut self) -> Result<Vec<Stmt>> {
        let enclosing_loops: usize = self.loop_depth;
        self.loop_depth = 0;

        let body: Result<Vec<Stmt>> = self.block();

        self.loop_depth = enclosing_loops;

        body
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::LEFT_BRACE) {
            let mut group: Vec<Stmt> = Vec::new();

            while self.check(TokenType::IDENTIFIER) {
                group.push(self.var_binding()?);
            }

            self.close_group(Keyword::Var)?;

            return Ok(Stmt::Group(group));
        }

        self.var_binding()
    }

    fn var_binding(&mut self) -> Result<Stmt> {
        let var_kw: String = self.kw(Keyword::Var).to_owned();
        let name: Token = self
            .consume(
                TokenType::IDENTIFIER,
                &format!("'{}' expected variable name.", var_kw),
            )?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            &format!("'{}' expected ';' after declaration.", var_kw),
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn const_declaration(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::LEFT_BRACE) {
            let mut group: Vec<Stmt> = Vec::new();

            while self.check(TokenType::IDENTIFIER) {
                group.push(self.const_binding()?);
            }

            self.close_group(Keyword::Const)?;

            return Ok(Stmt::Group(group));
        }

        self.const_binding()
    }

    fn const_binding(&mut self) -> Result<Stmt> {
        let const_kw: String = self.kw(Keyword::Const).to_owned();
        let name: Token = self
            .consume(
                TokenType::IDENTIFIER,
                &format!("'{}' expected variable name.", const_kw),
            )?
            .clone();

        self.consume(
            TokenType::EQUAL,
            &format!("'{}' variables require initializers.", const_kw),
        )?;

        let initializer: Expr = self.expression()?;

        self.consume(
            TokenType::SEMICOLON,
            &format!("'{}' expected ';' after declaration.", const_kw),
        )?;

        Ok(Stmt::Const { name, initializer })
    }

    /// `}` closing a grouped declaration, with an optional trailing `;`.
    fn close_group(&mut self, keyword: Keyword) -> Result<()> {
        let message: String = format!(
            "'{}' expected closing '}}' after multi-variable declaration.",
            self.kw(keyword)
        );

        self.consume(TokenType::RIGHT_BRACE, &message)?;
        self.matches(TokenType::SEMICOLON);

        Ok(())
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::ELSE) {
            Err(self.error(
                self.previous(),
                &format!(
                    "Can't use '{}' without beginning '{}'.",
                    self.kw(Keyword::Else),
                    self.kw(Keyword::If)
                ),
            ))
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::DEL) {
            self.del_statement()
        } else if self.matches(TokenType::IMPORT) {
            self.import_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let if_kw: String = self.kw(Keyword::If).to_owned();

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after '{}'.", if_kw),
        )?;
        let condition: Expr = self.expression()?;
        self.consume(
            TokenType::RIGHT_PAREN,
            &format!("Expected ')' after '{}' condition.", if_kw),
        )?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let while_kw: String = self.kw(Keyword::While).to_owned();

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after '{}'.", while_kw),
        )?;
        let condition: Expr = self.expression()?;
        self.consume(
            TokenType::RIGHT_PAREN,
            &format!("Expected ')' after '{}' condition.", while_kw),
        )?;

        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::While { condition, body })
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        let for_kw: String = self.kw(Keyword::For).to_owned();

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after '{}'.", for_kw),
        )?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_binding()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(
            TokenType::RIGHT_PAREN,
            &format!("Expected ')' after '{}' clauses.", for_kw),
        )?;

        let mut body: Stmt = self.loop_body()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition: Expr = condition.unwrap_or(Expr::Literal(LiteralValue::Bool(true)));
        let mut desugared: Stmt = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            desugared = Stmt::Block(vec![initializer, desugared]);
        }

        Ok(desugared)
    }

    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;

        let body: Result<Stmt> = self.statement();

        self.loop_depth -= 1;

        body
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let break_kw: String = self.kw(Keyword::Break).to_owned();

        if self.loop_depth == 0 {
            return Err(self.error(&keyword, &format!("'{}' used outside loop.", break_kw)));
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expected ';' after '{}'.", break_kw),
        )?;

        Ok(Stmt::Break(keyword))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expected ';' after '{}' value.", self.kw(Keyword::Return)),
        )?;

        Ok(Stmt::Return { keyword, value })
    }

    fn del_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let del_kw: String = self.kw(Keyword::Del).to_owned();

        if self.check(TokenType::SEMICOLON) || self.is_at_end() {
            return Err(self.error_at_current(&format!(
                "'{}' requires at least one identifier.",
                del_kw
            )));
        }

        let mut names: Vec<Token> = Vec::new();

        loop {
            names.push(
                self.consume(
                    TokenType::IDENTIFIER,
                    &format!("'{}' expected identifier name.", del_kw),
                )?
                .clone(),
            );

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("'{}' expected ';' after names.", del_kw),
        )?;

        Ok(Stmt::Del { keyword, names })
    }

    fn import_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let import_kw: String = self.kw(Keyword::Import).to_owned();
        let mut modules: Vec<Token> = Vec::new();

        if self.matches(TokenType::LEFT_PAREN) {
            loop {
                modules.push(self.module_name(&import_kw)?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }

            self.consume(
                TokenType::RIGHT_PAREN,
                &format!("'(' expected closing ')' in '{}' statement.", import_kw),
            )?;
        } else {
            modules.push(self.module_name(&import_kw)?);
        }

        self.matches(TokenType::SEMICOLON);

        Ok(Stmt::Import { keyword, modules })
    }

    fn module_name(&mut self, import_kw: &str) -> Result<Token> {
        if self.check(TokenType::IDENTIFIER) || self.check(TokenType::STRING) {
            return Ok(self.advance().clone());
        }

        Err(self.error_at_current(&format!("'{}' expected module name.", import_kw)))
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(
            TokenType::SEMICOLON,
            &format!("'{}' expected ';' after expression.", self.kw(Keyword::Print)),
        )?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected matching '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches_any(&[
            TokenType::EQUAL,
            TokenType::PLUS_EQUAL,
            TokenType::MINUS_EQUAL,
            TokenType::STAR_EQUAL,
            TokenType::SLASH_EQUAL,
            TokenType::SLASH_SLASH_EQUAL,
            TokenType::PERCENT_EQUAL,
            TokenType::STAR_STAR_EQUAL,
        ]) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            let op: AssignOp = match equals.kind {
                TokenType::PLUS_EQUAL => AssignOp::Compound(equals.with_kind(TokenType::PLUS)),
                TokenType::MINUS_EQUAL => AssignOp::Compound(equals.with_kind(TokenType::MINUS)),
                TokenType::STAR_EQUAL => AssignOp::Compound(equals.with_kind(TokenType::STAR)),
                TokenType::SLASH_EQUAL => AssignOp::Compound(equals.with_kind(TokenType::SLASH)),
                TokenType::SLASH_SLASH_EQUAL => {
                    AssignOp::Compound(equals.with_kind(TokenType::SLASH_SLASH))
                }
                TokenType::PERCENT_EQUAL => {
                    AssignOp::Compound(equals.with_kind(TokenType::PERCENT))
                }
                TokenType::STAR_STAR_EQUAL => {
                    AssignOp::Compound(equals.with_kind(TokenType::STAR_STAR))
                }
                _ => AssignOp::Plain,
            };

            return Ok(self.assignment_target(expr, &equals, op, value));
        }

        Ok(expr)
    }

    /// Turn `target <op> value` into an `Assign` or `Set`. An invalid target
    /// is reported without entering panic mode.
    fn assignment_target(
        &mut self,
        target: Expr,
        operator: &Token,
        op: AssignOp,
        value: Expr,
    ) -> Expr {
        match target {
            Expr::Variable { name, .. } => Expr::Assign {
                id: ExprId::fresh(),
                name,
                op,
                value: Box::new(value),
            },

            Expr::Get { object, name } => Expr::Set {
                object,
                name,
                op,
                value: Box::new(value),
            },

            other => {
                let e: StellarError = self.error(operator, "Invalid assignment target.");
                self.errors.push(e);

                other
            }
        }
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.conditional()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.conditional()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn conditional(&mut self) -> Result<Expr> {
        let expr: Expr = self.equality()?;

        if self.matches(TokenType::QUESTION) {
            let question: Token = self.previous().clone();
            let then_branch: Expr = self.expression()?;

            self.consume(
                TokenType::COLON,
                "Expected ':' after then branch of conditional expression.",
            )?;

            let else_branch: Expr = self.conditional()?;

            return Ok(Expr::Conditional {
                condition: Box::new(expr),
                question,
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.comparison()?;

        while self.matches_any(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.comparison()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.term()?;

        while self.matches_any(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.term()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.factor()?;

        while self.matches_any(&[
            TokenType::MINUS,
            TokenType::PLUS,
            TokenType::LESS_LESS,
            TokenType::GREATER_GREATER,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.factor()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.unary()?;

        while self.matches_any(&[
            TokenType::STAR,
            TokenType::SLASH,
            TokenType::SLASH_SLASH,
            TokenType::PERCENT,
            TokenType::STAR_STAR,
        ]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches_any(&[TokenType::BANG, TokenType::MINUS, TokenType::TILDE]) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token = self
                    .consume(TokenType::IDENTIFIER, "Expected property name after '.'.")?
                    .clone();

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        // Postfix `++` / `--` are sugar for `target = target ± 1` yielding the old value.
        if self.matches_any(&[TokenType::PLUS_PLUS, TokenType::MINUS_MINUS]) {
            let operator: Token = self.previous().clone();
            let arithmetic: TokenType = if operator.kind == TokenType::PLUS_PLUS {
                TokenType::PLUS
            } else {
                TokenType::MINUS
            };
            let op: AssignOp = AssignOp::Postfix(operator.with_kind(arithmetic));

            let one: Expr = Expr::Literal(LiteralValue::Int(1));

            expr = self.assignment_target(expr, &operator, op, one);
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_PARAMS {
                    return Err(self.error_at_current("Cannot have more than 255 arguments."));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expected ')' after function arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::Bool(false)));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::Bool(true)));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[TokenType::NUMBER, TokenType::STRING]) {
            let literal: LiteralValue = match &self.previous().literal {
                Some(Literal::Int(n)) => LiteralValue::Int(*n),
                Some(Literal::Float(n)) => LiteralValue::Float(*n),
                Some(Literal::Str(s)) => LiteralValue::Str(Rc::from(s.as_str())),
                None => LiteralValue::Nil,
            };

            return Ok(Expr::Literal(literal));
        }

        if self.matches(TokenType::FUNC) {
            return Ok(Expr::Function(self.function_body(None, "function")?));
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();

            self.consume(
                TokenType::DOT,
                &format!("Expected '.' after '{}'.", self.kw(Keyword::Super)),
            )?;

            let method: Token = self
                .consume(TokenType::IDENTIFIER, "Expected superclass method name.")?
                .clone();

            return Ok(Expr::Super {
                keyword,
                method,
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            if let Some(arrow) = self.arrow_function()? {
                return Ok(Expr::Function(arrow));
            }

            // `()` on its own is nil
            if self.matches(TokenType::RIGHT_PAREN) {
                return Ok(Expr::Literal(LiteralValue::Nil));
            }

            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected closing ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        if self.matches(TokenType::RIGHT_PAREN) {
            return Err(self.error(self.previous(), "Expected matching '(' before closing ')'."));
        }

        if self.matches(TokenType::RIGHT_BRACE) {
            return Err(self.error(self.previous(), "Expected matching '{' before closing '}'."));
        }

        // ── error productions: binary operator with no left operand ──
        if self.matches_any(&[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL]) {
            self.missing_left_operand();
            self.equality()?;

            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[
            TokenType::GREATER,
            TokenType::GREATER_EQUAL,
            TokenType::LESS,
            TokenType::LESS_EQUAL,
        ]) {
            self.missing_left_operand();
            self.comparison()?;

            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[
            TokenType::PLUS,
            TokenType::LESS_LESS,
            TokenType::GREATER_GREATER,
        ]) {
            self.missing_left_operand();
            self.term()?;

            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches_any(&[
            TokenType::STAR,
            TokenType::SLASH,
            TokenType::SLASH_SLASH,
            TokenType::PERCENT,
            TokenType::STAR_STAR,
        ]) {
            self.missing_left_operand();
            self.factor()?;

            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        Err(self.error_at_current("Expected expression."))
    }

    /// Speculatively parse `(a, b) => { … }` right after a `(`. If the tokens
    /// do not form an arrow head the cursor is rolled back and `None` returned.
    fn arrow_function(&mut self) -> Result<Option<Rc<FunctionDecl>>> {
        let locked: usize = self.current;
        let line: usize = self.previous().line;
        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if !self.check(TokenType::IDENTIFIER) {
                    self.current = locked;
                    return Ok(None);
                }

                params.push(self.advance().clone());

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        if !self.matches(TokenType::RIGHT_PAREN) || !self.matches(TokenType::ARROW) {
            self.current = locked;
            return Ok(None);
        }

        debug!("Parsing arrow function with {} param(s)", params.len());

        if params.len() > MAX_PARAMS {
            return Err(self.error_at_current("Cannot have more than 255 parameters."));
        }

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("'{}' expected '{{' before arrow function body.", self.kw(Keyword::Func)),
        )?;

        let body: Vec<Stmt> = self.function_block()?;

        Ok(Some(Rc::new(FunctionDecl {
            name: None,
            params,
            body,
            line,
        })))
    }

    fn missing_left_operand(&mut self) {
        let e: StellarError = self.error(self.previous(), "Left-hand operand missing.");

        self.errors.push(e);
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn kw(&self, keyword: Keyword) -> &str {
        self.keywords.spelling(keyword)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn matches_any(&mut self, ttypes: &[TokenType]) -> bool {
        ttypes.iter().any(|t| self.matches(*t))
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(self.error_at_current(message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().kind == ttype
    }

    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.kind == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;

        &tokens[self.current.min(tokens.len().saturating_sub(1))]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;

        &tokens[self.current.saturating_sub(1)]
    }

    fn error_at_current(&self, message: &str) -> StellarError {
        self.error(self.peek(), message)
    }

    /// Build a diagnostic located at `token`.
    fn error(&self, token: &Token, message: &str) -> StellarError {
        debug!("Parse error at line {}: {}", token.line, message);

        let location: String = if token.kind == TokenType::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };

        StellarError::parse(token.line, location, message)
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().kind, TokenType::SEMICOLON) {
                return;
            }

            if self.peek().kind.starts_statement() {
                return;
            }

            self.advance();
        }
    }
}
