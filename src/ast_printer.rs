use crate::expr::{AssignOp, Expr, LiteralValue};
use crate::stmt::{module_path, FunctionDecl, Stmt};

/// Converts an AST to a parenthesised prefix form, e.g. `(+ 1 (* 2 3))`.
/// Used by the `parse` subcommand and by parser tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::Bool(true) => "true".into(),

                LiteralValue::Bool(false) => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.to_string(),

                LiteralValue::Int(n) => {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    buf.format(*n).to_owned()
                }

                LiteralValue::Float(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → "3.0"
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            // ── variables / assignment ─────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign {
                name, op, value, ..
            } => Self::assignment(op, &name.lexeme, value),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                op,
                value,
            } => {
                let target: String = format!("(. {} {})", Self::print(object), name.lexeme);
                Self::assignment(op, &target, value)
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s: String = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Function(decl) => Self::function("lambda", decl),
        }
    }

    fn assignment(op: &AssignOp, target: &str, value: &Expr) -> String {
        match op {
            AssignOp::Plain => format!("(= {} {})", target, Self::print(value)),
            // The operator token keeps its source lexeme (`+=`).
            AssignOp::Compound(operator) => {
                format!("({} {} {})", operator.lexeme, target, Self::print(value))
            }
            AssignOp::Postfix(operator) => format!("(post{} {})", operator.lexeme, target),
        }
    }

    fn function(head: &str, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.param_names().collect();
        let mut s: String = match decl.name() {
            Some(name) => format!("({} {} ({})", head, name, params.join(" ")),
            None => format!("({} ({})", head, params.join(" ")),
        };

        for stmt in &decl.body {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn sequence(head: &str, statements: &[Stmt]) -> String {
        let mut s: String = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Const { name, initializer } => {
                format!("(const {} {})", name.lexeme, Self::print(initializer))
            }

            Stmt::Group(decls) => Self::sequence("group", decls),

            Stmt::Block(statements) => Self::sequence("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Break(_) => "(break)".into(),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Function(decl) => Self::function("func", decl),

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s: String = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(&format!(" < {}", Self::print(superclass)));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function("method", method));
                }
                s.push(')');
                s
            }

            Stmt::Del { names, .. } => {
                let names: Vec<&str> = names.iter().map(|t| t.lexeme.as_str()).collect();
                format!("(del {})", names.join(" "))
            }

            Stmt::Import { modules, .. } => {
                let modules: Vec<&str> = modules.iter().map(module_path).collect();
                format!("(import {})", modules.join(" "))
            }
        }
    }
}
