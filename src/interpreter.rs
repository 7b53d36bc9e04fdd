/*!
Tree‑walking evaluator
======================

Executes the statements produced by the [`Parser`](crate::parser::Parser)
against a chain of [`Environment`] frames, using the binding distances the
[`Resolver`](crate::resolver::Resolver) recorded through
[`Interpreter::note_local`].

`break` and `return` travel as [`Flow`] values through statement execution;
only genuine failures use the `Err` path. A runtime error aborts the current
top‑level statement list, is appended to the error log and is returned to
the host. Globals defined before the failure stay available.

### Logging Policy

| Location                       | Level  | Purpose                           |
|--------------------------------|--------|-----------------------------------|
| `new`, `interpret`, `import`   | `info` | Lifecycle milestones.             |
| Statement / call dispatch      | `debug`| Per‑node tracing.                 |
*/

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, info};

use crate::arithmetic;
use crate::builtins;
use crate::driver;
use crate::environment::Environment;
use crate::error::{Result, RuntimeError, RuntimeErrorKind};
use crate::expr::{AssignOp, Expr, ExprId, LiteralValue};
use crate::keywords::{Keyword, KeywordTable};
use crate::object::{Callable, Class, Function, Instance};
use crate::stmt::{module_path, FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default bound on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// How a statement finished.
#[derive(Debug, Clone)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

// ─────────────────────────────────────────────────────────────────────────────
// Module loading
// ─────────────────────────────────────────────────────────────────────────────

/// Host capability used by `import` to turn a module name into source text.
pub trait ModuleLoader {
    fn load(&self, module: &str) -> Result<String>;
}

/// Loads modules from disk, relative to `root`. A module name without an
/// extension gets `.rckt` appended.
#[derive(Debug, Clone)]
pub struct FsModuleLoader {
    root: PathBuf,
}

impl FsModuleLoader {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FsModuleLoader { root: root.into() }
    }
}

impl Default for FsModuleLoader {
    fn default() -> Self {
        FsModuleLoader::new(".")
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(&self, module: &str) -> Result<String> {
        let mut path: PathBuf = self.root.join(module);

        if path.extension().is_none() {
            path.set_extension("rckt");
        }

        debug!("Loading module '{}' from {}", module, path.display());

        driver::read_source(&path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interpreter
// ─────────────────────────────────────────────────────────────────────────────

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    keywords: Rc<KeywordTable>,
    out: Box<dyn Write>,
    input: Box<dyn BufRead>,
    loader: Box<dyn ModuleLoader>,
    imported: HashSet<String>,
    errors: Vec<RuntimeError>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(Rc::new(KeywordTable::default()))
    }
}

impl Interpreter {
    /// A fresh interpreter with the native globals installed, writing to
    /// stdout and reading from stdin.
    pub fn new(keywords: Rc<KeywordTable>) -> Self {
        info!("Initializing Interpreter");

        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        builtins::install(&mut globals.borrow_mut())
            .unwrap_or_else(|_| unreachable!("a fresh global frame holds no constants"));

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            keywords,
            out: Box::new(io::stdout()),
            input: Box::new(io::stdin().lock()),
            loader: Box::new(FsModuleLoader::default()),
            imported: HashSet::new(),
            errors: Vec::new(),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Send `print` output somewhere other than stdout.
    pub fn with_output<W: Write + 'static>(mut self, out: W) -> Self {
        self.out = Box::new(out);
        self
    }

    pub fn with_input<R: BufRead + 'static>(mut self, input: R) -> Self {
        self.input = Box::new(input);
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_loader<L: ModuleLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn keywords(&self) -> Rc<KeywordTable> {
        Rc::clone(&self.keywords)
    }

    pub fn globals(&self) -> Rc<RefCell<Environment>> {
        Rc::clone(&self.globals)
    }

    /// Every runtime error reported so far, oldest first.
    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }

    /// Record that the variable reference `id` binds `depth` frames out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local {:?} at depth {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Binding distance recorded for `id`; `None` means global.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    // ───────────────────────── public API ─────────────────────────

    /// Execute a program. The first runtime error stops execution, is logged
    /// in [`errors`](Self::errors) and returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> std::result::Result<(), RuntimeError> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            if let Err(error) = self.execute(stmt) {
                info!("Interpretation aborted: {}", error);

                self.environment = Rc::clone(&self.globals);
                self.call_depth = 0;
                self.errors.push(error.clone());

                return Err(error);
            }
        }

        info!("Interpretation completed successfully");

        Ok(())
    }

    /// Run `statements` inside `env`, restoring the current frame afterwards
    /// whether or not they fail.
    pub fn execute_block<'s, I>(
        &mut self,
        statements: I,
        env: Rc<RefCell<Environment>>,
    ) -> std::result::Result<Flow, RuntimeError>
    where
        I: IntoIterator<Item = &'s Stmt>,
    {
        let previous: Rc<RefCell<Environment>> = std::mem::replace(&mut self.environment, env);
        let result = self.execute_all(statements);
        self.environment = previous;

        result
    }

    /// Render a value the way `print` shows it.
    pub fn stringify(&self, value: &Value) -> String {
        value.render(&self.keywords)
    }

    /// Write one line of program output.
    pub fn emit(&mut self, text: &str, line: usize) -> std::result::Result<(), RuntimeError> {
        writeln!(self.out, "{}", text).map_err(|e| output_error(e, line))
    }

    /// Show `prompt` and read one line of input without its line ending.
    /// `None` at end of input.
    pub fn read_line(
        &mut self,
        prompt: &str,
        line: usize,
    ) -> std::result::Result<Option<String>, RuntimeError> {
        write!(self.out, "{}", prompt).map_err(|e| output_error(e, line))?;
        self.out.flush().map_err(|e| output_error(e, line))?;

        let mut buf: String = String::new();
        let read: usize = self
            .input
            .read_line(&mut buf)
            .map_err(|e| output_error(e, line))?;

        if read == 0 {
            return Ok(None);
        }

        let trimmed: &str = buf.trim_end_matches(['\n', '\r']);

        Ok(Some(trimmed.to_string()))
    }

    /// Call any callable value with already evaluated arguments.
    pub fn call_value(
        &mut self,
        callee: Value,
        args: Vec<Value>,
        line: usize,
    ) -> std::result::Result<Value, RuntimeError> {
        match &callee {
            Value::Function(function) => self.invoke(function.as_ref(), args, line),
            Value::NativeFunction(native) => self.invoke(native.as_ref(), args, line),
            Value::Class(class) => self.invoke(class.as_ref(), args, line),
            other => Err(RuntimeError::new(
                RuntimeErrorKind::NotCallable,
                line,
                format!("Can only call functions and classes, not '{}'.", other.kind()),
            )),
        }
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute_all<'s, I>(&mut self, statements: I) -> std::result::Result<Flow, RuntimeError>
    where
        I: IntoIterator<Item = &'s Stmt>,
    {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                let text: String = self.stringify(&value);
                self.emit(&text, expr.line())?;
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.lexeme);
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value, name.line)?;
            }

            Stmt::Const { name, initializer } => {
                let value: Value = self.evaluate(initializer)?;

                debug!("Defining constant '{}'", name.lexeme);
                self.environment
                    .borrow_mut()
                    .declare_const(&name.lexeme, value, name.line)?;
            }

            Stmt::Group(statements) => return self.execute_all(statements),

            Stmt::Block(statements) => {
                let env: Environment = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(statements, Rc::new(RefCell::new(env)));
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }

            Stmt::Break(_) => return Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                return Ok(Flow::Return(value));
            }

            Stmt::Function(decl) => {
                let function: Function =
                    Function::new(Rc::clone(decl), Rc::clone(&self.environment));
                let line: usize = decl.line;

                debug!("Defining function {}", function);
                self.environment.borrow_mut().define(
                    decl.name().unwrap_or_default(),
                    Value::Function(Rc::new(function)),
                    line,
                )?;
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.class_declaration(name, superclass.as_ref(), methods)?,

            Stmt::Del { names, .. } => {
                for name in names {
                    self.environment.borrow_mut().delete(&name.lexeme, name.line)?;
                }
            }

            Stmt::Import { keyword, modules } => {
                for module in modules {
                    self.import(keyword, module)?;
                }
            }
        }

        Ok(Flow::Normal)
    }

    fn class_declaration(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> std::result::Result<(), RuntimeError> {
        let superclass: Option<Rc<Class>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(RuntimeError::type_error(
                        expr.line(),
                        "Superclass must be a class.",
                    ))
                }
            },
            None => None,
        };

        let table: HashMap<String, Rc<Function>> = methods
            .iter()
            .map(|decl| {
                let method: Function = Function::method(
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    superclass.clone(),
                );
                (decl.name().unwrap_or_default().to_string(), Rc::new(method))
            })
            .collect();

        let class: Rc<Class> = Class::new(name.lexeme.clone(), superclass, table);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(class), name.line)
    }

    /// Load, compile and run one module in the global frame. A module is
    /// imported at most once per interpreter.
    fn import(&mut self, keyword: &Token, module: &Token) -> std::result::Result<(), RuntimeError> {
        let path: &str = module_path(module);
        let line: usize = keyword.line;

        if !self.imported.insert(path.to_string()) {
            debug!("Module '{}' already imported", path);
            return Ok(());
        }

        info!("Importing module '{}'", path);

        let import_error = |detail: String| {
            RuntimeError::new(
                RuntimeErrorKind::Import,
                line,
                format!("Cannot import module '{}': {}", path, detail),
            )
        };

        let source: String = self.loader.load(path).map_err(|e| import_error(e.to_string()))?;

        let compiled: driver::Compiled = driver::compile(self, &source).map_err(|diagnostics| {
            let detail: String = diagnostics
                .iter()
                .filter(|d| d.is_blocking())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            import_error(detail)
        })?;

        for warning in &compiled.warnings {
            debug!("Module '{}': {}", path, warning);
        }

        let globals: Rc<RefCell<Environment>> = Rc::clone(&self.globals);

        match self.execute_block(&compiled.statements, globals)? {
            Flow::Normal => Ok(()),
            _ => Err(import_error("unexpected control flow at module level".to_string())),
        }
    }

    // ───────────────────────── expressions ────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Int(n) => Value::Int(*n),
                LiteralValue::Float(n) => Value::Float(*n),
                LiteralValue::Str(s) => Value::Str(Rc::clone(s)),
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;
                arithmetic::unary(operator, &right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;
                arithmetic::binary(operator, &left, &right, &self.keywords)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuits: bool = match operator.kind {
                    TokenType::OR => left.is_truthy(),
                    _ => !left.is_truthy(),
                };

                if short_circuits {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up(*id, name),

            Expr::Assign {
                id,
                name,
                op,
                value,
            } => {
                let (stored, result) = match op {
                    AssignOp::Plain => {
                        let value: Value = self.evaluate(value)?;
                        (value.clone(), value)
                    }
                    AssignOp::Compound(operator) => {
                        let old: Value = self.look_up(*id, name)?;
                        let rhs: Value = self.evaluate(value)?;
                        let new: Value = arithmetic::binary(operator, &old, &rhs, &self.keywords)?;
                        (new.clone(), new)
                    }
                    AssignOp::Postfix(operator) => {
                        let old: Value = self.look_up(*id, name)?;
                        let rhs: Value = self.evaluate(value)?;
                        let new: Value = arithmetic::binary(operator, &old, &rhs, &self.keywords)?;
                        (new, old)
                    }
                };

                self.assign(*id, name, stored)?;

                Ok(result)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let args: Vec<Value> = arguments
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<std::result::Result<_, _>>()?;

                self.call_value(callee, args, paren.line)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, &name.lexeme, name.line),
                other => builtins::get_method(&other, name),
            },

            Expr::Set {
                object,
                name,
                op,
                value,
            } => {
                let instance = match self.evaluate(object)? {
                    Value::Instance(instance) => instance,
                    _ => {
                        return Err(RuntimeError::type_error(
                            name.line,
                            "Only instances have fields.",
                        ))
                    }
                };

                let (stored, result) = match op {
                    AssignOp::Plain => {
                        let value: Value = self.evaluate(value)?;
                        (value.clone(), value)
                    }
                    AssignOp::Compound(operator) | AssignOp::Postfix(operator) => {
                        let old: Value = Instance::get(&instance, &name.lexeme, name.line)?;
                        let rhs: Value = self.evaluate(value)?;
                        let new: Value = arithmetic::binary(operator, &old, &rhs, &self.keywords)?;

                        match op {
                            AssignOp::Postfix(_) => (new, old),
                            _ => (new.clone(), new),
                        }
                    }
                };

                debug!("Setting field '{}'", name.lexeme);
                instance.borrow_mut().set(&name.lexeme, stored);

                Ok(result)
            }

            Expr::This { keyword } => match self.environment.borrow().receiver() {
                Some(receiver) => Ok(Value::Instance(receiver.instance)),
                None => Err(self.outside_class(keyword, Keyword::This)),
            },

            Expr::Super { keyword, method } => {
                let receiver = self
                    .environment
                    .borrow()
                    .receiver()
                    .ok_or_else(|| self.outside_class(keyword, Keyword::Super))?;

                let superclass: Rc<Class> = receiver.superclass.ok_or_else(|| {
                    RuntimeError::type_error(
                        keyword.line,
                        format!(
                            "Can't use '{}' in a class with no superclass.",
                            self.keywords.spelling(Keyword::Super)
                        ),
                    )
                })?;

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(&receiver.instance)))),
                    None => Err(RuntimeError::new(
                        RuntimeErrorKind::UndefinedProperty,
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }

            Expr::Function(decl) => {
                let function: Function =
                    Function::new(Rc::clone(decl), Rc::clone(&self.environment));
                Ok(Value::Function(Rc::new(function)))
            }
        }
    }

    // ───────────────────────── helpers ────────────────────────────

    fn invoke(
        &mut self,
        callee: &dyn Callable,
        args: Vec<Value>,
        line: usize,
    ) -> std::result::Result<Value, RuntimeError> {
        if !callee.accepts(args.len()) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Arity,
                line,
                format!(
                    "Expected {} arguments but got {}.",
                    callee.expected(),
                    args.len()
                ),
            ));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::new(
                RuntimeErrorKind::RecursionLimit,
                line,
                format!(
                    "Maximum recursion depth reached from calls to '{}'.",
                    callee.name()
                ),
            ));
        }

        debug!("Calling '{}' with {} argument(s)", callee.name(), args.len());

        self.call_depth += 1;
        let result = callee.call(self, args, line);
        self.call_depth -= 1;

        result
    }

    #[inline(always)]
    fn look_up(&self, id: ExprId, name: &Token) -> std::result::Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(depth) => self
                .environment
                .borrow()
                .get_at(*depth, &name.lexeme, name.line),
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    #[inline(always)]
    fn assign(
        &mut self,
        id: ExprId,
        name: &Token,
        value: Value,
    ) -> std::result::Result<(), RuntimeError> {
        match self.locals.get(&id) {
            Some(depth) => self
                .environment
                .borrow_mut()
                .assign_at(*depth, &name.lexeme, value, name.line),
            None => self
                .globals
                .borrow_mut()
                .assign(&name.lexeme, value, name.line),
        }
    }

    fn outside_class(&self, keyword: &Token, which: Keyword) -> RuntimeError {
        RuntimeError::type_error(
            keyword.line,
            format!(
                "Can't use '{}' outside of a class.",
                self.keywords.spelling(which)
            ),
        )
    }
}

fn output_error(error: io::Error, line: usize) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::Value,
        line,
        format!("I/O error: {}", error),
    )
}
