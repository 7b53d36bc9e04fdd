//! Callable objects: user functions and closures, classes, instances and
//! native functions, together with the [`Callable`] calling convention.
//!
//! # Construction
//!
//! Calling a [`Class`] creates an [`Instance`] and runs the class's
//! *construction plan*, computed once per class and cached:
//!
//! - no initializer anywhere in the chain: nothing runs;
//! - only one side has an `init`: that initializer runs as is;
//! - both the class and its superclass chain have one, and the inherited
//!   body is non‑empty: the two are **merged**. The merged parameter list is
//!   the inherited parameters whose names the subclass does not reuse, in
//!   order, followed by the subclass parameters. Arguments are routed to each
//!   body by name; the subclass body runs first, then the inherited body
//!   minus its `this.x = …` statements for fields the subclass already
//!   assigned.
//!
//! A subclass `init` that calls `super.init(...)` itself opts out of the
//! merge and keeps its own arity.

use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, info};

use crate::environment::{Environment, Receiver};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::expr::{AssignOp, Expr};
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::{FunctionDecl, Stmt};
use crate::value::Value;

/// Name of the method run by class construction.
pub const INITIALIZER: &str = "init";

/// The calling convention shared by every callable value.
pub trait Callable {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// Does a call with `argc` arguments match this callable?
    fn accepts(&self, argc: usize) -> bool {
        argc == self.arity()
    }

    /// Human readable expected argument count, for arity diagnostics.
    fn expected(&self) -> String {
        self.arity().to_string()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A closure over a [`FunctionDecl`].
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,

    /// Superclass of the class that defined this method.
    superclass: Option<Rc<Class>>,

    /// Set on bound methods only.
    receiver: Option<Receiver>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Function {
            declaration,
            closure,
            is_initializer: false,
            superclass: None,
            receiver: None,
        }
    }

    pub fn method(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        superclass: Option<Rc<Class>>,
    ) -> Self {
        let is_initializer: bool = declaration.name() == Some(INITIALIZER);

        Function {
            declaration,
            closure,
            is_initializer,
            superclass,
            receiver: None,
        }
    }

    /// A new function sharing this one's code and closure, with `instance`
    /// as its receiver. The original stays unbound.
    pub fn bind(&self, instance: &Rc<RefCell<Instance>>) -> Function {
        Function {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::clone(&self.closure),
            is_initializer: self.is_initializer,
            superclass: self.superclass.clone(),
            receiver: Some(Receiver {
                instance: Rc::clone(instance),
                superclass: self.superclass.clone(),
            }),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.declaration.name.is_none()
    }

    /// Execute the body, leaving out top‑level `this.<field> = …` statements
    /// for every field in `skip`.
    fn run(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        skip: &HashSet<String>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let closure: Rc<RefCell<Environment>> = Rc::clone(&self.closure);
        let mut frame: Environment = match &self.receiver {
            Some(receiver) => Environment::with_receiver(closure, receiver.clone()),
            None => Environment::with_enclosing(closure),
        };

        for (param, arg) in self.declaration.params.iter().zip(args) {
            debug!("Binding parameter '{}' to {}", param.lexeme, arg);
            frame.define(&param.lexeme, arg, line)?;
        }

        let body = self
            .declaration
            .body
            .iter()
            .filter(|stmt| !assigned_field(stmt).is_some_and(|field| skip.contains(field)));

        let flow: Flow = interpreter.execute_block(body, Rc::new(RefCell::new(frame)))?;

        if self.is_initializer {
            if let Some(receiver) = &self.receiver {
                return Ok(Value::Instance(Rc::clone(&receiver.instance)));
            }
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break => Ok(Value::Nil),
        }
    }

    /// Fields assigned by top‑level `this.x = …` statements of the body.
    fn assigned_fields(&self) -> HashSet<String> {
        self.declaration
            .body
            .iter()
            .filter_map(assigned_field)
            .map(str::to_owned)
            .collect()
    }

    /// Does the body call `super.init(...)` at top level?
    fn calls_super_init(&self) -> bool {
        self.declaration.body.iter().any(|stmt| {
            matches!(
                stmt,
                Stmt::Expression(Expr::Call { callee, .. })
                    if matches!(&**callee, Expr::Super { method, .. } if method.lexeme == INITIALIZER)
            )
        })
    }
}

/// `this.<field> = value;` → `Some(field)`.
fn assigned_field(stmt: &Stmt) -> Option<&str> {
    match stmt {
        Stmt::Expression(Expr::Set {
            object,
            name,
            op: AssignOp::Plain,
            ..
        }) if matches!(**object, Expr::This { .. }) => Some(name.lexeme.as_str()),
        _ => None,
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        self.declaration.name().unwrap_or("anonymous")
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        self.run(interpreter, args, &HashSet::new(), line)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.declaration.name() {
            Some(name) => write!(f, "<fn '{}'>", name),
            None => f.write_str("<anonymous-fn>"),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classes
// ─────────────────────────────────────────────────────────────────────────────

/// What runs when a class is called.
pub enum Initializer {
    Plain(Rc<Function>),

    Merged {
        params: Vec<String>,
        own: Rc<Function>,
        parent: Rc<Initializer>,
    },
}

impl Initializer {
    pub fn params(&self) -> Vec<&str> {
        match self {
            Initializer::Plain(init) => init.declaration.param_names().collect(),
            Initializer::Merged { params, .. } => params.iter().map(String::as_str).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Initializer::Plain(init) => init.arity(),
            Initializer::Merged { params, .. } => params.len(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Initializer::Plain(init) => init.declaration.body.is_empty(),
            Initializer::Merged { .. } => false,
        }
    }

    fn merge(own: Rc<Function>, parent: Rc<Initializer>) -> Initializer {
        let own_params: Vec<&str> = own.declaration.param_names().collect();
        let mut params: Vec<String> = parent
            .params()
            .into_iter()
            .filter(|p| !own_params.contains(p))
            .map(str::to_owned)
            .collect();

        params.extend(own_params.iter().map(|p| p.to_string()));

        Initializer::Merged {
            params,
            own,
            parent,
        }
    }

    fn run(
        &self,
        interpreter: &mut Interpreter,
        instance: &Rc<RefCell<Instance>>,
        args: Vec<Value>,
        skip: &HashSet<String>,
        line: usize,
    ) -> Result<(), RuntimeError> {
        match self {
            Initializer::Plain(init) => {
                init.bind(instance).run(interpreter, args, skip, line)?;
            }

            Initializer::Merged {
                params,
                own,
                parent,
            } => {
                let by_name: HashMap<&str, Value> =
                    params.iter().map(String::as_str).zip(args).collect();
                let pick = |names: Vec<&str>| -> Vec<Value> {
                    names
                        .into_iter()
                        .map(|n| by_name.get(n).cloned().unwrap_or(Value::Nil))
                        .collect()
                };

                let own_args: Vec<Value> = pick(own.declaration.param_names().collect());
                let parent_args: Vec<Value> = pick(parent.params());

                own.bind(instance).run(interpreter, own_args, skip, line)?;

                let mut parent_skip: HashSet<String> = skip.clone();
                parent_skip.extend(own.assigned_fields());

                parent.run(interpreter, instance, parent_args, &parent_skip, line)?;
            }
        }

        Ok(())
    }
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    plan: OnceCell<Option<Rc<Initializer>>>,
    me: Weak<Class>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Rc<Class> {
        info!("Creating class '{}' with {} method(s)", name, methods.len());

        Rc::new_cyclic(|me: &Weak<Class>| Class {
            name,
            superclass,
            methods,
            plan: OnceCell::new(),
            me: me.clone(),
        })
    }

    /// Look `name` up on this class, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        match self.methods.get(name) {
            Some(method) => Some(Rc::clone(method)),
            None => self.superclass.as_ref()?.find_method(name),
        }
    }

    /// The cached construction plan.
    pub fn construction_plan(&self) -> Option<Rc<Initializer>> {
        self.plan
            .get_or_init(|| {
                let own: Option<Rc<Function>> = self.methods.get(INITIALIZER).cloned();
                let parent: Option<Rc<Initializer>> = self
                    .superclass
                    .as_ref()
                    .and_then(|superclass| superclass.construction_plan());

                match (own, parent) {
                    (None, None) => None,
                    (Some(own), None) => Some(Rc::new(Initializer::Plain(own))),
                    (None, Some(parent)) => Some(parent),
                    (Some(own), Some(parent)) => {
                        if own.calls_super_init() || parent.is_empty() {
                            Some(Rc::new(Initializer::Plain(own)))
                        } else {
                            debug!("Merging initializers for class '{}'", self.name);
                            Some(Rc::new(Initializer::merge(own, parent)))
                        }
                    }
                }
            })
            .clone()
    }

    /// Has construction merged this class's `init` with an inherited one?
    pub fn is_merged(&self) -> bool {
        matches!(
            self.construction_plan().as_deref(),
            Some(Initializer::Merged { .. })
        )
    }
}

impl Callable for Class {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.construction_plan().map_or(0, |plan| plan.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let class: Rc<Class> = self.me.upgrade().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::Value,
                line,
                format!("Class '{}' is no longer alive.", self.name),
            )
        })?;

        let instance: Rc<RefCell<Instance>> = Rc::new(RefCell::new(Instance::new(class)));

        if let Some(plan) = self.construction_plan() {
            plan.run(interpreter, &instance, args, &HashSet::new(), line)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|s| s.name.as_str()),
            )
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Instances
// ─────────────────────────────────────────────────────────────────────────────

pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields first, then methods bound to `this`.
    pub fn get(this: &Rc<RefCell<Instance>>, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = this.borrow().fields.get(name) {
            return Ok(value.clone());
        }

        let method: Option<Rc<Function>> = this.borrow().class.find_method(name);

        match method {
            Some(method) => Ok(Value::Function(Rc::new(method.bind(this)))),
            None => Err(RuntimeError::new(
                RuntimeErrorKind::UndefinedProperty,
                line,
                format!("Undefined property '{}'.", name),
            )),
        }
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class instanceOf '{}'>", self.class.name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// Signature of every built‑in: interpreter, receiver (for library methods),
/// arguments, call line.
pub type NativeFn =
    fn(&mut Interpreter, Option<&Value>, &[Value], usize) -> Result<Value, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),

    /// Inclusive bounds.
    Range(usize, usize),

    Variadic,
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub receiver: Option<Value>,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new(name: &'static str, arity: Arity, func: NativeFn) -> Self {
        NativeFunction {
            name,
            arity,
            receiver: None,
            func,
        }
    }

    /// A library method bound to `receiver`.
    pub fn method(name: &'static str, arity: Arity, func: NativeFn, receiver: Value) -> Self {
        NativeFunction {
            name,
            arity,
            receiver: Some(receiver),
            func,
        }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        match self.arity {
            Arity::Exact(n) | Arity::Range(n, _) => n,
            Arity::Variadic => 0,
        }
    }

    fn accepts(&self, argc: usize) -> bool {
        match self.arity {
            Arity::Exact(n) => argc == n,
            Arity::Range(lo, hi) => (lo..=hi).contains(&argc),
            Arity::Variadic => true,
        }
    }

    fn expected(&self) -> String {
        match self.arity {
            Arity::Exact(n) => n.to_string(),
            Arity::Range(lo, hi) => format!("{} to {}", lo, hi),
            Arity::Variadic => "any number of".to_string(),
        }
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(interpreter, self.receiver.as_ref(), &args, line)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn '{}'>", self.name)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
