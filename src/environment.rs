use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::object::{Class, Instance};
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The object a method call runs against, plus the superclass of the class
/// that defined the method (the target of `super.x` inside it).
#[derive(Debug, Clone)]
pub struct Receiver {
    pub instance: Rc<RefCell<Instance>>,
    pub superclass: Option<Rc<Class>>,
}

/// One lexical scope frame. A name lives in at most one of `values` and
/// `consts`.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    consts: HashMap<String, Value>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
    receiver: Option<Receiver>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            ..Environment::default()
        }
    }

    /// Frame for a bound method call.
    pub fn with_receiver(enclosing: Rc<RefCell<Environment>>, receiver: Receiver) -> Self {
        Environment {
            enclosing: Some(enclosing),
            receiver: Some(receiver),
            ..Environment::default()
        }
    }

    pub fn define(&mut self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if self.consts.contains_key(name) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Redeclaration,
                line,
                format!("Cannot redeclare constant '{}' as a variable.", name),
            ));
        }

        self.values.insert(name.to_string(), value);

        Ok(())
    }

    pub fn declare_const(
        &mut self,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        if self.values.contains_key(name) || self.consts.contains_key(name) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Redeclaration,
                line,
                format!("Cannot redeclare '{}' as a constant.", name),
            ));
        }

        self.consts.insert(name.to_string(), value);

        Ok(())
    }

    #[inline]
    fn lookup_here(&self, name: &str) -> Option<&Value> {
        self.values.get(name).or_else(|| self.consts.get(name))
    }

    pub fn get(&self, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = self.lookup_here(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(undefined(name, line))
        }
    }

    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), RuntimeError> {
        if self.consts.contains_key(name) {
            Err(const_reassignment(name, line))
        } else if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(undefined(name, line))
        }
    }

    /// Read `name` exactly `depth` frames out.
    pub fn get_at(&self, depth: usize, name: &str, line: usize) -> Result<Value, RuntimeError> {
        if depth == 0 {
            return self.lookup_here(name).cloned().ok_or_else(|| undefined(name, line));
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get_at(depth - 1, name, line),
            None => Err(undefined(name, line)),
        }
    }

    /// Write `name` exactly `depth` frames out.
    pub fn assign_at(
        &mut self,
        depth: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), RuntimeError> {
        if depth > 0 {
            return match &self.enclosing {
                Some(enclosing) => enclosing.borrow_mut().assign_at(depth - 1, name, value, line),
                None => Err(undefined(name, line)),
            };
        }

        if self.consts.contains_key(name) {
            return Err(const_reassignment(name, line));
        }

        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name, line)),
        }
    }

    /// Remove `name` from the nearest frame that holds it.
    pub fn delete(&mut self, name: &str, line: usize) -> Result<(), RuntimeError> {
        if self.values.remove(name).is_some() || self.consts.remove(name).is_some() {
            debug!("Deleted '{}'", name);
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().delete(name, line),
            None => Err(undefined(name, line)),
        }
    }

    /// Receiver of the innermost enclosing method call, if any.
    pub fn receiver(&self) -> Option<Receiver> {
        match (&self.receiver, &self.enclosing) {
            (Some(receiver), _) => Some(receiver.clone()),
            (None, Some(enclosing)) => enclosing.borrow().receiver(),
            (None, None) => None,
        }
    }

    /// Mutable names defined directly in this frame, sorted.
    pub fn var_names(&self) -> Vec<String> {
        sorted_keys(&self.values)
    }

    /// Constant names defined directly in this frame, sorted.
    pub fn const_names(&self) -> Vec<String> {
        sorted_keys(&self.consts)
    }
}

fn sorted_keys(table: &HashMap<String, Value>) -> Vec<String> {
    let mut names: Vec<String> = table.keys().cloned().collect();
    names.sort();
    names
}

fn undefined(name: &str, line: usize) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::UndefinedVariable,
        line,
        format!("Undefined variable '{}'.", name),
    )
}

fn const_reassignment(name: &str, line: usize) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::ConstReassignment,
        line,
        format!("Cannot reassign constant '{}'.", name),
    )
}
