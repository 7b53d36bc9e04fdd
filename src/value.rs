//! Runtime values.
//!
//! [`Value`] is a closed enum. Scalars are stored inline; everything with
//! identity (collections, functions, classes, instances) sits behind an `Rc`
//! so copies of a value alias the same object.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::keywords::{Keyword, KeywordTable};
use crate::object::{Class, Function, Instance, NativeFunction};

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    NativeFunction(Rc<NativeFunction>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
}

/// Coarse category of a value, as reported to natives and `Type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nature {
    /// Built‑in functions.
    Native,

    /// Scalars, strings and collections.
    Datatype,

    /// Classes and user functions.
    Class,

    Instance,
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Name of the data kind, used in diagnostics (`'Int' has no method 'x'`).
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::List(_) => "List",
            Value::Array(_) => "Array",
            Value::Function(_) => "Function",
            Value::NativeFunction(_) => "NativeFunction",
            Value::Class(_) => "Class",
            Value::Instance(_) => "Instance",
        }
    }

    pub fn nature(&self) -> Nature {
        match self {
            Value::NativeFunction(_) => Nature::Native,
            Value::Function(_) | Value::Class(_) => Nature::Class,
            Value::Instance(_) => Nature::Instance,
            _ => Nature::Datatype,
        }
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Render for output, spelling `nil`/`true`/`false` through `keywords`.
    pub fn render(&self, keywords: &KeywordTable) -> String {
        Rendered {
            value: self,
            keywords: Some(keywords),
            nested: false,
            ancestors: Vec::new(),
        }
        .to_string()
    }
}

/// Reference kinds compare by identity, scalars by value.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

type Items = RefCell<Vec<Value>>;

struct Rendered<'v> {
    value: &'v Value,
    keywords: Option<&'v KeywordTable>,
    nested: bool,
    /// Collections currently being rendered further up; a repeat prints `[...]`.
    ancestors: Vec<*const Items>,
}

impl Rendered<'_> {
    fn spell(&self, keyword: Keyword) -> &str {
        match self.keywords {
            Some(table) => table.spelling(keyword),
            None => keyword.canonical(),
        }
    }

    fn items(&self, f: &mut fmt::Formatter<'_>, collection: &Rc<Items>) -> fmt::Result {
        let ptr: *const Items = Rc::as_ptr(collection);

        if self.ancestors.contains(&ptr) {
            return f.write_str("[...]");
        }

        let mut ancestors: Vec<*const Items> = self.ancestors.clone();
        ancestors.push(ptr);

        f.write_str("[")?;

        for (i, item) in collection.borrow().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }

            let inner: Rendered<'_> = Rendered {
                value: item,
                keywords: self.keywords,
                nested: true,
                ancestors: ancestors.clone(),
            };

            write!(f, "{}", inner)?;
        }

        f.write_str("]")
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => f.write_str(self.spell(Keyword::Nil)),

            Value::Bool(true) => f.write_str(self.spell(Keyword::True)),

            Value::Bool(false) => f.write_str(self.spell(Keyword::False)),

            Value::Int(n) => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            // 5 → "5.0", 2.5 → "2.5"
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),

            Value::Str(s) if self.nested => write!(f, "\"{}\"", s),
            Value::Str(s) => f.write_str(s),

            Value::List(items) | Value::Array(items) => self.items(f, items),

            Value::Function(func) => write!(f, "{}", func),

            Value::NativeFunction(native) => write!(f, "{}", native),

            Value::Class(class) => write!(f, "{}", class),

            Value::Instance(instance) => write!(f, "{}", instance.borrow()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Rendered<'_> = Rendered {
            value: self,
            keywords: None,
            nested: false,
            ancestors: Vec::new(),
        };

        write!(f, "{}", rendered)
    }
}
