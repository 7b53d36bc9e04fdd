//! Native globals and the method tables of the library datatypes.
//!
//! Both are compile‑time `phf` maps from a name to a [`Builtin`]. Globals
//! are installed into the interpreter's global frame at construction;
//! methods are looked up on demand by [`get_method`] and handed out as
//! [`NativeFunction`]s bound to their receiver.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};
use phf::phf_map;
use rand::Rng;

use crate::environment::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::interpreter::Interpreter;
use crate::keywords::Keyword;
use crate::object::{Arity, NativeFn, NativeFunction};
use crate::token::Token;
use crate::value::{Nature, Value};

/// Table entry for a native function or method.
pub struct Builtin {
    pub arity: Arity,
    pub func: NativeFn,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tables
// ─────────────────────────────────────────────────────────────────────────────

static NATIVES: phf::Map<&'static str, Builtin> = phf_map! {
    "clock"     => Builtin { arity: Arity::Exact(0), func: clock },
    "Random"    => Builtin { arity: Arity::Exact(0), func: random },
    "Print"     => Builtin { arity: Arity::Variadic, func: print },
    "Input"     => Builtin { arity: Arity::Exact(1), func: input },
    "Locals"    => Builtin { arity: Arity::Exact(0), func: locals },
    "Copyright" => Builtin { arity: Arity::Exact(0), func: copyright },
    "Type"      => Builtin { arity: Arity::Exact(1), func: type_of },
    "Natives"   => Builtin { arity: Arity::Exact(0), func: natives },
    "List"      => Builtin { arity: Arity::Variadic, func: make_list },
    "Array"     => Builtin { arity: Arity::Variadic, func: make_array },
    "Int"       => Builtin { arity: Arity::Exact(1), func: to_int },
    "Float"     => Builtin { arity: Arity::Exact(1), func: to_float },
    "String"    => Builtin { arity: Arity::Exact(1), func: to_string },
    "Bool"      => Builtin { arity: Arity::Exact(1), func: to_bool },
};

/// Largest element count `Array(n)` will allocate.
pub const MAX_ARRAY_SIZE: usize = 1 << 24;

static STRING_METHODS: phf::Map<&'static str, Builtin> = phf_map! {
    "length"     => Builtin { arity: Arity::Exact(0), func: str_length },
    "get"        => Builtin { arity: Arity::Exact(1), func: str_get },
    "slice"      => Builtin { arity: Arity::Range(1, 2), func: str_slice },
    "upper"      => Builtin { arity: Arity::Exact(0), func: str_upper },
    "lower"      => Builtin { arity: Arity::Exact(0), func: str_lower },
    "capitalize" => Builtin { arity: Arity::Exact(0), func: str_capitalize },
    "reverse"    => Builtin { arity: Arity::Exact(0), func: str_reverse },
    "isalpha"    => Builtin { arity: Arity::Exact(0), func: str_isalpha },
    "isnum"      => Builtin { arity: Arity::Exact(0), func: str_isnum },
    "split"      => Builtin { arity: Arity::Exact(1), func: str_split },
};

static LIST_METHODS: phf::Map<&'static str, Builtin> = phf_map! {
    "length"   => Builtin { arity: Arity::Exact(0), func: seq_length },
    "get"      => Builtin { arity: Arity::Exact(1), func: seq_get },
    "set"      => Builtin { arity: Arity::Exact(2), func: seq_set },
    "append"   => Builtin { arity: Arity::Exact(1), func: list_append },
    "insert"   => Builtin { arity: Arity::Exact(2), func: list_insert },
    "pop"      => Builtin { arity: Arity::Exact(0), func: list_pop },
    "remove"   => Builtin { arity: Arity::Exact(1), func: list_remove },
    "clear"    => Builtin { arity: Arity::Exact(0), func: list_clear },
    "concat"   => Builtin { arity: Arity::Exact(1), func: list_concat },
    "slice"    => Builtin { arity: Arity::Range(1, 2), func: seq_slice },
    "indexOf"  => Builtin { arity: Arity::Exact(1), func: seq_index_of },
    "includes" => Builtin { arity: Arity::Exact(1), func: seq_includes },
    "reverse"  => Builtin { arity: Arity::Exact(0), func: seq_reverse },
    "forEach"  => Builtin { arity: Arity::Exact(1), func: seq_for_each },
};

static ARRAY_METHODS: phf::Map<&'static str, Builtin> = phf_map! {
    "length"   => Builtin { arity: Arity::Exact(0), func: seq_length },
    "get"      => Builtin { arity: Arity::Exact(1), func: seq_get },
    "set"      => Builtin { arity: Arity::Exact(2), func: seq_set },
    "slice"    => Builtin { arity: Arity::Range(1, 2), func: seq_slice },
    "indexOf"  => Builtin { arity: Arity::Exact(1), func: seq_index_of },
    "includes" => Builtin { arity: Arity::Exact(1), func: seq_includes },
    "reverse"  => Builtin { arity: Arity::Exact(0), func: seq_reverse },
    "forEach"  => Builtin { arity: Arity::Exact(1), func: seq_for_each },
};

/// Define every native global in `globals`.
pub fn install(globals: &mut Environment) -> Result<(), RuntimeError> {
    for (&name, builtin) in NATIVES.entries() {
        let native: NativeFunction = NativeFunction::new(name, builtin.arity, builtin.func);
        globals.define(name, Value::NativeFunction(Rc::new(native)), 0)?;
    }

    info!("Installed {} native function(s)", NATIVES.len());

    Ok(())
}

/// Sorted names of the native globals.
pub fn native_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = NATIVES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Look `name` up in the method table of `receiver`'s datatype.
pub fn get_method(receiver: &Value, name: &Token) -> Result<Value, RuntimeError> {
    let table: Option<&phf::Map<&'static str, Builtin>> = match receiver {
        Value::Str(_) => Some(&STRING_METHODS),
        Value::List(_) => Some(&LIST_METHODS),
        Value::Array(_) => Some(&ARRAY_METHODS),
        _ => None,
    };

    match table.and_then(|t| t.get_entry(name.lexeme.as_str())) {
        Some((&method, builtin)) => {
            debug!("Resolved method '{}' on {}", method, receiver.kind());

            let bound: NativeFunction =
                NativeFunction::method(method, builtin.arity, builtin.func, receiver.clone());
            Ok(Value::NativeFunction(Rc::new(bound)))
        }

        None => Err(RuntimeError::new(
            RuntimeErrorKind::UndefinedProperty,
            name.line,
            format!("'{}' has no method '{}'.", receiver.kind(), name.lexeme),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Globals
// ─────────────────────────────────────────────────────────────────────────────

fn clock(_: &mut Interpreter, _: Option<&Value>, _: &[Value], _: usize) -> NativeResult {
    let micros: i64 = Utc::now().timestamp_micros();
    Ok(Value::Float(micros as f64 / 1_000_000.0))
}

/// Uniform in `[0, 1)`.
fn random(_: &mut Interpreter, _: Option<&Value>, _: &[Value], _: usize) -> NativeResult {
    let mut rng = rand::thread_rng();
    Ok(Value::Float(rng.gen::<f64>()))
}

fn print(interp: &mut Interpreter, _: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| decode_escapes(&interp.stringify(arg)))
        .collect();

    interp.emit(&rendered.join(" "), line)?;

    Ok(Value::Nil)
}

fn input(interp: &mut Interpreter, _: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let prompt: String = interp.stringify(&args[0]);

    match interp.read_line(&prompt, line)? {
        Some(text) => Ok(Value::str(&decode_escapes(&text))),
        None => Ok(Value::Nil),
    }
}

fn type_of(interp: &mut Interpreter, _: Option<&Value>, args: &[Value], _: usize) -> NativeResult {
    let value: &Value = &args[0];

    let description: String = match (value.nature(), value) {
        (_, Value::Nil) => format!("<{} type>", interp.keywords().spelling(Keyword::Nil)),
        (Nature::Native, _) => "<native function type>".to_string(),
        (Nature::Class, Value::Function(func)) if func.is_anonymous() => {
            "<anonymous fn type>".to_string()
        }
        (Nature::Class, Value::Function(_)) => "<fn type>".to_string(),
        (Nature::Class, _) => "<class type>".to_string(),
        (Nature::Instance, _) => "<class type instanceOf>".to_string(),
        (Nature::Datatype, datatype) => format!("<native type '{}'>", datatype.kind()),
    };

    Ok(Value::str(&description))
}

/// User bindings of the global frame, as `Vars: ...` and `Constants: ...`
/// lines. Native globals are left out; `nil` when there is nothing to list.
fn locals(interp: &mut Interpreter, _: Option<&Value>, _: &[Value], _: usize) -> NativeResult {
    let globals: Rc<RefCell<Environment>> = interp.globals();
    let frame = globals.borrow();

    let is_user = |name: &String| -> bool {
        !(NATIVES.contains_key(name.as_str())
            && matches!(frame.get(name, 0), Ok(Value::NativeFunction(_))))
    };

    let vars: Vec<String> = frame.var_names().into_iter().filter(|n| is_user(n)).collect();
    let consts: Vec<String> = frame.const_names().into_iter().filter(|n| is_user(n)).collect();

    if vars.is_empty() && consts.is_empty() {
        return Ok(Value::Nil);
    }

    Ok(Value::str(&format!(
        "Vars: {}\nConstants: {}",
        vars.join(", "),
        consts.join(", ")
    )))
}

fn copyright(_: &mut Interpreter, _: Option<&Value>, _: &[Value], _: usize) -> NativeResult {
    Ok(Value::str(&format!(
        "{} {}\nCopyright (c) {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    )))
}

fn natives(_: &mut Interpreter, _: Option<&Value>, _: &[Value], _: usize) -> NativeResult {
    Ok(Value::str(&native_names().join(", ")))
}

fn make_list(_: &mut Interpreter, _: Option<&Value>, args: &[Value], _: usize) -> NativeResult {
    Ok(Value::list(args.to_vec()))
}

/// `Array(n)` → `n` nils; `Array(a, b, ...)` → elements of one kind.
fn make_array(_: &mut Interpreter, _: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    if let [single] = args {
        return match single {
            Value::Int(n) => {
                let size: usize = usize::try_from(*n).map_err(|_| {
                    RuntimeError::new(RuntimeErrorKind::Value, line, "Array size must be positive.")
                })?;

                if size > MAX_ARRAY_SIZE {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::Value,
                        line,
                        format!("Array size {} exceeds the limit of {}.", size, MAX_ARRAY_SIZE),
                    ));
                }

                let mut items: Vec<Value> = Vec::new();
                items.try_reserve_exact(size).map_err(|_| {
                    RuntimeError::new(
                        RuntimeErrorKind::Value,
                        line,
                        format!("Cannot allocate an Array of size {}.", size),
                    )
                })?;
                items.resize(size, Value::Nil);

                Ok(Value::array(items))
            }
            _ => Err(RuntimeError::type_error(line, "Array size must be Int.")),
        };
    }

    if let Some(first) = args.first() {
        if args.iter().any(|arg| arg.kind() != first.kind()) {
            return Err(RuntimeError::type_error(
                line,
                "Array elements must be adjacent types.",
            ));
        }
    }

    Ok(Value::array(args.to_vec()))
}

fn to_int(_: &mut Interpreter, _: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(n) if n.is_finite() => Ok(Value::Int(n.trunc() as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            RuntimeError::new(
                RuntimeErrorKind::Value,
                line,
                format!("Cannot convert '{}' to Int.", s),
            )
        }),
        other => Err(conversion(other, "Int", line)),
    }
}

fn to_float(_: &mut Interpreter, _: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Float(n) => Ok(Value::Float(*n)),
        Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            RuntimeError::new(
                RuntimeErrorKind::Value,
                line,
                format!("Cannot convert '{}' to Float.", s),
            )
        }),
        other => Err(conversion(other, "Float", line)),
    }
}

/// Only `nil` and `false` convert to `false`.
fn to_bool(_: &mut Interpreter, _: Option<&Value>, args: &[Value], _: usize) -> NativeResult {
    Ok(Value::Bool(args[0].is_truthy()))
}

fn to_string(interp: &mut Interpreter, _: Option<&Value>, args: &[Value], _: usize) -> NativeResult {
    Ok(Value::str(&interp.stringify(&args[0])))
}

fn conversion(value: &Value, target: &str, line: usize) -> RuntimeError {
    RuntimeError::type_error(
        line,
        format!("Cannot convert '{}' to {}.", value.kind(), target),
    )
}

/// Decode `\n`, `\t`, `\r`, `\0`, `\\`, `\'` and `\"`. Unknown escapes are
/// kept verbatim.
pub fn decode_escapes(text: &str) -> String {
    if !text.contains('\\') {
        return text.to_string();
    }

    let mut out: String = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

type NativeResult = Result<Value, RuntimeError>;

// ─────────────────────────────────────────────────────────────────────────────
// Receiver and argument helpers
// ─────────────────────────────────────────────────────────────────────────────

fn text(receiver: Option<&Value>, line: usize) -> Result<Rc<str>, RuntimeError> {
    match receiver {
        Some(Value::Str(s)) => Ok(Rc::clone(s)),
        _ => Err(RuntimeError::type_error(line, "Method receiver must be a String.")),
    }
}

fn items(receiver: Option<&Value>, line: usize) -> Result<Rc<RefCell<Vec<Value>>>, RuntimeError> {
    match receiver {
        Some(Value::List(items)) | Some(Value::Array(items)) => Ok(Rc::clone(items)),
        _ => Err(RuntimeError::type_error(
            line,
            "Method receiver must be a List or an Array.",
        )),
    }
}

/// A new collection of the same kind as `receiver`.
#[inline(always)]
fn same_kind(receiver: Option<&Value>, items: Vec<Value>) -> Value {
    match receiver {
        Some(Value::Array(_)) => Value::array(items),
        _ => Value::list(items),
    }
}

#[inline(always)]
fn kind_of(receiver: Option<&Value>) -> &'static str {
    receiver.map_or("Nil", Value::kind)
}

fn int_arg(value: &Value, kind: &str, line: usize) -> Result<i64, RuntimeError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(RuntimeError::type_error(
            line,
            format!("'{}' index must be an Int, got '{}'.", kind, other.kind()),
        )),
    }
}

/// Resolve a possibly negative index against `len`.
fn index(value: &Value, len: usize, kind: &str, line: usize) -> Result<usize, RuntimeError> {
    let raw: i64 = int_arg(value, kind, line)?;
    let resolved: i64 = if raw < 0 { raw + len as i64 } else { raw };

    if resolved < 0 || resolved as usize >= len {
        return Err(RuntimeError::new(
            RuntimeErrorKind::Index,
            line,
            format!("{} index {} out of range.", kind, raw),
        ));
    }

    Ok(resolved as usize)
}

/// Bounds of `slice(start[, end])`, clamped to `0..=len`.
fn bounds(args: &[Value], len: usize, kind: &str, line: usize) -> Result<(usize, usize), RuntimeError> {
    let clamp = |raw: i64| -> usize {
        let resolved: i64 = if raw < 0 { raw + len as i64 } else { raw };
        resolved.clamp(0, len as i64) as usize
    };

    let start: usize = clamp(int_arg(&args[0], kind, line)?);
    let end: usize = match args.get(1) {
        Some(end) => clamp(int_arg(end, kind, line)?),
        None => len,
    };

    Ok((start, end.max(start)))
}

// ─────────────────────────────────────────────────────────────────────────────
// String methods
// ─────────────────────────────────────────────────────────────────────────────

fn str_length(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    Ok(Value::Int(text(this, line)?.chars().count() as i64))
}

fn str_get(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;
    let chars: Vec<char> = s.chars().collect();
    let at: usize = index(&args[0], chars.len(), "String", line)?;

    Ok(Value::str(&chars[at].to_string()))
}

fn str_slice(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;
    let chars: Vec<char> = s.chars().collect();
    let (start, end) = bounds(args, chars.len(), "String", line)?;

    Ok(Value::str(&chars[start..end].iter().collect::<String>()))
}

fn str_upper(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    Ok(Value::str(&text(this, line)?.to_uppercase()))
}

fn str_lower(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    Ok(Value::str(&text(this, line)?.to_lowercase()))
}

fn str_capitalize(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;
    let mut chars = s.chars();

    let capitalized: String = match chars.next() {
        Some(first) => {
            let rest: String = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    };

    Ok(Value::str(&capitalized))
}

fn str_reverse(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    Ok(Value::str(&text(this, line)?.chars().rev().collect::<String>()))
}

fn str_isalpha(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;
    Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
}

fn str_isnum(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;
    Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
}

fn str_split(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let s: Rc<str> = text(this, line)?;

    let separator: Rc<str> = match &args[0] {
        Value::Str(sep) if !sep.is_empty() => Rc::clone(sep),
        Value::Str(_) => {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Value,
                line,
                "Empty separator.",
            ))
        }
        other => {
            return Err(RuntimeError::type_error(
                line,
                format!("Separator must be a String, got '{}'.", other.kind()),
            ))
        }
    };

    let parts: Vec<Value> = s.split(&*separator).map(Value::str).collect();

    Ok(Value::list(parts))
}

// ─────────────────────────────────────────────────────────────────────────────
// List and Array methods
// ─────────────────────────────────────────────────────────────────────────────

fn seq_length(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    Ok(Value::Int(items(this, line)?.borrow().len() as i64))
}

fn seq_get(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let items = items.borrow();
    let at: usize = index(&args[0], items.len(), kind_of(this), line)?;

    Ok(items[at].clone())
}

/// Arrays only take values of the kind they already hold.
fn seq_set(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let mut items = items.borrow_mut();
    let at: usize = index(&args[0], items.len(), kind_of(this), line)?;
    let value: &Value = &args[1];

    if let Some(Value::Array(_)) = this {
        let held: Option<&'static str> = items
            .iter()
            .find(|item| !matches!(item, Value::Nil))
            .map(Value::kind);

        if let Some(held) = held.filter(|held| *held != value.kind()) {
            return Err(RuntimeError::type_error(
                line,
                format!("Array holds '{}' elements, got '{}'.", held, value.kind()),
            ));
        }
    }

    items[at] = value.clone();

    Ok(value.clone())
}

fn seq_slice(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let items = items.borrow();
    let (start, end) = bounds(args, items.len(), kind_of(this), line)?;

    Ok(same_kind(this, items[start..end].to_vec()))
}

fn seq_index_of(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let position: Option<usize> = items.borrow().iter().position(|item| *item == args[0]);

    match position {
        Some(at) => Ok(Value::Int(at as i64)),
        None => Err(RuntimeError::new(
            RuntimeErrorKind::Index,
            line,
            format!("Item not in {}.", kind_of(this)),
        )),
    }
}

fn seq_includes(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let found: bool = items.borrow().contains(&args[0]);
    Ok(Value::Bool(found))
}

/// Reverses in place and returns the receiver.
fn seq_reverse(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    items(this, line)?.borrow_mut().reverse();
    Ok(this.cloned().unwrap_or(Value::Nil))
}

/// Calls the argument once per element, over a snapshot of the elements.
fn seq_for_each(interp: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let snapshot: Vec<Value> = items(this, line)?.borrow().clone();

    for item in snapshot {
        interp.call_value(args[0].clone(), vec![item], line)?;
    }

    Ok(Value::Nil)
}

fn list_append(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    items(this, line)?.borrow_mut().push(args[0].clone());
    Ok(this.cloned().unwrap_or(Value::Nil))
}

fn list_insert(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let len: usize = items.borrow().len();
    let raw: i64 = int_arg(&args[0], "List", line)?;
    let resolved: i64 = if raw < 0 { raw + len as i64 } else { raw };

    if !(0..=len as i64).contains(&resolved) {
        return Err(RuntimeError::new(
            RuntimeErrorKind::Index,
            line,
            format!("List index {} out of range.", raw),
        ));
    }

    items.borrow_mut().insert(resolved as usize, args[1].clone());

    Ok(this.cloned().unwrap_or(Value::Nil))
}

fn list_pop(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    items(this, line)?.borrow_mut().pop().ok_or_else(|| {
        RuntimeError::new(RuntimeErrorKind::Index, line, "Cannot pop from an empty List.")
    })
}

/// Removes the first element equal to the argument and returns its index.
fn list_remove(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;
    let position: Option<usize> = items.borrow().iter().position(|item| *item == args[0]);

    match position {
        Some(at) => {
            items.borrow_mut().remove(at);
            Ok(Value::Int(at as i64))
        }
        None => Err(RuntimeError::new(
            RuntimeErrorKind::Index,
            line,
            "Item not in List.",
        )),
    }
}

fn list_clear(_: &mut Interpreter, this: Option<&Value>, _: &[Value], line: usize) -> NativeResult {
    items(this, line)?.borrow_mut().clear();
    Ok(this.cloned().unwrap_or(Value::Nil))
}

fn list_concat(_: &mut Interpreter, this: Option<&Value>, args: &[Value], line: usize) -> NativeResult {
    let items = items(this, line)?;

    match &args[0] {
        Value::List(other) => {
            let mut joined: Vec<Value> = items.borrow().clone();
            joined.extend(other.borrow().iter().cloned());
            Ok(Value::list(joined))
        }
        other => Err(RuntimeError::type_error(
            line,
            format!("Can only concat a List with another List, got '{}'.", other.kind()),
        )),
    }
}
