//! Operator semantics for unary and binary expressions.
//!
//! Int and Float mix freely: any operation with a Float operand is carried
//! out in `f64`, everything else in checked `i64` arithmetic. Integer
//! overflow is a runtime error rather than a silent wrap.

use std::cmp::Ordering;

use log::debug;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::keywords::KeywordTable;
use crate::token::{Token, TokenType};
use crate::value::Value;

const NUMBERS: &str = "Operands must be numbers.";
const STRINGS_OR_NUMBERS: &str = "Operands must be either both strings or both numbers.";
const NUMERIC_ARRAY: &str = "Array must contain Number elements.";

// ─────────────────────────────────────────────────────────────────────────────
// Entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Evaluate a prefix operator applied to an already evaluated operand.
pub fn unary(operator: &Token, right: &Value) -> Result<Value, RuntimeError> {
    let line: usize = operator.line;

    match (operator.kind, right) {
        (TokenType::BANG, value) => Ok(Value::Bool(!value.is_truthy())),

        (TokenType::MINUS, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| overflow(line, operator)),
        (TokenType::MINUS, Value::Float(n)) => Ok(Value::Float(-n)),

        // -x - 1
        (TokenType::TILDE, Value::Int(n)) => Ok(Value::Int(!n)),
        (TokenType::TILDE, Value::Float(n)) => Ok(Value::Float(-n - 1.0)),

        (TokenType::MINUS | TokenType::TILDE, _) => Err(RuntimeError::type_error(
            line,
            "Operand must be a number.",
        )),

        _ => Err(RuntimeError::type_error(
            line,
            format!("Unknown unary operator '{}'.", operator.lexeme),
        )),
    }
}

/// Evaluate an infix operator. `keywords` is needed to stringify the
/// non‑string side of an implicit string concatenation.
pub fn binary(
    operator: &Token,
    left: &Value,
    right: &Value,
    keywords: &KeywordTable,
) -> Result<Value, RuntimeError> {
    let line: usize = operator.line;

    debug!("Binary '{}' on {} and {}", operator.lexeme, left.kind(), right.kind());

    match operator.kind {
        TokenType::EQUAL_EQUAL => equals(operator, left, right).map(Value::Bool),
        TokenType::BANG_EQUAL => equals(operator, left, right).map(|eq| Value::Bool(!eq)),

        TokenType::GREATER
        | TokenType::GREATER_EQUAL
        | TokenType::LESS
        | TokenType::LESS_EQUAL => compare(operator, left, right),

        TokenType::LESS_LESS | TokenType::GREATER_GREATER => shift(operator, left, right),

        TokenType::PLUS => add(operator, left, right, keywords),

        TokenType::MINUS
        | TokenType::STAR
        | TokenType::SLASH
        | TokenType::SLASH_SLASH
        | TokenType::PERCENT
        | TokenType::STAR_STAR => {
            if let Some(result) = over_array(operator, left, right) {
                return result;
            }

            numeric(operator, left, right)
        }

        _ => Err(RuntimeError::type_error(
            line,
            format!("Unknown binary operator '{}'.", operator.lexeme),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// `+` and its overloads
// ─────────────────────────────────────────────────────────────────────────────

fn add(
    operator: &Token,
    left: &Value,
    right: &Value,
    keywords: &KeywordTable,
) -> Result<Value, RuntimeError> {
    let line: usize = operator.line;

    if let Some(result) = over_array(operator, left, right) {
        return result;
    }

    match (left, right) {
        (l, r) if l.is_number() && r.is_number() => numeric(operator, l, r),

        (Value::Str(a), Value::Str(b)) => {
            let mut joined: String = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::str(&joined))
        }

        (Value::Nil, _) | (_, Value::Nil) => Err(RuntimeError::type_error(line, STRINGS_OR_NUMBERS)),

        (Value::Str(_), _) | (_, Value::Str(_)) => {
            let joined: String = format!("{}{}", left.render(keywords), right.render(keywords));
            Ok(Value::str(&joined))
        }

        (Value::List(a), Value::List(b)) => {
            let mut items: Vec<Value> = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }

        (Value::Array(a), Value::Array(b)) => {
            let (a, b) = (a.borrow(), b.borrow());

            if a.is_empty() || b.is_empty() {
                return Err(RuntimeError::type_error(line, "Cannot concat empty Array(s)."));
            }

            if !all_numbers(&a) || !all_numbers(&b) {
                return Err(RuntimeError::type_error(line, NUMERIC_ARRAY));
            }

            if a.len() != b.len() {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::Value,
                    line,
                    format!("Cannot add Arrays of length {} and {}.", a.len(), b.len()),
                ));
            }

            let items: Vec<Value> = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| numeric(operator, x, y))
                .collect::<Result<_, _>>()?;

            Ok(Value::array(items))
        }

        _ => Err(RuntimeError::type_error(line, STRINGS_OR_NUMBERS)),
    }
}

/// Element‑wise `array op scalar` / `scalar op array`. `None` when neither
/// side is an array paired with a number.
fn over_array(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Option<Result<Value, RuntimeError>> {
    let (items, scalar, array_first) = match (left, right) {
        (Value::Array(items), scalar) if scalar.is_number() => (items, scalar, true),
        (scalar, Value::Array(items)) if scalar.is_number() => (items, scalar, false),
        _ => return None,
    };

    let items = items.borrow();

    if items.is_empty() || !all_numbers(&items) {
        return Some(Err(RuntimeError::type_error(operator.line, NUMERIC_ARRAY)));
    }

    let result: Result<Vec<Value>, RuntimeError> = items
        .iter()
        .map(|item| match array_first {
            true => numeric(operator, item, scalar),
            false => numeric(operator, scalar, item),
        })
        .collect();

    Some(result.map(Value::array))
}

#[inline(always)]
fn all_numbers(items: &[Value]) -> bool {
    items.iter().all(Value::is_number)
}

// ─────────────────────────────────────────────────────────────────────────────
// Numbers
// ─────────────────────────────────────────────────────────────────────────────

/// Arithmetic on two numbers.
fn numeric(operator: &Token, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let line: usize = operator.line;

    if !left.is_number() || !right.is_number() {
        let message: &str = match operator.kind {
            TokenType::PLUS => STRINGS_OR_NUMBERS,
            _ => NUMBERS,
        };
        return Err(RuntimeError::type_error(line, message));
    }

    if matches!(
        operator.kind,
        TokenType::SLASH | TokenType::SLASH_SLASH | TokenType::PERCENT
    ) && is_zero(right)
    {
        return Err(RuntimeError::new(
            RuntimeErrorKind::DivideByZero,
            line,
            "Can't divide by zero.",
        ));
    }

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(operator, *a, *b),
        _ => {
            let a: f64 = left.as_f64().unwrap_or_default();
            let b: f64 = right.as_f64().unwrap_or_default();
            Ok(Value::Float(float_op(operator.kind, a, b)))
        }
    }
}

fn int_op(operator: &Token, a: i64, b: i64) -> Result<Value, RuntimeError> {
    let result: Option<i64> = match operator.kind {
        TokenType::PLUS => a.checked_add(b),
        TokenType::MINUS => a.checked_sub(b),
        TokenType::STAR => a.checked_mul(b),
        TokenType::SLASH => return Ok(Value::Float(a as f64 / b as f64)),
        TokenType::SLASH_SLASH => floor_div(a, b),
        TokenType::PERCENT => Some(floor_mod(a, b)),
        TokenType::STAR_STAR => match u32::try_from(b) {
            Ok(exp) => a.checked_pow(exp),
            Err(_) if b < 0 => return Ok(Value::Float((a as f64).powf(b as f64))),
            Err(_) => None,
        },
        _ => None,
    };

    result.map(Value::Int).ok_or_else(|| overflow(operator.line, operator))
}

#[inline(always)]
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q: i64 = a.checked_div(b)?;

    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

#[inline(always)]
fn floor_mod(a: i64, b: i64) -> i64 {
    let r: i64 = a.wrapping_rem(b);

    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn float_op(kind: TokenType, a: f64, b: f64) -> f64 {
    match kind {
        TokenType::PLUS => a + b,
        TokenType::MINUS => a - b,
        TokenType::STAR => a * b,
        TokenType::SLASH => a / b,
        TokenType::SLASH_SLASH => (a / b).floor(),
        TokenType::PERCENT => {
            let r: f64 = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        TokenType::STAR_STAR => a.powf(b),
        _ => f64::NAN,
    }
}

#[inline(always)]
fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(n) => *n == 0,
        Value::Float(n) => *n == 0.0,
        _ => false,
    }
}

fn shift(operator: &Token, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let line: usize = operator.line;

    let (a, b) = match (left, right) {
        (Value::Int(a), Value::Int(b)) => (*a, *b),
        _ => return Err(RuntimeError::type_error(line, "Shift operands must be Ints.")),
    };

    let amount: u32 = u32::try_from(b).map_err(|_| {
        RuntimeError::new(RuntimeErrorKind::Value, line, "Negative shift count.")
    })?;

    let result: Option<i64> = match operator.kind {
        TokenType::LESS_LESS => a
            .checked_shl(amount)
            .filter(|shifted| (shifted >> amount) == a),
        _ => Some(a.checked_shr(amount).unwrap_or(if a < 0 { -1 } else { 0 })),
    };

    result.map(Value::Int).ok_or_else(|| overflow(line, operator))
}

/// `nil` and booleans compare with anything; otherwise both sides must be
/// numbers, strings, or the same reference kind.
fn equals(operator: &Token, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    match (left, right) {
        (Value::Nil | Value::Bool(_), _) | (_, Value::Nil | Value::Bool(_)) => Ok(left == right),
        (l, r) if l.is_number() && r.is_number() => Ok(l == r),
        (Value::Str(_), Value::Str(_)) => Ok(left == right),
        (Value::Int(_) | Value::Float(_) | Value::Str(_), _)
        | (_, Value::Int(_) | Value::Float(_) | Value::Str(_)) => {
            Err(RuntimeError::type_error(operator.line, STRINGS_OR_NUMBERS))
        }
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => Ok(left == right),
        _ => Err(RuntimeError::type_error(operator.line, STRINGS_OR_NUMBERS)),
    }
}

fn compare(operator: &Token, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    let ordering: Option<Ordering> = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (l, r) if l.is_number() && r.is_number() => {
            l.as_f64().zip(r.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
        }
        _ => return Err(RuntimeError::type_error(operator.line, NUMBERS)),
    };

    // NaN compares false against everything.
    let Some(ordering) = ordering else {
        return Ok(Value::Bool(false));
    };

    let result: bool = match operator.kind {
        TokenType::GREATER => ordering == Ordering::Greater,
        TokenType::GREATER_EQUAL => ordering != Ordering::Less,
        TokenType::LESS => ordering == Ordering::Less,
        _ => ordering != Ordering::Greater,
    };

    Ok(Value::Bool(result))
}

fn overflow(line: usize, operator: &Token) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::Value,
        line,
        format!("Integer overflow in '{}'.", operator.lexeme),
    )
}
