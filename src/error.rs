//! Centralised error hierarchy for the **Stellar interpreter**.
//!
//! Every stage (scanner, parser, resolver, runtime, CLI) converts its failure
//! modes into one of the variants defined here. Scan, parse and resolve
//! problems are *accumulated* as diagnostics by their stage; runtime problems
//! travel as [`RuntimeError`] values so they can be both logged and returned.
//!
//! The module **does not** print diagnostics itself.

use std::fmt;
use std::io;

use log::info;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StellarError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error. `location` is either ` at 'lexeme'` or ` at end`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure or warning raised by the resolver.
    #[error("[line {line}] {severity}{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
        severity: Severity,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Invalid keyword table supplied by the host.
    #[error("Keyword table error: {0}")]
    Keywords(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// Malformed JSON keyword table.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// How serious a resolver diagnostic is. Only errors block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
        }
    }
}

/// Category of a [`RuntimeError`]; lets hosts and tests tell failures apart
/// without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Type,
    DivideByZero,
    UndefinedVariable,
    UndefinedProperty,
    Arity,
    NotCallable,
    ConstReassignment,
    Redeclaration,
    RecursionLimit,
    Index,
    Import,
    Value,
}

/// An error raised while executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] RuntimeError: {message}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(kind: RuntimeErrorKind, line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: kind={:?}, line={}, msg={}",
            kind, line, message
        );

        RuntimeError {
            kind,
            line,
            message,
        }
    }

    pub fn type_error<S: Into<String>>(line: usize, msg: S) -> Self {
        Self::new(RuntimeErrorKind::Type, line, msg)
    }
}

impl StellarError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        StellarError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, location: String, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        StellarError::Parse {
            message,
            location,
            line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(
        line: usize,
        location: String,
        severity: Severity,
        msg: S,
    ) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve {}: line={}, msg={}",
            severity, line, message
        );

        StellarError::Resolve {
            message,
            location,
            line,
            severity,
        }
    }

    /// Source line of the diagnostic, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            StellarError::Lex { line, .. }
            | StellarError::Parse { line, .. }
            | StellarError::Resolve { line, .. } => Some(*line),
            StellarError::Runtime(e) => Some(e.line),
            _ => None,
        }
    }

    /// `true` for anything but a resolver warning.
    pub fn is_blocking(&self) -> bool {
        !matches!(
            self,
            StellarError::Resolve {
                severity: Severity::Warning,
                ..
            }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, StellarError>;
