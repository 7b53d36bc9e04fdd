//! Stellar: a tree‑walking interpreter for a small dynamically typed,
//! class‑based scripting language.
//!
//! ```
//! use std::rc::Rc;
//! use stellar::driver;
//! use stellar::interpreter::Interpreter;
//! use stellar::keywords::KeywordTable;
//!
//! let mut interpreter = Interpreter::new(Rc::new(KeywordTable::default()))
//!     .with_output(std::io::sink());
//! let outcome = driver::run_source(&mut interpreter, "var a = 1; print a + 2;");
//! assert!(outcome.is_success());
//! ```

pub mod arithmetic;
pub mod ast_printer;
pub mod builtins;
pub mod driver;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod keywords;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;
