//! Pipeline glue: source text → tokens → statements → resolved program →
//! execution. Shared by the CLI and by `import`.

use std::fs::File;
use std::path::Path;

use log::{debug, info};
use memmap2::Mmap;

use crate::error::{Result, RuntimeError, StellarError};
use crate::interpreter::Interpreter;
use crate::keywords::KeywordTable;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Read a UTF‑8 source file through a memory map.
pub fn read_source(path: &Path) -> Result<String> {
    info!("Reading source file: {}", path.display());

    let file: File = File::open(path)?;

    // Mapping a zero‑length file fails on some platforms.
    if file.metadata()?.len() == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is only read while `file` is open and is copied into an
    // owned `String` before returning.
    let map: Mmap = unsafe { Mmap::map(&file)? };
    let text: &str = std::str::from_utf8(&map)?;

    info!("Read {} bytes from {}", text.len(), path.display());

    Ok(text.to_owned())
}

/// Tokenize `source`, returning the tokens (always ending in EOF) and any
/// scan diagnostics.
pub fn scan(source: &str, keywords: &KeywordTable) -> (Vec<Token>, Vec<StellarError>) {
    Scanner::new(source, keywords).scan_all()
}

/// Scan and parse `source`, collecting the diagnostics of both stages.
pub fn parse(source: &str, keywords: &KeywordTable) -> (Vec<Stmt>, Vec<StellarError>) {
    let (tokens, mut diagnostics) = scan(source, keywords);
    let (statements, parse_errors) = Parser::new(&tokens, keywords).parse();

    diagnostics.extend(parse_errors);

    (statements, diagnostics)
}

/// A program that passed every static stage.
#[derive(Debug)]
pub struct Compiled {
    pub statements: Vec<Stmt>,

    /// Resolver warnings; they never block execution.
    pub warnings: Vec<StellarError>,
}

/// Scan, parse and resolve one compilation unit. `Err` carries every
/// diagnostic when at least one of them blocks execution.
pub fn compile(
    interpreter: &mut Interpreter,
    source: &str,
) -> std::result::Result<Compiled, Vec<StellarError>> {
    let keywords = interpreter.keywords();
    let (statements, diagnostics) = parse(source, &keywords);

    if !diagnostics.is_empty() {
        info!("Skipping resolution: {} static error(s)", diagnostics.len());
        return Err(diagnostics);
    }

    let diagnostics: Vec<StellarError> = Resolver::new(interpreter).resolve(&statements);

    if diagnostics.iter().any(StellarError::is_blocking) {
        info!("Skipping execution: resolver reported errors");
        return Err(diagnostics);
    }

    debug!("Compiled {} statement(s)", statements.len());

    Ok(Compiled {
        statements,
        warnings: diagnostics,
    })
}

/// Result of running one compilation unit.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Static diagnostics in stage order: scan and parse, then resolve.
    pub diagnostics: Vec<StellarError>,

    pub runtime_error: Option<RuntimeError>,
}

impl Outcome {
    /// Did any static diagnostic prevent execution?
    pub fn has_static_errors(&self) -> bool {
        self.diagnostics.iter().any(StellarError::is_blocking)
    }

    pub fn is_success(&self) -> bool {
        !self.has_static_errors() && self.runtime_error.is_none()
    }
}

/// Compile and execute `source` on `interpreter`.
pub fn run_source(interpreter: &mut Interpreter, source: &str) -> Outcome {
    match compile(interpreter, source) {
        Err(diagnostics) => Outcome {
            diagnostics,
            runtime_error: None,
        },

        Ok(Compiled {
            statements,
            warnings,
        }) => Outcome {
            diagnostics: warnings,
            runtime_error: interpreter.interpret(&statements).err(),
        },
    }
}
