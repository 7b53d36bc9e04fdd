//! Helpers shared by the integration tests: an in-memory output sink and
//! shortcuts for running a program on a fresh or existing interpreter.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use stellar::driver::{self, Outcome};
use stellar::interpreter::Interpreter;
use stellar::keywords::KeywordTable;

/// A `Write` sink the test keeps a handle to after giving it away.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    /// Drain everything written so far.
    pub fn take(&self) -> String {
        let bytes: Vec<u8> = std::mem::take(&mut *self.0.borrow_mut());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A fresh interpreter whose `print` output lands in the returned buffer.
pub fn interpreter_with(keywords: KeywordTable) -> (Interpreter, SharedBuffer) {
    let buffer: SharedBuffer = SharedBuffer::default();
    let interpreter: Interpreter =
        Interpreter::new(Rc::new(keywords)).with_output(buffer.clone());

    (interpreter, buffer)
}

pub fn interpreter() -> (Interpreter, SharedBuffer) {
    interpreter_with(KeywordTable::default())
}

/// Run `source` on a fresh interpreter with the default keywords.
pub fn run(source: &str) -> (String, Outcome) {
    let (mut interpreter, buffer) = interpreter();
    let outcome: Outcome = driver::run_source(&mut interpreter, source);

    (buffer.contents(), outcome)
}

/// Run `source` and return its output lines, failing on any error.
pub fn run_ok(source: &str) -> Vec<String> {
    let (output, outcome) = run(source);

    assert!(
        outcome.is_success(),
        "program failed: {:?}\noutput so far:\n{}",
        outcome,
        output
    );

    output.lines().map(str::to_owned).collect()
}

/// Run another unit on an existing interpreter, returning only the output
/// it produced.
pub fn run_more(
    interpreter: &mut Interpreter,
    buffer: &SharedBuffer,
    source: &str,
) -> (String, Outcome) {
    buffer.take();
    let outcome: Outcome = driver::run_source(interpreter, source);

    (buffer.take(), outcome)
}
