//! Shared helpers for the integration tests: an inspectable output sink and
//! run-to-completion drivers.

use std::{
    cell::RefCell,
    error::Error,
    io::{self, Write},
    rc::Rc,
};

use dungeontalk::interpreter::Interpreter;

/// A `Write` sink that can be read back after the interpreter is done with
/// it.
#[derive(Clone, Default)]
pub struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Build an interpreter with a capturing sink.
pub fn capturing_interpreter() -> (Interpreter, SharedSink) {
    let sink = SharedSink::new();
    let interpreter = Interpreter::with_sink(Box::new(sink.clone()));
    (interpreter, sink)
}

/// Load and run a source to end of program; returns the finished
/// interpreter and everything it printed.
pub fn run(source: &str) -> Result<(Interpreter, String), Box<dyn Error>> {
    let (mut interpreter, sink) = capturing_interpreter();
    interpreter.read(source, false)?;
    interpreter.run()?;
    Ok((interpreter, sink.contents()))
}

pub struct Expected {
    pub stdout: &'static str,
}

/// Run a source and compare its output.
pub fn check_output(source: &str, expected: Expected) -> Result<(), Box<dyn Error>> {
    let (_, stdout) = run(source)?;
    assert_eq!(expected.stdout, stdout);
    Ok(())
}
