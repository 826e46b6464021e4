#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use locks::diagnostics::Diagnostics;
use locks::runner::{Outcome, Runner};

/// In‑memory `print` sink that the test keeps a handle to.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Run {
    pub output: String,
    pub outcome: Outcome,
    pub diagnostics: Diagnostics,
}

impl Run {
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

/// A runner whose output the caller can inspect between runs.
pub fn session() -> (Runner, SharedBuf) {
    let buf = SharedBuf::default();
    let runner = Runner::with_output(Box::new(buf.clone()), Diagnostics::silent());
    (runner, buf)
}

/// Run one program in a fresh session.
pub fn run(source: &str) -> Run {
    let (mut runner, buf) = session();
    let outcome = runner.run(source);

    Run {
        output: buf.contents(),
        outcome,
        diagnostics: runner.diagnostics().clone(),
    }
}
