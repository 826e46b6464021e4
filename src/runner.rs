//! Entry point for one compilation unit: Scanner → Parser → Resolver →
//! Interpreter, stopping after any stage that reported a static error.

use std::io::Write;

use log::info;

use crate::diagnostics::Diagnostics;
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Result category of a run, mapped onto the driver's exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    StaticError,
    RuntimeError,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Ok => 0,
            Outcome::StaticError => 65,
            Outcome::RuntimeError => 70,
        }
    }
}

/// Scan `source` completely, separating tokens from lexical errors.
pub fn scan(source: &str) -> (Vec<Token>, Vec<LoxError>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors: Vec<LoxError> = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}

/// Scan and parse `source`.  Lexical and syntax errors are returned together.
pub fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = scan(source);

    match Parser::new(tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}

/// Long‑lived interpreter session.  Globals and resolved closures persist
/// from one [`Runner::run`] to the next.
pub struct Runner {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Runner {
    /// A runner printing program output to stdout.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            interpreter: Interpreter::new(diagnostics.clone()),
            diagnostics,
        }
    }

    /// A runner printing program output to `out`.
    pub fn with_output(out: Box<dyn Write>, diagnostics: Diagnostics) -> Self {
        Self {
            interpreter: Interpreter::with_output(out, diagnostics.clone()),
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run one compilation unit.
    pub fn run(&mut self, source: &str) -> Outcome {
        info!("Running {} bytes of source", source.len());

        let statements: Vec<Stmt> = match parse(source) {
            Ok(statements) => statements,
            Err(errors) => {
                self.diagnostics.report_all(errors);
                return Outcome::StaticError;
            }
        };

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.diagnostics.report_all(errors);
            return Outcome::StaticError;
        }

        self.interpreter.interpret(&statements);

        if self.diagnostics.had_runtime_error() {
            Outcome::RuntimeError
        } else {
            Outcome::Ok
        }
    }
}
