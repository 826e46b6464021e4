//! Invocable runtime values: user closures and native built‑ins.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Result};
use crate::instance::Instance;
use crate::interpreter::{Completion, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Anything that can appear on the left of `(...)` apart from a class.
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),
            Callable::Native(native) => native.arity,
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Native(_) => write!(f, "<native fn>"),
        }
    }
}

/// A closure: declaration + the environment that was active when it was
/// declared.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: SharedEnv,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: SharedEnv, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure gains one innermost scope binding
    /// `this` to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let environment: SharedEnv = Environment::with_enclosing(Rc::clone(&self.closure));
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// Run the body in a fresh child of the closure.  Arity has already been
    /// checked by the caller.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value> {
        debug!("Calling '{}' with {} argument(s)", self.name(), arguments.len());

        let environment: SharedEnv = Environment::with_enclosing(Rc::clone(&self.closure));

        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let completion: Completion = interpreter.execute_block(&self.declaration.body, environment);

        if self.is_initializer {
            return self.closure.borrow().get_own("this").ok_or_else(|| {
                LoxError::runtime(&self.declaration.name, "Initializer is not bound to an instance.")
            });
        }

        match completion {
            Completion::Return(value) => Ok(value),
            Completion::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

/// Host‑implemented function.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
