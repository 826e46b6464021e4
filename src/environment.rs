use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Environments are shared by every closure created while they were active,
/// so they live behind `Rc<RefCell<_>>`.
pub type SharedEnv = Rc<RefCell<Environment>>;

/// One lexical scope: name → value plus a link to the enclosing scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<SharedEnv>,
}

impl Environment {
    /// A root (global) environment.
    pub fn new() -> SharedEnv {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn with_enclosing(enclosing: SharedEnv) -> SharedEnv {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    /// Bind (or rebind) `name` in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up through the whole chain.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Assign to an existing binding anywhere in the chain.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Read a binding of *this* scope only.
    pub fn get_own(&self, name: &str) -> Option<Value> {
        self.values.get(name).cloned()
    }

    /// Walk exactly `distance` enclosing links.
    pub fn ancestor(env: &SharedEnv, distance: usize) -> Option<SharedEnv> {
        let mut current: SharedEnv = Rc::clone(env);

        for _ in 0..distance {
            let next: SharedEnv = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Read `name` from the scope `distance` hops out, as computed by the
    /// resolver.
    pub fn get_at(env: &SharedEnv, distance: usize, name: &Token) -> Result<Value> {
        Self::ancestor(env, distance)
            .and_then(|scope| scope.borrow().get_own(&name.lexeme))
            .ok_or_else(|| undefined(name))
    }

    pub fn assign_at(env: &SharedEnv, distance: usize, name: &Token, value: Value) -> Result<()> {
        let scope: SharedEnv = Self::ancestor(env, distance).ok_or_else(|| undefined(name))?;
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme, 1)
    }

    #[test]
    fn inner_definition_shadows_without_mutating_outer() {
        let global = Environment::new();
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&global));
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(inner.borrow().get(&name("a")).ok(), Some(Value::Number(2.0)));
        assert_eq!(global.borrow().get(&name("a")).ok(), Some(Value::Number(1.0)));
    }

    #[test]
    fn distance_addressing_walks_exact_hops() {
        let global = Environment::new();
        let middle = Environment::with_enclosing(Rc::clone(&global));
        let inner = Environment::with_enclosing(Rc::clone(&middle));

        middle.borrow_mut().define("x", Value::Bool(true));

        assert_eq!(
            Environment::get_at(&inner, 1, &name("x")).ok(),
            Some(Value::Bool(true))
        );
        assert!(Environment::get_at(&inner, 0, &name("x")).is_err());
        assert!(Environment::ancestor(&inner, 3).is_none());

        Environment::assign_at(&inner, 1, &name("x"), Value::Nil).unwrap();
        assert_eq!(middle.borrow().get_own("x"), Some(Value::Nil));
    }

    #[test]
    fn assigning_an_undefined_name_fails() {
        let global = Environment::new();
        let err = global
            .borrow_mut()
            .assign(&name("missing"), Value::Nil)
            .unwrap_err();

        assert_eq!(err.message(), "Undefined variable 'missing'.");
    }
}
