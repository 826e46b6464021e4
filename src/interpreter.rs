//! Tree‑walking evaluator.
//!
//! Statements execute for their effects and yield a [`Completion`]; `return`
//! is a `Completion::Return` that every statement sequence propagates upward
//! until the enclosing [`Function::call`] consumes it.  Runtime errors are
//! `Err(LoxError::Runtime)` and are caught at the nearest block boundary,
//! reported, and execution resumes with the next statement.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, trace};

use crate::callable::{Callable, Function, NativeFunction};
use crate::class::{Class, INITIALIZER};
use crate::diagnostics::Diagnostics;
use crate::environment::{Environment, SharedEnv};
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, LiteralValue, Variable};
use crate::instance::Instance;
use crate::stmt::{ClassDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: SharedEnv,
    environment: SharedEnv,
    /// Resolver side‑table: reference node → scope distance.  Absent means
    /// global.
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    diagnostics: Diagnostics,
}

impl Interpreter {
    /// An interpreter printing to stdout.
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self::with_output(Box::new(io::stdout()), diagnostics)
    }

    /// An interpreter printing to `out`.  Defines native functions such as
    /// `clock`.
    pub fn with_output(out: Box<dyn Write>, diagnostics: Diagnostics) -> Self {
        info!("Initializing Interpreter");

        let globals: SharedEnv = Environment::new();

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name: "clock",
                arity: 0,
                func: |_args: &[Value]| {
                    let seconds: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(seconds))
                },
            }))),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            diagnostics,
        }
    }

    /// Record a local reference's scope distance.  Called by the resolver.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        trace!("side-table: {:?} -> {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program") in the current scope.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        info!("Interpreting {} statement(s)", statements.len());

        let environment: SharedEnv = Rc::clone(&self.environment);
        if let Completion::Return(value) = self.execute_block(statements, environment) {
            debug!("Top-level return of {} ignored", value);
        }

        if let Err(e) = self.out.flush() {
            self.diagnostics.report(LoxError::Io(e));
        }

        info!("Interpretation finished");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `statements` inside `environment`, restoring the previous scope
    /// afterwards.  A failing statement is reported and skipped.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: SharedEnv) -> Completion {
        let previous: SharedEnv = mem::replace(&mut self.environment, environment);
        let mut completion = Completion::Normal;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Completion::Normal) => {}
                Ok(Completion::Return(value)) => {
                    completion = Completion::Return(value);
                    break;
                }
                Err(e) => {
                    debug!("Runtime debug: {}", e);
                    self.diagnostics.report(e);
                }
            }
        }

        self.environment = previous;
        completion
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Completion> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                let text: String = self.stringify(&value)?;
                writeln!(self.out, "{}", text)?;
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.lexeme);
                self.environment.borrow_mut().define(&name.lexeme, value);
            }

            Stmt::Block(statements) => {
                let environment: SharedEnv = Environment::with_enclosing(Rc::clone(&self.environment));
                return Ok(self.execute_block(statements, environment));
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Completion::Return(value) = self.execute(body)? {
                        return Ok(Completion::Return(value));
                    }
                }
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
            }

            Stmt::Class(declaration) => self.execute_class(declaration)?,

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                trace!("Returning value: {}", value);
                return Ok(Completion::Return(value));
            }
        }

        Ok(Completion::Normal)
    }

    fn execute_class(&mut self, declaration: &ClassDecl) -> Result<()> {
        debug!("Defining class '{}'", declaration.name.lexeme);

        let superclass: Option<Rc<Class>> = match &declaration.superclass {
            Some(variable) => match self.look_up_variable(&variable.name, variable.id)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(LoxError::runtime(
                        &variable.name,
                        "Superclass must be a class.",
                    ))
                }
            },
            None => None,
        };

        // Declared first so methods can refer to the class by name.
        self.environment
            .borrow_mut()
            .define(&declaration.name.lexeme, Value::Nil);

        let enclosing: SharedEnv = Rc::clone(&self.environment);

        let method_scope: SharedEnv = match &superclass {
            Some(superclass) => {
                let scope = Environment::with_enclosing(Rc::clone(&enclosing));
                scope
                    .borrow_mut()
                    .define("super", Value::Class(Rc::clone(superclass)));
                scope
            }
            None => Rc::clone(&enclosing),
        };

        let methods: HashMap<String, Rc<Function>> = declaration
            .methods
            .iter()
            .map(|method| {
                let function = Function::new(
                    Rc::clone(method),
                    Rc::clone(&method_scope),
                    method.name.lexeme == INITIALIZER,
                );
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class::new(declaration.name.lexeme.clone(), superclass, methods);

        enclosing
            .borrow_mut()
            .assign(&declaration.name, Value::Class(Rc::new(class)))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::MINUS => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
                    _ => Err(LoxError::runtime(operator, "Invalid unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                self.binary(left, operator, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let decided: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(Variable { name, id }) => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(LoxError::runtime(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),

            Expr::Super {
                keyword,
                method,
                id,
            } => self.evaluate_super(keyword, method, *id),
        }
    }

    fn binary(&mut self, left: Value, operator: &Token, right: Value) -> Result<Value> {
        use Value::{Bool, Number};

        let numbers = || -> Result<Value> {
            Err(LoxError::runtime(operator, "Operands must be numbers."))
        };

        match operator.token_type {
            TokenType::EQUAL_EQUAL => Ok(Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Bool(left != right)),

            TokenType::PLUS => match (left, right) {
                (Number(a), Number(b)) => Ok(Number(a + b)),
                (Value::Str(a), right) => {
                    let right: String = self.stringify(&right)?;
                    Ok(Value::from(format!("{}{}", a, right)))
                }
                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or start with a string.",
                )),
            },

            TokenType::MINUS => match (left, right) {
                (Number(a), Number(b)) => Ok(Number(a - b)),
                _ => numbers(),
            },
            TokenType::STAR => match (left, right) {
                (Number(a), Number(b)) => Ok(Number(a * b)),
                _ => numbers(),
            },
            TokenType::SLASH => match (left, right) {
                (Number(a), Number(b)) => Ok(Number(a / b)),
                _ => numbers(),
            },

            TokenType::LESS => match (left, right) {
                (Number(a), Number(b)) => Ok(Bool(a < b)),
                _ => numbers(),
            },
            TokenType::LESS_EQUAL => match (left, right) {
                (Number(a), Number(b)) => Ok(Bool(a <= b)),
                _ => numbers(),
            },
            TokenType::GREATER => match (left, right) {
                (Number(a), Number(b)) => Ok(Bool(a > b)),
                _ => numbers(),
            },
            TokenType::GREATER_EQUAL => match (left, right) {
                (Number(a), Number(b)) => Ok(Bool(a >= b)),
                _ => numbers(),
            },

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, keyword: &Token, method: &Token, id: ExprId) -> Result<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| LoxError::runtime(keyword, "Unresolved 'super'."))?;

        let superclass: Rc<Class> = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Class(class) => class,
            _ => return Err(LoxError::runtime(keyword, "Superclass must be a class.")),
        };

        // `this` always lives one scope inside the `super` scope.
        let this_token = Token::synthetic("this", keyword.line);
        let instance: Rc<RefCell<Instance>> =
            match Environment::get_at(&self.environment, distance.saturating_sub(1), &this_token)? {
                Value::Instance(instance) => instance,
                _ => return Err(LoxError::runtime(keyword, "'super' used without an instance.")),
            };

        let function: Rc<Function> = superclass.find_method(&method.lexeme).ok_or_else(|| {
            LoxError::runtime(method, format!("Undefined property '{}'.", method.lexeme))
        })?;

        Ok(Value::Callable(Callable::Function(Rc::new(
            function.bind(instance),
        ))))
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Invoke `callee` after checking it is invocable and the argument count
    /// matches its arity.
    fn call_value(&mut self, callee: Value, paren: &Token, arguments: Vec<Value>) -> Result<Value> {
        let arity: usize = match &callee {
            Value::Callable(callable) => callable.arity(),
            Value::Class(class) => class.arity(),
            _ => {
                return Err(LoxError::runtime(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        };

        if arguments.len() != arity {
            return Err(LoxError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    arity,
                    arguments.len()
                ),
            ));
        }

        match callee {
            Value::Callable(Callable::Function(function)) => function.call(self, arguments),

            Value::Callable(Callable::Native(native)) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&arguments).map_err(|message| LoxError::runtime(paren, message))
            }

            Value::Class(class) => Class::construct(&class, self, arguments),

            _ => Err(LoxError::runtime(
                paren,
                "Can only call functions and classes.",
            )),
        }
    }

    /// Text shown by `print` and used by string `+`.  An instance whose class
    /// has a zero‑argument `tostr` method is rendered through it, one level
    /// deep: whatever `tostr` returns gets the default rendering.
    pub fn stringify(&mut self, value: &Value) -> Result<String> {
        if let Value::Instance(instance) = value {
            let tostr: Option<Rc<Function>> = instance.borrow().class.find_method("tostr");

            if let Some(tostr) = tostr.filter(|method| method.arity() == 0) {
                let result: Value = tostr.bind(Rc::clone(instance)).call(self, Vec::new())?;
                return Ok(result.to_string());
            }
        }

        Ok(value.to_string())
    }
}
