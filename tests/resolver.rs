mod common;

use std::io;

use pretty_assertions::assert_eq;

use locks::diagnostics::Diagnostics;
use locks::interpreter::Interpreter;
use locks::resolver::Resolver;
use locks::runner::{self, Outcome};

fn resolve_errors(source: &str) -> Vec<String> {
    let statements = runner::parse(source)
        .unwrap_or_else(|errors| panic!("unexpected parse errors: {:?}", errors));

    let mut interpreter = Interpreter::with_output(Box::new(io::sink()), Diagnostics::silent());

    match Resolver::new(&mut interpreter).resolve(&statements) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn valid_program_resolves_cleanly() {
    let source = "var a = 1;\n\
                  fun f(x) { var y = x; { var y = a; return y; } }\n\
                  class A { init() { this.v = 1; return; } }\n\
                  class B < A { m() { return super.init; } }";

    assert_eq!(resolve_errors(source), Vec::<String>::new());
}

#[test]
fn redeclaration_in_same_local_scope() {
    assert_eq!(
        resolve_errors("{ var a = 1; var a = 2; }"),
        vec!["At line 1.\n\tError at 'a': Already a variable with this name in this scope."]
    );
}

#[test]
fn global_redeclaration_is_allowed() {
    assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
}

#[test]
fn reading_local_in_its_own_initializer() {
    assert_eq!(
        resolve_errors("var a = 1; { var a = a; }"),
        vec!["At line 1.\n\tError at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn return_outside_function() {
    assert_eq!(
        resolve_errors("return 1;"),
        vec!["At line 1.\n\tError at 'return': Can't return from top-level code."]
    );
}

#[test]
fn initializer_may_not_return_a_value() {
    assert_eq!(
        resolve_errors("class C {\n  init(x) { this.x = x; return x; }\n}"),
        vec!["At line 2.\n\tError at 'return': Can't return a value from an initializer."]
    );
}

#[test]
fn class_cannot_inherit_from_itself() {
    assert_eq!(
        resolve_errors("class Oops < Oops {}"),
        vec!["At line 1.\n\tError at 'Oops': A class can't inherit from itself."]
    );
}

#[test]
fn misplaced_this_and_super() {
    let errors = resolve_errors(
        "print this;\n\
         fun f() { return super.m; }\n\
         class A { m() { return super.m(); } }",
    );

    assert_eq!(
        errors,
        vec![
            "At line 1.\n\tError at 'this': Can't use 'this' outside of a class.",
            "At line 2.\n\tError at 'super': Can't use 'super' outside of a class.",
            "At line 3.\n\tError at 'super': Can't use 'super' in a class with no superclass.",
        ]
    );
}

#[test]
fn resolution_continues_after_an_error() {
    let errors = resolve_errors("return;\n{ var b; var b; }\nreturn;");

    assert_eq!(errors.len(), 3);
}

#[test]
fn static_errors_skip_execution() {
    let run = common::run("print \"before\";\nreturn;");

    assert_eq!(run.outcome, Outcome::StaticError);
    assert_eq!(run.output, "");
    assert!(run.diagnostics.had_error());
    assert_eq!(
        run.diagnostics.messages(),
        vec!["Can't return from top-level code."]
    );
}
