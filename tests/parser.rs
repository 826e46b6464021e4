use pretty_assertions::assert_eq;

use locks::ast_printer::AstPrinter;
use locks::parser::Parser;
use locks::runner;
use locks::stmt::Stmt;

fn print_tree(source: &str) -> String {
    match runner::parse(source) {
        Ok(statements) => AstPrinter::print_program(&statements),
        Err(errors) => panic!("unexpected parse errors: {:?}", errors),
    }
}

fn parse_errors(source: &str) -> Vec<String> {
    match runner::parse(source) {
        Ok(_) => panic!("expected parse errors for {:?}", source),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(
        print_tree("print -1 + 2 * 3 == (4 - 5) / 6;"),
        "(print (== (+ (- 1) (* 2 3)) (/ (group (- 4 5)) 6)))"
    );
}

#[test]
fn comparison_binds_tighter_than_logic() {
    assert_eq!(
        print_tree("print a < 1 or b >= 2 and !c;"),
        "(print (or (< a 1) (and (>= b 2) (! c))))"
    );
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(print_tree("a = b = 3;"), "(; (= a (= b 3)))");
}

#[test]
fn property_chains_and_calls() {
    assert_eq!(
        print_tree("a.b(1, \"two\").c = nil;"),
        "(; (.= (call (. a b) 1 \"two\") c nil))"
    );
}

#[test]
fn declarations() {
    let source = "var x; var y = 2.5;\n\
                  fun add(a, b) { return a + b; }\n\
                  class B < A { init(n) { this.n = n; } get() { return super.get(); } }";

    assert_eq!(
        print_tree(source),
        "(var x)\n\
         (var y 2.5)\n\
         (fun add(a b) (return (+ a b)))\n\
         (class B < A (method init(n) (; (.= this n n))) (method get() (return (call (super get)))))"
    );
}

#[test]
fn for_loop_is_desugared_into_while() {
    assert_eq!(
        print_tree("for (var i = 0; i < 3; i = i + 1) print i;"),
        "(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"
    );
}

#[test]
fn empty_for_clauses_loop_forever() {
    assert_eq!(
        print_tree("for (;;) { return; }"),
        "(while true (block (return)))"
    );
}

#[test]
fn if_else_attaches_to_nearest_if() {
    assert_eq!(
        print_tree("if (a) if (b) print 1; else print 2;"),
        "(if a (if b (print 1) (print 2)))"
    );
}

#[test]
fn every_syntax_error_is_reported() {
    let errors = parse_errors("var = 1;\nprint (2;\nprint 3;\nfun (a) {}");

    assert_eq!(
        errors,
        vec![
            "At line 1.\n\tError at '=': Expect variable name.",
            "At line 2.\n\tError at ';': Expect ')' after expression.",
            "At line 4.\n\tError at '(': Expect function name.",
        ]
    );
}

#[test]
fn missing_semicolon_at_end_of_input() {
    assert_eq!(
        parse_errors("print 1"),
        vec!["At line 1.\n\tError at end: Expect ';' after value."]
    );
}

#[test]
fn invalid_assignment_target_does_not_unwind() {
    let errors = parse_errors("1 + 2 = 3; print 4");

    assert_eq!(
        errors,
        vec![
            "At line 1.\n\tError at '=': Invalid assignment target.",
            "At line 1.\n\tError at end: Expect ';' after value.",
        ]
    );
}

#[test]
fn too_many_arguments() {
    let arguments: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({});", arguments.join(", "));

    let errors = parse_errors(&source);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("Can't have more than 255 arguments."));
}

#[test]
fn too_many_parameters() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let errors = parse_errors(&source);
    assert_eq!(
        errors,
        vec!["At line 1.\n\tError at 'p255': Can't have more than 255 parameters."]
    );
}

#[test]
fn max_parameters_are_accepted() {
    let params: Vec<String> = (0..255).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    assert!(runner::parse(&source).is_ok());
}

#[test]
fn lexical_and_syntax_errors_are_combined() {
    let errors = parse_errors("var a = 1 @ 2;");

    assert_eq!(
        errors,
        vec![
            "At line 1.\n\tError: Unexpected character: @",
            "At line 1.\n\tError at '2': Expect ';' after variable declaration.",
        ]
    );
}

#[test]
fn parser_appends_missing_eof() {
    let statements: Vec<Stmt> = Parser::new(Vec::new())
        .parse()
        .unwrap_or_else(|errors| panic!("unexpected errors: {:?}", errors));

    assert!(statements.is_empty());
}
