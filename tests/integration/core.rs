use crate::common::{eval_source, eval_with, ints};
use elle_ioc::{CompileOptions, Host, Value};

// ============================================================================
// Literals and aggregates
// ============================================================================

#[test]
fn test_literals() {
    assert_eq!(eval_source("42").unwrap(), Value::int(42));
    assert_eq!(eval_source("2.5").unwrap(), Value::float(2.5));
    assert_eq!(eval_source("\"hi\"").unwrap(), Value::string("hi"));
    assert_eq!(eval_source(":k").unwrap(), Value::keyword("k"));
    assert_eq!(eval_source("nil").unwrap(), Value::Nil);
    assert_eq!(eval_source("true").unwrap(), Value::bool(true));
}

#[test]
fn test_quote_is_data() {
    assert_eq!(
        eval_source("'(a 1)").unwrap(),
        Value::list(vec![Value::symbol("a"), Value::int(1)])
    );
    assert_eq!(eval_source("(quote x)").unwrap(), Value::symbol("x"));
}

#[test]
fn test_aggregates_build_values() {
    assert_eq!(eval_source("[1 (+ 1 1) 3]").unwrap(), Value::vector(ints(&[1, 2, 3])));
    assert_eq!(eval_source("(get {:a 1 :b 2} :b)").unwrap(), Value::int(2));
    assert_eq!(eval_source("(count #{1 2 2 3})").unwrap(), Value::int(3));
}

#[test]
fn test_keyword_and_map_are_callable() {
    assert_eq!(eval_source("(:a {:a 1})").unwrap(), Value::int(1));
    assert_eq!(eval_source("({:a 1} :a)").unwrap(), Value::int(1));
}

// ============================================================================
// Sequencing and bindings
// ============================================================================

#[test]
fn test_do_yields_last() {
    assert_eq!(eval_source("(do 1 2 3)").unwrap(), Value::int(3));
    assert_eq!(eval_source("(do)").unwrap(), Value::Nil);
}

#[test]
fn test_let_is_sequential() {
    assert_eq!(eval_source("(let [a 1 b (+ a 1)] (* a b 10))").unwrap(), Value::int(20));
}

#[test]
fn test_let_scope_is_restored() {
    assert_eq!(eval_source("(let [x 1] (let [x 2] x) x)").unwrap(), Value::int(1));
    assert_eq!(
        eval_source("(let [x 1] [(let [x 2 y x] y) x])").unwrap(),
        Value::vector(ints(&[2, 1]))
    );
}

#[test]
fn test_set_local() {
    assert_eq!(eval_source("(let [x 1] (set! x (+ x 10)) x)").unwrap(), Value::int(11));
}

#[test]
fn test_set_does_not_alias_copied_binding() {
    assert_eq!(
        eval_source("(let [x 1 y x] (set! x 5) [x y])").unwrap(),
        Value::vector(ints(&[5, 1]))
    );
    // initializers that evaluate to an existing local are copied too
    assert_eq!(eval_source("(let [a 1 x (do a)] (set! x 5) a)").unwrap(), Value::int(1));
    assert_eq!(
        eval_source("(let [a 1 x (let [b 2] a)] (set! a 7) [a x])").unwrap(),
        Value::vector(ints(&[7, 1]))
    );
}

#[test]
fn test_globals() {
    let host = Host::with_primitives();
    host.define("base", Value::int(100));
    let result = eval_with("(do (set! base (+ base 1)) base)", &CompileOptions::new(), &host);
    assert_eq!(result.unwrap(), Value::int(101));
    assert_eq!(host.lookup("base"), Some(Value::int(101)));
}

#[test]
fn test_undefined_global_faults() {
    let err = eval_source("(+ nope 1)").unwrap_err();
    assert!(err.contains("undefined-variable"), "{}", err);
    let err = eval_source("(set! nope 1)").unwrap_err();
    assert!(err.contains("undefined-variable"), "{}", err);
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_if() {
    assert_eq!(eval_source("(if (< 1 2) :yes :no)").unwrap(), Value::keyword("yes"));
    assert_eq!(eval_source("(if nil :yes :no)").unwrap(), Value::keyword("no"));
    assert_eq!(eval_source("(if false :yes)").unwrap(), Value::Nil);
    // only nil and false are falsy
    assert_eq!(eval_source("(if 0 :yes :no)").unwrap(), Value::keyword("yes"));
}

#[test]
fn test_case() {
    assert_eq!(
        eval_source("(case 2 1 :one (2 3) :two-or-three :other)").unwrap(),
        Value::keyword("two-or-three")
    );
    assert_eq!(eval_source("(case :z :a 1 :b 2 0)").unwrap(), Value::int(0));
    assert_eq!(eval_source("(case \"s\" \"s\" 1 2)").unwrap(), Value::int(1));
}

#[test]
fn test_case_without_match_faults() {
    let err = eval_source("(case 5 1 :one)").unwrap_err();
    assert!(err.contains("no-matching-clause"), "{}", err);
}

#[test]
fn test_explicit_return() {
    assert_eq!(eval_source("(do (return 7) 8)").unwrap(), Value::int(7));
    assert_eq!(eval_source("(if true (return :early) 1)").unwrap(), Value::keyword("early"));
}

#[test]
fn test_sugar_forms() {
    assert_eq!(eval_source("(when (> 2 1) :a :b)").unwrap(), Value::keyword("b"));
    assert_eq!(eval_source("(-> 1 (+ 2) (* 3))").unwrap(), Value::int(9));
}

#[test]
fn test_primitive_faults_surface() {
    let err = eval_source("(/ 1 0)").unwrap_err();
    assert!(err.contains("division-by-zero"), "{}", err);
    let err = eval_source("(+ 1 \"a\")").unwrap_err();
    assert!(err.contains("type-error"), "{}", err);
    let err = eval_source("(1 2)").unwrap_err();
    assert!(err.contains("not callable"), "{}", err);
}
