use crate::common::{drive, eval_fault, eval_source, eval_with};
use elle_ioc::{CompileOptions, Host, Value};
use std::rc::Rc;

fn counting_host() -> Rc<Host> {
    let host = Host::with_primitives();
    host.define("finally-runs", Value::int(0));
    host
}

fn finally_runs(host: &Host) -> Value {
    host.lookup("finally-runs").unwrap()
}

const BUMP: &str = "(set! finally-runs (+ finally-runs 1))";

// ============================================================================
// Catch
// ============================================================================

#[test]
fn test_catch_default() {
    assert_eq!(
        eval_source("(try (throw 42) (catch :default e (+ e 1)))").unwrap(),
        Value::int(43)
    );
}

#[test]
fn test_try_value_without_fault() {
    assert_eq!(eval_source("(try (+ 1 2) (catch :default e 0))").unwrap(), Value::int(3));
}

#[test]
fn test_catch_by_error_kind() {
    let src = "(try (throw (error :timeout \"slow\"))
                 (catch io-error e :io)
                 (catch timeout e (ex-message e)))";
    assert_eq!(eval_source(src).unwrap(), Value::string("slow"));
}

#[test]
fn test_catch_error_matches_any_error_value() {
    assert_eq!(
        eval_source("(try (/ 1 0) (catch error e (ex-kind e)))").unwrap(),
        Value::keyword("division-by-zero")
    );
}

#[test]
fn test_first_matching_clause_wins() {
    let src = "(try (throw :x) (catch keyword e 1) (catch :default e 2))";
    assert_eq!(eval_source(src).unwrap(), Value::int(1));
}

#[test]
fn test_catch_record_by_type_name() {
    let src = "(try (throw (record 'NotFound :id 7)) (catch NotFound e (.-id e)))";
    assert_eq!(eval_source(src).unwrap(), Value::int(7));
}

#[test]
fn test_unmatched_fault_rethrows() {
    let host = Host::with_primitives();
    let fault = eval_fault("(try (throw :boom) (catch integer e e))", &host);
    assert_eq!(fault.value, Value::keyword("boom"));
}

#[test]
fn test_nested_try_rethrows_to_outer() {
    let src = "(try
                 (try (throw 5) (catch string e :inner))
                 (catch integer e (* e 2)))";
    assert_eq!(eval_source(src).unwrap(), Value::int(10));
}

#[test]
fn test_fault_from_catch_body_reaches_outer_handler() {
    let src = "(try
                 (try (throw 1) (catch :default e (throw (+ e 1))))
                 (catch :default e (+ e 10)))";
    assert_eq!(eval_source(src).unwrap(), Value::int(12));
}

#[test]
fn test_set_before_fault_is_visible_in_catch() {
    let src = "(let [x 1] (try (do (set! x 2) (throw :e)) (catch :default e x)))";
    assert_eq!(eval_source(src).unwrap(), Value::int(2));
}

#[test]
fn test_handler_stack_is_clean_after_try() {
    // a fault after a completed try must not route into its handlers
    let host = Host::with_primitives();
    let fault = eval_fault("(do (try 1 (catch :default e :caught)) (throw :later))", &host);
    assert_eq!(fault.value, Value::keyword("later"));
}

#[test]
fn test_throw_nil_is_rejected() {
    let host = Host::with_primitives();
    let fault = eval_fault("(throw nil)", &host);
    assert_eq!(fault.kind(), Some("type-error"));
}

// ============================================================================
// Finally
// ============================================================================

#[test]
fn test_finally_on_normal_path_runs_once() {
    let host = counting_host();
    let src = format!("(try 42 (finally {}))", BUMP);
    assert_eq!(eval_with(&src, &CompileOptions::new(), &host).unwrap(), Value::int(42));
    assert_eq!(finally_runs(&host), Value::int(1));
}

#[test]
fn test_finally_after_catch_runs_once() {
    let host = counting_host();
    let src = format!("(try (throw :x) (catch :default e :caught) (finally {}))", BUMP);
    assert_eq!(
        eval_with(&src, &CompileOptions::new(), &host).unwrap(),
        Value::keyword("caught")
    );
    assert_eq!(finally_runs(&host), Value::int(1));
}

#[test]
fn test_finally_without_catch_rethrows() {
    let host = counting_host();
    let src = format!("(try (throw :x) (finally {}))", BUMP);
    let fault = eval_fault(&src, &host);
    assert_eq!(fault.value, Value::keyword("x"));
    assert_eq!(finally_runs(&host), Value::int(1));
}

#[test]
fn test_finally_runs_when_catch_body_faults() {
    let host = counting_host();
    let src = format!("(try (throw :a) (catch :default e (throw :b)) (finally {}))", BUMP);
    let fault = eval_fault(&src, &host);
    assert_eq!(fault.value, Value::keyword("b"));
    assert_eq!(finally_runs(&host), Value::int(1));
}

#[test]
fn test_finally_value_is_discarded() {
    assert_eq!(eval_source("(try 100 (finally 999))").unwrap(), Value::int(100));
}

#[test]
fn test_nested_finally_order() {
    let host = Host::with_primitives();
    host.define("trail", Value::vector(vec![]));
    let src = "(try
                 (try (throw :x) (finally (set! trail (conj trail :inner))))
                 (catch :default e (set! trail (conj trail :caught)))
                 (finally (set! trail (conj trail :outer))))";
    eval_with(src, &CompileOptions::new(), &host).unwrap();
    assert_eq!(
        host.lookup("trail").unwrap(),
        Value::vector(vec![
            Value::keyword("inner"),
            Value::keyword("caught"),
            Value::keyword("outer"),
        ])
    );
}

#[test]
fn test_try_inside_finally_keeps_outer_fault() {
    let host = counting_host();
    let src = format!(
        "(try (throw :x) (finally (try (throw :y) (catch :default e nil)) {}))",
        BUMP
    );
    let fault = eval_fault(&src, &host);
    assert_eq!(fault.value, Value::keyword("x"));
    assert_eq!(finally_runs(&host), Value::int(1));
}

#[test]
fn test_outer_catch_sees_fault_from_inner_finally() {
    let src = "(try
                 (try (throw :x) (finally (try (throw :y) (catch :default e nil))))
                 (catch :default e e))";
    assert_eq!(eval_source(src).unwrap(), Value::keyword("x"));
}

#[test]
fn test_pending_fault_survives_suspension_in_finally() {
    let (yielded, result) = drive("(try (try (throw :x) (finally (yield 1))) (catch :default e e))", &[]).unwrap();
    assert_eq!(yielded, vec![Value::int(1)]);
    assert_eq!(result, Value::keyword("x"));
}
