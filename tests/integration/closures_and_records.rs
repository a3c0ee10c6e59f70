use crate::common::{eval_source, eval_with, generator_options, ints};
use elle_ioc::{Host, Value};

// ============================================================================
// Closures
// ============================================================================

#[test]
fn test_immediate_lambda() {
    assert_eq!(eval_source("((fn [x] (* x 2)) 21)").unwrap(), Value::int(42));
}

#[test]
fn test_closure_captures_enclosing_locals() {
    assert_eq!(
        eval_source("(let [k 10 add (fn [x] (+ x k))] [(add 1) (add 2)])").unwrap(),
        Value::vector(ints(&[11, 12]))
    );
}

#[test]
fn test_capture_is_by_value() {
    let src = "(let [k 1 get-k (fn [] k)] (set! k 2) [(get-k) k])";
    assert_eq!(eval_source(src).unwrap(), Value::vector(ints(&[1, 2])));
}

#[test]
fn test_named_fn_recursion() {
    assert_eq!(
        eval_source("((fn fib [n] (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2))))) 10)").unwrap(),
        Value::int(55)
    );
}

#[test]
fn test_recur_in_fn_body() {
    let src = "(let [count-down (fn [n acc] (if (= n 0) acc (recur (- n 1) (conj acc n))))]
                 (count-down 3 []))";
    assert_eq!(eval_source(src).unwrap(), Value::vector(ints(&[3, 2, 1])));
}

#[test]
fn test_higher_order() {
    let src = "(let [twice (fn [f x] (f (f x)))] (twice (fn [y] (* y 3)) 2))";
    assert_eq!(eval_source(src).unwrap(), Value::int(18));
}

#[test]
fn test_closure_returning_closure() {
    let src = "(let [adder (fn [n] (fn [x] (+ x n)))] ((adder 5) 10))";
    assert_eq!(eval_source(src).unwrap(), Value::int(15));
}

#[test]
fn test_closure_arity_checked() {
    let err = eval_source("((fn [a b] a) 1)").unwrap_err();
    assert!(err.contains("arity-error"), "{}", err);
}

#[test]
fn test_closure_fault_is_catchable() {
    let src = "(try ((fn [] (throw :inner))) (catch :default e e))";
    assert_eq!(eval_source(src).unwrap(), Value::keyword("inner"));
}

#[test]
fn test_closure_with_try_inside() {
    let src = "(let [safe-div (fn [a b] (try (/ a b) (catch division-by-zero e 0)))]
                 [(safe-div 10 2) (safe-div 1 0)])";
    assert_eq!(eval_source(src).unwrap(), Value::vector(ints(&[5, 0])));
}

#[test]
fn test_closure_inside_generator() {
    let host = Host::with_primitives();
    let src = "(let [sq (fn [x] (* x x))] (sq 4))";
    assert_eq!(eval_with(src, &generator_options(), &host).unwrap(), Value::int(16));
}

// ============================================================================
// Records and member access
// ============================================================================

#[test]
fn test_field_access() {
    assert_eq!(
        eval_source("(let [p (record 'Point :x 1 :y 2)] (+ (.-x p) (.-y p)))").unwrap(),
        Value::int(3)
    );
}

#[test]
fn test_missing_field_is_nil() {
    assert_eq!(eval_source("(.-z (record 'Point :x 1))").unwrap(), Value::Nil);
}

#[test]
fn test_field_assignment() {
    assert_eq!(
        eval_source("(let [p (record 'Point :x 1)] (set! (.-x p) 9) (.-x p))").unwrap(),
        Value::int(9)
    );
}

#[test]
fn test_method_call_receives_record() {
    let src = "(let [c (record 'Counter :n 5 :plus (fn [self k] (+ (.-n self) k)))] (.plus c 10))";
    assert_eq!(eval_source(src).unwrap(), Value::int(15));
}

#[test]
fn test_missing_method_faults() {
    let err = eval_source("(.run (record 'Job))").unwrap_err();
    assert!(err.contains("member-error"), "{}", err);
}

#[test]
fn test_field_access_on_map() {
    assert_eq!(eval_source("(.-a {:a 3})").unwrap(), Value::int(3));
}

#[test]
fn test_field_access_on_non_record_faults() {
    let err = eval_source("(.-a 5)").unwrap_err();
    assert!(err.contains("type-error"), "{}", err);
}
