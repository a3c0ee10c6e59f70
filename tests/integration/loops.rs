use crate::common::{eval_source, ints};
use elle_ioc::Value;

#[test]
fn test_loop_sum() {
    assert_eq!(
        eval_source("(loop [i 0 acc 0] (if (> i 4) acc (recur (+ i 1) (+ acc i))))").unwrap(),
        Value::int(10)
    );
}

#[test]
fn test_recur_is_a_parallel_update() {
    assert_eq!(
        eval_source("(loop [a 1 b 2 n 0] (if (= n 1) [a b] (recur b a (+ n 1))))").unwrap(),
        Value::vector(ints(&[2, 1]))
    );
}

#[test]
fn test_recur_rotation() {
    assert_eq!(
        eval_source("(loop [a 1 b 2 c 3 n 0] (if (= n 2) [a b c] (recur b c a (+ n 1))))").unwrap(),
        Value::vector(ints(&[3, 1, 2]))
    );
}

#[test]
fn test_loop_value_flows_out() {
    assert_eq!(
        eval_source("(+ 1 (loop [i 0] (if (< i 5) (recur (+ i 1)) i)))").unwrap(),
        Value::int(6)
    );
}

#[test]
fn test_nested_loops_recur_innermost() {
    let src = "(loop [i 0 total 0]
                 (if (= i 3)
                   total
                   (recur (+ i 1)
                          (+ total (loop [j 0 s 0] (if (= j i) s (recur (+ j 1) (+ s 1))))))))";
    // 0 + 1 + 2
    assert_eq!(eval_source(src).unwrap(), Value::int(3));
}

#[test]
fn test_return_from_loop() {
    assert_eq!(
        eval_source("(loop [i 0] (if (= i 3) (return (* i 10)) (recur (+ i 1))))").unwrap(),
        Value::int(30)
    );
}

#[test]
fn test_loop_rebinds_outer_name() {
    assert_eq!(
        eval_source("(let [x 100] (loop [x 0] (if (< x 2) (recur (+ x 1)) x)))").unwrap(),
        Value::int(2)
    );
    assert_eq!(
        eval_source("(let [x 100] (loop [x 0] (if (< x 2) (recur (+ x 1)) x)) x)").unwrap(),
        Value::int(100)
    );
}

#[test]
fn test_many_iterations() {
    assert_eq!(
        eval_source("(loop [i 0] (if (< i 10000) (recur (inc i)) i))").unwrap(),
        Value::int(10000)
    );
}
