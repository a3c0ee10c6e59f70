// Property tests for loop/recur semantics.

use crate::common::{eval_source, ints};
use elle_ioc::Value;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn recur_swaps_in_parallel(a in -1000i64..1000, b in -1000i64..1000, rounds in 0i64..6) {
        let code = format!(
            "(loop [a {} b {} n 0] (if (= n {}) [a b] (recur b a (+ n 1))))",
            a, b, rounds
        );
        let expected = if rounds % 2 == 0 { ints(&[a, b]) } else { ints(&[b, a]) };
        prop_assert_eq!(eval_source(&code).unwrap(), Value::vector(expected));
    }

    #[test]
    fn loop_sum_matches_formula(n in 0i64..200) {
        let code = format!("(loop [i 0 acc 0] (if (> i {}) acc (recur (+ i 1) (+ acc i))))", n);
        prop_assert_eq!(eval_source(&code).unwrap(), Value::int(n * (n + 1) / 2));
    }

    #[test]
    fn fn_recur_matches_loop(n in 0i64..50) {
        let via_fn = format!(
            "((fn [i acc] (if (= i 0) acc (recur (- i 1) (* acc 2)))) {} 1)",
            n.min(40)
        );
        prop_assert_eq!(eval_source(&via_fn).unwrap(), Value::int(1i64 << n.min(40)));
    }
}
