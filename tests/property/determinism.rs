// Property tests for compile determinism.
//
// Compiling the same source twice with the same handler table must give
// the same blocks, the same slot layout and the same start block.

use super::strategies::arb_expr;
use crate::common::{eval_source, generator_options};
use elle_ioc::ioc::{analyze, lower};
use elle_ioc::read_syntax;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn lowering_deterministic(expr in arb_expr()) {
        let form = read_syntax(&expr.to_source()).unwrap();
        let first = lower(&form, &generator_options()).unwrap();
        let second = lower(&form, &generator_options()).unwrap();
        prop_assert_eq!(first.to_string(), second.to_string());
        prop_assert_eq!(first.start, second.start);
        prop_assert_eq!(analyze(&first), analyze(&second));
    }

    #[test]
    fn execution_deterministic(a in -100i64..100, b in -100i64..100) {
        let code = format!("(let [x {} y {}] (try (if (< x y) (- y x) (throw x)) (catch :default e e)))", a, b);
        let r1 = eval_source(&code);
        let r2 = eval_source(&code);
        prop_assert_eq!(r1, r2, "Same program produced different results");
    }

    #[test]
    fn slot_count_covers_layout(expr in arb_expr()) {
        let form = read_syntax(&expr.to_source()).unwrap();
        let machine = lower(&form, &generator_options()).unwrap();
        let layout = analyze(&machine);
        let max_slot = layout.slots.values().copied().max();
        if let Some(max) = max_slot {
            prop_assert!(max < layout.size);
        }
        prop_assert_eq!(layout.slots.len(), layout.persisted_count() + layout.param_count);
    }
}
