use crate::common::generator_options;
use elle_ioc::ioc::state::USER_START_IDX;
use elle_ioc::ioc::{analyze, lower, Inst, Machine, Operand, ValueId};
use elle_ioc::{read_syntax, CompileOptions};

fn lower_src(src: &str, options: &CompileOptions) -> Machine {
    lower(&read_syntax(src).unwrap(), options).unwrap()
}

/// Result id of the call whose callee prints as `callee`
fn call_result(machine: &Machine, callee: &str) -> ValueId {
    machine
        .blocks
        .values()
        .flatten()
        .find(|i| matches!(&i.inst, Inst::Call { callee: c, .. } if c.to_string() == callee))
        .map(|i| i.id)
        .unwrap()
}

#[test]
fn test_straight_line_code_persists_nothing() {
    let m = lower_src("(+ (* 2 3) (- 4 1))", &CompileOptions::new());
    let layout = analyze(&m);
    assert_eq!(layout.persisted_count(), 0);
    assert_eq!(layout.size, USER_START_IDX);
}

#[test]
fn test_value_live_across_suspension_is_persisted() {
    let m = lower_src("(let [a (f)] (+ a (yield 1)))", &generator_options());
    let layout = analyze(&m);
    let a = call_result(&m, "@f");
    let sum = call_result(&m, "@+");
    assert!(layout.is_persisted(a));
    assert!(!layout.is_persisted(sum));
}

#[test]
fn test_value_used_only_before_suspension_is_temporary() {
    let m = lower_src("(do (g (f)) (yield 1))", &generator_options());
    let layout = analyze(&m);
    assert!(!layout.is_persisted(call_result(&m, "@f")));
}

#[test]
fn test_parameters_take_first_slots() {
    let options = generator_options().with_param("x").with_param("y");
    let m = lower_src("(+ x (yield y))", &options);
    let layout = analyze(&m);
    assert_eq!(layout.slot(ValueId(0)), Some(USER_START_IDX));
    assert_eq!(layout.slot(ValueId(1)), Some(USER_START_IDX + 1));
    assert_eq!(layout.param_count, 2);
}

#[test]
fn test_slots_are_assigned_in_first_seen_order() {
    let m = lower_src("(let [a (f) b (g)] (yield 0) (+ a b))", &generator_options());
    let layout = analyze(&m);
    let a = layout.slot(call_result(&m, "@f")).unwrap();
    let b = layout.slot(call_result(&m, "@g")).unwrap();
    assert_eq!((a, b), (USER_START_IDX, USER_START_IDX + 1));
}

#[test]
fn test_merge_placeholder_persists_when_read_later() {
    let m = lower_src("(let [v (if c 1 2)] (yield v) v)", &generator_options());
    let layout = analyze(&m);
    let pending = m
        .blocks
        .values()
        .flatten()
        .find(|i| matches!(i.inst, Inst::Const { value: Operand::Pending }))
        .map(|i| i.id)
        .unwrap();
    assert!(layout.is_persisted(pending));
}

#[test]
fn test_lowering_is_deterministic() {
    let src = "(let [a (f)] (try (if a (yield a) (g)) (catch :default e e) (finally (h))))";
    let first = lower_src(src, &generator_options());
    let second = lower_src(src, &generator_options());
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.start, second.start);
    assert_eq!(analyze(&first), analyze(&second));
}

#[test]
fn test_shared_options_give_same_expansion_temps() {
    let options = CompileOptions::new();
    let captures = |m: &Machine| {
        m.blocks
            .values()
            .flatten()
            .find_map(|i| match &i.inst {
                Inst::Fn { lambda, .. } => Some(lambda.captures.clone()),
                _ => None,
            })
            .unwrap()
    };
    let first = lower_src("(or (f) (fn [] 1))", &options);
    let second = lower_src("(or (f) (fn [] 1))", &options);
    assert_eq!(captures(&first), vec!["or__0"]);
    assert_eq!(captures(&first), captures(&second));
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_every_block_ends_in_one_terminator() {
    let src = "(loop [i 0] (case i 0 (recur 1) 1 (try (yield i) (catch :default e e)) :end))";
    let m = lower_src(src, &generator_options());
    for insts in m.blocks.values() {
        let terminators = insts.iter().filter(|i| i.is_terminator()).count();
        assert_eq!(terminators, 1);
        assert!(insts.last().unwrap().is_terminator());
    }
}

#[test]
fn test_start_block_holds_entry_code() {
    let m = lower_src("(f)", &CompileOptions::new());
    assert!(m.blocks.contains_key(&m.start));
    assert!(m.blocks[&m.start]
        .iter()
        .any(|i| matches!(i.inst, Inst::Call { .. })));
}
