use crate::common::{drive, generator_options, ints};
use elle_ioc::host::Control;
use elle_ioc::ioc::{BlockId, Status};
use elle_ioc::primitives::{complete_handler, identity_handler};
use elle_ioc::{compile, read_syntax, step, CompileOptions, Host, StateHandle, Step, Value};
use std::rc::Rc;

// ============================================================================
// Generators
// ============================================================================

#[test]
fn test_single_yield_resumes_with_value() {
    let (yielded, result) = drive("(+ 1 (yield 10))", &ints(&[5])).unwrap();
    assert_eq!(yielded, ints(&[10]));
    assert_eq!(result, Value::int(6));
}

#[test]
fn test_yield_in_loop() {
    let src = "(loop [i 0] (if (< i 3) (do (yield i) (recur (+ i 1))) :done))";
    let (yielded, result) = drive(src, &[]).unwrap();
    assert_eq!(yielded, ints(&[0, 1, 2]));
    assert_eq!(result, Value::keyword("done"));
}

#[test]
fn test_locals_survive_suspension() {
    let src = "(let [a 10 b (yield :first)] (+ a b (yield :second)))";
    let (yielded, result) = drive(src, &ints(&[1, 100])).unwrap();
    assert_eq!(yielded, vec![Value::keyword("first"), Value::keyword("second")]);
    assert_eq!(result, Value::int(111));
}

#[test]
fn test_suspension_inside_conditional() {
    let src = "(let [x 10] (if (> x 5) (+ x (yield 1)) 0))";
    let (_, result) = drive(src, &ints(&[2])).unwrap();
    assert_eq!(result, Value::int(12));

    let src = "(let [x 1] (if (> x 5) (+ x (yield 1)) 0))";
    let (yielded, result) = drive(src, &[]).unwrap();
    assert!(yielded.is_empty());
    assert_eq!(result, Value::int(0));
}

#[test]
fn test_suspension_as_branch_test() {
    let (_, result) = drive("(if (yield :ask) :yes :no)", &[Value::bool(false)]).unwrap();
    assert_eq!(result, Value::keyword("no"));
}

#[test]
fn test_suspension_inside_try() {
    let src = "(try (+ 1 (yield :x)) (catch :default e (ex-kind e)))";
    let (_, result) = drive(src, &[Value::string("a")]).unwrap();
    assert_eq!(result, Value::keyword("type-error"));

    let (_, result) = drive(src, &ints(&[2])).unwrap();
    assert_eq!(result, Value::int(3));
}

#[test]
fn test_suspension_in_call_arguments_preserves_order() {
    let src = "[(yield 1) (yield 2) (yield 3)]";
    let (yielded, result) = drive(src, &ints(&[10, 20, 30])).unwrap();
    assert_eq!(yielded, ints(&[1, 2, 3]));
    assert_eq!(result, Value::vector(ints(&[10, 20, 30])));
}

#[test]
fn test_set_survives_suspension() {
    let src = "(let [n 0] (set! n (+ n 1)) (yield n) (set! n (+ n 1)) n)";
    let (yielded, result) = drive(src, &[]).unwrap();
    assert_eq!(yielded, ints(&[1]));
    assert_eq!(result, Value::int(2));
}

// ============================================================================
// Runtime protocol
// ============================================================================

fn compile_with(src: &str, options: &CompileOptions, host: &Rc<Host>) -> StateHandle {
    let machine = compile(&read_syntax(src).unwrap(), options, host).unwrap();
    machine.create().unwrap()
}

#[test]
fn test_state_reports_status() {
    let host = Host::with_primitives();
    let state = compile_with("(yield 1)", &generator_options(), &host);
    assert!(matches!(state.borrow().status(), Some(Status::Running(_))));
    assert_eq!(step(&state).unwrap(), Step::Suspended);
    assert!(!state.borrow().is_finished());
    step(&state).unwrap();
    assert_eq!(state.borrow().status(), Some(Status::Finished));
}

#[test]
fn test_stepping_finished_machine_returns_result() {
    let host = Host::with_primitives();
    let state = compile_with("(* 6 7)", &CompileOptions::new(), &host);
    assert_eq!(step(&state).unwrap(), Step::Done(Value::int(42)));
    assert_eq!(step(&state).unwrap(), Step::Done(Value::int(42)));
}

#[test]
fn test_independent_states_of_one_machine() {
    let host = Host::with_primitives();
    let form = read_syntax("(+ 1 (yield 0))").unwrap();
    let machine = compile(&form, &generator_options(), &host).unwrap();
    let first = machine.create().unwrap();
    let second = machine.create().unwrap();
    step(&first).unwrap();
    step(&second).unwrap();
    first.borrow_mut().set_value(Value::int(10));
    second.borrow_mut().set_value(Value::int(20));
    assert_eq!(step(&second).unwrap(), Step::Done(Value::int(21)));
    assert_eq!(step(&first).unwrap(), Step::Done(Value::int(11)));
}

#[test]
fn test_parameters() {
    let host = Host::with_primitives();
    let options = CompileOptions::new().with_param("a").with_param("b");
    let form = read_syntax("(- a b)").unwrap();
    let machine = compile(&form, &options, &host).unwrap();
    let state = machine.create_with(&ints(&[10, 3])).unwrap();
    assert_eq!(step(&state).unwrap(), Step::Done(Value::int(7)));

    let fault = machine.create_with(&ints(&[1])).unwrap_err();
    assert_eq!(fault.kind(), Some("arity-error"));
}

#[test]
fn test_handler_may_continue_inline() {
    let host = Host::with_primitives();
    host.register_handler("now", identity_handler());
    let options = CompileOptions::new().with_terminator("now", "now");
    let state = compile_with("(loop [i 0 acc 0] (if (< i 3) (recur (+ i 1) (+ acc (now i))) acc))", &options, &host);
    assert_eq!(step(&state).unwrap(), Step::Done(Value::int(3)));
}

#[test]
fn test_handler_receives_all_arguments() {
    let host = Host::with_primitives();
    host.register_handler(
        "sum",
        Rc::new(|state: &StateHandle, resume: BlockId, args: &[Value]| {
            let total: i64 = args.iter().filter_map(Value::as_int).sum();
            let mut state = state.borrow_mut();
            state.set_value(Value::int(total));
            state.resume_at(resume);
            Ok(Control::Continue)
        }),
    );
    let options = CompileOptions::new().with_terminator("add-all", "sum");
    let state = compile_with("(* 2 (add-all 1 2 3))", &options, &host);
    assert_eq!(step(&state).unwrap(), Step::Done(Value::int(12)));
}

#[test]
fn test_handler_fault_routes_to_catch() {
    let host = Host::with_primitives();
    host.register_handler(
        "fail",
        Rc::new(|_state: &StateHandle, _resume: BlockId, _args: &[Value]| {
            Err(elle_ioc::Fault::error("io-error", "channel closed"))
        }),
    );
    let options = CompileOptions::new().with_terminator("<!", "fail");
    let state = compile_with("(try (<! :ch) (catch io-error e (ex-message e)))", &options, &host);
    assert_eq!(step(&state).unwrap(), Step::Done(Value::string("channel closed")));
}

#[test]
fn test_return_override_completes_machine() {
    let host = Host::with_primitives();
    host.register_handler("deliver", complete_handler());
    let options = CompileOptions::new().with_terminator("return", "deliver");
    let state = compile_with("(let [x 4] (if (> x 2) (return :big) :small))", &options, &host);
    assert_eq!(step(&state).unwrap(), Step::Done(Value::keyword("big")));
    assert!(state.borrow().is_finished());
}

#[test]
fn test_alias_resolves_suspension_sites() {
    let host = Host::with_primitives();
    let options = generator_options().with_alias("gen/yield", "yield");
    let state = compile_with("(+ 1 (gen/yield 2))", &options, &host);
    assert_eq!(step(&state).unwrap(), Step::Suspended);
    assert_eq!(state.borrow().value(), &Value::int(2));
}

#[test]
fn test_local_named_like_suspension_is_a_call() {
    let (yielded, result) = drive("(let [yield inc] (yield 1))", &[]).unwrap();
    assert!(yielded.is_empty());
    assert_eq!(result, Value::int(2));
}
