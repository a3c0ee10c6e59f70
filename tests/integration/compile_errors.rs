use elle_ioc::{compile, read_syntax, CompileError, CompileOptions, Host};

fn compile_err(src: &str, options: &CompileOptions) -> CompileError {
    let host = Host::with_primitives();
    compile(&read_syntax(src).unwrap(), options, &host).unwrap_err()
}

fn err(src: &str) -> CompileError {
    compile_err(src, &CompileOptions::new())
}

#[test]
fn test_recur_arity_mismatch() {
    match err("(loop [a 1 b 2] (recur 1))") {
        CompileError::RecurArity { expected, got, .. } => assert_eq!((expected, got), (2, 1)),
        other => panic!("expected RecurArity, got {:?}", other),
    }
}

#[test]
fn test_recur_outside_loop() {
    assert!(matches!(err("(recur 1)"), CompileError::RecurOutsideLoop { .. }));
}

#[test]
fn test_recur_across_try() {
    assert!(matches!(
        err("(loop [i 0] (try (recur 1) (catch :default e e)))"),
        CompileError::RecurAcrossTry { .. }
    ));
}

#[test]
fn test_recur_from_finally_body() {
    assert!(matches!(
        err("(loop [i 0] (try (if (= i 0) (throw :x) :ok) (finally (if (< i 1) (recur (+ i 1)) nil))))"),
        CompileError::RecurAcrossTry { .. }
    ));
}

#[test]
fn test_try_clause_order() {
    assert!(matches!(
        err("(try 1 (finally 2) (catch :default e e))"),
        CompileError::CatchAfterFinally { .. }
    ));
    assert!(matches!(
        err("(try 1 (finally 2) (finally 3))"),
        CompileError::FinallyNotLast { .. }
    ));
}

#[test]
fn test_malformed_forms_carry_spans() {
    let e = err("(let [a] a)");
    assert!(matches!(e, CompileError::Malformed { ref form, .. } if form == "let"));
    assert!(e.to_string().contains("odd binding count"), "{}", e);

    assert!(matches!(err("(if)"), CompileError::Malformed { .. }));
    assert!(matches!(err("(let (a 1) a)"), CompileError::Malformed { .. }));
    assert!(matches!(err("(fn x)"), CompileError::Malformed { .. }));
    assert!(matches!(err("(set! 1 2)"), CompileError::Malformed { .. }));
}

#[test]
fn test_unknown_suspension_handler() {
    let options = CompileOptions::new().with_terminator("<!", "take");
    assert_eq!(
        compile_err("(<! ch)", &options),
        CompileError::UnknownHandler { name: "take".into() }
    );
}

#[test]
fn test_bad_expansion_is_reported() {
    assert!(matches!(err("(-> x 3)"), CompileError::Expand { .. }));
}
