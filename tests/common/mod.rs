//! Shared test helpers for the elle-ioc test suite.
//!
//! Provides canonical compile-and-drive functions so test files don't need
//! to copy-paste their own variants.

#![allow(dead_code)]

use elle_ioc::{compile, read_syntax, step, CompileOptions, Fault, Host, Step, Value};
use std::rc::Rc;

/// Compile `input` with default options and run it to completion.
///
/// A suspension is reported as an error string; use [`drive`] for
/// generator-style sources.
pub fn eval_source(input: &str) -> Result<Value, String> {
    eval_with(input, &CompileOptions::new(), &Host::with_primitives())
}

/// Like [`eval_source`], against a caller-supplied host and options.
pub fn eval_with(input: &str, options: &CompileOptions, host: &Rc<Host>) -> Result<Value, String> {
    let form = read_syntax(input)?;
    let machine = compile(&form, options, host).map_err(|e| e.to_string())?;
    let state = machine.create().map_err(|f| f.to_string())?;
    match step(&state).map_err(|f| f.to_string())? {
        Step::Done(value) => Ok(value),
        Step::Suspended => Err("unexpected suspension".to_string()),
    }
}

/// Run `input` and return the raw fault it ends with.
pub fn eval_fault(input: &str, host: &Rc<Host>) -> Fault {
    let form = read_syntax(input).unwrap();
    let machine = compile(&form, &CompileOptions::new(), host).unwrap();
    let state = machine.create().unwrap();
    step(&state).expect_err("expected a fault")
}

/// Options that compile `(yield x)` as a suspension.
pub fn generator_options() -> CompileOptions {
    CompileOptions::new().with_terminator("yield", "yield")
}

/// Drive a generator, feeding `resumes` back to successive suspensions.
///
/// Returns the yielded values and the final result. When the resume
/// values run out, each remaining suspension is resumed with its own
/// yielded value.
pub fn drive(input: &str, resumes: &[Value]) -> Result<(Vec<Value>, Value), String> {
    let host = Host::with_primitives();
    let form = read_syntax(input)?;
    let machine = compile(&form, &generator_options(), &host).map_err(|e| e.to_string())?;
    let state = machine.create().map_err(|f| f.to_string())?;

    let mut yielded = Vec::new();
    let mut feed = resumes.iter();
    loop {
        match step(&state).map_err(|f| f.to_string())? {
            Step::Done(value) => return Ok((yielded, value)),
            Step::Suspended => {
                let value = state.borrow().value().clone();
                yielded.push(value);
                if let Some(next) = feed.next() {
                    state.borrow_mut().set_value(next.clone());
                }
            }
        }
        if yielded.len() > 10_000 {
            return Err("generator did not finish".to_string());
        }
    }
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::int).collect()
}
