//! Closure values
//!
//! A closure pairs a lambda's compiled machine with the values it captured.
//! Each call runs a fresh state of that machine to completion.

use crate::error::Fault;
use crate::ioc::{step, Lambda, StateMachine, Step};
use crate::value::types::Arity;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

pub struct Closure {
    pub lambda: Rc<Lambda>,
    pub machine: Rc<StateMachine>,
    pub captured: Vec<Value>,
}

impl Closure {
    pub fn new(lambda: Rc<Lambda>, machine: Rc<StateMachine>, captured: Vec<Value>) -> Self {
        Closure {
            lambda,
            machine,
            captured,
        }
    }

    pub fn arity(&self) -> Arity {
        Arity::Exact(self.lambda.params.len())
    }

    pub fn name(&self) -> &str {
        self.lambda.name.as_deref().unwrap_or("fn")
    }

    /// Call the closure. The machine's parameters are the captured values,
    /// the closure itself when named, then `args`.
    pub fn invoke(this: &Rc<Closure>, args: &[Value]) -> Result<Value, Fault> {
        this.arity().check(this.name(), args.len())?;
        let mut full = Vec::with_capacity(this.captured.len() + 1 + args.len());
        full.extend_from_slice(&this.captured);
        if this.lambda.name.is_some() {
            full.push(Value::Closure(this.clone()));
        }
        full.extend_from_slice(args);

        let state = this.machine.create_with(&full)?;
        match step(&state)? {
            Step::Done(value) => Ok(value),
            Step::Suspended => Err(Fault::error(
                "suspend-error",
                format!("{}: closures cannot suspend", this.name()),
            )),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<closure {}>", self.name())
    }
}
