//! Stock suspension handlers.
//!
//! A suspension handler receives the state handle, the continuation block
//! and the argument values of the suspending call. The host resumes a
//! parked machine by writing the call's result with `State::set_value` and
//! calling `step` again.

use crate::host::{Control, SuspendHandler};
use crate::ioc::{BlockId, StateHandle};
use crate::value::Value;
use log::trace;
use std::rc::Rc;

/// Generator-style `yield`: park the machine with the yielded value in
/// the pending-value slot and the cursor on the continuation.
pub fn yield_handler() -> SuspendHandler {
    Rc::new(|state: &StateHandle, resume: BlockId, args: &[Value]| {
        let yielded = args.first().cloned().unwrap_or(Value::Nil);
        trace!("yield {:?}, resume at {}", yielded, resume);
        let mut state = state.borrow_mut();
        state.set_value(yielded);
        state.resume_at(resume);
        Ok(Control::Suspend)
    })
}

/// Resume inline with the first argument as the call's result.
pub fn identity_handler() -> SuspendHandler {
    Rc::new(|state: &StateHandle, resume: BlockId, args: &[Value]| {
        let mut state = state.borrow_mut();
        state.set_value(args.first().cloned().unwrap_or(Value::Nil));
        state.resume_at(resume);
        Ok(Control::Continue)
    })
}

/// Finish the machine with the first argument. Used as a `return`
/// override.
pub fn complete_handler() -> SuspendHandler {
    Rc::new(|_state: &StateHandle, _resume: BlockId, args: &[Value]| {
        Ok(Control::Complete(args.first().cloned().unwrap_or(Value::Nil)))
    })
}
