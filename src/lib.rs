//! # elle-ioc - Resumable state machines from nested forms
//!
//! elle-ioc lowers an expression of a small Lisp into a control-flow graph,
//! decides which intermediate values must survive a suspension, and emits a
//! state machine that runs until a designated call site suspends it.
//!
//! ## Quick Start
//!
//! ```
//! use elle_ioc::{compile, read_syntax, step, CompileOptions, Host, Step, Value};
//!
//! let host = Host::with_primitives();
//! let form = read_syntax("(+ 1 (yield 10))").unwrap();
//! let options = CompileOptions::new().with_terminator("yield", "yield");
//! let machine = compile(&form, &options, &host).unwrap();
//!
//! let state = machine.create().unwrap();
//! assert_eq!(step(&state).unwrap(), Step::Suspended);
//! state.borrow_mut().set_value(Value::int(41));
//! assert_eq!(step(&state).unwrap(), Step::Done(Value::int(42)));
//! ```
//!
//! ## Architecture
//!
//! 1. **Reader** - Parse S-expressions into spanned syntax
//! 2. **Lowering** - Build blocks of SSA-like instructions
//! 3. **Analysis** - Assign slots to values that cross block boundaries
//! 4. **Emission** - Compile each block into a slot-addressed program
//! 5. **Runtime** - `create` a slot array and `step` it between suspensions

pub mod arithmetic;
pub mod error;
pub mod host;
pub mod ioc;
pub mod primitives;
pub mod reader;
pub mod syntax;
pub mod value;

pub use error::{CompileError, CompileResult, Fault};
pub use host::{Control, Env, Host, SuspendHandler, Terminators};
pub use ioc::{compile, step, CompileOptions, StateHandle, StateMachine, Step};
pub use primitives::register_primitives;
pub use reader::{read_syntax, read_syntax_all};
pub use syntax::{Span, Syntax, SyntaxKind};
pub use value::Value;
