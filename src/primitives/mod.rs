//! Built-in native functions and stock suspension handlers.
pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod coroutines;
pub mod def;
pub mod exception;
pub mod registration;
pub mod utility;

pub use coroutines::{complete_handler, identity_handler, yield_handler};
pub use def::PrimitiveDef;
pub use registration::{all_primitives, find_primitive, register_primitives};
