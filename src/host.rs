//! Host collaborators: globals, alias resolution and the suspension tables.
//!
//! - [`Host`] owns global bindings and the registered suspension handlers.
//! - [`Env`] resolves host-level aliases on head symbols (`async/<!` → `<!`).
//! - [`Terminators`] maps call-site names to handler names.

use crate::error::Fault;
use crate::ioc::{BlockId, StateHandle};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// What a suspension handler tells the dispatch loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Leave the machine parked; `step` returns `Step::Suspended`.
    Suspend,
    /// The handler already installed a block id and pending value; keep
    /// dispatching.
    Continue,
    /// The machine is complete with this value.
    Complete(Value),
}

/// A suspension handler: receives the raw state handle, the continuation
/// block and the call's argument values.
pub type SuspendHandler = Rc<dyn Fn(&StateHandle, BlockId, &[Value]) -> Result<Control, Fault>>;

/// Global environment shared by every machine compiled against it.
#[derive(Default)]
pub struct Host {
    globals: RefCell<FxHashMap<Rc<str>, Value>>,
    handlers: RefCell<FxHashMap<String, SuspendHandler>>,
}

impl Host {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with the built-in primitives and the stock `yield` handler.
    pub fn with_primitives() -> Rc<Host> {
        let host = Host::new();
        crate::primitives::register_primitives(&host);
        host.register_handler("yield", crate::primitives::yield_handler());
        Rc::new(host)
    }

    pub fn define(&self, name: &str, value: Value) {
        self.globals.borrow_mut().insert(Rc::from(name), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name).cloned()
    }

    /// Rebind an existing global
    pub fn assign(&self, name: &str, value: Value) -> Result<(), Fault> {
        match self.globals.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::error(
                "undefined-variable",
                format!("cannot set! undefined global '{}'", name),
            )),
        }
    }

    pub fn register_handler(&self, name: &str, handler: SuspendHandler) {
        self.handlers.borrow_mut().insert(name.to_string(), handler);
    }

    pub fn handler(&self, name: &str) -> Option<SuspendHandler> {
        self.handlers.borrow().get(name).cloned()
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("globals", &self.globals.borrow().len())
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

/// Host-level symbol aliasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    aliases: FxHashMap<String, String>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(&mut self, from: &str, to: &str) {
        self.aliases.insert(from.to_string(), to.to_string());
    }

    /// Follow aliases until a name resolves to itself. Cycles stop at the
    /// first repeated name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) if next != current => current = next,
                _ => break,
            }
        }
        current
    }
}

/// Call-site name → suspension handler name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Terminators {
    entries: BTreeMap<String, String>,
}

impl Terminators {
    /// Reserved entry overriding how the machine's result is delivered.
    pub const RETURN: &'static str = "return";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call_site: &str, handler: &str) {
        self.entries
            .insert(call_site.to_string(), handler.to_string());
    }

    pub fn get(&self, call_site: &str) -> Option<&str> {
        self.entries.get(call_site).map(String::as_str)
    }

    pub fn return_handler(&self) -> Option<&str> {
        self.get(Self::RETURN)
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
