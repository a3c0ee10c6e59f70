//! Records: named, mutable field bags.
//!
//! Member access (`.-field`, `.method`) and field assignment operate on
//! records. A method is a field holding a callable; it receives the record
//! as its first argument.

use super::Value;
use crate::error::Fault;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug)]
pub struct Record {
    pub type_name: Rc<str>,
    fields: RefCell<Vec<(Rc<str>, Value)>>,
}

impl Record {
    pub fn new(type_name: &str, fields: Vec<(Rc<str>, Value)>) -> Self {
        Record {
            type_name: type_name.into(),
            fields: RefCell::new(fields),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(k, _)| **k == *name)
            .map(|(_, v)| v.clone())
    }

    /// Set (or add) a field
    pub fn set_field(&self, name: &str, value: Value) {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(k, _)| **k == *name) {
            Some(entry) => entry.1 = value,
            None => fields.push((name.into(), value)),
        }
    }

    pub fn field_names(&self) -> Vec<Rc<str>> {
        self.fields.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Invoke the callable stored under `method` with `this` prepended
    pub fn invoke(this: &Rc<Record>, method: &str, args: &[Value]) -> Result<Value, Fault> {
        let callee = this.field(method).ok_or_else(|| {
            Fault::error(
                "member-error",
                format!("{} has no method '{}'", this.type_name, method),
            )
        })?;
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Value::Record(this.clone()));
        full.extend_from_slice(args);
        callee.call(&full)
    }
}
