use crate::host::Host;
use crate::value::Value;
use log::debug;

use super::def::PrimitiveDef;
use super::{arithmetic, collections, comparison, exception, utility};

/// All primitive tables. Each module exports a `const PRIMITIVES`
/// array; this list is the single place that enumerates them.
pub(crate) const ALL_TABLES: &[&[PrimitiveDef]] = &[
    arithmetic::PRIMITIVES,
    collections::PRIMITIVES,
    comparison::PRIMITIVES,
    exception::PRIMITIVES,
    utility::PRIMITIVES,
];

/// Define every primitive (and its aliases) as a global of `host`.
pub fn register_primitives(host: &Host) {
    let mut count = 0;
    for def in all_primitives() {
        host.define(def.name, Value::native(def.name, def.arity, def.func));
        for alias in def.aliases {
            host.define(alias, Value::native(def.name, def.arity, def.func));
        }
        count += 1;
    }
    debug!("registered {} primitives", count);
}

/// Every primitive definition, in table order
pub fn all_primitives() -> impl Iterator<Item = &'static PrimitiveDef> {
    ALL_TABLES.iter().flat_map(|table| table.iter())
}

/// Look up a definition by name or alias
pub fn find_primitive(name: &str) -> Option<&'static PrimitiveDef> {
    all_primitives().find(|def| def.name == name || def.aliases.contains(&name))
}
