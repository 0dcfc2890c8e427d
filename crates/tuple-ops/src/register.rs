use log::debug;
use tuple_core::Registry;

use crate::functions::{Difference, Increment, Negate, Square, ToText, Total};
use crate::operators::{Flip, Max, Min, Product, Sum};
use crate::predicates::{Equals, GreaterThan, IsPositive, Not};

/// Registra las unidades incluidas bajo sus tags `tuple_ops::*`.
pub fn register_builtin(registry: &mut Registry) {
    registry.register::<Sum>();
    registry.register::<Product>();
    registry.register::<Max>();
    registry.register::<Min>();
    registry.register::<Flip>();
    registry.register::<Increment>();
    registry.register::<Negate>();
    registry.register::<Square>();
    registry.register::<ToText>();
    registry.register::<Total>();
    registry.register::<Difference>();
    registry.register::<IsPositive>();
    registry.register::<GreaterThan>();
    registry.register::<Equals>();
    registry.register::<Not>();
    debug!("built-in units registered ({} classes known)", registry.tags().count());
}

/// Registro con las unidades del core y las incluidas.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::with_core();
    register_builtin(&mut registry);
    registry
}
