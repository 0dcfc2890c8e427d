//! tuple-ops: unidades concretas sobre el core.
//!
//! - Operadores: `Sum`, `Product`, `Max`, `Min` y `Flip` (envuelve otro
//!   operador e invierte sus argumentos).
//! - Funciones: `Increment`, `Negate`, `Square`, `ToText`, `Total`,
//!   `Difference`.
//! - Predicados: `IsPositive`, `GreaterThan`, `Equals`, `Not`.
//!
//! La aritmética entera respeta `OverflowPolicy` (por unidad o global).

pub mod functions;
pub mod numeric;
pub mod operators;
pub mod predicates;
pub mod register;

pub use functions::{Difference, Increment, Negate, Square, ToText, Total};
pub use operators::{Flip, Max, Min, Product, Sum};
pub use predicates::{Equals, GreaterThan, IsPositive, Not};
pub use register::{builtin_registry, register_builtin};
