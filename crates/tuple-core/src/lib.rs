//! tuple-core: unidades funcionales componibles (predicados, funciones,
//! operadores binarios) con firmas de tipo introspectables, adaptadores de
//! entrada/salida y capa de selección/proyección sobre tuplas.
pub mod adapted;
pub mod composite;
pub mod config;
pub mod errors;
pub mod hashing;
pub mod registry;
pub mod signature;
pub mod tuple;
pub mod types;
pub mod unit;
pub mod validation;

pub use adapted::{AdaptedBinaryOperator, AdaptedFunction, AdaptedPredicate};
pub use composite::{BinaryOperatorComposite, Composite, FunctionComposite, PredicateComposite};
pub use config::{CoreConfig, OverflowPolicy};
pub use errors::{ConfigError, EvalError, TupleError};
pub use registry::{AnyUnit, FromSpec, Registry, UnitSpec};
pub use signature::{Declaration, Direction, Signature};
pub use tuple::{refs, ArrayTuple, FieldRef, FixedTuple, MapTuple, Record, Tuple};
pub use tuple::{ReverseTupleOutputAdapter, TupleInputAdapter, TupleOutputAdapter};
pub use tuple::{TupleAdaptedBinaryOperator, TupleAdaptedFunction, TupleAdaptedPredicate};
pub use tuple::{TupleBinaryOperatorComposite, TupleFunctionComposite, TuplePredicateComposite};
pub use types::{FromValue, IntoValue, TypeExpr, TypeVar, Typed, Value, ValueType};
pub use unit::{BiFunction, BinaryOperator, Function, Predicate, Unit, UnitKind};
pub use unit::{FnBiFunction, FnFunction, FnOperator, FnPredicate};
pub use validation::ValidationResult;
