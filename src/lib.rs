//! tupleflow
//!
//! Fachada del workspace:
//! - Re-exporta el core (`tuple_core`) y las unidades incluidas
//!   (`tuple_ops`).
//! - `default_registry()` conoce todas las clases de ambos crates.
//! - `load_pipeline` construye una unidad desde su descripción JSON.

pub use tuple_core::*;
pub use tuple_ops as ops;

use log::debug;
use serde_json::Value as Json;

/// Registro con el core y las unidades incluidas.
pub fn default_registry() -> Registry {
    tuple_ops::builtin_registry()
}

/// Construye la unidad descrita por `json` (`{"class": ..., ...}`).
pub fn load_pipeline(json: &Json) -> Result<AnyUnit, ConfigError> {
    let spec = UnitSpec::decode(json)?;
    debug!("loading {} pipeline", spec.short_name());
    default_registry().build(&spec)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_registry_knows_core_and_builtins() {
        let registry = default_registry();
        assert!(registry.contains("TupleAdaptedFunction"));
        assert!(registry.contains("tuple_ops::Square"));
    }

    #[test]
    fn unknown_class_is_a_config_error() {
        let err = load_pipeline(&json!({"class": "Nope"})).unwrap_err();
        assert_eq!(err, ConfigError::UnknownTag("Nope".into()));
    }
}
