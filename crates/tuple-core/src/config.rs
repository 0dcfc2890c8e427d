//! Configuración del core desde variables de entorno.
//!
//! Se carga `.env` (si existe) una sola vez y se construye un `CoreConfig`
//! global perezoso. Variables reconocidas:
//! - `TUPLEFLOW_LENIENT_UNWRAP`: reintento escalar en `PredicateComposite`
//!   (`true` por defecto).
//! - `TUPLEFLOW_OVERFLOW`: `clamp` | `wrap` | `error` (`clamp` por defecto).
//! - `TUPLEFLOW_MAX_RESOLUTION_DEPTH`: límite de saltos al resolver variables
//!   de tipo (64 por defecto).

use std::env;
use std::fmt;
use std::str::FromStr;

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

static GLOBAL: Lazy<CoreConfig> = Lazy::new(CoreConfig::from_env);

/// Política ante desbordamiento en aritmética entera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Satura al mínimo/máximo del tipo.
    #[default]
    Clamp,
    /// Aritmética modular (complemento a dos).
    Wrap,
    /// Reporta `EvalError::Overflow`.
    Error,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" | "saturate" => Ok(OverflowPolicy::Clamp),
            "wrap" => Ok(OverflowPolicy::Wrap),
            "error" => Ok(OverflowPolicy::Error),
            other => Err(format!("unknown overflow policy: {other}")),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverflowPolicy::Clamp => "clamp",
            OverflowPolicy::Wrap => "wrap",
            OverflowPolicy::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub lenient_scalar_unwrap: bool,
    pub overflow: OverflowPolicy,
    pub max_resolution_depth: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self { lenient_scalar_unwrap: true,
               overflow: OverflowPolicy::Clamp,
               max_resolution_depth: 64 }
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let defaults = Self::default();
        let lenient_scalar_unwrap = env::var("TUPLEFLOW_LENIENT_UNWRAP").ok()
                                                                         .and_then(|v| parse_bool(&v))
                                                                         .unwrap_or(defaults.lenient_scalar_unwrap);
        let overflow = env::var("TUPLEFLOW_OVERFLOW").ok()
                                                     .and_then(|v| v.parse().ok())
                                                     .unwrap_or(defaults.overflow);
        let max_resolution_depth = env::var("TUPLEFLOW_MAX_RESOLUTION_DEPTH").ok()
                                                                             .and_then(|v| v.parse().ok())
                                                                             .filter(|d: &usize| *d > 0)
                                                                             .unwrap_or(defaults.max_resolution_depth);
        Self { lenient_scalar_unwrap,
               overflow,
               max_resolution_depth }
    }

    /// Configuración global (evaluada una sola vez).
    pub fn global() -> &'static CoreConfig {
        &GLOBAL
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_policy_parses_case_insensitive() {
        assert_eq!("WRAP".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Wrap));
        assert_eq!("saturate".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Clamp));
        assert!("explode".parse::<OverflowPolicy>().is_err());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn defaults_are_lenient_and_clamping() {
        let c = CoreConfig::default();
        assert!(c.lenient_scalar_unwrap);
        assert_eq!(c.overflow, OverflowPolicy::Clamp);
        assert_eq!(c.max_resolution_depth, 64);
    }
}
