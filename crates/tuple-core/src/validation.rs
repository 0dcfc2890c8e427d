//! `ValidationResult`: acumulador de errores de validación con nombre.
//!
//! Los mensajes se guardan en orden de inserción y sin duplicados. No tiene
//! modos de fallo: es agregación pura de datos.

use std::fmt;

use indexmap::IndexSet;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    errors: IndexSet<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resultado con un único error.
    pub fn with_error(msg: impl Into<String>) -> Self {
        let mut r = Self::new();
        r.add_error(msg);
        r
    }

    /// Inserta un mensaje (idempotente ante duplicados).
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.insert(msg.into());
    }

    /// Unión de conjuntos de errores, preservando el orden de llegada.
    pub fn add(&mut self, other: &ValidationResult) {
        self.errors.extend(other.errors.iter().cloned());
    }

    pub fn merge(mut self, other: ValidationResult) -> Self {
        self.errors.extend(other.errors);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `"Validation errors: "` seguido de los mensajes separados por salto de
    /// línea. El prefijo está presente aun sin errores.
    pub fn error_string(&self) -> String {
        let lines: Vec<&str> = self.errors().collect();
        format!("Validation errors: {}", lines.join("\n"))
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.error_string())
    }
}
