//! `Composite<C>`: lista ordenada de componentes del mismo tipo y las tres
//! composiciones:
//! - `PredicateComposite`: AND con cortocircuito.
//! - `FunctionComposite`: tubería (la salida de uno es la entrada del
//!   siguiente).
//! - `BinaryOperatorComposite`: plegado `(acumulado, input) → acumulado`.
//!
//! El orden de inserción es el orden de evaluación.

mod units;

pub use units::{BinaryOperatorComposite, FunctionComposite, PredicateComposite};

use std::slice;

#[derive(Debug, Clone, PartialEq)]
pub struct Composite<C> {
    components: Vec<C>,
}

impl<C> Default for Composite<C> {
    fn default() -> Self {
        Self { components: vec![] }
    }
}

impl<C> Composite<C> {
    pub fn new(components: Vec<C>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[C] {
        &self.components
    }

    /// Añade al final (uso típico: builders).
    pub fn push(&mut self, component: C) {
        self.components.push(component);
    }

    pub fn with(mut self, component: C) -> Self {
        self.push(component);
        self
    }

    pub fn iter(&self) -> slice::Iter<'_, C> {
        self.components.iter()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn first(&self) -> Option<&C> {
        self.components.first()
    }

    pub fn last(&self) -> Option<&C> {
        self.components.last()
    }
}

impl<C> FromIterator<C> for Composite<C> {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, C> IntoIterator for &'a Composite<C> {
    type Item = &'a C;
    type IntoIter = slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
