//! Primitivas de adaptación: una unidad "core" envuelta con un adaptador de
//! entrada (`I → AI`) y, en la variante de dos lados, un adaptador de salida
//! `(contexto, AO) → O`.
//!
//! Sin adaptador el valor pasa tal cual; los tipos se comprueban tarde, en la
//! conversión que haga la unidad que lo consume (`EvalError::Cast`).

mod units;

pub use units::{AdaptedBinaryOperator, AdaptedFunction, AdaptedPredicate};

use std::fmt;
use std::sync::Arc;

use crate::errors::EvalError;
use crate::types::Value;
use crate::unit::{BiFunction, Function};

pub struct InputAdapted<A: ?Sized = dyn Function> {
    input_adapter: Option<Arc<A>>,
}

impl<A: ?Sized + Function> InputAdapted<A> {
    pub fn new(input_adapter: Option<Arc<A>>) -> Self {
        Self { input_adapter }
    }

    pub fn input_adapter(&self) -> Option<&Arc<A>> {
        self.input_adapter.as_ref()
    }

    pub fn adapt_input(&self, input: Value) -> Result<Value, EvalError> {
        match &self.input_adapter {
            Some(adapter) => adapter.apply(input),
            None => Ok(input),
        }
    }
}

impl<A: ?Sized> Default for InputAdapted<A> {
    fn default() -> Self {
        Self { input_adapter: None }
    }
}

impl<A: ?Sized> Clone for InputAdapted<A> {
    fn clone(&self) -> Self {
        Self { input_adapter: self.input_adapter.clone() }
    }
}

impl<A: ?Sized + PartialEq> PartialEq for InputAdapted<A> {
    fn eq(&self, other: &Self) -> bool {
        self.input_adapter == other.input_adapter
    }
}

impl<A: ?Sized + fmt::Debug> fmt::Debug for InputAdapted<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAdapted").field("input_adapter", &self.input_adapter).finish()
    }
}

/// Adaptación de dos lados.
pub struct Adapted<A: ?Sized = dyn Function, B: ?Sized = dyn BiFunction> {
    input: InputAdapted<A>,
    output_adapter: Option<Arc<B>>,
}

impl<A: ?Sized + Function, B: ?Sized + BiFunction> Adapted<A, B> {
    pub fn new(input_adapter: Option<Arc<A>>, output_adapter: Option<Arc<B>>) -> Self {
        Self { input: InputAdapted::new(input_adapter),
               output_adapter }
    }

    pub fn input_adapter(&self) -> Option<&Arc<A>> {
        self.input.input_adapter()
    }

    pub fn output_adapter(&self) -> Option<&Arc<B>> {
        self.output_adapter.as_ref()
    }

    pub fn adapt_input(&self, input: Value) -> Result<Value, EvalError> {
        self.input.adapt_input(input)
    }

    /// Mezcla `output` con `context` mediante el adaptador de salida.
    pub fn adapt_output(&self, output: Value, context: Value) -> Result<Value, EvalError> {
        match &self.output_adapter {
            Some(adapter) => adapter.apply(context, output),
            None => Ok(output),
        }
    }
}

impl<A: ?Sized, B: ?Sized> Default for Adapted<A, B> {
    fn default() -> Self {
        Self { input: InputAdapted::default(),
               output_adapter: None }
    }
}

impl<A: ?Sized, B: ?Sized> Clone for Adapted<A, B> {
    fn clone(&self) -> Self {
        Self { input: self.input.clone(),
               output_adapter: self.output_adapter.clone() }
    }
}

impl<A: ?Sized + PartialEq, B: ?Sized + PartialEq> PartialEq for Adapted<A, B> {
    fn eq(&self, other: &Self) -> bool {
        self.input == other.input && self.output_adapter == other.output_adapter
    }
}

impl<A: ?Sized + fmt::Debug, B: ?Sized + fmt::Debug> fmt::Debug for Adapted<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapted")
         .field("input_adapter", &self.input.input_adapter)
         .field("output_adapter", &self.output_adapter)
         .finish()
    }
}
