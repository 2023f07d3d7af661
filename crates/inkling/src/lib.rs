//! Runtime for the inkling expression language.
//!
//! Values are immutable and every operator is total: failures are
//! [`Value::Error`] values that absorb whatever they flow into. Function
//! bodies are RPN [`Program`]s produced by an external front end, which
//! reads operator precedence from [`Catalog::metadata`].

pub mod array;
pub mod bridge;
pub mod builtin;
pub mod catalog;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod key;
pub mod literal;
pub mod number;
pub mod ops;
pub mod program;
pub mod range;
mod render;
pub mod select;
pub mod types;
pub mod value;

pub use array::Array;
pub use bridge::Fragment;
pub use catalog::{Catalog, Metadata};
pub use config::Limits;
pub use dictionary::Dictionary;
pub use error::{ErrorKind, Fault};
pub use function::{Argument, Arity, Associativity, Closure, Definition, Function};
pub use interpreter::Interpreter;
pub use key::Key;
pub use program::{FnId, Instruction, Program};
pub use range::{Range, RangeShape};
pub use types::{TypeConstraint, TypeTag};
pub use value::Value;

use std::sync::Arc;

/// A builtin catalog together with the limits every evaluation runs
/// under.
#[derive(Debug, Default)]
pub struct Runtime {
    catalog: Catalog,
    limits: Limits,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            catalog: Catalog::standard(),
            limits,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(&self.catalog, self.limits)
    }

    /// Run a zero-argument function to its value.
    pub fn evaluate(&self, function: &Arc<Function>) -> Value {
        self.interpreter().evaluate(function)
    }

    /// Apply the builtin `name` to operands given left-then-right.
    pub fn call(&self, name: &str, operands: Vec<Value>) -> Value {
        let Some(function) = self.catalog.get_str(name) else {
            return Fault::undefined(name, &[]).into();
        };
        self.interpreter()
            .call(&Closure::new(function.clone()), operands)
    }
}
