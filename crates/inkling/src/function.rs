//! Function values: signature metadata, bodies and closures.
//!
//! Precedence, associativity and arity are published for an external
//! parser and never consulted while evaluating.

use crate::builtin::Op;
use crate::key::Key;
use crate::program::{FnId, Program};
use crate::types::TypeConstraint;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

pub const DEFAULT_PRECEDENCE: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Associativity {
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    None,
    Left,
    Right,
    Binary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    /// Name the value is bound to inside the body
    pub name: Key,
    /// Keyword the caller must spell out, if any
    pub keyword: Option<Key>,
    pub constraint: Option<TypeConstraint>,
}

impl Argument {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Key::new(name),
            keyword: None,
            constraint: None,
        }
    }

    pub fn with_keyword(mut self, keyword: impl AsRef<str>) -> Self {
        self.keyword = Some(Key::new(keyword));
        self
    }

    pub fn with_constraint(mut self, constraint: TypeConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Body {
    Primitive(Op),
    Program(Program),
}

/// A nested definition, visible by name inside the body that owns it
/// and addressable by position through `Instruction::Closure`.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: Option<Key>,
    pub function: Arc<Function>,
}

impl Definition {
    pub fn named(name: impl AsRef<str>, function: Function) -> Self {
        Self {
            name: Some(Key::new(name)),
            function: Arc::new(function),
        }
    }

    pub fn anonymous(function: Function) -> Self {
        Self {
            name: None,
            function: Arc::new(function),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<Key>,
    pub precedence: u16,
    pub associativity: Associativity,
    pub left: Vec<Argument>,
    pub right: Vec<Argument>,
    pub definitions: Arc<[Definition]>,
    /// Result of an empty body
    pub literal: Option<Value>,
    /// Right operands arrive as zero-argument closures
    pub short_circuit: bool,
    pub body: Body,
}

impl Function {
    pub fn new(body: Body) -> Self {
        Self {
            name: None,
            precedence: DEFAULT_PRECEDENCE,
            associativity: Associativity::Left,
            left: Vec::new(),
            right: Vec::new(),
            definitions: Arc::from(Vec::new()),
            literal: None,
            short_circuit: false,
            body,
        }
    }

    pub fn primitive(op: Op) -> Self {
        Self::new(Body::Primitive(op))
    }

    pub fn program(program: Program) -> Self {
        Self::new(Body::Program(program))
    }

    /// `(a b | body)`: every argument on the right.
    pub fn lambda<'a>(arguments: impl IntoIterator<Item = &'a str>, program: Program) -> Self {
        Self::program(program).with_right(arguments.into_iter().map(Argument::new).collect())
    }

    /// Zero-argument function returning `value`.
    pub fn constant(value: Value) -> Self {
        Self::program(Program::default()).with_literal(value)
    }

    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(Key::new(name));
        self
    }

    pub fn with_left(mut self, arguments: Vec<Argument>) -> Self {
        self.left = arguments;
        self
    }

    pub fn with_right(mut self, arguments: Vec<Argument>) -> Self {
        self.right = arguments;
        self
    }

    pub fn with_precedence(mut self, precedence: u16) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_associativity(mut self, associativity: Associativity) -> Self {
        self.associativity = associativity;
        self
    }

    pub fn with_definitions(mut self, definitions: Vec<Definition>) -> Self {
        self.definitions = definitions.into();
        self
    }

    pub fn with_literal(mut self, value: Value) -> Self {
        self.literal = Some(value);
        self
    }

    pub fn short_circuiting(mut self) -> Self {
        self.short_circuit = true;
        self
    }

    pub fn arity(&self) -> Arity {
        match (self.left.is_empty(), self.right.is_empty()) {
            (true, true) => Arity::None,
            (false, true) => Arity::Left,
            (true, false) => Arity::Right,
            (false, false) => Arity::Binary,
        }
    }

    /// Left arguments, then right arguments.
    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        self.left.iter().chain(self.right.iter())
    }

    pub fn parameter_count(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Stack slots consumed by an application: one per argument plus one
    /// per keyword marker.
    pub fn slot_count(&self) -> usize {
        self.parameter_count() + self.arguments().filter(|a| a.keyword.is_some()).count()
    }

    pub fn definition(&self, id: FnId) -> Option<&Definition> {
        self.definitions.get(id.0 as usize)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_ref().map_or("function", Key::as_str)
    }

    /// Builtins that consume Error operands instead of absorbing them.
    pub fn observes_errors(&self) -> bool {
        matches!(self.body, Body::Primitive(Op::Recover))
    }
}

/// Bindings of one activation, chained to the frame the function was
/// created in.
#[derive(Debug)]
pub struct Scope {
    pub bindings: SmallVec<[(Key, Value); 4]>,
    pub definitions: Arc<[Definition]>,
    pub parent: Option<Arc<Scope>>,
}

#[derive(Debug, Clone)]
pub struct Closure {
    pub function: Arc<Function>,
    pub scope: Option<Arc<Scope>>,
}

impl Closure {
    pub fn new(function: Arc<Function>) -> Self {
        Self {
            function,
            scope: None,
        }
    }

    pub fn captured(function: Arc<Function>, scope: Arc<Scope>) -> Self {
        Self {
            function,
            scope: Some(scope),
        }
    }

    /// Deferred operand for a short-circuit function.
    pub fn thunk(value: Value) -> Self {
        Self::new(Arc::new(Function::constant(value)))
    }

    pub fn is_thunk(&self) -> bool {
        self.function.slot_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_follows_the_argument_lists() {
        let body = Program::default();
        assert_eq!(Function::program(body.clone()).arity(), Arity::None);
        let unary = Function::lambda(["x"], body.clone());
        assert_eq!(unary.arity(), Arity::Right);
        let binary = unary.with_left(vec![Argument::new("y")]);
        assert_eq!(binary.arity(), Arity::Binary);
        assert_eq!(binary.arguments().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["y", "x"]);
    }

    #[test]
    fn keywords_take_an_extra_slot() {
        let function = Function::program(Program::default())
            .with_right(vec![Argument::new("n"), Argument::new("step").with_keyword("by")]);
        assert_eq!(function.parameter_count(), 2);
        assert_eq!(function.slot_count(), 3);
    }

    #[test]
    fn thunks_take_no_operands() {
        assert!(Closure::thunk(Value::Int(1)).is_thunk());
        assert!(!Closure::new(Arc::new(Function::lambda(["x"], Program::default()))).is_thunk());
    }
}
