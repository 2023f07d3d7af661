//! Error payload carried by `Value::Error`.
//!
//! Errors are ordinary values: every operator checks for them before
//! dispatch and hands them back unchanged, so one failure surfaces from
//! arbitrarily deep expressions without unwinding.

use std::fmt;

/// Classification of a fault. Purely informational: propagation treats
/// every kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No overload exists for the operand types
    UndefinedOperator,
    /// Mathematically undefined input (0/0, ∞−∞, sqrt of a negative, ...)
    Domain,
    /// Index or key outside the valid range
    Bounds,
    /// Mismatched array shapes, or an unbounded range that would need materializing
    Shape,
    /// Raised explicitly by user code
    User,
    /// Evaluation exceeded a configured limit
    Limit,
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UndefinedOperator => "undefined operator",
            ErrorKind::Domain => "domain error",
            ErrorKind::Bounds => "bounds error",
            ErrorKind::Shape => "shape error",
            ErrorKind::User => "error",
            ErrorKind::Limit => "limit exceeded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fault {
    pub kind: ErrorKind,
    pub message: String,
}

impl Fault {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// No overload of `op` for the given operand type names.
    pub fn undefined(op: &str, operands: &[&str]) -> Self {
        let message = match operands {
            [] => format!("{op} is not defined"),
            [only] => format!("{op} is not defined for {only}"),
            [left, right] => format!("{op} is not defined for {left} and {right}"),
            many => format!("{op} is not defined for {}", many.join(", ")),
        };
        Self::new(ErrorKind::UndefinedOperator, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Domain, message)
    }

    /// `index` is not within `0..<bound`.
    pub fn bounds(index: impl fmt::Display, bound: usize) -> Self {
        Self::new(
            ErrorKind::Bounds,
            format!("index {index} is out of bounds 0..<{bound}"),
        )
    }

    pub fn missing_key(key: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Bounds, format!("no value for key {key}"))
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shape, message)
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User, message)
    }

    pub fn limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Limit, message)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for Fault {}
