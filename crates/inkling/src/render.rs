//! Canonical text form of values.
//!
//! The output of every case except functions, selections and sheets is
//! accepted back by [`crate::literal::parse`].

use crate::array::Array;
use crate::bridge;
use crate::function::{Body, Closure};
use crate::program::Instruction;
use crate::range::{Range, RangeShape};
use crate::value::Value;
use std::fmt::{self, Write};

fn quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

fn array(f: &mut fmt::Formatter<'_>, array: &Array) -> fmt::Result {
    f.write_char('(')?;
    for (i, item) in array.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        write!(f, "{item}")?;
    }
    f.write_char(')')?;
    if array.dimension() > 1 {
        f.write_char(';')?;
    }
    Ok(())
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = self.shape();
        let open = match shape {
            RangeShape::Closed | RangeShape::HalfOpen | RangeShape::From => '[',
            _ => '(',
        };
        let close = match shape {
            RangeShape::Closed | RangeShape::OpenClosed | RangeShape::Through => ']',
            _ => ')',
        };
        f.write_char(open)?;
        match self.lower() {
            Some(lower) => write!(f, "{lower}")?,
            None => f.write_str("...")?,
        }
        f.write_str(", ")?;
        match self.upper() {
            Some(upper) => write!(f, "{upper}")?,
            None => f.write_str("...")?,
        }
        f.write_char(close)?;
        if !self.has_default_delta() {
            write!(f, "__{}", self.delta())?;
        }
        Ok(())
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = &self.function;
        let program = match &function.body {
            Body::Primitive(_) => return f.write_str(function.display_name()),
            Body::Program(program) => program,
        };
        f.write_char('(')?;
        for argument in function.arguments() {
            if let Some(keyword) = &argument.keyword {
                write!(f, "{keyword}: ")?;
            }
            write!(f, "{} ", argument.name)?;
        }
        f.write_char('|')?;
        if program.is_empty() {
            if let Some(literal) = &function.literal {
                write!(f, " {literal}")?;
            }
        }
        for instruction in program.instructions() {
            match instruction {
                Instruction::Literal(value) => write!(f, " {value}")?,
                Instruction::Closure(id) => write!(f, " #{}", id.0)?,
                Instruction::Lookup(name) => write!(f, " {name}")?,
                Instruction::Apply(name) => write!(f, " {name}!")?,
            }
        }
        f.write_char(')')
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            // Debug keeps the fraction on integral doubles ("2.0")
            Value::Double(d) => write!(f, "{d:?}"),
            Value::Array(a) => array(f, a),
            Value::Range(range) => write!(f, "{range}"),
            Value::Dictionary(dictionary) => {
                f.write_char('{')?;
                for (i, (key, value)) in dictionary.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_char('}')
            }
            Value::String(s) => quoted(f, s),
            Value::Sheet(fragment) => write!(f, "{}", bridge::encode_sheet(fragment.sheet())),
            Value::TypeTag(tag) => write!(f, "{tag}"),
            Value::TypeConstraint(constraint) => write!(f, "{constraint}"),
            Value::Selection(selected) => {
                write!(f, "{}", selected.base)?;
                for component in &selected.path {
                    write!(f, "/.{component}")?;
                }
                Ok(())
            }
            Value::Function(closure) => write!(f, "{closure}"),
            Value::Label(key) => write!(f, "{key}:"),
            Value::Identifier(key) => write!(f, "{key}"),
            Value::Error(fault) => {
                f.write_char('\\')?;
                quoted(f, &fault.message)
            }
        }
    }
}
