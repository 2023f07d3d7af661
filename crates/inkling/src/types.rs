//! Type tags, type constraints and the `is` predicate.

use crate::error::Fault;
use crate::value::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Any,
    Bool,
    Int,
    Rational,
    Double,
    /// Any of the numeric rungs
    Number,
    Array,
    Range,
    Dictionary,
    String,
    Sheet,
    Type,
    Selection,
    Function,
    Label,
    Identifier,
    Error,
}

impl TypeTag {
    pub const ALL: [TypeTag; 17] = [
        TypeTag::Any,
        TypeTag::Bool,
        TypeTag::Int,
        TypeTag::Rational,
        TypeTag::Double,
        TypeTag::Number,
        TypeTag::Array,
        TypeTag::Range,
        TypeTag::Dictionary,
        TypeTag::String,
        TypeTag::Sheet,
        TypeTag::Type,
        TypeTag::Selection,
        TypeTag::Function,
        TypeTag::Label,
        TypeTag::Identifier,
        TypeTag::Error,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Any => "Any",
            TypeTag::Bool => "Bool",
            TypeTag::Int => "Int",
            TypeTag::Rational => "Rational",
            TypeTag::Double => "Double",
            TypeTag::Number => "Number",
            TypeTag::Array => "Array",
            TypeTag::Range => "Range",
            TypeTag::Dictionary => "Dictionary",
            TypeTag::String => "String",
            TypeTag::Sheet => "Sheet",
            TypeTag::Type => "Type",
            TypeTag::Selection => "Selection",
            TypeTag::Function => "Function",
            TypeTag::Label => "Label",
            TypeTag::Identifier => "Identifier",
            TypeTag::Error => "Error",
        }
    }

    pub fn from_name(name: &str) -> Option<TypeTag> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeTag::Any => true,
            TypeTag::Number => value.is_number(),
            tag => value.type_tag() == *tag,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeConstraint {
    Tag(TypeTag),
    /// Satisfied by any alternative
    Union(Vec<TypeConstraint>),
    ArrayOf {
        element: Box<TypeConstraint>,
        count: Option<usize>,
    },
    DictionaryOf {
        key: Box<TypeConstraint>,
        value: Box<TypeConstraint>,
    },
}

impl TypeConstraint {
    pub fn array_of(element: TypeConstraint, count: Option<usize>) -> Self {
        TypeConstraint::ArrayOf {
            element: Box::new(element),
            count,
        }
    }

    pub fn dictionary_of(key: TypeConstraint, value: TypeConstraint) -> Self {
        TypeConstraint::DictionaryOf {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// `a || b` over types, flattening nested unions.
    pub fn union(a: TypeConstraint, b: TypeConstraint) -> Self {
        let mut alternatives = Vec::new();
        for side in [a, b] {
            match side {
                TypeConstraint::Union(inner) => alternatives.extend(inner),
                other => alternatives.push(other),
            }
        }
        TypeConstraint::Union(alternatives)
    }

    /// Constraint carried by a type-valued operand.
    pub fn from_value(value: &Value) -> Option<TypeConstraint> {
        match value {
            Value::TypeTag(tag) => Some(TypeConstraint::Tag(*tag)),
            Value::TypeConstraint(constraint) => Some((**constraint).clone()),
            _ => None,
        }
    }

    pub fn satisfied_by(&self, value: &Value) -> bool {
        match self {
            TypeConstraint::Tag(tag) => tag.matches(value),
            TypeConstraint::Union(alternatives) => alternatives.iter().any(|c| c.satisfied_by(value)),
            TypeConstraint::ArrayOf { element, count } => match value {
                Value::Array(array) => {
                    count.is_none_or(|n| n == array.len())
                        && array.iter().all(|item| element.satisfied_by(item))
                }
                _ => false,
            },
            TypeConstraint::DictionaryOf { key, value: inner } => match value {
                Value::Dictionary(dictionary) => dictionary
                    .iter()
                    .all(|(k, v)| key.satisfied_by(k) && inner.satisfied_by(v)),
                _ => false,
            },
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeConstraint::Tag(tag) => write!(f, "{tag}"),
            TypeConstraint::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" || ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            TypeConstraint::ArrayOf { element, count: None } => write!(f, "[{element}]"),
            TypeConstraint::ArrayOf {
                element,
                count: Some(n),
            } => write!(f, "[{element}; {n}]"),
            TypeConstraint::DictionaryOf { key, value } => write!(f, "{{{key}: {value}}}"),
        }
    }
}

/// `value is set`. Sets are types, ranges, arrays (membership by
/// equality) and dictionaries (key membership).
pub fn is(value: &Value, set: &Value) -> Result<bool, Fault> {
    if let Some(constraint) = TypeConstraint::from_value(set) {
        return Ok(constraint.satisfied_by(value));
    }
    match set {
        Value::Range(range) => Ok(range.contains(value)),
        Value::Array(array) => Ok(array.iter().any(|item| item == value)),
        Value::Dictionary(dictionary) => Ok(dictionary.contains_key(value)),
        other => Err(Fault::undefined("is", &[value.type_name(), other.type_name()])),
    }
}
