//! The runtime value of the language.
//!
//! `Value` is a closed sum. Aggregates are `Arc`-shared so cloning is O(1)
//! and every edit produces a new value; nothing is mutated in place.
//! Numbers compare and hash by value after promotion, so `2`, `2/1` and
//! `2.0` are the same dictionary key.

use crate::array::Array;
use crate::bridge::Fragment;
use crate::dictionary::Dictionary;
use crate::error::Fault;
use crate::function::Closure;
use crate::key::Key;
use crate::number::{self, Number, Rational};
use crate::range::Range;
use crate::select::Selected;
use crate::types::{TypeConstraint, TypeTag};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Rational(Rational),
    Double(f64),
    Array(Array),
    Range(Arc<Range>),
    Dictionary(Dictionary),
    String(Arc<str>),
    /// Fragment of a host sheet document
    Sheet(Fragment),
    TypeTag(TypeTag),
    TypeConstraint(Arc<TypeConstraint>),
    Selection(Arc<Selected>),
    Function(Arc<Closure>),
    /// Keyword marker preceding a keyword argument
    Label(Key),
    Identifier(Key),
    Error(Arc<Fault>),
}

impl Value {
    pub fn int(value: i64) -> Self {
        Value::Int(value)
    }

    pub fn double(value: f64) -> Self {
        Value::Double(value)
    }

    /// Exact ratio, collapsed to Int when whole. A zero denominator is a
    /// domain error.
    pub fn rational(numer: i64, denom: i64) -> Self {
        match number::make_ratio(numer, denom) {
            Some(ratio) => number::normalize(ratio).into(),
            None if denom == 0 => Fault::domain(format!("{numer}/0 is not a number")).into(),
            None => Value::Double(numer as f64 / denom as f64),
        }
    }

    pub fn string(value: impl Into<Arc<str>>) -> Self {
        Value::String(value.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Array::new(items.into_iter().collect()))
    }

    pub fn dictionary(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Dictionary(Dictionary::from_pairs(entries))
    }

    pub fn identifier(name: impl AsRef<str>) -> Self {
        Value::Identifier(Key::new(name))
    }

    pub fn label(name: impl AsRef<str>) -> Self {
        Value::Label(Key::new(name))
    }

    pub fn error(fault: Fault) -> Self {
        Value::Error(Arc::new(fault))
    }

    /// The "no value" marker: an empty array.
    pub fn nil() -> Self {
        Value::Array(Array::default())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Array(array) if array.is_empty())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn as_error(&self) -> Option<&Fault> {
        match self {
            Value::Error(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match *self {
            Value::Bool(b) => Some(Number::Bool(b)),
            Value::Int(i) => Some(Number::Int(i)),
            Value::Rational(r) => Some(Number::Rational(r)),
            Value::Double(d) => Some(Number::Double(d)),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.as_number().is_some()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_closure(&self) -> Option<&Arc<Closure>> {
        match self {
            Value::Function(closure) => Some(closure),
            _ => None,
        }
    }

    /// Name used by identifiers, labels and string keys.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Identifier(key) | Value::Label(key) => Some(key.as_str()),
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Arrays and dictionaries take part in broadcasting.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Dictionary(_))
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Rational(_) => TypeTag::Rational,
            Value::Double(_) => TypeTag::Double,
            Value::Array(_) => TypeTag::Array,
            Value::Range(_) => TypeTag::Range,
            Value::Dictionary(_) => TypeTag::Dictionary,
            Value::String(_) => TypeTag::String,
            Value::Sheet(_) => TypeTag::Sheet,
            Value::TypeTag(_) | Value::TypeConstraint(_) => TypeTag::Type,
            Value::Selection(_) => TypeTag::Selection,
            Value::Function(_) => TypeTag::Function,
            Value::Label(_) => TypeTag::Label,
            Value::Identifier(_) => TypeTag::Identifier,
            Value::Error(_) => TypeTag::Error,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// Order between numbers (after promotion) or between strings.
    pub fn partial_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => number::compare(self.as_number()?, other.as_number()?),
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Bool(b) => Value::Bool(b),
            Number::Int(i) => Value::Int(i),
            Number::Rational(r) => Value::Rational(r),
            Number::Double(d) => Value::Double(d),
        }
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        Value::error(fault)
    }
}

impl From<Result<Value, Fault>> for Value {
    fn from(result: Result<Value, Fault>) -> Self {
        result.unwrap_or_else(Value::from)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<Array> for Value {
    fn from(array: Array) -> Self {
        Value::Array(array)
    }
}

impl From<Range> for Value {
    fn from(range: Range) -> Self {
        Value::Range(Arc::new(range))
    }
}

impl From<Dictionary> for Value {
    fn from(dictionary: Dictionary) -> Self {
        Value::Dictionary(dictionary)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => return number::equal(a, b),
            (Some(_), None) | (None, Some(_)) => return false,
            (None, None) => {}
        }
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Dictionary(a), Value::Dictionary(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sheet(a), Value::Sheet(b)) => a == b,
            (Value::TypeTag(a), Value::TypeTag(b)) => a == b,
            (Value::TypeConstraint(a), Value::TypeConstraint(b)) => a == b,
            (Value::Selection(a), Value::Selection(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Label(a), Value::Label(b)) => a == b,
            (Value::Identifier(a), Value::Identifier(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(number) = self.as_number() {
            0u8.hash(state);
            number.hash_key().hash(state);
            return;
        }
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Array(array) => array.hash(state),
            Value::Range(range) => range.hash(state),
            Value::Dictionary(dictionary) => dictionary.hash(state),
            Value::String(s) => s.hash(state),
            Value::Sheet(fragment) => fragment.hash(state),
            Value::TypeTag(tag) => tag.hash(state),
            Value::TypeConstraint(constraint) => constraint.hash(state),
            Value::Selection(selected) => selected.hash(state),
            Value::Function(closure) => (Arc::as_ptr(closure) as *const () as usize).hash(state),
            Value::Label(key) | Value::Identifier(key) => key.hash(state),
            Value::Error(fault) => fault.hash(state),
            Value::Bool(_) | Value::Int(_) | Value::Rational(_) | Value::Double(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = FxHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn numbers_are_equal_across_rungs() {
        let two = [Value::Int(2), Value::rational(4, 2), Value::Double(2.0)];
        for a in &two {
            for b in &two {
                assert_eq!(a, b);
                assert_eq!(hash_of(a), hash_of(b));
            }
        }
        assert_eq!(Value::rational(1, 2), Value::Double(0.5));
        assert_ne!(Value::Int(2), Value::string("2"));
    }

    #[test]
    fn large_ints_key_apart_from_nearby_doubles() {
        let big = 1i64 << 53;
        assert_eq!(Value::Int(big), Value::Double(big as f64));
        assert_ne!(Value::Int(big + 1), Value::Double(big as f64));
        let dict = Value::dictionary([
            (Value::Int(big + 1), Value::string("int")),
            (Value::Double(big as f64), Value::string("double")),
        ]);
        match dict {
            Value::Dictionary(dict) => assert_eq!(dict.len(), 2),
            other => panic!("expected a dictionary, got {other}"),
        }
    }

    #[test]
    fn rational_constructor_normalizes() {
        assert!(matches!(Value::rational(6, 3), Value::Int(2)));
        assert!(matches!(Value::rational(1, 0), Value::Error(_)));
        assert!(matches!(Value::rational(2, 4), Value::Rational(_)));
    }

    #[test]
    fn nil_is_the_empty_array() {
        assert!(Value::nil().is_nil());
        assert!(!Value::array([Value::Int(1)]).is_nil());
        assert_eq!(Value::nil().type_tag(), TypeTag::Array);
    }

    #[test]
    fn strings_and_numbers_order() {
        assert_eq!(Value::string("a").partial_order(&Value::string("b")), Some(Ordering::Less));
        assert_eq!(Value::Int(3).partial_order(&Value::rational(5, 2)), Some(Ordering::Greater));
        assert_eq!(Value::Int(3).partial_order(&Value::string("3")), None);
    }
}
