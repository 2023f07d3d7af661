//! Primitive op-codes and their table entries.

use crate::dictionary::Dictionary;
use crate::error::Fault;
use crate::function::Closure;
use crate::interpreter::Interpreter;
use crate::number::{Arith, Math};
use crate::ops::{self, Comparison};
use crate::range::{Bounds, Range};
use crate::select;
use crate::types::{self, TypeConstraint};
use crate::value::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Arith(Arith),
    Compare(Comparison),
    Not,
    And,
    Or,
    Math(Math),
    Atan2,
    Range(Bounds),
    /// `__`
    Step,
    /// `counta`
    Count,
    /// `.`
    At,
    /// `/.`
    Select,
    /// `<-`
    Set,
    /// `++`
    Insert,
    /// `--`
    Remove,
    /// `;`
    Group,
    /// `;-`
    Ungroup,
    Is,
    Random,
    Map,
    Filter,
    Reduce,
    /// `:`
    Pair,
    /// `\`
    Raise,
    /// `?`
    When,
    /// `??`
    Coalesce,
    /// `???`
    Recover,
}

/// Run `op` on arguments bound left-then-right.
pub fn apply(op: Op, arguments: Vec<Value>, interpreter: &mut Interpreter<'_>) -> Value {
    let limits = *interpreter.limits();
    match (op, arguments.as_slice()) {
        (Op::Arith(arith), [a, b]) => ops::arith(arith, a, b),
        (Op::Compare(comparison), [a, b]) => ops::compare(comparison, a, b),
        (Op::Not, [a]) => ops::not(a),
        (Op::And, [a, b]) => and(a, b, interpreter),
        (Op::Or, [a, b]) => or(a, b, interpreter),
        (Op::Math(math), [a]) => ops::math(math, a),
        (Op::Atan2, [y, x]) => ops::atan2(y, x),
        (Op::Range(bounds), [a, b]) => Range::build(bounds, a, b).map(Value::from).into(),
        (Op::Step, [range, delta]) => match range {
            Value::Range(range) => range.with_delta(delta).map(Value::from).into(),
            other => Fault::undefined("__", &[other.type_name(), delta.type_name()]).into(),
        },
        (Op::Count, [a]) => ops::count(a, &limits),
        (Op::At, [container, component]) => select::at(container, component, &limits),
        (Op::Select, [target, component]) => select::select(target, component),
        (Op::Set, [selection, value]) => select::set(selection, value, &limits),
        (Op::Insert, [target, value]) => select::insert(target, value, &limits),
        (Op::Remove, [selection]) => select::remove(selection, &limits),
        (Op::Group, [a]) => ops::group(a),
        (Op::Ungroup, [a]) => ops::ungroup(a),
        (Op::Is, [value, set]) => types::is(value, set).map(Value::Bool).into(),
        (Op::Random, [a]) => ops::random(a, &limits),
        (Op::Map, [collection, f]) => map(collection, f, interpreter),
        (Op::Filter, [collection, f]) => filter(collection, f, interpreter),
        (Op::Reduce, [collection, initial, f]) => reduce(collection, initial, f, interpreter),
        (Op::Pair, [key, value]) => pair(key, value),
        (Op::Raise, [message]) => raise(message),
        (Op::When, [condition, then]) => match condition {
            Value::Bool(true) => interpreter.force(then),
            Value::Bool(false) => Value::nil(),
            other => Fault::undefined("?", &[other.type_name()]).into(),
        },
        (Op::Coalesce, [value, fallback]) if value.is_nil() => interpreter.force(fallback),
        (Op::Coalesce, [value, _]) => value.clone(),
        (Op::Recover, [value, fallback]) if value.is_error() => interpreter.force(fallback),
        (Op::Recover, [value, _]) => value.clone(),
        (op, arguments) => Fault::shape(format!(
            "{op:?} cannot take {} arguments",
            arguments.len()
        ))
        .into(),
    }
}

/// Short-circuit and; `false && x` never evaluates `x`.
fn and(a: &Value, b: &Value, interpreter: &mut Interpreter<'_>) -> Value {
    match a {
        Value::Bool(false) => Value::Bool(false),
        Value::Bool(true) => match interpreter.force(b) {
            result @ (Value::Bool(_) | Value::Error(_)) => result,
            other => Fault::undefined("&&", &["Bool", other.type_name()]).into(),
        },
        other => Fault::undefined("&&", &[other.type_name()]).into(),
    }
}

/// Short-circuit or; between two types it builds a union.
fn or(a: &Value, b: &Value, interpreter: &mut Interpreter<'_>) -> Value {
    match a {
        Value::Bool(true) => Value::Bool(true),
        Value::Bool(false) => match interpreter.force(b) {
            result @ (Value::Bool(_) | Value::Error(_)) => result,
            other => Fault::undefined("||", &["Bool", other.type_name()]).into(),
        },
        Value::TypeTag(_) | Value::TypeConstraint(_) => {
            let right = interpreter.force(b);
            match (TypeConstraint::from_value(a), TypeConstraint::from_value(&right)) {
                (Some(left), Some(right)) => {
                    Value::TypeConstraint(Arc::new(TypeConstraint::union(left, right)))
                }
                _ if right.is_error() => right,
                _ => Fault::undefined("||", &["Type", right.type_name()]).into(),
            }
        }
        other => Fault::undefined("||", &[other.type_name()]).into(),
    }
}

/// Members visited by the higher-order builtins.
fn members(op: &str, collection: &Value, max_elements: usize) -> Result<Vec<Value>, Fault> {
    match collection {
        Value::Array(array) => Ok(array.items().to_vec()),
        Value::Range(range) => Ok(range.materialize(max_elements)?.items().to_vec()),
        Value::Dictionary(dictionary) => Ok(dictionary.values().cloned().collect()),
        other => Err(Fault::undefined(op, &[other.type_name()])),
    }
}

fn callable<'v>(op: &str, collection: &Value, f: &'v Value) -> Result<&'v Arc<Closure>, Fault> {
    f.as_closure()
        .ok_or_else(|| Fault::undefined(op, &[collection.type_name(), f.type_name()]))
}

fn map(collection: &Value, f: &Value, interpreter: &mut Interpreter<'_>) -> Value {
    let callee = match callable("map", collection, f) {
        Ok(callee) => callee,
        Err(fault) => return fault.into(),
    };
    match collection {
        Value::Dictionary(dictionary) => {
            dictionary.map_values(|value| interpreter.call(callee, vec![value.clone()]))
        }
        other => {
            let items = match members("map", other, interpreter.limits().max_elements) {
                Ok(items) => items,
                Err(fault) => return fault.into(),
            };
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let result = interpreter.call(callee, vec![item]);
                if result.is_error() {
                    return result;
                }
                results.push(result);
            }
            Value::array(results)
        }
    }
}

fn filter(collection: &Value, f: &Value, interpreter: &mut Interpreter<'_>) -> Value {
    let callee = match callable("filter", collection, f) {
        Ok(callee) => callee,
        Err(fault) => return fault.into(),
    };
    let keep = |interpreter: &mut Interpreter<'_>, item: &Value| -> Result<bool, Value> {
        match interpreter.call(callee, vec![item.clone()]) {
            Value::Bool(keep) => Ok(keep),
            error @ Value::Error(_) => Err(error),
            other => Err(Fault::undefined("filter", &[other.type_name()]).into()),
        }
    };
    match collection {
        Value::Dictionary(dictionary) => {
            let mut entries = Vec::new();
            for (key, value) in dictionary.iter() {
                match keep(interpreter, value) {
                    Ok(true) => entries.push((key.clone(), value.clone())),
                    Ok(false) => {}
                    Err(error) => return error,
                }
            }
            Value::Dictionary(Dictionary::from_pairs(entries))
        }
        other => {
            let items = match members("filter", other, interpreter.limits().max_elements) {
                Ok(items) => items,
                Err(fault) => return fault.into(),
            };
            let mut kept = Vec::new();
            for item in items {
                match keep(interpreter, &item) {
                    Ok(true) => kept.push(item),
                    Ok(false) => {}
                    Err(error) => return error,
                }
            }
            Value::array(kept)
        }
    }
}

/// `collection reduce initial f`, calling `f accumulator item`.
fn reduce(collection: &Value, initial: &Value, f: &Value, interpreter: &mut Interpreter<'_>) -> Value {
    let callee = match callable("reduce", collection, f) {
        Ok(callee) => callee,
        Err(fault) => return fault.into(),
    };
    let items = match members("reduce", collection, interpreter.limits().max_elements) {
        Ok(items) => items,
        Err(fault) => return fault.into(),
    };
    let mut accumulator = initial.clone();
    for item in items {
        accumulator = interpreter.call(callee, vec![accumulator, item]);
        if accumulator.is_error() {
            break;
        }
    }
    accumulator
}

/// `key : value`, or zip an array of keys with an array of values.
fn pair(key: &Value, value: &Value) -> Value {
    match (key, value) {
        (Value::Array(keys), Value::Array(values)) if keys.len() == values.len() => {
            Value::Dictionary(Dictionary::from_pairs(
                keys.iter().cloned().zip(values.iter().cloned()),
            ))
        }
        _ => Value::dictionary([(key.clone(), value.clone())]),
    }
}

fn raise(message: &Value) -> Value {
    match message {
        Value::String(text) => Fault::user(text.to_string()).into(),
        other => Fault::user(other.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::Limits;
    use crate::error::ErrorKind;
    use crate::function::Function;
    use crate::program::Program;

    fn with_interpreter<T>(f: impl FnOnce(&mut Interpreter<'_>) -> T) -> T {
        let catalog = Catalog::standard();
        let mut interpreter = Interpreter::new(&catalog, Limits::default());
        f(&mut interpreter)
    }

    /// Closure that fails the test if it is ever forced.
    fn exploding() -> Value {
        let body = Program::builder()
            .literal(Value::string("forced"))
            .apply("\\")
            .build();
        Value::Function(Arc::new(Closure::new(Arc::new(Function::program(body)))))
    }

    #[test]
    fn short_circuits_skip_the_right_side() {
        with_interpreter(|interpreter| {
            let and = apply(Op::And, vec![Value::Bool(false), exploding()], interpreter);
            assert_eq!(and, Value::Bool(false));
            let or = apply(Op::Or, vec![Value::Bool(true), exploding()], interpreter);
            assert_eq!(or, Value::Bool(true));
            let when = apply(Op::When, vec![Value::Bool(false), exploding()], interpreter);
            assert!(when.is_nil());
            let coalesce = apply(Op::Coalesce, vec![Value::Int(1), exploding()], interpreter);
            assert_eq!(coalesce, Value::Int(1));
            let forced = apply(Op::Coalesce, vec![Value::nil(), exploding()], interpreter);
            assert_eq!(forced.as_error().map(|f| f.kind), Some(ErrorKind::User));
        });
    }

    #[test]
    fn recover_observes_errors() {
        with_interpreter(|interpreter| {
            let error = Value::from(Fault::domain("0/0"));
            assert_eq!(apply(Op::Recover, vec![error.clone(), Value::Int(0)], interpreter), Value::Int(0));
            assert_eq!(apply(Op::Coalesce, vec![error.clone(), Value::Int(0)], interpreter), error);
        });
    }

    #[test]
    fn types_union_with_or() {
        with_interpreter(|interpreter| {
            let union = apply(
                Op::Or,
                vec![Value::TypeTag(types::TypeTag::Int), Value::TypeTag(types::TypeTag::String)],
                interpreter,
            );
            let is_text = apply(Op::Is, vec![Value::string("x"), union.clone()], interpreter);
            assert_eq!(is_text, Value::Bool(true));
            let is_double = apply(Op::Is, vec![Value::Double(1.5), union], interpreter);
            assert_eq!(is_double, Value::Bool(false));
        });
    }

    #[test]
    fn pairs_build_dictionaries() {
        let zipped = pair(
            &Value::array([Value::string("a"), Value::string("b")]),
            &Value::array([Value::Int(1), Value::Int(2)]),
        );
        let Value::Dictionary(dictionary) = &zipped else {
            panic!("expected a dictionary, got {zipped}");
        };
        assert_eq!(dictionary.get_str("b"), Some(&Value::Int(2)));
        assert_eq!(pair(&Value::Int(1), &Value::Int(2)), Value::dictionary([(Value::Int(1), Value::Int(2))]));
    }

    #[test]
    fn raise_makes_user_errors() {
        let error = raise(&Value::string("bad input"));
        assert_eq!(error.as_error(), Some(&Fault::user("bad input")));
    }
}
