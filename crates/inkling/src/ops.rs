//! Operator dispatch over values.
//!
//! Each entry point runs the absorbing-error guard once, then dispatches on
//! the operand cases: numbers go to the promotion ladder, containers
//! broadcast, and everything else is an undefined-operator error.

use crate::array::Array;
use crate::config::Limits;
use crate::error::Fault;
use crate::number::{self, Arith, Math};
use crate::range::Range;
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::Less => ordering == Ordering::Less,
            Comparison::LessEqual => ordering != Ordering::Greater,
            Comparison::Greater => ordering == Ordering::Greater,
            Comparison::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

/// First Error operand, if any.
pub fn absorb<'v>(operands: &[&'v Value]) -> Option<&'v Value> {
    operands.iter().copied().find(|v| v.is_error())
}

fn undefined(op: &str, a: &Value, b: &Value) -> Value {
    Fault::undefined(op, &[a.type_name(), b.type_name()]).into()
}

/// Lift a binary operation over arrays and dictionaries. `None` when
/// neither operand is a container, or the containers are of different
/// kinds.
fn lift(a: &Value, b: &Value, f: &mut dyn FnMut(&Value, &Value) -> Value) -> Option<Value> {
    Some(match (a, b) {
        (Value::Array(x), Value::Array(y)) => x.zip_with(y, |p, q| f(p, q)),
        (Value::Dictionary(x), Value::Dictionary(y)) => x.zip_with(y, |p, q| f(p, q)),
        (Value::Array(x), scalar) if !scalar.is_container() => x.map_values(|p| f(p, scalar)),
        (scalar, Value::Array(y)) if !scalar.is_container() => y.map_values(|q| f(scalar, q)),
        (Value::Dictionary(x), scalar) if !scalar.is_container() => x.map_values(|p| f(p, scalar)),
        (scalar, Value::Dictionary(y)) if !scalar.is_container() => y.map_values(|q| f(scalar, q)),
        _ => return None,
    })
}

fn lift_unary(a: &Value, f: &mut dyn FnMut(&Value) -> Value) -> Option<Value> {
    match a {
        Value::Array(x) => Some(x.map_values(|p| f(p))),
        Value::Dictionary(x) => Some(x.map_values(|p| f(p))),
        _ => None,
    }
}

pub fn arith(op: Arith, a: &Value, b: &Value) -> Value {
    if let Some(error) = absorb(&[a, b]) {
        return error.clone();
    }
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return number::arith(op, x, y).map(Value::from).into();
    }
    match (op, a, b) {
        (Arith::Mul, Value::Array(x), Value::Array(y)) if x.dimension() > 1 || y.dimension() > 1 => {
            matmul(x, y)
        }
        (Arith::Add, Value::String(x), Value::String(y)) => Value::string(format!("{x}{y}")),
        (Arith::Add | Arith::Sub, Value::Range(range), amount) if amount.is_number() => {
            shift(range, op, amount)
        }
        (Arith::Add, amount, Value::Range(range)) if amount.is_number() => {
            shift(range, op, amount)
        }
        _ => lift(a, b, &mut |x, y| arith(op, x, y)).unwrap_or_else(|| undefined(op.symbol(), a, b)),
    }
}

fn shift(range: &Range, op: Arith, amount: &Value) -> Value {
    match amount.as_number() {
        Some(n) => range.shifted(op, n).map(Value::from).into(),
        None => undefined(op.symbol(), &Value::Range(range.clone().into()), amount),
    }
}

/// Sum of pairwise products, stopping at the first error.
fn dot<'v>(pairs: impl Iterator<Item = (&'v Value, &'v Value)>) -> Value {
    let mut total = Value::Int(0);
    for (p, q) in pairs {
        let product = arith(Arith::Mul, p, q);
        if product.is_error() {
            return product;
        }
        total = arith(Arith::Add, &total, &product);
        if total.is_error() {
            return total;
        }
    }
    total
}

/// Rows of a dimension-2 array as slices.
fn rows(matrix: &Array) -> Result<Vec<&[Value]>, Fault> {
    if matrix.dimension() != 2 {
        return Err(Fault::shape(format!(
            "matrix multiply needs dimension 2, got {}",
            matrix.dimension()
        )));
    }
    matrix
        .iter()
        .map(|row| match row {
            Value::Array(row) => Ok(row.items()),
            other => Err(Fault::shape(format!("matrix row is a {}", other.type_name()))),
        })
        .collect()
}

/// Matrix product; a dimension-1 operand is the vector on its side.
pub fn matmul(a: &Array, b: &Array) -> Value {
    let inner_mismatch = |n: usize, m: usize| -> Value {
        Fault::shape(format!("inner dimensions {n} and {m} do not agree")).into()
    };
    match (a.dimension(), b.dimension()) {
        (1, _) => {
            let right = match rows(b) {
                Ok(rows) => rows,
                Err(fault) => return fault.into(),
            };
            if a.len() != right.len() {
                return inner_mismatch(a.len(), right.len());
            }
            let columns = b.next_count();
            let mut items = Vec::with_capacity(columns);
            for j in 0..columns {
                let entry = dot(a.iter().zip(right.iter().map(|row| &row[j])));
                if entry.is_error() {
                    return entry;
                }
                items.push(entry);
            }
            Value::Array(Array::new(items))
        }
        (_, 1) => {
            let left = match rows(a) {
                Ok(rows) => rows,
                Err(fault) => return fault.into(),
            };
            if a.next_count() != b.len() {
                return inner_mismatch(a.next_count(), b.len());
            }
            let mut items = Vec::with_capacity(left.len());
            for row in left {
                let entry = dot(row.iter().zip(b.iter()));
                if entry.is_error() {
                    return entry;
                }
                items.push(entry);
            }
            Value::Array(Array::new(items))
        }
        _ => {
            let (left, right) = match (rows(a), rows(b)) {
                (Ok(left), Ok(right)) => (left, right),
                (Err(fault), _) | (_, Err(fault)) => return fault.into(),
            };
            if a.next_count() != right.len() {
                return inner_mismatch(a.next_count(), right.len());
            }
            let columns = b.next_count();
            let mut product = Vec::with_capacity(left.len());
            for row in left {
                let mut entries = Vec::with_capacity(columns);
                for j in 0..columns {
                    let entry = dot(row.iter().zip(right.iter().map(|r| &r[j])));
                    if entry.is_error() {
                        return entry;
                    }
                    entries.push(entry);
                }
                product.push(Value::Array(Array::new(entries)));
            }
            Array::matrix(product).map(Value::Array).into()
        }
    }
}

pub fn compare(op: Comparison, a: &Value, b: &Value) -> Value {
    if let Some(error) = absorb(&[a, b]) {
        return error.clone();
    }
    match op {
        Comparison::Equal => Value::Bool(a == b),
        Comparison::NotEqual => Value::Bool(a != b),
        _ => order(op, a, b),
    }
}

fn order(op: Comparison, a: &Value, b: &Value) -> Value {
    if let Some(error) = absorb(&[a, b]) {
        return error.clone();
    }
    let comparable = (a.is_number() && b.is_number())
        || matches!((a, b), (Value::String(_), Value::String(_)));
    if comparable {
        return match a.partial_order(b) {
            Some(ordering) => Value::Bool(op.holds(ordering)),
            None => Fault::domain(format!("{} cannot order NaN", op.symbol())).into(),
        };
    }
    lift(a, b, &mut |x, y| order(op, x, y)).unwrap_or_else(|| undefined(op.symbol(), a, b))
}

pub fn not(a: &Value) -> Value {
    match a {
        Value::Error(_) => a.clone(),
        Value::Bool(b) => Value::Bool(!b),
        _ => lift_unary(a, &mut not)
            .unwrap_or_else(|| Fault::undefined("!", &[a.type_name()]).into()),
    }
}

pub fn math(op: Math, a: &Value) -> Value {
    if a.is_error() {
        return a.clone();
    }
    match a.as_number() {
        Some(x) => number::math(op, x).map(Value::from).into(),
        None => lift_unary(a, &mut |x| math(op, x))
            .unwrap_or_else(|| Fault::undefined(op.name(), &[a.type_name()]).into()),
    }
}

pub fn atan2(y: &Value, x: &Value) -> Value {
    if let Some(error) = absorb(&[y, x]) {
        return error.clone();
    }
    match (y.as_number(), x.as_number()) {
        (Some(p), Some(q)) => number::atan2(p, q).map(Value::from).into(),
        _ => lift(y, x, &mut atan2).unwrap_or_else(|| undefined("atan2", y, x)),
    }
}

/// `counta`: elements of a collection.
pub fn count(a: &Value, limits: &Limits) -> Value {
    let n = match a {
        Value::Error(_) => return a.clone(),
        Value::Array(array) => array.len(),
        Value::Dictionary(dictionary) => dictionary.len(),
        Value::String(s) => s.chars().count(),
        Value::Sheet(fragment) => fragment.sheet().lines.len() + fragment.sheet().texts.len(),
        Value::Range(range) => match range.materialize(limits.max_elements) {
            Ok(items) => items.len(),
            Err(fault) => return fault.into(),
        },
        other => return Fault::undefined("counta", &[other.type_name()]).into(),
    };
    Value::Int(n as i64)
}

/// `;`
pub fn group(a: &Value) -> Value {
    match a {
        Value::Error(_) => a.clone(),
        Value::Array(array) => array.grouped().map(Value::Array).into(),
        other => Fault::undefined(";", &[other.type_name()]).into(),
    }
}

/// `;-`
pub fn ungroup(a: &Value) -> Value {
    match a {
        Value::Error(_) => a.clone(),
        Value::Array(array) => Value::Array(array.flattened()),
        other => Fault::undefined(";-", &[other.type_name()]).into(),
    }
}

fn random_u64() -> Result<u64, Fault> {
    let mut bytes = [0u8; 8];
    getrandom::fill(&mut bytes).map_err(|err| Fault::limit(format!("no entropy source: {err}")))?;
    Ok(u64::from_le_bytes(bytes))
}

/// Uniform in [0, 1).
fn random_unit() -> Result<f64, Fault> {
    Ok((random_u64()? >> 11) as f64 / (1u64 << 53) as f64)
}

fn random_below(bound: usize) -> Result<usize, Fault> {
    Ok((random_u64()? % bound as u64) as usize)
}

fn random_element(array: &Array) -> Result<Value, Fault> {
    if array.is_empty() {
        return Err(Fault::bounds(0, 0));
    }
    Ok(array.items()[random_below(array.len())?].clone())
}

/// `random`: an element of a collection, a member of a range, or a number
/// in `[0, n)`.
pub fn random(a: &Value, limits: &Limits) -> Value {
    let result = match a {
        Value::Error(_) => return a.clone(),
        Value::Array(array) => random_element(array),
        Value::Range(range) if range.delta().as_number().is_some_and(|d| d.is_zero()) => {
            match (range.lower().and_then(Value::as_number), range.upper().and_then(Value::as_number)) {
                (Some(lo), Some(hi)) => random_unit().map(|t| {
                    let (lo, hi) = (lo.to_f64(), hi.to_f64());
                    Value::Double(lo + t * (hi - lo))
                }),
                _ => Err(Fault::shape("random needs a bounded numeric range")),
            }
        }
        Value::Range(range) => range
            .materialize(limits.max_elements)
            .and_then(|items| random_element(&items)),
        Value::Int(n) if *n > 0 => random_below(*n as usize).map(|i| Value::Int(i as i64)),
        Value::Double(x) if x.is_finite() && *x > 0.0 => random_unit().map(|t| Value::Double(t * x)),
        Value::Int(_) | Value::Double(_) => Err(Fault::domain(format!("random needs a positive bound, got {a}"))),
        other => Err(Fault::undefined("random", &[other.type_name()])),
    };
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ints(values: &[i64]) -> Value {
        Value::array(values.iter().copied().map(Value::Int))
    }

    fn matrix(rows: &[&[i64]]) -> Value {
        Array::matrix(rows.iter().map(|row| ints(row)).collect())
            .map(Value::Array)
            .unwrap()
    }

    fn kind(value: &Value) -> Option<ErrorKind> {
        value.as_error().map(|f| f.kind)
    }

    #[test]
    fn errors_absorb_on_either_side() {
        let error = Value::from(Fault::user("boom"));
        let operands = [Value::Int(1), ints(&[1, 2]), Value::string("x"), Value::nil()];
        for operand in &operands {
            assert_eq!(arith(Arith::Add, &error, operand), error);
            assert_eq!(arith(Arith::Mul, operand, &error), error);
            assert_eq!(compare(Comparison::Equal, operand, &error), error);
            assert_eq!(compare(Comparison::Less, &error, operand), error);
            assert_eq!(atan2(operand, &error), error);
        }
        assert_eq!(not(&error), error);
        assert_eq!(math(Math::Sqrt, &error), error);
    }

    #[test]
    fn promotion_boundary_widens() {
        let sum = arith(Arith::Add, &Value::Int(i64::MAX), &Value::Int(1));
        assert!(matches!(sum, Value::Double(_)));
        assert_eq!(sum, Value::Double(i64::MAX as f64 + 1.0));
    }

    #[test]
    fn broadcasting() {
        assert_eq!(arith(Arith::Add, &ints(&[1, 2]), &Value::Int(10)), ints(&[11, 12]));
        assert_eq!(arith(Arith::Mul, &ints(&[1, 2]), &ints(&[3, 4])), ints(&[3, 8]));
        assert_eq!(kind(&arith(Arith::Add, &ints(&[1]), &ints(&[1, 2]))), Some(ErrorKind::Shape));
        let with_zero = arith(Arith::Div, &Value::Int(0), &ints(&[1, 0]));
        assert_eq!(kind(&with_zero), Some(ErrorKind::Domain));
        assert_eq!(
            compare(Comparison::Less, &ints(&[1, 5]), &Value::Int(3)),
            Value::array([Value::Bool(true), Value::Bool(false)])
        );
    }

    #[test]
    fn matrix_product() {
        let row = matrix(&[&[1, 2]]);
        let column = matrix(&[&[3], &[4]]);
        let (Value::Array(a), Value::Array(b)) = (&row, &column) else {
            unreachable!()
        };
        assert_eq!(matmul(a, b), matrix(&[&[11]]));
        assert_eq!(kind(&arith(Arith::Mul, &row, &row)), Some(ErrorKind::Shape));

        let square = matrix(&[&[1, 2], &[3, 4]]);
        assert_eq!(arith(Arith::Mul, &square, &ints(&[1, 1])), ints(&[3, 7]));
        assert_eq!(arith(Arith::Mul, &ints(&[1, 1]), &square), ints(&[4, 6]));
    }

    #[test]
    fn strings_concatenate_and_order() {
        assert_eq!(arith(Arith::Add, &Value::string("ab"), &Value::string("c")), Value::string("abc"));
        assert_eq!(kind(&arith(Arith::Sub, &Value::string("a"), &Value::Int(1))), Some(ErrorKind::UndefinedOperator));
        assert_eq!(compare(Comparison::Less, &Value::string("a"), &Value::string("b")), Value::Bool(true));
    }

    #[test]
    fn equality_is_structural_and_single() {
        assert_eq!(compare(Comparison::Equal, &ints(&[1, 2]), &ints(&[1, 2])), Value::Bool(true));
        assert_eq!(compare(Comparison::NotEqual, &Value::Int(1), &Value::string("1")), Value::Bool(true));
    }

    #[test]
    fn counting_and_random() {
        let limits = Limits::default();
        assert_eq!(count(&Value::string("héllo"), &limits), Value::Int(5));
        assert_eq!(count(&ints(&[1, 2, 3]), &limits), Value::Int(3));
        let pick = random(&ints(&[7, 8, 9]), &limits);
        assert!(matches!(pick, Value::Int(7..=9)));
        assert!(matches!(random(&Value::Int(3), &limits), Value::Int(0..=2)));
        assert_eq!(kind(&random(&Value::nil(), &limits)), Some(ErrorKind::Bounds));
    }
}
