//! Numeric promotion ladder: Bool < Int < Rational < Double.
//!
//! Every binary operation promotes both operands to the higher rung and
//! computes there. Int and Rational arithmetic is checked; on overflow the
//! *result* is recomputed as Double. Double results that would be NaN are
//! reported as domain errors instead.

use crate::error::Fault;
use num_rational::Ratio;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub, One, Signed, Zero};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

pub type Rational = Ratio<i64>;

/// 2^63, the first double past `i64::MAX`.
const I64_BOUND: f64 = 9.223_372_036_854_776e18;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Bool(bool),
    Int(i64),
    Rational(Rational),
    Double(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    Bool,
    Int,
    Rational,
    Double,
}

/// Binary arithmetic operators of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Root,
}

impl Arith {
    pub fn symbol(&self) -> &'static str {
        match self {
            Arith::Add => "+",
            Arith::Sub => "-",
            Arith::Mul => "*",
            Arith::Div => "/",
            Arith::Rem => "%",
            Arith::Pow => "**",
            Arith::Root => "*/",
        }
    }
}

/// Unary numeric functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Math {
    Floor,
    Round,
    Ceil,
    Abs,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

impl Math {
    pub fn name(&self) -> &'static str {
        match self {
            Math::Floor => "floor",
            Math::Round => "round",
            Math::Ceil => "ceil",
            Math::Abs => "abs",
            Math::Sqrt => "sqrt",
            Math::Sin => "sin",
            Math::Cos => "cos",
            Math::Tan => "tan",
            Math::Asin => "asin",
            Math::Acos => "acos",
            Math::Atan => "atan",
        }
    }
}

impl Number {
    fn rank(&self) -> Rank {
        match self {
            Number::Bool(_) => Rank::Bool,
            Number::Int(_) => Rank::Int,
            Number::Rational(_) => Rank::Rational,
            Number::Double(_) => Rank::Double,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Number::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Number::Int(i) => i as f64,
            Number::Rational(r) => ratio_to_f64(r),
            Number::Double(d) => d,
        }
    }

    /// Exact value, `None` for doubles.
    pub fn to_ratio(&self) -> Option<Rational> {
        match *self {
            Number::Bool(b) => Some(Rational::from_integer(b as i64)),
            Number::Int(i) => Some(Rational::from_integer(i)),
            Number::Rational(r) => Some(r),
            Number::Double(_) => None,
        }
    }

    fn to_int(&self) -> Option<i64> {
        match *self {
            Number::Bool(b) => Some(b as i64),
            Number::Int(i) => Some(i),
            _ => None,
        }
    }

    /// Integer value when the number is integral and fits an `i64`.
    pub fn as_index(&self) -> Option<i64> {
        match *self {
            Number::Bool(_) => None,
            Number::Int(i) => Some(i),
            Number::Rational(r) if r.is_integer() => Some(*r.numer()),
            Number::Double(d) => match integral(d) {
                Number::Int(i) => Some(i),
                _ => None,
            },
            Number::Rational(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Bool(b) => !b,
            Number::Int(i) => i == 0,
            Number::Rational(r) => r.is_zero(),
            Number::Double(d) => d == 0.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match *self {
            Number::Bool(_) => false,
            Number::Int(i) => i < 0,
            Number::Rational(r) => r.is_negative(),
            Number::Double(d) => d < 0.0,
        }
    }

    /// Hashable stand-in that agrees with [`equal`].
    pub fn hash_key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.to_f64())
    }
}

pub fn ratio_to_f64(r: Rational) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

/// Reduced ratio, `None` for a zero denominator or an operand whose
/// normalization could overflow.
pub fn make_ratio(numer: i64, denom: i64) -> Option<Rational> {
    if denom == 0 || numer == i64::MIN || denom == i64::MIN {
        return None;
    }
    Some(Rational::new(numer, denom))
}

/// Collapse whole ratios back to Int.
pub fn normalize(r: Rational) -> Number {
    if r.is_integer() {
        Number::Int(*r.numer())
    } else {
        Number::Rational(r)
    }
}

/// Int when `d` is integral and representable, otherwise Double.
pub fn integral(d: f64) -> Number {
    if d.is_finite() && d.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&d) {
        Number::Int(d as i64)
    } else {
        Number::Double(d)
    }
}

pub fn arith(op: Arith, a: Number, b: Number) -> Result<Number, Fault> {
    if let (Number::Bool(x), Number::Bool(y)) = (a, b) {
        match op {
            Arith::Add => return Ok(Number::Bool(x || y)),
            Arith::Mul => return Ok(Number::Bool(x && y)),
            Arith::Sub => return Ok(Number::Bool(x && !y)),
            _ => {}
        }
    }
    match a.rank().max(b.rank()) {
        Rank::Double => double(op, a.to_f64(), b.to_f64()),
        Rank::Rational => match (a.to_ratio(), b.to_ratio()) {
            (Some(x), Some(y)) => rational(op, x, y),
            _ => double(op, a.to_f64(), b.to_f64()),
        },
        Rank::Int | Rank::Bool => match (a.to_int(), b.to_int()) {
            (Some(x), Some(y)) => int(op, x, y),
            _ => double(op, a.to_f64(), b.to_f64()),
        },
    }
}

fn int(op: Arith, x: i64, y: i64) -> Result<Number, Fault> {
    let widened = || double(op, x as f64, y as f64);
    match op {
        Arith::Add => x.checked_add(y).map(Number::Int).map_or_else(widened, Ok),
        Arith::Sub => x.checked_sub(y).map(Number::Int).map_or_else(widened, Ok),
        Arith::Mul => x.checked_mul(y).map(Number::Int).map_or_else(widened, Ok),
        Arith::Div => {
            if y == 0 {
                return divide_by_zero(x as f64);
            }
            if x.checked_rem(y) == Some(0) {
                x.checked_div(y).map(Number::Int).map_or_else(widened, Ok)
            } else {
                make_ratio(x, y).map(normalize).map_or_else(widened, Ok)
            }
        }
        Arith::Rem => {
            if y == 0 {
                return Err(Fault::domain("remainder by zero"));
            }
            // i64::MIN % -1 is the only overflow and its remainder is 0
            Ok(Number::Int(x.checked_rem(y).unwrap_or(0)))
        }
        Arith::Pow | Arith::Root => rational(op, Rational::from_integer(x), Rational::from_integer(y)),
    }
}

fn rational(op: Arith, x: Rational, y: Rational) -> Result<Number, Fault> {
    let widened = || double(op, ratio_to_f64(x), ratio_to_f64(y));
    let exact = match op {
        Arith::Add => x.checked_add(&y),
        Arith::Sub => x.checked_sub(&y),
        Arith::Mul => x.checked_mul(&y),
        Arith::Div => {
            if y.is_zero() {
                return divide_by_zero(ratio_to_f64(x));
            }
            x.checked_div(&y)
        }
        Arith::Rem => {
            if y.is_zero() {
                return Err(Fault::domain("remainder by zero"));
            }
            x.checked_div(&y)
                .map(|q| q.trunc())
                .and_then(|q| q.checked_mul(&y))
                .and_then(|p| x.checked_sub(&p))
        }
        Arith::Pow if y.is_integer() => rational_pow(x, *y.numer()),
        Arith::Root if y.is_integer() => exact_root(x, *y.numer())?,
        Arith::Pow | Arith::Root => None,
    };
    exact.map(normalize).map_or_else(widened, Ok)
}

fn rational_pow(base: Rational, exponent: i64) -> Option<Rational> {
    if exponent >= 0 {
        let exponent = usize::try_from(exponent).ok()?;
        return num_traits::checked_pow(base, exponent);
    }
    if base.is_zero() || *base.numer() == i64::MIN {
        return None;
    }
    let exponent = usize::try_from(exponent.checked_neg()?).ok()?;
    num_traits::checked_pow(Rational::one().checked_div(&base)?, exponent)
}

/// Exact `n`-th root, `Ok(None)` when the root is irrational.
fn exact_root(x: Rational, n: i64) -> Result<Option<Rational>, Fault> {
    if n == 0 {
        return Err(Fault::domain("the zeroth root is undefined"));
    }
    if x.is_negative() && n % 2 == 0 {
        return Err(Fault::domain("even root of a negative number"));
    }
    let Some(k) = n.checked_abs().and_then(|k| u32::try_from(k).ok()) else {
        return Ok(None);
    };
    let root = match (integer_root(*x.numer(), k), integer_root(*x.denom(), k)) {
        (Some(p), Some(q)) => make_ratio(p, q),
        _ => None,
    };
    Ok(match root {
        Some(r) if n < 0 => Rational::one().checked_div(&r),
        other => other,
    })
}

fn integer_root(v: i64, k: u32) -> Option<i64> {
    if v < 0 {
        return integer_root(v.checked_neg()?, k).map(|r| -r);
    }
    let estimate = (v as f64).powf(1.0 / k as f64).round() as i64;
    (estimate.saturating_sub(1)..=estimate.saturating_add(1))
        .find(|candidate| *candidate >= 0 && candidate.checked_pow(k) == Some(v))
}

fn divide_by_zero(numerator: f64) -> Result<Number, Fault> {
    if numerator == 0.0 || numerator.is_nan() {
        Err(Fault::domain("0 / 0 is undefined"))
    } else {
        Ok(Number::Double(numerator / 0.0))
    }
}

fn double(op: Arith, x: f64, y: f64) -> Result<Number, Fault> {
    let result = match op {
        Arith::Add => x + y,
        Arith::Sub => x - y,
        Arith::Mul => x * y,
        Arith::Div => {
            if y == 0.0 {
                return divide_by_zero(x);
            }
            x / y
        }
        Arith::Rem => {
            if y == 0.0 {
                return Err(Fault::domain("remainder by zero"));
            }
            x % y
        }
        Arith::Pow => x.powf(y),
        Arith::Root => {
            if y == 0.0 {
                return Err(Fault::domain("the zeroth root is undefined"));
            }
            if x < 0.0 {
                let odd = y.fract() == 0.0 && (y % 2.0).abs() == 1.0;
                if !odd {
                    return Err(Fault::domain("even root of a negative number"));
                }
                -(-x).powf(1.0 / y)
            } else {
                x.powf(1.0 / y)
            }
        }
    };
    if result.is_nan() {
        return Err(Fault::domain(undefined_message(op, x, y)));
    }
    Ok(Number::Double(result))
}

fn undefined_message(op: Arith, x: f64, y: f64) -> String {
    match op {
        Arith::Add | Arith::Sub if x.is_infinite() && y.is_infinite() => "∞ − ∞ is undefined".into(),
        Arith::Mul if x.is_infinite() || y.is_infinite() => "0 × ∞ is undefined".into(),
        Arith::Div if x.is_infinite() && y.is_infinite() => "∞ / ∞ is undefined".into(),
        Arith::Pow if x < 0.0 => "negative base with a fractional exponent".into(),
        _ => format!("{x:?} {} {y:?} is undefined", op.symbol()),
    }
}

pub fn math(op: Math, x: Number) -> Result<Number, Fault> {
    match op {
        Math::Floor | Math::Round | Math::Ceil => Ok(match x {
            Number::Bool(b) => Number::Int(b as i64),
            Number::Int(i) => Number::Int(i),
            Number::Rational(r) => round_ratio(op, r),
            Number::Double(d) => integral(match op {
                Math::Floor => d.floor(),
                Math::Ceil => d.ceil(),
                _ => d.round(),
            }),
        }),
        Math::Abs => Ok(match x {
            Number::Bool(b) => Number::Int(b as i64),
            Number::Int(i) => i.checked_abs().map_or(Number::Double((i as f64).abs()), Number::Int),
            Number::Rational(r) if *r.numer() == i64::MIN => Number::Double(ratio_to_f64(r).abs()),
            Number::Rational(r) => Number::Rational(r.abs()),
            Number::Double(d) => Number::Double(d.abs()),
        }),
        Math::Sqrt => {
            if x.is_negative() {
                return Err(Fault::domain("square root of a negative number"));
            }
            if let Some(r) = x.to_ratio() {
                if let Some(root) = exact_root(r, 2)? {
                    return Ok(normalize(root));
                }
            }
            checked_unary(op, x.to_f64(), f64::sqrt)
        }
        Math::Asin | Math::Acos => {
            let value = x.to_f64();
            if !(-1.0..=1.0).contains(&value) {
                return Err(Fault::domain(format!("{} is only defined on -1...1", op.name())));
            }
            checked_unary(op, value, if op == Math::Asin { f64::asin } else { f64::acos })
        }
        Math::Sin => checked_unary(op, x.to_f64(), f64::sin),
        Math::Cos => checked_unary(op, x.to_f64(), f64::cos),
        Math::Tan => checked_unary(op, x.to_f64(), f64::tan),
        Math::Atan => checked_unary(op, x.to_f64(), f64::atan),
    }
}

/// Floor, ceil or round (half away from zero) of a ratio without
/// intermediate overflow. A result outside `i64` widens to Double.
fn round_ratio(op: Math, r: Rational) -> Number {
    let (n, d) = (*r.numer(), *r.denom());
    // reduced ratios keep a positive denominator, so these cannot overflow
    let floor = n.div_euclid(d);
    let rem = n.rem_euclid(d);
    let up = match op {
        _ if rem == 0 => false,
        Math::Floor => false,
        Math::Ceil => true,
        _ => match rem.cmp(&(d - rem)) {
            Ordering::Greater => true,
            Ordering::Equal => n > 0,
            Ordering::Less => false,
        },
    };
    if !up {
        return Number::Int(floor);
    }
    floor
        .checked_add(1)
        .map_or_else(|| Number::Double(floor as f64 + 1.0), Number::Int)
}

fn checked_unary(op: Math, x: f64, f: fn(f64) -> f64) -> Result<Number, Fault> {
    let result = f(x);
    if result.is_nan() {
        Err(Fault::domain(format!("{}({x:?}) is undefined", op.name())))
    } else {
        Ok(Number::Double(result))
    }
}

pub fn atan2(y: Number, x: Number) -> Result<Number, Fault> {
    let result = y.to_f64().atan2(x.to_f64());
    if result.is_nan() {
        Err(Fault::domain("atan2 is undefined for NaN"))
    } else {
        Ok(Number::Double(result))
    }
}

/// The exact ratio a double stands for, when both parts fit an `i64`.
fn exact_ratio(d: f64) -> Option<Rational> {
    if let Number::Int(i) = integral(d) {
        return Some(Rational::from_integer(i));
    }
    if !d.is_finite() || d.abs() >= I64_BOUND {
        return None;
    }
    // doubling is exact; the mantissa becomes integral before it leaves 2^53
    let (mut scaled, mut denom) = (d, 1i64);
    while scaled.fract() != 0.0 {
        denom = denom.checked_mul(2)?;
        scaled *= 2.0;
    }
    make_ratio(scaled as i64, denom)
}

/// Exact value of a number, doubles included when representable.
fn exact(n: Number) -> Option<Rational> {
    match n {
        Number::Double(d) => exact_ratio(d),
        other => other.to_ratio(),
    }
}

/// Order after promotion; `None` when a NaN is involved.
pub fn compare(a: Number, b: Number) -> Option<Ordering> {
    let (x, y) = (a.to_f64(), b.to_f64());
    match (exact(a), exact(b)) {
        (Some(p), Some(q)) => Some(p.cmp(&q)),
        // a double outside the i64 range lies beyond every ratio
        (None, Some(_)) if x.abs() >= I64_BOUND => Some(if x > 0.0 { Ordering::Greater } else { Ordering::Less }),
        (Some(_), None) if y.abs() >= I64_BOUND => Some(if y > 0.0 { Ordering::Less } else { Ordering::Greater }),
        _ => x.partial_cmp(&y),
    }
}

/// Equality after promotion, exact across rungs. Reflexive for NaN so
/// values can key maps.
pub fn equal(a: Number, b: Number) -> bool {
    if let (Number::Double(x), Number::Double(y)) = (a, b) {
        return OrderedFloat(x) == OrderedFloat(y);
    }
    match (exact(a), exact(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
