//! Intervals with an optional quantization step.

use crate::array::Array;
use crate::error::Fault;
use crate::number::{self, Arith, Number};
use crate::value::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeShape {
    /// `[a, b]`
    Closed,
    /// `[a, b)`
    HalfOpen,
    /// `(a, b]`
    OpenClosed,
    /// `(a, b)`
    Open,
    /// `[a, ...)`
    From,
    /// `(..., b)`
    UpTo,
    /// `(..., b]`
    Through,
    /// `(..., ...)`
    Unbounded,
}

impl RangeShape {
    /// Shape built by one of the range operators once nil endpoints are
    /// taken into account. `None` for `(a, ...)`, which has no shape.
    pub fn from_parts(
        lower: bool,
        lower_open: bool,
        upper: bool,
        upper_open: bool,
    ) -> Option<RangeShape> {
        Some(match (lower, upper) {
            (true, true) => match (lower_open, upper_open) {
                (false, false) => RangeShape::Closed,
                (false, true) => RangeShape::HalfOpen,
                (true, false) => RangeShape::OpenClosed,
                (true, true) => RangeShape::Open,
            },
            (true, false) if !lower_open => RangeShape::From,
            (true, false) => return None,
            (false, true) if upper_open => RangeShape::UpTo,
            (false, true) => RangeShape::Through,
            (false, false) => RangeShape::Unbounded,
        })
    }

    pub fn has_lower(&self) -> bool {
        matches!(
            self,
            RangeShape::Closed | RangeShape::HalfOpen | RangeShape::OpenClosed | RangeShape::Open | RangeShape::From
        )
    }

    pub fn has_upper(&self) -> bool {
        matches!(
            self,
            RangeShape::Closed
                | RangeShape::HalfOpen
                | RangeShape::OpenClosed
                | RangeShape::Open
                | RangeShape::UpTo
                | RangeShape::Through
        )
    }

    pub fn lower_open(&self) -> bool {
        matches!(self, RangeShape::OpenClosed | RangeShape::Open)
    }

    pub fn upper_open(&self) -> bool {
        matches!(self, RangeShape::HalfOpen | RangeShape::Open | RangeShape::UpTo)
    }
}

/// Which of the four range operators built a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bounds {
    /// `...`
    Closed,
    /// `..<`
    HalfOpen,
    /// `<..`
    OpenClosed,
    /// `<.<`
    Open,
}

impl Bounds {
    pub fn symbol(&self) -> &'static str {
        match self {
            Bounds::Closed => "...",
            Bounds::HalfOpen => "..<",
            Bounds::OpenClosed => "<..",
            Bounds::Open => "<.<",
        }
    }

    fn lower_open(&self) -> bool {
        matches!(self, Bounds::OpenClosed | Bounds::Open)
    }

    fn upper_open(&self) -> bool {
        matches!(self, Bounds::HalfOpen | Bounds::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    shape: RangeShape,
    lower: Option<Value>,
    upper: Option<Value>,
    /// 0 means continuous membership
    delta: Value,
}

impl Range {
    /// Endpoints must agree with `shape` and be numbers or strings.
    pub fn new(shape: RangeShape, lower: Option<Value>, upper: Option<Value>) -> Result<Range, Fault> {
        if shape.has_lower() != lower.is_some() || shape.has_upper() != upper.is_some() {
            return Err(Fault::shape(format!("endpoints do not fit a {shape:?} range")));
        }
        for endpoint in lower.iter().chain(upper.iter()) {
            if !endpoint.is_number() && !matches!(endpoint, Value::String(_)) {
                return Err(Fault::undefined("range", &[endpoint.type_name()]));
            }
        }
        if let (Some(a), Some(b)) = (&lower, &upper) {
            if a.partial_order(b).is_none() {
                return Err(Fault::undefined("range", &[a.type_name(), b.type_name()]));
            }
        }
        let delta = default_delta(lower.as_ref(), upper.as_ref());
        Ok(Range {
            shape,
            lower,
            upper,
            delta,
        })
    }

    /// Range built by a range operator; a nil endpoint leaves that side
    /// unbounded.
    pub fn build(bounds: Bounds, lower: &Value, upper: &Value) -> Result<Range, Fault> {
        let lower = (!lower.is_nil()).then(|| lower.clone());
        let upper = (!upper.is_nil()).then(|| upper.clone());
        let shape = RangeShape::from_parts(
            lower.is_some(),
            bounds.lower_open(),
            upper.is_some(),
            bounds.upper_open(),
        )
        .ok_or_else(|| {
            Fault::shape(format!(
                "{} needs an upper bound when the lower bound is open",
                bounds.symbol()
            ))
        })?;
        Range::new(shape, lower, upper)
    }

    /// `__`: a negative or non-numeric step is rejected.
    pub fn with_delta(&self, delta: &Value) -> Result<Range, Fault> {
        let Some(step) = delta.as_number() else {
            return Err(Fault::undefined("__", &["Range", delta.type_name()]));
        };
        if step.is_negative() || step.to_f64().is_nan() {
            return Err(Fault::domain(format!("range step {} must not be negative", step.to_f64())));
        }
        if step.to_f64().is_infinite() {
            return Err(Fault::domain("range step must be finite"));
        }
        Ok(Range {
            delta: delta.clone(),
            ..self.clone()
        })
    }

    pub fn shape(&self) -> RangeShape {
        self.shape
    }

    pub fn lower(&self) -> Option<&Value> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Value> {
        self.upper.as_ref()
    }

    pub fn delta(&self) -> &Value {
        &self.delta
    }

    pub fn has_default_delta(&self) -> bool {
        self.delta == default_delta(self.lower.as_ref(), self.upper.as_ref())
    }

    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Interval containment, then congruence with the step when it is
    /// not zero.
    pub fn contains(&self, value: &Value) -> bool {
        if let Some(lower) = &self.lower {
            match value.partial_order(lower) {
                None | Some(Ordering::Less) => return false,
                Some(Ordering::Equal) if self.shape.lower_open() => return false,
                _ => {}
            }
        }
        if let Some(upper) = &self.upper {
            match value.partial_order(upper) {
                None | Some(Ordering::Greater) => return false,
                Some(Ordering::Equal) if self.shape.upper_open() => return false,
                _ => {}
            }
        }
        self.on_step(value)
    }

    fn on_step(&self, value: &Value) -> bool {
        let Some(delta) = self.delta.as_number().filter(|d| !d.is_zero()) else {
            return true;
        };
        let Some(x) = value.as_number() else {
            return false;
        };
        let anchor = self
            .lower
            .as_ref()
            .or(self.upper.as_ref())
            .and_then(Value::as_number)
            .unwrap_or(Number::Int(0));
        let remainder = number::arith(Arith::Sub, x, anchor)
            .and_then(|offset| number::arith(Arith::Rem, offset, delta));
        match remainder {
            Ok(Number::Double(r)) => {
                let step = delta.to_f64().abs();
                let r = r.abs();
                r <= step * 1e-9 || (step - r) <= step * 1e-9
            }
            Ok(r) => r.is_zero(),
            Err(_) => false,
        }
    }

    /// Enumerate the members. Needs both bounds and a positive step, and
    /// refuses to produce more than `limit` elements.
    pub fn materialize(&self, limit: usize) -> Result<Array, Fault> {
        let (Some(lower), Some(upper)) = (&self.lower, &self.upper) else {
            return Err(Fault::shape("an unbounded range cannot be enumerated"));
        };
        let Some(delta) = self.delta.as_number().filter(|d| !d.is_zero()) else {
            return Err(Fault::shape("a continuous range cannot be enumerated"));
        };
        let (Some(lo), Some(hi)) = (lower.as_number(), upper.as_number()) else {
            return Err(Fault::shape("only numeric ranges can be enumerated"));
        };
        // exact steps that overflow into Double have left every i64 bound
        let exact = !matches!(lo, Number::Double(_)) && !matches!(delta, Number::Double(_));
        let mut items = Vec::new();
        let mut previous: Option<Number> = None;
        let mut k: i64 = if self.shape.lower_open() { 1 } else { 0 };
        loop {
            let value = number::arith(Arith::Mul, Number::Int(k), delta)
                .and_then(|offset| number::arith(Arith::Add, lo, offset))?;
            if exact && matches!(value, Number::Double(_)) {
                break;
            }
            // a double step too small to move the value ends the range
            if previous.is_some_and(|p| number::compare(value, p) != Some(Ordering::Greater)) {
                break;
            }
            previous = Some(value);
            match number::compare(value, hi) {
                Some(Ordering::Less) => {}
                Some(Ordering::Equal) if !self.shape.upper_open() => {}
                _ => break,
            }
            if items.len() >= limit {
                return Err(Fault::shape(format!("range has more than {limit} elements")));
            }
            items.push(Value::from(value));
            k += 1;
        }
        Ok(Array::new(items))
    }

    /// Move both endpoints by `amount` (`op` is `+` or `-`).
    pub fn shifted(&self, op: Arith, amount: Number) -> Result<Range, Fault> {
        let shift = |endpoint: &Option<Value>| -> Result<Option<Value>, Fault> {
            endpoint
                .as_ref()
                .map(|v| match v.as_number() {
                    Some(n) => number::arith(op, n, amount).map(Value::from),
                    None => Err(Fault::undefined(op.symbol(), &["Range", "Number"])),
                })
                .transpose()
        };
        Ok(Range {
            shape: self.shape,
            lower: shift(&self.lower)?,
            upper: shift(&self.upper)?,
            delta: self.delta.clone(),
        })
    }
}

/// 1 when every finite endpoint is integral, otherwise continuous.
pub fn default_delta(lower: Option<&Value>, upper: Option<&Value>) -> Value {
    let integral = lower
        .into_iter()
        .chain(upper)
        .all(|v| matches!(v, Value::Int(_) | Value::Bool(_)));
    Value::Int(if integral { 1 } else { 0 })
}
