//! Arrays and matrices.
//!
//! A matrix is an array of equal-length rows whose `dimension` is one more
//! than the rows' dimension. `next_count` caches the row length and is 0
//! for flat arrays.

use crate::error::Fault;
use crate::value::Value;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Array {
    items: Arc<Vec<Value>>,
    dimension: u32,
    next_count: usize,
}

impl Default for Array {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Array {
    /// Flat array (dimension 1).
    pub fn new(items: Vec<Value>) -> Self {
        Self {
            items: Arc::new(items),
            dimension: 1,
            next_count: 0,
        }
    }

    /// Group rows into a matrix. Equivalent to `rows ;`.
    pub fn matrix(rows: Vec<Value>) -> Result<Self, Fault> {
        Self::new(rows).grouped()
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn next_count(&self) -> usize {
        self.next_count
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Same shape, new elements. Callers guarantee the element count.
    /// An emptied matrix has no rows left to shape it and becomes flat.
    fn with_items(&self, items: Vec<Value>) -> Self {
        if items.is_empty() {
            return Self::new(items);
        }
        Self {
            items: Arc::new(items),
            dimension: self.dimension,
            next_count: self.next_count,
        }
    }

    /// `;`: every element must be an array of the same length and
    /// dimension.
    pub fn grouped(&self) -> Result<Array, Fault> {
        let mut shape = None;
        for item in self.iter() {
            let Value::Array(row) = item else {
                return Err(Fault::shape(format!(
                    "cannot group a {} into matrix rows",
                    item.type_name()
                )));
            };
            match shape {
                None => shape = Some((row.len(), row.dimension)),
                Some((len, dimension)) if len == row.len() && dimension == row.dimension => {}
                Some((len, _)) => {
                    return Err(Fault::shape(format!(
                        "matrix rows must have equal counts, found {len} and {}",
                        row.len()
                    )));
                }
            }
        }
        let Some((next_count, row_dimension)) = shape else {
            return Err(Fault::shape("cannot group an empty array"));
        };
        Ok(Array {
            items: self.items.clone(),
            dimension: row_dimension + 1,
            next_count,
        })
    }

    /// `;-`: back to a flat array of rows.
    pub fn flattened(&self) -> Array {
        Array::new(self.items.to_vec())
    }

    /// Validate `component` as an index into `0..<bound`.
    pub fn index(component: &Value, bound: usize) -> Result<usize, Fault> {
        let Some(index) = component.as_number().and_then(|n| n.as_index()) else {
            return Err(Fault::undefined("index", &[component.type_name()]));
        };
        usize::try_from(index)
            .ok()
            .filter(|i| *i < bound)
            .ok_or_else(|| Fault::bounds(index, bound))
    }

    pub fn at(&self, component: &Value) -> Result<Value, Fault> {
        let index = Self::index(component, self.len())?;
        Ok(self.items[index].clone())
    }

    /// Rows of a matrix must keep the row shape.
    fn check_row(&self, value: &Value) -> Result<(), Fault> {
        if self.dimension < 2 {
            return Ok(());
        }
        match value {
            Value::Array(row)
                if row.len() == self.next_count && row.dimension + 1 == self.dimension =>
            {
                Ok(())
            }
            other => Err(Fault::shape(format!(
                "a row of this matrix must be an array of count {}, got {}",
                self.next_count,
                other.type_name()
            ))),
        }
    }

    pub fn replaced(&self, component: &Value, value: Value) -> Result<Array, Fault> {
        let index = Self::index(component, self.len())?;
        self.check_row(&value)?;
        let mut items = self.items.to_vec();
        items[index] = value;
        Ok(self.with_items(items))
    }

    /// Insert before `component`; an index equal to the count appends.
    pub fn inserted(&self, component: &Value, value: Value) -> Result<Array, Fault> {
        let index = Self::index(component, self.len() + 1)?;
        self.check_row(&value)?;
        let mut items = self.items.to_vec();
        items.insert(index, value);
        Ok(self.with_items(items))
    }

    pub fn appended(&self, value: Value) -> Result<Array, Fault> {
        self.check_row(&value)?;
        let mut items = self.items.to_vec();
        items.push(value);
        Ok(self.with_items(items))
    }

    pub fn removed(&self, component: &Value) -> Result<Array, Fault> {
        let index = Self::index(component, self.len())?;
        let mut items = self.items.to_vec();
        items.remove(index);
        Ok(self.with_items(items))
    }

    /// Apply `f` to each element, keeping the shape. Stops at the first
    /// error result and returns it.
    pub fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> Value {
        let mut items = Vec::with_capacity(self.len());
        for item in self.iter() {
            let result = f(item);
            if result.is_error() {
                return result;
            }
            items.push(result);
        }
        Value::Array(self.with_items(items))
    }

    /// Pair elements of two arrays of the same shape.
    pub fn zip_with(&self, other: &Array, mut f: impl FnMut(&Value, &Value) -> Value) -> Value {
        if self.len() != other.len()
            || self.dimension != other.dimension
            || self.next_count != other.next_count
        {
            return Fault::shape(format!(
                "arrays of count {} and {} do not match",
                self.len(),
                other.len()
            ))
            .into();
        }
        let mut items = Vec::with_capacity(self.len());
        for (a, b) in self.iter().zip(other.iter()) {
            let result = f(a, b);
            if result.is_error() {
                return result;
            }
            items.push(result);
        }
        Value::Array(self.with_items(items))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension && self.items == other.items
    }
}

impl Eq for Array {}

impl Hash for Array {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimension.hash(state);
        self.items.hash(state);
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::new(iter.into_iter().collect())
    }
}
