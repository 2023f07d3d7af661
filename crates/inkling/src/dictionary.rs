//! Insertion-ordered dictionaries with order-insensitive equality.

use crate::error::Fault;
use crate::value::Value;
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHasher};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type Entries = IndexMap<Value, Value, FxBuildHasher>;

#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    entries: Arc<Entries>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates overwrite earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self {
            entries: Arc::new(pairs.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, name: &str) -> Option<&Value> {
        self.entries.get(&Value::string(name))
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.resolve_key(key).is_some()
    }

    /// Stored key matching `component`. An identifier also finds the
    /// string key of the same name.
    fn resolve_key(&self, component: &Value) -> Option<Value> {
        if let Some((key, _)) = self.entries.get_key_value(component) {
            return Some(key.clone());
        }
        match component {
            Value::Identifier(name) => {
                let key = Value::string(name.as_str());
                self.entries.contains_key(&key).then_some(key)
            }
            _ => None,
        }
    }

    pub fn lookup(&self, component: &Value) -> Result<Value, Fault> {
        self.resolve_key(component)
            .and_then(|key| self.entries.get(&key).cloned())
            .ok_or_else(|| Fault::missing_key(component))
    }

    /// Replace or add one entry. A new identifier key is stored as a
    /// string.
    pub fn with(&self, component: &Value, value: Value) -> Dictionary {
        let key = self.resolve_key(component).unwrap_or_else(|| match component {
            Value::Identifier(name) => Value::string(name.as_str()),
            other => other.clone(),
        });
        let mut entries = (*self.entries).clone();
        entries.insert(key, value);
        Dictionary {
            entries: Arc::new(entries),
        }
    }

    pub fn without(&self, component: &Value) -> Result<Dictionary, Fault> {
        let key = self
            .resolve_key(component)
            .ok_or_else(|| Fault::missing_key(component))?;
        let mut entries = (*self.entries).clone();
        entries.shift_remove(&key);
        Ok(Dictionary {
            entries: Arc::new(entries),
        })
    }

    pub fn map_values(&self, mut f: impl FnMut(&Value) -> Value) -> Value {
        let mut entries = Entries::with_capacity_and_hasher(self.len(), FxBuildHasher);
        for (key, value) in self.iter() {
            let result = f(value);
            if result.is_error() {
                return result;
            }
            entries.insert(key.clone(), result);
        }
        Value::Dictionary(Dictionary {
            entries: Arc::new(entries),
        })
    }

    /// Pair values under equal key sets, in this dictionary's order.
    pub fn zip_with(&self, other: &Dictionary, mut f: impl FnMut(&Value, &Value) -> Value) -> Value {
        if self.len() != other.len() || self.keys().any(|k| !other.entries.contains_key(k)) {
            return Fault::shape("dictionaries must have the same keys").into();
        }
        self.map_values_with_keys(|key, value| match other.entries.get(key) {
            Some(theirs) => f(value, theirs),
            None => Fault::missing_key(key).into(),
        })
    }

    fn map_values_with_keys(&self, mut f: impl FnMut(&Value, &Value) -> Value) -> Value {
        let mut entries = Entries::with_capacity_and_hasher(self.len(), FxBuildHasher);
        for (key, value) in self.iter() {
            let result = f(key, value);
            if result.is_error() {
                return result;
            }
            entries.insert(key.clone(), result);
        }
        Value::Dictionary(Dictionary {
            entries: Arc::new(entries),
        })
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || *self.entries == *other.entries
    }
}

impl Eq for Dictionary {}

impl Hash for Dictionary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // order-independent: combine per-entry hashes commutatively
        let mut sum: u64 = 0;
        for entry in self.iter() {
            let mut hasher = FxHasher::default();
            entry.hash(&mut hasher);
            sum = sum.wrapping_add(hasher.finish());
        }
        self.len().hash(state);
        sum.hash(state);
    }
}
