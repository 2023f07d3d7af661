//! Interned identifiers.
//!
//! A [`Key`] compares and hashes by its text only. It may carry
//! introspection metadata ([`KeyInfo`]) which is attached once, when the
//! key is registered, and is never consulted by evaluation.

use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Descriptive metadata for a registered key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    pub summary: String,
}

#[derive(Debug)]
struct Entry {
    name: Box<str>,
    info: OnceLock<KeyInfo>,
}

#[derive(Clone)]
pub struct Key(Arc<Entry>);

impl Key {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::new(Entry {
            name: name.as_ref().into(),
            info: OnceLock::new(),
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.0.name
    }

    pub fn info(&self) -> Option<&KeyInfo> {
        self.0.info.get()
    }

    /// Attach metadata. Only the first call has an effect.
    pub fn describe(&self, info: KeyInfo) -> bool {
        self.0.info.set(info).is_ok()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        &*self.0.name == other
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::new(name)
    }
}

/// Intern table handing out one shared [`Key`] per distinct name.
#[derive(Debug, Default)]
pub struct Interner {
    keys: FxHashMap<Box<str>, Key>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Key {
        if let Some(key) = self.keys.get(name) {
            return key.clone();
        }
        let key = Key::new(name);
        self.keys.insert(name.into(), key.clone());
        key
    }

    /// Intern `name` and attach `summary` if it has no metadata yet.
    pub fn register(&mut self, name: &str, summary: &str) -> Key {
        let key = self.intern(name);
        key.describe(KeyInfo {
            summary: summary.to_string(),
        });
        key
    }

    pub fn get(&self, name: &str) -> Option<&Key> {
        self.keys.get(name)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
