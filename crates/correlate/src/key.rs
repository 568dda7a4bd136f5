//! Keys that associate values across datasets.
//!
//! A key is either an [`ExactKey`], compared by equality, or a [`FuzzyKey`]
//! wrapping a caller type that implements [`FuzzyComparable`]. Fuzzy keys
//! are only ever compared against fuzzy keys of the same concrete type.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A key compared by equality across the two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExactKey {
    Integer(i64),
    Text(String),
}

impl fmt::Display for ExactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExactKey::Integer(i) => write!(f, "{i}"),
            ExactKey::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<&str> for ExactKey {
    fn from(s: &str) -> Self {
        ExactKey::Text(s.to_string())
    }
}

impl From<String> for ExactKey {
    fn from(s: String) -> Self {
        ExactKey::Text(s)
    }
}

impl From<i64> for ExactKey {
    fn from(i: i64) -> Self {
        ExactKey::Integer(i)
    }
}

impl From<i32> for ExactKey {
    fn from(i: i32) -> Self {
        ExactKey::Integer(i64::from(i))
    }
}

impl From<u32> for ExactKey {
    fn from(i: u32) -> Self {
        ExactKey::Integer(i64::from(i))
    }
}

/// A caller-defined key type with a similarity function.
///
/// Implementations must keep `compare` symmetric and return a score in
/// `[0.0, 1.0]`, where 1 is a perfect match and 0 means nothing in common.
/// Return `None` when the two keys cannot be compared at all.
///
/// Two keys that are `Eq` are the same key: setting an equal key twice on a
/// value adds a second round rather than a second key.
pub trait FuzzyComparable: fmt::Debug + Eq + Hash + Send + Sync + 'static {
    fn compare(&self, other: &Self) -> Option<f64>;
}

trait DynFuzzy: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynFuzzy) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_compare(&self, other: &dyn DynFuzzy) -> Option<f64>;
    fn type_name(&self) -> &'static str;
    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: FuzzyComparable> DynFuzzy for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynFuzzy) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn dyn_compare(&self, other: &dyn DynFuzzy) -> Option<f64> {
        other
            .as_any()
            .downcast_ref::<T>()
            .and_then(|other| self.compare(other))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type-erased fuzzy key.
///
/// Cloning is cheap; clones are the same key.
#[derive(Clone)]
pub struct FuzzyKey {
    inner: Arc<dyn DynFuzzy>,
}

impl FuzzyKey {
    pub fn new<T: FuzzyComparable>(key: T) -> Self {
        Self {
            inner: Arc::new(key),
        }
    }

    /// Runtime tag of the wrapped type. Only keys with equal tags compare.
    pub fn type_tag(&self) -> TypeId {
        self.inner.as_any().type_id()
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    pub fn downcast_ref<T: FuzzyComparable>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Compare against another fuzzy key.
    ///
    /// Returns `None` if the keys have different types or the wrapped
    /// `compare` reports them incomparable.
    pub fn compare(&self, other: &FuzzyKey) -> Option<f64> {
        if self.type_tag() != other.type_tag() {
            return None;
        }
        self.inner.dyn_compare(other.inner.as_ref())
    }
}

impl PartialEq for FuzzyKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.dyn_eq(other.inner.as_ref())
    }
}

impl Eq for FuzzyKey {}

impl Hash for FuzzyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_tag().hash(state);
        self.inner.dyn_hash(state);
    }
}

impl fmt::Debug for FuzzyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt_debug(f)
    }
}

/// Any key that can be attached to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Exact(ExactKey),
    Fuzzy(FuzzyKey),
}

impl Key {
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Key::Fuzzy(_))
    }
}

impl From<ExactKey> for Key {
    fn from(key: ExactKey) -> Self {
        Key::Exact(key)
    }
}

impl From<FuzzyKey> for Key {
    fn from(key: FuzzyKey) -> Self {
        Key::Fuzzy(key)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Exact(s.into())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Exact(s.into())
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Exact(s.as_str().into())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Exact(i.into())
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Exact(i.into())
    }
}

impl From<u32> for Key {
    fn from(i: u32) -> Self {
        Key::Exact(i.into())
    }
}
