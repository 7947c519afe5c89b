//! Equality and hashing for index keys.
//!
//! Every key field contributes a [`FieldComparer`] taken from its field type,
//! so a key position compares the way its type says it should (for example
//! case-insensitively) rather than with plain `==`.

use std::fmt;
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::sync::Arc;

use seahash::SeaHasher;

use crate::datatype::Value;

pub type NameHasher = BuildHasherDefault<SeaHasher>;
pub type KeyHasher = BuildHasherDefault<SeaHasher>;

/// Equality plus a hash consistent with it, over one value domain.
pub trait FieldComparer<V>: Send + Sync {
    fn equals(&self, left: &V, right: &V) -> bool;
    /// Values that are `equals` must hash alike.
    fn hash_value(&self, value: &V) -> u64;
}

/// Plain `Eq` and `Hash`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComparer;

impl<V: Eq + Hash> FieldComparer<V> for DefaultComparer {
    fn equals(&self, left: &V, right: &V) -> bool {
        left == right
    }
    fn hash_value(&self, value: &V) -> u64 {
        let mut hasher = SeaHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }
}

/// Compares text values ignoring case, anything else as [`DefaultComparer`] does.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreCaseComparer;

impl FieldComparer<Value> for IgnoreCaseComparer {
    fn equals(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Text(a), Value::Text(b)) => folded(a).eq(folded(b)),
            _ => left == right,
        }
    }
    fn hash_value(&self, value: &Value) -> u64 {
        match value {
            Value::Text(s) => {
                let mut hasher = SeaHasher::default();
                value.tag().hash(&mut hasher);
                for c in folded(s) {
                    hasher.write_u32(c as u32);
                }
                hasher.finish()
            }
            _ => DefaultComparer.hash_value(value),
        }
    }
}

fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// Compares fixed-length value tuples position by position.
pub struct KeyComparer<V> {
    fields: Vec<Arc<dyn FieldComparer<V>>>,
    fallback: DefaultComparer,
}

impl<V: Eq + Hash> KeyComparer<V> {
    pub fn new(fields: Vec<Arc<dyn FieldComparer<V>>>) -> Self {
        Self {
            fields,
            fallback: DefaultComparer,
        }
    }
    pub fn arity(&self) -> usize {
        self.fields.len()
    }
    // positions without a comparer of their own use plain equality
    fn comparer(&self, position: usize) -> &dyn FieldComparer<V> {
        match self.fields.get(position) {
            Some(comparer) => comparer.as_ref(),
            None => &self.fallback,
        }
    }
    pub fn equals(&self, left: &[V], right: &[V]) -> bool {
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .enumerate()
                .all(|(i, (l, r))| self.comparer(i).equals(l, r))
    }
    /// Order-sensitive: permuted tuples hash differently.
    pub fn hash(&self, values: &[V]) -> u64 {
        let mut hasher = SeaHasher::default();
        hasher.write_usize(values.len());
        for (i, value) in values.iter().enumerate() {
            hasher.write_u64(self.comparer(i).hash_value(value));
        }
        hasher.finish()
    }
}

impl<V> fmt::Debug for KeyComparer<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeyComparer")
            .field("arity", &self.fields.len())
            .finish()
    }
}

/// The values of the key fields of one record, in key field order.
pub struct KeyTuple<V> {
    values: Vec<V>,
    comparer: Arc<KeyComparer<V>>,
}

impl<V> KeyTuple<V> {
    pub fn new(values: Vec<V>, comparer: &Arc<KeyComparer<V>>) -> Self {
        Self {
            values,
            comparer: Arc::clone(comparer),
        }
    }
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<V: Eq + Hash> PartialEq for KeyTuple<V> {
    fn eq(&self, other: &Self) -> bool {
        self.comparer.equals(&self.values, &other.values)
    }
}
impl<V: Eq + Hash> Eq for KeyTuple<V> {}

impl<V: Eq + Hash> Hash for KeyTuple<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(KeyComparer::hash(&self.comparer, &self.values));
    }
}

impl<V: fmt::Debug> fmt::Debug for KeyTuple<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("KeyTuple").field(&self.values).finish()
    }
}
