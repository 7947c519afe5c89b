//! Hash-based secondary index over a [`RecordCollection`].
//!
//! The index is a build-once snapshot: [`SecondaryIndex::build`] scans the
//! collection once and records, per distinct key tuple, the positions of the
//! records carrying it in scan order. Nothing ties the index to later changes
//! of the collection. After the collection changes, call
//! [`SecondaryIndex::rebuild`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::comparer::{KeyComparer, KeyHasher, KeyTuple};
use crate::error::{Result, TabulaError};
use crate::record::{FieldType, RecordAccessor, RecordCollection, RecordCursor};

type ValueOf<C> = <<C as RecordCollection>::Field as FieldType>::Value;

/// A searchable index. Implementations may equally well be backed by a
/// database query, so the underlying collection is not part of the contract.
pub trait RecordIndex {
    type Value;
    type Accessor: RecordAccessor<Value = Self::Value>;
    type Records<'a>: Iterator<Item = Self::Accessor>
    where
        Self: 'a;

    fn key_field_names(&self) -> &[String];
    /// The first record matching the key fields of `key_record`.
    fn find_first<A>(&self, key_record: &A) -> Option<Self::Accessor>
    where
        A: RecordAccessor<Value = Self::Value> + ?Sized;
    /// Every record matching the key fields of `key_record`.
    fn records<A>(&self, key_record: &A) -> Result<Self::Records<'_>>
    where
        A: RecordAccessor<Value = Self::Value> + ?Sized;
}

pub struct SecondaryIndex<C: RecordCollection> {
    collection: C,
    key_fields: Vec<String>,
    defaults: Vec<ValueOf<C>>,
    comparer: Arc<KeyComparer<ValueOf<C>>>,
    buckets: HashMap<KeyTuple<ValueOf<C>>, Vec<usize>, KeyHasher>,
}

impl<C> SecondaryIndex<C>
where
    C: RecordCollection,
    ValueOf<C>: Clone + Eq + Hash,
{
    /// Bind an (unbuilt) index to a collection and its key fields.
    ///
    /// Each key field must exist in the collection's schema; its field type
    /// supplies the comparer used for that key position and the value a
    /// record lacking the field reads as.
    pub fn new<I, S>(collection: C, key_fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key_fields: Vec<String> = key_fields.into_iter().map(Into::into).collect();
        if key_fields.is_empty() {
            return Err(TabulaError::NoKeyFields);
        }
        let mut comparers = Vec::with_capacity(key_fields.len());
        let mut defaults = Vec::with_capacity(key_fields.len());
        for name in &key_fields {
            let Some(field) = collection.field_type(name) else {
                warn!(field = %name, "key field not found in schema");
                return Err(TabulaError::UnknownKeyField {
                    field: name.clone(),
                });
            };
            comparers.push(field.comparer());
            defaults.push(field.default_value());
        }
        let capacity = collection.len();
        debug!(key_fields = ?key_fields, capacity, "created secondary index");
        Ok(Self {
            collection,
            key_fields,
            defaults,
            comparer: Arc::new(KeyComparer::new(comparers)),
            buckets: HashMap::with_capacity_and_hasher(capacity, KeyHasher::default()),
        })
    }

    pub fn key_field_names(&self) -> &[String] {
        &self.key_fields
    }
    pub fn collection(&self) -> &C {
        &self.collection
    }
    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Scan the whole collection once, appending every record's position to
    /// the bucket of its key. Returns the number of records indexed.
    ///
    /// Building an already built index indexes every record a second time;
    /// use [`SecondaryIndex::rebuild`] to start over.
    pub fn build(&mut self) -> Result<usize> {
        // the cursor is released on every way out of this function
        let mut cursor = self.collection.cursor()?;
        let count = self.collection.len();
        let mut indexed = 0;
        for position in 0..count {
            if !cursor.move_to(position) {
                continue;
            }
            if let Some(record) = cursor.current() {
                let key = self.key_of(record);
                self.buckets
                    .entry(key)
                    .or_insert_with(|| Vec::with_capacity(1))
                    .push(position);
                indexed += 1;
            }
        }
        debug!(records = indexed, keys = self.buckets.len(), "built secondary index");
        Ok(indexed)
    }

    pub fn rebuild(&mut self) -> Result<usize> {
        self.clear();
        self.build()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn find_first<A>(&self, key_record: &A) -> Option<C::Accessor>
    where
        A: RecordAccessor<Value = ValueOf<C>> + ?Sized,
    {
        let position = *self.positions(key_record).first()?;
        self.collection.get(position)
    }

    /// Positions of the matching records, in scan order. Empty when the key
    /// is not in the index.
    pub fn positions<A>(&self, key_record: &A) -> &[usize]
    where
        A: RecordAccessor<Value = ValueOf<C>> + ?Sized,
    {
        let key = self.key_of(key_record);
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// A cursor over the matching records. It holds one collection cursor,
    /// which is released when the result is closed or dropped.
    pub fn records<A>(&self, key_record: &A) -> Result<IndexCursor<'_, C::Cursor>>
    where
        A: RecordAccessor<Value = ValueOf<C>> + ?Sized,
    {
        let positions = self.positions(key_record);
        let cursor = self.collection.cursor()?;
        trace!(matches = positions.len(), "opened index cursor");
        Ok(IndexCursor::new(positions, cursor))
    }

    // a field the record lacks reads as its type's default value
    fn key_of<A>(&self, record: &A) -> KeyTuple<ValueOf<C>>
    where
        A: RecordAccessor<Value = ValueOf<C>> + ?Sized,
    {
        let values = self
            .key_fields
            .iter()
            .zip(&self.defaults)
            .map(|(name, default)| {
                record
                    .try_get_value(name)
                    .cloned()
                    .unwrap_or_else(|| default.clone())
            })
            .collect();
        KeyTuple::new(values, &self.comparer)
    }
}

impl<C> RecordIndex for SecondaryIndex<C>
where
    C: RecordCollection,
    C::Accessor: Clone,
    ValueOf<C>: Clone + Eq + Hash,
{
    type Value = ValueOf<C>;
    type Accessor = C::Accessor;
    type Records<'a>
        = IndexCursor<'a, C::Cursor>
    where
        Self: 'a;

    fn key_field_names(&self) -> &[String] {
        SecondaryIndex::key_field_names(self)
    }
    fn find_first<A>(&self, key_record: &A) -> Option<C::Accessor>
    where
        A: RecordAccessor<Value = Self::Value> + ?Sized,
    {
        SecondaryIndex::find_first(self, key_record)
    }
    fn records<A>(&self, key_record: &A) -> Result<IndexCursor<'_, C::Cursor>>
    where
        A: RecordAccessor<Value = Self::Value> + ?Sized,
    {
        SecondaryIndex::records(self, key_record)
    }
}

impl<C: RecordCollection> fmt::Debug for SecondaryIndex<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SecondaryIndex")
            .field("key_fields", &self.key_fields)
            .field("keys", &self.buckets.len())
            .finish()
    }
}

/// Walks one bucket of an index, moving a shared collection cursor to each
/// matching position in turn.
///
/// Not meant to be shared between threads. Call [`IndexCursor::close`] (or
/// drop it) to release the collection cursor.
pub struct IndexCursor<'a, K: RecordCursor> {
    positions: &'a [usize],
    cursor: K,
    // index into `positions`, None before the first advance
    current: Option<usize>,
}

impl<'a, K: RecordCursor> IndexCursor<'a, K> {
    fn new(positions: &'a [usize], cursor: K) -> Self {
        Self {
            positions,
            cursor,
            current: None,
        }
    }
    /// Move to the next match. Returns false once the matches are exhausted,
    /// or if the collection no longer has a record at the stored position.
    pub fn advance(&mut self) -> bool {
        let next = self
            .current
            .map_or(0, |i| i + 1)
            .min(self.positions.len());
        self.current = Some(next);
        match self.positions.get(next) {
            Some(&position) => self.cursor.move_to(position),
            None => false,
        }
    }
    /// The record at the current match. `None` before the first advance and
    /// once the matches are exhausted, even though the underlying collection
    /// cursor still sits on the last match.
    pub fn current(&self) -> Option<&K::Accessor> {
        match self.current {
            Some(i) if i < self.positions.len() => self.cursor.current(),
            _ => None,
        }
    }
    /// Rewind to before the first match.
    pub fn reset(&mut self) {
        self.current = None;
    }
    pub fn positions(&self) -> &'a [usize] {
        self.positions
    }
    /// Number of matches.
    pub fn len(&self) -> usize {
        self.positions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
    pub fn close(self) {
        trace!(matches = self.positions.len(), "closed index cursor");
    }
}

impl<K> Iterator for IndexCursor<'_, K>
where
    K: RecordCursor,
    K::Accessor: Clone,
{
    type Item = K::Accessor;

    fn next(&mut self) -> Option<K::Accessor> {
        if self.advance() {
            self.cursor.current().cloned()
        } else {
            None
        }
    }
}
