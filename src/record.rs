//! Record contracts consumed by the index, and an in-memory implementation.
//!
//! The index only needs a [`RecordCollection`]: a count, a schema lookup
//! giving each field's [`FieldType`], positional access and a factory for
//! [`RecordCursor`]s. [`RecordList`] is the reference implementation used
//! throughout the crate's tests and benches.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::comparer::{DefaultComparer, FieldComparer, IgnoreCaseComparer, NameHasher};
use crate::datatype::{TypeTag, Value};
use crate::error::{Result, TabulaError};
use crate::fieldspec::FieldDescriptor;

/// Option keyword selecting case-insensitive comparison of a text field.
pub const IGNORE_CASE_OPTION: &str = "ignorecase";

// ------------- Contracts -------------
pub trait RecordAccessor {
    type Value;
    /// `None` when the record has no field of that name.
    fn try_get_value(&self, name: &str) -> Option<&Self::Value>;
}

impl<V, S: BuildHasher> RecordAccessor for HashMap<String, V, S> {
    type Value = V;
    fn try_get_value(&self, name: &str) -> Option<&V> {
        self.get(name)
    }
}
impl<V> RecordAccessor for BTreeMap<String, V> {
    type Value = V;
    fn try_get_value(&self, name: &str) -> Option<&V> {
        self.get(name)
    }
}
impl<T: RecordAccessor + ?Sized> RecordAccessor for Arc<T> {
    type Value = T::Value;
    fn try_get_value(&self, name: &str) -> Option<&T::Value> {
        (**self).try_get_value(name)
    }
}
impl<T: RecordAccessor + ?Sized> RecordAccessor for &T {
    type Value = T::Value;
    fn try_get_value(&self, name: &str) -> Option<&T::Value> {
        (**self).try_get_value(name)
    }
}

/// The capabilities a field's declared type offers the index.
pub trait FieldType {
    type Value;
    fn comparer(&self) -> Arc<dyn FieldComparer<Self::Value>>;
    /// What a record lacking this field reads as.
    fn default_value(&self) -> Self::Value;
}

/// A movable handle into a collection. Whatever it holds is released when
/// it is dropped.
pub trait RecordCursor {
    type Accessor: RecordAccessor;
    fn move_to(&mut self, position: usize) -> bool;
    fn current(&self) -> Option<&Self::Accessor>;
}

pub trait RecordCollection {
    type Field: FieldType;
    type Accessor: RecordAccessor<Value = <Self::Field as FieldType>::Value>;
    type Cursor: RecordCursor<Accessor = Self::Accessor>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn field_type(&self, name: &str) -> Option<&Self::Field>;
    fn get(&self, position: usize) -> Option<Self::Accessor>;
    fn cursor(&self) -> Result<Self::Cursor>;
}

// ------------- ValueField -------------
/// The built-in field type over [`Value`].
#[derive(Clone)]
pub struct ValueField {
    tag: TypeTag,
    ignore_case: bool,
    comparer: Arc<dyn FieldComparer<Value>>,
}

impl ValueField {
    pub fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            ignore_case: false,
            comparer: Arc::new(DefaultComparer),
        }
    }
    pub fn ignoring_case(tag: TypeTag) -> Self {
        Self {
            tag,
            ignore_case: true,
            comparer: Arc::new(IgnoreCaseComparer),
        }
    }
    /// Build the field type a parsed descriptor asks for. Option keywords
    /// are separated by whitespace or commas; unknown ones are ignored.
    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Self {
        let textual = matches!(descriptor.tag(), TypeTag::Text | TypeTag::Any);
        let ignore_case = descriptor
            .option()
            .split(|c: char| c.is_whitespace() || c == ',')
            .any(|keyword| keyword.eq_ignore_ascii_case(IGNORE_CASE_OPTION));
        if textual && ignore_case {
            Self::ignoring_case(descriptor.tag())
        } else {
            Self::new(descriptor.tag())
        }
    }
    pub fn tag(&self) -> TypeTag {
        self.tag
    }
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }
    pub fn parse_value(&self, text: &str) -> Result<Value> {
        Value::parse(self.tag, text)
    }
}

impl FieldType for ValueField {
    type Value = Value;
    fn comparer(&self) -> Arc<dyn FieldComparer<Value>> {
        Arc::clone(&self.comparer)
    }
    fn default_value(&self) -> Value {
        Value::Null
    }
}

impl fmt::Debug for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ValueField")
            .field("tag", &self.tag)
            .field("ignore_case", &self.ignore_case)
            .finish()
    }
}

// ------------- RecordSchema -------------
/// Ordered, name-unique fields.
#[derive(Debug, Clone)]
pub struct RecordSchema<F> {
    fields: Vec<(String, F)>,
    ordinals: HashMap<String, usize, NameHasher>,
}

impl<F> RecordSchema<F> {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, F)>,
        S: Into<String>,
    {
        let mut schema = Self {
            fields: Vec::new(),
            ordinals: HashMap::default(),
        };
        for (name, field) in fields {
            let name = name.into();
            if schema.ordinals.contains_key(&name) {
                return Err(TabulaError::DuplicateField { field: name });
            }
            schema.ordinals.insert(name.clone(), schema.fields.len());
            schema.fields.push((name, field));
        }
        Ok(schema)
    }
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }
    pub fn field_type(&self, name: &str) -> Option<&F> {
        self.ordinal(name).map(|i| &self.fields[i].1)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
    pub fn fields(&self) -> impl Iterator<Item = (&str, &F)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }
}

impl RecordSchema<ValueField> {
    /// The bridge from parser output to a schema. Duplicate names are rejected.
    pub fn from_descriptors<'a>(
        descriptors: impl IntoIterator<Item = &'a FieldDescriptor>,
    ) -> Result<Self> {
        Self::new(
            descriptors
                .into_iter()
                .map(|d| (d.name().to_string(), ValueField::from_descriptor(d))),
        )
    }
}

// ------------- Record -------------
pub struct Record<F: FieldType> {
    schema: Arc<RecordSchema<F>>,
    values: Vec<F::Value>,
}

impl<F: FieldType> Record<F> {
    pub fn new(schema: Arc<RecordSchema<F>>, values: Vec<F::Value>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(TabulaError::Arity {
                expected: schema.len(),
                found: values.len(),
            });
        }
        Ok(Self { schema, values })
    }
    pub fn values(&self) -> &[F::Value] {
        &self.values
    }
    pub fn schema(&self) -> &Arc<RecordSchema<F>> {
        &self.schema
    }
}

impl<F: FieldType> RecordAccessor for Record<F> {
    type Value = F::Value;
    fn try_get_value(&self, name: &str) -> Option<&F::Value> {
        self.schema.ordinal(name).and_then(|i| self.values.get(i))
    }
}

impl<F: FieldType> fmt::Debug for Record<F>
where
    F::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.schema.names().zip(self.values.iter()))
            .finish()
    }
}

// ------------- RecordList -------------
/// An ordered, shared record list. Clones share the same storage, so a
/// change made through one clone is seen by every other.
pub struct RecordList<F: FieldType> {
    schema: Arc<RecordSchema<F>>,
    records: Arc<RwLock<Vec<Arc<Record<F>>>>>,
    open_cursors: Arc<AtomicUsize>,
}

impl<F: FieldType> RecordList<F> {
    pub fn new(schema: RecordSchema<F>) -> Self {
        Self {
            schema: Arc::new(schema),
            records: Arc::new(RwLock::new(Vec::new())),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }
    pub fn schema(&self) -> &Arc<RecordSchema<F>> {
        &self.schema
    }
    /// Append a record, returning its position.
    pub fn push(&self, values: Vec<F::Value>) -> Result<usize> {
        let record = Record::new(Arc::clone(&self.schema), values)?;
        let mut records = self.records.write();
        records.push(Arc::new(record));
        Ok(records.len() - 1)
    }
    pub fn remove(&self, position: usize) -> Option<Arc<Record<F>>> {
        let mut records = self.records.write();
        (position < records.len()).then(|| records.remove(position))
    }
    /// Cursors handed out and not yet dropped.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }
}

impl RecordList<ValueField> {
    /// Append a record given as text, converting each value to its field's type.
    pub fn push_text<S: AsRef<str>>(&self, texts: &[S]) -> Result<usize> {
        if texts.len() != self.schema.len() {
            return Err(TabulaError::Arity {
                expected: self.schema.len(),
                found: texts.len(),
            });
        }
        let values = self
            .schema
            .fields()
            .zip(texts)
            .map(|((_, field), text)| field.parse_value(text.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.push(values)
    }
}

impl<F: FieldType> Clone for RecordList<F> {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            records: Arc::clone(&self.records),
            open_cursors: Arc::clone(&self.open_cursors),
        }
    }
}

impl<F: FieldType> RecordCollection for RecordList<F> {
    type Field = F;
    type Accessor = Arc<Record<F>>;
    type Cursor = RecordListCursor<F>;

    fn len(&self) -> usize {
        self.records.read().len()
    }
    fn field_type(&self, name: &str) -> Option<&F> {
        self.schema.field_type(name)
    }
    fn get(&self, position: usize) -> Option<Arc<Record<F>>> {
        self.records.read().get(position).cloned()
    }
    fn cursor(&self) -> Result<RecordListCursor<F>> {
        let open = self.open_cursors.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(open, "acquired record list cursor");
        Ok(RecordListCursor {
            records: Arc::clone(&self.records),
            open_cursors: Arc::clone(&self.open_cursors),
            current: None,
        })
    }
}

pub struct RecordListCursor<F: FieldType> {
    records: Arc<RwLock<Vec<Arc<Record<F>>>>>,
    open_cursors: Arc<AtomicUsize>,
    current: Option<Arc<Record<F>>>,
}

impl<F: FieldType> RecordCursor for RecordListCursor<F> {
    type Accessor = Arc<Record<F>>;
    fn move_to(&mut self, position: usize) -> bool {
        self.current = self.records.read().get(position).cloned();
        self.current.is_some()
    }
    fn current(&self) -> Option<&Arc<Record<F>>> {
        self.current.as_ref()
    }
}

impl<F: FieldType> Drop for RecordListCursor<F> {
    fn drop(&mut self) {
        let open = self.open_cursors.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(open, "released record list cursor");
    }
}
