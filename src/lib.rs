//! Tabula – schemas and secondary indexes for tabular records.
//!
//! Tabula covers two related jobs:
//! * Turning a flat *field schema spec* such as
//!   `"id:int32,name:varchar(ignorecase),born:datetime"` into an ordered list
//!   of typed [`fieldspec::FieldDescriptor`]s.
//! * Building an in-memory, hash-based [`index::SecondaryIndex`] over a
//!   snapshot of a record collection, keyed on any subset of its fields.
//!
//! ## Modules
//! * [`fieldspec`] – The spec mini-language parser and its delimiters.
//! * [`registry`] – The [`registry::TypeRegistry`] mapping type names to tags.
//! * [`datatype`] – [`datatype::TypeTag`], the [`datatype::Value`] domain and
//!   the [`datatype::DataType`] conversions.
//! * [`record`] – The collection, accessor, cursor and field type contracts the
//!   index consumes, plus the in-memory [`record::RecordList`].
//! * [`comparer`] – Per-field equality and the composite key built from it.
//! * [`index`] – The index engine and its result cursor.
//! * [`settings`] – Delimiters and the default type, loaded with `config`.
//!
//! ## Field types drive key equality
//! Every key field contributes the comparer of its own field type, so a text
//! field declared `varchar(ignorecase)` matches keys regardless of case.
//!
//! ## Staleness
//! An index stores record positions only. If the collection changes after
//! the index was built, queries keep answering from the old snapshot until
//! the index is rebuilt.
//!
//! ## Quick Start
//! ```
//! use std::collections::HashMap;
//! use tabula::datatype::Value;
//! use tabula::fieldspec::FieldSpecParser;
//! use tabula::index::SecondaryIndex;
//! use tabula::record::{RecordList, RecordSchema};
//!
//! let parser = FieldSpecParser::new();
//! let fields = parser.parse_all("id:int32,name:varchar");
//! let list = RecordList::new(RecordSchema::from_descriptors(&fields).unwrap());
//! list.push_text(&["1", "Alice"]).unwrap();
//! list.push_text(&["2", "Bob"]).unwrap();
//!
//! let mut index = SecondaryIndex::new(list.clone(), ["id"]).unwrap();
//! index.build().unwrap();
//! let key = HashMap::from([("id".to_string(), Value::Int32(2))]);
//! assert!(index.find_first(&key).is_some());
//! ```

pub mod comparer;
pub mod datatype;
pub mod error;
pub mod fieldspec;
pub mod index;
pub mod record;
pub mod registry;
pub mod settings;

pub use error::{Result, TabulaError};
