#![allow(dead_code)]

use std::collections::HashMap;

use tabula::datatype::Value;
use tabula::fieldspec::FieldSpecParser;
use tabula::record::{RecordList, RecordSchema, ValueField};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn list_for(spec: &str) -> RecordList<ValueField> {
    let fields = FieldSpecParser::new().parse_all(spec);
    RecordList::new(RecordSchema::from_descriptors(&fields).expect("schema"))
}

/// Five records with ids 1, 2, 3, 2, 5.
pub fn people() -> RecordList<ValueField> {
    let list = list_for("id:int32,name:varchar");
    for (id, name) in [("1", "Ann"), ("2", "Bo"), ("3", "Cy"), ("2", "Di"), ("5", "Ed")] {
        list.push_text(&[id, name]).expect("push");
    }
    list
}

pub fn key(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}
