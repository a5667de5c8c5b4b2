use bson::{Bson, Document};
use serde_json::{Map, Value};

/// Converts JSON into BSON, narrowing integers to int32 where they fit.
pub fn to_bson(value: &Value) -> Bson {
    match *value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(ref n) => match n.as_i64() {
            Some(i) if i >= i64::from(i32::min_value()) && i <= i64::from(i32::max_value()) => Bson::I32(i as i32),
            Some(i) => Bson::I64(i),
            None => Bson::FloatingPoint(n.as_f64().unwrap_or(0.0)),
        },
        Value::String(ref s) => Bson::String(s.clone()),
        Value::Array(ref array) => Bson::Array(array.iter().map(to_bson).collect()),
        Value::Object(ref object) => Bson::Document(to_document(object)),
    }
}

pub fn to_document(object: &Map<String, Value>) -> Document {
    let mut doc = Document::new();
    for (key, value) in object {
        doc.insert(key.clone(), to_bson(value));
    }
    doc
}

/// Reads a JSON value that must be an object.
pub fn document(value: &Value) -> Document {
    match *value {
        Value::Object(ref object) => to_document(object),
        ref other => panic!("Expected a JSON object, got {}", other),
    }
}
