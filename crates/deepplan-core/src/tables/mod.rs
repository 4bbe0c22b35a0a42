pub mod shopping;
pub mod travel;

use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// One output record. Field insertion order is preserved so the written
/// column order matches the order fields are emitted in.
pub type Row = serde_json::Map<String, Value>;

/// Accumulates rows per logical table during a build.
#[derive(Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<String, Vec<Row>>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table so it is written even when no rows arrive.
    pub fn ensure(&mut self, name: &str) {
        self.tables.entry(name.to_string()).or_default();
    }

    pub fn push(&mut self, name: &str, row: Row) {
        self.tables.entry(name.to_string()).or_default().push(row);
    }

    pub fn rows(&self, name: &str) -> Option<&[Row]> {
        self.tables.get(name).map(|rows| rows.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Row>)> {
        self.tables.iter()
    }

    pub fn merge(&mut self, other: TableSet) {
        for (name, mut rows) in other.tables {
            self.tables.entry(name).or_default().append(&mut rows);
        }
    }
}

/// Convert a `json!({...})` object literal into a [`Row`].
pub(crate) fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("row literals are always objects"),
    }
}

/// Compact JSON side-channel blob. Parsing the blob back reproduces the
/// original nested value.
pub(crate) fn json_blob(value: &Value) -> String {
    value.to_string()
}

/// Mirror of stringified scalar access on loosely typed source objects:
/// missing keys become the empty string, strings pass through, everything
/// else keeps its JSON rendering.
pub(crate) fn str_field(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Canonical string form of an `id` value that may arrive as number or string.
pub(crate) fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a required JSON file. Missing files and malformed JSON are both
/// fatal for the whole run.
pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("malformed JSON in {}", path.display()))
}
