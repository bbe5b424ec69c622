//! Configuration trees
//!
//! Default values and user values are compared as plain `serde_yaml::Value`
//! trees. This module holds the handful of helpers the comparator needs on
//! top of them: a kind tag for type-change detection, key normalization, and
//! path-addressed lookup and editing.

use serde_yaml::{Mapping, Value};

/// The runtime kind of a value, as used for type-change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
    Tagged,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Mapping(_) => ValueKind::Mapping,
            Value::Tagged(_) => ValueKind::Tagged,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "Null",
            ValueKind::Bool => "Bool",
            ValueKind::Number => "Number",
            ValueKind::String => "String",
            ValueKind::Sequence => "Sequence",
            ValueKind::Mapping => "Mapping",
            ValueKind::Tagged => "Tagged",
        }
    }
}

/// Textual form of a mapping key.
///
/// Non-string keys (`80:`, `true:`) are addressed by their textual form.
pub fn key_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Recursively convert every mapping key to a string key.
pub fn stringify_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| (Value::String(key_string(&key)), stringify_keys(value)))
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(stringify_keys).collect()),
        Value::Tagged(mut tagged) => {
            let inner = std::mem::replace(&mut tagged.value, Value::Null);
            tagged.value = stringify_keys(inner);
            Value::Tagged(tagged)
        }
        other => other,
    }
}

/// Resolve a key path inside a tree.
pub fn lookup<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| current.as_mapping()?.get(*segment))
}

/// Write `value` at a key path, creating (or replacing non-mapping)
/// intermediates with empty mappings.
pub fn insert_at(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        current = match current {
            Value::Mapping(map) => map
                .entry(Value::String(segment.to_string()))
                .or_insert(Value::Mapping(Mapping::new())),
            _ => return,
        };
    }

    if !current.is_mapping() {
        *current = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = current {
        map.insert(Value::String(last.to_string()), value);
    }
}

/// Remove the value at a key path, returning it if it was present.
pub fn remove_at(root: &mut Value, segments: &[&str]) -> Option<Value> {
    let (last, parents) = segments.split_last()?;
    let mut current = root;
    for segment in parents {
        current = current.as_mapping_mut()?.get_mut(*segment)?;
    }
    current.as_mapping_mut()?.remove(*last)
}

/// Compact single-line rendering for logs and summaries.
pub fn describe(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}
