//! Field-level diffing between two attribute bags.

use serde_json::{Map, Value};

/// One field whose serialized value differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Key into the raw attribute bag.
    pub field_name: String,
    /// Serialized previous value; `None` when the field appeared.
    pub old_value: Option<String>,
    /// Serialized new value; `None` when the field vanished.
    pub new_value: Option<String>,
}

/// Serialize a bag value for comparison and storage.
///
/// Null (and an absent field) map to `None`; strings stay themselves;
/// numbers and booleans take their display form; objects and arrays become
/// compact JSON text.
pub fn serialize_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Diff two flat bags, reporting every key (from either side) whose
/// serialized values differ. Keys keep the old bag's order, with keys only
/// present in the new bag appended after.
pub fn diff_bags(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<FieldChange> {
    let mut keys: Vec<&String> = old.keys().collect();
    keys.extend(new.keys().filter(|k| !old.contains_key(*k)));

    let mut changes = Vec::new();
    for key in keys {
        let old_value = serialize_value(old.get(key));
        let new_value = serialize_value(new.get(key));
        if old_value != new_value {
            changes.push(FieldChange {
                field_name: key.clone(),
                old_value,
                new_value,
            });
        }
    }
    changes
}
