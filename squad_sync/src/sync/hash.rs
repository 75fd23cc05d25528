//! Content hashing for snapshot change detection.

use serde_json::Value;
use sha1::{Digest, Sha1};

/// SHA-1 hex digest of a JSON value's serialized form.
///
/// Deterministic for a given key enumeration order: the bag is serialized
/// exactly as stored, not canonicalized, so two equal-but-reordered bags can
/// hash differently. That is fine for its only purpose: a cheap "nothing
/// changed since the last snapshot" short-circuit. Not an integrity check.
pub fn hash_value(value: &Value) -> String {
    let json = value.to_string();
    hex::encode(Sha1::digest(json.as_bytes()))
}
