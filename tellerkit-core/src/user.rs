//! The opaque user profile record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user profile as returned by the identity service.
///
/// The record is an opaque attribute map (name, email, phone, address,
/// picture, verification flags, identifiers). This subsystem requires no
/// particular field except an identifier used for equality checks; every
/// other attribute passes through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub Map<String, Value>);

impl UserRecord {
    /// Wraps a JSON value, returning `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// The record's identifier, checking `_id` then `id`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0
            .get("_id")
            .or_else(|| self.0.get("id"))
            .and_then(Value::as_str)
    }

    /// Reads a single attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Writes a single attribute, replacing any previous value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Shallow merge: returns a new record where `overlay`'s keys
    /// overwrite this record's overlapping keys. Nested objects are
    /// replaced wholesale, not merged.
    #[must_use]
    pub fn merged_with(&self, overlay: &Self) -> Self {
        let mut out = self.0.clone();
        for (key, value) in &overlay.0 {
            out.insert(key.clone(), value.clone());
        }
        Self(out)
    }

    /// True when the record holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<UserRecord> for Value {
    fn from(user: UserRecord) -> Self {
        Self::Object(user.0)
    }
}

/// Normalizes a phone number to digits only. Formatting characters
/// (spaces, dashes, parentheses, a leading `+`) are stripped; validation
/// of the digit count is the caller's concern.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
