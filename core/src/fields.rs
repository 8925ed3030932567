//! Free-form entity fields with write-protected system keys.
//!
//! Keys owned by the backend (ids, timestamps, the ACL) cannot be assigned
//! through the generic accessor. Such writes are dropped without error and
//! the key keeps reading back as unset.

use serde_json::{Map, Value};
use tracing::debug;

pub const OBJECT_RESERVED_KEYS: &[&str] = &["objectId", "acl", "createDate", "updateDate"];

pub const USER_RESERVED_KEYS: &[&str] = &[
    "objectId",
    "acl",
    "createDate",
    "updateDate",
    "sessionToken",
];

pub const FILE_RESERVED_KEYS: &[&str] = &[
    "objectId",
    "acl",
    "createDate",
    "updateDate",
    "fileName",
    "mimeType",
    "fileSize",
];

/// Reserved keys for objects of `class_name`.
pub fn reserved_keys_for_class(class_name: &str) -> &'static [&'static str] {
    match class_name {
        "user" => USER_RESERVED_KEYS,
        _ => OBJECT_RESERVED_KEYS,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fields {
    reserved: &'static [&'static str],
    values: Map<String, Value>,
}

impl Fields {
    pub fn new(reserved: &'static [&'static str]) -> Self {
        Self {
            reserved,
            values: Map::new(),
        }
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved.contains(&key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        if self.is_reserved(key) {
            return None;
        }
        self.values.get(key)
    }

    /// Assign `key`. Writes to reserved keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if self.is_reserved(key) {
            debug!(key, "ignoring write to reserved field");
            return;
        }
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn set_and_get_plain_key() {
        let mut fields = Fields::new(OBJECT_RESERVED_KEYS);
        fields.set("score", 42);
        fields.set("note", Value::Null);
        assert_eq!(fields.get("score"), Some(&json!(42)));
        assert_eq!(fields.get("note"), Some(&Value::Null));
        assert_eq!(fields.get("missing"), None);
    }

    #[test]
    fn reserved_keys_stay_unset() {
        let mut fields = Fields::new(OBJECT_RESERVED_KEYS);
        for key in OBJECT_RESERVED_KEYS {
            fields.set(key, "value");
            assert_eq!(fields.get(key), None, "{key}");
        }
        assert!(fields.is_empty());
    }

    #[test]
    fn file_reserves_file_specific_keys() {
        let mut fields = Fields::new(FILE_RESERVED_KEYS);
        fields.set("fileName", "other.txt");
        fields.set("mimeType", "text/plain");
        fields.set("fileSize", 10);
        fields.set("comment", "kept");
        assert_eq!(fields.get("fileName"), None);
        assert_eq!(fields.get("mimeType"), None);
        assert_eq!(fields.get("fileSize"), None);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn user_class_reserves_session_token() {
        let mut fields = Fields::new(reserved_keys_for_class("user"));
        fields.set("sessionToken", "abc");
        assert_eq!(fields.get("sessionToken"), None);

        let mut fields = Fields::new(reserved_keys_for_class("TestClass"));
        fields.set("sessionToken", "abc");
        assert_eq!(fields.get("sessionToken"), Some(&json!("abc")));
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut fields = Fields::new(OBJECT_RESERVED_KEYS);
        fields.set("a", true);
        assert_eq!(fields.remove("a"), Some(json!(true)));
        assert_eq!(fields.get("a"), None);
    }
}
