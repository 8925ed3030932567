//! Access control lists.
//!
//! # Design
//! An ACL maps a subject key (user id, `role:<name>`, or the wildcard `*`) to
//! a read/write pair. Lookups are exact: an unset key answers `None`, never a
//! value inherited from `*`. Falling back to public access is a policy the
//! caller applies on top.
//!
//! On the wire only granted permissions are written, so
//! `{"*":{"read":true}}` reads back as `*` readable, not writable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Subject key granting access to everyone.
pub const PUBLIC_KEY: &str = "*";

const ROLE_PREFIX: &str = "role:";

/// Read/write grant for a single subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(rename = "read", default, skip_serializing_if = "is_false")]
    pub readable: bool,
    #[serde(rename = "write", default, skip_serializing_if = "is_false")]
    pub writable: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Permission {
    pub fn new(readable: bool, writable: bool) -> Self {
        Self { readable, writable }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl {
    entries: BTreeMap<String, Permission>,
}

impl Acl {
    /// An ACL with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The public preset: `*` may read and write.
    pub fn public_read_write() -> Self {
        let mut acl = Self::empty();
        acl.put(PUBLIC_KEY, true, true);
        acl
    }

    /// Subject key for a role name.
    pub fn role_key(role_name: &str) -> String {
        format!("{ROLE_PREFIX}{role_name}")
    }

    /// Insert or replace the grant for `key`.
    pub fn put(&mut self, key: &str, readable: bool, writable: bool) {
        self.entries
            .insert(key.to_string(), Permission::new(readable, writable));
    }

    pub fn remove(&mut self, key: &str) -> Option<Permission> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<Permission> {
        self.entries.get(key).copied()
    }

    pub fn get_readable(&self, key: &str) -> Option<bool> {
        self.get(key).map(|p| p.readable)
    }

    pub fn get_writable(&self, key: &str) -> Option<bool> {
        self.get(key).map(|p| p.writable)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Permission)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), *p))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_acl_has_no_entries() {
        let acl = Acl::empty();
        assert!(acl.is_empty());
        assert_eq!(acl.get_readable("*"), None);
        assert_eq!(acl.get_writable("*"), None);
    }

    #[test]
    fn public_preset_grants_wildcard() {
        let acl = Acl::public_read_write();
        assert_eq!(acl.len(), 1);
        assert_eq!(acl.get_readable("*"), Some(true));
        assert_eq!(acl.get_writable("*"), Some(true));
    }

    #[test]
    fn put_does_not_fall_back_to_wildcard() {
        let mut acl = Acl::public_read_write();
        acl.put("abcd", false, true);
        assert_eq!(acl.get_readable("abcd"), Some(false));
        assert_eq!(acl.get_writable("abcd"), Some(true));
        assert_eq!(acl.get_readable("efgh"), None);
    }

    #[test]
    fn put_replaces_existing_grant() {
        let mut acl = Acl::empty();
        acl.put("abcd", true, true);
        acl.put("abcd", false, false);
        assert_eq!(acl.get("abcd"), Some(Permission::new(false, false)));
        assert_eq!(acl.len(), 1);
    }

    #[test]
    fn remove_returns_key_to_unset() {
        let mut acl = Acl::empty();
        acl.put("abcd", true, false);
        assert_eq!(acl.remove("abcd"), Some(Permission::new(true, false)));
        assert_eq!(acl.get_readable("abcd"), None);
    }

    #[test]
    fn serializes_only_granted_permissions() {
        let mut acl = Acl::empty();
        acl.put("*", true, false);
        acl.put(&Acl::role_key("admin"), true, true);
        acl.put("nobody", false, false);
        let json = serde_json::to_value(&acl).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "*": {"read": true},
                "role:admin": {"read": true, "write": true},
                "nobody": {}
            })
        );
    }

    #[test]
    fn deserializes_backend_acl() {
        let acl: Acl =
            serde_json::from_str(r#"{"*":{"read":true},"user1":{"write":true}}"#).unwrap();
        assert_eq!(acl.get_readable("*"), Some(true));
        assert_eq!(acl.get_writable("*"), Some(false));
        assert_eq!(acl.get_readable("user1"), Some(false));
        assert_eq!(acl.get_writable("user1"), Some(true));
    }

    proptest! {
        #[test]
        fn put_is_visible_only_for_its_key(
            key in "[a-zA-Z0-9:]{1,16}",
            other in "[a-zA-Z0-9:]{1,16}",
            readable in any::<bool>(),
            writable in any::<bool>()
        ) {
            prop_assume!(key != other);
            let mut acl = Acl::empty();
            acl.put(&key, readable, writable);
            prop_assert_eq!(acl.get_readable(&key), Some(readable));
            prop_assert_eq!(acl.get_writable(&key), Some(writable));
            prop_assert_eq!(acl.get_readable(&other), None);
            prop_assert_eq!(acl.get_writable(&other), None);
            prop_assert_eq!(acl.get_readable(PUBLIC_KEY), None);
        }
    }
}
