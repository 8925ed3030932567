//! File-store entries.

use serde_json::Value;

use crate::acl::Acl;
use crate::fields::{Fields, FILE_RESERVED_KEYS};

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file addressed by name in the file store.
#[derive(Debug, Clone, PartialEq)]
pub struct NcmbFile {
    file_name: String,
    mime_type: Option<String>,
    acl: Acl,
    fields: Fields,
}

impl NcmbFile {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime_type: None,
            acl: Acl::empty(),
            fields: Fields::new(FILE_RESERVED_KEYS),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn set_mime_type(&mut self, mime_type: &str) {
        self.mime_type = Some(mime_type.to_string());
    }

    /// MIME type sent on upload.
    pub fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }

    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = acl;
    }

    /// Custom fields are local to this value: uploads and ACL updates send
    /// only the file data, MIME type and ACL.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Store a local custom field. Reserved keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.set(key, value);
    }
}
