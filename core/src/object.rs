//! Generic data-store object.

use serde_json::{Map, Value};

use crate::acl::Acl;
use crate::error::{ApiError, ApiResult};
use crate::fields::{reserved_keys_for_class, Fields};

/// An object of a data-store class.
///
/// `objectId` and the ACL have dedicated accessors; everything else goes
/// through `get`/`set`.
#[derive(Debug, Clone, PartialEq)]
pub struct NcmbObject {
    class_name: String,
    object_id: Option<String>,
    acl: Acl,
    fields: Fields,
}

impl NcmbObject {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            object_id: None,
            acl: Acl::empty(),
            fields: Fields::new(reserved_keys_for_class(class_name)),
        }
    }

    /// Handle to an object that already exists on the backend.
    pub fn with_object_id(class_name: &str, object_id: &str) -> Self {
        let mut object = Self::new(class_name);
        object.object_id = Some(object_id.to_string());
        object
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn set_object_id(&mut self, object_id: Option<&str>) {
        self.object_id = object_id.map(str::to_string);
    }

    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    pub fn set_acl(&mut self, acl: Acl) {
        self.acl = acl;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.set(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// JSON body for save/update: the user fields plus `acl` when one is set.
    ///
    /// `acl` is never accepted through `set`; it reaches the body only from
    /// the object's dedicated ACL, which is how the backend stores it.
    pub(crate) fn to_body(&self) -> ApiResult<Map<String, Value>> {
        let mut body = self.fields.as_map().clone();
        if !self.acl.is_empty() {
            let acl = serde_json::to_value(&self.acl)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            body.insert("acl".to_string(), acl);
        }
        Ok(body)
    }
}
