//! Server-side script invocation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::http::{HttpMethod, ParamValue};

/// A script addressed by name, invoked with a fixed HTTP method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NcmbScript {
    name: String,
    method: HttpMethod,
    endpoint: Option<String>,
    api_version: Option<String>,
}

impl NcmbScript {
    pub fn new(name: &str, method: HttpMethod) -> Self {
        Self {
            name: name.to_string(),
            method,
            endpoint: None,
            api_version: None,
        }
    }

    /// Use `endpoint` instead of the configured script endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = Some(api_version.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }
}

/// Per-call inputs for a script execution.
///
/// `body` is only sent for POST and PUT scripts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptParams {
    pub headers: BTreeMap<String, ParamValue>,
    pub queries: BTreeMap<String, ParamValue>,
    pub body: Map<String, Value>,
}

impl ScriptParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header names are case-insensitive; a later call replaces an earlier
    /// key that differs only in case.
    pub fn header(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(key));
        self.headers.insert(key.to_string(), value.into());
        self
    }

    pub fn query(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.queries.insert(key.to_string(), value.into());
        self
    }

    pub fn body_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_string(), value.into());
        self
    }
}
