//! HTTP request/response descriptors for the host-does-IO pattern.
//!
//! # Design
//! `HttpRequest` is plain data describing one call to the backend. It keeps
//! the pieces (endpoint, API version, API root, path segments, header and
//! query maps, body) separate instead of a pre-rendered URL so executors and
//! tests can inspect exactly what an operation asked for. Rendering happens
//! in `url()` and `body_bytes()`, which are the only places encoding can fail.
//!
//! Header and query maps store `Option<String>` values: `Some(v)` is a normal
//! entry, `None` is a key that is present with a null value. Callers describe
//! their inputs with `ParamValue`, where `Absent` means "leave the key out".

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::config::NcmbConfig;
use crate::error::{ApiError, ApiResult};
use crate::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const APPLICATION_KEY_HEADER: &str = "X-NCMB-Application-Key";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First path component after the API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiType {
    Classes,
    Users,
    Roles,
    Installations,
    Files,
    Push,
    Script,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Classes => "classes",
            ApiType::Users => "users",
            ApiType::Roles => "roles",
            ApiType::Installations => "installations",
            ApiType::Files => "files",
            ApiType::Push => "push",
            ApiType::Script => "script",
        }
    }

    /// API root and leading path segments that address a class.
    ///
    /// Built-in classes have their own roots; everything else lives under
    /// `classes/{name}`.
    pub fn for_class(class_name: &str) -> (ApiType, Vec<String>) {
        match class_name {
            "user" => (ApiType::Users, Vec::new()),
            "role" => (ApiType::Roles, Vec::new()),
            "installation" => (ApiType::Installations, Vec::new()),
            "push" => (ApiType::Push, Vec::new()),
            other => (ApiType::Classes, vec![other.to_string()]),
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-side value for a header or query entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParamValue {
    /// The key is not sent at all.
    #[default]
    Absent,
    /// The key is sent without a value.
    Null,
    Value(String),
}

impl ParamValue {
    /// Stored form of this value, or `None` when the key must be skipped.
    fn into_item(self) -> Option<Option<String>> {
        match self {
            ParamValue::Absent => None,
            ParamValue::Null => Some(None),
            ParamValue::Value(value) => Some(Some(value)),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Value(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Value(value)
    }
}

impl From<Option<Option<String>>> for ParamValue {
    fn from(value: Option<Option<String>>) -> Self {
        match value {
            None => ParamValue::Absent,
            Some(None) => ParamValue::Null,
            Some(Some(value)) => ParamValue::Value(value),
        }
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<FormPart>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(&format!("ncmb-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        });
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: Vec<u8>) -> Self {
        self.parts.push(FormPart {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            content_type: Some(content_type.to_string()),
            data,
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_disposition(&part.name)
            );
            if let Some(file_name) = &part.file_name {
                disposition.push_str(&format!("; filename=\"{}\"", escape_disposition(file_name)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
            }
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(&part.data);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// Percent-escape the characters that would end a quoted
/// `Content-Disposition` parameter or the header line itself.
fn escape_disposition(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Body of an outbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// A JSON object; `Value::Null` entries are sent as explicit nulls.
    Json(Map<String, Value>),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE.to_string()),
            RequestBody::Multipart(form) => Some(form.content_type()),
        }
    }

    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            RequestBody::Json(map) => Some(map),
            _ => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `HttpRequest::builder` (usually through `NcmbClient::build_*`)
/// and handed to an `Executor`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub api_type: ApiType,
    pub endpoint: String,
    pub api_version: String,
    pub subpath_items: Vec<String>,
    pub header_items: BTreeMap<String, Option<String>>,
    pub query_items: BTreeMap<String, Option<String>>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Start a request whose endpoint, API version and timeout come from
    /// `config`.
    pub fn builder(config: &NcmbConfig, method: HttpMethod, api_type: ApiType) -> HttpRequestBuilder {
        HttpRequestBuilder {
            application_key: config.application_key.clone(),
            client_key: config.client_key.clone(),
            signed_at: None,
            request: HttpRequest {
                method,
                api_type,
                endpoint: config.endpoint.clone(),
                api_version: config.api_version.clone(),
                subpath_items: Vec::new(),
                header_items: BTreeMap::new(),
                query_items: BTreeMap::new(),
                body: RequestBody::Empty,
                timeout: config.timeout,
            },
        }
    }

    /// Render `{endpoint}/{apiVersion}/{apiType}/{subpath...}?{query}`.
    pub fn url(&self) -> ApiResult<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(format!("{}: not a base url", self.endpoint)))?;
            segments
                .pop_if_empty()
                .push(&self.api_version)
                .push(self.api_type.as_str())
                .extend(&self.subpath_items);
        }
        if !self.query_items.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query_items {
                match value {
                    Some(value) => pairs.append_pair(key, value),
                    None => pairs.append_key_only(key),
                };
            }
        }
        Ok(url)
    }

    /// Serialized body, or `None` for a bodiless request.
    pub fn body_bytes(&self) -> ApiResult<Option<Vec<u8>>> {
        match &self.body {
            RequestBody::Empty => Ok(None),
            RequestBody::Json(map) => serde_json::to_vec(map)
                .map(Some)
                .map_err(|e| ApiError::Serialization(e.to_string())),
            RequestBody::Multipart(form) => Ok(Some(form.encode())),
        }
    }

    /// Look up a header case-insensitively. The inner `None` is a header
    /// present with a null value.
    pub fn header(&self, name: &str) -> Option<Option<&str>> {
        self.header_items
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_deref())
    }
}

/// Incremental construction of an `HttpRequest`.
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    application_key: String,
    client_key: String,
    signed_at: Option<OffsetDateTime>,
    request: HttpRequest,
}

/// Insert `key`, replacing any entry that differs only in ASCII case.
fn insert_header(headers: &mut BTreeMap<String, Option<String>>, key: &str, value: Option<String>) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(key));
    headers.insert(key.to_string(), value);
}

impl HttpRequestBuilder {
    pub fn subpath(mut self, segment: impl Into<String>) -> Self {
        self.request.subpath_items.push(segment.into());
        self
    }

    pub fn subpaths<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request
            .subpath_items
            .extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        if let Some(item) = value.into().into_item() {
            insert_header(&mut self.request.header_items, key, item);
        }
        self
    }

    pub fn headers<I, K, V>(self, items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        items
            .into_iter()
            .fold(self, |builder, (key, value)| builder.header(key.as_ref(), value))
    }

    pub fn query(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        if let Some(item) = value.into().into_item() {
            self.request.query_items.insert(key.to_string(), item);
        }
        self
    }

    pub fn queries<I, K, V>(self, items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        items
            .into_iter()
            .fold(self, |builder, (key, value)| builder.query(key.as_ref(), value))
    }

    pub fn json_body(mut self, body: Map<String, Value>) -> Self {
        self.request.body = RequestBody::Json(body);
        self
    }

    pub fn multipart_body(mut self, form: MultipartForm) -> Self {
        self.request.body = RequestBody::Multipart(form);
        self
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.request.endpoint = endpoint.to_string();
        self
    }

    pub fn api_version(mut self, api_version: &str) -> Self {
        self.request.api_version = api_version.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    /// Sign as of `at` instead of the current time.
    pub fn signed_at(mut self, at: OffsetDateTime) -> Self {
        self.signed_at = Some(at);
        self
    }

    /// Finish the request, filling in the body's content type and the
    /// application key header unless the caller already set them.
    ///
    /// With a client key configured the request is also signed. A request
    /// whose URL cannot be rendered is left unsigned; dispatching it fails
    /// with `ApiError::InvalidUrl` anyway.
    pub fn build(self) -> HttpRequest {
        let mut request = self.request;
        if let Some(content_type) = request.body.content_type() {
            if request.header(CONTENT_TYPE_HEADER).is_none() {
                request
                    .header_items
                    .insert(CONTENT_TYPE_HEADER.to_string(), Some(content_type));
            }
        }
        if !self.application_key.is_empty() && request.header(APPLICATION_KEY_HEADER).is_none() {
            request
                .header_items
                .insert(APPLICATION_KEY_HEADER.to_string(), Some(self.application_key));
        }
        if !self.client_key.is_empty() && request.header(SIGNATURE_HEADER).is_none() {
            let at = self.signed_at.unwrap_or_else(OffsetDateTime::now_utc);
            match signature::sign(&request, &self.client_key, at) {
                Ok(signed) => {
                    insert_header(&mut request.header_items, TIMESTAMP_HEADER, Some(signed.timestamp));
                    request
                        .header_items
                        .insert(SIGNATURE_HEADER.to_string(), Some(signed.signature));
                }
                Err(e) => tracing::debug!(error = %e, "request left unsigned"),
            }
        }
        request
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn config() -> NcmbConfig {
        NcmbConfig::new("app-key", "client-key")
    }

    fn builder(method: HttpMethod, api_type: ApiType) -> HttpRequestBuilder {
        HttpRequest::builder(&config(), method, api_type)
    }

    #[test]
    fn url_joins_endpoint_version_type_and_subpath() {
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .subpaths(["TestClass", "abcd"])
            .build();
        assert_eq!(
            req.url().unwrap().as_str(),
            "https://mbaas.api.nifcloud.com/2013-09-01/classes/TestClass/abcd"
        );
    }

    #[test]
    fn url_uses_overridden_endpoint_without_trailing_slash() {
        let req = builder(HttpMethod::Get, ApiType::Files)
            .endpoint("https://piyo.example.com")
            .api_version("1986-02-04")
            .subpath("abcd.txt")
            .build();
        assert_eq!(
            req.url().unwrap().as_str(),
            "https://piyo.example.com/1986-02-04/files/abcd.txt"
        );
    }

    #[test]
    fn url_percent_encodes_path_segments() {
        let req = builder(HttpMethod::Get, ApiType::Files)
            .subpath("my file/1.txt")
            .build();
        assert_eq!(
            req.url().unwrap().path(),
            "/2013-09-01/files/my%20file%2F1.txt"
        );
    }

    #[test]
    fn null_query_renders_bare_key_and_absent_is_skipped() {
        let req = builder(HttpMethod::Get, ApiType::Script)
            .subpath("myScript.js")
            .query("takanokun", "takano_san")
            .query("piyo", ParamValue::Null)
            .query("missing", ParamValue::Absent)
            .build();
        assert_eq!(req.url().unwrap().query(), Some("piyo&takanokun=takano_san"));
    }

    #[test]
    fn query_values_are_form_encoded() {
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .subpath("TestClass")
            .query("where", r#"{"a":1}"#)
            .build();
        assert_eq!(req.url().unwrap().query(), Some("where=%7B%22a%22%3A1%7D"));
    }

    #[test]
    fn no_query_items_means_no_question_mark() {
        let req = builder(HttpMethod::Get, ApiType::Users).build();
        assert!(!req.url().unwrap().as_str().contains('?'));
    }

    #[test]
    fn unparseable_endpoint_is_an_invalid_url() {
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .endpoint("not a url")
            .build();
        assert!(matches!(req.url(), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn cannot_be_a_base_endpoint_is_an_invalid_url() {
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .endpoint("mailto:someone@example.com")
            .build();
        assert!(matches!(req.url(), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn null_header_is_kept_and_absent_is_dropped() {
        let req = builder(HttpMethod::Get, ApiType::Script)
            .header("key1", "value1")
            .header("key2", ParamValue::Null)
            .header("key3", ParamValue::Absent)
            .build();
        assert_eq!(req.header("key1"), Some(Some("value1")));
        assert_eq!(req.header("key2"), Some(None));
        assert_eq!(req.header("key3"), None);
    }

    #[test]
    fn json_body_keeps_explicit_nulls_and_types() {
        let body = json!({"name": "takanokun", "age": 29, "isStudent": true, "job": null});
        let req = builder(HttpMethod::Post, ApiType::Script)
            .json_body(body.as_object().unwrap().clone())
            .build();
        let raw = String::from_utf8(req.body_bytes().unwrap().unwrap()).unwrap();
        assert!(raw.contains(r#""name":"takanokun""#));
        assert!(raw.contains(r#""age":29"#));
        assert!(raw.contains(r#""isStudent":true"#));
        assert!(raw.contains(r#""job":null"#));
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, body);
    }

    #[test]
    fn json_body_sets_default_content_type() {
        let req = builder(HttpMethod::Post, ApiType::Classes)
            .json_body(Map::new())
            .build();
        assert_eq!(req.header("content-type"), Some(Some(JSON_CONTENT_TYPE)));
    }

    #[test]
    fn caller_content_type_wins() {
        let req = builder(HttpMethod::Post, ApiType::Script)
            .header("content-type", "text/plain")
            .json_body(Map::new())
            .build();
        assert_eq!(req.header(CONTENT_TYPE_HEADER), Some(Some("text/plain")));
        let content_types = req
            .header_items
            .keys()
            .filter(|key| key.eq_ignore_ascii_case(CONTENT_TYPE_HEADER))
            .count();
        assert_eq!(content_types, 1);
    }

    #[test]
    fn header_keys_differing_in_case_replace_each_other() {
        let req = builder(HttpMethod::Post, ApiType::Script)
            .header("Content-Type", "text/plain")
            .header("content-type", "text/html")
            .header("X-Custom", "a")
            .header("x-custom", ParamValue::Null)
            .build();
        assert_eq!(req.header(CONTENT_TYPE_HEADER), Some(Some("text/html")));
        assert_eq!(req.header("X-CUSTOM"), Some(None));
        let keys: Vec<&str> = req.header_items.keys().map(String::as_str).collect();
        assert!(keys.contains(&"content-type"));
        assert!(keys.contains(&"x-custom"));
        assert!(!keys.contains(&"Content-Type"));
        assert!(!keys.contains(&"X-Custom"));
    }

    #[test]
    fn client_key_signs_every_request() {
        let req = builder(HttpMethod::Get, ApiType::Files)
            .subpath("abcd.txt")
            .signed_at(time::macros::datetime!(2013-12-02 02:44:35.452 UTC))
            .build();
        assert_eq!(
            req.header(TIMESTAMP_HEADER),
            Some(Some("2013-12-02T02:44:35.452Z"))
        );
        let signature = req.header(SIGNATURE_HEADER).flatten().unwrap();
        let expected = signature::sign(
            &req,
            "client-key",
            time::macros::datetime!(2013-12-02 02:44:35.452 UTC),
        )
        .unwrap();
        assert_eq!(signature, expected.signature);
    }

    #[test]
    fn no_client_key_means_no_signature() {
        let req = HttpRequest::builder(
            &NcmbConfig::new("app-key", ""),
            HttpMethod::Get,
            ApiType::Files,
        )
        .build();
        assert_eq!(req.header(SIGNATURE_HEADER), None);
        assert_eq!(req.header(TIMESTAMP_HEADER), None);
    }

    #[test]
    fn unrenderable_url_is_left_unsigned() {
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .endpoint("not a url")
            .build();
        assert_eq!(req.header(SIGNATURE_HEADER), None);
        assert!(matches!(req.url(), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn bodiless_request_has_no_content_type() {
        let req = builder(HttpMethod::Get, ApiType::Classes).build();
        assert_eq!(req.header(CONTENT_TYPE_HEADER), None);
        assert_eq!(req.body_bytes().unwrap(), None);
    }

    #[test]
    fn application_key_header_comes_from_config() {
        let req = builder(HttpMethod::Get, ApiType::Classes).build();
        assert_eq!(req.header(APPLICATION_KEY_HEADER), Some(Some("app-key")));

        let anonymous = HttpRequest::builder(
            &NcmbConfig::default(),
            HttpMethod::Get,
            ApiType::Classes,
        )
        .build();
        assert_eq!(anonymous.header(APPLICATION_KEY_HEADER), None);
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        let req = builder(HttpMethod::Get, ApiType::Classes).build();
        assert_eq!(req.timeout, Duration::from_secs(10));
        let req = builder(HttpMethod::Get, ApiType::Classes)
            .timeout(Duration::from_secs(3))
            .build();
        assert_eq!(req.timeout, Duration::from_secs(3));
    }

    #[test]
    fn param_value_from_nested_option() {
        assert_eq!(ParamValue::from(None::<Option<String>>), ParamValue::Absent);
        assert_eq!(ParamValue::from(Some(None::<String>)), ParamValue::Null);
        assert_eq!(
            ParamValue::from(Some(Some("v".to_string()))),
            ParamValue::Value("v".to_string())
        );
    }

    #[test]
    fn api_type_for_builtin_classes() {
        assert_eq!(ApiType::for_class("user"), (ApiType::Users, vec![]));
        assert_eq!(ApiType::for_class("role"), (ApiType::Roles, vec![]));
        assert_eq!(
            ApiType::for_class("installation"),
            (ApiType::Installations, vec![])
        );
        assert_eq!(ApiType::for_class("push"), (ApiType::Push, vec![]));
        assert_eq!(
            ApiType::for_class("TestClass"),
            (ApiType::Classes, vec!["TestClass".to_string()])
        );
    }

    #[test]
    fn multipart_encodes_parts_with_boundary() {
        let form = MultipartForm::with_boundary("XyZ")
            .file("file", "a.txt", "text/plain", b"hello".to_vec())
            .text("acl", r#"{"*":{"read":true}}"#);
        let expected = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hello\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"acl\"\r\n",
            "\r\n",
            "{\"*\":{\"read\":true}}\r\n",
            "--XyZ--\r\n",
        );
        assert_eq!(String::from_utf8(form.encode()).unwrap(), expected);
        assert_eq!(form.content_type(), "multipart/form-data; boundary=XyZ");
    }

    #[test]
    fn multipart_escapes_quotes_and_line_breaks_in_names() {
        let form = MultipartForm::with_boundary("XyZ").file(
            "file",
            "a\"; name=\"acl.txt\r\nX-Injected: 1",
            "text/plain",
            b"hello".to_vec(),
        );
        let encoded = String::from_utf8(form.encode()).unwrap();
        assert!(encoded.contains(
            "Content-Disposition: form-data; name=\"file\"; \
             filename=\"a%22; name=%22acl.txt%0D%0AX-Injected: 1\"\r\n"
        ));
        assert!(!encoded.contains("\r\nX-Injected"));
    }

    #[test]
    fn response_success_range() {
        assert!(HttpResponse::new(200, Vec::<u8>::new()).is_success());
        assert!(HttpResponse::new(201, Vec::<u8>::new()).is_success());
        assert!(!HttpResponse::new(404, Vec::<u8>::new()).is_success());
    }

    proptest! {
        #[test]
        fn every_query_entry_renders_once(
            entries in proptest::collection::btree_map(
                "[a-z]{1,8}",
                proptest::option::of("[a-z0-9]{0,8}"),
                0..8,
            )
        ) {
            let mut builder = builder(HttpMethod::Get, ApiType::Classes);
            for (key, value) in &entries {
                builder = builder.query(key, ParamValue::from(Some(value.clone())));
            }
            let url = builder.build().url().unwrap();
            let rendered: Vec<String> = url
                .query()
                .map(|q| q.split('&').map(str::to_string).collect())
                .unwrap_or_default();
            prop_assert_eq!(rendered.len(), entries.len());
            for (key, value) in &entries {
                let expected = match value {
                    Some(value) => format!("{key}={value}"),
                    None => key.clone(),
                };
                prop_assert!(rendered.contains(&expected));
            }
        }

        #[test]
        fn json_body_renders_every_key_once_with_its_type(
            body in proptest::collection::btree_map(
                "[a-zA-Z][a-zA-Z0-9]{0,8}",
                prop_oneof![
                    Just(Value::Null),
                    any::<bool>().prop_map(Value::from),
                    any::<i64>().prop_map(Value::from),
                    "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
                ],
                0..10,
            )
        ) {
            let map: Map<String, Value> = body.clone().into_iter().collect();
            let req = builder(HttpMethod::Post, ApiType::Script)
                .json_body(map.clone())
                .build();
            let raw = String::from_utf8(req.body_bytes().unwrap().unwrap()).unwrap();

            for (key, value) in &body {
                let quoted_key = format!("\"{key}\":");
                prop_assert_eq!(raw.matches(&quoted_key).count(), 1);
                let rendered = match value {
                    Value::Null => "null".to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => format!("\"{s}\""),
                    _ => unreachable!(),
                };
                let expected_pair = format!("{quoted_key}{rendered}");
                prop_assert!(raw.contains(&expected_pair));
            }
            let parsed: Value = serde_json::from_str(&raw).unwrap();
            prop_assert_eq!(parsed, Value::Object(map));
        }
    }
}
