//! Operation builders for objects, files and scripts.
//!
//! # Design
//! `NcmbClient` holds the configuration and the executor factory and nothing
//! else. Each operation comes in two layers: a pure `build_*` method that
//! turns domain intent into an `HttpRequest`, and an operation method that
//! wraps that request in a `Call`. Callers that do their own IO use the
//! `build_*` layer directly; everyone else awaits, waits on, or backgrounds
//! the `Call`.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Map;

use crate::call::{decode_body, decode_optional_body, decode_response, decode_unit, Call};
use crate::config::NcmbConfig;
use crate::error::{ApiError, ApiResult};
use crate::executor::{Executor, ExecutorFactory};
use crate::file::NcmbFile;
use crate::http::{
    ApiType, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse, MultipartForm, ParamValue,
};
use crate::object::NcmbObject;
use crate::script::{NcmbScript, ScriptParams};

#[derive(Debug, Clone)]
pub struct NcmbClient {
    config: NcmbConfig,
    executor: Arc<ExecutorFactory>,
}

impl NcmbClient {
    /// Client that dispatches over the built-in `ureq` transport.
    #[cfg(feature = "ureq")]
    pub fn new(config: NcmbConfig) -> Self {
        Self::with_factory(config, Arc::new(ExecutorFactory::default()))
    }

    pub fn with_executor(config: NcmbConfig, executor: Arc<dyn Executor>) -> Self {
        Self::with_factory(config, Arc::new(ExecutorFactory::new(executor)))
    }

    /// Share `factory` with other clients; swapping its instance affects all
    /// of them.
    pub fn with_factory(config: NcmbConfig, factory: Arc<ExecutorFactory>) -> Self {
        Self {
            config,
            executor: factory,
        }
    }

    pub fn config(&self) -> &NcmbConfig {
        &self.config
    }

    pub fn executor_factory(&self) -> &Arc<ExecutorFactory> {
        &self.executor
    }

    /// Dispatch an arbitrary prebuilt request.
    pub fn send(&self, request: HttpRequest) -> Call<HttpResponse> {
        self.call(Ok(request), decode_response)
    }

    fn call<T>(&self, request: ApiResult<HttpRequest>, decode: fn(HttpResponse) -> ApiResult<T>) -> Call<T> {
        Call::new(request, Arc::clone(&self.executor), decode)
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    fn class_request(&self, method: HttpMethod, class_name: &str) -> ApiResult<HttpRequestBuilder> {
        if class_name.is_empty() {
            return Err(ApiError::InvalidArgument("class name is empty".to_string()));
        }
        let (api_type, segments) = ApiType::for_class(class_name);
        Ok(HttpRequest::builder(&self.config, method, api_type).subpaths(segments))
    }

    fn object_request(&self, method: HttpMethod, object: &NcmbObject) -> ApiResult<HttpRequestBuilder> {
        let object_id = object
            .object_id()
            .ok_or_else(|| ApiError::InvalidArgument("objectId is not set".to_string()))?;
        Ok(self.class_request(method, object.class_name())?.subpath(object_id))
    }

    /// POST a new object, or PUT when it already has an `objectId`.
    pub fn build_save_object(&self, object: &NcmbObject) -> ApiResult<HttpRequest> {
        let body = object.to_body()?;
        let builder = match object.object_id() {
            None => self.class_request(HttpMethod::Post, object.class_name())?,
            Some(_) => self.object_request(HttpMethod::Put, object)?,
        };
        Ok(builder.json_body(body).build())
    }

    pub fn save_object(&self, object: &NcmbObject) -> Call<HttpResponse> {
        self.call(self.build_save_object(object), decode_response)
    }

    pub fn build_update_object(&self, object: &NcmbObject) -> ApiResult<HttpRequest> {
        let body = object.to_body()?;
        Ok(self
            .object_request(HttpMethod::Put, object)?
            .json_body(body)
            .build())
    }

    pub fn update_object(&self, object: &NcmbObject) -> Call<HttpResponse> {
        self.call(self.build_update_object(object), decode_response)
    }

    pub fn build_fetch_object(&self, object: &NcmbObject) -> ApiResult<HttpRequest> {
        Ok(self.object_request(HttpMethod::Get, object)?.build())
    }

    pub fn fetch_object(&self, object: &NcmbObject) -> Call<HttpResponse> {
        self.call(self.build_fetch_object(object), decode_response)
    }

    pub fn build_delete_object(&self, object: &NcmbObject) -> ApiResult<HttpRequest> {
        Ok(self.object_request(HttpMethod::Delete, object)?.build())
    }

    pub fn delete_object(&self, object: &NcmbObject) -> Call<()> {
        self.call(self.build_delete_object(object), decode_unit)
    }

    /// GET the objects of a class, filtered by raw query parameters such as
    /// `where`, `limit` or `order`.
    pub fn build_find_objects(
        &self,
        class_name: &str,
        queries: &BTreeMap<String, ParamValue>,
    ) -> ApiResult<HttpRequest> {
        Ok(self
            .class_request(HttpMethod::Get, class_name)?
            .queries(queries.iter().map(|(k, v)| (k, v.clone())))
            .build())
    }

    pub fn find_objects(
        &self,
        class_name: &str,
        queries: &BTreeMap<String, ParamValue>,
    ) -> Call<HttpResponse> {
        self.call(self.build_find_objects(class_name, queries), decode_response)
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    fn file_request(&self, method: HttpMethod, file: &NcmbFile) -> ApiResult<HttpRequestBuilder> {
        if file.file_name().is_empty() {
            return Err(ApiError::InvalidArgument("fileName is empty".to_string()));
        }
        Ok(HttpRequest::builder(&self.config, method, ApiType::Files).subpath(file.file_name()))
    }

    /// Upload `data` as a multipart form with a `file` part and, when the
    /// file has one, an `acl` part.
    pub fn build_save_file(&self, file: &NcmbFile, data: Vec<u8>) -> ApiResult<HttpRequest> {
        let builder = self.file_request(HttpMethod::Post, file)?;
        let mut form =
            MultipartForm::new().file("file", file.file_name(), file.content_type(), data);
        if !file.acl().is_empty() {
            let acl = serde_json::to_string(file.acl())
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            form = form.text("acl", &acl);
        }
        Ok(builder.multipart_body(form).build())
    }

    pub fn save_file(&self, file: &NcmbFile, data: Vec<u8>) -> Call<HttpResponse> {
        self.call(self.build_save_file(file, data), decode_response)
    }

    /// Replace the ACL of an uploaded file.
    pub fn build_update_file(&self, file: &NcmbFile) -> ApiResult<HttpRequest> {
        let builder = self.file_request(HttpMethod::Put, file)?;
        let acl =
            serde_json::to_value(file.acl()).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut body = Map::new();
        body.insert("acl".to_string(), acl);
        Ok(builder.json_body(body).build())
    }

    pub fn update_file(&self, file: &NcmbFile) -> Call<HttpResponse> {
        self.call(self.build_update_file(file), decode_response)
    }

    pub fn build_fetch_file(&self, file: &NcmbFile) -> ApiResult<HttpRequest> {
        Ok(self.file_request(HttpMethod::Get, file)?.build())
    }

    /// Download the file's contents.
    pub fn fetch_file(&self, file: &NcmbFile) -> Call<Vec<u8>> {
        self.call(self.build_fetch_file(file), decode_body)
    }

    pub fn build_delete_file(&self, file: &NcmbFile) -> ApiResult<HttpRequest> {
        Ok(self.file_request(HttpMethod::Delete, file)?.build())
    }

    pub fn delete_file(&self, file: &NcmbFile) -> Call<()> {
        self.call(self.build_delete_file(file), decode_unit)
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    pub fn build_execute_script(
        &self,
        script: &NcmbScript,
        params: ScriptParams,
    ) -> ApiResult<HttpRequest> {
        if script.name().is_empty() {
            return Err(ApiError::InvalidArgument("script name is empty".to_string()));
        }
        let endpoint = script.endpoint().unwrap_or(&self.config.script_endpoint);
        let api_version = script
            .api_version()
            .unwrap_or(&self.config.script_api_version);
        let mut builder = HttpRequest::builder(&self.config, script.method(), ApiType::Script)
            .endpoint(endpoint)
            .api_version(api_version)
            .subpath(script.name())
            .headers(params.headers)
            .queries(params.queries);
        if matches!(script.method(), HttpMethod::Post | HttpMethod::Put) {
            builder = builder.json_body(params.body);
        }
        Ok(builder.build())
    }

    /// Run the script; the result is its raw response payload, `None` when
    /// empty.
    pub fn execute_script(&self, script: &NcmbScript, params: ScriptParams) -> Call<Option<Vec<u8>>> {
        self.call(self.build_execute_script(script, params), decode_optional_body)
    }
}
