//! C-ABI wrapper around `ncmb-core`.
//!
//! # Overview
//! Exposes the client, ACLs, file download and script execution through
//! `extern "C"` functions so any language with a C FFI can drive the mobile
//! backend without linking to Rust's async machinery or serde directly.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `ncmb_build_*` hands back the request as plain data for hosts that do
//!   their own IO; the executing functions dispatch through the client's
//!   executor, either blocking or on a background thread with a callback.
//! - A single `FfiNcmbResult` envelope conveys payload bytes and errors.
//! - The C caller owns all returned pointers and must call the matching
//!   `ncmb_free_*` function to release them.

pub mod types;

use std::collections::BTreeMap;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use ncmb_core::{
    Acl, ApiError, ApiResult, NcmbClient, NcmbConfig, NcmbFile, NcmbScript, ParamValue,
    ScriptParams,
};
use serde_json::{Map, Value};

use types::*;

/// Borrow a C string, or `None` when it is null or not UTF-8.
fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Parse an optional JSON object argument. Null means empty.
fn json_object_arg(ptr: *const c_char, name: &str) -> ApiResult<Map<String, Value>> {
    let Some(raw) = opt_str(ptr) else {
        return Ok(Map::new());
    };
    serde_json::from_str(raw)
        .map_err(|e| ApiError::InvalidArgument(format!("{name} is not a JSON object: {e}")))
}

/// Header and query maps arrive as JSON objects; `null` sends the key bare.
fn param_map(ptr: *const c_char, name: &str) -> ApiResult<BTreeMap<String, ParamValue>> {
    json_object_arg(ptr, name).map(|map| {
        map.into_iter()
            .map(|(key, value)| {
                let param = match value {
                    Value::Null => ParamValue::Null,
                    Value::String(s) => ParamValue::Value(s),
                    other => ParamValue::Value(other.to_string()),
                };
                (key, param)
            })
            .collect()
    })
}

fn script_args(
    name: *const c_char,
    method: FfiHttpMethod,
    headers_json: *const c_char,
    queries_json: *const c_char,
    body_json: *const c_char,
) -> ApiResult<(NcmbScript, ScriptParams)> {
    let name = opt_str(name)
        .ok_or_else(|| ApiError::InvalidArgument("script name is not UTF-8".to_string()))?;
    let params = ScriptParams {
        headers: param_map(headers_json, "headers")?,
        queries: param_map(queries_json, "queries")?,
        body: json_object_arg(body_json, "body")?,
    };
    Ok((NcmbScript::new(name, method.into()), params))
}

fn file_arg(file_name: *const c_char) -> ApiResult<NcmbFile> {
    opt_str(file_name)
        .map(NcmbFile::new)
        .ok_or_else(|| ApiError::InvalidArgument("file name is not UTF-8".to_string()))
}

/// Host context pointer carried to a background callback.
struct UserData(*mut c_void);

// The host promises `user_data` may be used from the callback thread.
unsafe impl Send for UserData {}

impl UserData {
    fn into_inner(self) -> *mut c_void {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `NcmbClient` that dispatches over the built-in transport.
///
/// `endpoint` and `api_version` may be null to keep the defaults.
/// Returns null if a key is null or if an internal panic occurs.
/// The caller must free the returned pointer with `ncmb_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_client_new(
    application_key: *const c_char,
    client_key: *const c_char,
    endpoint: *const c_char,
    api_version: *const c_char,
) -> *mut FfiNcmbClient {
    catch_unwind(|| {
        let (Some(application_key), Some(client_key)) =
            (opt_str(application_key), opt_str(client_key))
        else {
            return std::ptr::null_mut();
        };
        let mut config = NcmbConfig::new(application_key, client_key);
        if let Some(endpoint) = opt_str(endpoint) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(api_version) = opt_str(api_version) {
            config = config.with_api_version(api_version);
        }
        let client = NcmbClient::new(config);
        Box::into_raw(Box::new(FfiNcmbClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `ncmb_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_client_free(client: *mut FfiNcmbClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// ACL
// ---------------------------------------------------------------------------

/// Create an empty ACL. Free with `ncmb_acl_free`.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_new() -> *mut FfiAcl {
    catch_unwind(|| Box::into_raw(Box::new(FfiAcl { inner: Acl::empty() })))
        .unwrap_or(std::ptr::null_mut())
}

/// Create an ACL granting public read and write.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_new_default() -> *mut FfiAcl {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiAcl {
            inner: Acl::public_read_write(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Set both permissions for `key`. Returns false if an argument is null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_put(
    acl: *mut FfiAcl,
    key: *const c_char,
    readable: bool,
    writable: bool,
) -> bool {
    catch_unwind(|| {
        let Some(key) = opt_str(key) else {
            return false;
        };
        if acl.is_null() {
            return false;
        }
        let acl = unsafe { &mut *acl };
        acl.inner.put(key, readable, writable);
        true
    })
    .unwrap_or(false)
}

/// Tri-state lookup: -1 = unset (or null argument), 0 = false, 1 = true.
fn tri_state(value: Option<bool>) -> i32 {
    match value {
        None => -1,
        Some(false) => 0,
        Some(true) => 1,
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_get_readable(acl: *const FfiAcl, key: *const c_char) -> i32 {
    catch_unwind(|| {
        let Some(key) = opt_str(key) else {
            return -1;
        };
        if acl.is_null() {
            return -1;
        }
        tri_state(unsafe { &*acl }.inner.get_readable(key))
    })
    .unwrap_or(-1)
}

#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_get_writable(acl: *const FfiAcl, key: *const c_char) -> i32 {
    catch_unwind(|| {
        let Some(key) = opt_str(key) else {
            return -1;
        };
        if acl.is_null() {
            return -1;
        }
        tri_state(unsafe { &*acl }.inner.get_writable(key))
    })
    .unwrap_or(-1)
}

/// Serialize the ACL to the backend's JSON form.
///
/// Returns null if `acl` is null. Free with `ncmb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_to_json(acl: *const FfiAcl) -> *mut c_char {
    catch_unwind(|| {
        if acl.is_null() {
            return std::ptr::null_mut();
        }
        match serde_json::to_string(&unsafe { &*acl }.inner) {
            Ok(json) => into_c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free an ACL. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_acl_free(acl: *mut FfiAcl) {
    if !acl.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(acl) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build the download request for `file_name`.
///
/// Returns null if an argument is null or the request cannot be built.
/// The caller must free the returned pointer with `ncmb_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_build_fetch_file(
    client: *const FfiNcmbClient,
    file_name: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || file_name.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        file_arg(file_name)
            .and_then(|file| client.inner.build_fetch_file(&file))
            .and_then(FfiHttpRequest::from_core)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a script execution request.
///
/// `headers_json` and `queries_json` are JSON objects whose `null` values
/// send the key without a value; `body_json` is a JSON object sent for POST
/// and PUT only. Each may be null. Returns null on a null client or name,
/// or if any JSON argument is malformed.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_build_execute_script(
    client: *const FfiNcmbClient,
    name: *const c_char,
    method: FfiHttpMethod,
    headers_json: *const c_char,
    queries_json: *const c_char,
    body_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || name.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        script_args(name, method, headers_json, queries_json, body_json)
            .and_then(|(script, params)| client.inner.build_execute_script(&script, params))
            .and_then(FfiHttpRequest::from_core)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Executing functions
// ---------------------------------------------------------------------------

/// Upload `data` as `file_name`, blocking until the backend answers.
///
/// `mime_type` and `acl` may be null. On success `data` in the result holds
/// the backend's JSON response.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_save_file(
    client: *const FfiNcmbClient,
    file_name: *const c_char,
    mime_type: *const c_char,
    acl: *const FfiAcl,
    data: *const u8,
    data_len: usize,
) -> *mut FfiNcmbResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiNcmbResult::null_arg("client");
        }
        if file_name.is_null() {
            return FfiNcmbResult::null_arg("file_name");
        }
        if data.is_null() && data_len > 0 {
            return FfiNcmbResult::null_arg("data");
        }
        let client = unsafe { &*client };
        let mut file = match file_arg(file_name) {
            Ok(file) => file,
            Err(e) => return FfiNcmbResult::from_error(e),
        };
        if let Some(mime_type) = opt_str(mime_type) {
            file.set_mime_type(mime_type);
        }
        if !acl.is_null() {
            file.set_acl(unsafe { &*acl }.inner.clone());
        }
        let bytes = if data_len == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(data, data_len) }.to_vec()
        };
        FfiNcmbResult::from_bytes(client.inner.save_file(&file, bytes).wait().map(|r| r.body))
    })
    .unwrap_or_else(|_| FfiNcmbResult::panic("panic in ncmb_save_file"))
}

/// Download `file_name`, blocking until the contents arrive.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_fetch_file(
    client: *const FfiNcmbClient,
    file_name: *const c_char,
) -> *mut FfiNcmbResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiNcmbResult::null_arg("client");
        }
        if file_name.is_null() {
            return FfiNcmbResult::null_arg("file_name");
        }
        let client = unsafe { &*client };
        let result = file_arg(file_name).and_then(|file| client.inner.fetch_file(&file).wait());
        FfiNcmbResult::from_bytes(result)
    })
    .unwrap_or_else(|_| FfiNcmbResult::panic("panic in ncmb_fetch_file"))
}

/// Download `file_name` on a background thread and return immediately.
///
/// `callback` runs exactly once, on that thread, and owns the result it is
/// given. Null arguments are reported through the callback as well.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_fetch_file_in_background(
    client: *const FfiNcmbClient,
    file_name: *const c_char,
    callback: FfiResultCallback,
    user_data: *mut c_void,
) {
    let ctx = UserData(user_data);
    let outcome = catch_unwind(move || {
        if client.is_null() {
            return Err((FfiNcmbResult::null_arg("client"), ctx));
        }
        let client = unsafe { &*client };
        match file_arg(file_name) {
            Ok(file) => {
                client.inner.fetch_file(&file).in_background(move |result| {
                    callback(FfiNcmbResult::from_bytes(result), ctx.into_inner());
                });
                Ok(())
            }
            Err(e) => Err((FfiNcmbResult::from_error(e), ctx)),
        }
    });
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err((result, ctx))) => callback(result, ctx.into_inner()),
        Err(_) => callback(
            FfiNcmbResult::panic("panic in ncmb_fetch_file_in_background"),
            user_data,
        ),
    }
}

/// Run a script, blocking until it answers. `data` holds the script's raw
/// response and is null when the script returned nothing.
///
/// JSON arguments follow `ncmb_build_execute_script`.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_execute_script(
    client: *const FfiNcmbClient,
    name: *const c_char,
    method: FfiHttpMethod,
    headers_json: *const c_char,
    queries_json: *const c_char,
    body_json: *const c_char,
) -> *mut FfiNcmbResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiNcmbResult::null_arg("client");
        }
        if name.is_null() {
            return FfiNcmbResult::null_arg("name");
        }
        let client = unsafe { &*client };
        let result = script_args(name, method, headers_json, queries_json, body_json)
            .and_then(|(script, params)| client.inner.execute_script(&script, params).wait());
        FfiNcmbResult::from_optional_bytes(result)
    })
    .unwrap_or_else(|_| FfiNcmbResult::panic("panic in ncmb_execute_script"))
}

/// Background form of `ncmb_execute_script`; see
/// `ncmb_fetch_file_in_background` for the callback contract.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_execute_script_in_background(
    client: *const FfiNcmbClient,
    name: *const c_char,
    method: FfiHttpMethod,
    headers_json: *const c_char,
    queries_json: *const c_char,
    body_json: *const c_char,
    callback: FfiResultCallback,
    user_data: *mut c_void,
) {
    let ctx = UserData(user_data);
    let outcome = catch_unwind(move || {
        if client.is_null() {
            return Err((FfiNcmbResult::null_arg("client"), ctx));
        }
        if name.is_null() {
            return Err((FfiNcmbResult::null_arg("name"), ctx));
        }
        let client = unsafe { &*client };
        match script_args(name, method, headers_json, queries_json, body_json) {
            Ok((script, params)) => {
                client
                    .inner
                    .execute_script(&script, params)
                    .in_background(move |result| {
                        callback(FfiNcmbResult::from_optional_bytes(result), ctx.into_inner());
                    });
                Ok(())
            }
            Err(e) => Err((FfiNcmbResult::from_error(e), ctx)),
        }
    });
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err((result, ctx))) => callback(result, ctx.into_inner()),
        Err(_) => callback(
            FfiNcmbResult::panic("panic in ncmb_execute_script_in_background"),
            user_data,
        ),
    }
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `ncmb_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        unsafe { free_raw_bytes(req.body, req.body_len) };
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiNcmbResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_free_result(result: *mut FfiNcmbResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        unsafe { free_raw_bytes(result.data, result.data_len) };
    });
}

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn ncmb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}
