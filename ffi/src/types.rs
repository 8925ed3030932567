//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer plus length instead of
//! `Vec<u8>`, and enums with explicit discriminants. Conversions live here
//! so `lib.rs` stays focused on the `extern "C"` surface.
//!
//! Strings containing an interior NUL cannot cross as C strings; they are
//! handed over as null pointers rather than truncated.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use ncmb_core::{Acl, ApiError, ApiResult, HttpMethod, HttpRequest, NcmbClient};

/// Opaque handle to an `NcmbClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiNcmbClient {
    pub(crate) inner: NcmbClient,
}

/// Opaque handle to an `Acl`.
pub struct FfiAcl {
    pub(crate) inner: Acl,
}

pub(crate) fn into_c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Leak `bytes` as a pointer/length pair. Empty input yields null.
pub(crate) fn into_raw_bytes(bytes: Vec<u8>) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = bytes.len();
    (Box::into_raw(bytes.into_boxed_slice()) as *mut u8, len)
}

/// Reclaim a pair produced by `into_raw_bytes`.
///
/// # Safety
/// `data` must come from `into_raw_bytes` with the same `len`, and must not
/// have been freed already.
pub(crate) unsafe fn free_raw_bytes(data: *mut u8, len: usize) {
    if !data.is_null() && len > 0 {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(data, len)) });
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

impl From<FfiHttpMethod> for HttpMethod {
    fn from(m: FfiHttpMethod) -> Self {
        match m {
            FfiHttpMethod::Get => HttpMethod::Get,
            FfiHttpMethod::Post => HttpMethod::Post,
            FfiHttpMethod::Put => HttpMethod::Put,
            FfiHttpMethod::Delete => HttpMethod::Delete,
        }
    }
}

/// A single HTTP header. `value` is null for a header sent without a value.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `ncmb_build_*` functions for hosts that perform the network
/// round-trip themselves. `body` is null for a bodiless request.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> ApiResult<*mut Self> {
        let url = req.url()?;
        let (body, body_len) = into_raw_bytes(req.body_bytes()?.unwrap_or_default());

        let headers_len = req.header_items.len() as u32;
        let headers = if req.header_items.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .header_items
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c_string(k),
                    value: v.map(into_c_string).unwrap_or(std::ptr::null_mut()),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Ok(Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: into_c_string(url.as_str()),
            headers,
            headers_len,
            body,
            body_len,
            timeout_ms: req.timeout.as_millis() as u64,
        })))
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiNcmbResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidArgument = 1,
    InvalidUrl = 2,
    MissingConfig = 3,
    Serialization = 4,
    Transport = 5,
    Canceled = 6,
    Service = 7,
    Panic = 8,
    NullArg = 9,
}

/// Called once with the result of a background operation. The callee owns
/// `result` and must release it with `ncmb_free_result`.
pub type FfiResultCallback = extern "C" fn(result: *mut FfiNcmbResult, user_data: *mut c_void);

/// Result envelope for every executing operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data` /
/// `data_len` hold the payload (null / 0 when there is none). On failure
/// `error_code` describes the category, `error_message` is a human-readable
/// C string, `http_status` is set for backend errors, and `data` is null.
#[repr(C)]
pub struct FfiNcmbResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut u8,
    pub data_len: usize,
}

impl FfiNcmbResult {
    pub(crate) fn from_bytes(result: ApiResult<Vec<u8>>) -> *mut Self {
        match result {
            Ok(bytes) => Self::ok(bytes),
            Err(e) => Self::from_error(e),
        }
    }

    pub(crate) fn from_optional_bytes(result: ApiResult<Option<Vec<u8>>>) -> *mut Self {
        Self::from_bytes(result.map(Option::unwrap_or_default))
    }

    pub(crate) fn ok(bytes: Vec<u8>) -> *mut Self {
        let (data, data_len) = into_raw_bytes(bytes);
        Box::into_raw(Box::new(FfiNcmbResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data,
            data_len,
        }))
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let (error_code, http_status) = match &err {
            ApiError::InvalidArgument(_) => (FfiErrorCode::InvalidArgument, 0),
            ApiError::InvalidUrl(_) => (FfiErrorCode::InvalidUrl, 0),
            ApiError::MissingConfig(_) => (FfiErrorCode::MissingConfig, 0),
            ApiError::Serialization(_) => (FfiErrorCode::Serialization, 0),
            ApiError::Transport(_) => (FfiErrorCode::Transport, 0),
            ApiError::Canceled => (FfiErrorCode::Canceled, 0),
            ApiError::Service { status, .. } => (FfiErrorCode::Service, *status),
        };
        Self::error(error_code, http_status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiNcmbResult {
            error_code,
            error_message: into_c_string(msg),
            http_status,
            data: std::ptr::null_mut(),
            data_len: 0,
        }))
    }
}
