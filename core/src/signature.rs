//! `X-NCMB-Signature` request signing.
//!
//! # Design
//! The string to sign is four lines: method, host, encoded path, and a
//! parameter list. The parameter list holds the signature method and
//! version, the application key and timestamp, plus every query pair in the
//! same form-encoding the URL uses, all sorted by key and joined with `&`.
//! The signature is the base64 HMAC-SHA256 of that string keyed by the
//! client key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use url::form_urlencoded::byte_serialize;

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, APPLICATION_KEY_HEADER};

pub const SIGNATURE_HEADER: &str = "X-NCMB-Signature";
pub const TIMESTAMP_HEADER: &str = "X-NCMB-Timestamp";

const SIGNATURE_METHOD: &str = "HmacSHA256";
const SIGNATURE_VERSION: &str = "2";

type HmacSha256 = Hmac<Sha256>;

/// Timestamp and signature headers for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    pub timestamp: String,
    pub signature: String,
}

/// UTC timestamp with millisecond precision, e.g. `2013-12-02T02:44:35.452Z`.
pub fn timestamp(at: OffsetDateTime) -> ApiResult<String> {
    let format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");
    at.to_offset(UtcOffset::UTC)
        .format(&format)
        .map_err(|e| ApiError::Serialization(format!("timestamp: {e}")))
}

fn encode(raw: &str) -> String {
    byte_serialize(raw.as_bytes()).collect()
}

pub fn string_to_sign(request: &HttpRequest, timestamp: &str) -> ApiResult<String> {
    let url = request.url()?;
    let application_key = request
        .header(APPLICATION_KEY_HEADER)
        .flatten()
        .unwrap_or_default();

    let mut params: Vec<(String, String)> = vec![
        ("SignatureMethod".into(), format!("SignatureMethod={SIGNATURE_METHOD}")),
        ("SignatureVersion".into(), format!("SignatureVersion={SIGNATURE_VERSION}")),
        (
            APPLICATION_KEY_HEADER.into(),
            format!("{APPLICATION_KEY_HEADER}={application_key}"),
        ),
        (TIMESTAMP_HEADER.into(), format!("{TIMESTAMP_HEADER}={timestamp}")),
    ];
    for (key, value) in &request.query_items {
        let key = encode(key);
        let pair = match value {
            Some(value) => format!("{key}={}", encode(value)),
            None => key.clone(),
        };
        params.push((key, pair));
    }
    params.sort();

    let params: Vec<String> = params.into_iter().map(|(_, pair)| pair).collect();
    Ok(format!(
        "{}\n{}\n{}\n{}",
        request.method,
        url.host_str().unwrap_or_default(),
        url.path(),
        params.join("&")
    ))
}

/// Sign `request` as of `at` with `client_key`.
pub fn sign(request: &HttpRequest, client_key: &str, at: OffsetDateTime) -> ApiResult<Signed> {
    let timestamp = timestamp(at)?;
    let message = string_to_sign(request, &timestamp)?;
    let mut mac = HmacSha256::new_from_slice(client_key.as_bytes())
        .map_err(|e| ApiError::InvalidArgument(format!("client key: {e}")))?;
    mac.update(message.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    Ok(Signed {
        timestamp,
        signature,
    })
}
