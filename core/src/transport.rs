//! Blocking `ureq` transport.
//!
//! Each request runs on its own worker thread and reports back through a
//! oneshot channel, so the returned future needs no particular async runtime.
//! 4xx/5xx answers are returned as data; turning them into errors is left to
//! the `Call` bridge.

use std::thread;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::executor::Executor;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

#[derive(Debug, Clone)]
pub struct UreqExecutor {
    agent: ureq::Agent,
}

impl Default for UreqExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqExecutor {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Executor for UreqExecutor {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, ApiResult<HttpResponse>> {
        let agent = self.agent.clone();
        let (tx, rx) = oneshot::channel();
        thread::spawn(move || {
            // The receiver may be gone if the caller dropped the future.
            let _ = tx.send(send(&agent, &request));
        });
        async move { rx.await.unwrap_or(Err(ApiError::Canceled)) }.boxed()
    }
}

fn send(agent: &ureq::Agent, request: &HttpRequest) -> ApiResult<HttpResponse> {
    let url = request.url()?;
    let body = request.body_bytes()?;
    debug!(method = %request.method, %url, "ureq send");

    let result = match request.method {
        HttpMethod::Get => with_headers(agent.get(url.as_str()), request).call(),
        HttpMethod::Delete => with_headers(agent.delete(url.as_str()), request).call(),
        HttpMethod::Post => {
            let builder = with_headers(agent.post(url.as_str()), request);
            match body {
                Some(body) => builder.send(&body[..]),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = with_headers(agent.put(url.as_str()), request);
            match body {
                Some(body) => builder.send(&body[..]),
                None => builder.send_empty(),
            }
        }
    };

    let mut response = result.map_err(ApiError::transport)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(ApiError::transport)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// Copy headers and the timeout hint onto a ureq request. Null headers are
/// sent with an empty value.
fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &request.header_items {
        builder = builder.header(name.as_str(), value.as_deref().unwrap_or(""));
    }
    builder
        .config()
        .timeout_global(Some(request.timeout))
        .build()
}
