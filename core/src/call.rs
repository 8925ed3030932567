//! Bridge from an executor future to blocking, awaiting and callback callers.
//!
//! # Design
//! Every operation returns a `Call<T>`. There is a single execution path,
//! `IntoFuture`; `wait()` blocks on that future and `in_background()` drives
//! it on a spawned thread before handing the result to the callback. One
//! call dispatches at most one request, with no retries.
//!
//! The executor is resolved from the factory when the call is started, not
//! when the `Call` is built. The URL is rendered before dispatch so encoding
//! errors surface without reaching the executor.

use std::future::IntoFuture;
use std::sync::Arc;
use std::thread;

use futures::executor::block_on;
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::executor::ExecutorFactory;
use crate::http::{HttpRequest, HttpResponse};

/// Turns a successful response into the operation's result type.
pub(crate) type Decode<T> = fn(HttpResponse) -> ApiResult<T>;

/// A pending operation: one request, one dispatch.
#[must_use = "a Call does nothing until it is awaited, waited on or sent to the background"]
pub struct Call<T> {
    request: ApiResult<HttpRequest>,
    factory: Arc<ExecutorFactory>,
    decode: Decode<T>,
}

impl<T> Call<T> {
    pub(crate) fn new(
        request: ApiResult<HttpRequest>,
        factory: Arc<ExecutorFactory>,
        decode: Decode<T>,
    ) -> Self {
        Self {
            request,
            factory,
            decode,
        }
    }

    /// The request this call will dispatch, if it could be built.
    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref().ok()
    }
}

impl<T: Send + 'static> Call<T> {
    /// Block the current thread until the call completes.
    pub fn wait(self) -> ApiResult<T> {
        block_on(self.into_future())
    }

    /// Run the call on a background thread and return immediately.
    ///
    /// `callback` runs exactly once, on that thread, after the executor has
    /// finished.
    pub fn in_background<F>(self, callback: F)
    where
        F: FnOnce(ApiResult<T>) + Send + 'static,
    {
        let future = self.into_future();
        thread::spawn(move || callback(block_on(future)));
    }
}

impl<T: Send + 'static> IntoFuture for Call<T> {
    type Output = ApiResult<T>;
    type IntoFuture = BoxFuture<'static, ApiResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        let Call {
            request,
            factory,
            decode,
        } = self;
        let executor = factory.instance();
        async move {
            let request = request?;
            let method = request.method;
            let url = request.url()?;
            debug!(%method, %url, "dispatching request");

            let response = executor.execute(request).await?;
            debug!(%method, %url, status = response.status, "request completed");

            if !response.is_success() {
                let error = ApiError::from_response(&response);
                warn!(%method, %url, %error, "backend rejected request");
                return Err(error);
            }
            decode(response)
        }
        .boxed()
    }
}

impl<T> std::fmt::Debug for Call<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Call")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

pub(crate) fn decode_response(response: HttpResponse) -> ApiResult<HttpResponse> {
    Ok(response)
}

pub(crate) fn decode_body(response: HttpResponse) -> ApiResult<Vec<u8>> {
    Ok(response.body)
}

pub(crate) fn decode_optional_body(response: HttpResponse) -> ApiResult<Option<Vec<u8>>> {
    if response.body.is_empty() {
        Ok(None)
    } else {
        Ok(Some(response.body))
    }
}

pub(crate) fn decode_unit(_response: HttpResponse) -> ApiResult<()> {
    Ok(())
}
