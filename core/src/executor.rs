//! Executor abstraction and the swappable holder clients dispatch through.
//!
//! # Design
//! An `Executor` turns an `HttpRequest` into a future of `HttpResponse`. It
//! knows nothing about operations or status codes; interpreting the response
//! is the `Call` bridge's job.
//!
//! `ExecutorFactory` is an explicit object owned by clients rather than a
//! process global. Swapping its instance affects calls started afterwards.
//! Calls already in flight keep the executor they resolved; swapping while
//! other threads are starting calls is the caller's responsibility to order.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpRequest, HttpResponse};

/// Performs the network round-trip for a request.
pub trait Executor: Send + Sync {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, ApiResult<HttpResponse>>;
}

/// Holder of the one executor a client dispatches through.
pub struct ExecutorFactory {
    instance: RwLock<Arc<dyn Executor>>,
}

impl ExecutorFactory {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            instance: RwLock::new(executor),
        }
    }

    /// Replace the executor used by subsequent calls.
    pub fn set_instance(&self, executor: Arc<dyn Executor>) {
        *self
            .instance
            .write()
            .unwrap_or_else(PoisonError::into_inner) = executor;
    }

    pub fn instance(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.instance.read().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(feature = "ureq")]
impl Default for ExecutorFactory {
    fn default() -> Self {
        Self::new(Arc::new(crate::transport::UreqExecutor::new()))
    }
}

impl std::fmt::Debug for ExecutorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorFactory").finish_non_exhaustive()
    }
}

/// Test double that records every request and replays one canned result.
///
/// The result does not depend on the request; tests inspect `requests()`
/// to check what was dispatched.
#[derive(Debug)]
pub struct MockExecutor {
    result: ApiResult<HttpResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockExecutor {
    pub fn new(result: ApiResult<HttpResponse>) -> Self {
        Self {
            result,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `status` and `body`.
    pub fn respond(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Ok(HttpResponse::new(status, body)))
    }

    /// Fail every request with `error`.
    pub fn fail(error: ApiError) -> Self {
        Self::new(Err(error))
    }

    /// Snapshot of the dispatched requests, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Executor for MockExecutor {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, ApiResult<HttpResponse>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        future::ready(self.result.clone()).boxed()
    }
}
