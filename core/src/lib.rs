//! Client core for the NIFCLOUD mobile backend REST API.
//!
//! # Overview
//! Turns object, file and script operations into `HttpRequest` descriptors
//! and dispatches them through a swappable `Executor`. Every operation yields
//! a `Call<T>` that can be awaited, waited on, or run in the background with
//! a callback; all three go through the same future.
//!
//! # Design
//! - `NcmbClient` holds only its `NcmbConfig` and an `ExecutorFactory`; there
//!   is no process-global state.
//! - Each operation has a pure `build_*` method, so hosts that do their own
//!   IO can take the request and skip the executor entirely.
//! - With a client key configured, `build_*` signs each request with the
//!   `X-NCMB-Signature` / `X-NCMB-Timestamp` headers.
//! - Header and query inputs are tri-state (`ParamValue`): absent keys are
//!   dropped, null keys are sent bare.
//! - `MockExecutor` records dispatched requests and replays one canned result,
//!   which is how the crate's own tests observe traffic.
//! - The `ureq` feature (on by default) provides `UreqExecutor`, a blocking
//!   transport bridged onto a worker thread.

pub mod acl;
pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod fields;
pub mod file;
pub mod http;
pub mod object;
pub mod script;
pub mod signature;
#[cfg(feature = "ureq")]
pub mod transport;

pub use acl::{Acl, Permission};
pub use call::Call;
pub use client::NcmbClient;
pub use config::NcmbConfig;
pub use error::{ApiError, ApiResult};
pub use executor::{Executor, ExecutorFactory, MockExecutor};
pub use file::NcmbFile;
pub use http::{ApiType, HttpMethod, HttpRequest, HttpResponse, ParamValue, RequestBody};
pub use object::NcmbObject;
pub use script::{NcmbScript, ScriptParams};
#[cfg(feature = "ureq")]
pub use transport::UreqExecutor;
