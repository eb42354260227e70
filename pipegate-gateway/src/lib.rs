//! HTTP/JSON front end for the pipeline lifecycle RPC service.
//!
//! The gateway exposes the service's REST bindings under
//! `/v1alpha2/redpanda-connect/pipelines` and translates each request
//! into one unary RPC dispatch: route match, envelope binding (body,
//! path, query), execution through a local or remote strategy, response
//! projection, and status encoding. See `pipegate-core` for the
//! transport-agnostic pieces this crate assembles.

pub mod binder;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod routes;
pub mod server;

pub use config::{GatewayConfig, LogFormat};
pub use dispatch::{
    LocalExecutor, OperationExecutor, RemoteExecutor, RemoteInitError, RemoteOptions,
};
pub use gateway::{Gateway, GatewayInitError};
pub use routes::{pipeline_routes, Operation, Route};
pub use server::{serve, ServerError};
