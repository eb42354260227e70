//! Dispatch strategies: where a bound request actually runs.
//!
//! The router talks to an [`OperationExecutor`] and never learns whether
//! the backend is in-process or remote. [`LocalExecutor`] deserializes the
//! envelope into typed requests and calls a [`PipelineService`] directly;
//! [`RemoteExecutor`] forwards the envelope as a JSON unary POST to the
//! backend's RPC method path over a pooled client. Both honor the call
//! context's cancellation token and surface backend errors verbatim.

use std::time::Duration;

use async_trait::async_trait;
use pipegate_core::{CallContext, PipelineService, RpcStatus, StatusBody};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::routes::Operation;

#[async_trait]
pub trait OperationExecutor: Send + Sync {
    /// Run one unary operation. Response metadata is reported through the
    /// context's sink so it survives error outcomes.
    async fn execute(
        &self,
        ctx: &CallContext,
        operation: Operation,
        envelope: Value,
    ) -> Result<Value, RpcStatus>;
}

fn decode<T: DeserializeOwned>(envelope: Value) -> Result<T, RpcStatus> {
    serde_json::from_value(envelope).map_err(|e| RpcStatus::invalid_argument(e.to_string()))
}

fn encode<T: Serialize>(response: T) -> Result<Value, RpcStatus> {
    serde_json::to_value(response).map_err(|e| RpcStatus::internal(e.to_string()))
}

/// Runs operations against an in-process service implementation.
pub struct LocalExecutor {
    service: Arc<dyn PipelineService>,
}

impl LocalExecutor {
    pub fn new(service: Arc<dyn PipelineService>) -> Self {
        Self { service }
    }

    async fn call(
        &self,
        ctx: &CallContext,
        operation: Operation,
        envelope: Value,
    ) -> Result<Value, RpcStatus> {
        match operation {
            Operation::CreatePipeline => {
                encode(self.service.create_pipeline(ctx, decode(envelope)?).await?)
            }
            Operation::GetPipeline => {
                encode(self.service.get_pipeline(ctx, decode(envelope)?).await?)
            }
            Operation::ListPipelines => {
                encode(self.service.list_pipelines(ctx, decode(envelope)?).await?)
            }
            Operation::UpdatePipeline => {
                encode(self.service.update_pipeline(ctx, decode(envelope)?).await?)
            }
            Operation::DeletePipeline => {
                encode(self.service.delete_pipeline(ctx, decode(envelope)?).await?)
            }
            Operation::StartPipeline => {
                encode(self.service.start_pipeline(ctx, decode(envelope)?).await?)
            }
            Operation::StopPipeline => {
                encode(self.service.stop_pipeline(ctx, decode(envelope)?).await?)
            }
        }
    }
}

#[async_trait]
impl OperationExecutor for LocalExecutor {
    async fn execute(
        &self,
        ctx: &CallContext,
        operation: Operation,
        envelope: Value,
    ) -> Result<Value, RpcStatus> {
        tokio::select! {
            _ = ctx.cancellation().cancelled() => {
                Err(RpcStatus::cancelled("call cancelled by client"))
            }
            out = self.call(ctx, operation, envelope) => out,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteInitError {
    #[error("upstream endpoint must use http or https, got {scheme:?}")]
    UnsupportedScheme { scheme: String },

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection pool and timeout settings for the remote strategy.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub call_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            pool_max_idle_per_host: 32,
        }
    }
}

/// Forwards operations to a remote backend as JSON unary POSTs against
/// `<endpoint><rpc method path>`.
pub struct RemoteExecutor {
    client: reqwest::Client,
    endpoint: Url,
}

/// Upstream response headers that are transport plumbing, not call
/// metadata.
const TRANSPORT_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "transfer-encoding",
    "connection",
    "date",
    "server",
];

impl RemoteExecutor {
    pub fn new(endpoint: Url, options: RemoteOptions) -> Result<Self, RemoteInitError> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RemoteInitError::UnsupportedScheme {
                scheme: endpoint.scheme().to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(options.call_timeout)
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()?;
        Ok(Self { client, endpoint })
    }

    fn method_url(&self, operation: Operation) -> String {
        format!(
            "{}{}",
            self.endpoint.as_str().trim_end_matches('/'),
            operation.rpc_method()
        )
    }

    async fn forward(
        &self,
        ctx: &CallContext,
        operation: Operation,
        envelope: Value,
    ) -> Result<Value, RpcStatus> {
        let mut request = self.client.post(self.method_url(operation)).json(&envelope);
        for (key, value) in ctx.inbound() {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();

        // Capture metadata before the outcome is decided so it reaches the
        // client on errors too. Headers named `trailer-*` are trailers.
        let sink = ctx.metadata_sink();
        for (name, value) in response.headers() {
            let name = name.as_str();
            if TRANSPORT_HEADERS.contains(&name) {
                continue;
            }
            let Ok(value) = value.to_str() else { continue };
            match name.strip_prefix("trailer-") {
                Some(key) => sink.send_trailer(key, value),
                None => sink.send_header(name, value),
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(classify_transport_error)?;

        if status.is_success() {
            serde_json::from_slice(&body).map_err(|e| {
                RpcStatus::internal(format!("invalid upstream response body: {e}"))
            })
        } else {
            Err(match serde_json::from_slice::<StatusBody>(&body) {
                Ok(status_body) => status_body.into(),
                Err(_) => RpcStatus::new(
                    pipegate_core::RpcCode::Unknown,
                    format!("upstream returned HTTP {status}"),
                ),
            })
        }
    }
}

fn classify_transport_error(err: reqwest::Error) -> RpcStatus {
    if err.is_timeout() {
        RpcStatus::deadline_exceeded("upstream call timed out")
    } else if err.is_connect() {
        RpcStatus::unavailable(format!("upstream unreachable: {err}"))
    } else {
        RpcStatus::unavailable(err.to_string())
    }
}

#[async_trait]
impl OperationExecutor for RemoteExecutor {
    async fn execute(
        &self,
        ctx: &CallContext,
        operation: Operation,
        envelope: Value,
    ) -> Result<Value, RpcStatus> {
        tokio::select! {
            _ = ctx.cancellation().cancelled() => {
                Err(RpcStatus::cancelled("call cancelled by client"))
            }
            out = self.forward(ctx, operation, envelope) => out,
        }
    }
}
