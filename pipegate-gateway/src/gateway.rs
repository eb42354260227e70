//! The gateway router: HTTP in, RPC out, HTTP back.
//!
//! Per request the router matches the route table, binds the envelope,
//! dispatches through the configured executor, projects the response, and
//! encodes either the result or a status body. Backend metadata headers
//! are echoed to the client as `Grpc-Metadata-*` on success and error
//! alike, and every call gets a cancellation token that trips when the
//! client goes away.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use pipegate_core::{
    CallContext, CallMetadata, Codec, CodecRegistry, GatewayError, PatternError, PipelineService,
    RpcStatus, StatusBody,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::dispatch::{
    LocalExecutor, OperationExecutor, RemoteExecutor, RemoteInitError, RemoteOptions,
};
use crate::routes::{pipeline_routes, Route};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Request headers promoted to inbound call metadata under a
/// `grpcgateway-` prefix.
const PERMANENT_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "x-forwarded-for",
    "x-forwarded-host",
];

#[derive(Debug, thiserror::Error)]
pub enum GatewayInitError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Remote(#[from] RemoteInitError),
}

pub struct Gateway {
    routes: Vec<Route>,
    executor: Arc<dyn OperationExecutor>,
    codecs: CodecRegistry,
    call_timeout: Duration,
    max_body_bytes: usize,
}

impl Gateway {
    /// Build a gateway over an arbitrary executor.
    pub fn new(executor: Arc<dyn OperationExecutor>) -> Result<Self, GatewayInitError> {
        Ok(Self {
            routes: pipeline_routes()?,
            executor,
            codecs: CodecRegistry::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Gateway over an in-process service implementation.
    pub fn local(service: Arc<dyn PipelineService>) -> Result<Self, GatewayInitError> {
        Self::new(Arc::new(LocalExecutor::new(service)))
    }

    /// Gateway forwarding to a remote backend endpoint.
    pub fn remote(endpoint: Url, options: RemoteOptions) -> Result<Self, GatewayInitError> {
        let executor = RemoteExecutor::new(endpoint, options)?;
        Self::new(Arc::new(executor))
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Translate one request. Never fails: every failure becomes a status
    /// response.
    pub async fn handle<B>(
        &self,
        req: Request<B>,
        cancel: CancellationToken,
    ) -> Response<Full<Bytes>>
    where
        B: http_body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let started = std::time::Instant::now();

        let codec = self.codecs.for_content_type(
            req.headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        // Outbound codec follows Accept when it names a registered type,
        // otherwise it mirrors the inbound one.
        let out_codec = match req.headers().get(ACCEPT).and_then(|v| v.to_str().ok()) {
            Some(accept) if accept != "*/*" => self.codecs.for_content_type(Some(accept)),
            _ => codec,
        };

        let Some((route, path_params)) = self.routes.iter().find_map(|route| {
            if route.method == method {
                route.pattern.matches(&path).map(|params| (route, params))
            } else {
                None
            }
        }) else {
            tracing::debug!(%method, path, "no route matched");
            return status_response(
                &RpcStatus::not_found(format!("no route for {method} {path}")),
                out_codec,
                &CallMetadata::new(),
            );
        };

        // Child token per call: trips on server shutdown, and via the drop
        // guard when the connection (and this future) goes away mid-call.
        let call_token = cancel.child_token();
        let _guard = call_token.clone().drop_guard();

        let ctx = CallContext::new(route.operation.rpc_method(), route.pattern.template())
            .with_cancellation(call_token)
            .with_inbound(inbound_metadata(req.headers()));

        let query = req.uri().query().map(str::to_string);
        let outcome = self
            .run(route, codec, req.into_body(), &path_params, query.as_deref(), &ctx)
            .await;
        let metadata = ctx.take_metadata();

        let response = match outcome {
            Ok(message) => match out_codec.encode(&message) {
                Ok(bytes) => {
                    let mut response = Response::new(Full::new(bytes));
                    response.headers_mut().insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static(out_codec.content_type()),
                    );
                    echo_metadata(response.headers_mut(), &metadata);
                    response
                }
                Err(err) => status_response(&err.to_status(), out_codec, &metadata),
            },
            Err(status) => status_response(&status, out_codec, &metadata),
        };

        if response.status().is_server_error() {
            tracing::warn!(
                %method,
                path,
                operation = route.operation.name(),
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request failed",
            );
        } else {
            tracing::info!(
                %method,
                path,
                operation = route.operation.name(),
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request",
            );
        }
        response
    }

    async fn run<B>(
        &self,
        route: &Route,
        codec: &dyn Codec,
        body: B,
        path_params: &std::collections::HashMap<String, String>,
        query: Option<&str>,
        ctx: &CallContext,
    ) -> Result<Value, RpcStatus>
    where
        B: http_body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let body = self.collect_body(body).await.map_err(|e| e.to_status())?;

        let envelope = crate::binder::bind(route, codec, &body, path_params, query)
            .map_err(|e| e.to_status())?;

        let message = tokio::time::timeout(
            self.call_timeout,
            self.executor.execute(ctx, route.operation, envelope),
        )
        .await
        .map_err(|_| RpcStatus::deadline_exceeded("call deadline exceeded"))??;

        Ok(project(message, route.projection))
    }

    async fn collect_body<B>(&self, body: B) -> Result<Bytes, GatewayError>
    where
        B: http_body::Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => Ok(collected.to_bytes()),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                Err(GatewayError::BodyTooLarge {
                    max_bytes: self.max_body_bytes,
                })
            }
            Err(err) => Err(GatewayError::MalformedBody {
                reason: format!("failed to read request body: {err}"),
            }),
        }
    }
}

/// Unwrap the configured response field. A missing field projects to
/// `null`; messages that are not objects pass through unchanged.
fn project(message: Value, field: Option<&str>) -> Value {
    match (message, field) {
        (message, None) => message,
        (Value::Object(mut fields), Some(name)) => fields.remove(name).unwrap_or(Value::Null),
        (message, Some(_)) => message,
    }
}

/// Map request headers to inbound call metadata: `Grpc-Metadata-*` headers
/// keep their stripped key, a fixed set of standard headers is forwarded
/// under `grpcgateway-`.
fn inbound_metadata(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (name, value) in headers {
        let name = name.as_str();
        let Ok(value) = value.to_str() else { continue };
        if let Some(key) = name.strip_prefix("grpc-metadata-") {
            if !key.is_empty() {
                out.push((key.to_string(), value.to_string()));
            }
        } else if PERMANENT_HEADERS.contains(&name) {
            out.push((format!("grpcgateway-{name}"), value.to_string()));
        }
    }
    out
}

/// Echo backend metadata headers to the client.
fn echo_metadata(headers: &mut HeaderMap, metadata: &CallMetadata) {
    for (key, value) in metadata.headers() {
        let Ok(name) = HeaderName::try_from(format!("grpc-metadata-{key}")) else {
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            continue;
        };
        headers.append(name, value);
    }
}

/// Encode a status as an HTTP error response, metadata included.
fn status_response(
    status: &RpcStatus,
    codec: &dyn Codec,
    metadata: &CallMetadata,
) -> Response<Full<Bytes>> {
    let body = StatusBody::from(status);
    let bytes = serde_json::to_value(&body)
        .ok()
        .and_then(|v| codec.encode(&v).ok())
        .unwrap_or_else(|| Bytes::from_static(b"{\"code\":13,\"message\":\"internal\"}"));

    let mut response = Response::new(Full::new(bytes));
    *response.status_mut() = StatusCode::from_u16(status.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(codec.content_type()));
    echo_metadata(response.headers_mut(), metadata);
    response
}
