//! Per-call context handed to executors and local service implementations.
//!
//! A [`CallContext`] is created by the router once a route has matched. It
//! carries the RPC method path and matched HTTP pattern for annotation,
//! the inbound metadata derived from request headers, a cancellation token
//! tied to the client connection, and the sink the call writes outbound
//! metadata into.

use tokio_util::sync::CancellationToken;

use crate::metadata::{CallMetadata, MetadataSink};

#[derive(Debug, Clone)]
pub struct CallContext {
    rpc_method: &'static str,
    http_pattern: String,
    cancel: CancellationToken,
    inbound: Vec<(String, String)>,
    sink: MetadataSink,
}

impl CallContext {
    pub fn new(rpc_method: &'static str, http_pattern: impl Into<String>) -> Self {
        Self {
            rpc_method,
            http_pattern: http_pattern.into(),
            cancel: CancellationToken::new(),
            inbound: Vec::new(),
            sink: MetadataSink::new(),
        }
    }

    /// Tie this call's lifetime to an existing token. Cancelling the token
    /// aborts the call.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attach inbound metadata pairs derived from the HTTP request.
    pub fn with_inbound(mut self, inbound: Vec<(String, String)>) -> Self {
        self.inbound = inbound;
        self
    }

    /// Full RPC method path, e.g.
    /// `/redpanda.api.dataplane.v1alpha2.PipelineService/GetPipeline`.
    pub fn rpc_method(&self) -> &'static str {
        self.rpc_method
    }

    /// The HTTP path template that matched this request.
    pub fn http_pattern(&self) -> &str {
        &self.http_pattern
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn inbound(&self) -> &[(String, String)] {
        &self.inbound
    }

    /// First inbound value for a key, compared case-insensitively.
    pub fn inbound_value(&self, key: &str) -> Option<&str> {
        self.inbound
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Sink for metadata the call sends back toward the client.
    pub fn metadata_sink(&self) -> &MetadataSink {
        &self.sink
    }

    /// Collect everything the call has sent so far.
    pub fn take_metadata(&self) -> CallMetadata {
        self.sink.drain()
    }
}
