//! Transport-agnostic gateway building blocks.
//!
//! This library provides the pieces the HTTP gateway (`pipegate-gateway`)
//! assembles per request: compiled path patterns, field schemas and value
//! conversion, content-type negotiated codecs, call metadata capture, the
//! cancellable call context, the RPC status/error taxonomy, the pipeline
//! data model, and the `PipelineService` trait that local (in-process)
//! service implementations provide.

pub mod codec;
pub mod context;
pub mod error;
pub mod fields;
pub mod metadata;
pub mod model;
pub mod pattern;
pub mod service;

pub use codec::{Codec, CodecRegistry, JsonCodec};
pub use context::CallContext;
pub use error::{GatewayError, RpcCode, RpcStatus, StatusBody};
pub use fields::{FieldKind, FieldSpec, MessageSchema, QueryFilter};
pub use metadata::{CallMetadata, MetadataSink};
pub use pattern::{Pattern, PatternError};
pub use service::PipelineService;
