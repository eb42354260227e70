//! RPC status taxonomy and gateway-side error types.
//!
//! `RpcStatus` carries the code + message pair that crosses the service
//! boundary unchanged in both directions: service implementations return
//! it, the remote strategy decodes it off the wire, and the gateway
//! translates it into an HTTP status plus a `StatusBody` JSON envelope.
//!
//! `GatewayError` covers the failures this layer itself can produce while
//! binding a request or serializing a response. Every variant maps onto an
//! `RpcStatus` before it reaches the client, so error responses have one
//! shape regardless of where the failure originated.

use serde::{Deserialize, Serialize};

/// Canonical RPC status codes, numbered identically to gRPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl RpcCode {
    /// Numeric wire value of the code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Decode a numeric code, folding anything out of range to `Unknown`.
    pub fn from_i32(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Cancelled,
            2 => Self::Unknown,
            3 => Self::InvalidArgument,
            4 => Self::DeadlineExceeded,
            5 => Self::NotFound,
            6 => Self::AlreadyExists,
            7 => Self::PermissionDenied,
            8 => Self::ResourceExhausted,
            9 => Self::FailedPrecondition,
            10 => Self::Aborted,
            11 => Self::OutOfRange,
            12 => Self::Unimplemented,
            13 => Self::Internal,
            14 => Self::Unavailable,
            15 => Self::DataLoss,
            16 => Self::Unauthenticated,
            _ => Self::Unknown,
        }
    }

    /// SCREAMING_SNAKE_CASE name of the code.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Cancelled => "CANCELLED",
            Self::Unknown => "UNKNOWN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::Aborted => "ABORTED",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Unimplemented => "UNIMPLEMENTED",
            Self::Internal => "INTERNAL",
            Self::Unavailable => "UNAVAILABLE",
            Self::DataLoss => "DATA_LOSS",
            Self::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Fixed code→status mapping used when writing HTTP responses.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Cancelled => 499,
            Self::InvalidArgument | Self::FailedPrecondition | Self::OutOfRange => 400,
            Self::Unauthenticated => 401,
            Self::PermissionDenied => 403,
            Self::NotFound => 404,
            Self::AlreadyExists | Self::Aborted => 409,
            Self::ResourceExhausted => 429,
            Self::Unimplemented => 501,
            Self::Unavailable => 503,
            Self::DeadlineExceeded => 504,
            Self::Unknown | Self::Internal | Self::DataLoss => 500,
        }
    }
}

/// An RPC-level error: code plus human-readable message, propagated
/// verbatim across the gateway boundary, never re-mapped.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} ({}): {message}", .code.name(), .code.as_i32())]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
    /// Optional structured detail payloads, forwarded untouched.
    pub details: Vec<serde_json::Value>,
}

impl RpcStatus {
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(RpcCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RpcCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Internal, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Cancelled, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(RpcCode::DeadlineExceeded, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }
}

/// Wire shape of an error response body.
///
/// Matches the conventional `{code, message, details}` status envelope so
/// clients of the remote and HTTP surfaces see identical errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBody {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

impl From<&RpcStatus> for StatusBody {
    fn from(status: &RpcStatus) -> Self {
        Self {
            code: status.code.as_i32(),
            message: status.message.clone(),
            details: status.details.clone(),
        }
    }
}

impl From<StatusBody> for RpcStatus {
    fn from(body: StatusBody) -> Self {
        Self {
            code: RpcCode::from_i32(body.code),
            message: body.message,
            details: body.details,
        }
    }
}

/// Failures produced by the gateway itself while translating a request or
/// response. Dispatch errors pass through as `Rpc` and keep their code.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A named path capture declared by the route was absent from the
    /// matched parameters. Indicates a pattern/route bug, surfaced as
    /// invalid-argument rather than silently defaulted.
    #[error("missing parameter {name}")]
    MissingParameter { name: String },

    /// A path or query value could not convert to the target field type.
    #[error("type mismatch, parameter: {name}, error: {reason}")]
    TypeMismatch { name: String, reason: String },

    /// The request body was present but not parseable as the expected
    /// structure. A legitimately empty body is not an error.
    #[error("malformed request body: {reason}")]
    MalformedBody { reason: String },

    /// The request body exceeded the configured size limit.
    #[error("request body exceeds maximum size of {max_bytes} bytes")]
    BodyTooLarge { max_bytes: usize },

    /// The dispatched result could not be encoded for the negotiated
    /// content type. The operation itself succeeded.
    #[error("failed to encode response: {reason}")]
    Serialization { reason: String },

    /// The underlying operation failed; code and message propagate
    /// unchanged.
    #[error(transparent)]
    Rpc(#[from] RpcStatus),
}

impl GatewayError {
    /// Collapse into the status that will be written to the client.
    pub fn to_status(&self) -> RpcStatus {
        match self {
            Self::MissingParameter { .. }
            | Self::TypeMismatch { .. }
            | Self::MalformedBody { .. } => RpcStatus::invalid_argument(self.to_string()),
            Self::BodyTooLarge { .. } => {
                RpcStatus::new(RpcCode::ResourceExhausted, self.to_string())
            }
            Self::Serialization { .. } => RpcStatus::internal(self.to_string()),
            Self::Rpc(status) => status.clone(),
        }
    }
}
