//! Body codecs and content-type negotiation.
//!
//! The gateway decodes request bodies into a JSON tree and encodes
//! response trees back to bytes through a [`Codec`]. A [`CodecRegistry`]
//! picks the codec from the request's `Content-Type`, falling back to JSON
//! when the type is absent or unregistered.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::GatewayError;

pub trait Codec: Send + Sync {
    /// MIME type this codec registers under and emits in responses.
    fn content_type(&self) -> &'static str;

    /// Decode a request body. Decode failures are malformed-body errors,
    /// never type mismatches.
    fn decode(&self, bytes: &[u8]) -> Result<Value, GatewayError>;

    /// Encode a response tree.
    fn encode(&self, value: &Value) -> Result<Bytes, GatewayError>;
}

/// The default codec. Bodies are JSON objects; responses are compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, GatewayError> {
        serde_json::from_slice(bytes).map_err(|e| GatewayError::MalformedBody {
            reason: e.to_string(),
        })
    }

    fn encode(&self, value: &Value) -> Result<Bytes, GatewayError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| GatewayError::Serialization {
                reason: e.to_string(),
            })
    }
}

/// Registered codecs keyed by MIME type, with a fallback used when the
/// request names no type or an unknown one.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
    fallback: Arc<dyn Codec>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let json: Arc<dyn Codec> = Arc::new(JsonCodec);
        Self {
            codecs: vec![json.clone()],
            fallback: json,
        }
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an additional codec. The first registration for a MIME
    /// type wins.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        if !self
            .codecs
            .iter()
            .any(|c| c.content_type() == codec.content_type())
        {
            self.codecs.push(codec);
        }
    }

    /// Select the codec for a request `Content-Type` value. Parameters
    /// such as `; charset=utf-8` are ignored.
    pub fn for_content_type(&self, content_type: Option<&str>) -> &dyn Codec {
        let Some(raw) = content_type else {
            return self.fallback.as_ref();
        };
        let mime = raw.split(';').next().unwrap_or(raw).trim();
        self.codecs
            .iter()
            .find(|c| c.content_type().eq_ignore_ascii_case(mime))
            .map(Arc::as_ref)
            .unwrap_or(self.fallback.as_ref())
    }
}
