//! Call metadata: header and trailer key/value pairs produced by the
//! backing service during a call.
//!
//! Remote executors collect metadata from the upstream response; local
//! executors hand the service a [`MetadataSink`] it can write header and
//! trailer pairs into while the call runs. Either way the gateway ends up
//! holding one [`CallMetadata`] per request, and echoes the header half
//! back to the HTTP client.

use std::sync::{Arc, Mutex};

/// Metadata accumulated over one call. Repeated sends for the same key
/// append; nothing is deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    headers: Vec<(String, String)>,
    trailers: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.push((key.into(), value.into()));
    }

    pub fn push_trailer(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.trailers.push((key.into(), value.into()));
    }

    /// Merge another set into this one, appending pair-wise.
    pub fn merge(&mut self, other: CallMetadata) {
        self.headers.extend(other.headers);
        self.trailers.extend(other.trailers);
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn trailers(&self) -> &[(String, String)] {
        &self.trailers
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.trailers.is_empty()
    }
}

/// Shared write handle a local service uses to attach metadata to the
/// in-flight call. Cloning shares the same underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct MetadataSink {
    inner: Arc<Mutex<CallMetadata>>,
}

impl MetadataSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a header pair. Headers are echoed to the HTTP client even
    /// when the call ends in an error.
    pub fn send_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_header(key, value);
    }

    /// Record a trailer pair.
    pub fn send_trailer(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_trailer(key, value);
    }

    /// Take everything recorded so far, leaving the sink empty.
    pub fn drain(&self) -> CallMetadata {
        std::mem::take(
            &mut *self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_accumulates_and_drains() {
        let sink = MetadataSink::new();
        sink.send_header("x-request-id", "abc");
        sink.send_header("x-request-id", "def");
        sink.send_trailer("x-cost", "3");

        let meta = sink.drain();
        assert_eq!(
            meta.headers(),
            &[
                ("x-request-id".to_string(), "abc".to_string()),
                ("x-request-id".to_string(), "def".to_string()),
            ]
        );
        assert_eq!(meta.trailers(), &[("x-cost".to_string(), "3".to_string())]);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn clones_share_the_buffer() {
        let sink = MetadataSink::new();
        let other = sink.clone();
        other.send_header("k", "v");
        assert_eq!(sink.drain().headers().len(), 1);
    }

    #[test]
    fn merge_appends_both_halves() {
        let mut a = CallMetadata::new();
        a.push_header("h", "1");
        let mut b = CallMetadata::new();
        b.push_header("h", "2");
        b.push_trailer("t", "3");
        a.merge(b);
        assert_eq!(a.headers().len(), 2);
        assert_eq!(a.trailers().len(), 1);
    }
}
