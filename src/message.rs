//! # Message envelope.
//!
//! [`Message`] is an opaque value: a header map plus a byte payload. The engine
//! never inspects either; it only moves messages from channels to endpoints.
//! Cloning is cheap (both parts are `Arc`-backed), which matters for broadcast
//! delivery where one message is handed to every subscriber.
//!
//! ## Example
//! ```rust
//! use dispatchvisor::Message;
//!
//! let msg = Message::new("hello").with_header("content-type", "text/plain");
//! assert_eq!(msg.payload(), b"hello");
//! assert_eq!(msg.header("content-type"), Some("text/plain"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global id counter for messages created in this process.
static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque message: id, headers and payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    id: u64,
    headers: Arc<HashMap<String, String>>,
    payload: Arc<[u8]>,
}

impl Message {
    /// Creates a message with a fresh process-unique id and no headers.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: MESSAGE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            headers: Arc::new(HashMap::new()),
            payload: Arc::from(payload.into()),
        }
    }

    /// Attaches a header (copy-on-write if the message was already cloned).
    #[inline]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.headers).insert(key.into(), value.into());
        self
    }

    /// Process-unique id, assigned at creation.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Looks up a header value.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// All headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Raw payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_clones_share_them() {
        let a = Message::new("a");
        let b = Message::new("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn header_on_clone_does_not_leak_into_original() {
        let original = Message::new("x").with_header("k", "v1");
        let copy = original.clone().with_header("k", "v2");
        assert_eq!(original.header("k"), Some("v1"));
        assert_eq!(copy.header("k"), Some("v2"));
    }
}
