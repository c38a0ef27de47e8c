//! # Function-backed endpoint (`EndpointFn`)
//!
//! [`EndpointFn`] wraps a closure `F: Fn(Message) -> Fut`, producing a fresh
//! future per message. Shared state goes into the closure explicitly (`Arc<...>`).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use dispatchvisor::{EndpointFn, EndpointRef, HandlerError, Message};
//!
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//! let ep: EndpointRef = EndpointFn::arc(move |_msg: Message| {
//!     let counter = counter.clone();
//!     async move {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!         Ok::<_, HandlerError>(())
//!     }
//! });
//! assert!(ep.is_running());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::endpoints::endpoint::Endpoint;
use crate::error::HandlerError;
use crate::message::Message;

type Selector = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Closure-backed endpoint with an optional selector.
pub struct EndpointFn<F> {
    f: F,
    selector: Option<Selector>,
}

impl<F> EndpointFn<F> {
    /// Creates a new function-backed endpoint.
    ///
    /// Prefer [`EndpointFn::arc`] when you immediately need an [`EndpointRef`](crate::EndpointRef).
    pub fn new(f: F) -> Self {
        Self { f, selector: None }
    }

    /// Creates the endpoint and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }

    /// Restricts the endpoint to messages for which `selector` returns `true`.
    pub fn with_selector(
        mut self,
        selector: impl Fn(&Message) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }
}

impl<F> fmt::Debug for EndpointFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointFn")
            .field("selector", &self.selector.is_some())
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Endpoint for EndpointFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: Message) -> Result<(), HandlerError> {
        (self.f)(message).await
    }

    fn accepts(&self, message: &Message) -> bool {
        self.selector.as_ref().is_none_or(|s| s(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selector_filters_but_handle_still_runs() {
        let ep = EndpointFn::new(|msg: Message| async move {
            if msg.payload() == b"bad" {
                Err(HandlerError::fail("bad payload"))
            } else {
                Ok(())
            }
        })
        .with_selector(|m| m.header("kind") == Some("order"));

        let order = Message::new("ok").with_header("kind", "order");
        let other = Message::new("ok");
        assert!(ep.accepts(&order));
        assert!(!ep.accepts(&other));

        assert!(ep.handle(order).await.is_ok());
        assert_eq!(
            ep.handle(Message::new("bad")).await,
            Err(HandlerError::fail("bad payload"))
        );
    }
}
