//! # Endpoint abstractions.
//!
//! This module provides the consuming side of the engine:
//! - [`Endpoint`] - trait for async message handlers (with optional selector)
//! - [`EndpointFn`] - closure-backed endpoint implementation
//! - [`EndpointRef`] - shared reference to an endpoint (`Arc<dyn Endpoint>`)

mod endpoint;
mod endpoint_fn;

pub use endpoint::{Endpoint, EndpointRef};
pub use endpoint_fn::EndpointFn;
