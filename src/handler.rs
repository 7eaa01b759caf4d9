//! # Handler Module
//!
//! A handler receives the per-request context and either returns a [`Response`],
//! which ends dispatch, or `Ok(None)` to pass the request on to the next handler.
//! Failures are plain [`anyhow::Error`]s and propagate out of
//! [`Server::handle`](crate::Server::handle) unless an [`error_boundary`] catches them.
//!
//! Any `Fn(&mut RequestEvent) -> HandlerResult` closure is a handler, and so is a
//! [`Router`](crate::Router).
//!
//! ## Combinators
//!
//! - [`handler`] - pass-through that pins a closure's argument types
//! - [`many`] - run several handlers until one responds
//! - [`when`] - run a handler only when a condition holds
//! - [`error_boundary`] - turn a failure into a response locally
//!
//! ```rust
//! use routechain::{handler, many, when, Response, RequestEvent};
//!
//! let admin_only = when(
//!     |ev: &RequestEvent| ev.request().header("x-admin").is_some(),
//!     handler(|_ev| Ok(Some(Response::text("admin")))),
//! );
//! let fallback = handler(|_ev| Ok(Some(Response::text("guest"))));
//! let _both = many(vec![routechain::shared(admin_only), routechain::shared(fallback)]);
//! ```

use std::sync::Arc;
use tracing::warn;

use crate::context::RequestEvent;
use crate::server::Response;

/// What every handler returns: a response, "continue" (`None`), or an error
pub type HandlerResult = anyhow::Result<Option<Response>>;

/// A handler stored in a route table or hook
pub type SharedHandler = Arc<dyn Handler>;

/// A unit of request handling
pub trait Handler: Send + Sync + 'static {
    /// Handle the request, mutating the context as needed
    ///
    /// # Errors
    ///
    /// Any error aborts dispatch and propagates to the caller.
    fn handle(&self, event: &mut RequestEvent) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestEvent) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, event: &mut RequestEvent) -> HandlerResult {
        self(event)
    }
}

/// Pass a closure through unchanged, fixing its signature for type inference
///
/// ```rust
/// use routechain::{handler, Response};
///
/// let hello = handler(|_ev| Ok(Some(Response::text("Hello World"))));
/// ```
pub fn handler<F>(f: F) -> F
where
    F: Fn(&mut RequestEvent) -> HandlerResult + Send + Sync + 'static,
{
    f
}

/// Box a handler behind an `Arc` so it can be stored and shared
pub fn shared<H: Handler>(h: H) -> SharedHandler {
    Arc::new(h)
}

/// Run `handlers` in order until one returns a response
pub fn many(handlers: Vec<SharedHandler>) -> impl Handler {
    move |event: &mut RequestEvent| -> HandlerResult {
        for h in &handlers {
            if let Some(res) = h.handle(event)? {
                return Ok(Some(res));
            }
        }
        Ok(None)
    }
}

/// Run `inner` only when `condition` holds, otherwise continue
pub fn when<C, H>(condition: C, inner: H) -> impl Handler
where
    C: Fn(&RequestEvent) -> bool + Send + Sync + 'static,
    H: Handler,
{
    move |event: &mut RequestEvent| -> HandlerResult {
        if condition(event) {
            inner.handle(event)
        } else {
            Ok(None)
        }
    }
}

/// Run `inner`, handing any error to `on_error` instead of propagating it
///
/// `on_error` may itself return `Ok(None)` to continue dispatch.
pub fn error_boundary<H, E>(inner: H, on_error: E) -> impl Handler
where
    H: Handler,
    E: Fn(&mut RequestEvent, anyhow::Error) -> HandlerResult + Send + Sync + 'static,
{
    move |event: &mut RequestEvent| -> HandlerResult {
        match inner.handle(event) {
            Ok(res) => Ok(res),
            Err(err) => {
                warn!(
                    request_id = %event.request_id(),
                    path = %event.path(),
                    error = %err,
                    "Handler error caught by boundary"
                );
                on_error(event, err)
            }
        }
    }
}
