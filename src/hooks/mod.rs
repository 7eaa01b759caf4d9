//! # Hooks Module
//!
//! Hooks are cross-cutting interceptors that wrap the whole dispatch of a request.
//! Each [`Hook`] has an optional pre-handler, an optional post-handler and an
//! optional path pattern.
//!
//! - A pre-handler that returns a response short-circuits: deeper hooks and the
//!   routes never run, but the posts of the hooks already entered still do.
//! - A post-handler sees the in-flight response and may replace it.
//! - A patterned hook whose pattern does not match the request path is skipped
//!   entirely. When it matches, its captures are the context params while it runs.
//!
//! ```rust
//! use http::StatusCode;
//! use routechain::{Hook, RequestEvent, Response, HandlerResult};
//!
//! let auth = Hook::at("/admin/*?").unwrap().pre(|ev: &mut RequestEvent| -> HandlerResult {
//!     if ev.request().header("authorization").is_none() {
//!         return Ok(Some(Response::text("Unauthorized").with_status(StatusCode::UNAUTHORIZED)));
//!     }
//!     Ok(None)
//! });
//! assert_eq!(auth.pattern(), Some("/admin/*?"));
//! ```

mod core;

pub use self::core::{Hook, HookChain, PostHandler};
