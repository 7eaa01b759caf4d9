//! # routechain
//!
//! **routechain** is a per-request dispatch engine: it matches requests against
//! path patterns, runs an onion of hooks and an ordered chain of handlers against a
//! mutable per-request context, and merges their partial responses. Routers nest
//! inside routers with path prefixes and scoped state. Serving is done on `may`
//! coroutines with `may_minihttp`.
//!
//! ## Architecture
//!
//! - **[`pattern`]** - route pattern compiler (`/users/:id`, `:rest+`, `/static/*?`)
//!   and prefix joining
//! - **[`router`]** - route tables, composable [`Router`]s and the dispatch loop
//! - **[`hooks`]** - pre/post interceptors wrapped around dispatch
//! - **[`context`]** - the per-request [`RequestEvent`], scoped [`State`] and cookies
//! - **[`handler`]** - the [`Handler`] trait and its combinators
//! - **[`server`]** - the [`Server`] entry point, [`Request`] / [`Response`] and the
//!   HTTP listener
//! - **[`config`]** / **[`telemetry`]** - listen options and tracing setup
//!
//! ### Request Handling Flow
//!
//! ```text
//! Server::handle(request)
//!   └─ RequestEvent::new(request, server state)
//!      └─ HookChain: H1.pre → H2.pre → ... ┐
//!                                          │ root Router: routes in order,
//!                                          │ first response wins, else 404
//!         H1.post ← H2.post ← ... ←────────┘
//!   └─ merge accumulated headers into the response
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::StatusCode;
//! use routechain::{handler, Hook, Request, Response, Router, Server, State};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut api = Router::with_prefix("/api/:version")?;
//! api.get("/users/:id", handler(|ev| {
//!     let greeting = ev.state().get_str("greeting").unwrap_or("hi").to_string();
//!     let id = ev.param("id").unwrap_or_default();
//!     Ok(Some(Response::text(format!("{greeting} user {id}"))))
//! }))?;
//!
//! let mut server = Server::new().with_state([("greeting", "hello")].into_iter().collect::<State>());
//! server
//!     .use_hook(Hook::logger())
//!     .use_handler(handler(|ev| {
//!         ev.headers_mut().set("X-Powered-By", "routechain");
//!         Ok(None)
//!     }))
//!     .mount(api)?;
//!
//! let res = server.handle(Request::get("/api/v1/users/7"))?;
//! assert_eq!(res.status(), StatusCode::OK);
//! assert_eq!(res.body_text(), "hello user 7");
//! assert_eq!(res.headers().get("x-powered-by"), Some("routechain"));
//!
//! let missing = server.handle(Request::get("/nope"))?;
//! assert_eq!(missing.body_text(), "Cannot GET /nope");
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime Considerations
//!
//! Handlers are plain functions. Under [`Server::listen`] each connection runs in a
//! `may` coroutine, so blocking on coroutine-aware I/O suspends the coroutine
//! rather than the worker thread. The coroutine stack size is configured through
//! [`config::ListenOptions`] (`ROUTECHAIN_STACK_SIZE`).

pub mod config;
pub mod context;
pub mod handler;
pub mod hooks;
mod ids;
pub mod pattern;
pub mod router;
pub mod server;
pub mod telemetry;

pub use context::{CookieError, CookieOptions, Cookies, RequestEvent, SameSite, State};
pub use handler::{error_boundary, handler, many, shared, when, Handler, HandlerResult, SharedHandler};
pub use hooks::{Hook, HookChain};
pub use ids::{RequestId, REQUEST_ID_HEADER};
pub use pattern::{Params, PatternError};
pub use router::{RequestAborted, RouteMethod, Router};
pub use server::{AbortSignal, Headers, Request, Response, Server, ServerHandle};
