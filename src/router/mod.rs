//! # Router Module
//!
//! Route tables and composable routers.
//!
//! ## Overview
//!
//! A [`Router`] owns an ordered [`RouteTable`], an optional path prefix and a state
//! fragment. Routes are tried in registration order; the first handler to return a
//! response ends dispatch. A matched route whose handlers all pass lets dispatch
//! continue with the next route, which is how "middleware" style handlers that only
//! set headers or state work.
//!
//! ## Nesting
//!
//! Mounting a child router copies its routes into the parent, with the parent's
//! prefix joined in front. Each copied route remembers the state fragments of the
//! routers it came from; while it runs those fragments are merged into the
//! context state, and they are removed again once dispatch moves on or returns.
//! The result behaves as if every router handled the request in turn, without a
//! second pattern match per nesting level.
//!
//! A router can also be registered as a plain handler (it implements
//! [`Handler`](crate::Handler)), in which case it dispatches its own table when
//! called.
//!
//! ## Example
//!
//! ```rust
//! use routechain::{handler, Response, Router};
//!
//! # fn main() -> Result<(), routechain::PatternError> {
//! let mut v1 = Router::with_prefix("/api/:version")?;
//! v1.get("/users/:id", handler(|ev| {
//!     let version = ev.param("version").unwrap_or_default();
//!     let id = ev.param("id").unwrap_or_default();
//!     Ok(Some(Response::text(format!("{version} {id}"))))
//! }))?;
//! assert_eq!(v1.summary(), vec!["GET     /api/:version/users/:id"]);
//! # Ok(())
//! # }
//! ```

mod core;
mod error;
mod table;
#[cfg(test)]
mod tests;

pub use self::core::Router;
pub use error::RequestAborted;
pub use table::{Route, RouteMethod, RouteTable, Scope};
