//! # Server Module
//!
//! The [`Server`] entry point and the HTTP value types it works with:
//! [`Request`], [`Response`] and [`Headers`].
//!
//! [`Server::handle`] is transport independent and is what tests drive directly.
//! [`Server::listen`] serves the same dispatch over HTTP/1.1 with may_minihttp, one
//! coroutine per connection.

mod core;
mod headers;
mod http_server;
mod request;
mod response;
mod service;

pub use self::core::Server;
pub use headers::{HeaderVec, Headers, MAX_INLINE_HEADERS};
pub use http_server::{HttpServer, ServerHandle};
pub use request::{AbortSignal, Request};
pub use response::Response;
pub use service::DispatchService;
