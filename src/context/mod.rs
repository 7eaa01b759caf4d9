//! # Context Module
//!
//! The per-request context ([`RequestEvent`]) and what it carries: scoped
//! [`State`], path params and [`Cookies`].
//!
//! A context is created by the server for every inbound request and dropped once
//! the response has been produced. Nothing in it is shared between requests, so
//! handlers mutate it freely through `&mut RequestEvent`.

mod cookies;
mod event;
mod state;

pub use cookies::{CookieError, CookieOptions, Cookies, SameSite};
pub use event::RequestEvent;
pub use state::State;
