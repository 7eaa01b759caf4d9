use std::io;
use std::sync::Arc;
use tracing::{error, field, info, info_span, warn};

use super::http_server::{HttpServer, ServerHandle};
use super::service::DispatchService;
use super::{Headers, Request, Response};
use crate::config::ListenOptions;
use crate::context::{RequestEvent, State};
use crate::handler::{Handler, SharedHandler};
use crate::hooks::{Hook, HookChain};
use crate::pattern::PatternError;
use crate::router::{RouteMethod, Router};

/// Top-level entry point: a root router, the hook chain and the initial state
///
/// ```rust
/// use routechain::{handler, Request, Response, Server};
///
/// let mut server = Server::new();
/// server.use_handler(handler(|_ev| Ok(Some(Response::text("Hello World")))));
///
/// let res = server.handle(Request::get("http://localhost:3000/any-path")).unwrap();
/// assert_eq!(res.body_text(), "Hello World");
/// ```
#[derive(Default)]
pub struct Server {
    router: Router,
    hooks: HookChain,
    state: State,
    not_found: Option<SharedHandler>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("routes", &self.router.routes().len())
            .field("hooks", &self.hooks.len())
            .field("state", &self.state)
            .field("not_found", &self.not_found.is_some())
            .finish()
    }
}

macro_rules! server_routes {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Shortcut for [`Router::", stringify!($name), "`] on the root router")]
            ///
            /// # Errors
            ///
            /// Returns a [`PatternError`] when the pattern does not compile.
            pub fn $name<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError> {
                self.router.$name(pattern, handler)?;
                Ok(self)
            }
        )*
    };
}

impl Server {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state copied into every request context
    #[must_use]
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn hooks(&self) -> &HookChain {
        &self.hooks
    }

    /// Register a handler for every request
    pub fn use_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.router.use_handler(handler);
        self
    }

    /// Register a handler chain for every request
    pub fn use_chain(&mut self, handlers: Vec<SharedHandler>) -> &mut Self {
        self.router.use_chain(handlers);
        self
    }

    /// Register a handler for every method on paths matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the pattern does not compile.
    pub fn use_at<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError> {
        self.router.use_at(pattern, handler)?;
        Ok(self)
    }

    server_routes!(get, post, put, patch, delete, options, head, trace, all);

    /// Register a handler chain on the root router
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the pattern does not compile.
    pub fn route(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        handlers: Vec<SharedHandler>,
    ) -> Result<&mut Self, PatternError> {
        self.router.route(method, pattern, handlers)?;
        Ok(self)
    }

    /// Mount a router at its own prefix
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when a joined pattern does not compile.
    pub fn mount(&mut self, router: Router) -> Result<&mut Self, PatternError> {
        self.router.mount(router)?;
        Ok(self)
    }

    /// Mount a router under `prefix`
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when a joined pattern does not compile.
    pub fn mount_at(&mut self, prefix: &str, router: Router) -> Result<&mut Self, PatternError> {
        self.router.mount_at(prefix, router)?;
        Ok(self)
    }

    /// Append a hook; hooks wrap dispatch in registration order
    pub fn use_hook(&mut self, hook: Hook) -> &mut Self {
        self.hooks.add(hook);
        self
    }

    /// Replace the default `404 Cannot <METHOD> <path>` fallback
    ///
    /// When the handler itself returns `Ok(None)` the default fallback is used.
    pub fn with_not_found<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.not_found = Some(Arc::new(handler));
        self
    }

    /// Handle one request
    ///
    /// Runs the hook chain around the root router, falls back to the not-found
    /// response and merges the headers accumulated on the context into the result.
    ///
    /// # Errors
    ///
    /// Handler and hook errors propagate unchanged; see [`Server::respond`] for the
    /// variant that turns them into a `500`.
    pub fn handle(&self, request: Request) -> anyhow::Result<Response> {
        let span = info_span!(
            "request",
            request_id = field::Empty,
            method = %request.method(),
            path = %request.path()
        );
        let _entered = span.enter();

        let mut event = RequestEvent::new(request, self.state.clone());
        span.record("request_id", field::display(event.request_id()));

        let response = self.hooks.run(&mut event, |ev| self.resolve(ev))?;
        Ok(merge_headers(response, &event.take_headers()))
    }

    /// Handle one request, converting errors into `500 Internal Server Error`
    #[must_use]
    pub fn respond(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();
        match self.handle(request) {
            Ok(response) => response,
            Err(err) => {
                error!(method = %method, path = %path, error = %format!("{err:#}"), "Request failed");
                Response::internal_error()
            }
        }
    }

    /// Root router dispatch, else the not-found fallback
    fn resolve(&self, event: &mut RequestEvent) -> anyhow::Result<Response> {
        if let Some(response) = self.router.handle(event)? {
            return Ok(response);
        }
        warn!(method = %event.method(), path = %event.path(), "No route responded");
        if let Some(not_found) = &self.not_found {
            if let Some(response) = not_found.handle(event)? {
                return Ok(response);
            }
        }
        Ok(Response::not_found(event.method(), event.path()))
    }

    /// Serve on `options.addr()` using may coroutines
    ///
    /// Applies the stack size and worker settings to the coroutine runtime, logs the
    /// route table and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be resolved or bound.
    pub fn listen(self, options: &ListenOptions) -> io::Result<ServerHandle> {
        options.apply_runtime();
        for line in self.router.summary() {
            info!(route = %line, "Route");
        }
        info!(
            routes = self.router.routes().len(),
            hooks = self.hooks.len(),
            stack_size = options.stack_size,
            "Starting server"
        );

        let addr = options.addr();
        let handle = HttpServer(DispatchService::new(Arc::new(self))).start(addr.as_str())?;
        info!(addr = %handle.addr(), "Listening");
        Ok(handle)
    }
}

/// Merge the context's accumulated headers into `response`
///
/// Names the response set itself win; the accumulator only adds names the response
/// never set. `Set-Cookie` values from both sides are kept.
fn merge_headers(mut response: Response, accumulated: &Headers) -> Response {
    if accumulated.is_empty() {
        return response;
    }
    let original = response.headers().clone();
    let headers = response.headers_mut();
    for (name, value) in accumulated.iter() {
        if name.eq_ignore_ascii_case("set-cookie") || !original.contains(name) {
            headers.append(name, value);
        }
    }
    response
}
