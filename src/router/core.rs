use http::Method;
use std::sync::Arc;
use tracing::{debug, info};

use super::table::{Route, RouteMethod, RouteTable, Scope};
use crate::context::{RequestEvent, State};
use crate::handler::{Handler, HandlerResult, SharedHandler};
use crate::pattern::{compile, join, Matcher, PatternError};

/// A composable set of routes with a path prefix and a state fragment
///
/// Registration methods compile their pattern immediately and return a
/// [`PatternError`] for malformed patterns, so setup code can use `?`.
///
/// ```rust
/// use routechain::{handler, Router, Response};
///
/// # fn main() -> Result<(), routechain::PatternError> {
/// let mut users = Router::with_prefix("/users")?;
/// users.get("/:id", handler(|ev| {
///     Ok(Some(Response::text(format!("user {}", ev.param("id").unwrap_or_default()))))
/// }))?;
///
/// let mut api = Router::with_prefix("/api")?;
/// api.mount(users)?;
/// assert_eq!(api.routes()[0].pattern(), Some("/api/users/:id"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    prefix: String,
    scope: Arc<Scope>,
    table: RouteTable,
    /// `prefix/*?`, used by patternless handlers of a prefixed router
    catch_all: Option<Matcher>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_routes {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            #[doc = concat!("Register a handler for `", stringify!($method), "` requests matching `pattern`")]
            ///
            /// # Errors
            ///
            /// Returns a [`PatternError`] when the joined pattern does not compile.
            pub fn $name<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError> {
                self.route(RouteMethod::Only($method), pattern, vec![Arc::new(handler)])
            }
        )*
    };
}

impl Router {
    /// A router without prefix or state
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: String::new(),
            scope: Arc::new(Scope::default()),
            table: RouteTable::new(),
            catch_all: None,
        }
    }

    /// A router whose patterns are all joined onto `prefix`
    ///
    /// The prefix may contain params, e.g. `/api/:version`.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the prefix does not compile.
    pub fn with_prefix(prefix: &str) -> Result<Self, PatternError> {
        let normalized = join(prefix, "");
        let catch_all = if normalized == "/" {
            None
        } else {
            Some(compile(&join(&normalized, "/*?"))?)
        };
        Ok(Self {
            prefix: if normalized == "/" { String::new() } else { normalized },
            catch_all,
            ..Self::new()
        })
    }

    /// Replace this router's own state fragment
    #[must_use]
    pub fn with_state(mut self, state: State) -> Self {
        self.scope = Arc::new(Scope::new(state));
        self
    }

    /// The normalized prefix, empty for the root
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn state(&self) -> &State {
        self.scope.state()
    }

    /// Registered routes in dispatch order, including mounted children
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.table.routes()
    }

    /// One `METHOD pattern` line per route, used for route dumps at startup
    #[must_use]
    pub fn summary(&self) -> Vec<String> {
        self.table
            .routes()
            .iter()
            .map(|r| format!("{:<7} {}", r.method(), r.pattern().unwrap_or("*")))
            .collect()
    }

    /// Register a handler for every method and every path under the prefix
    pub fn use_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.use_chain(vec![Arc::new(handler)])
    }

    /// Register a handler chain for every method and every path under the prefix
    ///
    /// The handlers form one route: they run in order until one responds.
    pub fn use_chain(&mut self, handlers: Vec<SharedHandler>) -> &mut Self {
        let route = Route::new(RouteMethod::All, self.catch_all.clone(), handlers);
        self.table.add(route);
        self
    }

    /// Register a handler for every method on paths matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the joined pattern does not compile.
    pub fn use_at<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError> {
        self.route(RouteMethod::All, pattern, vec![Arc::new(handler)])
    }

    /// Register a handler chain; the handlers run in order until one responds
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the joined pattern does not compile.
    pub fn route(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        handlers: Vec<SharedHandler>,
    ) -> Result<&mut Self, PatternError> {
        let matcher = compile(&join(&self.prefix, pattern))?;
        debug!(method = %method, pattern = %matcher.source(), "Route registered");
        self.table.add(Route::new(method, Some(matcher), handlers));
        Ok(self)
    }

    method_routes! {
        get => Method::GET,
        post => Method::POST,
        put => Method::PUT,
        patch => Method::PATCH,
        delete => Method::DELETE,
        options => Method::OPTIONS,
        head => Method::HEAD,
        trace => Method::TRACE,
    }

    /// Register a handler for every method on paths matching `pattern`
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when the joined pattern does not compile.
    pub fn all<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, PatternError> {
        self.route(RouteMethod::All, pattern, vec![Arc::new(handler)])
    }

    /// Mount `child` under this router's prefix
    ///
    /// The child's routes are appended in order. Its prefix is joined onto this
    /// router's prefix, and its state applies only while its routes run.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when a joined pattern does not compile.
    pub fn mount(&mut self, child: Router) -> Result<&mut Self, PatternError> {
        let prefix = self.prefix.clone();
        self.mount_routes(&prefix, &child)
    }

    /// Mount `child` under `prefix`, itself joined onto this router's prefix
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when a joined pattern does not compile.
    pub fn mount_at(&mut self, prefix: &str, child: Router) -> Result<&mut Self, PatternError> {
        let prefix = join(&self.prefix, prefix);
        self.mount_routes(&prefix, &child)
    }

    fn mount_routes(&mut self, prefix: &str, child: &Router) -> Result<&mut Self, PatternError> {
        for route in child.table.routes() {
            self.table.add(route.mounted(prefix, &child.scope)?);
        }
        info!(
            prefix = %join(prefix, ""),
            child_prefix = %child.prefix,
            routes = child.table.len(),
            "Router mounted"
        );
        Ok(self)
    }

    /// Handle a request with this router's state merged into the context
    ///
    /// The context state is restored before returning, whether dispatch succeeded
    /// or failed.
    ///
    /// # Errors
    ///
    /// Propagates the first handler error.
    pub fn handle(&self, event: &mut RequestEvent) -> HandlerResult {
        let saved = event.state().clone();
        event.state_mut().merge(self.scope.state());
        let result = self.table.dispatch(event);
        event.replace_state(saved);
        result
    }

    /// This router as a shareable handler, e.g. for [`Router::use_at`]
    #[must_use]
    pub fn into_handler(self) -> SharedHandler {
        Arc::new(self)
    }
}

impl Handler for Router {
    fn handle(&self, event: &mut RequestEvent) -> HandlerResult {
        Router::handle(self, event)
    }
}
