//! Route table - ordered routes and the per-request dispatch loop.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use http::Method;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::RequestAborted;
use crate::context::{RequestEvent, State};
use crate::handler::{HandlerResult, SharedHandler};
use crate::pattern::{compile, join, Matcher, Params, PatternError};

/// Method filter of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMethod {
    /// Matches every method
    All,
    Only(Method),
}

impl RouteMethod {
    #[inline]
    #[must_use]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            RouteMethod::All => true,
            RouteMethod::Only(m) => m == method,
        }
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        RouteMethod::Only(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteMethod::All => f.pad("ALL"),
            RouteMethod::Only(m) => f.pad(m.as_str()),
        }
    }
}

/// State fragment of a router, merged into the context while one of its routes runs
///
/// Scopes are compared by identity, so two routers with equal state are still
/// two different scopes.
#[derive(Debug, Default)]
pub struct Scope {
    state: State,
}

impl Scope {
    #[must_use]
    pub fn new(state: State) -> Self {
        Self { state }
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }
}

/// One registered route: method filter, optional pattern and its handlers
#[derive(Clone)]
pub struct Route {
    method: RouteMethod,
    pattern: Option<Matcher>,
    handlers: Vec<SharedHandler>,
    /// Scopes of the mounted routers this route came from, outermost first
    scopes: Vec<Arc<Scope>>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern())
            .field("handlers", &self.handlers.len())
            .field("scopes", &self.scopes.len())
            .finish()
    }
}

impl Route {
    /// A route without a pattern matches every path
    #[must_use]
    pub fn new(method: RouteMethod, pattern: Option<Matcher>, handlers: Vec<SharedHandler>) -> Self {
        Self {
            method,
            pattern,
            handlers,
            scopes: Vec::new(),
        }
    }

    #[must_use]
    pub fn method(&self) -> &RouteMethod {
        &self.method
    }

    /// The normalized pattern, `None` for routes that match every path
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Matcher::source)
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Re-root this route under `prefix` and inside `scope`
    ///
    /// Patternless routes become `prefix/*?` unless the prefix is the root.
    pub(crate) fn mounted(&self, prefix: &str, scope: &Arc<Scope>) -> Result<Self, PatternError> {
        let pattern = match (&self.pattern, join(prefix, "")) {
            (None, joined) if joined == "/" => None,
            (None, joined) => Some(compile(&join(&joined, "/*?"))?),
            (Some(m), _) => Some(compile(&join(prefix, m.source()))?),
        };
        let mut scopes = Vec::with_capacity(self.scopes.len() + 1);
        scopes.push(Arc::clone(scope));
        scopes.extend(self.scopes.iter().map(Arc::clone));
        Ok(Self {
            method: self.method.clone(),
            pattern,
            handlers: self.handlers.clone(),
            scopes,
        })
    }
}

/// Scopes entered while dispatching, each with the state saved before entering it
#[derive(Default)]
struct ScopeStack {
    active: Vec<(Arc<Scope>, State)>,
}

impl ScopeStack {
    /// Leave every active scope `chain` does not share, then enter the rest of `chain`
    fn enter(&mut self, chain: &[Arc<Scope>], event: &mut RequestEvent) {
        let shared = self
            .active
            .iter()
            .zip(chain)
            .take_while(|((active, _), wanted)| Arc::ptr_eq(active, wanted))
            .count();

        while self.active.len() > shared {
            if let Some((_, saved)) = self.active.pop() {
                event.replace_state(saved);
            }
        }

        for scope in &chain[shared..] {
            let saved = event.state().clone();
            event.state_mut().merge(&scope.state);
            self.active.push((Arc::clone(scope), saved));
        }
    }

    fn unwind(&mut self, event: &mut RequestEvent) {
        self.enter(&[], event);
    }
}

/// Ordered, append-only collection of routes
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes registered for `method` or for every method, in registration order
    pub fn routes_for<'a>(&'a self, method: &'a Method) -> impl Iterator<Item = &'a Route> + 'a {
        self.routes.iter().filter(move |r| r.method.matches(method))
    }

    /// Dispatch the request to the first route that responds
    ///
    /// The params present on the context when dispatch starts are the base for every
    /// matched route. State scopes entered on the way are always left again before
    /// this returns, on success and on error.
    ///
    /// # Errors
    ///
    /// Propagates handler errors, and returns [`RequestAborted`] once the request's
    /// abort signal is raised.
    pub fn dispatch(&self, event: &mut RequestEvent) -> HandlerResult {
        let base = event.params().clone();
        let mut scopes = ScopeStack::default();
        let result = self.dispatch_routes(event, &base, &mut scopes);
        scopes.unwind(event);
        if !matches!(result, Ok(Some(_))) {
            event.set_params(base);
        }
        result
    }

    fn dispatch_routes(&self, event: &mut RequestEvent, base: &Params, scopes: &mut ScopeStack) -> HandlerResult {
        let method = event.method().clone();

        for (index, route) in self.routes_for(&method).enumerate() {
            let captures = match &route.pattern {
                Some(matcher) => match matcher.exec(event.path()) {
                    Some(captures) => captures,
                    None => continue,
                },
                None => Params::new(),
            };
            debug!(
                index,
                method = %route.method,
                pattern = route.pattern().unwrap_or("*"),
                params = captures.len(),
                "Route matched"
            );

            let mut params = base.clone();
            params.extend_from(&captures);
            event.set_params(params);
            scopes.enter(&route.scopes, event);

            for handler in &route.handlers {
                if event.is_aborted() {
                    warn!(method = %method, path = %event.path(), "Request aborted during dispatch");
                    return Err(RequestAborted {
                        method: method.to_string(),
                        path: event.path().to_string(),
                    }
                    .into());
                }
                if let Some(response) = handler.handle(event)? {
                    info!(
                        method = %method,
                        path = %event.path(),
                        pattern = route.pattern().unwrap_or("*"),
                        status = response.status().as_u16(),
                        "Route responded"
                    );
                    return Ok(Some(response));
                }
            }
        }
        Ok(None)
    }
}
