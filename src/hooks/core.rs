use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::context::RequestEvent;
use crate::handler::{Handler, HandlerResult, SharedHandler};
use crate::pattern::{compile, Matcher, PatternError};
use crate::server::Response;

/// Runs after the inner chain with the in-flight response
///
/// Returning a response replaces the in-flight one; `Ok(None)` keeps it.
pub trait PostHandler: Send + Sync + 'static {
    /// # Errors
    ///
    /// Any error aborts the chain and propagates to the caller.
    fn handle(&self, event: &mut RequestEvent, response: &Response) -> HandlerResult;
}

impl<F> PostHandler for F
where
    F: Fn(&mut RequestEvent, &Response) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, event: &mut RequestEvent, response: &Response) -> HandlerResult {
        self(event, response)
    }
}

/// A pre/post interceptor, optionally limited to a path pattern
#[derive(Clone, Default)]
pub struct Hook {
    pattern: Option<Matcher>,
    pre: Option<SharedHandler>,
    post: Option<Arc<dyn PostHandler>>,
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("pattern", &self.pattern.as_ref().map(Matcher::source))
            .field("pre", &self.pre.is_some())
            .field("post", &self.post.is_some())
            .finish()
    }
}

impl Hook {
    /// A hook that runs for every request
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook that only runs when the request path matches `pattern`
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] when `pattern` does not compile.
    pub fn at(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: Some(compile(pattern)?),
            ..Self::default()
        })
    }

    #[must_use]
    pub fn pre<H: Handler>(mut self, handler: H) -> Self {
        self.pre = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn post<P: PostHandler>(mut self, handler: P) -> Self {
        self.post = Some(Arc::new(handler));
        self
    }

    /// A hook that logs method, path, status and latency of every request
    #[must_use]
    pub fn logger() -> Self {
        Self::new().post(|event: &mut RequestEvent, response: &Response| -> HandlerResult {
            info!(
                request_id = %event.request_id(),
                method = %event.method(),
                path = %event.path(),
                status = response.status().as_u16(),
                latency_ms = event.elapsed().as_millis(),
                "Request completed"
            );
            Ok(None)
        })
    }

    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Matcher::source)
    }
}

/// Ordered hooks composed around a terminal handler (onion model)
///
/// For hooks `H1, H2` the execution order is
/// `H1.pre, H2.pre, terminal, H2.post, H1.post`.
#[derive(Debug, Clone, Default)]
pub struct HookChain {
    hooks: Vec<Hook>,
}

impl HookChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, hook: Hook) {
        self.hooks.push(hook);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook around `terminal`
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by a hook or by `terminal`.
    pub fn run<T>(&self, event: &mut RequestEvent, terminal: T) -> anyhow::Result<Response>
    where
        T: FnOnce(&mut RequestEvent) -> anyhow::Result<Response>,
    {
        self.resolve(0, event, terminal)
    }

    fn resolve<T>(&self, index: usize, event: &mut RequestEvent, terminal: T) -> anyhow::Result<Response>
    where
        T: FnOnce(&mut RequestEvent) -> anyhow::Result<Response>,
    {
        let Some(hook) = self.hooks.get(index) else {
            return terminal(event);
        };

        let captures = match &hook.pattern {
            Some(matcher) => match matcher.exec(event.path()) {
                Some(params) => Some(params),
                None => {
                    debug!(index, pattern = %matcher.source(), "Hook skipped");
                    return self.resolve(index + 1, event, terminal);
                }
            },
            None => None,
        };

        // Captures are the context params only while this hook's own handlers run.
        let outer = captures.as_ref().map(|params| event.set_params(params.clone()));
        let pre_result = match &hook.pre {
            Some(pre) => pre.handle(event),
            None => Ok(None),
        };
        if let Some(outer) = outer {
            event.set_params(outer);
        }
        if let Some(res) = pre_result? {
            debug!(index, status = res.status().as_u16(), "Hook pre-handler responded");
            return Ok(res);
        }

        let response = self.resolve(index + 1, event, terminal)?;

        let Some(post) = &hook.post else {
            return Ok(response);
        };
        let outer = captures.map(|params| event.set_params(params));
        let post_result = post.handle(event, &response);
        if let Some(outer) = outer {
            event.set_params(outer);
        }
        match post_result? {
            Some(replaced) => {
                debug!(index, status = replaced.status().as_u16(), "Hook post-handler replaced response");
                Ok(replaced)
            }
            None => Ok(response),
        }
    }
}
