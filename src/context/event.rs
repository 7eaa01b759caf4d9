use http::Method;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{Cookies, State};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::pattern::Params;
use crate::server::{Headers, Request};

/// Per-request context handed to every hook and handler
///
/// Owns the request for its whole lifetime. Params are rebuilt on every route
/// match, response headers accumulate until the server merges them into the final
/// response, and state is scoped by the routers the request passes through.
#[derive(Debug)]
pub struct RequestEvent {
    request: Request,
    request_id: RequestId,
    params: Params,
    state: State,
    headers: Headers,
    incoming_cookies: HashMap<String, String>,
    started: Instant,
}

impl RequestEvent {
    /// Build a context for `request`, seeded with a copy of `state`
    #[must_use]
    pub fn new(request: Request, state: State) -> Self {
        let request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        let incoming_cookies = request.cookies();
        Self {
            request,
            request_id,
            params: Params::new(),
            state,
            headers: Headers::new(),
            incoming_cookies,
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// A single path parameter of the matched route
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    /// Headers accumulated for the response
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Cookie accessor: reads the request, writes `Set-Cookie` to the accumulator
    pub fn cookies(&mut self) -> Cookies<'_> {
        Cookies::new(&self.incoming_cookies, &mut self.headers)
    }

    /// Shorthand for `cookies().get(name)`
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.incoming_cookies.get(name).map(String::as_str)
    }

    /// Time since the context was created
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.request.abort_signal().is_aborted()
    }

    pub(crate) fn set_params(&mut self, params: Params) -> Params {
        std::mem::replace(&mut self.params, params)
    }

    pub(crate) fn replace_state(&mut self, state: State) -> State {
        std::mem::replace(&mut self.state, state)
    }

    pub(crate) fn take_headers(&mut self) -> Headers {
        std::mem::take(&mut self.headers)
    }
}
