use http::StatusCode;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::warn;

use super::Headers;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// A response produced by a handler, a hook or the not-found fallback
///
/// The server merges the headers accumulated on the request context into it before
/// the response leaves [`Server::handle`](crate::Server::handle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::empty(StatusCode::OK)
    }
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// `200 OK` with a `text/plain` body
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_content_type(StatusCode::OK, TEXT_PLAIN, body.into().into_bytes())
    }

    /// `200 OK` with a `text/html` body
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_content_type(StatusCode::OK, TEXT_HTML, body.into().into_bytes())
    }

    /// A JSON body with the given status
    #[must_use]
    pub fn json(status: StatusCode, body: &Value) -> Self {
        Self::with_content_type(status, APPLICATION_JSON, body.to_string().into_bytes())
    }

    /// No body
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Headers::new(), Vec::new())
    }

    /// Redirect to `location` (use a 3xx status)
    #[must_use]
    pub fn redirect(location: &str, status: StatusCode) -> Self {
        Self::empty(status).with_header("Location", location)
    }

    /// The default fallback: `404 Cannot <METHOD> <path>`
    #[must_use]
    pub fn not_found(method: &http::Method, path: &str) -> Self {
        Self::text(format!("Cannot {method} {path}")).with_status(StatusCode::NOT_FOUND)
    }

    /// The default error boundary response
    #[must_use]
    pub fn internal_error() -> Self {
        Self::text("Internal Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn with_content_type(status: StatusCode, content_type: &str, body: Vec<u8>) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", content_type);
        Self::new(status, headers, body)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set a header, replacing existing values
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Add a header value, keeping existing ones
    #[must_use]
    pub fn append_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, replacing invalid UTF-8
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub(crate) fn into_parts(self) -> (StatusCode, Headers, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// Map common header lines to static strings; may_minihttp only accepts `&'static str`.
fn static_header_line(name: &str, value: &str) -> Option<&'static str> {
    let line = match (name.to_ascii_lowercase().as_str(), value) {
        ("content-type", TEXT_PLAIN) => "Content-Type: text/plain; charset=utf-8",
        ("content-type", TEXT_HTML) => "Content-Type: text/html; charset=utf-8",
        ("content-type", APPLICATION_JSON) => "Content-Type: application/json",
        ("content-type", "text/plain") => "Content-Type: text/plain",
        ("content-type", "text/html") => "Content-Type: text/html",
        ("cache-control", "no-cache") => "Cache-Control: no-cache",
        ("cache-control", "no-store") => "Cache-Control: no-store",
        ("connection", "close") => "Connection: close",
        _ => return None,
    };
    Some(line)
}

/// Header slots may_minihttp reserves per response; writing past them panics.
const HEADER_SLOTS: usize = 16;

/// Header lines without a static form, joined by CRLF into a single header slot
///
/// One block belongs to one connection and is rewritten for every response, so
/// neither the number of headers nor the number of requests grows memory.
#[derive(Debug, Default)]
pub(crate) struct HeaderBlock {
    buf: String,
}

impl HeaderBlock {
    fn clear(&mut self) {
        self.buf.clear();
    }

    fn push(&mut self, name: &str, value: &str) {
        if !self.buf.is_empty() {
            self.buf.push_str("\r\n");
        }
        self.buf.push_str(name);
        self.buf.push_str(": ");
        self.buf.push_str(value);
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.buf
    }
}

/// Split `headers` into static lines and the connection's header block.
///
/// At most `HEADER_SLOTS - 1` static lines are returned; the rest of the headers,
/// static or not, are folded into `block`, which takes the last slot. Headers whose
/// name or value contain a line break are dropped.
fn plan_headers(headers: &Headers, block: &mut HeaderBlock) -> SmallVec<[&'static str; HEADER_SLOTS]> {
    block.clear();
    let mut lines = SmallVec::new();
    for (name, value) in headers.iter() {
        if name.eq_ignore_ascii_case("content-length") || name.eq_ignore_ascii_case("date") {
            continue;
        }
        if name.contains(['\r', '\n']) || value.contains(['\r', '\n']) {
            warn!(header = %name, "Dropped response header containing a line break");
            continue;
        }
        match static_header_line(name, value) {
            Some(line) if lines.len() < HEADER_SLOTS - 1 => lines.push(line),
            _ => block.push(name, value),
        }
    }
    lines
}

/// Write a [`Response`] onto the may_minihttp response buffer.
///
/// `Content-Length` and `Date` are written by may_minihttp itself and are skipped
/// here. Headers go out through at most [`HEADER_SLOTS`] slots, whatever their count.
pub(crate) fn write_response(res: &mut may_minihttp::Response, response: Response, block: &mut HeaderBlock) {
    let (status, headers, body) = response.into_parts();
    let reason = status.canonical_reason().unwrap_or("Unknown");
    res.status_code(usize::from(status.as_u16()), reason);

    for line in plan_headers(&headers, block) {
        res.header(line);
    }
    if !block.is_empty() {
        // SAFETY: may_minihttp encodes a response into its write buffer right after
        // `HttpService::call` returns and before the next `call` on the same
        // service. The block is owned by that service and only rewritten inside
        // `call`, so the line stays valid and unchanged for as long as it is read.
        #[allow(unsafe_code)]
        let line: &'static str = unsafe { &*std::ptr::from_ref::<str>(block.as_str()) };
        res.header(line);
    }
    res.body_vec(body);
}
