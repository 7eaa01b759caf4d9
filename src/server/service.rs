use http::{Method, StatusCode};
use may_minihttp::HttpService;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, warn};

use super::response::{write_response, HeaderBlock};
use super::{Headers, Request, Response, Server};

/// The may_minihttp service: decodes a request, dispatches it, writes the response
///
/// may_minihttp clones the service once per connection; every clone gets its own
/// header block.
pub struct DispatchService {
    server: Arc<Server>,
    header_block: HeaderBlock,
}

impl DispatchService {
    #[must_use]
    pub fn new(server: Arc<Server>) -> Self {
        Self {
            server,
            header_block: HeaderBlock::default(),
        }
    }
}

impl Clone for DispatchService {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.server))
    }
}

impl HttpService for DispatchService {
    fn call(&mut self, req: may_minihttp::Request, res: &mut may_minihttp::Response) -> io::Result<()> {
        let response = match decode_request(req) {
            Ok(request) => self.server.respond(request),
            Err(rejection) => rejection,
        };
        write_response(res, response, &mut self.header_block);
        Ok(())
    }
}

/// Convert a may_minihttp request into a [`Request`].
///
/// Headers are copied before the body is read, since reading consumes the request.
fn decode_request(req: may_minihttp::Request) -> Result<Request, Response> {
    let Ok(method) = Method::from_bytes(req.method().as_bytes()) else {
        warn!(method = %req.method(), "Rejected request with invalid method");
        return Err(Response::text("Bad Request").with_status(StatusCode::BAD_REQUEST));
    };
    let url = req.path().to_string();

    let mut headers = Headers::new();
    for h in req.headers() {
        headers.append(h.name, String::from_utf8_lossy(h.value));
    }
    debug!(header_count = headers.len(), "Headers extracted");

    let mut body = Vec::new();
    if let Err(err) = req.body().read_to_end(&mut body) {
        warn!(error = %err, url = %url, "Failed to read request body");
        return Err(Response::text("Bad Request").with_status(StatusCode::BAD_REQUEST));
    }
    if !body.is_empty() {
        debug!(body_size_bytes = body.len(), "Request body read");
    }

    Ok(Request::new(method, url).with_headers(headers).with_body(body))
}
