use std::fmt;

/// Raised when a request's [`AbortSignal`](crate::AbortSignal) fires mid-dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAborted {
    pub method: String,
    pub path: String,
}

impl fmt::Display for RequestAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request {} {} was aborted", self.method, self.path)
    }
}

impl std::error::Error for RequestAborted {}
