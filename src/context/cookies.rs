//! Cookie access for a request/response pair.
//!
//! Incoming cookies are read from the request's `Cookie` headers. Outgoing cookies
//! are appended as `Set-Cookie` headers to the response header accumulator of the
//! [`RequestEvent`](crate::RequestEvent), which the server merges into the final
//! response.

use std::collections::HashMap;
use std::fmt;

use crate::server::Headers;

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// The `SameSite` cookie attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes of an outgoing cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// An HTTP-date, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`
    pub expires: Option<String>,
    pub max_age: Option<u64>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn expires(mut self, http_date: impl Into<String>) -> Self {
        self.expires = Some(http_date.into());
        self
    }

    #[must_use]
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    #[must_use]
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Errors raised while building a `Set-Cookie` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    InvalidName(String),
    InvalidValue { name: String },
    /// `__Secure-` and `__Host-` cookies must be `Secure`
    PrefixRequiresSecure(String),
    /// `__Host-` cookies must use `Path=/` and no `Domain`
    HostPrefixScope(String),
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieError::InvalidName(name) => write!(f, "invalid cookie name: {name:?}"),
            CookieError::InvalidValue { name } => {
                write!(f, "invalid value for cookie {name:?}")
            }
            CookieError::PrefixRequiresSecure(name) => {
                write!(f, "cookie {name:?} must be set with the Secure attribute")
            }
            CookieError::HostPrefixScope(name) => {
                write!(f, "cookie {name:?} must use Path=/ and no Domain")
            }
        }
    }
}

impl std::error::Error for CookieError {}

/// Cookie accessor bound to one request and its response header accumulator
pub struct Cookies<'a> {
    incoming: &'a HashMap<String, String>,
    outgoing: &'a mut Headers,
}

impl<'a> Cookies<'a> {
    pub(crate) fn new(incoming: &'a HashMap<String, String>, outgoing: &'a mut Headers) -> Self {
        Self { incoming, outgoing }
    }

    /// A cookie sent by the client
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.incoming.get(name).map(String::as_str)
    }

    /// Every cookie sent by the client
    #[must_use]
    pub fn get_all(&self) -> &'a HashMap<String, String> {
        self.incoming
    }

    /// Append a `Set-Cookie` header
    ///
    /// # Errors
    ///
    /// Returns a [`CookieError`] for invalid names or values and for `__Secure-` /
    /// `__Host-` cookies that break their prefix rules.
    pub fn set(&mut self, name: &str, value: &str, options: &CookieOptions) -> Result<(), CookieError> {
        let line = serialize(name, value, options)?;
        self.outgoing.append("Set-Cookie", line);
        Ok(())
    }

    /// Append a `Set-Cookie` header that expires the cookie immediately
    ///
    /// Only `domain`, `path` and `secure` of `options` are used, so prefixed
    /// (`__Secure-`, `__Host-`) cookies can be removed too.
    ///
    /// # Errors
    ///
    /// Returns a [`CookieError`] for an invalid name or a broken prefix rule.
    pub fn delete(&mut self, name: &str, options: &CookieOptions) -> Result<(), CookieError> {
        let expired = CookieOptions {
            domain: options.domain.clone(),
            path: options.path.clone(),
            secure: options.secure,
            expires: Some(EPOCH_HTTP_DATE.to_string()),
            ..CookieOptions::default()
        };
        self.set(name, "", &expired)
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?={}".contains(c)
}

fn is_cookie_value_char(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, '"' | ',' | ';' | '\\')
}

/// Serialize a cookie as a `Set-Cookie` header value.
///
/// Attribute order: `Secure`, `HttpOnly`, `Max-Age`, `Domain`, `SameSite`, `Path`,
/// `Expires`.
pub(crate) fn serialize(name: &str, value: &str, options: &CookieOptions) -> Result<String, CookieError> {
    if name.is_empty() || !name.chars().all(is_token_char) {
        return Err(CookieError::InvalidName(name.to_string()));
    }
    if !value.chars().all(is_cookie_value_char) {
        return Err(CookieError::InvalidValue {
            name: name.to_string(),
        });
    }
    if (name.starts_with("__Secure-") || name.starts_with("__Host-")) && !options.secure {
        return Err(CookieError::PrefixRequiresSecure(name.to_string()));
    }
    if name.starts_with("__Host-")
        && (options.domain.is_some() || options.path.as_deref() != Some("/"))
    {
        return Err(CookieError::HostPrefixScope(name.to_string()));
    }

    let mut out = Vec::with_capacity(4);
    out.push(format!("{name}={value}"));
    if options.secure {
        out.push("Secure".to_string());
    }
    if options.http_only {
        out.push("HttpOnly".to_string());
    }
    if let Some(max_age) = options.max_age {
        out.push(format!("Max-Age={max_age}"));
    }
    if let Some(domain) = &options.domain {
        out.push(format!("Domain={domain}"));
    }
    if let Some(same_site) = options.same_site {
        out.push(format!("SameSite={same_site}"));
    }
    if let Some(path) = &options.path {
        out.push(format!("Path={path}"));
    }
    if let Some(expires) = &options.expires {
        out.push(format!("Expires={expires}"));
    }
    Ok(out.join("; "))
}
