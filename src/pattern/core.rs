//! Pattern compilation - runs at setup time, matching runs on the request hot path.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]

use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{PatternError, Params};

/// A compiled route pattern
///
/// Cheap to clone: the regex and the parameter names are reference counted.
#[derive(Clone)]
pub struct Matcher {
    source: Arc<str>,
    regex: Regex,
    names: Arc<[Arc<str>]>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

impl Matcher {
    /// The normalized pattern this matcher was compiled from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter names in the order they appear in the pattern
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(AsRef::as_ref)
    }

    /// Whether `path` matches this pattern
    #[inline]
    #[must_use]
    pub fn test(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and extract its parameters
    ///
    /// Returns `None` when the path does not match. Optional parameters that did not
    /// participate in the match are absent from the result.
    #[must_use]
    pub fn exec(&self, path: &str) -> Option<Params> {
        let caps = self.regex.captures(path)?;
        let mut params = Params::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.insert(Arc::clone(name), m.as_str().to_string());
            }
        }
        Some(params)
    }
}

/// Join a prefix and a pattern with exactly one `/` between segments
///
/// The result always starts with `/` and never ends with one, unless it is the
/// root itself. An empty prefix behaves like `/`.
#[must_use]
pub fn join(prefix: &str, pattern: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + pattern.len() + 1);
    for segment in prefix
        .split('/')
        .chain(pattern.split('/'))
        .filter(|s| !s.is_empty())
    {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Normalize a single pattern: leading `/`, no duplicate or trailing slashes
#[must_use]
pub fn normalize(pattern: &str) -> String {
    join("", pattern)
}

/// Compile a route pattern into a [`Matcher`]
///
/// # Errors
///
/// Returns a [`PatternError`] for empty, invalid or duplicate parameter names, regex
/// group syntax and modifiers on literal segments.
pub fn compile(pattern: &str) -> Result<Matcher, PatternError> {
    let normalized = normalize(pattern);

    if normalized == "/" {
        return build(normalized, String::from(r"^/$"), Vec::new());
    }

    let mut regex = String::with_capacity(normalized.len() * 2 + 8);
    regex.push('^');
    let mut names: Vec<Arc<str>> = Vec::new();
    let mut wildcards = 0usize;
    let mut ends_with_wildcard = false;

    for segment in normalized.split('/').skip(1) {
        ends_with_wildcard = false;

        if let Some(param) = segment.strip_prefix(':') {
            let (name, modifier) = match param.chars().last() {
                Some(m @ ('?' | '+' | '*')) => (&param[..param.len() - 1], Some(m)),
                _ => (param, None),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyParamName {
                    pattern: pattern.to_string(),
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(PatternError::InvalidParamName {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            if names.iter().any(|n| n.as_ref() == name) {
                return Err(PatternError::DuplicateParamName {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            match modifier {
                None => regex.push_str("/([^/]+)"),
                Some('?') => regex.push_str("(?:/([^/]+))?"),
                Some('+') => regex.push_str("/([^/]+(?:/[^/]+)*)"),
                _ => regex.push_str("(?:/([^/]+(?:/[^/]+)*))?"),
            }
            names.push(Arc::from(name));
        } else if segment == "*" || segment == "*?" {
            if segment == "*" {
                regex.push_str("/(.*)");
            } else {
                regex.push_str("(?:/(.*))?");
            }
            names.push(Arc::from(wildcards.to_string()));
            wildcards += 1;
            ends_with_wildcard = true;
        } else {
            if segment.contains(['(', ')', '{', '}']) {
                return Err(PatternError::UnsupportedSyntax {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                });
            }
            if segment.contains(['?', '+', '*']) {
                return Err(PatternError::ModifierOnLiteral {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                });
            }
            regex.push('/');
            regex.push_str(&regex::escape(segment));
        }
    }

    // A trailing wildcard already absorbs the slash
    if !ends_with_wildcard {
        regex.push_str("/?");
    }
    regex.push('$');

    build(normalized, regex, names)
}

fn build(source: String, regex: String, names: Vec<Arc<str>>) -> Result<Matcher, PatternError> {
    let compiled = Regex::new(&regex).map_err(|e| PatternError::Regex {
        pattern: source.clone(),
        message: e.to_string(),
    })?;
    debug!(pattern = %source, regex = %regex, params = names.len(), "Route pattern compiled");
    Ok(Matcher {
        source: Arc::from(source),
        regex: compiled,
        names: Arc::from(names),
    })
}
