use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum inline headers before heap allocation
/// Most requests and responses carry ≤16 headers
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage
///
/// Header names use `Arc<str>` because the same names (Content-Type, Set-Cookie, ...)
/// are copied between the request, the context accumulator and the response.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Multi-valued, case-insensitive header map that preserves insertion order
///
/// Used for request headers, for the response header accumulator on a
/// [`RequestEvent`](crate::RequestEvent) and for [`Response`](super::Response) headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: HeaderVec,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value of a header (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header, in insertion order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Replace every value of `name` with a single value
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.entries.push((Arc::from(name), value.into()));
    }

    /// Add a value for `name`, keeping existing ones
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        // Reuse the stored name so repeated headers share one allocation
        let key = self
            .entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map_or_else(|| Arc::from(name), |(k, _)| Arc::clone(k));
        self.entries.push((key, value.into()));
    }

    /// Remove every value of `name`, returning whether anything was removed
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        before != self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut h = Headers::new();
        h.set("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert!(h.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_set_replaces_and_append_accumulates() {
        let mut h = Headers::new();
        h.append("Set-Cookie", "a=1");
        h.append("set-cookie", "b=2");
        assert_eq!(h.get_all("Set-Cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);

        h.set("SET-COOKIE", "c=3");
        assert_eq!(h.get_all("set-cookie").collect::<Vec<_>>(), vec!["c=3"]);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut h: Headers = [("X-A", "1"), ("X-B", "2")].into_iter().collect();
        assert!(h.remove("x-a"));
        assert!(!h.remove("x-a"));
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![("X-B", "2")]);
    }
}
