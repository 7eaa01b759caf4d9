//! # Pattern Module
//!
//! The pattern module compiles route patterns into regex-backed matchers and joins
//! path prefixes for nested routers.
//!
//! ## Syntax
//!
//! | Segment    | Meaning                                              |
//! |------------|------------------------------------------------------|
//! | `users`    | literal, matched case-sensitively                    |
//! | `:id`      | one segment captured as `id`                         |
//! | `:id?`     | optional segment, key absent when missing            |
//! | `:rest+`   | one or more remaining segments captured as `rest`    |
//! | `:rest*`   | zero or more remaining segments captured as `rest`   |
//! | `*`        | anything, captured positionally as `"0"`, `"1"`, ... |
//! | `*?`       | optional anything, used for `/prefix/*?` mounts      |
//!
//! A single trailing slash on the request path is tolerated, so `/users/:id`
//! matches both `/users/1` and `/users/1/`.
//!
//! ## Example
//!
//! ```rust
//! use routechain::pattern::compile;
//!
//! let matcher = compile("/users/:id/friends/:friendId").unwrap();
//! let params = matcher.exec("/users/1/friends/2").unwrap();
//! assert_eq!(params.get("id"), Some("1"));
//! assert_eq!(params.get("friendId"), Some("2"));
//! assert!(!matcher.test("/users/1"));
//! ```
//!
//! ## Prefix joining
//!
//! [`join`] produces exactly one `/` between segments and never a trailing slash
//! unless the result is the root:
//!
//! ```rust
//! use routechain::pattern::join;
//!
//! assert_eq!(join("/a/", "/b"), "/a/b");
//! assert_eq!(join("/a", ""), "/a");
//! assert_eq!(join("", ""), "/");
//! ```

mod core;
mod error;
mod params;

pub use self::core::{compile, join, normalize, Matcher};
pub use error::PatternError;
pub use params::{ParamVec, Params, MAX_INLINE_PARAMS};
