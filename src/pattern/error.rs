use std::fmt;

/// Route pattern compilation error
///
/// Returned synchronously by [`compile`](super::compile) and by every route and hook
/// registration method. A malformed pattern is a setup bug, so it never reaches
/// request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// A `:` segment without a name (`/users/:` or `/users/:?`)
    EmptyParamName {
        /// The offending pattern
        pattern: String,
    },
    /// A parameter name containing characters outside `[A-Za-z0-9_]`
    InvalidParamName {
        /// The offending pattern
        pattern: String,
        /// The rejected name
        name: String,
    },
    /// The same parameter name used twice in one pattern
    DuplicateParamName {
        /// The offending pattern
        pattern: String,
        /// The repeated name
        name: String,
    },
    /// Custom regex groups (`(`, `)`, `{`, `}`) are not supported
    UnsupportedSyntax {
        /// The offending pattern
        pattern: String,
        /// The segment containing the group syntax
        segment: String,
    },
    /// A `?`, `+` or `*` modifier attached to a literal segment
    ModifierOnLiteral {
        /// The offending pattern
        pattern: String,
        /// The literal segment carrying the modifier
        segment: String,
    },
    /// The generated regex was rejected by the regex engine
    Regex {
        /// The offending pattern
        pattern: String,
        /// Message reported by the regex engine
        message: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::EmptyParamName { pattern } => {
                write!(f, "invalid route pattern '{pattern}': parameter name is empty")
            }
            PatternError::InvalidParamName { pattern, name } => write!(
                f,
                "invalid route pattern '{pattern}': parameter name '{name}' \
                 may only contain ASCII letters, digits and '_'"
            ),
            PatternError::DuplicateParamName { pattern, name } => write!(
                f,
                "invalid route pattern '{pattern}': parameter '{name}' is declared twice"
            ),
            PatternError::UnsupportedSyntax { pattern, segment } => write!(
                f,
                "invalid route pattern '{pattern}': segment '{segment}' uses regex group \
                 syntax, which is not supported"
            ),
            PatternError::ModifierOnLiteral { pattern, segment } => write!(
                f,
                "invalid route pattern '{pattern}': modifiers are only allowed on \
                 parameters and wildcards (segment '{segment}')"
            ),
            PatternError::Regex { pattern, message } => {
                write!(f, "invalid route pattern '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for PatternError {}
