//! Error types for token resolution and theme compilation.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for theme operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What kind of entity a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// A theme id unknown to the store.
    Theme,
    /// A token path with nothing declared at it.
    Token,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Theme => f.write_str("Theme"),
            Self::Token => f.write_str("Token"),
        }
    }
}

/// Errors that can occur while resolving tokens or compiling themes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown theme or unresolvable token path.
    #[error("{kind} not found: '{name}'")]
    NotFound { kind: NotFoundKind, name: String },

    /// Malformed path, theme document or override set.
    #[error("Invalid {subject}: {message}")]
    Validation { subject: String, message: String },

    /// A reference chain that revisits one of its own paths.
    #[error("Circular reference detected: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// Generic resolution failure, including the depth ceiling.
    #[error("Failed to resolve '{path}': {message}")]
    Resolution { path: String, message: String },

    /// A failure met while compiling, tagged with the first offending path.
    #[error("Compilation failed at '{path}': {source}")]
    Compilation {
        path: String,
        #[source]
        source: Box<Error>,
    },

    /// The theme store failed for a reason other than a missing theme.
    #[error("Theme store error: {message}")]
    Store { message: String },

    /// Configuration text could not be parsed.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a not-found error for a theme id.
    pub fn theme_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Theme,
            name: id.into(),
        }
    }

    /// Create a not-found error for a token path.
    pub fn token_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            kind: NotFoundKind::Token,
            name: path.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a resolution error.
    pub fn resolution(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while compiling the token at `path`.
    pub fn compilation(path: impl Into<String>, source: Error) -> Self {
        Self::Compilation {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for either flavor of not-found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The innermost error, looking through compilation wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Compilation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_reference_lists_chain() {
        let err = Error::CircularReference {
            chain: vec!["semantic.colors.a".into(), "semantic.colors.b".into(), "semantic.colors.a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Circular reference detected: semantic.colors.a -> semantic.colors.b -> semantic.colors.a"
        );
    }

    #[test]
    fn compilation_keeps_root_cause() {
        let err = Error::compilation("semantic.colors.primary", Error::token_not_found("primitives.colors.nope"));
        assert!(err.to_string().contains("semantic.colors.primary"));
        assert!(err.root_cause().is_not_found());
        assert!(!err.is_not_found());
    }
}
