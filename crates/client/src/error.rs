use std::error::Error as StdError;

/// Crate-wide result type for session and send operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed client errors.
///
/// Soft delivery failures (non-200 post, rejected upload) are not errors;
/// they are reported through [`crate::SendOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The login form submission did not answer with a redirect.
    #[error("login failed: expected HTTP 302, got {status}")]
    Authentication { status: u16 },

    /// An anti-forgery token could not be scraped from a page.
    #[error("token not found in {page}")]
    TokenNotFound { page: String },

    /// The destination name is not configured.
    #[error("unknown destination: {name}")]
    UnknownDestination { name: String },

    /// Missing or unusable configuration.
    #[error("invalid client configuration: {message}")]
    InvalidConfig { message: String },

    /// Transport-level failure (after connection retries).
    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Wrapped source error from another dependency.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn token_not_found(page: impl std::fmt::Display) -> Self {
        Self::TokenNotFound {
            page: page.to_string(),
        }
    }

    #[must_use]
    pub fn unknown_destination(name: impl std::fmt::Display) -> Self {
        Self::UnknownDestination {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_config(message: impl std::fmt::Display) -> Self {
        Self::InvalidConfig {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
