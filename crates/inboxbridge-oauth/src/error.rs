//! Error types for `OAuth2` operations.

/// Result type alias for `OAuth2` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `OAuth2` error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `OAuth2` error from server.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// Token endpoint answered with a non-success status and no `OAuth2`
    /// error document.
    #[error("token endpoint returned HTTP {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body, possibly empty.
        body: String,
    },

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }

    /// True when the authorization server refused the grant or the client,
    /// as opposed to failing to answer.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        match self {
            Self::OAuth { error, .. } => matches!(
                error.as_str(),
                "invalid_grant" | "invalid_client" | "unauthorized_client" | "invalid_scope"
            ),
            Self::UnexpectedStatus { status, .. } => matches!(status, 400 | 401 | 403),
            Self::NoRefreshToken => true,
            _ => false,
        }
    }

    /// True when the request timed out before the server answered.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(Error::oauth_error("invalid_grant", "Token has been expired or revoked.").is_rejected());
        assert!(!Error::oauth_error("temporarily_unavailable", "").is_rejected());
        assert!(
            Error::UnexpectedStatus {
                status: 401,
                body: String::new()
            }
            .is_rejected()
        );
        assert!(
            !Error::UnexpectedStatus {
                status: 502,
                body: "Bad Gateway".to_string()
            }
            .is_rejected()
        );
        assert!(Error::NoRefreshToken.is_rejected());
    }

    #[test]
    fn test_display() {
        let err = Error::oauth_error("invalid_grant", "Bad Request");
        assert_eq!(err.to_string(), "OAuth2 error: invalid_grant - Bad Request");
    }
}
