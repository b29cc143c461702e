//! Error types for the core library.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable credentials were resolved for the provider.
    #[error("No credentials configured for {0}")]
    ConfigurationMissing(String),

    /// A setting is present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Credentials were resolved for a different kind of provider.
    #[error("{provider} cannot use {given} credentials")]
    CredentialMismatch {
        /// Provider that received the credentials.
        provider: &'static str,
        /// Kind of credentials it was handed.
        given: &'static str,
    },

    /// The message id does not exist at the provider.
    #[error("Message not found: {0}")]
    NotFound(String),

    /// A REST API answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {message}")]
    Api {
        /// Provider name, for display.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// `error.message` from the response body, or the status reason.
        message: String,
    },

    /// A payload decoded but did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IMAP operation failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] inboxbridge_imap::Error),

    /// MIME parsing failed.
    #[error("MIME error: {0}")]
    Mime(#[from] inboxbridge_mime::Error),

    /// Token refresh failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] inboxbridge_oauth::Error),

    /// JSON decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// The distinguishable failure classes a caller can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// No usable credentials.
    ConfigurationMissing,
    /// The provider or IMAP server rejected the login.
    AuthenticationFailed,
    /// The message id or UID does not exist.
    NotFound,
    /// A connection or operation exceeded its bound.
    Timeout,
    /// A provider payload, MIME body or IMAP response could not be parsed.
    MalformedResponse,
    /// Socket or HTTP level failure.
    TransportError,
}

impl ErrorKind {
    /// Stable name, matching the serialized form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "ConfigurationMissing",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::MalformedResponse => "MalformedResponse",
            Self::TransportError => "TransportError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing(_) | Self::InvalidConfig(_) | Self::CredentialMismatch { .. } => {
                ErrorKind::ConfigurationMissing
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Api { status, .. } => status_kind(*status),
            Self::Malformed(_) | Self::Mime(_) | Self::Json(_) => ErrorKind::MalformedResponse,
            Self::Http(e) => http_kind(e),
            Self::Imap(e) => imap_kind(e),
            Self::OAuth(e) => oauth_kind(e),
            Self::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
            Self::Database(_) | Self::Io(_) => ErrorKind::TransportError,
        }
    }
}

const fn status_kind(status: u16) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::AuthenticationFailed,
        404 => ErrorKind::NotFound,
        408 | 504 => ErrorKind::Timeout,
        _ => ErrorKind::TransportError,
    }
}

fn http_kind(error: &reqwest::Error) -> ErrorKind {
    if error.is_timeout() {
        ErrorKind::Timeout
    } else if error.is_decode() {
        ErrorKind::MalformedResponse
    } else if let Some(status) = error.status() {
        status_kind(status.as_u16())
    } else {
        ErrorKind::TransportError
    }
}

fn imap_kind(error: &inboxbridge_imap::Error) -> ErrorKind {
    use inboxbridge_imap::Error as Imap;
    match error {
        Imap::Auth(_) => ErrorKind::AuthenticationFailed,
        Imap::NotFound(_) => ErrorKind::NotFound,
        Imap::Timeout(_) => ErrorKind::Timeout,
        Imap::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => ErrorKind::Timeout,
        Imap::Parse { .. } | Imap::Protocol(_) => ErrorKind::MalformedResponse,
        Imap::Io(_)
        | Imap::Tls(_)
        | Imap::InvalidDnsName(_)
        | Imap::No(_)
        | Imap::Bad(_)
        | Imap::Bye(_) => ErrorKind::TransportError,
    }
}

fn oauth_kind(error: &inboxbridge_oauth::Error) -> ErrorKind {
    if error.is_rejected() {
        ErrorKind::AuthenticationFailed
    } else if error.is_timeout() {
        ErrorKind::Timeout
    } else if matches!(error, inboxbridge_oauth::Error::Json(_)) {
        ErrorKind::MalformedResponse
    } else if matches!(error, inboxbridge_oauth::Error::InvalidConfig(_)) {
        ErrorKind::ConfigurationMissing
    } else {
        ErrorKind::TransportError
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
    use std::time::Duration;

    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            provider: "Gmail",
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_http_status_kinds() {
        assert_eq!(api(401).kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(api(403).kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(api(404).kind(), ErrorKind::NotFound);
        assert_eq!(api(500).kind(), ErrorKind::TransportError);
    }

    #[test]
    fn test_imap_kinds() {
        let login = Error::from(inboxbridge_imap::Error::Auth("Invalid credentials".into()));
        assert_eq!(login.kind(), ErrorKind::AuthenticationFailed);

        let examine = Error::from(inboxbridge_imap::Error::No("no such mailbox".into()));
        assert_eq!(examine.kind(), ErrorKind::TransportError);

        let timeout = Error::from(inboxbridge_imap::Error::Timeout(Duration::from_secs(15)));
        assert_eq!(timeout.kind(), ErrorKind::Timeout);

        let parse = Error::from(inboxbridge_imap::Error::Parse {
            position: 3,
            message: "expected SP".into(),
        });
        assert_eq!(parse.kind(), ErrorKind::MalformedResponse);

        let refused = Error::from(inboxbridge_imap::Error::Io(std::io::Error::from(
            std::io::ErrorKind::ConnectionRefused,
        )));
        assert_eq!(refused.kind(), ErrorKind::TransportError);
    }

    #[test]
    fn test_oauth_kinds() {
        let revoked = Error::from(inboxbridge_oauth::Error::oauth_error("invalid_grant", "revoked"));
        assert_eq!(revoked.kind(), ErrorKind::AuthenticationFailed);

        let down = Error::from(inboxbridge_oauth::Error::UnexpectedStatus {
            status: 503,
            body: String::new(),
        });
        assert_eq!(down.kind(), ErrorKind::TransportError);
    }

    #[test]
    fn test_parse_failures_are_malformed() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(json).kind(), ErrorKind::MalformedResponse);
        assert_eq!(
            Error::from(inboxbridge_mime::Error::MissingBoundary).kind(),
            ErrorKind::MalformedResponse
        );
    }

    #[test]
    fn test_configuration_kinds() {
        assert_eq!(
            Error::ConfigurationMissing("gmail".into()).kind(),
            ErrorKind::ConfigurationMissing
        );
        let mismatch = Error::CredentialMismatch {
            provider: "IMAP",
            given: "OAuth",
        };
        assert_eq!(mismatch.kind(), ErrorKind::ConfigurationMissing);
        assert_eq!(mismatch.to_string(), "IMAP cannot use OAuth credentials");
    }

    #[test]
    fn test_kind_serializes_by_name() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::AuthenticationFailed).unwrap(),
            "\"AuthenticationFailed\""
        );
        assert_eq!(ErrorKind::Timeout.to_string(), "Timeout");
    }
}
