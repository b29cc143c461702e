//! Credentials and their resolution.
//!
//! Credentials are resolved per call and never cached. Every type here
//! redacts its secrets in `Debug` output.

mod resolver;

use std::fmt;

pub use resolver::{CredentialResolver, CredentialStore, Defaults};

/// OAuth material for the REST providers.
#[derive(Clone, PartialEq, Eq)]
pub enum OAuthCredential {
    /// A ready-to-use bearer token.
    AccessToken(String),
    /// A long-lived token that must be exchanged before each call.
    RefreshToken(String),
}

impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken([redacted])"),
            Self::RefreshToken(_) => f.write_str("RefreshToken([redacted])"),
        }
    }
}

/// Login for a raw IMAP server.
#[derive(Clone, PartialEq, Eq)]
pub struct ImapCredential {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// LOGIN username.
    pub user: String,
    /// LOGIN password.
    pub password: String,
    /// Implicit TLS when true, plaintext otherwise.
    pub use_tls: bool,
    /// Skip certificate validation. Weakens TLS to encryption without
    /// server authentication.
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for ImapCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImapCredential")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[redacted]")
            .field("use_tls", &self.use_tls)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Credentials for one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Gmail or Microsoft Graph.
    OAuth(OAuthCredential),
    /// Raw IMAP.
    Imap(ImapCredential),
}

impl Credentials {
    /// Short name of the credential kind, for messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::OAuth(_) => "OAuth",
            Self::Imap(_) => "IMAP",
        }
    }
}

/// A registered OAuth application: what is needed to refresh tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthApp {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
}

impl fmt::Debug for OAuthApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthApp")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
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
    fn test_debug_never_shows_secrets() {
        let creds = [
            Credentials::OAuth(OAuthCredential::RefreshToken("1//0gSecret".into())),
            Credentials::OAuth(OAuthCredential::AccessToken("ya29.Secret".into())),
            Credentials::Imap(ImapCredential {
                host: "imap.example.org".into(),
                port: 993,
                user: "ada".into(),
                password: "Secret-pw".into(),
                use_tls: true,
                accept_invalid_certs: false,
            }),
        ];
        for c in &creds {
            assert!(!format!("{c:?}").contains("Secret"), "{c:?}");
        }

        let app = OAuthApp {
            client_id: "id.apps.googleusercontent.com".into(),
            client_secret: "GOCSPX-Secret".into(),
            redirect_uri: "http://localhost:7000/api/auth/gmail/callback".into(),
        };
        let shown = format!("{app:?}");
        assert!(shown.contains("id.apps"));
        assert!(!shown.contains("Secret"));
    }
}
