//! Process configuration.
//!
//! Everything comes from environment variables, optionally seeded from a
//! `.env` file. [`Settings::from_lookup`] takes the variable source as a
//! function so tests never touch the real environment.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::credentials::{Credentials, Defaults, ImapCredential, OAuthApp, OAuthCredential};
use crate::model::ProviderKind;
use crate::{Error, Result};

const DEFAULT_GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/";
const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0/";
const DEFAULT_MICROSOFT_REDIRECT_URI: &str = "http://localhost:7000/api/auth/microsoft/callback";
const DEFAULT_IMAP_PORT: u16 = 993;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved configuration for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Google OAuth application.
    pub google_app: Option<OAuthApp>,
    /// Microsoft OAuth application.
    pub microsoft_app: Option<OAuthApp>,
    /// Fallback Gmail refresh token.
    pub google_refresh_token: Option<String>,
    /// Fallback Microsoft refresh token.
    pub microsoft_refresh_token: Option<String>,
    /// Fallback IMAP account.
    pub imap: Option<ImapCredential>,
    /// Gmail REST base, ending in `/`.
    pub gmail_base_url: Url,
    /// Graph REST base, ending in `/`.
    pub graph_base_url: Url,
    /// Google token endpoint override.
    pub google_token_url: Option<String>,
    /// Microsoft token endpoint override.
    pub microsoft_token_url: Option<String>,
    /// Per-request bound for REST calls, token refresh included.
    pub http_timeout: Duration,
    /// IMAP connect and login bound.
    pub imap_connect_timeout: Duration,
    /// IMAP whole-operation bound.
    pub imap_operation_timeout: Duration,
    /// Account database location.
    pub database_path: Option<PathBuf>,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a variable is set but unusable.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable source. Empty values
    /// count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a variable is set but unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let google_app = oauth_app(
            var("GOOGLE_CLIENT_ID"),
            var("GOOGLE_CLIENT_SECRET"),
            var("GOOGLE_REDIRECT_URI"),
        );
        let microsoft_app = oauth_app(
            var("MICROSOFT_CLIENT_ID"),
            var("MICROSOFT_CLIENT_SECRET"),
            var("MICROSOFT_REDIRECT_URI").or_else(|| Some(DEFAULT_MICROSOFT_REDIRECT_URI.to_string())),
        );

        let imap = match (var("IMAP_HOST"), var("IMAP_USER"), var("IMAP_PASSWORD")) {
            (Some(host), Some(user), Some(password)) => Some(ImapCredential {
                host,
                port: parse_or("IMAP_PORT", var("IMAP_PORT"), DEFAULT_IMAP_PORT)?,
                user,
                password,
                use_tls: parse_flag("IMAP_TLS", var("IMAP_TLS"), true)?,
                accept_invalid_certs: parse_flag(
                    "IMAP_ACCEPT_INVALID_CERTS",
                    var("IMAP_ACCEPT_INVALID_CERTS"),
                    false,
                )?,
            }),
            _ => None,
        };

        let database_path = var("INBOXBRIDGE_DB")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("inboxbridge").join("accounts.db")));

        Ok(Self {
            google_app,
            microsoft_app,
            google_refresh_token: var("GOOGLE_REFRESH_TOKEN"),
            microsoft_refresh_token: var("MICROSOFT_REFRESH_TOKEN"),
            imap,
            gmail_base_url: base_url("GMAIL_API_BASE_URL", var("GMAIL_API_BASE_URL"), DEFAULT_GMAIL_BASE_URL)?,
            graph_base_url: base_url("GRAPH_API_BASE_URL", var("GRAPH_API_BASE_URL"), DEFAULT_GRAPH_BASE_URL)?,
            google_token_url: var("GOOGLE_TOKEN_URL"),
            microsoft_token_url: var("MICROSOFT_TOKEN_URL"),
            http_timeout: seconds("INBOXBRIDGE_HTTP_TIMEOUT_SECS", var("INBOXBRIDGE_HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT)?,
            imap_connect_timeout: seconds(
                "IMAP_CONNECT_TIMEOUT_SECS",
                var("IMAP_CONNECT_TIMEOUT_SECS"),
                inboxbridge_imap::ConfigBuilder::DEFAULT_CONNECT_TIMEOUT,
            )?,
            imap_operation_timeout: seconds(
                "IMAP_OPERATION_TIMEOUT_SECS",
                var("IMAP_OPERATION_TIMEOUT_SECS"),
                inboxbridge_imap::ConfigBuilder::DEFAULT_OPERATION_TIMEOUT,
            )?,
            database_path,
        })
    }

    /// The fallbacks handed to the credential resolver.
    #[must_use]
    pub fn defaults(&self) -> Defaults {
        let mut defaults = Defaults::new();
        if let Some(token) = &self.google_refresh_token {
            defaults = defaults.with_credentials(
                ProviderKind::Gmail,
                Credentials::OAuth(OAuthCredential::RefreshToken(token.clone())),
            );
        }
        if let Some(token) = &self.microsoft_refresh_token {
            defaults = defaults.with_credentials(
                ProviderKind::Microsoft,
                Credentials::OAuth(OAuthCredential::RefreshToken(token.clone())),
            );
        }
        if let Some(imap) = &self.imap {
            defaults = defaults.with_credentials(ProviderKind::Imap, Credentials::Imap(imap.clone()));
        }
        if let Some(app) = &self.google_app {
            defaults = defaults.with_app(ProviderKind::Gmail, app.clone());
        }
        if let Some(app) = &self.microsoft_app {
            defaults = defaults.with_app(ProviderKind::Microsoft, app.clone());
        }
        defaults
    }

    /// HTTP client shared by the REST adapters and token refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.http_timeout)
            .user_agent(concat!("inboxbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }
}

fn oauth_app(
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
) -> Option<OAuthApp> {
    Some(OAuthApp {
        client_id: client_id?,
        client_secret: client_secret?,
        redirect_uri: redirect_uri?,
    })
}

fn parse_or<T: std::str::FromStr>(name: &str, value: Option<String>, default: T) -> Result<T> {
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|_| Error::InvalidConfig(format!("{name}: cannot parse {v:?}")))
    })
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> Result<bool> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig(format!("{name}: expected a boolean, got {value:?}"))),
    }
}

fn seconds(name: &str, value: Option<String>, default: Duration) -> Result<Duration> {
    let secs: u64 = parse_or(name, value, default.as_secs())?;
    if secs == 0 {
        return Err(Error::InvalidConfig(format!("{name}: must be at least 1")));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a REST base URL, adding the trailing `/` that `Url::join` needs.
fn base_url(name: &str, value: Option<String>, default: &str) -> Result<Url> {
    let mut raw = value.unwrap_or_else(|| default.to_string());
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).map_err(|e| Error::InvalidConfig(format!("{name}: {e}")))
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
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_empty_environment() {
        let s = settings(&[]).unwrap();
        assert!(s.google_app.is_none());
        assert!(s.microsoft_app.is_none());
        assert!(s.imap.is_none());
        assert_eq!(s.gmail_base_url.as_str(), DEFAULT_GMAIL_BASE_URL);
        assert_eq!(s.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(s.imap_connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_imap_defaults() {
        let s = settings(&[
            ("IMAP_HOST", "imap.example.org"),
            ("IMAP_USER", "ada"),
            ("IMAP_PASSWORD", "pw"),
        ])
        .unwrap();
        let imap = s.imap.unwrap();
        assert_eq!(imap.port, 993);
        assert!(imap.use_tls);
        assert!(!imap.accept_invalid_certs);
    }

    #[test]
    fn test_imap_overrides() {
        let s = settings(&[
            ("IMAP_HOST", "localhost"),
            ("IMAP_USER", "ada"),
            ("IMAP_PASSWORD", "pw"),
            ("IMAP_PORT", "1143"),
            ("IMAP_TLS", "false"),
            ("IMAP_ACCEPT_INVALID_CERTS", "yes"),
        ])
        .unwrap();
        let imap = s.imap.unwrap();
        assert_eq!(imap.port, 1143);
        assert!(!imap.use_tls);
        assert!(imap.accept_invalid_certs);
    }

    #[test]
    fn test_partial_imap_is_ignored() {
        let s = settings(&[("IMAP_HOST", "imap.example.org"), ("IMAP_USER", "ada")]).unwrap();
        assert!(s.imap.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let base = [("IMAP_HOST", "h"), ("IMAP_USER", "u"), ("IMAP_PASSWORD", "p")];

        let mut vars = base.to_vec();
        vars.push(("IMAP_PORT", "imaps"));
        assert!(matches!(settings(&vars), Err(Error::InvalidConfig(m)) if m.contains("IMAP_PORT")));

        let mut vars = base.to_vec();
        vars.push(("IMAP_TLS", "maybe"));
        assert!(settings(&vars).is_err());

        assert!(settings(&[("INBOXBRIDGE_HTTP_TIMEOUT_SECS", "0")]).is_err());
        assert!(settings(&[("GMAIL_API_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_microsoft_redirect_has_default() {
        let s = settings(&[("MICROSOFT_CLIENT_ID", "id"), ("MICROSOFT_CLIENT_SECRET", "secret")]).unwrap();
        assert_eq!(
            s.microsoft_app.unwrap().redirect_uri,
            DEFAULT_MICROSOFT_REDIRECT_URI
        );

        let s = settings(&[("GOOGLE_CLIENT_ID", "id"), ("GOOGLE_CLIENT_SECRET", "secret")]).unwrap();
        assert!(s.google_app.is_none());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let s = settings(&[("GRAPH_API_BASE_URL", "http://127.0.0.1:8080/v1.0")]).unwrap();
        assert_eq!(s.graph_base_url.as_str(), "http://127.0.0.1:8080/v1.0/");
    }

    #[test]
    fn test_defaults_carry_fallbacks() {
        let s = settings(&[
            ("GOOGLE_REFRESH_TOKEN", "1//env"),
            ("GOOGLE_CLIENT_ID", "id"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_REDIRECT_URI", "http://localhost:7000/api/auth/gmail/callback"),
            ("DATABASE_URL", "ignored"),
        ])
        .unwrap();
        assert!(s.google_refresh_token.is_some());
        let debug = format!("{:?}", s.defaults());
        assert!(debug.contains("Gmail"));
        assert!(!debug.contains("1//env"));
        assert!(!debug.contains("secret\""));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let s = settings(&[("GOOGLE_REFRESH_TOKEN", "   ")]).unwrap();
        assert!(s.google_refresh_token.is_none());
    }

    #[test]
    fn test_database_override() {
        let s = settings(&[("INBOXBRIDGE_DB", "/tmp/ib.db")]).unwrap();
        assert_eq!(s.database_path, Some(PathBuf::from("/tmp/ib.db")));
    }
}
