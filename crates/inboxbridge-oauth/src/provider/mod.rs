//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

/// Gmail read access plus the profile scopes used to label the account.
const GOOGLE_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Graph mail scopes. `offline_access` is what makes the server issue a
/// refresh token.
const MICROSOFT_SCOPES: [&str; 3] = [
    "https://graph.microsoft.com/Mail.Read",
    "https://graph.microsoft.com/Mail.ReadWrite",
    "offline_access",
];

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Replaces the token endpoint, e.g. to point at a local stub server.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_token_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.token_url = Url::parse(url.as_ref())?;
        Ok(self)
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google `OAuth2` provider configuration for the Gmail REST API.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new(
            "Google",
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )?
        .with_default_scopes(GOOGLE_SCOPES.map(String::from).to_vec()))
    }

    /// Microsoft identity platform configuration for Graph mail, using the
    /// multi-tenant `common` authority.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn microsoft() -> Result<Self> {
        Ok(Self::new(
            "Microsoft",
            "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            "https://login.microsoftonline.com/common/oauth2/v2.0/token",
        )?
        .with_default_scopes(MICROSOFT_SCOPES.map(String::from).to_vec()))
    }

    /// Whether the token endpoint expects `scope` on a refresh grant.
    #[must_use]
    pub fn scope_on_refresh(&self) -> bool {
        self.name == "Microsoft"
    }

    /// Validates that required URLs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.token_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "token_url is not a usable endpoint: {}",
                self.token_url
            )));
        }
        if self.auth_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "auth_url is not a usable endpoint: {}",
                self.auth_url
            )));
        }
        Ok(())
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
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(
            provider.default_scopes[0],
            "https://www.googleapis.com/auth/gmail.readonly"
        );
        assert!(!provider.scope_on_refresh());
        provider.validate().unwrap();
    }

    #[test]
    fn test_microsoft_provider() {
        let provider = Provider::microsoft().unwrap();
        assert_eq!(provider.name, "Microsoft");
        assert_eq!(provider.default_scopes.len(), 3);
        assert!(provider.default_scopes.contains(&"offline_access".to_string()));
        assert!(provider.scope_on_refresh());
        provider.validate().unwrap();
    }

    #[test]
    fn test_token_url_override() {
        let provider = Provider::google()
            .unwrap()
            .with_token_url("http://127.0.0.1:9999/token")
            .unwrap();
        assert_eq!(provider.token_url.as_str(), "http://127.0.0.1:9999/token");
        assert!(Provider::google().unwrap().with_token_url("not a url").is_err());
    }

    #[test]
    fn test_validate_rejects_opaque_url() {
        let provider = Provider::new(
            "Custom",
            "https://auth.example.com/authorize",
            "mailto:tokens@example.com",
        )
        .unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}
