//! `OAuth2` client and the authorization code flow.

mod code;

pub use code::AuthorizationCodeFlow;

use std::fmt;

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::{Client, Response};
use tracing::{debug, warn};

/// Registered `OAuth2` application for one provider.
#[derive(Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[redacted]"))
            .field("redirect_uri", &self.redirect_uri)
            .field("provider", &self.provider.name)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Uses a preconfigured HTTP client, typically one with a request
    /// timeout shared with the mail API calls.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// The returned token keeps the old refresh token when the server does
    /// not rotate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        let scope = self.provider.default_scopes.join(" ");
        if self.provider.scope_on_refresh() && !scope.is_empty() {
            params.push(("scope", scope.as_str()));
        }

        debug!(provider = %self.provider.name, "refreshing access token");
        let mut new_token = self.post_token_request(&params).await?;

        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }

        Ok(new_token)
    }

    /// Exchanges a stored refresh token for a fresh access token string.
    ///
    /// # Errors
    ///
    /// Same as [`OAuthClient::refresh_token`].
    pub async fn access_token(&self, refresh_token: &str) -> Result<String> {
        let token = self
            .refresh_token(&Token::from_refresh_token(refresh_token))
            .await?;
        Ok(token.access_token)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<Token> {
        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
        ];

        if let Some(uri) = redirect_uri.or(self.redirect_uri.as_deref()) {
            params.push(("redirect_uri", uri));
        }

        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        self.post_token_request(&params).await
    }

    async fn post_token_request(&self, params: &[(&str, &str)]) -> Result<Token> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let token_response: TokenResponse = serde_json::from_slice(&response.bytes().await?)?;
        Token::from_response(token_response)
    }
}

/// Reads an error document from a failed token request. Falls back to the
/// bare status when the body is not an `OAuth2` error.
async fn error_from_response(response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => {
            warn!(status, error = %error.error, "token request rejected");
            error.into_error()
        }
        Err(_) => {
            warn!(status, "token request failed");
            Error::UnexpectedStatus { status, body }
        }
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
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer, provider: Provider) -> OAuthClient {
        let provider = provider
            .with_token_url(format!("{}/token", server.uri()))
            .unwrap();
        OAuthClient::new("client-123", provider).with_client_secret("shh")
    }

    #[test]
    fn test_oauth_client_with_secret() {
        let provider = Provider::google().unwrap();
        let client = OAuthClient::new("test_client_id", provider)
            .with_client_secret("secret")
            .with_redirect_uri("http://localhost:7000/api/auth/gmail/callback");

        assert_eq!(client.client_secret.as_deref(), Some("secret"));
        assert!(!format!("{client:?}").contains("secret\""));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=stored-refresh"))
            .and(body_string_contains("client_secret=shh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-access",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::google().unwrap()).await;
        let token = client
            .refresh_token(&Token::from_refresh_token("stored-refresh"))
            .await
            .unwrap();

        assert_eq!(token.access_token, "fresh-access");
        assert_eq!(token.refresh_token.as_deref(), Some("stored-refresh"));
    }

    #[tokio::test]
    async fn test_microsoft_refresh_sends_scope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("offline_access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "graph-access",
                "token_type": "Bearer",
                "refresh_token": "rotated"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::microsoft().unwrap()).await;
        let token = client
            .refresh_token(&Token::from_refresh_token("old"))
            .await
            .unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
    }

    #[tokio::test]
    async fn test_invalid_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::google().unwrap()).await;
        let err = client.access_token("revoked").await.unwrap_err();
        assert!(err.is_rejected());
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
    }

    #[tokio::test]
    async fn test_non_json_failure_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = client_for(&server, Provider::google().unwrap()).await;
        let err = client.access_token("anything").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus { status: 503, ref body } if body == "upstream down"
        ));
        assert!(!err.is_rejected());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_request() {
        let server = MockServer::start().await;
        let client = client_for(&server, Provider::google().unwrap()).await;
        let err = client
            .refresh_token(&Token::new("access", "Bearer"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoRefreshToken));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
