//! Authorization Code Flow implementation.

use super::OAuthClient;
use crate::error::Result;
use crate::token::Token;
use url::Url;

/// Authorization Code Flow for `OAuth2`.
///
/// Used once per account to obtain the refresh token that is stored and
/// later exchanged by [`OAuthClient::access_token`].
#[derive(Debug)]
pub struct AuthorizationCodeFlow {
    client: OAuthClient,
}

impl AuthorizationCodeFlow {
    /// Creates a new authorization code flow.
    #[must_use]
    pub const fn new(client: OAuthClient) -> Self {
        Self { client }
    }

    /// Builds the authorization URL for user consent.
    ///
    /// Both providers are asked for consent every time, which is what makes
    /// them hand out a refresh token on each authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be constructed.
    pub fn authorization_url(&self, scopes: Option<&[String]>, state: Option<&str>) -> Result<Url> {
        let provider = &self.client.provider;
        provider.validate()?;
        let mut url = provider.auth_url.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.client.client_id)
                .append_pair("response_type", "code");

            if let Some(redirect_uri) = &self.client.redirect_uri {
                pairs.append_pair("redirect_uri", redirect_uri);
            }

            let scope_str = scopes.map_or_else(|| provider.default_scopes.join(" "), |s| s.join(" "));
            if !scope_str.is_empty() {
                pairs.append_pair("scope", &scope_str);
            }

            if let Some(state_val) = state {
                pairs.append_pair("state", state_val);
            }

            match provider.name.as_str() {
                "Google" => {
                    pairs
                        .append_pair("access_type", "offline")
                        .append_pair("prompt", "consent");
                }
                "Microsoft" => {
                    pairs.append_pair("prompt", "consent");
                }
                _ => {}
            }
        }

        Ok(url)
    }

    /// Exchanges the authorization code from the redirect for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(&self, code: &str, redirect_uri: Option<&str>) -> Result<Token> {
        self.client.exchange_code(code, redirect_uri).await
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
    use crate::provider::Provider;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_authorization_url() {
        let provider = Provider::google().unwrap();
        let client =
            OAuthClient::new("test_client", provider).with_redirect_uri("http://localhost:7000/cb");

        let flow = AuthorizationCodeFlow::new(client);
        let url = flow.authorization_url(None, Some("random_state")).unwrap();

        assert!(url.as_str().contains("client_id=test_client"));
        assert!(url.as_str().contains("response_type=code"));
        assert!(url.as_str().contains("state=random_state"));
        assert!(url.as_str().contains("redirect_uri=http%3A%2F%2Flocalhost%3A7000%2Fcb"));
        assert!(url.as_str().contains("gmail.readonly"));
    }

    #[test]
    fn test_authorization_url_custom_scopes() {
        let provider = Provider::google().unwrap();
        let client = OAuthClient::new("test_client", provider);

        let flow = AuthorizationCodeFlow::new(client);
        let scopes = vec!["email".to_string(), "profile".to_string()];
        let url = flow.authorization_url(Some(&scopes), None).unwrap();

        assert!(url.as_str().contains("scope=email+profile"));
    }

    #[test]
    fn test_provider_specific_params() {
        let google = AuthorizationCodeFlow::new(OAuthClient::new("id", Provider::google().unwrap()))
            .authorization_url(None, None)
            .unwrap();
        assert!(google.as_str().contains("access_type=offline"));
        assert!(google.as_str().contains("prompt=consent"));

        let microsoft =
            AuthorizationCodeFlow::new(OAuthClient::new("id", Provider::microsoft().unwrap()))
                .authorization_url(None, None)
                .unwrap();
        assert!(microsoft.as_str().contains("prompt=consent"));
        assert!(!microsoft.as_str().contains("access_type"));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=4%2F0Ab"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "first-access",
                "token_type": "Bearer",
                "expires_in": 3599,
                "refresh_token": "long-lived"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = Provider::microsoft()
            .unwrap()
            .with_token_url(format!("{}/token", server.uri()))
            .unwrap();
        let client = OAuthClient::new("id", provider).with_redirect_uri("http://localhost:7000/cb");
        let token = AuthorizationCodeFlow::new(client)
            .exchange_code("4/0Ab", None)
            .await
            .unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("long-lived"));
    }
}
