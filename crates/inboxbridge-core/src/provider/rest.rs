//! Shared plumbing for the REST adapters: bearer tokens, endpoint URLs and
//! JSON responses.

use inboxbridge_oauth::OAuthClient;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::credentials::{Credentials, OAuthApp, OAuthCredential};
use crate::{Error, Result};

/// HTTP access to one REST mail API.
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    name: &'static str,
    http: reqwest::Client,
    base_url: Url,
    oauth: inboxbridge_oauth::Provider,
    app: Option<OAuthApp>,
}

impl RestClient {
    pub(crate) fn new(
        name: &'static str,
        http: reqwest::Client,
        base_url: Url,
        oauth: inboxbridge_oauth::Provider,
    ) -> Self {
        Self {
            name,
            http,
            base_url,
            oauth,
            app: None,
        }
    }

    pub(crate) fn with_app(mut self, app: Option<OAuthApp>) -> Self {
        self.app = app;
        self
    }

    pub(crate) const fn name(&self) -> &'static str {
        self.name
    }

    /// Bearer token for one call. Refresh tokens are exchanged every time.
    pub(crate) async fn access_token(&self, credentials: &Credentials) -> Result<String> {
        match credentials {
            Credentials::OAuth(OAuthCredential::AccessToken(token)) => Ok(token.clone()),
            Credentials::OAuth(OAuthCredential::RefreshToken(refresh_token)) => {
                let app = self.app.as_ref().ok_or_else(|| {
                    Error::ConfigurationMissing(format!("{} OAuth application", self.name))
                })?;
                debug!(provider = self.name, "exchanging refresh token");
                let client = OAuthClient::new(&app.client_id, self.oauth.clone())
                    .with_client_secret(&app.client_secret)
                    .with_redirect_uri(&app.redirect_uri)
                    .with_http_client(self.http.clone());
                Ok(client.access_token(refresh_token).await?)
            }
            other => Err(Error::CredentialMismatch {
                provider: self.name,
                given: other.kind_name(),
            }),
        }
    }

    /// Base URL extended by `segments`, each percent-encoded on its own.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidConfig(format!("{} base URL {}", self.name, self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GETs `url` and decodes the JSON body into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url, token: &str) -> Result<T> {
        debug!(provider = self.name, path = url.path(), "GET");
        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(self.name, status, &body));
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Both Gmail and Graph wrap failures as `{"error": {"message": ...}}`.
fn api_error(provider: &'static str, status: StatusCode, body: &[u8]) -> Error {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|error| error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Error::Api {
        provider,
        status: status.as_u16(),
        message,
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
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::credentials::ImapCredential;
    use crate::error::ErrorKind;

    fn client(base: &str) -> RestClient {
        RestClient::new(
            "Test",
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            inboxbridge_oauth::Provider::google().unwrap(),
        )
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let rest = client("https://api.example.com/v1/");
        let url = rest.endpoint(&["users", "me", "messages", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/me/messages/a%2Fb%20c");
    }

    #[test]
    fn test_api_error_uses_message() {
        let err = api_error(
            "Graph",
            StatusCode::NOT_FOUND,
            br#"{"error":{"code":"ErrorItemNotFound","message":"The specified object was not found in the store."}}"#,
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("not found in the store"));
    }

    #[test]
    fn test_api_error_without_json() {
        let err = api_error("Gmail", StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert!(matches!(err, Error::Api { status: 502, ref message, .. } if message == "Bad Gateway"));
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }

    #[tokio::test]
    async fn test_access_token_passthrough() {
        let rest = client("https://api.example.com/");
        let token = rest
            .access_token(&Credentials::OAuth(OAuthCredential::AccessToken("ya29.x".into())))
            .await
            .unwrap();
        assert_eq!(token, "ya29.x");
    }

    #[tokio::test]
    async fn test_refresh_without_app_is_configuration_missing() {
        let rest = client("https://api.example.com/");
        let err = rest
            .access_token(&Credentials::OAuth(OAuthCredential::RefreshToken("1//r".into())))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[tokio::test]
    async fn test_imap_credentials_are_rejected() {
        let rest = client("https://api.example.com/");
        let creds = Credentials::Imap(ImapCredential {
            host: "imap.example.com".into(),
            port: 993,
            user: "u".into(),
            password: "p".into(),
            use_tls: true,
            accept_invalid_certs: false,
        });
        let err = rest.access_token(&creds).await.unwrap_err();
        assert!(matches!(err, Error::CredentialMismatch { given: "IMAP", .. }));
    }

    #[tokio::test]
    async fn test_refresh_token_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let oauth = inboxbridge_oauth::Provider::google()
            .unwrap()
            .with_token_url(format!("{}/token", server.uri()))
            .unwrap();
        let rest = RestClient::new(
            "Gmail",
            reqwest::Client::new(),
            Url::parse("https://api.example.com/").unwrap(),
            oauth,
        )
        .with_app(Some(OAuthApp {
            client_id: "id".into(),
            client_secret: "secret".into(),
            redirect_uri: "http://localhost:7000/cb".into(),
        }));

        let token = rest
            .access_token(&Credentials::OAuth(OAuthCredential::RefreshToken("1//r".into())))
            .await
            .unwrap();
        assert_eq!(token, "fresh");
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .mount(&server)
            .await;

        let rest = client(&format!("{}/", server.uri()));
        let value: serde_json::Value = rest
            .get_json(rest.endpoint(&["me"]).unwrap(), "abc")
            .await
            .unwrap();
        assert_eq!(value["id"], "1");
    }

    #[tokio::test]
    async fn test_get_json_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let rest = client(&format!("{}/", server.uri()));
        let err = rest
            .get_json::<serde_json::Value>(rest.endpoint(&["me"]).unwrap(), "abc")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
