//! Provider adapters.
//!
//! Each adapter turns one provider's native shapes into [`MessageSummary`]
//! and [`MessageDetail`]. All of them are stateless: credentials arrive with
//! every call and nothing is cached between calls.

mod gmail;
mod graph;
mod imap;
mod rest;

use async_trait::async_trait;
use tracing::warn;

pub use gmail::GmailAdapter;
pub use graph::GraphAdapter;
pub use imap::ImapAdapter;

use crate::Result;
use crate::config::Settings;
use crate::credentials::{Credentials, OAuthApp};
use crate::model::{ConnectionTest, MessageDetail, MessageSummary, ProviderKind};

/// The operations every mail provider supports.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Up to `max` INBOX messages, newest first.
    async fn list(&self, credentials: &Credentials, max: u32) -> Result<Vec<MessageSummary>>;

    /// One message with its body.
    async fn detail(&self, credentials: &Credentials, id: &str) -> Result<MessageDetail>;

    /// Makes the cheapest authenticated call the provider offers.
    async fn verify(&self, credentials: &Credentials) -> Result<()>;

    /// [`Self::verify`] with the failure folded into the result.
    async fn test_connection(&self, credentials: &Credentials) -> ConnectionTest {
        let result = self.verify(credentials).await;
        if let Err(e) = &result {
            warn!(provider = %self.kind(), error = %e, kind = %e.kind(), "connection test failed");
        }
        result.into()
    }
}

/// Any of the supported adapters.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Gmail REST.
    Gmail(GmailAdapter),
    /// Microsoft Graph.
    Graph(GraphAdapter),
    /// Raw IMAP.
    Imap(ImapAdapter),
}

impl Provider {
    /// Builds the adapter for `kind` from process settings.
    ///
    /// `app` is the OAuth application used to exchange refresh tokens; it is
    /// ignored for IMAP.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if a token endpoint override
    /// is not a valid URL.
    pub fn for_kind(
        kind: ProviderKind,
        settings: &Settings,
        http: reqwest::Client,
        app: Option<OAuthApp>,
    ) -> Result<Self> {
        let oauth = oauth_endpoints(kind, settings)?;
        Ok(match (kind, oauth) {
            (ProviderKind::Gmail, Some(oauth)) => Self::Gmail(
                GmailAdapter::new(http, settings.gmail_base_url.clone(), oauth).with_app(app),
            ),
            (ProviderKind::Microsoft, Some(oauth)) => Self::Graph(
                GraphAdapter::new(http, settings.graph_base_url.clone(), oauth).with_app(app),
            ),
            _ => Self::Imap(ImapAdapter::new(
                settings.imap_connect_timeout,
                settings.imap_operation_timeout,
            )),
        })
    }

    fn adapter(&self) -> &dyn MailProvider {
        match self {
            Self::Gmail(adapter) => adapter,
            Self::Graph(adapter) => adapter,
            Self::Imap(adapter) => adapter,
        }
    }
}

/// OAuth endpoints for `kind`, with any token URL override from `settings`.
/// `None` for IMAP.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if the override is not a valid URL.
pub fn oauth_endpoints(
    kind: ProviderKind,
    settings: &Settings,
) -> Result<Option<inboxbridge_oauth::Provider>> {
    let (provider, token_url) = match kind {
        ProviderKind::Gmail => (
            inboxbridge_oauth::Provider::google()?,
            settings.google_token_url.as_deref(),
        ),
        ProviderKind::Microsoft => (
            inboxbridge_oauth::Provider::microsoft()?,
            settings.microsoft_token_url.as_deref(),
        ),
        ProviderKind::Imap => return Ok(None),
    };
    let provider = match token_url {
        Some(url) => provider
            .with_token_url(url)
            .map_err(|e| crate::Error::InvalidConfig(format!("token URL {url}: {e}")))?,
        None => provider,
    };
    Ok(Some(provider))
}

#[async_trait]
impl MailProvider for Provider {
    fn kind(&self) -> ProviderKind {
        self.adapter().kind()
    }

    async fn list(&self, credentials: &Credentials, max: u32) -> Result<Vec<MessageSummary>> {
        self.adapter().list(credentials, max).await
    }

    async fn detail(&self, credentials: &Credentials, id: &str) -> Result<MessageDetail> {
        self.adapter().detail(credentials, id).await
    }

    async fn verify(&self, credentials: &Credentials) -> Result<()> {
        self.adapter().verify(credentials).await
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

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|name| {
            vars.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_for_kind_builds_each_adapter() {
        let s = settings(&[]);
        for kind in ProviderKind::ALL {
            let provider = Provider::for_kind(kind, &s, reqwest::Client::new(), None).unwrap();
            assert_eq!(provider.kind(), kind);
        }
    }

    #[test]
    fn test_oauth_endpoints() {
        let s = settings(&[("MICROSOFT_TOKEN_URL", "http://127.0.0.1:9/token")]);
        assert!(oauth_endpoints(ProviderKind::Imap, &s).unwrap().is_none());
        let ms = oauth_endpoints(ProviderKind::Microsoft, &s).unwrap().unwrap();
        assert_eq!(ms.token_url.as_str(), "http://127.0.0.1:9/token");
        assert!(ms.scope_on_refresh());
    }

    #[test]
    fn test_bad_token_url_is_invalid_config() {
        let s = settings(&[("GOOGLE_TOKEN_URL", "not a url")]);
        let err = Provider::for_kind(ProviderKind::Gmail, &s, reqwest::Client::new(), None).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidConfig(_)));
    }
}
