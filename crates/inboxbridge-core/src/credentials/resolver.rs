//! Store-then-defaults credential lookup.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Credentials, OAuthApp};
use crate::Result;
use crate::model::ProviderKind;

/// Read access to stored account credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Credentials of the account to use for `provider`, if one is stored.
    async fn credentials(&self, provider: ProviderKind) -> Result<Option<Credentials>>;

    /// OAuth application registered for `provider`, if one is stored.
    async fn oauth_app(&self, provider: ProviderKind) -> Result<Option<OAuthApp>>;
}

/// Process-level fallbacks, loaded once by the configuration layer.
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    credentials: HashMap<ProviderKind, Credentials>,
    apps: HashMap<ProviderKind, OAuthApp>,
}

impl Defaults {
    /// No fallbacks at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds fallback credentials for `provider`.
    #[must_use]
    pub fn with_credentials(mut self, provider: ProviderKind, credentials: Credentials) -> Self {
        self.credentials.insert(provider, credentials);
        self
    }

    /// Adds a fallback OAuth application for `provider`.
    #[must_use]
    pub fn with_app(mut self, provider: ProviderKind, app: OAuthApp) -> Self {
        self.apps.insert(provider, app);
        self
    }
}

/// Resolves credentials from the store first, then from [`Defaults`].
///
/// Store failures are logged and treated as "nothing stored", so a broken
/// store never hides the fallbacks. The resolver never writes.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Option<Arc<dyn CredentialStore>>,
    defaults: Defaults,
}

impl std::fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("store", &self.store.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl CredentialResolver {
    /// Resolver backed by `store` with `defaults` as fallback.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, defaults: Defaults) -> Self {
        Self {
            store: Some(store),
            defaults,
        }
    }

    /// Resolver with no store, for when none could be opened.
    #[must_use]
    pub const fn defaults_only(defaults: Defaults) -> Self {
        Self {
            store: None,
            defaults,
        }
    }

    /// Credentials for `provider`, or `None` when neither source has any.
    pub async fn resolve(&self, provider: ProviderKind) -> Option<Credentials> {
        if let Some(store) = &self.store {
            match store.credentials(provider).await {
                Ok(Some(credentials)) => {
                    debug!(%provider, source = "store", "resolved credentials");
                    return Some(credentials);
                }
                Ok(None) => {}
                Err(e) => warn!(%provider, error = %e, "credential store lookup failed"),
            }
        }

        let fallback = self.defaults.credentials.get(&provider).cloned();
        if fallback.is_some() {
            debug!(%provider, source = "defaults", "resolved credentials");
        } else {
            debug!(%provider, "no credentials");
        }
        fallback
    }

    /// OAuth application for `provider`, in the same order as [`Self::resolve`].
    pub async fn resolve_app(&self, provider: ProviderKind) -> Option<OAuthApp> {
        if let Some(store) = &self.store {
            match store.oauth_app(provider).await {
                Ok(Some(app)) => return Some(app),
                Ok(None) => {}
                Err(e) => warn!(%provider, error = %e, "OAuth app lookup failed"),
            }
        }
        self.defaults.apps.get(&provider).cloned()
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
    use crate::Error;
    use crate::credentials::OAuthCredential;

    struct FixedStore(Option<Credentials>);

    #[async_trait]
    impl CredentialStore for FixedStore {
        async fn credentials(&self, _provider: ProviderKind) -> Result<Option<Credentials>> {
            Ok(self.0.clone())
        }

        async fn oauth_app(&self, _provider: ProviderKind) -> Result<Option<OAuthApp>> {
            Ok(None)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn credentials(&self, _provider: ProviderKind) -> Result<Option<Credentials>> {
            Err(Error::Io(std::io::Error::other("database is locked")))
        }

        async fn oauth_app(&self, _provider: ProviderKind) -> Result<Option<OAuthApp>> {
            Err(Error::Io(std::io::Error::other("database is locked")))
        }
    }

    fn refresh(token: &str) -> Credentials {
        Credentials::OAuth(OAuthCredential::RefreshToken(token.to_string()))
    }

    fn app() -> OAuthApp {
        OAuthApp {
            client_id: "env-client".into(),
            client_secret: "env-secret".into(),
            redirect_uri: "http://localhost:7000/cb".into(),
        }
    }

    fn defaults() -> Defaults {
        Defaults::new()
            .with_credentials(ProviderKind::Gmail, refresh("from-env"))
            .with_app(ProviderKind::Gmail, app())
    }

    #[tokio::test]
    async fn test_store_wins_over_defaults() {
        let resolver =
            CredentialResolver::new(Arc::new(FixedStore(Some(refresh("from-store")))), defaults());
        assert_eq!(
            resolver.resolve(ProviderKind::Gmail).await,
            Some(refresh("from-store"))
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_defaults() {
        let resolver = CredentialResolver::new(Arc::new(FixedStore(None)), defaults());
        assert_eq!(
            resolver.resolve(ProviderKind::Gmail).await,
            Some(refresh("from-env"))
        );
        assert_eq!(resolver.resolve(ProviderKind::Microsoft).await, None);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_found() {
        let resolver = CredentialResolver::new(Arc::new(BrokenStore), defaults());
        assert_eq!(
            resolver.resolve(ProviderKind::Gmail).await,
            Some(refresh("from-env"))
        );
        assert_eq!(resolver.resolve_app(ProviderKind::Gmail).await, Some(app()));
        assert_eq!(resolver.resolve(ProviderKind::Imap).await, None);
    }

    #[tokio::test]
    async fn test_defaults_only() {
        let resolver = CredentialResolver::defaults_only(Defaults::new());
        assert_eq!(resolver.resolve(ProviderKind::Gmail).await, None);
        assert_eq!(resolver.resolve_app(ProviderKind::Gmail).await, None);
    }
}
