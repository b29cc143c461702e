//! Account model types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credentials::{Credentials, ImapCredential, OAuthCredential};
use crate::model::ProviderKind;

/// Unique identifier for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl AccountId {
    /// Create a new account ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected mailbox as stored in the account database.
#[derive(Clone)]
pub struct StoredAccount {
    /// Database ID (None for unsaved accounts).
    pub id: Option<AccountId>,
    /// Backend the account belongs to.
    pub provider: ProviderKind,
    /// Mailbox address.
    pub email: String,
    /// Display label.
    pub label: String,
    /// Inactive accounts are never resolved.
    pub is_active: bool,
    /// Preferred account for its provider.
    pub is_primary: bool,
    /// Refresh token, for Gmail and Microsoft accounts.
    pub oauth_refresh_token: Option<String>,
    /// Server login, for IMAP accounts.
    pub imap: Option<ImapCredential>,
}

impl fmt::Debug for StoredAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredAccount")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("email", &self.email)
            .field("label", &self.label)
            .field("is_active", &self.is_active)
            .field("is_primary", &self.is_primary)
            .field(
                "oauth_refresh_token",
                &self.oauth_refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("imap", &self.imap)
            .finish()
    }
}

impl StoredAccount {
    /// An active OAuth account, labelled with its address.
    #[must_use]
    pub fn oauth(
        provider: ProviderKind,
        email: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        let email = email.into();
        Self {
            id: None,
            provider,
            label: email.clone(),
            email,
            is_active: true,
            is_primary: false,
            oauth_refresh_token: Some(refresh_token.into()),
            imap: None,
        }
    }

    /// An active IMAP account, labelled with its address.
    #[must_use]
    pub fn imap(email: impl Into<String>, login: ImapCredential) -> Self {
        let email = email.into();
        Self {
            id: None,
            provider: ProviderKind::Imap,
            label: email.clone(),
            email,
            is_active: true,
            is_primary: false,
            oauth_refresh_token: None,
            imap: Some(login),
        }
    }

    /// Marks the account as the primary one for its provider.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// The credentials this account provides, if it is complete.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        if self.provider.uses_oauth() {
            self.oauth_refresh_token
                .as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| Credentials::OAuth(OAuthCredential::RefreshToken(t.clone())))
        } else {
            self.imap.clone().map(Credentials::Imap)
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

    fn login() -> ImapCredential {
        ImapCredential {
            host: "imap.fastmail.com".into(),
            port: 993,
            user: "ada@fastmail.com".into(),
            password: "app-password".into(),
            use_tls: true,
            accept_invalid_certs: false,
        }
    }

    #[test]
    fn test_oauth_account_credentials() {
        let account = StoredAccount::oauth(ProviderKind::Gmail, "ada@gmail.com", "1//refresh");
        assert_eq!(account.label, "ada@gmail.com");
        assert_eq!(
            account.credentials(),
            Some(Credentials::OAuth(OAuthCredential::RefreshToken(
                "1//refresh".into()
            )))
        );

        let empty = StoredAccount::oauth(ProviderKind::Microsoft, "ada@outlook.com", "");
        assert_eq!(empty.credentials(), None);
    }

    #[test]
    fn test_imap_account_credentials() {
        let account = StoredAccount::imap("ada@fastmail.com", login());
        assert_eq!(account.credentials(), Some(Credentials::Imap(login())));
    }

    #[test]
    fn test_debug_redacts_refresh_token() {
        let account = StoredAccount::oauth(ProviderKind::Gmail, "ada@gmail.com", "1//refresh");
        assert!(!format!("{account:?}").contains("1//refresh"));
    }
}
