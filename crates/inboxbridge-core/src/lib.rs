//! # inboxbridge-core
//!
//! Reads the INBOX of a Gmail, Microsoft Graph or IMAP account and returns
//! the messages in one normalized shape.
//!
//! This crate provides:
//! - **Credential resolution**: stored accounts first, environment fallbacks second
//! - **Provider adapters**: Gmail REST, Microsoft Graph and IMAP behind [`MailProvider`]
//! - **Normalized model**: [`MessageSummary`], [`MessageDetail`], [`ConnectionTest`]
//! - **Account storage**: `SQLite` accounts and OAuth applications
//! - **Error classification**: every failure maps to an [`ErrorKind`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use inboxbridge_core::{CredentialResolver, ProviderKind, Settings, provider::Provider, service};
//!
//! let settings = Settings::from_env()?;
//! let resolver = CredentialResolver::defaults_only(settings.defaults());
//! let creds = service::credentials_for(&resolver, ProviderKind::Imap).await?;
//! let imap = Provider::for_kind(ProviderKind::Imap, &settings, settings.http_client()?, None)?;
//! for message in service::list_messages(&imap, &creds, 25).await? {
//!     println!("{} {}", message.from, message.subject);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod credentials;
mod error;
pub mod model;
pub mod provider;
pub mod service;

pub use account::{
    AccountId, AccountRepository, StoredAccount, ValidationError, ValidationResult,
    validate_account,
};
pub use config::Settings;
pub use credentials::{
    CredentialResolver, CredentialStore, Credentials, Defaults, ImapCredential, OAuthApp,
    OAuthCredential,
};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    ConnectionTest, InboxSummary, MessageDetail, MessageSummary, NO_SUBJECT, ProviderKind,
    UNKNOWN_SENDER,
};
pub use provider::{GmailAdapter, GraphAdapter, ImapAdapter, MailProvider, Provider};
