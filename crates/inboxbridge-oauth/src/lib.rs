//! # inboxbridge-oauth
//!
//! `OAuth2` plumbing for the Gmail and Microsoft Graph mail APIs.
//!
//! Accounts store a long-lived refresh token. Before each API call the
//! refresh token is exchanged for a short-lived access token:
//!
//! ```ignore
//! use inboxbridge_oauth::{OAuthClient, Provider};
//!
//! let client = OAuthClient::new("client_id", Provider::google()?)
//!     .with_client_secret("client_secret");
//! let access_token = client.access_token(&stored_refresh_token).await?;
//! ```
//!
//! [`AuthorizationCodeFlow`] builds the consent URL and exchanges the code
//! from the redirect when an account is first connected.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{AuthorizationCodeFlow, OAuthClient};
pub use provider::Provider;
pub use token::Token;
