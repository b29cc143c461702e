//! Stored accounts.
//!
//! Accounts and OAuth applications live in a local `SQLite` database. The
//! repository implements [`crate::credentials::CredentialStore`] so the
//! resolver can read from it.

mod model;
mod repository;
mod validation;

pub use model::{AccountId, StoredAccount};
pub use repository::AccountRepository;
pub use validation::{ValidationError, ValidationResult, validate_account};
