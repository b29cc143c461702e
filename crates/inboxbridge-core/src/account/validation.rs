//! Account validation.

use super::model::StoredAccount;

/// Validation error for account configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// OAuth account without a refresh token.
    MissingRefreshToken,
    /// IMAP account without server settings.
    MissingImapSettings,
    /// IMAP host is empty.
    EmptyImapHost,
    /// IMAP port is invalid.
    InvalidImapPort,
    /// IMAP username is empty.
    EmptyImapUsername,
    /// IMAP password is empty.
    EmptyImapPassword,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::MissingRefreshToken => "OAuth accounts need a refresh token",
            Self::MissingImapSettings => "IMAP accounts need server settings",
            Self::EmptyImapHost => "IMAP server is required",
            Self::InvalidImapPort => "IMAP port must be 1-65535",
            Self::EmptyImapUsername => "IMAP username is required",
            Self::EmptyImapPassword => "IMAP password is required",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::MissingRefreshToken => "oauth_refresh_token",
            Self::MissingImapSettings => "imap",
            Self::EmptyImapHost => "imap_host",
            Self::InvalidImapPort => "imap_port",
            Self::EmptyImapUsername => "imap_username",
            Self::EmptyImapPassword => "imap_password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating an account.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate an account before it is stored.
///
/// # Errors
///
/// Returns every problem found, not just the first.
pub fn validate_account(account: &StoredAccount) -> ValidationResult {
    let mut errors = Vec::new();

    if account.email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(&account.email) {
        errors.push(ValidationError::InvalidEmail);
    }

    if account.provider.uses_oauth() {
        if account.oauth_refresh_token.as_deref().is_none_or(str::is_empty) {
            errors.push(ValidationError::MissingRefreshToken);
        }
    } else if let Some(imap) = &account.imap {
        if imap.host.trim().is_empty() {
            errors.push(ValidationError::EmptyImapHost);
        }
        if imap.port == 0 {
            errors.push(ValidationError::InvalidImapPort);
        }
        if imap.user.trim().is_empty() {
            errors.push(ValidationError::EmptyImapUsername);
        }
        if imap.password.is_empty() {
            errors.push(ValidationError::EmptyImapPassword);
        }
    } else {
        errors.push(ValidationError::MissingImapSettings);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Basic shape check: one `@`, something before it, a dot after it.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.trim().split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
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
    use crate::credentials::ImapCredential;
    use crate::model::ProviderKind;

    #[test]
    fn test_valid_accounts() {
        let gmail = StoredAccount::oauth(ProviderKind::Gmail, "ada@gmail.com", "1//r");
        assert!(validate_account(&gmail).is_ok());

        let imap = StoredAccount::imap(
            "ada@example.org",
            ImapCredential {
                host: "mail.example.org".into(),
                port: 993,
                user: "ada".into(),
                password: "pw".into(),
                use_tls: true,
                accept_invalid_certs: false,
            },
        );
        assert!(validate_account(&imap).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut account = StoredAccount::imap(
            "not-an-address",
            ImapCredential {
                host: " ".into(),
                port: 0,
                user: String::new(),
                password: String::new(),
                use_tls: true,
                accept_invalid_certs: false,
            },
        );
        let errors = validate_account(&account).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEmail,
                ValidationError::EmptyImapHost,
                ValidationError::InvalidImapPort,
                ValidationError::EmptyImapUsername,
                ValidationError::EmptyImapPassword,
            ]
        );

        account.imap = None;
        account.email = "ada@example.org".into();
        assert_eq!(
            validate_account(&account).unwrap_err(),
            vec![ValidationError::MissingImapSettings]
        );
    }

    #[test]
    fn test_oauth_needs_refresh_token() {
        let account = StoredAccount::oauth(ProviderKind::Microsoft, "ada@outlook.com", "");
        let errors = validate_account(&account).unwrap_err();
        assert_eq!(errors, vec![ValidationError::MissingRefreshToken]);
        assert_eq!(errors[0].field(), "oauth_refresh_token");
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a@b.co."));
    }
}
