//! Account storage repository.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::debug;

use super::model::{AccountId, StoredAccount};
use super::validation::validate_account;
use crate::credentials::{CredentialStore, Credentials, ImapCredential, OAuthApp};
use crate::model::ProviderKind;
use crate::{Error, Result};

const ACCOUNT_COLUMNS: &str = "id, provider, email, label, is_active, is_primary, \
     oauth_refresh_token, imap_host, imap_port, imap_username, imap_password_encoded, \
     imap_use_tls, imap_accept_invalid_certs";

/// Repository for account storage and retrieval.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Opens the database at `database_path`, creating the file, its parent
    /// directory and the tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        debug!(path = %database_path.display(), "account database ready");
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                provider TEXT NOT NULL,
                email TEXT NOT NULL,
                label TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_primary INTEGER NOT NULL DEFAULT 0,
                oauth_refresh_token TEXT,
                imap_host TEXT,
                imap_port INTEGER,
                imap_username TEXT,
                imap_password_encoded TEXT,
                imap_use_tls INTEGER NOT NULL DEFAULT 1,
                imap_accept_invalid_certs INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (provider, email)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS oauth_credentials (
                provider TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                client_secret TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get all accounts, primary accounts first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<StoredAccount>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM email_accounts ORDER BY is_primary DESC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// Get account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: AccountId) -> Result<Option<StoredAccount>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM email_accounts WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// The account to use for `provider`: the active primary one, else the
    /// oldest active one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn account_for(&self, provider: ProviderKind) -> Result<Option<StoredAccount>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM email_accounts \
             WHERE provider = ? AND is_active = 1 \
             ORDER BY is_primary DESC, id ASC LIMIT 1"
        ))
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Save an account (insert or update).
    ///
    /// Saving a primary account clears the flag on the provider's other
    /// accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the database query fails.
    pub async fn save(&self, account: &mut StoredAccount) -> Result<()> {
        validate_account(account).map_err(|errors| {
            let messages: Vec<&str> = errors.iter().map(|e| e.message()).collect();
            Error::InvalidConfig(messages.join("; "))
        })?;

        let imap = account.imap.as_ref();
        let encoded_password = imap.map(|i| STANDARD.encode(&i.password));

        if let Some(id) = account.id {
            sqlx::query(
                r"
                UPDATE email_accounts SET
                    provider = ?, email = ?, label = ?, is_active = ?, is_primary = ?,
                    oauth_refresh_token = ?,
                    imap_host = ?, imap_port = ?, imap_username = ?, imap_password_encoded = ?,
                    imap_use_tls = ?, imap_accept_invalid_certs = ?,
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = ?
                ",
            )
            .bind(account.provider.as_str())
            .bind(&account.email)
            .bind(&account.label)
            .bind(account.is_active)
            .bind(account.is_primary)
            .bind(&account.oauth_refresh_token)
            .bind(imap.map(|i| i.host.clone()))
            .bind(imap.map(|i| i64::from(i.port)))
            .bind(imap.map(|i| i.user.clone()))
            .bind(&encoded_password)
            .bind(imap.is_none_or(|i| i.use_tls))
            .bind(imap.is_some_and(|i| i.accept_invalid_certs))
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        } else {
            let result = sqlx::query(
                r"
                INSERT INTO email_accounts (
                    provider, email, label, is_active, is_primary,
                    oauth_refresh_token,
                    imap_host, imap_port, imap_username, imap_password_encoded,
                    imap_use_tls, imap_accept_invalid_certs
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(account.provider.as_str())
            .bind(&account.email)
            .bind(&account.label)
            .bind(account.is_active)
            .bind(account.is_primary)
            .bind(&account.oauth_refresh_token)
            .bind(imap.map(|i| i.host.clone()))
            .bind(imap.map(|i| i64::from(i.port)))
            .bind(imap.map(|i| i.user.clone()))
            .bind(&encoded_password)
            .bind(imap.is_none_or(|i| i.use_tls))
            .bind(imap.is_some_and(|i| i.accept_invalid_certs))
            .execute(&self.pool)
            .await?;

            account.id = Some(AccountId::new(result.last_insert_rowid()));
        }

        if account.is_primary
            && let Some(id) = account.id
        {
            sqlx::query("UPDATE email_accounts SET is_primary = 0 WHERE provider = ? AND id != ?")
                .bind(account.provider.as_str())
                .bind(id.0)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, id: AccountId) -> Result<()> {
        sqlx::query("DELETE FROM email_accounts WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stores the OAuth application for `provider`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn save_oauth_app(&self, provider: ProviderKind, app: &OAuthApp) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO oauth_credentials (provider, client_id, client_secret, redirect_uri)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(provider) DO UPDATE SET
                client_id = excluded.client_id,
                client_secret = excluded.client_secret,
                redirect_uri = excluded.redirect_uri,
                updated_at = CURRENT_TIMESTAMP
            ",
        )
        .bind(provider.as_str())
        .bind(&app.client_id)
        .bind(&app.client_secret)
        .bind(&app.redirect_uri)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The OAuth application stored for `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn oauth_app_for(&self, provider: ProviderKind) -> Result<Option<OAuthApp>> {
        let row = sqlx::query(
            "SELECT client_id, client_secret, redirect_uri FROM oauth_credentials WHERE provider = ?",
        )
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(OAuthApp {
                client_id: row.try_get("client_id")?,
                client_secret: row.try_get("client_secret")?,
                redirect_uri: row.try_get("redirect_uri")?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl CredentialStore for AccountRepository {
    async fn credentials(&self, provider: ProviderKind) -> Result<Option<Credentials>> {
        let Some(account) = self.account_for(provider).await? else {
            return Ok(None);
        };
        let credentials = account.credentials();
        if credentials.is_none() {
            debug!(%provider, email = %account.email, "stored account has no usable credentials");
        }
        Ok(credentials)
    }

    async fn oauth_app(&self, provider: ProviderKind) -> Result<Option<OAuthApp>> {
        self.oauth_app_for(provider).await
    }
}

/// Convert a database row to an account.
fn row_to_account(row: &SqliteRow) -> Result<StoredAccount> {
    let provider: String = row.try_get("provider")?;
    let provider: ProviderKind = provider.parse()?;

    let imap = match row.try_get::<Option<String>, _>("imap_host")? {
        Some(host) if provider == ProviderKind::Imap => {
            let port: i64 = row.try_get::<Option<i64>, _>("imap_port")?.unwrap_or(993);
            let encoded: String = row
                .try_get::<Option<String>, _>("imap_password_encoded")?
                .unwrap_or_default();
            let password = STANDARD
                .decode(encoded.as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .ok_or_else(|| Error::Malformed("stored IMAP password is not valid".into()))?;
            Some(ImapCredential {
                host,
                port: u16::try_from(port)
                    .map_err(|_| Error::Malformed(format!("stored IMAP port {port} out of range")))?,
                user: row
                    .try_get::<Option<String>, _>("imap_username")?
                    .unwrap_or_default(),
                password,
                use_tls: row.try_get("imap_use_tls")?,
                accept_invalid_certs: row.try_get("imap_accept_invalid_certs")?,
            })
        }
        _ => None,
    };

    Ok(StoredAccount {
        id: Some(AccountId::new(row.try_get("id")?)),
        provider,
        email: row.try_get("email")?,
        label: row.try_get("label")?,
        is_active: row.try_get("is_active")?,
        is_primary: row.try_get("is_primary")?,
        oauth_refresh_token: row.try_get("oauth_refresh_token")?,
        imap,
    })
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
    use crate::credentials::OAuthCredential;

    fn login(user: &str) -> ImapCredential {
        ImapCredential {
            host: "imap.example.org".into(),
            port: 993,
            user: user.into(),
            password: "pässword with spaces".into(),
            use_tls: true,
            accept_invalid_certs: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_retrieve_account() {
        let repo = AccountRepository::in_memory().await.unwrap();

        let mut account = StoredAccount::imap("ada@example.org", login("ada"));
        repo.save(&mut account).await.unwrap();
        assert!(account.id.is_some());

        let retrieved = repo.get(account.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(retrieved.email, "ada@example.org");
        assert_eq!(retrieved.imap, Some(login("ada")));
    }

    #[tokio::test]
    async fn test_password_is_not_stored_verbatim() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let mut account = StoredAccount::imap("ada@example.org", login("ada"));
        repo.save(&mut account).await.unwrap();

        let raw: String = sqlx::query_scalar("SELECT imap_password_encoded FROM email_accounts")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_ne!(raw, "pässword with spaces");
    }

    #[tokio::test]
    async fn test_primary_account_wins() {
        let repo = AccountRepository::in_memory().await.unwrap();

        let mut first = StoredAccount::oauth(ProviderKind::Gmail, "first@gmail.com", "r-first");
        repo.save(&mut first).await.unwrap();
        let mut second =
            StoredAccount::oauth(ProviderKind::Gmail, "second@gmail.com", "r-second").primary();
        repo.save(&mut second).await.unwrap();

        let chosen = repo.account_for(ProviderKind::Gmail).await.unwrap().unwrap();
        assert_eq!(chosen.email, "second@gmail.com");
        assert!(repo.account_for(ProviderKind::Microsoft).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_active_without_primary() {
        let repo = AccountRepository::in_memory().await.unwrap();

        let mut inactive = StoredAccount::oauth(ProviderKind::Gmail, "old@gmail.com", "r-old");
        inactive.is_active = false;
        repo.save(&mut inactive).await.unwrap();
        let mut active = StoredAccount::oauth(ProviderKind::Gmail, "new@gmail.com", "r-new");
        repo.save(&mut active).await.unwrap();

        let creds = repo.credentials(ProviderKind::Gmail).await.unwrap();
        assert_eq!(
            creds,
            Some(Credentials::OAuth(OAuthCredential::RefreshToken(
                "r-new".into()
            )))
        );
    }

    #[tokio::test]
    async fn test_saving_primary_clears_other_primaries() {
        let repo = AccountRepository::in_memory().await.unwrap();

        let mut a = StoredAccount::imap("a@example.org", login("a")).primary();
        repo.save(&mut a).await.unwrap();
        let mut b = StoredAccount::imap("b@example.org", login("b")).primary();
        repo.save(&mut b).await.unwrap();

        let primaries: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|acc| acc.is_primary)
            .map(|acc| acc.email)
            .collect();
        assert_eq!(primaries, vec!["b@example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let mut account = StoredAccount::oauth(ProviderKind::Microsoft, "ada@outlook.com", "r1");
        repo.save(&mut account).await.unwrap();

        account.oauth_refresh_token = Some("r2".into());
        repo.save(&mut account).await.unwrap();
        let stored = repo.get(account.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.oauth_refresh_token.as_deref(), Some("r2"));

        repo.delete(account.id.unwrap()).await.unwrap();
        assert!(repo.get(account.id.unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_account_is_rejected() {
        let repo = AccountRepository::in_memory().await.unwrap();
        let mut account = StoredAccount::oauth(ProviderKind::Gmail, "ada@gmail.com", "");
        let err = repo.save(&mut account).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(account.id.is_none());
    }

    #[tokio::test]
    async fn test_oauth_app_upsert() {
        let repo = AccountRepository::in_memory().await.unwrap();
        assert!(repo.oauth_app(ProviderKind::Gmail).await.unwrap().is_none());

        let mut app = OAuthApp {
            client_id: "id-1".into(),
            client_secret: "secret-1".into(),
            redirect_uri: "http://localhost:7000/api/auth/gmail/callback".into(),
        };
        repo.save_oauth_app(ProviderKind::Gmail, &app).await.unwrap();
        app.client_id = "id-2".into();
        repo.save_oauth_app(ProviderKind::Gmail, &app).await.unwrap();

        assert_eq!(repo.oauth_app(ProviderKind::Gmail).await.unwrap(), Some(app));
        assert!(repo.oauth_app(ProviderKind::Microsoft).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_database_creates_parent() {
        let dir = std::env::temp_dir().join(format!("inboxbridge-test-{}", std::process::id()));
        let path = dir.join("nested").join("accounts.db");
        let repo = AccountRepository::new(&path).await.unwrap();
        let mut account = StoredAccount::oauth(ProviderKind::Gmail, "ada@gmail.com", "r");
        repo.save(&mut account).await.unwrap();
        assert!(path.exists());
        drop(repo);
        let _ = std::fs::remove_dir_all(dir);
    }
}
