//! Command handlers.

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use inboxbridge_core::provider::{Provider, oauth_endpoints};
use inboxbridge_core::service;
use inboxbridge_core::{
    AccountId, AccountRepository, CredentialResolver, Error, ImapCredential, ProviderKind,
    Settings, StoredAccount,
};
use inboxbridge_oauth::{AuthorizationCodeFlow, OAuthClient};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{Cli, Command};

/// Settings plus the stores built from them, for one invocation.
struct Context {
    settings: Settings,
    repository: Option<AccountRepository>,
    resolver: CredentialResolver,
}

impl Context {
    /// Loads settings and opens the account database. A database that
    /// cannot be opened only disables stored accounts.
    async fn open(cli: &Cli) -> Result<Self> {
        let mut settings = Settings::from_env()?;
        if let Some(db) = &cli.db {
            settings.database_path = Some(db.clone());
        }

        let repository = match &settings.database_path {
            Some(path) => match AccountRepository::new(path).await {
                Ok(repository) => Some(repository),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "account database unavailable, using environment only");
                    None
                }
            },
            None => None,
        };

        let resolver = match &repository {
            Some(repository) => {
                CredentialResolver::new(Arc::new(repository.clone()), settings.defaults())
            }
            None => CredentialResolver::defaults_only(settings.defaults()),
        };

        Ok(Self {
            settings,
            repository,
            resolver,
        })
    }

    async fn provider(&self, kind: ProviderKind) -> Result<Provider> {
        let app = if kind.uses_oauth() {
            self.resolver.resolve_app(kind).await
        } else {
            None
        };
        Ok(Provider::for_kind(
            kind,
            &self.settings,
            self.settings.http_client()?,
            app,
        )?)
    }

    fn repository(&self) -> Result<&AccountRepository> {
        self.repository
            .as_ref()
            .context("account database is not available")
    }

    async fn code_flow(&self, kind: ProviderKind) -> Result<AuthorizationCodeFlow> {
        let Some(endpoints) = oauth_endpoints(kind, &self.settings)? else {
            bail!("{kind} does not use OAuth");
        };
        let app = self
            .resolver
            .resolve_app(kind)
            .await
            .ok_or_else(|| Error::ConfigurationMissing(format!("{kind} OAuth application")))?;
        let client = OAuthClient::new(app.client_id, endpoints)
            .with_client_secret(app.client_secret)
            .with_redirect_uri(app.redirect_uri)
            .with_http_client(self.settings.http_client()?);
        Ok(AuthorizationCodeFlow::new(client))
    }
}

/// Runs one command.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let ctx = Context::open(&cli).await?;

    match cli.command {
        Command::List { provider, max } => {
            let kind = provider.provider;
            let creds = service::credentials_for(&ctx.resolver, kind).await?;
            let adapter = ctx.provider(kind).await?;
            print_json(&service::list_messages(&adapter, &creds, max).await?)?;
        }
        Command::Show { provider, id } => {
            let kind = provider.provider;
            let creds = service::credentials_for(&ctx.resolver, kind).await?;
            let adapter = ctx.provider(kind).await?;
            print_json(&service::get_message_detail(&adapter, &creds, &id).await?)?;
        }
        Command::Test { provider } => {
            let kind = provider.provider;
            let creds = service::credentials_for(&ctx.resolver, kind).await?;
            let adapter = ctx.provider(kind).await?;
            let result = service::test_connection(&adapter, &creds).await;
            print_json(&result)?;
            if !result.success {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Search {
            provider,
            query,
            max,
        } => {
            let kind = provider.provider;
            let creds = service::credentials_for(&ctx.resolver, kind).await?;
            let adapter = ctx.provider(kind).await?;
            print_json(&service::search_messages(&adapter, &creds, &query, max).await?)?;
        }
        Command::Summary { provider } => {
            let kind = provider.provider;
            let creds = service::credentials_for(&ctx.resolver, kind).await?;
            let adapter = ctx.provider(kind).await?;
            print_json(&service::inbox_summary(&adapter, &creds).await?)?;
        }
        Command::Accounts => {
            let accounts = ctx.repository()?.list().await?;
            let rows: Vec<AccountRow> = accounts.iter().map(AccountRow::from).collect();
            print_json(&rows)?;
        }
        Command::Authorize { provider, state } => {
            let flow = ctx.code_flow(provider.provider).await?;
            let url = flow.authorization_url(None, state.as_deref())?;
            println!("{url}");
        }
        Command::Connect {
            provider,
            email,
            code,
            label,
        } => {
            let kind = provider.provider;
            let repository = ctx.repository()?;
            let token = ctx.code_flow(kind).await?.exchange_code(&code, None).await?;
            let Some(refresh_token) = token.refresh_token.filter(|t| !t.is_empty()) else {
                bail!("{kind} did not return a refresh token");
            };
            let mut account = StoredAccount::oauth(kind, email, refresh_token).primary();
            if let Some(label) = label {
                account.label = label;
            }
            repository.save(&mut account).await?;
            info!(provider = %kind, email = %account.email, "account connected");
            print_json(&AccountRow::from(&account))?;
        }
        Command::AddImap {
            email,
            host,
            port,
            user,
            no_tls,
            accept_invalid_certs,
        } => {
            let repository = ctx.repository()?;
            let password = read_password()?;
            let login = ImapCredential {
                host,
                port,
                user: user.unwrap_or_else(|| email.clone()),
                password,
                use_tls: !no_tls,
                accept_invalid_certs,
            };
            let mut account = StoredAccount::imap(email, login).primary();
            repository.save(&mut account).await?;
            print_json(&AccountRow::from(&account))?;
        }
        Command::Remove { id } => {
            ctx.repository()?.delete(AccountId(id)).await?;
            info!(id, "account removed");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Stored account as printed: no secrets.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRow {
    id: Option<i64>,
    provider: ProviderKind,
    email: String,
    label: String,
    is_active: bool,
    is_primary: bool,
    has_credentials: bool,
}

impl From<&StoredAccount> for AccountRow {
    fn from(account: &StoredAccount) -> Self {
        Self {
            id: account.id.map(|id| id.0),
            provider: account.provider,
            email: account.email.clone(),
            label: account.label.clone(),
            is_active: account.is_active,
            is_primary: account.is_primary,
            has_credentials: account.credentials().is_some(),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First line of stdin, without the line ending.
fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("empty password on stdin");
    }
    Ok(password)
}
