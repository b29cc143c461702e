//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use inboxbridge_core::ProviderKind;
use inboxbridge_core::service::DEFAULT_LIST_MAX;

#[derive(Parser, Debug)]
#[command(name = "inboxbridge")]
#[command(version)]
#[command(about = "Read Gmail, Outlook and IMAP inboxes as normalized JSON", long_about = None)]
pub struct Cli {
    /// Account database (overrides INBOXBRIDGE_DB)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which provider to talk to.
#[derive(Args, Debug, Clone, Copy)]
pub struct ProviderArg {
    /// gmail, microsoft or imap
    #[arg(short, long, value_parser = parse_provider)]
    pub provider: ProviderKind,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the newest INBOX messages
    List {
        #[command(flatten)]
        provider: ProviderArg,

        /// How many messages (1 to 50)
        #[arg(short, long, default_value_t = DEFAULT_LIST_MAX)]
        max: u32,
    },

    /// Show one message with its body
    Show {
        #[command(flatten)]
        provider: ProviderArg,

        /// Provider message id (the UID for IMAP)
        id: String,
    },

    /// Check that the credentials work
    Test {
        #[command(flatten)]
        provider: ProviderArg,
    },

    /// Search recent messages by subject, sender or preview
    Search {
        #[command(flatten)]
        provider: ProviderArg,

        /// Text to look for, case-insensitive
        query: String,

        /// How many matches to return
        #[arg(short, long, default_value_t = 10)]
        max: u32,
    },

    /// Count recent messages and show the newest few
    Summary {
        #[command(flatten)]
        provider: ProviderArg,
    },

    /// List stored accounts
    Accounts,

    /// Print the OAuth consent URL for connecting an account
    Authorize {
        #[command(flatten)]
        provider: ProviderArg,

        /// Opaque value echoed back on the redirect
        #[arg(long)]
        state: Option<String>,
    },

    /// Exchange an authorization code and store the account
    Connect {
        #[command(flatten)]
        provider: ProviderArg,

        /// Mailbox address
        #[arg(long)]
        email: String,

        /// Code from the OAuth redirect
        #[arg(long)]
        code: String,

        /// Display label
        #[arg(long)]
        label: Option<String>,
    },

    /// Store an IMAP account. The password is read from stdin.
    AddImap {
        /// Mailbox address
        #[arg(long)]
        email: String,

        /// Server hostname
        #[arg(long)]
        host: String,

        /// Server port
        #[arg(long, default_value_t = 993)]
        port: u16,

        /// LOGIN username, defaults to the address
        #[arg(long)]
        user: Option<String>,

        /// Connect in plaintext
        #[arg(long)]
        no_tls: bool,

        /// Skip certificate validation
        #[arg(long)]
        accept_invalid_certs: bool,
    },

    /// Delete a stored account
    Remove {
        /// Account id from `accounts`
        id: i64,
    },
}

fn parse_provider(value: &str) -> Result<ProviderKind, String> {
    value.parse().map_err(|e: inboxbridge_core::Error| e.to_string())
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
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["inboxbridge", "list", "--provider", "outlook"]).unwrap();
        match cli.command {
            Command::List { provider, max } => {
                assert_eq!(provider.provider, ProviderKind::Microsoft);
                assert_eq!(max, DEFAULT_LIST_MAX);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(Cli::try_parse_from(["inboxbridge", "test", "-p", "yahoo"]).is_err());
    }

    #[test]
    fn test_show_takes_id() {
        let cli = Cli::try_parse_from(["inboxbridge", "show", "-p", "imap", "4711"]).unwrap();
        assert!(matches!(cli.command, Command::Show { ref id, .. } if id == "4711"));
    }
}
