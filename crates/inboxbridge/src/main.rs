//! `inboxbridge` - read Gmail, Outlook and IMAP inboxes from the command line.
//!
//! Every command prints JSON on stdout. Logs go to stderr and follow
//! `RUST_LOG`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use inboxbridge_core::ErrorKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

/// Exit status when no usable credentials or settings were found.
const EXIT_CONFIGURATION: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inboxbridge=info,inboxbridge_core=info,inboxbridge_imap=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match commands::run(cli).await {
        Ok(code) => code,
        Err(e) => report(&e),
    }
}

/// Prints the failure as JSON on stderr and picks the exit status.
fn report(error: &anyhow::Error) -> ExitCode {
    let kind = error
        .downcast_ref::<inboxbridge_core::Error>()
        .map(inboxbridge_core::Error::kind);
    let body = serde_json::json!({
        "error": format!("{error:#}"),
        "kind": kind,
    });
    eprintln!("{body}");
    if kind == Some(ErrorKind::ConfigurationMissing) {
        ExitCode::from(EXIT_CONFIGURATION)
    } else {
        ExitCode::FAILURE
    }
}
