//! IMAP connection management: configuration, transport, framing and the
//! type-state client.

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, Fetched, NotAuthenticated, Selected};
pub use config::{Config, ConfigBuilder, Security, TlsTrust};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, create_tls_connector};
