//! Connection configuration types.

use std::time::Duration;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (port 143). **Not recommended for production.**
    None,
    /// TLS from the start (port 993). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Maps a plain `use_tls` flag onto a security mode.
    #[must_use]
    pub const fn from_tls_flag(use_tls: bool) -> Self {
        if use_tls { Self::Implicit } else { Self::None }
    }

    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 143,
            Self::Implicit => 993,
        }
    }
}

/// How server certificates are checked on TLS connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsTrust {
    /// Validate the chain against the bundled web PKI roots and the hostname.
    #[default]
    Verified,
    /// Accept any certificate, including self-signed and expired ones.
    ///
    /// This is a weakened trust mode for servers with private or broken
    /// certificates. The connection is still encrypted but is open to
    /// interception. It must be chosen explicitly and is logged on every use.
    AcceptInvalidCerts,
}

/// IMAP connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Certificate validation policy.
    pub trust: TlsTrust,
    /// Bound on TCP connect, TLS handshake, greeting and LOGIN.
    pub connect_timeout: Duration,
    /// Bound on one whole operation, from connect to logout.
    pub operation_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    trust: TlsTrust,
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl ConfigBuilder {
    /// Default connect and login bound.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default bound for a whole list or detail operation.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(60);

    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Implicit,
            trust: TlsTrust::Verified,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the certificate validation policy.
    #[must_use]
    pub const fn trust(mut self, trust: TlsTrust) -> Self {
        self.trust = trust;
        self
    }

    /// Sets the connect and login timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the whole-operation timeout.
    #[must_use]
    pub const fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            trust: self.trust,
            connect_timeout: self.connect_timeout,
            operation_timeout: self.operation_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_default_port() {
        assert_eq!(Security::None.default_port(), 143);
        assert_eq!(Security::Implicit.default_port(), 993);
    }

    #[test]
    fn test_security_from_tls_flag() {
        assert_eq!(Security::from_tls_flag(true), Security::Implicit);
        assert_eq!(Security::from_tls_flag(false), Security::None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new("imap.example.com");
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.trust, TlsTrust::Verified);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.operation_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_builder_port_follows_security() {
        let config = Config::builder("mail.local")
            .security(Security::None)
            .build();
        assert_eq!(config.port, 143);
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder("mail.local")
            .port(1993)
            .trust(TlsTrust::AcceptInvalidCerts)
            .connect_timeout(Duration::from_secs(3))
            .operation_timeout(Duration::from_secs(20))
            .build();
        assert_eq!(config.port, 1993);
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.trust, TlsTrust::AcceptInvalidCerts);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.operation_timeout, Duration::from_secs(20));
    }
}
