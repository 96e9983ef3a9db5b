//! Order service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` /
//!   `EMAIL_FROM` - SMTP relay for order confirmations. Setting `SMTP_HOST`
//!   requires the rest; leaving it unset disables email entirely (the
//!   notification worker then only logs).

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// SMTP relay configuration for the notification worker.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    /// Relay password (never logged).
    pub smtp_password: SecretString,
    /// From address on outgoing confirmations.
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Order service application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// SMTP relay, when configured
    pub email: Option<EmailConfig>,
}

impl ApiConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing required variables or unparsable
    /// values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("API_DATABASE_URL")?;

        let host = parse_host(optional("API_HOST"))?;
        let port = parse_port(optional("API_PORT"), "API_PORT", DEFAULT_PORT)?;

        let email = match optional("SMTP_HOST") {
            None => None,
            Some(smtp_host) => Some(EmailConfig {
                smtp_host,
                smtp_port: parse_port(optional("SMTP_PORT"), "SMTP_PORT", DEFAULT_SMTP_PORT)?,
                smtp_username: required("SMTP_USERNAME")?,
                smtp_password: SecretString::from(required("SMTP_PASSWORD")?),
                from_address: required("EMAIL_FROM")?,
            }),
        };

        Ok(Self {
            database_url: SecretString::from(database_url),
            host,
            port,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
            email,
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse an optional bind address, defaulting to loopback.
fn parse_host(value: Option<String>) -> Result<IpAddr, ConfigError> {
    value.map_or_else(
        || Ok(IpAddr::from([127, 0, 0, 1])),
        |v| {
            v.parse()
                .map_err(|_| ConfigError::InvalidEnvVar("API_HOST".to_string(), v))
        },
    )
}

/// Parse an optional port, falling back to `default`.
fn parse_port(value: Option<String>, name: &str, default: u16) -> Result<u16, ConfigError> {
    value.map_or(Ok(default), |v| {
        v.parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_defaults_to_loopback() {
        assert_eq!(
            parse_host(None).expect("default host"),
            IpAddr::from([127, 0, 0, 1])
        );
        assert_eq!(
            parse_host(Some("0.0.0.0".into())).expect("parse host"),
            IpAddr::from([0, 0, 0, 0])
        );
        assert!(parse_host(Some("not-an-ip".into())).is_err());
    }

    #[test]
    fn port_defaults_and_rejects_garbage() {
        assert_eq!(
            parse_port(None, "API_PORT", DEFAULT_PORT).expect("default"),
            DEFAULT_PORT
        );
        assert_eq!(
            parse_port(Some("8080".into()), "API_PORT", DEFAULT_PORT).expect("parse"),
            8080
        );
        assert!(parse_port(Some("eighty".into()), "API_PORT", DEFAULT_PORT).is_err());
    }

    #[test]
    fn email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".into(),
            smtp_port: 587,
            smtp_username: "mailer".into(),
            smtp_password: SecretString::from("hunter2".to_string()),
            from_address: "orders@example.com".into(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
