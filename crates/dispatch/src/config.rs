use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::locale::LocaleMessages;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityMode {
    /// Plain text connection, no TLS at all.
    #[serde(rename = "none")]
    None,
    /// Plain connection upgraded with `STARTTLS` (usually port 587).
    #[default]
    #[serde(rename = "tls", alias = "starttls")]
    StartTls,
    /// TLS from the first byte (usually port 465).
    #[serde(rename = "ssl", alias = "smtps")]
    Tls,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::StartTls => "tls",
            Self::Tls => "ssl",
        })
    }
}

/// SMTP connection settings.
///
/// Holds everything needed to open a connection to the relay. A fresh
/// connection is opened from these settings for every recipient.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    #[serde(default = "default_host")]
    pub host: String,

    /// SMTP server port. Defaults to 587 (STARTTLS submission port).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Connection security. Defaults to STARTTLS.
    #[serde(default)]
    pub security: SecurityMode,

    /// Optional SMTP username for authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional SMTP password for authentication.
    #[serde(default)]
    pub password: Option<String>,

    /// Optional per-command timeout in seconds. Uses the transport default
    /// when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    587
}

fn default_language() -> String {
    "es".to_owned()
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            security: SecurityMode::default(),
            username: None,
            password: None,
            timeout_secs: None,
        }
    }
}

impl SmtpConfig {
    /// Create a config for the given relay host with default port and
    /// STARTTLS.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set SMTP authentication credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Override the default SMTP port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection security mode.
    #[must_use]
    pub fn with_security(mut self, security: SecurityMode) -> Self {
        self.security = security;
        self
    }

    /// Set the per-command timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Top-level dispatcher configuration, usually loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use courier_dispatch::{DispatchConfig, SecurityMode};
///
/// let config = DispatchConfig::from_toml_str(
///     r#"
///     language = "en"
///
///     [smtp]
///     host = "smtp.example.com"
///     security = "ssl"
///     port = 465
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.smtp.security, SecurityMode::Tls);
/// assert!(!config.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Language tag used to pick the localized result messages.
    #[serde(default = "default_language")]
    pub language: String,

    /// Emit per-recipient debug lines.
    #[serde(default)]
    pub debug: bool,

    /// SMTP relay settings.
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Additional or overriding message tables keyed by language tag.
    #[serde(default)]
    pub locales: BTreeMap<String, LocaleMessages>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            debug: false,
            smtp: SmtpConfig::default(),
            locales: BTreeMap::new(),
        }
    }
}

impl DispatchConfig {
    /// Create a config around the given SMTP settings with default language
    /// and debug disabled.
    pub fn new(smtp: SmtpConfig) -> Self {
        Self {
            smtp,
            ..Self::default()
        }
    }

    /// Parse a config from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, DispatchError> {
        toml::from_str(input).map_err(|e| DispatchError::Configuration(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&input)
    }

    /// Select the result message language.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enable or disable per-recipient debug lines.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Register (or replace) the message table for a language.
    #[must_use]
    pub fn with_locale(mut self, language: impl Into<String>, messages: LocaleMessages) -> Self {
        self.locales.insert(language.into(), messages);
        self
    }
}
