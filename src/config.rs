//! Configuration module for DeskSync.

use serde::Deserialize;
use std::path::Path;

use crate::{DeskSyncError, Result};

/// Environment variable that overrides `auth.jwt_secret`.
pub const JWT_SECRET_ENV: &str = "DESKSYNC_JWT_SECRET";

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Login attempts allowed per client IP within `login_rate_window_secs`.
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Length of the login throttling window in seconds.
    #[serde(default = "default_login_rate_window")]
    pub login_rate_window_secs: u64,
    /// Key throttling on `X-Forwarded-For`/`X-Real-IP` instead of the peer
    /// address. Only enable behind a reverse proxy that overwrites them.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_login_rate_limit() -> u32 {
    5
}

fn default_login_rate_window() -> u64 {
    900 // 15 minutes
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            login_rate_limit: default_login_rate_limit(),
            login_rate_window_secs: default_login_rate_window(),
            trust_forwarded_headers: false,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/desksync.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Credential and session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session token signing secret (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: u64,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lane count.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
    /// Domains allowed to self-register. Empty allows every domain.
    #[serde(default)]
    pub allowed_email_domains: Vec<String>,
}

fn default_session_expiry() -> u64 {
    86_400 // 24 hours
}

fn default_argon2_memory() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            session_expiry_secs: default_session_expiry(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            allowed_email_domains: vec![],
        }
    }
}

/// Outbound message configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Product name used in message subjects.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Base URL of the reset-password page; the secret and account id are appended.
    #[serde(default = "default_reset_link_base")]
    pub reset_link_base: String,
}

fn default_app_name() -> String {
    "DeskSync".to_string()
}

fn default_reset_link_base() -> String {
    "http://localhost:5173/reset-password".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            reset_link_base: default_reset_link_base(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file output.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/desksync.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Credential and session configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outbound message configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DeskSyncError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DeskSyncError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DESKSYNC_JWT_SECRET`: Override the session signing secret
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using a custom variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(JWT_SECRET_ENV) {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The session signing secret is not set
    /// - The session lifetime is zero
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(DeskSyncError::Config(format!(
                "auth.jwt_secret is not set. \
                 Set it in config.toml or via the {JWT_SECRET_ENV} environment variable."
            )));
        }
        if self.auth.session_expiry_secs == 0 {
            return Err(DeskSyncError::Config(
                "auth.session_expiry_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());
        assert_eq!(config.server.login_rate_limit, 5);
        assert_eq!(config.server.login_rate_window_secs, 900);
        assert!(!config.server.trust_forwarded_headers);

        assert_eq!(config.database.path, "data/desksync.db");

        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.session_expiry_secs, 86_400);
        assert_eq!(config.auth.argon2_memory_kib, 19 * 1024);
        assert_eq!(config.auth.argon2_iterations, 2);
        assert_eq!(config.auth.argon2_parallelism, 1);
        assert!(config.auth.allowed_email_domains.is_empty());

        assert_eq!(config.mail.app_name, "DeskSync");

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/desksync.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["https://desksync.example.com"]
login_rate_limit = 10
login_rate_window_secs = 60
trust_forwarded_headers = true

[database]
path = "/var/lib/desksync/desksync.db"

[auth]
jwt_secret = "file-secret"
session_expiry_secs = 3600
argon2_memory_kib = 65536
argon2_iterations = 3
argon2_parallelism = 2
allowed_email_domains = ["example.com", "corp.example.com"]

[mail]
app_name = "HDBS"
reset_link_base = "https://desksync.example.com/reset-password"

[logging]
level = "debug"
file = ""
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.server.login_rate_limit, 10);
        assert_eq!(config.server.login_rate_window_secs, 60);
        assert!(config.server.trust_forwarded_headers);
        assert_eq!(config.database.path, "/var/lib/desksync/desksync.db");
        assert_eq!(config.auth.jwt_secret, "file-secret");
        assert_eq!(config.auth.session_expiry_secs, 3600);
        assert_eq!(config.auth.argon2_memory_kib, 65536);
        assert_eq!(config.auth.argon2_iterations, 3);
        assert_eq!(config.auth.argon2_parallelism, 2);
        assert_eq!(
            config.auth.allowed_email_domains,
            vec!["example.com", "corp.example.com"]
        );
        assert_eq!(config.mail.app_name, "HDBS");
        assert_eq!(
            config.mail.reset_link_base,
            "https://desksync.example.com/reset-password"
        );
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_empty());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[auth]
jwt_secret = "partial"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.auth.jwt_secret, "partial");
        assert_eq!(config.auth.session_expiry_secs, 86_400);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server\nport = ");
        assert!(matches!(result, Err(DeskSyncError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/desksync.toml");
        assert!(matches!(result, Err(DeskSyncError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_overrides_jwt_secret() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| {
            (key == JWT_SECRET_ENV).then(|| "env-secret-key".to_string())
        });

        assert_eq!(config.auth.jwt_secret, "env-secret-key");
    }

    #[test]
    fn test_overrides_empty_value() {
        let mut config = Config::default();
        config.auth.jwt_secret = "original-secret".to_string();
        config.apply_overrides_from(|_| Some(String::new()));

        // Should not override with empty string
        assert_eq!(config.auth.jwt_secret, "original-secret");
    }

    #[test]
    fn test_overrides_missing_variable() {
        let mut config = Config::default();
        config.auth.jwt_secret = "original-secret".to_string();
        config.apply_overrides_from(|_| None);

        assert_eq!(config.auth.jwt_secret, "original-secret");
    }

    #[test]
    fn test_validate_no_secret() {
        let config = Config::default();

        let result = config.validate();
        assert!(result.is_err());
        if let Err(DeskSyncError::Config(msg)) = result {
            assert!(msg.contains("jwt_secret"));
        }
    }

    #[test]
    fn test_validate_with_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_session_expiry() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.auth.session_expiry_secs = 0;

        assert!(config.validate().is_err());
    }
}
