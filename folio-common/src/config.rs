//! Configuration loading for the Folio services
//!
//! Resolution priority for the config file path:
//! 1. Command-line argument (highest priority)
//! 2. `FOLIO_CONFIG` environment variable
//! 3. `~/.config/folio/config.toml`, then `/etc/folio/config.toml`
//! 4. Compiled defaults (no file)
//!
//! Secrets can additionally be overridden through environment variables so
//! deployments never need to write them into the TOML file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Full service configuration (both services read the same file)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub review: ReviewConfig,
    pub deploy: DeployConfig,
    pub payment: PaymentConfig,
    pub hosting: HostingConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the shared SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .map(|d| d.join("folio").join("folio.db"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/folio/folio.db"));
        Self { path }
    }
}

/// Review service (folio-rv) settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub bind: String,
    /// Bearer token required on staff/admin routes
    pub admin_token: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5731".to_string(),
            admin_token: String::new(),
        }
    }
}

/// Deployment pipeline service (folio-dp) settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    pub bind: String,
    /// Shared secret for cron-triggered queue processing
    pub cron_secret: String,
    /// Jobs processed per trigger (hosting-provider rate limit)
    pub batch_size: u32,
    /// Failed jobs are abandoned once retry_count reaches this value
    pub max_retries: i64,
    /// Built-in worker poll interval; 0 disables (external cron only)
    pub poll_interval_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5732".to_string(),
            cron_secret: String::new(),
            batch_size: 5,
            max_retries: 2,
            poll_interval_secs: 0,
        }
    }
}

/// Payment provider API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub base_url: String,
    pub secret_key: String,
    /// Shared secret for webhook signature verification
    pub webhook_secret: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.payments.example".to_string(),
            secret_key: String::new(),
            webhook_secret: String::new(),
        }
    }
}

/// Hosting provider API settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    pub base_url: String,
    pub token: String,
    pub team_id: Option<String>,
    /// Apex domain portfolios are aliased under (subdomain.apex)
    pub apex_domain: String,
    /// Hosting project names are `{project_prefix}{subdomain}`
    pub project_prefix: String,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hosting.example".to_string(),
            token: String::new(),
            team_id: None,
            apex_domain: "folio.site".to_string(),
            project_prefix: "folio-".to_string(),
        }
    }
}

/// Email provider settings
///
/// `provider` is "console" (log only) or "http" (REST email API).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub provider: String,
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: "console".to_string(),
            api_url: "https://api.mailer.example/emails".to_string(),
            api_key: String::new(),
            from: "Folio <hello@folio.site>".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, resolving the file path in priority order and
    /// applying environment-variable secret overrides.
    pub fn load(cli_path: Option<&Path>) -> Result<Config> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a specific TOML config file
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Cannot parse {}: {}", path.display(), e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FOLIO_DATABASE") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(token) = std::env::var("FOLIO_ADMIN_TOKEN") {
            self.review.admin_token = token;
        }
        if let Ok(secret) = std::env::var("FOLIO_CRON_SECRET") {
            self.deploy.cron_secret = secret;
        }
        if let Ok(key) = std::env::var("FOLIO_PAYMENT_SECRET_KEY") {
            self.payment.secret_key = key;
        }
        if let Ok(secret) = std::env::var("FOLIO_PAYMENT_WEBHOOK_SECRET") {
            self.payment.webhook_secret = secret;
        }
        if let Ok(token) = std::env::var("FOLIO_HOSTING_TOKEN") {
            self.hosting.token = token;
        }
        if let Ok(key) = std::env::var("FOLIO_EMAIL_API_KEY") {
            self.email.api_key = key;
        }
    }

    /// Ensure the database parent directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(parent) = self.database.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("FOLIO_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Some(user_config) = dirs::config_dir().map(|d| d.join("folio").join("config.toml")) {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/folio/config.toml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.deploy.batch_size, 5);
        assert_eq!(config.deploy.max_retries, 2);
        assert_eq!(config.email.provider, "console");
        assert_eq!(config.hosting.apex_domain, "folio.site");
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [deploy]
            cron_secret = "s3cret"
            batch_size = 2

            [hosting]
            apex_domain = "portfolios.test"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.deploy.cron_secret, "s3cret");
        assert_eq!(parsed.deploy.batch_size, 2);
        assert_eq!(parsed.deploy.max_retries, 2);
        assert_eq!(parsed.hosting.apex_domain, "portfolios.test");
        assert_eq!(parsed.email.provider, "console");
    }
}
