use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10000
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared secret callers pass as the `token` query parameter
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    /// GitHub App ID
    pub app_identifier: Option<String>,
    /// Base64-encoded PEM private key of the GitHub App
    pub app_private_key: Option<String>,
    /// Timeout applied to every outbound GitHub call, in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            repo_owner: None,
            repo_name: None,
            app_identifier: None,
            app_private_key: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse configuration file")?
        } else {
            info!("No config file found, using defaults");
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay deployment variables on top of the file configuration.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = lookup("GITHUB_REPO_OWNER") {
            self.github.repo_owner = Some(v);
        }
        if let Some(v) = lookup("GITHUB_REPO_NAME") {
            self.github.repo_name = Some(v);
        }
        if let Some(v) = lookup("GITHUB_APP_IDENTIFIER") {
            self.github.app_identifier = Some(v);
        }
        if let Some(v) = lookup("GITHUB_APP_PRIVATE_KEY") {
            self.github.app_private_key = Some(v);
        }
        if let Some(v) = lookup("GITHUB_API_BASE") {
            self.github.api_base = v;
        }
        if let Some(v) = lookup("API_TOKEN") {
            self.auth.api_token = Some(v);
        }
    }
}

/// Immutable per-process settings the issue pipeline reads from.
#[derive(Clone)]
pub struct Environment {
    pub repo_owner: String,
    pub repo_name: String,
    pub app_identifier: String,
    /// Decoded PEM bytes of the app's RSA private key
    pub app_private_key: Vec<u8>,
    pub api_token: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("app_identifier", &self.app_identifier)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Validate the loaded configuration. Anything that would make every
    /// request fail is rejected here so the process never starts serving.
    pub fn from_config(config: &Config) -> Result<Self> {
        let github = &config.github;

        let repo_owner = required(&github.repo_owner, "GITHUB_REPO_OWNER")?
            .trim()
            .to_string();
        let repo_name = required(&github.repo_name, "GITHUB_REPO_NAME")?
            .trim()
            .to_string();
        let app_identifier = required(&github.app_identifier, "GITHUB_APP_IDENTIFIER")?
            .trim()
            .to_string();
        let encoded_key = required(&github.app_private_key, "GITHUB_APP_PRIVATE_KEY")?;
        // Compared byte for byte with the caller's token, so never trimmed
        let api_token = required(&config.auth.api_token, "API_TOKEN")?.to_string();

        let app_private_key = BASE64
            .decode(encoded_key.trim())
            .context("GITHUB_APP_PRIVATE_KEY is not valid base64")?;
        EncodingKey::from_rsa_pem(&app_private_key)
            .context("GITHUB_APP_PRIVATE_KEY does not contain an RSA private key in PEM format")?;

        if github.request_timeout_secs == 0 {
            bail!("github.request_timeout_secs must be greater than zero");
        }

        Ok(Self {
            repo_owner,
            repo_name,
            app_identifier,
            app_private_key,
            api_token,
            api_base: github.api_base.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(github.request_timeout_secs),
        })
    }
}

/// A value that is unset or only whitespace counts as missing.
fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("Missing required configuration value {}", name),
    }
}
