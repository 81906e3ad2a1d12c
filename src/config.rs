use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./budget_snapshots.db?mode=rwc";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_CONFIG_URL: &str = "http://127.0.0.1:3000/api/config";

/// Process settings, read after `dotenvy` has loaded `.env`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_addr: SocketAddr,
    pub config_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env_or("DATABASE_URL", DEFAULT_DATABASE_URL);
        let raw_addr = env_or("SERVER_ADDR", DEFAULT_SERVER_ADDR);
        let server_addr = raw_addr.parse().map_err(|e| ConfigError::InvalidValue {
            key: "SERVER_ADDR".to_string(),
            message: format!("'{raw_addr}' is not a socket address: {e}"),
        })?;
        let config_url = env_or("CONFIG_URL", DEFAULT_CONFIG_URL);

        Ok(Self {
            database_url,
            server_addr,
            config_url,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Connection details for the remote document store, as served by
/// `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCredentials {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl RemoteCredentials {
    /// Server side: build from the `REMOTE_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("REMOTE_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                key: "REMOTE_API_KEY".to_string(),
            })?;

        Ok(Self {
            api_key,
            base_url: std::env::var("REMOTE_BASE_URL").ok(),
            project_id: std::env::var("REMOTE_PROJECT_ID").ok(),
        })
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "apiKey".to_string(),
                message: "configuration response has no apiKey".to_string(),
            });
        }
        Ok(self)
    }

    /// Base URL for document requests. Falls back to the origin of the
    /// config endpoint when the server did not announce one.
    pub fn resolve_base_url(&self, config_url: &str) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => config_url
                .trim_end_matches('/')
                .trim_end_matches("/api/config")
                .to_string(),
        }
    }
}

/// Client side: fetch credentials from the config endpoint. Any failure is
/// fatal for remote storage.
pub async fn fetch_remote_credentials(
    client: &reqwest::Client,
    config_url: &str,
) -> Result<RemoteCredentials, ConfigError> {
    let response = client
        .get(config_url)
        .send()
        .await
        .map_err(|e| ConfigError::Fetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ConfigError::Fetch(format!(
            "config endpoint returned {}",
            response.status()
        )));
    }

    response
        .json::<RemoteCredentials>()
        .await
        .map_err(|e| ConfigError::Fetch(e.to_string()))?
        .validate()
}
