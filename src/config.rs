//! Connection settings for the subsurface cloud services

use crate::cloud::CloudError;
use crate::models::CloudSettingsBlock;
use anyhow::{Context, Result};
use std::time::Duration;

pub const CLIENT_ID_ENV: &str = "AzureClientId";
pub const CLIENT_SECRET_ENV: &str = "AzureClientSecret";
pub const TOKEN_URL_ENV: &str = "AzureTokenUrl";
pub const RESOURCE_ID_ENV: &str = "AzureResourceId";
pub const FILE_DOWNLOAD_URL_ENV: &str = "AzureFileDownloadUrl";
pub const SUBSCRIPTION_KEY_ENV: &str = "AzureSubscriptionKey";
pub const GRAPH_URL_ENV: &str = "AzureGraphUrl";
pub const HTTP_TIMEOUT_ENV: &str = "SUBSURFACE_HTTP_TIMEOUT_SECONDS";
pub const USER_AGENT_ENV: &str = "SUBSURFACE_USER_AGENT";

/// Settings consumed by the download engine.
///
/// Blank strings mean "not configured"; the engine checks them at the point
/// where they are needed so the validate → authenticate → endpoints order holds.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// OAuth2 client credentials
    pub credentials: Credentials,
    /// API management subscription key
    pub subscription_key: String,
    /// Metadata (GraphQL) query endpoint
    pub graph_url: String,
    /// Base URL for file downloads
    pub file_download_url: String,
    /// HTTP client configuration
    pub http: HttpConfig,
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub resource_id: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("token_url", &self.token_url)
            .field("resource_id", &self.resource_id)
            .finish()
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds, applied to queries and downloads alike
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: "subsurface-cloud/0.1.0".to_string(),
        }
    }
}

/// Endpoints and key required once a token has been obtained
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub subscription_key: String,
    pub graph_url: String,
    pub file_download_url: String,
}

impl Settings {
    /// Load settings from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials {
            client_id: env_or_empty(CLIENT_ID_ENV),
            client_secret: env_or_empty(CLIENT_SECRET_ENV),
            token_url: env_or_empty(TOKEN_URL_ENV),
            resource_id: env_or_empty(RESOURCE_ID_ENV),
        };

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_seconds: parse_env_var(HTTP_TIMEOUT_ENV)?.unwrap_or(defaults.timeout_seconds),
            user_agent: std::env::var(USER_AGENT_ENV).unwrap_or(defaults.user_agent),
        };

        Ok(Settings {
            credentials,
            subscription_key: env_or_empty(SUBSCRIPTION_KEY_ENV),
            graph_url: env_or_empty(GRAPH_URL_ENV),
            file_download_url: env_or_empty(FILE_DOWNLOAD_URL_ENV),
            http,
        })
    }

    /// Apply the non-empty values of a configuration `<config>` block
    pub fn with_overrides(mut self, block: &CloudSettingsBlock) -> Self {
        override_if_set(&mut self.credentials.client_id, &block.client_id);
        override_if_set(&mut self.credentials.client_secret, &block.client_secret);
        override_if_set(&mut self.credentials.token_url, &block.token_url);
        override_if_set(&mut self.credentials.resource_id, &block.resource_id);
        override_if_set(&mut self.file_download_url, &block.file_download_url);
        override_if_set(&mut self.subscription_key, &block.subscription_key);
        override_if_set(&mut self.graph_url, &block.graph_url);
        self
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Resolve the subscription key and both service endpoints, in that order
    pub fn service_endpoints(&self) -> Result<ServiceEndpoints, CloudError> {
        if self.subscription_key.trim().is_empty() {
            return Err(CloudError::config(format!(
                "Unable to find subscription key in environment variable: {}",
                SUBSCRIPTION_KEY_ENV
            )));
        }
        if self.graph_url.trim().is_empty() {
            return Err(CloudError::config(format!(
                "Unable to locate the metadata query url in environment variable: {}",
                GRAPH_URL_ENV
            )));
        }
        if self.file_download_url.trim().is_empty() {
            return Err(CloudError::config(format!(
                "Unable to locate the file download url in environment variable: {}",
                FILE_DOWNLOAD_URL_ENV
            )));
        }

        Ok(ServiceEndpoints {
            subscription_key: self.subscription_key.clone(),
            graph_url: self.graph_url.clone(),
            file_download_url: self.file_download_url.clone(),
        })
    }
}

impl Credentials {
    /// Names of the credential settings that are blank
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (CLIENT_ID_ENV, &self.client_id),
            (CLIENT_SECRET_ENV, &self.client_secret),
            (TOKEN_URL_ENV, &self.token_url),
            (RESOURCE_ID_ENV, &self.resource_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

fn env_or_empty(var_name: &str) -> String {
    std::env::var(var_name).unwrap_or_default()
}

fn override_if_set(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = value.to_string();
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
