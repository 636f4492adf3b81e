//! Session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default scope requested at the authorization endpoint
pub const DEFAULT_SCOPE: &str = "openid";

/// Seconds before expiry at which the refresh timer fires
pub const DEFAULT_REFRESH_LEEWAY_SECS: u64 = 30;

/// Default timeout for token endpoint and API requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Top-level settings for the session crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Identity provider endpoints and client registration
    pub provider: ProviderConfig,

    /// Outbound product API client
    #[serde(default)]
    pub api: ApiConfig,
}

/// Identity provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Authorization endpoint
    pub auth_url: Url,

    /// Token endpoint
    pub token_url: Url,

    /// End-session endpoint
    pub logout_url: Url,

    /// Public client id registered with the provider
    pub client_id: String,

    /// Where the provider sends the browser back to
    pub redirect_uri: Url,

    /// Requested scope
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Refresh this many seconds before the access token expires
    #[serde(default = "default_refresh_leeway_secs")]
    pub refresh_leeway_secs: u64,

    /// Token endpoint request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub token_timeout_secs: u64,
}

/// Outbound API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api/v1`
    #[serde(default)]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

const fn default_refresh_leeway_secs() -> u64 {
    DEFAULT_REFRESH_LEEWAY_SECS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderConfig {
    /// Build the endpoint set of a Keycloak realm.
    ///
    /// `base_url` is the provider root, which may sit behind a gateway prefix
    /// such as `http://localhost:8000/auth`.
    pub fn keycloak(
        base_url: &str,
        realm: &str,
        client_id: impl Into<String>,
        redirect_uri: Url,
    ) -> Result<Self, url::ParseError> {
        let base = base_url.trim_end_matches('/');
        let endpoint =
            |name: &str| Url::parse(&format!("{base}/realms/{realm}/protocol/openid-connect/{name}"));

        Ok(Self {
            auth_url: endpoint("auth")?,
            token_url: endpoint("token")?,
            logout_url: endpoint("logout")?,
            client_id: client_id.into(),
            redirect_uri,
            scope: default_scope(),
            refresh_leeway_secs: DEFAULT_REFRESH_LEEWAY_SECS,
            token_timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Override the redirect URI
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
        self.redirect_uri = redirect_uri;
        self
    }

    /// Override the refresh leeway
    #[must_use]
    pub fn with_refresh_leeway_secs(mut self, secs: u64) -> Self {
        self.refresh_leeway_secs = secs;
        self
    }

    /// Token endpoint timeout as a duration
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }
}

impl SessionSettings {
    /// Load settings from TOML text, with `STOREFRONT__*` environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .add_source(config::Environment::with_prefix("STOREFRONT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
