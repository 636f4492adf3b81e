//! Frontend configuration

use storefront_session::{ApiConfig, ProviderConfig, SessionSettings, page_redirect_uri};
use url::Url;

/// Deployment defaults for the storefront
pub struct WebConfig;

impl WebConfig {
    /// Identity provider root, routed through the API gateway
    pub const PROVIDER_BASE_URL: &'static str = "http://localhost:8000/auth";

    /// Provider realm
    pub const REALM: &'static str = "ecommerce";

    /// Public client id of the storefront
    pub const CLIENT_ID: &'static str = "ecommerce-app";

    /// Catalog API base URL
    pub const API_BASE_URL: &'static str = "http://localhost:8000/api/v1";

    /// Window event dispatched after a silent refresh
    pub const SESSION_REFRESH_EVENT: &'static str = "storefront-session-refresh";
}

/// Default settings for the page at `page`; the provider sends the browser
/// back to the page's origin and path.
pub fn settings_for_page(page: &Url) -> Result<SessionSettings, url::ParseError> {
    let provider = ProviderConfig::keycloak(
        WebConfig::PROVIDER_BASE_URL,
        WebConfig::REALM,
        WebConfig::CLIENT_ID,
        page_redirect_uri(page),
    )?;

    Ok(SessionSettings {
        provider,
        api: ApiConfig {
            base_url: WebConfig::API_BASE_URL.to_string(),
            ..ApiConfig::default()
        },
    })
}
