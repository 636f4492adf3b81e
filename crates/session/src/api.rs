//! Outbound API client that carries the session's bearer token

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::manager::SessionManager;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

/// REST client for the catalog API.
///
/// Every request picks up the current bearer header at build time, so a
/// silent refresh is seen by the next request without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionManager,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: SessionManager) -> Result<Self, ApiError> {
        if config.base_url.is_empty() {
            return Err(ApiError::Configuration("base_url is required".into()));
        }

        // Ensure base_url ends without a trailing slash
        let base_url = config.base_url.trim_end_matches('/').to_string();

        #[cfg(not(target_arch = "wasm32"))]
        let http = ClientBuilder::new().timeout(config.timeout()).build()?;

        #[cfg(target_arch = "wasm32")]
        let http = ClientBuilder::new().build()?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder with the session's auth header attached
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .request(method, url)
            .headers(self.session.auth_header())
    }

    /// Execute a request and map error statuses.
    ///
    /// A `401` also tells the session manager that re-login is required.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        let error = ApiError::from_status(status, message);
        debug!(status = status.as_u16(), "API request failed");

        if error.is_reauth_required() {
            self.session.report_unauthorized();
        }
        Err(error)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.request(Method::GET, path)).await
    }
}
