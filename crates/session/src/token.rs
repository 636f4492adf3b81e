//! Token endpoint client

use crate::config::ProviderConfig;
use crate::error::AuthError;
use crate::storage::TokenPair;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use tracing::debug;

/// Token endpoint response body
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Grant submitted to the token endpoint
#[derive(Debug, Clone, Copy)]
pub enum Grant<'a> {
    AuthorizationCode(&'a str),
    RefreshToken(&'a str),
}

impl Grant<'_> {
    const fn operation(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "code exchange",
            Self::RefreshToken(_) => "token refresh",
        }
    }
}

/// Form-encoded client for the provider's token endpoint
#[derive(Clone)]
pub struct TokenClient {
    http: Client,
    config: ProviderConfig,
}

impl TokenClient {
    pub fn new(config: ProviderConfig) -> Result<Self, AuthError> {
        #[cfg(not(target_arch = "wasm32"))]
        let http = ClientBuilder::new()
            .timeout(config.token_timeout())
            .build();

        #[cfg(target_arch = "wasm32")]
        let http = ClientBuilder::new().build(); // Browser fetch owns the timeout

        let http = http.map_err(|source| AuthError::Network {
            operation: "client setup",
            source,
        })?;

        Ok(Self { http, config })
    }

    /// Use a custom HTTP client
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Exchange an authorization code for a token pair
    pub async fn exchange_code(&self, code: &str) -> Result<TokenPair, AuthError> {
        let response = self.request(Grant::AuthorizationCode(code)).await?;
        let refresh_token = response.refresh_token.ok_or_else(|| {
            AuthError::provider("code exchange", "response carries no refresh_token")
        })?;
        Ok(TokenPair::new(response.access_token, refresh_token))
    }

    /// Redeem a refresh token.
    ///
    /// Providers that do not rotate refresh tokens omit it from the response;
    /// the presented one stays valid then.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let response = self.request(Grant::RefreshToken(refresh_token)).await?;
        let rotated = response
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string());
        Ok(TokenPair::new(response.access_token, rotated))
    }

    async fn request(&self, grant: Grant<'_>) -> Result<TokenResponse, AuthError> {
        let operation = grant.operation();
        let client_id = self.config.client_id.as_str();
        let redirect_uri = self.config.redirect_uri.as_str();

        let params: Vec<(&str, &str)> = match grant {
            Grant::AuthorizationCode(code) => vec![
                ("grant_type", "authorization_code"),
                ("client_id", client_id),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ],
            Grant::RefreshToken(token) => vec![
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("refresh_token", token),
                ("redirect_uri", redirect_uri),
            ],
        };

        debug!(operation, url = %self.config.token_url, "Calling token endpoint");

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|source| AuthError::Network { operation, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AuthError::Network { operation, source })?;

        if !status.is_success() {
            return Err(AuthError::Provider {
                operation,
                status: Some(status.as_u16()),
                detail: body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| AuthError::Provider {
            operation,
            status: Some(status.as_u16()),
            detail: format!("unreadable token response: {e}"),
        })?;

        if token.access_token.is_empty() {
            return Err(AuthError::provider(operation, "empty access_token"));
        }

        Ok(token)
    }
}
