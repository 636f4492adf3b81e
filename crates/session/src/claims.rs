//! Access token claim decoding
//!
//! Claims are read from the JWT payload segment WITHOUT verifying the
//! signature. The result only drives UI decisions (what to show, when to
//! refresh); real authorization happens on the server for every API call.

use crate::error::AuthError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Prefix applied to realm roles when deriving local authorities
pub const ROLE_PREFIX: &str = "ROLE_";

/// Username used when the token carries no `preferred_username`
pub const DEFAULT_USERNAME: &str = "User";

/// Decoded access token claims
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    /// Expiry, epoch seconds
    pub exp: i64,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RoleSet>,
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,
}

/// A `{"roles": [...]}` claim object
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Decode the payload segment of a compact JWT
    pub fn decode(token: &str) -> Result<Self, AuthError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
            _ => return Err(AuthError::malformed("expected three dot-separated segments")),
        };

        // Some issuers keep base64 padding even though JWS forbids it
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AuthError::malformed(format!("payload is not base64url: {e}")))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::malformed(format!("payload is not a claims object: {e}")))
    }

    /// Realm role names exactly as the provider issued them
    pub fn realm_roles(&self) -> impl Iterator<Item = &str> {
        self.realm_access
            .iter()
            .flat_map(|access| access.roles.iter().map(String::as_str))
    }

    /// Role names granted for one client
    pub fn client_roles(&self, client_id: &str) -> impl Iterator<Item = &str> {
        self.resource_access
            .get(client_id)
            .into_iter()
            .flat_map(|access| access.roles.iter().map(String::as_str))
    }

    /// Seconds left until expiry; negative once expired
    pub const fn seconds_until_expiry(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now)
    }

    /// Whether the token expires after `now`
    pub const fn is_live(&self, now: i64) -> bool {
        self.exp > now
    }
}

/// Local authority for a provider role name, e.g. `admin` -> `ROLE_ADMIN`
pub fn authority_for(role: &str) -> String {
    format!("{ROLE_PREFIX}{}", role.to_uppercase())
}

/// Identity derived from the most recently decoded access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub name: Option<String>,
    /// Provider realm role names, case preserved
    pub realm_roles: BTreeSet<String>,
    /// Provider client role names for the configured client
    pub client_roles: BTreeSet<String>,
    /// Prefixed authorities derived from the realm roles
    pub roles: BTreeSet<String>,
    pub expires_at: i64,
}

impl Principal {
    /// Derive the principal from decoded claims
    pub fn from_claims(claims: &Claims, client_id: &str) -> Self {
        let realm_roles: BTreeSet<String> = claims.realm_roles().map(str::to_owned).collect();
        let roles = realm_roles.iter().map(|role| authority_for(role)).collect();

        Self {
            subject: claims.sub.clone(),
            username: claims
                .preferred_username
                .clone()
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            email: claims.email.clone(),
            name: claims.name.clone(),
            realm_roles,
            client_roles: claims.client_roles(client_id).map(str::to_owned).collect(),
            roles,
            expires_at: claims.exp,
        }
    }

    /// Case-sensitive check against the provider's realm role names.
    ///
    /// A name that already carries [`ROLE_PREFIX`] is checked against the
    /// derived authorities instead.
    pub fn has_role(&self, role: &str) -> bool {
        if role.starts_with(ROLE_PREFIX) {
            self.roles.contains(role)
        } else {
            self.realm_roles.contains(role)
        }
    }

    pub fn has_client_role(&self, role: &str) -> bool {
        self.client_roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains("ROLE_ADMIN")
    }
}
