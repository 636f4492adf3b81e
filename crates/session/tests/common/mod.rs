//! Shared fixtures for session integration tests

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;
use storefront_session::{
    FixedClock, ManualScheduler, MemoryTokenStore, ProviderConfig, SessionEvent, SessionManager,
    TokenPair,
};
use url::Url;
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

pub const NOW: i64 = 1_700_000_000;
pub const CLIENT_ID: &str = "ecommerce-app";
pub const TOKEN_PATH: &str = "/realms/ecommerce/protocol/openid-connect/token";
pub const REDIRECT_URI: &str = "http://localhost:3000/";

/// Unsigned compact JWT around `claims`
pub fn jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Keycloak-shaped access token
pub fn access_token(username: &str, roles: &[&str], exp: i64) -> String {
    jwt(&json!({
        "sub": format!("id-{username}"),
        "exp": exp,
        "preferred_username": username,
        "realm_access": { "roles": roles },
        "resource_access": { CLIENT_ID: { "roles": ["catalog-editor"] } }
    }))
}

pub fn token_response(access_token: &str, refresh_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "expires_in": 300,
        "token_type": "Bearer"
    })
}

/// Log to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub server: MockServer,
    pub manager: SessionManager,
    pub store: Rc<MemoryTokenStore>,
    pub clock: Rc<FixedClock>,
    pub scheduler: ManualScheduler,
    pub events: Rc<RefCell<Vec<SessionEvent>>>,
}

impl Harness {
    pub async fn new() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let config = ProviderConfig::keycloak(
            &server.uri(),
            "ecommerce",
            CLIENT_ID,
            Url::parse(REDIRECT_URI).unwrap(),
        )
        .unwrap();

        let store = Rc::new(MemoryTokenStore::new());
        let clock = Rc::new(FixedClock::new(NOW));
        let scheduler = ManualScheduler::new();

        let manager = SessionManager::builder(config, scheduler.clone())
            .shared_store(store.clone())
            .clock(clock.clone())
            .build()
            .unwrap();

        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let events = Rc::clone(&events);
            manager.subscribe(move |event| events.borrow_mut().push(event));
        }

        Self {
            server,
            manager,
            store,
            clock,
            scheduler,
            events,
        }
    }

    pub fn persist(&self, access_token: &str, refresh_token: &str) {
        TokenPair::new(access_token, refresh_token).save(self.store.as_ref());
    }

    pub fn persisted(&self) -> Option<TokenPair> {
        TokenPair::load(self.store.as_ref())
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.borrow().clone()
    }
}
