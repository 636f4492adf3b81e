//! Session manager lifecycle tests against a mocked token endpoint

mod common;

use common::{Harness, NOW, REDIRECT_URI, TOKEN_PATH, access_token, token_response};
use reqwest::header::AUTHORIZATION;
use std::time::Duration;
use storefront_session::{AuthError, AuthFailed, SessionEvent, SessionState, TokenPair};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

fn page(url: &str) -> Url {
    Url::parse(url).unwrap()
}

#[tokio::test]
async fn test_live_persisted_session_restores_without_network() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW + 3600), "refresh-1");

    assert!(h.manager.check_auth().await.is_ok());
    assert!(h.manager.is_authenticated());
    assert_eq!(h.manager.state(), SessionState::Authenticated);
    assert_eq!(h.manager.username(), "alice");
    assert_eq!(h.manager.refresh_due_at(), Some(NOW + 3570));
    assert_eq!(h.scheduler.delays(), vec![Duration::from_secs(3570)]);
    assert_eq!(h.events(), vec![SessionEvent::Authenticated]);
}

#[tokio::test]
async fn test_expired_persisted_session_refreshes_once() {
    let h = Harness::new().await;
    let fresh = access_token("alice", &["user"], NOW + 300);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .and(body_string_contains("client_id=ecommerce-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(&fresh, "new-refresh")))
        .expect(1)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW - 10), "old-refresh");

    assert!(h.manager.check_auth().await.is_ok());
    assert_eq!(h.manager.state(), SessionState::Authenticated);
    assert_eq!(h.manager.access_token(), fresh);
    assert_eq!(h.persisted(), Some(TokenPair::new(fresh, "new-refresh")));
    assert_eq!(h.scheduler.delays(), vec![Duration::from_secs(270)]);
    assert_eq!(h.events(), vec![SessionEvent::Refreshed]);
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW - 10), "stale-refresh");

    let outcome = h.manager.check_auth().await;
    assert!(outcome.is_err());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
    assert!(!h.manager.is_authenticated());
    assert!(h.store.is_empty());
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.events(), vec![SessionEvent::SessionExpired]);
}

#[tokio::test]
async fn test_logout_clears_storage_before_redirect() {
    let h = Harness::new().await;
    h.persist(&access_token("alice", &["admin"], NOW + 3600), "refresh-1");
    h.manager.check_auth().await.unwrap();
    assert_eq!(h.scheduler.pending(), 1);

    let redirect = h.manager.logout();

    // Cleared by the time the redirect exists; nothing waits on navigation
    assert!(h.store.is_empty());
    assert!(!h.manager.is_authenticated());
    assert!(h.manager.auth_header().is_empty());
    assert!(h.manager.roles().is_empty());
    assert_eq!(h.scheduler.pending(), 0);

    assert!(redirect.url().path().ends_with("/protocol/openid-connect/logout"));
    assert_eq!(redirect.param("client_id").as_deref(), Some("ecommerce-app"));
    assert_eq!(redirect.param("post_logout_redirect_uri").as_deref(), Some(REDIRECT_URI));
    assert_eq!(
        h.events(),
        vec![SessionEvent::Authenticated, SessionEvent::SignedOut]
    );
}

#[tokio::test]
async fn test_login_redirect_targets_authorization_endpoint() {
    let h = Harness::new().await;
    let redirect = h.manager.login();

    assert!(redirect.url().path().ends_with("/protocol/openid-connect/auth"));
    assert_eq!(redirect.param("client_id").as_deref(), Some("ecommerce-app"));
    assert_eq!(redirect.param("redirect_uri").as_deref(), Some(REDIRECT_URI));
    assert_eq!(redirect.param("response_type").as_deref(), Some("code"));
    assert_eq!(redirect.param("scope").as_deref(), Some("openid"));
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_bootstrap_exchanges_callback_code() {
    let h = Harness::new().await;
    let issued = access_token("bob", &["admin", "user"], NOW + 600);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc123"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(&issued, "r-1")))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .manager
        .bootstrap(&page("http://localhost:3000/?code=abc123&state=s1"))
        .await;

    assert!(outcome.is_ok());
    assert_eq!(h.manager.username(), "bob");
    assert!(h.manager.is_admin());
    assert!(h.manager.has_role("admin"));
    assert!(h.manager.has_client_role("catalog-editor"));
    assert_eq!(h.persisted(), Some(TokenPair::new(issued, "r-1")));
    assert_eq!(h.events(), vec![SessionEvent::Authenticated]);
}

#[tokio::test]
async fn test_failed_code_exchange_stays_unauthenticated() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&h.server)
        .await;

    assert!(h.manager.exchange_code("abc").await.is_err());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
    assert!(h.store.is_empty());
    assert!(h.events().is_empty());
}

#[tokio::test]
async fn test_unreadable_token_is_never_half_authenticated() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_response("not-a-jwt", "r-1")),
        )
        .mount(&h.server)
        .await;

    assert!(h.manager.exchange_code("abc").await.is_err());
    assert!(!h.manager.is_authenticated());
    assert!(h.manager.principal().is_none());
    assert!(h.store.is_empty());
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_malformed_json_body_fails_exchange() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&h.server)
        .await;

    assert!(h.manager.exchange_code("abc").await.is_err());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_handle_successful_auth_is_idempotent() {
    let h = Harness::new().await;
    let pair = TokenPair::new(access_token("carol", &["user"], NOW + 900), "r-1");

    h.manager.handle_successful_auth(pair.clone()).unwrap();
    let first = h.manager.snapshot();

    h.manager.handle_successful_auth(pair).unwrap();
    let second = h.manager.snapshot();

    assert_eq!(first, second);
    assert!(second.authenticated);
    assert_eq!(second.username, "carol");
    assert!(second.roles.contains("ROLE_USER"));
    // Re-arming replaced the first timer instead of stacking a second one
    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.scheduler.cancelled(), 1);
}

#[tokio::test]
async fn test_refresh_inside_leeway_is_due_immediately() {
    let h = Harness::new().await;
    let pair = TokenPair::new(access_token("dave", &[], NOW + 20), "r-1");

    h.manager.handle_successful_auth(pair).unwrap();

    assert!(h.manager.is_authenticated());
    assert_eq!(h.scheduler.delays(), vec![Duration::ZERO]);
    assert_eq!(h.manager.refresh_due_at(), Some(NOW));
}

#[tokio::test]
async fn test_already_expired_pair_is_rejected() {
    let h = Harness::new().await;
    let pair = TokenPair::new(access_token("erin", &["admin"], NOW), "r-1");

    let result = h.manager.handle_successful_auth(pair);

    assert!(matches!(result, Err(AuthError::ExpiredSession { expired_at }) if expired_at == NOW));
    assert!(!h.manager.is_authenticated());
    assert!(!h.manager.is_admin());
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_timer_refreshes_and_rearms() {
    let h = Harness::new().await;
    let renewed = access_token("alice", &["user"], NOW + 3900);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(&renewed, "refresh-2")))
        .expect(1)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW + 3600), "refresh-1");
    h.manager.check_auth().await.unwrap();

    h.clock.advance(3570);
    assert!(h.scheduler.run_next().await);

    assert_eq!(h.manager.access_token(), renewed);
    assert_eq!(h.persisted(), Some(TokenPair::new(renewed, "refresh-2")));
    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.manager.refresh_due_at(), Some(NOW + 3870));
    assert_eq!(
        h.events(),
        vec![SessionEvent::Authenticated, SessionEvent::Refreshed]
    );
}

#[tokio::test]
async fn test_failed_timer_refresh_forces_relogin() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW + 60), "refresh-1");
    h.manager.check_auth().await.unwrap();

    assert!(h.scheduler.run_next().await);

    assert!(!h.manager.is_authenticated());
    assert!(h.store.is_empty());
    // No automatic retry
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(
        h.events(),
        vec![SessionEvent::Authenticated, SessionEvent::SessionExpired]
    );
}

#[tokio::test]
async fn test_superseded_timer_does_not_refresh() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW + 600), "refresh-1");
    h.manager.check_auth().await.unwrap();

    // The old timer has fired but its task has not run yet when a new pair arrives
    let stale = h.scheduler.fire_next().unwrap();
    h.manager
        .handle_successful_auth(TokenPair::new(access_token("alice", &["user"], NOW + 900), "refresh-2"))
        .unwrap();
    stale.await;

    assert!(h.manager.is_authenticated());
    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.manager.refresh_due_at(), Some(NOW + 870));
}

#[tokio::test]
async fn test_bootstrap_runs_once() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW + 600), "refresh-1");

    assert!(h.manager.bootstrap(&page("http://localhost:3000/")).await.is_ok());
    assert!(
        h.manager
            .bootstrap(&page("http://localhost:3000/?code=replayed"))
            .await
            .is_ok()
    );

    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.scheduler.cancelled(), 0);
}

#[tokio::test]
async fn test_bootstrap_reports_provider_error() {
    let h = Harness::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let outcome = h
        .manager
        .bootstrap(&page("http://localhost:3000/?error=access_denied"))
        .await;

    assert!(outcome.is_err());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_check_auth_without_tokens_fails() {
    let h = Harness::new().await;

    assert!(h.manager.check_auth().await.is_err());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_check_auth_with_corrupt_token_clears_storage() {
    let h = Harness::new().await;
    h.persist("corrupted", "refresh-1");

    assert!(h.manager.check_auth().await.is_err());
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_auth_header_tracks_authentication() {
    let h = Harness::new().await;
    assert!(h.manager.auth_header().is_empty());

    let token = access_token("alice", &["user"], NOW + 600);
    h.manager
        .handle_successful_auth(TokenPair::new(token.clone(), "r"))
        .unwrap();

    let headers = h.manager.auth_header();
    assert_eq!(headers.len(), 1);
    assert_eq!(
        headers.get(AUTHORIZATION).unwrap().to_str().unwrap(),
        format!("Bearer {token}")
    );
    assert!(!h.manager.is_admin());
    assert!(!h.manager.has_role("admin"));

    let _ = h.manager.logout();
    assert!(h.manager.auth_header().is_empty());
}

#[tokio::test]
async fn test_listener_removal_stops_notifications() {
    let h = Harness::new().await;
    let seen = std::rc::Rc::new(std::cell::Cell::new(0));
    let id = {
        let seen = seen.clone();
        h.manager.subscribe(move |_| seen.set(seen.get() + 1))
    };

    let _ = h.manager.logout();
    assert!(h.manager.unsubscribe(id));
    let _ = h.manager.logout();

    assert_eq!(seen.get(), 1);
}

#[tokio::test]
async fn test_logout_during_refresh_discards_late_tokens() {
    let h = Harness::new().await;
    let fresh = access_token("alice", &["user"], NOW + 300);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(&fresh, "new-refresh"))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    h.persist(&access_token("alice", &["user"], NOW - 10), "old-refresh");

    let (outcome, ()) = tokio::join!(h.manager.check_auth(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = h.manager.logout();
    });

    assert_eq!(outcome, Err(AuthFailed));
    assert_eq!(h.persisted(), None);
    assert!(h.store.is_empty());
    assert!(!h.manager.is_authenticated());
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);
    assert_eq!(h.manager.access_token(), "");
    assert_eq!(h.scheduler.pending(), 0);
    assert_eq!(h.events(), vec![SessionEvent::SignedOut]);
}

#[tokio::test]
async fn test_logout_during_code_exchange_discards_late_tokens() {
    let h = Harness::new().await;
    let issued = access_token("bob", &["admin"], NOW + 300);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(&issued, "refresh-1"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.server)
        .await;

    let (outcome, ()) = tokio::join!(h.manager.exchange_code("abc123"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = h.manager.logout();
    });

    assert_eq!(outcome, Err(AuthFailed));
    assert_eq!(h.persisted(), None);
    assert!(!h.manager.is_admin());
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn test_concurrent_bootstrap_shares_first_outcome() {
    let h = Harness::new().await;
    let issued = access_token("carol", &["user"], NOW + 600);

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_response(&issued, "refresh-1"))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let callback = page("http://localhost:3000/?code=abc123");
    let plain = page("http://localhost:3000/");
    let (first, second) = tokio::join!(
        h.manager.bootstrap(&callback),
        h.manager.bootstrap(&plain)
    );

    assert_eq!(first, Ok(()));
    assert_eq!(second, Ok(()));
    assert_eq!(h.manager.username(), "carol");
    assert_eq!(h.scheduler.pending(), 1);
    assert_eq!(h.events(), vec![SessionEvent::Authenticated]);
}
