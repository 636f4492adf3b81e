//! Session manager: token lifecycle state machine
//!
//! ```text
//! Unauthenticated --login()--> [redirect]
//! [callback with code] --exchange_code--> Authenticating
//! Authenticating --ok--> Authenticated (refresh armed at exp - leeway)
//! Authenticating --err--> Unauthenticated
//! Authenticated --timer--> Authenticating --ok--> Authenticated
//!                                         --err--> Unauthenticated (storage cleared)
//! ```

use crate::claims::{Claims, Principal};
use crate::clock::{Clock, SystemClock};
use crate::config::ProviderConfig;
use crate::error::{AuthError, AuthFailed};
use crate::events::{EventBus, ListenerId, SessionEvent};
use crate::redirect::{CallbackParams, Redirect};
use crate::schedule::{RefreshTimer, Scheduler};
use crate::session::{Session, SessionSnapshot, SessionState};
use crate::storage::{MemoryTokenStore, TokenPair, TokenStore};
use crate::token::TokenClient;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// Handle to the session context. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Rc<Inner>,
}

struct Inner {
    config: ProviderConfig,
    tokens: TokenClient,
    store: Rc<dyn TokenStore>,
    clock: Rc<dyn Clock>,
    scheduler: Rc<dyn Scheduler>,
    session: RefCell<Session>,
    timer: RefCell<RefreshTimer>,
    events: EventBus,
    bootstrap: RefCell<Option<Bootstrap>>,
    /// Bumped whenever the session is cleared; token responses that were
    /// requested under an older epoch are discarded.
    epoch: Cell<u64>,
}

type Bootstrap = Shared<LocalBoxFuture<'static, Result<(), AuthFailed>>>;

impl PartialEq for SessionManager {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("client_id", &self.inner.config.client_id)
            .field("session", &*self.inner.session.borrow())
            .field("timer", &*self.inner.timer.borrow())
            .finish()
    }
}

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    config: ProviderConfig,
    scheduler: Rc<dyn Scheduler>,
    store: Option<Rc<dyn TokenStore>>,
    clock: Option<Rc<dyn Clock>>,
    http: Option<reqwest::Client>,
}

impl SessionManagerBuilder {
    /// Set the persistent token store (default: in-memory)
    #[must_use]
    pub fn store(mut self, store: impl TokenStore + 'static) -> Self {
        self.store = Some(Rc::new(store));
        self
    }

    /// Share an existing store
    #[must_use]
    pub fn shared_store(mut self, store: Rc<dyn TokenStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the clock (default: system time)
    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom HTTP client for the token endpoint
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the manager
    pub fn build(self) -> Result<SessionManager, AuthError> {
        let mut tokens = TokenClient::new(self.config.clone())?;
        if let Some(http) = self.http {
            tokens = tokens.with_http_client(http);
        }

        Ok(SessionManager {
            inner: Rc::new(Inner {
                config: self.config,
                tokens,
                store: self
                    .store
                    .unwrap_or_else(|| Rc::new(MemoryTokenStore::new())),
                clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock)),
                scheduler: self.scheduler,
                session: RefCell::new(Session::default()),
                timer: RefCell::new(RefreshTimer::default()),
                events: EventBus::default(),
                bootstrap: RefCell::new(None),
                epoch: Cell::new(0),
            }),
        })
    }
}

impl SessionManager {
    /// Start building a manager. The scheduler decides how refresh timers run.
    pub fn builder(
        config: ProviderConfig,
        scheduler: impl Scheduler + 'static,
    ) -> SessionManagerBuilder {
        SessionManagerBuilder {
            config,
            scheduler: Rc::new(scheduler),
            store: None,
            clock: None,
            http: None,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.inner.config
    }

    // ---------------------------------------------------------------------
    // Redirect handshake
    // ---------------------------------------------------------------------

    /// Authorization endpoint redirect that starts an interactive login
    pub fn login(&self) -> Redirect {
        let config = &self.inner.config;
        let mut url = config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", config.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &config.scope);

        info!(client_id = %config.client_id, "Redirecting to identity provider for login");
        Redirect::new(url)
    }

    /// Clear the session, then return the provider logout redirect.
    ///
    /// Memory and storage are cleared before the redirect exists, so nothing
    /// depends on the navigation completing.
    pub fn logout(&self) -> Redirect {
        self.clear_session();
        self.inner.events.emit(SessionEvent::SignedOut);

        let config = &self.inner.config;
        let mut url = config.logout_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &config.client_id)
            .append_pair("post_logout_redirect_uri", config.redirect_uri.as_str());

        info!("Session cleared, redirecting to identity provider logout");
        Redirect::new(url)
    }

    // ---------------------------------------------------------------------
    // Token acquisition
    // ---------------------------------------------------------------------

    /// Start-up entry point for the page at `current_url`.
    ///
    /// Exchanges a callback code if present, otherwise restores the persisted
    /// session. Runs once per manager: a call made while the first one is
    /// still in flight waits for its outcome, later calls report the current
    /// state. Neither touches the network or the refresh timer again.
    pub async fn bootstrap(&self, current_url: &Url) -> Result<(), AuthFailed> {
        let pending = {
            let mut slot = self.inner.bootstrap.borrow_mut();
            match &*slot {
                Some(started) if started.peek().is_some() => {
                    debug!("Session already initialised");
                    return self.current_outcome();
                }
                Some(started) => {
                    debug!("Session initialisation in progress, waiting");
                    started.clone()
                }
                None => {
                    let weak = Rc::downgrade(&self.inner);
                    let url = current_url.clone();
                    let started = async move {
                        match weak.upgrade() {
                            Some(inner) => SessionManager { inner }.run_bootstrap(&url).await,
                            None => Err(AuthFailed),
                        }
                    }
                    .boxed_local()
                    .shared();
                    *slot = Some(started.clone());
                    started
                }
            }
        };

        pending.await
    }

    async fn run_bootstrap(&self, current_url: &Url) -> Result<(), AuthFailed> {
        let callback = CallbackParams::from_url(current_url);
        if let Some(code) = callback.code {
            return self.exchange_code(&code).await;
        }

        if let Some(error) = callback.error {
            let error = AuthError::Provider {
                operation: "authorization",
                status: None,
                detail: match callback.error_description {
                    Some(description) => format!("{error}: {description}"),
                    None => error,
                },
            };
            warn!(%error, "Identity provider returned an error");
            self.set_state(SessionState::Unauthenticated);
            return Err(AuthFailed);
        }

        self.check_auth().await
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Any failure leaves the session unauthenticated with storage cleared.
    pub async fn exchange_code(&self, code: &str) -> Result<(), AuthFailed> {
        self.set_state(SessionState::Authenticating);
        let epoch = self.inner.epoch.get();

        let response = self.inner.tokens.exchange_code(code).await;
        if self.is_stale(epoch) {
            return Err(AuthFailed);
        }

        let outcome = response.and_then(|pair| self.handle_successful_auth(pair));

        match outcome {
            Ok(()) => {
                self.inner.events.emit(SessionEvent::Authenticated);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error exchanging code for tokens");
                self.clear_session();
                Err(AuthFailed)
            }
        }
    }

    /// Redeem `refresh_token` for a new pair.
    ///
    /// On failure every trace of the session is removed and the user has to
    /// log in again; there is no retry.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<(), AuthFailed> {
        self.set_state(SessionState::Authenticating);
        let epoch = self.inner.epoch.get();

        let response = self.inner.tokens.refresh(refresh_token).await;
        if self.is_stale(epoch) {
            return Err(AuthFailed);
        }

        let outcome = response.and_then(|pair| self.handle_successful_auth(pair));

        match outcome {
            Ok(()) => {
                info!("Access token refreshed");
                self.inner.events.emit(SessionEvent::Refreshed);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Error refreshing token");
                self.clear_session();
                self.inner.events.emit(SessionEvent::SessionExpired);
                Err(AuthFailed)
            }
        }
    }

    /// Install a freshly obtained pair.
    ///
    /// Decodes first: a pair whose claims cannot be read, or that is already
    /// expired, clears the session instead of leaving it half-authenticated.
    /// Re-running with the same pair yields the same session and still
    /// exactly one pending refresh timer.
    pub fn handle_successful_auth(&self, pair: TokenPair) -> Result<(), AuthError> {
        let claims = match Claims::decode(&pair.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                self.clear_session();
                return Err(e);
            }
        };

        let now = self.inner.clock.now();
        let remaining = claims.seconds_until_expiry(now);
        if remaining <= 0 {
            warn!(
                now,
                exp = claims.exp,
                skew_secs = -remaining,
                "Access token already expired on arrival, check the client clock"
            );
            self.clear_session();
            return Err(AuthError::ExpiredSession {
                expired_at: claims.exp,
            });
        }

        pair.save(self.inner.store.as_ref());

        let principal = Principal::from_claims(&claims, &self.inner.config.client_id);
        debug!(
            username = %principal.username,
            roles = ?principal.roles,
            expires_in = remaining,
            "Decoded access token"
        );

        {
            let mut session = self.inner.session.borrow_mut();
            *session = Session {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                authenticated: true,
                principal: Some(principal),
                state: SessionState::Authenticated,
            };
        }

        // Due immediately once inside the leeway window
        let leeway = i64::try_from(self.inner.config.refresh_leeway_secs).unwrap_or(i64::MAX);
        let delay = u64::try_from(remaining.saturating_sub(leeway)).unwrap_or(0);
        self.arm_refresh(delay, now);

        Ok(())
    }

    /// Restore the session on page load.
    ///
    /// A persisted, unexpired pair is accepted without a network call. An
    /// expired one triggers exactly one refresh attempt.
    pub async fn check_auth(&self) -> Result<(), AuthFailed> {
        let Some(pair) = TokenPair::load(self.inner.store.as_ref()) else {
            debug!("No persisted session");
            self.set_state(SessionState::Unauthenticated);
            return Err(AuthFailed);
        };

        let claims = match Claims::decode(&pair.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "Invalid persisted token");
                self.clear_session();
                return Err(AuthFailed);
            }
        };

        if claims.is_live(self.inner.clock.now()) {
            return match self.handle_successful_auth(pair) {
                Ok(()) => {
                    info!(username = %self.username(), "Restored persisted session");
                    self.inner.events.emit(SessionEvent::Authenticated);
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Could not restore persisted session");
                    Err(AuthFailed)
                }
            };
        }

        let expired = AuthError::ExpiredSession {
            expired_at: claims.exp,
        };
        info!(%expired, "Persisted access token expired, refreshing");
        self.set_state(SessionState::Expired);
        self.refresh_access_token(&pair.refresh_token).await
    }

    // ---------------------------------------------------------------------
    // Refresh timer
    // ---------------------------------------------------------------------

    fn arm_refresh(&self, delay_secs: u64, now: i64) {
        let due_at = now.saturating_add(i64::try_from(delay_secs).unwrap_or(i64::MAX));
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);

        self.inner.timer.borrow_mut().arm(
            self.inner.scheduler.as_ref(),
            Duration::from_secs(delay_secs),
            due_at,
            move |generation| {
                async move {
                    if let Some(inner) = weak.upgrade() {
                        SessionManager { inner }.on_refresh_due(generation).await;
                    }
                }
                .boxed_local()
            },
        );

        debug!(delay_secs, due_at, "Armed token refresh");
    }

    async fn on_refresh_due(&self, generation: u64) {
        if !self.inner.timer.borrow_mut().claim(generation) {
            debug!(generation, "Ignoring superseded refresh timer");
            return;
        }

        let refresh_token = {
            let session = self.inner.session.borrow();
            if session.state == SessionState::Authenticating {
                debug!("Token request already in flight, skipping scheduled refresh");
                return;
            }
            session.refresh_token.clone()
        };

        if refresh_token.is_empty() {
            return;
        }

        // Outcome is logged and broadcast by the refresh itself
        let _ = self.refresh_access_token(&refresh_token).await;
    }

    /// Epoch second at which the next refresh is due
    pub fn refresh_due_at(&self) -> Option<i64> {
        self.inner.timer.borrow().due_at()
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.inner.timer.borrow().is_armed()
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    fn set_state(&self, state: SessionState) {
        self.inner.session.borrow_mut().state = state;
    }

    fn clear_session(&self) {
        self.inner.epoch.set(self.inner.epoch.get() + 1);
        self.inner.timer.borrow_mut().cancel();
        *self.inner.session.borrow_mut() = Session::default();
        TokenPair::clear(self.inner.store.as_ref());
    }

    /// Whether the session was cleared since `epoch` was read
    fn is_stale(&self, epoch: u64) -> bool {
        let stale = self.inner.epoch.get() != epoch;
        if stale {
            info!("Session cleared while the token request was in flight, discarding response");
        }
        stale
    }

    fn current_outcome(&self) -> Result<(), AuthFailed> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AuthFailed)
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.borrow().state
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.borrow().authenticated
    }

    pub fn username(&self) -> String {
        self.inner.session.borrow().username().to_string()
    }

    /// Prefixed authorities, e.g. `ROLE_ADMIN`
    pub fn roles(&self) -> BTreeSet<String> {
        self.inner.session.borrow().roles()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.inner.session.borrow().principal.clone()
    }

    /// Current bearer token; empty when unauthenticated
    pub fn access_token(&self) -> String {
        self.inner.session.borrow().access_token.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(&self.inner.session.borrow(), self.refresh_due_at())
    }

    pub fn is_admin(&self) -> bool {
        self.inner
            .session
            .borrow()
            .principal
            .as_ref()
            .is_some_and(Principal::is_admin)
    }

    /// See [`Principal::has_role`]
    pub fn has_role(&self, role: &str) -> bool {
        self.inner
            .session
            .borrow()
            .principal
            .as_ref()
            .is_some_and(|principal| principal.has_role(role))
    }

    pub fn has_client_role(&self, role: &str) -> bool {
        self.inner
            .session
            .borrow()
            .principal
            .as_ref()
            .is_some_and(|principal| principal.has_client_role(role))
    }

    /// Headers to attach to an outbound API request: empty when
    /// unauthenticated, otherwise a single bearer authorization header.
    pub fn auth_header(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let session = self.inner.session.borrow();
        if !session.authenticated {
            return headers;
        }

        match HeaderValue::from_str(&format!("Bearer {}", session.access_token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "Access token is not a valid header value"),
        }
        headers
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) -> ListenerId {
        self.inner.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Called when the API rejected the bearer token
    pub fn report_unauthorized(&self) {
        warn!("API rejected credentials, re-login required");
        self.inner.events.emit(SessionEvent::ReauthRequired);
    }
}
