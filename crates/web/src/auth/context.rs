//! Global session context and provider

use crate::components::ReauthModal;
use crate::config::WebConfig;
use crate::services::{broadcast_refresh, current_url, navigate, replace_url};
use gloo::events::EventListener;
use std::rc::Rc;
use storefront_session::{SessionEvent, SessionManager, SessionSnapshot, strip_callback_params};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

/// Session data as seen by the component tree
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContextData {
    pub snapshot: SessionSnapshot,
    pub is_loading: bool,
    pub show_reauth_modal: bool,
    pub message: Option<String>,
}

/// Session context actions
pub enum SessionAction {
    Sync(SessionSnapshot),
    SetLoading(bool),
    ShowReauthModal(String),
    HideReauthModal,
}

impl Default for SessionContextData {
    fn default() -> Self {
        Self {
            snapshot: SessionSnapshot::default(),
            is_loading: true, // Until bootstrap has run
            show_reauth_modal: false,
            message: None,
        }
    }
}

impl Reducible for SessionContextData {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        match action {
            SessionAction::Sync(snapshot) => {
                let signed_in = snapshot.authenticated;
                Rc::new(Self {
                    snapshot,
                    is_loading: self.is_loading,
                    show_reauth_modal: self.show_reauth_modal && !signed_in,
                    message: if signed_in { None } else { self.message.clone() },
                })
            }
            SessionAction::SetLoading(is_loading) => Rc::new(Self {
                is_loading,
                ..(*self).clone()
            }),
            SessionAction::ShowReauthModal(message) => Rc::new(Self {
                is_loading: false,
                show_reauth_modal: true,
                message: Some(message),
                ..(*self).clone()
            }),
            SessionAction::HideReauthModal => Rc::new(Self {
                show_reauth_modal: false,
                message: None,
                ..(*self).clone()
            }),
        }
    }
}

/// Session manager plus the reducer state mirroring it
#[derive(Clone, PartialEq)]
pub struct SessionContext {
    pub manager: SessionManager,
    pub data: UseReducerHandle<SessionContextData>,
}

impl SessionContext {
    /// Redirect to the identity provider
    pub fn login(&self) {
        if let Err(e) = navigate(&self.manager.login()) {
            tracing::error!(error = %e, "Failed to start login");
        }
    }

    /// Clear the session and redirect to the provider logout
    pub fn logout(&self) {
        let redirect = self.manager.logout();
        self.data.dispatch(SessionAction::Sync(self.manager.snapshot()));
        if let Err(e) = navigate(&redirect) {
            tracing::error!(error = %e, "Failed to complete logout redirect");
        }
    }

    pub fn dismiss_reauth(&self) {
        self.data.dispatch(SessionAction::HideReauthModal);
    }
}

/// Session provider props
#[derive(Properties, PartialEq)]
pub struct SessionProviderProps {
    pub manager: SessionManager,
    pub children: Children,
}

/// Owns the session lifecycle for the page: mirrors manager events into
/// context and runs the start-up handshake once.
#[function_component(SessionProvider)]
pub fn session_provider(props: &SessionProviderProps) -> Html {
    let data = use_reducer(SessionContextData::default);

    // Mirror manager events
    {
        let data = data.clone();
        use_effect_with(props.manager.clone(), move |manager| {
            let listener = {
                let observed = manager.clone();
                manager.subscribe(move |event| {
                    data.dispatch(SessionAction::Sync(observed.snapshot()));
                    match event {
                        SessionEvent::Refreshed => broadcast_refresh(),
                        SessionEvent::SessionExpired => data.dispatch(
                            SessionAction::ShowReauthModal(
                                "Your session has expired. Please sign in again.".to_string(),
                            ),
                        ),
                        SessionEvent::ReauthRequired => data.dispatch(
                            SessionAction::ShowReauthModal(
                                "Your credentials were rejected. Please sign in again.".to_string(),
                            ),
                        ),
                        SessionEvent::Authenticated | SessionEvent::SignedOut => {}
                    }
                })
            };

            let manager = manager.clone();
            move || {
                manager.unsubscribe(listener);
            }
        });
    }

    // Exchange a callback code or restore the persisted session
    {
        let data = data.clone();
        use_effect_with(props.manager.clone(), move |manager| {
            let manager = manager.clone();
            spawn_local(async move {
                match current_url() {
                    Ok(url) => {
                        let clean = strip_callback_params(&url);
                        if clean != url {
                            if let Err(e) = replace_url(&clean) {
                                tracing::warn!(error = %e, "Failed to clean callback URL");
                            }
                        }
                        if manager.bootstrap(&url).await.is_err() {
                            tracing::debug!("No authenticated session after start-up");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "Cannot read page URL"),
                }
                data.dispatch(SessionAction::Sync(manager.snapshot()));
                data.dispatch(SessionAction::SetLoading(false));
            });
        });
    }

    let context = SessionContext {
        manager: props.manager.clone(),
        data,
    };

    html! {
        <ContextProvider<SessionContext> context={context}>
            <ReauthModal />
            {props.children.clone()}
        </ContextProvider<SessionContext>>
    }
}

/// Hook to use the session context
#[hook]
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>()
        .expect("SessionContext not found. Make sure to wrap your component with SessionProvider")
}

/// Hook to check if authenticated
#[hook]
pub fn use_is_authenticated() -> bool {
    let session = use_session();
    session.data.snapshot.authenticated
}

/// Hook to check for the admin authority
#[hook]
pub fn use_is_admin() -> bool {
    let session = use_session();
    session.data.snapshot.is_admin()
}

/// Run `on_refresh` every time the session-refresh event reaches `window`
#[hook]
pub fn use_session_refresh(on_refresh: Callback<()>) {
    use_effect_with(on_refresh, move |on_refresh| {
        let on_refresh = on_refresh.clone();
        let listener = web_sys::window().map(|window| {
            EventListener::new(&window, WebConfig::SESSION_REFRESH_EVENT, move |_| {
                on_refresh.emit(());
            })
        });
        move || drop(listener)
    });
}
