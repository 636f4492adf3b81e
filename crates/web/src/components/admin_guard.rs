//! Role-gated content

use super::Spinner;
use crate::auth::use_session;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct GuardProps {
    pub children: Children,
    /// Rendered instead of the children when access is denied
    #[prop_or_default]
    pub fallback: Html,
}

/// Render children only for a signed-in user
#[function_component(RequireAuth)]
pub fn require_auth(props: &GuardProps) -> Html {
    let session = use_session();

    if session.data.is_loading {
        return html! { <Spinner text={Some("Checking session...".to_string())} /> };
    }

    if session.data.snapshot.authenticated {
        html! { <>{ props.children.clone() }</> }
    } else {
        props.fallback.clone()
    }
}

/// Render children only for `ROLE_ADMIN`.
///
/// Hides UI only; the API enforces the role on every request.
#[function_component(AdminGuard)]
pub fn admin_guard(props: &GuardProps) -> Html {
    let session = use_session();

    if session.data.is_loading {
        return html! {};
    }

    if session.data.snapshot.is_admin() {
        html! { <>{ props.children.clone() }</> }
    } else {
        props.fallback.clone()
    }
}
