//! Navbar sign-in / sign-out control

use super::{Spinner, SpinnerSize};
use crate::auth::use_session;
use yew::prelude::*;

#[function_component(SessionButton)]
pub fn session_button() -> Html {
    let session = use_session();
    let snapshot = &session.data.snapshot;

    if session.data.is_loading {
        return html! { <Spinner size={SpinnerSize::Inline} /> };
    }

    if snapshot.authenticated {
        let on_logout = {
            let session = session.clone();
            Callback::from(move |_: MouseEvent| session.logout())
        };

        html! {
            <div class="flex items-center gap-3">
                <span class="text-sm text-gray-700">{&snapshot.username}</span>
                if snapshot.is_admin() {
                    <span class="text-xs font-semibold text-indigo-700 bg-indigo-100 px-2 py-0.5 rounded">{"Admin"}</span>
                }
                <button onclick={on_logout} class="text-sm text-gray-600 hover:text-gray-900">
                    {"Sign out"}
                </button>
            </div>
        }
    } else {
        let on_login = {
            let session = session.clone();
            Callback::from(move |_: MouseEvent| session.login())
        };

        html! {
            <button onclick={on_login} class="text-sm bg-indigo-600 hover:bg-indigo-700 text-white px-3 py-1.5 rounded">
                {"Sign in"}
            </button>
        }
    }
}
