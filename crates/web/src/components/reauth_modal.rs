//! Sign-in-again prompt

use crate::auth::use_session;
use yew::prelude::*;

/// Modal shown when the session expired or the API rejected the token
#[function_component(ReauthModal)]
pub fn reauth_modal() -> Html {
    let session = use_session();
    let is_redirecting = use_state(|| false);

    let on_login = {
        let session = session.clone();
        let is_redirecting = is_redirecting.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            is_redirecting.set(true);
            session.login();
        })
    };

    let on_dismiss = {
        let session = session.clone();
        Callback::from(move |_: MouseEvent| session.dismiss_reauth())
    };

    if !session.data.show_reauth_modal {
        return html! {};
    }

    html! {
        <div class="fixed inset-0 bg-black bg-opacity-50 flex items-center justify-center z-50">
            <div class="bg-white rounded-lg p-6 max-w-md w-full mx-4 shadow-xl">
                <div class="flex items-center mb-4">
                    <svg class="w-8 h-8 text-yellow-500 mr-3" fill="none" stroke="currentColor" viewBox="0 0 24 24">
                        <path stroke-linecap="round" stroke-linejoin="round" stroke-width="2"
                            d="M12 9v2m0 4h.01m-6.938 4h13.856c1.54 0 2.502-1.667 1.732-3L13.732 4c-.77-1.333-2.694-1.333-3.464 0L3.34 16c-.77 1.333.192 3 1.732 3z" />
                    </svg>
                    <h2 class="text-xl font-bold text-gray-900">{"Session Expired"}</h2>
                </div>

                if let Some(message) = &session.data.message {
                    <p class="text-gray-600 mb-6">{message}</p>
                }

                <div class="flex gap-3">
                    <button
                        onclick={on_login}
                        disabled={*is_redirecting}
                        class="flex-1 bg-indigo-600 hover:bg-indigo-700 disabled:bg-gray-400
                               text-white font-medium py-3 px-4 rounded-lg transition-colors"
                    >
                        if *is_redirecting {
                            {"Redirecting..."}
                        } else {
                            {"Sign in again"}
                        }
                    </button>
                    <button
                        onclick={on_dismiss}
                        class="px-4 py-3 text-gray-600 hover:text-gray-900 rounded-lg"
                    >
                        {"Continue browsing"}
                    </button>
                </div>
            </div>
        </div>
    }
}
