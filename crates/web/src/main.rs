use storefront_session::SessionManager;
use storefront_web::components::{AdminGuard, RequireAuth, SessionButton};
use storefront_web::{SessionProvider, init_session, logging, use_session, use_session_refresh};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
struct AppProps {
    manager: SessionManager,
    api_base: String,
}

#[function_component(App)]
fn app(props: &AppProps) -> Html {
    html! {
        <SessionProvider manager={props.manager.clone()}>
            <nav class="flex items-center justify-between px-6 py-3 border-b">
                <span class="font-semibold">{"Storefront"}</span>
                <SessionButton />
            </nav>
            <main class="p-6">
                <RequireAuth fallback={html! { <p>{"Browse the catalog or sign in to order."}</p> }}>
                    <Welcome api_base={props.api_base.clone()} />
                </RequireAuth>
                <AdminGuard>
                    <a href="/admin/products" class="text-indigo-600">{"Manage products"}</a>
                </AdminGuard>
            </main>
        </SessionProvider>
    }
}

#[derive(Properties, PartialEq)]
struct WelcomeProps {
    api_base: String,
}

#[function_component(Welcome)]
fn welcome(props: &WelcomeProps) -> Html {
    let session = use_session();
    let refreshes = use_state(|| 0_u32);

    {
        let refreshes = refreshes.clone();
        use_session_refresh(Callback::from(move |()| refreshes.set(*refreshes + 1)));
    }

    html! {
        <div>
            <p>{format!("Signed in as {}", session.data.snapshot.username)}</p>
            <p class="text-xs text-gray-500">
                {format!("API {} · token refreshed {} time(s)", props.api_base, *refreshes)}
            </p>
        </div>
    }
}

fn main() {
    logging::init();

    match init_session() {
        Ok((manager, api)) => {
            let api_base = api.base_url().to_string();
            yew::Renderer::<App>::with_props(AppProps { manager, api_base }).render();
        }
        Err(e) => tracing::error!(error = %e, "Failed to start session"),
    }
}
