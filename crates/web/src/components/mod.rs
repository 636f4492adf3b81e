mod admin_guard;
mod reauth_modal;
mod session_button;
mod spinner;

pub use admin_guard::{AdminGuard, RequireAuth};
pub use reauth_modal::ReauthModal;
pub use session_button::SessionButton;
pub use spinner::{LoadingSpinner as Spinner, SpinnerSize};
