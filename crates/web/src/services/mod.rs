pub mod events;
pub mod navigation;
pub mod scheduler;
pub mod session;
pub mod storage;

pub use events::broadcast_refresh;
pub use navigation::{NavigationError, current_url, navigate, replace_url};
pub use scheduler::{BrowserClock, BrowserScheduler};
pub use session::{StartupError, init_session, session_manager};
pub use storage::LocalTokenStore;
