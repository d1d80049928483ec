pub mod analytics;
pub mod auth;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod sessions;
pub mod state;

// Re-export the handlers the binary wires into the router.
pub use analytics::{monthly_handler, summary_handler};
pub use auth::{login_handler, logout_handler, register_handler};
pub use middleware::require_auth;
pub use sessions::{create_session_handler, get_streak_handler, list_sessions_handler};
