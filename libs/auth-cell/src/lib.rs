pub mod handlers;
pub mod models;
pub mod router;
pub mod state;

pub use router::auth_routes;
pub use state::AuthState;
