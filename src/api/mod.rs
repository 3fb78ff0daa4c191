//! API layer - HTTP endpoints and middleware

pub mod admin;
pub mod health;
pub mod middleware;
pub mod public;
pub mod router;
pub mod state;
pub mod types;

pub use middleware::RequireApiKey;
pub use router::create_router;
pub use state::AppState;
