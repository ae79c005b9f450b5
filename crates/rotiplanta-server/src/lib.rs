//! Roti Planta server: HTTP endpoints in front of the AI tables and the
//! profile store.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
