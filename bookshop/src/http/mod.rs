//! HTTP layer: Axum router, handlers, session gate and responses.
//!
//! Public endpoints are `/health`, `/signup` and `/login`; everything else
//! requires a valid `Authorisation` session cookie.

mod auth;
mod error;
mod handlers;
mod responses;
mod state;


pub use handlers::router;
pub use state::AppState;
