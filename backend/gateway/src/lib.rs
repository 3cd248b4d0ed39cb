//! Plastiscan Gateway HTTP Server
//!
//! Serves the upload form and results dashboard, and a JSON API for
//! programmatic analysis.

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod server;
pub mod upload;

pub use error::ApiError;
pub use rate_limit::RateLimiter;
pub use server::{build_router, start_server, GatewayState};
