//! HTTP adapters - router composition and the health probe.

mod health;
mod routes;

pub use health::{health_handler, HealthResponse};
pub use routes::{app_router, cors_layer};
