//! HTTP handlers for token-service.

pub mod health;
pub mod metrics;
pub mod send;
pub mod status;
pub mod tokens;

pub use health::health_check;
pub use self::metrics::metrics_endpoint;
pub use send::simulate_send;
pub use status::status;
pub use tokens::list_tokens;
