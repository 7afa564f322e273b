//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Security headers
//!
//! Authentication is not a layer: routes opt in through the [`AuthUser`]
//! and [`AdminUser`] extractors.

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{AdminUser, AuthUser};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
