//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. Request ID (add unique ID to each request)
//! 3. `TraceLayer` (request span carrying the request ID)
//! 4. Security headers
//! 5. Session layer (signed cookie)
//! 6. Rate limiting on `/login` and `/register` (governor)
//!
//! Authentication is not a layer: handlers take [`RequireAuth`],
//! [`RequireAdmin`] or [`OptionalAuth`] extractor arguments.

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAdmin, RequireAuth, clear_current_user, set_current_user};
pub use flash::{set_notice, take_notice};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
