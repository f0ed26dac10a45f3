//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)
//! 5. Session revalidation (once-per-process `check_auth`)

pub mod request_id;
pub mod revalidate;
pub mod session;

pub use request_id::request_id_middleware;
pub use revalidate::revalidate_session;
pub use session::create_session_layer;
