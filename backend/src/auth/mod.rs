//! Authentication module for credentials, access tokens, and access control.
//!
//! This module provides the public interface for sign-in, password hashing,
//! token issuance and validation, and the middleware that guards protected routes.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;

// Re-exports for convenience
pub use errors::*;
pub use middleware::require_auth;
pub use models::*;
pub use routes::auth_router;
pub use service::{hash_password, verify_password, TokenService};
