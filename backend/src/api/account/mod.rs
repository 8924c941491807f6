//! Account management API.
//!
//! Creating an account is public. Listing, reading, renaming and deleting
//! accounts require a valid access token.

pub mod handlers;
pub mod routes;

pub use routes::account_router;
