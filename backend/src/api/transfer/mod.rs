//! Balance transfer API.

pub mod handlers;
pub mod routes;

pub use routes::transfer_router;
