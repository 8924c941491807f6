//! Central module for organizing the application's main API endpoints.
//!
//! Account management and balance transfers live here; sign-in is part of
//! the `auth` module.

pub mod account;
pub mod transfer;
