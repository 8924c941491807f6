//! Module for core business logic services.
//!
//! This module encapsulates services that perform business operations on top
//! of the account store, most importantly the serialized balance transfer.

pub mod locks;
pub mod transfer;

pub use locks::{AccountLocks, PairGuard};
pub use transfer::{TransferError, TransferIntent, TransferPolicy, TransferReceipt, TransferService};
