//! Saved credential sets
//!
//! This module keeps the list of accounts used for batch check-in:
//! - Account records with generated ids and optional labels
//! - A pluggable backend holding the whole list in one slot
//! - The store that persists on every mutation

pub mod types;
pub mod store;
pub mod backend;

pub use types::{Account, AccountId, AccountUpdate};
pub use store::AccountStore;
pub use backend::{AccountBackend, JsonFileBackend, MemoryBackend};

/// Name of the single durable slot holding the account list.
pub const STORAGE_KEY: &str = "nkust_accounts";
