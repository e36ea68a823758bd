#![forbid(unsafe_code)]

//! Blood Bridge kernel: domain types, business rules, the state store and
//! the logistics simulation steps. No I/O, no timers.

/// Version tag of the persisted state layout.
pub const STATE_SCHEMA_VERSION: u32 = 1;

pub mod domain;
pub mod error;
pub mod rules;
pub mod clock;
pub mod seed;
pub mod logistics;
pub mod commands;
pub mod invariants;
pub mod transitions;
pub mod hashing;
pub mod analytics;
pub mod store;

pub use error::{BridgeError, Result};
pub use store::BridgeStore;
