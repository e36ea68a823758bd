#![forbid(unsafe_code)]

//! Blood Bridge runtime.
//!
//! Wraps the domain store with durable slot persistence, a shared session,
//! the timer-driven logistics simulation and the AI advisory flows.
//!
//! No domain rules live here. Every mutation goes through
//! `bridge_core::BridgeStore`.

pub mod advisory;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod simulation;
pub mod slot_codec;
pub mod storage;
