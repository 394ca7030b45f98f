//! HTTP surface of the clip processing relay.
//!
//! The binary in `main.rs` only wires configuration into these pieces; tests
//! build the same router in-process with mock backends.

pub mod api;
pub mod metrics;
pub mod state;
