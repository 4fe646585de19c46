//! Core services for invenio-mcp.
//!
//! This crate owns the outbound records API (`store`), the draft control plane
//! that performs metadata read-modify-write cycles and lifecycle transitions
//! (`control`), and the per-connection draft session context (`session`).

pub mod control;
pub mod session;
pub mod store;
