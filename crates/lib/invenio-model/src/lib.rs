//! Data model for invenio-mcp.
//!
//! This crate defines the record, creator, and vocabulary types shared by the
//! HTTP client, the control plane, and the MCP tool surface, plus the REST
//! path helpers for the InvenioRDM records API.

pub mod models;
pub mod schema;

pub use models::*;
