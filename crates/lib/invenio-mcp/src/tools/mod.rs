//! MCP tool modules.
//!
//! Tools are grouped by domain: draft lifecycle (create, select, upload,
//! publish), metadata edits, and contextual help.

pub mod drafts;
pub mod metadata;
mod context;
