//! MCP server implementation for invenio-mcp.
//!
//! This crate wires the draft control plane into rmcp tool handlers and
//! exposes the MCP-facing API surface for creating, editing, and publishing
//! InvenioRDM drafts.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use invenio_core::control::DraftControlPlane;
use invenio_core::session::DraftSession;
use invenio_core::store::RecordsApi;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

pub use tools::drafts::{DraftParams, UploadFileParams, UseDraftParams};
pub use tools::metadata::{
    CreatorParam,
    ListResourceTypesParams,
    SetCreatorsParams,
    SetDescriptionParams,
    SetPublicationDateParams,
    SetResourceTypeParams,
    SetTitleParams,
};

const SERVER_INSTRUCTIONS: &str = r"invenio-mcp provides MCP tools for creating, describing, and publishing records in an InvenioRDM repository.

Workflow:
1. Call `create_draft` to start a new record. The new draft becomes the current draft of this
   session, so later tools may omit `draft_id`. Use `use_draft` to switch to an existing draft and
   `current_draft` to see which one is selected.
2. Describe the draft; each call updates one field and keeps every other field untouched:
   - `set_title`, `set_description`, `set_publication_date` (ISO-8601, e.g. 2024-05-31).
   - `set_resource_type` (see `list_resource_types` for accepted values).
   - `set_creators` replaces the full creators list. Names use the `Family, Given` form; ORCID is optional.
3. Optionally attach files with `upload_file`.
4. Call `publish_draft`. Publishing is permanent; the remote repository rejects drafts with
   missing required metadata and reports which fields are missing.

Notes:
- `list_records` returns published records visible to the configured account.
- Errors carry `data.kind`: `validation`, `not_found`, `remote`, or `transport`. Only `transport`
  errors are worth retrying, and never retry `publish_draft` blindly.
- `health` returns `ok`.";

/// MCP server wrapper around the draft control plane and the session's
/// current draft.
pub struct InvenioMcp<A: RecordsApi> {
    tool_router: ToolRouter<Self>,
    control: DraftControlPlane<A>,
    session: Arc<DraftSession>,
}

impl<A: RecordsApi> Clone for InvenioMcp<A> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            control: self.control.clone(),
            session: self.session.clone(),
        }
    }
}

impl<A: RecordsApi> InvenioMcp<A> {
    /// Creates a server with a fresh, empty draft session.
    #[must_use]
    pub fn new(control: DraftControlPlane<A>) -> Self {
        Self::with_session(control, Arc::new(DraftSession::new()))
    }

    /// Creates a server bound to an existing session.
    #[must_use]
    pub fn with_session(control: DraftControlPlane<A>, session: Arc<DraftSession>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_drafts()
            + Self::tool_router_metadata()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
            session,
        }
    }

    #[must_use]
    pub const fn control(&self) -> &DraftControlPlane<A> {
        &self.control
    }

    #[must_use]
    pub fn session(&self) -> Arc<DraftSession> {
        self.session.clone()
    }

    /// Resolves an optional tool argument to a draft id via the session.
    pub(crate) async fn draft_id(&self, explicit: Option<&str>) -> Result<String, ErrorData> {
        self.session
            .resolve(explicit)
            .await
            .map_err(helpers::map_err)
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<A: RecordsApi> InvenioMcp<A> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl<A: RecordsApi> ServerHandler for InvenioMcp<A> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
