use std::path::PathBuf;

use invenio_core::store::RecordsApi;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ErrorCode},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{InvenioMcp, helpers};

/// Parameters for tools that act on one draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DraftParams {
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

/// Parameters for selecting the current draft.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UseDraftParams {
    pub draft_id: String,
}

/// Parameters for attaching a local file to a draft.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UploadFileParams {
    /// Path of the file on the machine running the server.
    pub file_path: String,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[tool_router(router = tool_router_drafts, vis = "pub")]
impl<A: RecordsApi> InvenioMcp<A> {
    #[tool(description = "List published records visible to the configured account.")]
    async fn list_records(&self) -> Result<CallToolResult, ErrorData> {
        let records = self.control.list_records().await.map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(records)?]))
    }

    #[tool(description = "Create a new empty draft. It becomes the current draft of this session.")]
    async fn create_draft(&self) -> Result<CallToolResult, ErrorData> {
        let created = self.control.create_draft().await.map_err(helpers::map_err)?;
        self.session.set_current(&created.id).await;
        Ok(CallToolResult::success(vec![
            Content::text(format!("Draft {} created at {}", created.id, created.url)),
            Content::json(&created)?,
        ]))
    }

    #[tool(description = "Select an existing draft as the current draft of this session.")]
    async fn use_draft(
        &self,
        Parameters(params): Parameters<UseDraftParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = params.draft_id.trim();
        if draft_id.is_empty() {
            return Err(helpers::mcp_err(ErrorCode::INVALID_PARAMS, "draft_id is required"));
        }
        self.session.set_current(draft_id).await;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Current draft set to {draft_id}"
        ))]))
    }

    #[tool(description = "Show the current draft id of this session, or null when none is selected.")]
    async fn current_draft(&self) -> Result<CallToolResult, ErrorData> {
        let current = self.session.current().await;
        Ok(CallToolResult::success(vec![Content::json(json!({ "draft_id": current }))?]))
    }

    #[tool(description = "Upload a local file to a draft (declare, upload content, commit).")]
    async fn upload_file(
        &self,
        Parameters(params): Parameters<UploadFileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let path = PathBuf::from(params.file_path);
        let upload = self
            .control
            .upload_file(&draft_id, &path)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![
            Content::text(format!("File {} uploaded to draft {}", upload.key, upload.draft_id)),
            Content::json(&upload)?,
        ]))
    }

    #[tool(description = "Publish a draft. Publishing is permanent and assigns a persistent identifier.")]
    async fn publish_draft(
        &self,
        Parameters(params): Parameters<DraftParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let published = self
            .control
            .publish_draft(&draft_id)
            .await
            .map_err(helpers::map_err)?;
        if self.session.current().await.as_deref() == Some(draft_id.as_str()) {
            self.session.clear().await;
        }
        Ok(CallToolResult::success(vec![
            Content::text(format!("Draft {} published at {}", published.id, published.url)),
            Content::json(&published)?,
        ]))
    }
}
