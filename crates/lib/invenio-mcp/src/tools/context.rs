use invenio_core::store::RecordsApi;
use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::InvenioMcp;

/// Payload listing the MCP commands of this server.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
    pub resource_type_resolution: String,
}

impl HelpCommands {
    fn new(resource_type_resolution: &str) -> Self {
        Self {
            commands: [
                "help - List MCP commands and how the draft workflow fits together.",
                "list_records - List published records visible to the configured account.",
                "create_draft - Create an empty draft and make it the current draft.",
                "use_draft - Select an existing draft as the current draft.",
                "current_draft - Show the current draft id of this session.",
                "set_title - Set the draft title.",
                "set_description - Set the draft description.",
                "set_publication_date - Set the publication date (ISO-8601).",
                "set_resource_type - Set the resource type (see list_resource_types).",
                "list_resource_types - List accepted resource type ids.",
                "set_creators - Replace the creators list ('Family, Given' names, optional ORCID).",
                "upload_file - Attach a local file to the draft.",
                "publish_draft - Publish the draft. This cannot be undone.",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            resource_type_resolution: resource_type_resolution.to_string(),
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl<A: RecordsApi> InvenioMcp<A> {
    #[tool(description = "List the MCP commands and how the draft workflow fits together.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        let mode = self.control.resource_type_resolution().as_str();
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::new(mode))?]))
    }
}
