use invenio_core::store::RecordsApi;
use invenio_model::CreatorInput;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{InvenioMcp, helpers};

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetTitleParams {
    pub title: String,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetDescriptionParams {
    pub description: String,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetPublicationDateParams {
    /// ISO-8601 date, e.g. `2024-05-31`.
    pub publication_date: String,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetResourceTypeParams {
    /// Resource type id such as `publication-article` or `dataset`.
    pub resource_type: String,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListResourceTypesParams {
    /// Optional filter applied to resource type ids.
    pub query: Option<String>,
}

/// One creator as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreatorParam {
    /// Name in `Family, Given` form.
    pub name: String,
    /// ORCID identifier, e.g. `0000-0002-1825-0097`.
    pub orcid: Option<String>,
}

impl From<CreatorParam> for CreatorInput {
    fn from(param: CreatorParam) -> Self {
        Self {
            name: param.name,
            orcid: param.orcid,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetCreatorsParams {
    /// Replaces the full creators list, in order.
    pub creators: Vec<CreatorParam>,
    /// Draft id. Defaults to the current draft of this session.
    pub draft_id: Option<String>,
}

#[tool_router(router = tool_router_metadata, vis = "pub")]
impl<A: RecordsApi> InvenioMcp<A> {
    #[tool(description = "Set the title of a draft.")]
    async fn set_title(
        &self,
        Parameters(params): Parameters<SetTitleParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let update = self
            .control
            .set_title(&draft_id, &params.title)
            .await
            .map_err(helpers::map_err)?;
        helpers::update_result(&update)
    }

    #[tool(description = "Set the description of a draft.")]
    async fn set_description(
        &self,
        Parameters(params): Parameters<SetDescriptionParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let update = self
            .control
            .set_description(&draft_id, &params.description)
            .await
            .map_err(helpers::map_err)?;
        helpers::update_result(&update)
    }

    #[tool(description = "Set the publication date of a draft (ISO-8601, e.g. 2024-05-31).")]
    async fn set_publication_date(
        &self,
        Parameters(params): Parameters<SetPublicationDateParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let update = self
            .control
            .set_publication_date(&draft_id, &params.publication_date)
            .await
            .map_err(helpers::map_err)?;
        helpers::update_result(&update)
    }

    #[tool(description = "Set the resource type of a draft. See list_resource_types for accepted values.")]
    async fn set_resource_type(
        &self,
        Parameters(params): Parameters<SetResourceTypeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let update = self
            .control
            .set_resource_type(&draft_id, &params.resource_type)
            .await
            .map_err(helpers::map_err)?;
        helpers::update_result(&update)
    }

    #[tool(description = "List accepted resource type ids, optionally filtered.")]
    async fn list_resource_types(
        &self,
        Parameters(params): Parameters<ListResourceTypesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let resource_types = self
            .control
            .list_resource_types(params.query.as_deref())
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(json!({
            "resolution": self.control.resource_type_resolution().as_str(),
            "resource_types": resource_types,
        }))?]))
    }

    #[tool(description = "Replace the creators of a draft. Names use the 'Family, Given' form; ORCID is optional.")]
    async fn set_creators(
        &self,
        Parameters(params): Parameters<SetCreatorsParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let draft_id = self.draft_id(params.draft_id.as_deref()).await?;
        let creators: Vec<CreatorInput> = params.creators.into_iter().map(Into::into).collect();
        let update = self
            .control
            .set_creators(&draft_id, &creators)
            .await
            .map_err(helpers::map_err)?;
        helpers::update_result(&update)
    }
}

#[cfg(test)]
mod tests {
    use invenio_core::control::DraftControlPlane;
    use invenio_core::store::{CallKind, MemoryRecordsApi};
    use rmcp::model::ErrorCode;
    use serde_json::{Map, Value};

    use super::*;

    fn server_with_draft() -> (InvenioMcp<MemoryRecordsApi>, MemoryRecordsApi, String) {
        let api = MemoryRecordsApi::new();
        let mut metadata = Map::new();
        metadata.insert("publisher".to_string(), json!("CERN"));
        let draft_id = api.insert_draft(metadata);
        let server = InvenioMcp::new(DraftControlPlane::new(api.clone()));
        (server, api, draft_id)
    }

    #[tokio::test]
    async fn set_title_uses_the_current_draft() {
        let (server, api, draft_id) = server_with_draft();
        server.session.set_current(&draft_id).await;

        server
            .set_title(Parameters(SetTitleParams {
                title: "Detector notes".to_string(),
                draft_id: None,
            }))
            .await
            .expect("title set");

        let draft = api.draft(&draft_id).expect("draft exists");
        assert_eq!(draft.metadata.get("title"), Some(&json!("Detector notes")));
        assert_eq!(draft.metadata.get("publisher"), Some(&json!("CERN")));
    }

    #[tokio::test]
    async fn unknown_resource_type_never_touches_the_draft() {
        let (server, api, draft_id) = server_with_draft();

        let err = server
            .set_resource_type(Parameters(SetResourceTypeParams {
                resource_type: "poem".to_string(),
                draft_id: Some(draft_id),
            }))
            .await
            .expect_err("poem is not a resource type");

        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(api.call_count(CallKind::GetDraft), 0);
        assert_eq!(api.call_count(CallKind::UpdateDraft), 0);
    }

    #[tokio::test]
    async fn set_creators_maps_params_in_order() {
        let (server, api, draft_id) = server_with_draft();

        server
            .set_creators(Parameters(SetCreatorsParams {
                creators: vec![
                    CreatorParam {
                        name: "Doe, Jane".to_string(),
                        orcid: Some("0000-0002-1825-0097".to_string()),
                    },
                    CreatorParam {
                        name: "Smith".to_string(),
                        orcid: None,
                    },
                ],
                draft_id: Some(draft_id.clone()),
            }))
            .await
            .expect("creators set");

        let draft = api.draft(&draft_id).expect("draft exists");
        let creators = draft
            .metadata
            .get("creators")
            .and_then(Value::as_array)
            .expect("creators written");
        assert_eq!(creators.len(), 2);
        assert_eq!(creators[0]["person_or_org"]["given_name"], json!("Jane"));
        assert_eq!(creators[1]["person_or_org"]["family_name"], json!("Smith"));
    }

    #[tokio::test]
    async fn list_resource_types_filters_fixed_set() {
        let (server, _api, _draft_id) = server_with_draft();

        let result = server
            .list_resource_types(Parameters(ListResourceTypesParams {
                query: Some("image".to_string()),
            }))
            .await
            .expect("listing succeeds");

        assert_eq!(result.content.len(), 1);
        let rendered = serde_json::to_value(&result.content[0]).expect("content serializes");
        let text = rendered["text"].as_str().expect("json content is text");
        let payload: Value = serde_json::from_str(text).expect("payload is json");
        assert_eq!(payload["resolution"], json!("fixed-enum"));
        assert_eq!(
            payload["resource_types"],
            json!(["image", "image-figure", "image-photo"])
        );
    }
}
