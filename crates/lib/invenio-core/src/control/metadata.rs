use std::fmt;

use invenio_model::schema::RESOURCE_TYPE_FIELD;
use invenio_model::{Creator, CreatorInput, FieldError, ResourceType, ResourceTypeRef};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::store::RecordsApi;

use super::{ControlError, DraftControlPlane, ResourceTypeResolution, ensure_draft_id};

/// A single-field change to draft metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEdit {
    Title(String),
    Description(String),
    PublicationDate(String),
    /// Already-resolved resource type id.
    ResourceType(String),
    /// Replaces the whole creators list.
    Creators(Vec<Creator>),
}

impl MetadataEdit {
    /// Metadata key the edit writes to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::PublicationDate(_) => "publication_date",
            Self::ResourceType(_) => RESOURCE_TYPE_FIELD,
            Self::Creators(_) => "creators",
        }
    }

    /// JSON value stored under [`Self::field`].
    ///
    /// # Errors
    /// Returns `ControlError::Validation` if the creators cannot be encoded.
    pub fn value(&self) -> Result<Value, ControlError> {
        match self {
            Self::Title(value) | Self::Description(value) | Self::PublicationDate(value) => {
                Ok(Value::String(value.clone()))
            }
            Self::ResourceType(id) => encode(&ResourceTypeRef { id: id.clone() }),
            Self::Creators(creators) => encode(creators),
        }
    }

    fn confirmation(&self, draft_id: &str) -> String {
        match self {
            Self::Title(title) => format!("Title set to '{title}' for draft {draft_id}"),
            Self::Description(description) => {
                format!("Description set to '{description}' for draft {draft_id}")
            }
            Self::PublicationDate(date) => {
                format!("Publication date set to '{date}' for draft {draft_id}")
            }
            Self::ResourceType(id) => format!("Resource type set to '{id}' for draft {draft_id}"),
            Self::Creators(creators) => {
                format!("{} creator(s) set for draft {draft_id}", creators.len())
            }
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ControlError> {
    serde_json::to_value(value)
        .map_err(|err| ControlError::Validation(format!("cannot encode metadata value: {err}")))
}

/// Outcome of a metadata write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftUpdate {
    pub draft_id: String,
    pub field: &'static str,
    pub message: String,
    /// Field errors the remote service reported while accepting the draft.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl fmt::Display for DraftUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<A: RecordsApi> DraftControlPlane<A> {
    /// Sets `metadata.title`, keeping every other field of the draft.
    ///
    /// # Errors
    /// Returns `ControlError` if the draft id is blank or either remote call fails.
    pub async fn set_title(&self, draft_id: &str, title: &str) -> Result<DraftUpdate, ControlError> {
        self.apply_edit(draft_id, MetadataEdit::Title(title.to_string()))
            .await
    }

    /// Sets `metadata.description`.
    ///
    /// # Errors
    /// Returns `ControlError` if the draft id is blank or either remote call fails.
    pub async fn set_description(
        &self,
        draft_id: &str,
        description: &str,
    ) -> Result<DraftUpdate, ControlError> {
        self.apply_edit(draft_id, MetadataEdit::Description(description.to_string()))
            .await
    }

    /// Sets `metadata.publication_date`. The date format is checked by the
    /// remote service, not here.
    ///
    /// # Errors
    /// Returns `ControlError` if the draft id is blank or either remote call fails.
    pub async fn set_publication_date(
        &self,
        draft_id: &str,
        date: &str,
    ) -> Result<DraftUpdate, ControlError> {
        self.apply_edit(draft_id, MetadataEdit::PublicationDate(date.to_string()))
            .await
    }

    /// Resolves and sets `metadata.resource_type`.
    ///
    /// The value is resolved before the draft is fetched, so an unknown
    /// resource type never reaches the draft endpoints.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` for unknown values, otherwise any
    /// remote failure.
    pub async fn set_resource_type(
        &self,
        draft_id: &str,
        resource_type: &str,
    ) -> Result<DraftUpdate, ControlError> {
        let draft_id = ensure_draft_id(draft_id)?;
        let resolved = self.resolve_resource_type(resource_type).await?;
        self.apply_edit(draft_id, MetadataEdit::ResourceType(resolved))
            .await
    }

    /// Replaces `metadata.creators` with the given people, in order.
    ///
    /// # Errors
    /// Returns `ControlError` if the draft id is blank or either remote call fails.
    pub async fn set_creators(
        &self,
        draft_id: &str,
        creators: &[CreatorInput],
    ) -> Result<DraftUpdate, ControlError> {
        let creators = creators.iter().map(Creator::from).collect();
        self.apply_edit(draft_id, MetadataEdit::Creators(creators))
            .await
    }

    /// Maps caller input to a resource type id according to the configured
    /// resolution mode.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` when nothing matches, or the
    /// vocabulary lookup failure.
    pub async fn resolve_resource_type(&self, value: &str) -> Result<String, ControlError> {
        let value = value.trim();
        match self.resource_types {
            ResourceTypeResolution::FixedEnum => value
                .parse::<ResourceType>()
                .map(|resource_type| resource_type.as_str().to_string())
                .map_err(|err| ControlError::Validation(err.to_string())),
            ResourceTypeResolution::VocabularyLookup => {
                if value.is_empty() {
                    return Err(ControlError::Validation(
                        "resource_type is required".to_string(),
                    ));
                }
                let hits = self.api.search_resource_types(value).await?;
                hits.iter()
                    .find(|entry| entry.id == value)
                    .or_else(|| hits.first())
                    .map(|entry| entry.id.clone())
                    .ok_or_else(|| {
                        ControlError::Validation(format!(
                            "no matching resource type found for '{value}'"
                        ))
                    })
            }
        }
    }

    /// Lists resource type ids, optionally filtered by a substring.
    ///
    /// # Errors
    /// Returns `ControlError` if the vocabulary lookup fails.
    pub async fn list_resource_types(&self, query: Option<&str>) -> Result<Vec<String>, ControlError> {
        let query = query.map(str::trim).filter(|value| !value.is_empty());
        match self.resource_types {
            ResourceTypeResolution::FixedEnum => Ok(ResourceType::ids()
                .into_iter()
                .filter(|id| query.is_none_or(|needle| id.contains(needle)))
                .map(str::to_string)
                .collect()),
            ResourceTypeResolution::VocabularyLookup => {
                let hits = self.api.search_resource_types(query.unwrap_or_default()).await?;
                Ok(hits.into_iter().map(|entry| entry.id).collect())
            }
        }
    }

    /// Fetches the full draft, changes one metadata field, and writes the full
    /// draft back. A failed fetch aborts before anything is written.
    async fn apply_edit(
        &self,
        draft_id: &str,
        edit: MetadataEdit,
    ) -> Result<DraftUpdate, ControlError> {
        let draft_id = ensure_draft_id(draft_id)?;
        let field = edit.field();
        let value = edit.value()?;

        let mut draft = self.api.get_draft(draft_id).await?;
        draft.metadata.insert(field.to_string(), value);
        let updated = self.api.update_draft(&draft).await?;

        for error in &updated.errors {
            warn!(draft_id, %error, "remote service reported a field error");
        }
        info!(draft_id, field, "draft metadata updated");

        Ok(DraftUpdate {
            draft_id: draft_id.to_string(),
            field,
            message: edit.confirmation(draft_id),
            field_errors: updated.errors,
        })
    }
}
