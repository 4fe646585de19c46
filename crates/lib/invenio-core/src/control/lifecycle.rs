use std::path::Path;

use invenio_model::{Record, RecordRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::store::{ApiError, RecordsApi};

use super::{ControlError, DraftControlPlane, ensure_draft_id};

/// Report for a completed three-step file upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub draft_id: String,
    pub key: String,
    pub size: usize,
}

impl<A: RecordsApi> DraftControlPlane<A> {
    /// Lists records visible to the configured token.
    ///
    /// # Errors
    /// Returns `ControlError` if the remote call fails.
    pub async fn list_records(&self) -> Result<Vec<Value>, ControlError> {
        Ok(self.api.list_records().await?)
    }

    /// Creates an empty draft.
    ///
    /// # Errors
    /// Returns `ControlError` if the remote call fails or the response has no link.
    pub async fn create_draft(&self) -> Result<RecordRef, ControlError> {
        let record = self.api.create_draft().await?;
        let created = record_ref(&record)?;
        info!(draft_id = %created.id, "draft created");
        Ok(created)
    }

    /// Requests publication of a draft. The remote service decides whether the
    /// draft's metadata is complete.
    ///
    /// # Errors
    /// Returns `ControlError::Api` with `NotFound` for unknown drafts,
    /// `Validation` when the remote rejects incomplete metadata, or any other
    /// remote failure.
    pub async fn publish_draft(&self, draft_id: &str) -> Result<RecordRef, ControlError> {
        let draft_id = ensure_draft_id(draft_id)?;
        let record = self.api.publish_draft(draft_id).await?;
        let published = record_ref(&record)?;
        info!(draft_id, url = %published.url, "draft published");
        Ok(published)
    }

    /// Attaches a local file to a draft: declare, upload content, commit.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` if the path has no usable file name
    /// or cannot be read, otherwise the first failing remote step.
    pub async fn upload_file(
        &self,
        draft_id: &str,
        path: &Path,
    ) -> Result<FileUpload, ControlError> {
        let draft_id = ensure_draft_id(draft_id)?;
        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                ControlError::Validation(format!("{} has no usable file name", path.display()))
            })?
            .to_string();
        let content = tokio::fs::read(path).await.map_err(|err| {
            ControlError::Validation(format!("cannot read {}: {err}", path.display()))
        })?;
        let size = content.len();

        self.api.init_file(draft_id, &key).await?;
        self.api.upload_file_content(draft_id, &key, content).await?;
        self.api.commit_file(draft_id, &key).await?;
        info!(draft_id, key = %key, size, "file uploaded");

        Ok(FileUpload {
            draft_id: draft_id.to_string(),
            key,
            size,
        })
    }
}

fn record_ref(record: &Record) -> Result<RecordRef, ApiError> {
    let url = record.url().ok_or_else(|| ApiError::Remote {
        status: 200,
        message: format!("record {} response is missing links.self_html", record.id),
    })?;
    Ok(RecordRef {
        id: record.id.clone(),
        url: url.to_string(),
    })
}
