//! Records API interface and its implementations.
//!
//! `RecordsApi` is the only seam through which the control plane reaches the
//! remote repository. `HttpRecordsApi` talks to a live InvenioRDM instance;
//! `MemoryRecordsApi` keeps drafts in memory and records every call.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use invenio_model::{Record, VocabularyEntry};
use serde_json::Value;
use thiserror::Error;

pub use http::{HttpApiConfig, HttpRecordsApi, RetryPolicy};
pub use memory::{CallKind, MemoryRecordsApi, RecordedCall};

/// Failures reported by a records API call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The remote service answered 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote service rejected the payload (e.g. publish with incomplete metadata).
    #[error("rejected by remote service: {0}")]
    Validation(String),

    /// Any other non-2xx answer, or a 2xx body missing the expected fields.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (connect failure, timeout, broken body).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Whether repeating the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status associated with the failure, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            Self::Remote { status, .. } => Some(*status),
            Self::Validation(_) | Self::Transport(_) => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Operations the tool server performs against the remote records API.
#[async_trait]
pub trait RecordsApi: Send + Sync + 'static {
    /// `GET /records`, returning the raw hits.
    async fn list_records(&self) -> ApiResult<Vec<Value>>;

    /// `POST /records` with an empty body.
    async fn create_draft(&self) -> ApiResult<Record>;

    /// `GET /records/{id}/draft`.
    async fn get_draft(&self, record_id: &str) -> ApiResult<Record>;

    /// `PUT /records/{id}/draft` with the full draft body.
    async fn update_draft(&self, draft: &Record) -> ApiResult<Record>;

    /// `POST /records/{id}/draft/actions/publish`.
    async fn publish_draft(&self, record_id: &str) -> ApiResult<Record>;

    /// `GET /vocabularies/resourcetypes?q=...`.
    async fn search_resource_types(&self, query: &str) -> ApiResult<Vec<VocabularyEntry>>;

    /// `POST /records/{id}/draft/files` declaring a single file key.
    async fn init_file(&self, record_id: &str, key: &str) -> ApiResult<()>;

    /// `PUT /records/{id}/draft/files/{key}/content`.
    async fn upload_file_content(&self, record_id: &str, key: &str, content: Vec<u8>)
    -> ApiResult<()>;

    /// `POST /records/{id}/draft/files/{key}/commit`.
    async fn commit_file(&self, record_id: &str, key: &str) -> ApiResult<()>;
}
