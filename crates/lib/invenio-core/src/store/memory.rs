//! In-memory records API.
//!
//! Keeps drafts and published records in a map, mimics the remote service's
//! status behaviour (404 for unknown ids, publish rejected without a title),
//! and records every call so tests can assert on what was sent.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use invenio_model::{Record, RecordLinks, VocabularyEntry};
use serde_json::{Map, Value};

use super::{ApiError, ApiResult, RecordsApi};

const MEMORY_API_BASE: &str = "memory://api";
const MEMORY_HTML_BASE: &str = "memory://ui";

/// Call observed by [`MemoryRecordsApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    ListRecords,
    CreateDraft,
    GetDraft { record_id: String },
    UpdateDraft { record_id: String, body: Record },
    PublishDraft { record_id: String },
    SearchResourceTypes { query: String },
    InitFile { record_id: String, key: String },
    UploadFileContent { record_id: String, key: String, len: usize },
    CommitFile { record_id: String, key: String },
}

impl RecordedCall {
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        match self {
            Self::ListRecords => CallKind::ListRecords,
            Self::CreateDraft => CallKind::CreateDraft,
            Self::GetDraft { .. } => CallKind::GetDraft,
            Self::UpdateDraft { .. } => CallKind::UpdateDraft,
            Self::PublishDraft { .. } => CallKind::PublishDraft,
            Self::SearchResourceTypes { .. } => CallKind::SearchResourceTypes,
            Self::InitFile { .. } => CallKind::InitFile,
            Self::UploadFileContent { .. } => CallKind::UploadFileContent,
            Self::CommitFile { .. } => CallKind::CommitFile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListRecords,
    CreateDraft,
    GetDraft,
    UpdateDraft,
    PublishDraft,
    SearchResourceTypes,
    InitFile,
    UploadFileContent,
    CommitFile,
}

#[derive(Debug, Default)]
struct MemoryState {
    drafts: BTreeMap<String, Record>,
    published: BTreeMap<String, Record>,
    files: BTreeMap<(String, String), StoredFile>,
    resource_types: Vec<VocabularyEntry>,
    fail_on: HashMap<CallKind, ApiError>,
    calls: Vec<RecordedCall>,
    next_id: u64,
}

#[derive(Debug, Default, Clone)]
struct StoredFile {
    content: Vec<u8>,
    committed: bool,
}

/// Records API that lives entirely in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordsApi {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRecordsApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the resource type vocabulary returned by `search_resource_types`.
    #[must_use]
    pub fn with_resource_types<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().resource_types = ids
            .into_iter()
            .map(|id| VocabularyEntry {
                id: id.into(),
                extra: Map::new(),
            })
            .collect();
        self
    }

    /// Stores a draft with the given metadata and returns its id.
    pub fn insert_draft(&self, metadata: Map<String, Value>) -> String {
        let mut state = self.lock();
        let record_id = next_record_id(&mut state);
        let mut draft = new_draft(&record_id);
        draft.metadata = metadata;
        state.drafts.insert(record_id.clone(), draft);
        record_id
    }

    /// Makes every subsequent call of `kind` fail with `error`.
    pub fn fail_on(&self, kind: CallKind, error: ApiError) {
        self.lock().fail_on.insert(kind, error);
    }

    #[must_use]
    pub fn draft(&self, record_id: &str) -> Option<Record> {
        self.lock().drafts.get(record_id).cloned()
    }

    #[must_use]
    pub fn published(&self, record_id: &str) -> Option<Record> {
        self.lock().published.get(record_id).cloned()
    }

    /// Content of a committed file.
    #[must_use]
    pub fn committed_file(&self, record_id: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .files
            .get(&(record_id.to_string(), key.to_string()))
            .filter(|file| file.committed)
            .map(|file| file.content.clone())
    }

    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self, kind: CallKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns the injected failure for it, if any.
    fn record(&self, call: RecordedCall) -> Result<MutexGuard<'_, MemoryState>, ApiError> {
        let mut state = self.lock();
        let kind = call.kind();
        state.calls.push(call);
        if let Some(error) = state.fail_on.get(&kind).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

fn next_record_id(state: &mut MemoryState) -> String {
    state.next_id += 1;
    format!("mem{:02}-{:05}", state.next_id % 100, state.next_id)
}

fn new_draft(record_id: &str) -> Record {
    Record {
        id: record_id.to_string(),
        metadata: Map::new(),
        links: RecordLinks {
            self_api: Some(format!("{MEMORY_API_BASE}/records/{record_id}/draft")),
            self_html: Some(format!("{MEMORY_HTML_BASE}/uploads/{record_id}")),
            extra: Map::new(),
        },
        errors: Vec::new(),
        extra: Map::new(),
    }
}

fn not_found(record_id: &str) -> ApiError {
    ApiError::NotFound(format!("draft {record_id} does not exist"))
}

#[async_trait]
impl RecordsApi for MemoryRecordsApi {
    async fn list_records(&self) -> ApiResult<Vec<Value>> {
        let state = self.record(RecordedCall::ListRecords)?;
        state
            .published
            .values()
            .map(|record| {
                serde_json::to_value(record).map_err(|err| ApiError::Remote {
                    status: 500,
                    message: err.to_string(),
                })
            })
            .collect()
    }

    async fn create_draft(&self) -> ApiResult<Record> {
        let mut state = self.record(RecordedCall::CreateDraft)?;
        let record_id = next_record_id(&mut state);
        let draft = new_draft(&record_id);
        state.drafts.insert(record_id, draft.clone());
        Ok(draft)
    }

    async fn get_draft(&self, record_id: &str) -> ApiResult<Record> {
        let state = self.record(RecordedCall::GetDraft {
            record_id: record_id.to_string(),
        })?;
        state
            .drafts
            .get(record_id)
            .cloned()
            .ok_or_else(|| not_found(record_id))
    }

    async fn update_draft(&self, draft: &Record) -> ApiResult<Record> {
        let mut state = self.record(RecordedCall::UpdateDraft {
            record_id: draft.id.clone(),
            body: draft.clone(),
        })?;
        let Some(stored) = state.drafts.get_mut(&draft.id) else {
            return Err(not_found(&draft.id));
        };
        // The remote service replaces metadata wholesale on write.
        stored.metadata = draft.metadata.clone();
        stored.extra = draft.extra.clone();
        Ok(stored.clone())
    }

    async fn publish_draft(&self, record_id: &str) -> ApiResult<Record> {
        let mut state = self.record(RecordedCall::PublishDraft {
            record_id: record_id.to_string(),
        })?;
        let Some(draft) = state.drafts.get(record_id) else {
            return Err(not_found(record_id));
        };
        let has_title = draft
            .metadata
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|title| !title.trim().is_empty());
        if !has_title {
            return Err(ApiError::Validation(
                "metadata.title: Missing data for required field.".to_string(),
            ));
        }

        let mut record = draft.clone();
        record.links.self_api = Some(format!("{MEMORY_API_BASE}/records/{record_id}"));
        record.links.self_html = Some(format!("{MEMORY_HTML_BASE}/records/{record_id}"));
        state.drafts.remove(record_id);
        state.published.insert(record_id.to_string(), record.clone());
        Ok(record)
    }

    async fn search_resource_types(&self, query: &str) -> ApiResult<Vec<VocabularyEntry>> {
        let state = self.record(RecordedCall::SearchResourceTypes {
            query: query.to_string(),
        })?;
        let needle = query.to_lowercase();
        Ok(state
            .resource_types
            .iter()
            .filter(|entry| entry.id.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn init_file(&self, record_id: &str, key: &str) -> ApiResult<()> {
        let mut state = self.record(RecordedCall::InitFile {
            record_id: record_id.to_string(),
            key: key.to_string(),
        })?;
        if !state.drafts.contains_key(record_id) {
            return Err(not_found(record_id));
        }
        state
            .files
            .insert((record_id.to_string(), key.to_string()), StoredFile::default());
        Ok(())
    }

    async fn upload_file_content(
        &self,
        record_id: &str,
        key: &str,
        content: Vec<u8>,
    ) -> ApiResult<()> {
        let mut state = self.record(RecordedCall::UploadFileContent {
            record_id: record_id.to_string(),
            key: key.to_string(),
            len: content.len(),
        })?;
        let Some(file) = state.files.get_mut(&(record_id.to_string(), key.to_string())) else {
            return Err(ApiError::NotFound(format!("file {key} was not initialized")));
        };
        file.content = content;
        Ok(())
    }

    async fn commit_file(&self, record_id: &str, key: &str) -> ApiResult<()> {
        let mut state = self.record(RecordedCall::CommitFile {
            record_id: record_id.to_string(),
            key: key.to_string(),
        })?;
        let Some(file) = state.files.get_mut(&(record_id.to_string(), key.to_string())) else {
            return Err(ApiError::NotFound(format!("file {key} was not initialized")));
        };
        file.committed = true;
        Ok(())
    }
}
