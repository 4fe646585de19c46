use std::{fmt, str::FromStr, sync::Arc};

use thiserror::Error;

use crate::store::{ApiError, RecordsApi};

pub mod lifecycle;
pub mod metadata;

pub use lifecycle::FileUpload;
pub use metadata::{DraftUpdate, MetadataEdit};

#[derive(Debug, Error)]
pub enum ControlError {
    /// Rejected locally; nothing was sent to the remote service.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ControlError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Api(ApiError::Validation(_)) => ErrorKind::Validation,
            Self::Api(ApiError::NotFound(_)) => ErrorKind::NotFound,
            Self::Api(ApiError::Remote { .. }) => ErrorKind::Remote,
            Self::Api(ApiError::Transport(_)) => ErrorKind::Transport,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => None,
            Self::Api(err) => err.status(),
        }
    }
}

/// Failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Remote,
    Transport,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Remote => "remote",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `set_resource_type` turns caller input into a vocabulary id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResourceTypeResolution {
    /// Input must be one of the fixed resource type ids.
    #[default]
    FixedEnum,
    /// Input is a query against the remote resource type vocabulary.
    VocabularyLookup,
}

impl ResourceTypeResolution {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FixedEnum => "fixed-enum",
            Self::VocabularyLookup => "vocabulary-lookup",
        }
    }
}

impl FromStr for ResourceTypeResolution {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed-enum" => Ok(Self::FixedEnum),
            "vocabulary-lookup" => Ok(Self::VocabularyLookup),
            other => Err(format!(
                "unknown resource type resolution '{other}' (expected fixed-enum or vocabulary-lookup)"
            )),
        }
    }
}

/// Entry point for every draft operation.
pub struct DraftControlPlane<A: RecordsApi> {
    api: Arc<A>,
    resource_types: ResourceTypeResolution,
}

impl<A: RecordsApi> Clone for DraftControlPlane<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            resource_types: self.resource_types,
        }
    }
}

impl<A: RecordsApi> DraftControlPlane<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::from_arc(Arc::new(api))
    }

    #[must_use]
    pub const fn from_arc(api: Arc<A>) -> Self {
        Self {
            api,
            resource_types: ResourceTypeResolution::FixedEnum,
        }
    }

    #[must_use]
    pub const fn with_resource_type_resolution(mut self, mode: ResourceTypeResolution) -> Self {
        self.resource_types = mode;
        self
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn resource_type_resolution(&self) -> ResourceTypeResolution {
        self.resource_types
    }
}

/// Trims a caller-supplied draft id and rejects empty values.
pub(crate) fn ensure_draft_id(draft_id: &str) -> Result<&str, ControlError> {
    let trimmed = draft_id.trim();
    if trimmed.is_empty() {
        return Err(ControlError::Validation("draft_id is required".to_string()));
    }
    Ok(trimmed)
}
