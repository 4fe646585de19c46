//! Per-connection draft context.
//!
//! A `DraftSession` remembers the draft the caller is working on so tools can
//! omit `draft_id`. Each MCP connection owns its own session; nothing is
//! shared between connections.

use tokio::sync::RwLock;

use crate::control::ControlError;

#[derive(Debug, Default)]
pub struct DraftSession {
    current: RwLock<Option<String>>,
}

impl DraftSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    /// Makes `draft_id` the current draft. Blank ids clear it.
    pub async fn set_current(&self, draft_id: &str) {
        let trimmed = draft_id.trim();
        let mut current = self.current.write().await;
        *current = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    pub async fn clear(&self) {
        self.current.write().await.take();
    }

    /// Picks the explicit id when given, otherwise the current draft.
    ///
    /// # Errors
    /// Returns `ControlError::Validation` when neither is available.
    pub async fn resolve(&self, explicit: Option<&str>) -> Result<String, ControlError> {
        if let Some(draft_id) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
            return Ok(draft_id.to_string());
        }
        self.current().await.ok_or_else(|| {
            ControlError::Validation(
                "draft_id is required (no current draft in this session)".to_string(),
            )
        })
    }
}
