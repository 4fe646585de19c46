use std::borrow::Cow;

use invenio_core::control::{ControlError, DraftUpdate, ErrorKind};
use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, ErrorCode};
use serde_json::json;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps a control-plane failure to MCP error data. `data.kind` carries the
/// failure class so callers can tell transport failures from rejections.
pub(crate) fn map_err(err: ControlError) -> ErrorData {
    let kind = err.kind();
    let code = match kind {
        ErrorKind::Validation => ErrorCode::INVALID_PARAMS,
        ErrorKind::NotFound => ErrorCode::RESOURCE_NOT_FOUND,
        ErrorKind::Remote | ErrorKind::Transport => ErrorCode::INTERNAL_ERROR,
    };
    let mut error = mcp_err(code, err.to_string());
    error.data = Some(json!({
        "kind": kind.as_str(),
        "status": err.status(),
    }));
    error
}

/// Text confirmation, followed by the remote field errors when there are any.
pub(crate) fn update_result(update: &DraftUpdate) -> Result<CallToolResult, ErrorData> {
    let mut content = vec![Content::text(update.message.clone())];
    if !update.field_errors.is_empty() {
        content.push(Content::json(json!({
            "draft_id": update.draft_id,
            "field_errors": update.field_errors,
        }))?);
    }
    Ok(CallToolResult::success(content))
}
