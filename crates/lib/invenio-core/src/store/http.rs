use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use invenio_model::schema;
use invenio_model::{ErrorBody, Record, SearchResult, VocabularyEntry};
use reqwest::header::{
    ACCEPT,
    AUTHORIZATION,
    CONTENT_TYPE,
    COOKIE,
    HeaderMap,
    HeaderValue,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::{ApiError, ApiResult, RecordsApi};

const USER_AGENT_VALUE: &str = concat!("invenio-mcp/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Retry policy for idempotent requests that failed before a response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Linear backoff: the n-th retry waits `backoff * n`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(250))
    }
}

/// Connection settings for [`HttpRecordsApi`].
#[derive(Clone)]
pub struct HttpApiConfig {
    pub base_url: Url,
    pub token: String,
    pub session_cookie: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpApiConfig {
    #[must_use]
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
            session_cookie: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_session_cookie(mut self, session_cookie: Option<String>) -> Self {
        self.session_cookie = session_cookie;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl fmt::Debug for HttpApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid {0} header value")]
    InvalidHeader(&'static str),
    #[error("base URL cannot carry a path: {0}")]
    InvalidBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Records API backed by the InvenioRDM REST interface.
#[derive(Debug, Clone)]
pub struct HttpRecordsApi {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpRecordsApi {
    /// Builds the HTTP client with the bearer token and session cookie attached
    /// to every request.
    ///
    /// # Errors
    /// Returns `ClientBuildError` if a credential is not a valid header value,
    /// the base URL cannot be extended with path segments, or the TLS backend
    /// fails to initialize.
    pub fn new(config: HttpApiConfig) -> Result<Self, ClientBuildError> {
        if config.base_url.cannot_be_a_base() {
            return Err(ClientBuildError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientBuildError::InvalidHeader("Authorization"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(cookie) = config.session_cookie.as_deref() {
            let mut cookie = HeaderValue::from_str(cookie)
                .map_err(|_| ClientBuildError::InvalidHeader("Cookie"))?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT_VALUE)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            retry: config.retry,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends a request. Idempotent requests are repeated on transport failure
    /// according to the retry policy; everything else is sent exactly once.
    async fn execute(&self, request: RequestBuilder, idempotent: bool) -> ApiResult<Response> {
        let max_attempts = if idempotent {
            self.retry.max_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            let Some(current) = request.try_clone() else {
                return request.send().await.map_err(transport_error);
            };
            match current.send().await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    let error = transport_error(err);
                    if attempt >= max_attempts {
                        return Err(error);
                    }
                    warn!(attempt, max_attempts, %error, "records API request failed, retrying");
                    tokio::time::sleep(self.retry.delay(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn list_records(&self) -> ApiResult<Vec<Value>> {
        let url = self.endpoint(&schema::records());
        debug!(path = url.path(), "GET records");
        let response = self.execute(self.client.get(url), true).await?;
        let result: SearchResult<Value> = read_json(response, Action::Default).await?;
        Ok(result.hits.hits)
    }

    async fn create_draft(&self) -> ApiResult<Record> {
        let url = self.endpoint(&schema::records());
        debug!(path = url.path(), "POST create draft");
        let response = self.execute(self.client.post(url).json(&json!({})), false).await?;
        read_json(response, Action::Default).await
    }

    async fn get_draft(&self, record_id: &str) -> ApiResult<Record> {
        let url = self.endpoint(&schema::draft(record_id));
        debug!(path = url.path(), "GET draft");
        let response = self.execute(self.client.get(url), true).await?;
        let status = response.status().as_u16();
        let body: Value = read_json(response, Action::Default).await?;
        editable_draft(status, body)
    }

    async fn update_draft(&self, draft: &Record) -> ApiResult<Record> {
        let url = self.endpoint(&schema::draft(&draft.id));
        debug!(path = url.path(), "PUT draft");
        let response = self.execute(self.client.put(url).json(draft), true).await?;
        read_json(response, Action::Default).await
    }

    async fn publish_draft(&self, record_id: &str) -> ApiResult<Record> {
        let url = self.endpoint(&schema::publish(record_id));
        debug!(path = url.path(), "POST publish draft");
        let response = self.execute(self.client.post(url), false).await?;
        read_json(response, Action::Publish).await
    }

    async fn search_resource_types(&self, query: &str) -> ApiResult<Vec<VocabularyEntry>> {
        let mut url = self.endpoint(&schema::VOCABULARY_RESOURCE_TYPES);
        url.query_pairs_mut().append_pair("q", query);
        debug!(path = url.path(), "GET resource type vocabulary");
        let response = self.execute(self.client.get(url), true).await?;
        let result: SearchResult<VocabularyEntry> = read_json(response, Action::Default).await?;
        Ok(result.hits.hits)
    }

    async fn init_file(&self, record_id: &str, key: &str) -> ApiResult<()> {
        let url = self.endpoint(&schema::draft_files(record_id));
        debug!(path = url.path(), key, "POST init file");
        let request = self.client.post(url).json(&json!([{ "key": key }]));
        let response = self.execute(request, false).await?;
        expect_success(response, Action::Default).await
    }

    async fn upload_file_content(
        &self,
        record_id: &str,
        key: &str,
        content: Vec<u8>,
    ) -> ApiResult<()> {
        let url = self.endpoint(&schema::draft_file_content(record_id, key));
        debug!(path = url.path(), bytes = content.len(), "PUT file content");
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content);
        let response = self.execute(request, true).await?;
        expect_success(response, Action::Default).await
    }

    async fn commit_file(&self, record_id: &str, key: &str) -> ApiResult<()> {
        let url = self.endpoint(&schema::draft_file_commit(record_id, key));
        debug!(path = url.path(), "POST commit file");
        let response = self.execute(self.client.post(url), false).await?;
        expect_success(response, Action::Default).await
    }
}

/// Selects how client errors are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Default,
    /// 400/422 from publish means required metadata is missing.
    Publish,
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.without_url().to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response, action: Action) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(response, action).await);
    }
    let body = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Remote {
        status: status.as_u16(),
        message: format!("unexpected response body: {err}"),
    })
}

/// Decodes a draft fetched for editing. The `metadata` object must be present.
fn editable_draft(status: u16, body: Value) -> ApiResult<Record> {
    if !body.get("metadata").is_some_and(Value::is_object) {
        return Err(ApiError::Remote {
            status,
            message: "draft response is missing the metadata object".to_string(),
        });
    }
    serde_json::from_value(body).map_err(|err| ApiError::Remote {
        status,
        message: format!("unexpected response body: {err}"),
    })
}

async fn expect_success(response: Response, action: Action) -> ApiResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response, action).await)
    }
}

async fn error_from_response(response: Response, action: Action) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if action == Action::Publish =>
        {
            ApiError::Validation(message)
        }
        _ => ApiError::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(reason) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.reason())
    {
        return reason;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}
