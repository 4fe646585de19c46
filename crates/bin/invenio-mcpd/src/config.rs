use clap::{Parser, builder::BoolishValueParser};
use invenio_core::control::ResourceTypeResolution;
use invenio_core::store::{HttpApiConfig, RetryPolicy};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

const DEFAULT_INVENIO_URL: &str = "https://sandbox-cds-rdm.web.cern.ch/api";
const DEFAULT_RESOURCE_TYPE_RESOLUTION: &str = "fixed-enum";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_RETRIES: u32 = 2;
const DEFAULT_HTTP_RETRY_BACKOFF_MS: u64 = 250;
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";

#[derive(Parser, Debug)]
#[command(name = "invenio-mcpd", version, about = "InvenioRDM draft editor MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "INVENIO_URL", default_value = DEFAULT_INVENIO_URL)]
    invenio_url: String,

    #[arg(long, env = "INVENIO_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "INVENIO_SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,

    #[arg(
        long,
        env = "INVENIO_RESOURCE_TYPE_RESOLUTION",
        default_value = DEFAULT_RESOURCE_TYPE_RESOLUTION
    )]
    resource_type_resolution: String,

    #[arg(
        long,
        env = "INVENIO_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS
    )]
    http_timeout_secs: u64,

    #[arg(long, env = "INVENIO_HTTP_RETRIES", default_value_t = DEFAULT_HTTP_RETRIES)]
    http_retries: u32,

    #[arg(
        long,
        env = "INVENIO_HTTP_RETRY_BACKOFF_MS",
        default_value_t = DEFAULT_HTTP_RETRY_BACKOFF_MS
    )]
    http_retry_backoff_ms: u64,

    #[arg(
        long = "stdio",
        env = "INVENIO_MCP_STDIO",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "INVENIO_MCP_HTTP_SERVE",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    mcp_http_serve: bool,

    #[arg(long, env = "INVENIO_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone)]
pub struct InvenioConfig {
    pub base_url: Url,
    pub token: String,
    pub session_cookie: Option<String>,
    pub resource_type_resolution: ResourceTypeResolution,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub enable_stdio: bool,
    pub mcp_http_serve: bool,
    pub mcp_http_addr: SocketAddr,
}

impl fmt::Debug for InvenioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvenioConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "<redacted>"),
            )
            .field("resource_type_resolution", &self.resource_type_resolution)
            .field("http_timeout", &self.http_timeout)
            .field("retry", &self.retry)
            .field("enable_stdio", &self.enable_stdio)
            .field("mcp_http_serve", &self.mcp_http_serve)
            .field("mcp_http_addr", &self.mcp_http_addr)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl InvenioConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    /// HTTP client settings for the records API.
    pub fn api_config(&self) -> HttpApiConfig {
        HttpApiConfig::new(self.base_url.clone(), self.token.clone())
            .with_session_cookie(self.session_cookie.clone())
            .with_timeout(self.http_timeout)
            .with_retry(self.retry)
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidSetting {
        name: "INVENIO_URL",
        value: value.to_string(),
    };
    let trimmed = value.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(invalid());
    }
    Ok(url)
}

impl TryFrom<CliArgs> for InvenioConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let token = args
            .token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingSetting("INVENIO_TOKEN"))?;
        let session_cookie = args
            .session_cookie
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let base_url = parse_base_url(&args.invenio_url)?;

        let resource_type_resolution = args
            .resource_type_resolution
            .parse::<ResourceTypeResolution>()
            .map_err(|_| ConfigError::InvalidSetting {
                name: "INVENIO_RESOURCE_TYPE_RESOLUTION",
                value: args.resource_type_resolution.clone(),
            })?;

        if args.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "INVENIO_HTTP_TIMEOUT_SECS",
                value: args.http_timeout_secs.to_string(),
            });
        }

        if !args.enable_stdio && !args.mcp_http_serve {
            return Err(ConfigError::InvalidSetting {
                name: "INVENIO_MCP_STDIO",
                value: "false (and INVENIO_MCP_HTTP_SERVE is false; enable at least one transport)"
                    .to_string(),
            });
        }

        Ok(Self {
            base_url,
            token,
            session_cookie,
            resource_type_resolution,
            http_timeout: Duration::from_secs(args.http_timeout_secs),
            retry: RetryPolicy::new(
                args.http_retries,
                Duration::from_millis(args.http_retry_backoff_ms),
            ),
            enable_stdio: args.enable_stdio,
            mcp_http_serve: args.mcp_http_serve,
            mcp_http_addr: args.mcp_http_addr,
        })
    }
}
