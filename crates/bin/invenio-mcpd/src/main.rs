//! Daemon entry point for the InvenioRDM draft editor MCP server.
//!
//! Loads configuration from CLI arguments and the environment, builds the
//! records API client, and serves the MCP protocol over stdio and/or
//! streamable HTTP.

mod config;

use invenio_core::control::DraftControlPlane;
use invenio_core::store::HttpRecordsApi;
use invenio_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::InvenioConfig;

const DEFAULT_LOG_DIRECTIVE: &str = "invenio=info";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the MCP stdio transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = InvenioConfig::from_args()?;
    info!(
        base_url = %config.base_url,
        resource_types = config.resource_type_resolution.as_str(),
        stdio = config.enable_stdio,
        http = config.mcp_http_serve,
        "starting invenio-mcpd"
    );

    let api = HttpRecordsApi::new(config.api_config())?;
    let control = DraftControlPlane::new(api)
        .with_resource_type_resolution(config.resource_type_resolution);
    let http_config = McpHttpServerConfig::new(config.mcp_http_addr);

    match (config.enable_stdio, config.mcp_http_serve) {
        (true, true) => {
            // The process ends when the stdio client disconnects.
            let http = tokio::spawn(serve_streamable_http(control.clone(), http_config));
            tokio::select! {
                result = serve_stdio(control) => result?,
                joined = http => joined??,
            }
        }
        (true, false) => serve_stdio(control).await?,
        (false, _) => serve_streamable_http(control, http_config).await?,
    }
    Ok(())
}
