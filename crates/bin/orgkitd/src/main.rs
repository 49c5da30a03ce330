//! Daemon entry point for the orgkit MCP server.
//!
//! Loads configuration from the environment, opens the flat-file config store,
//! and serves the MCP protocol over streamable HTTP and/or stdio.

mod config;

use std::sync::Arc;

use orgkit_core::config::ConfigStore;
use orgkit_core::services::CoreServices;
use orgkit_mcp::server::{self, McpHttpServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::OrgkitConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = OrgkitConfig::from_args()?;
    let store = ConfigStore::open(&config.env_file)?;
    let core = Arc::new(CoreServices::new(Arc::new(store)));

    let http_config = McpHttpServerConfig::new(config.mcp_http_addr)
        .with_stateful_mode(config.mcp_stateful)
        .with_sse_keep_alive(config.sse_keep_alive)
        .with_sse_retry(config.sse_retry);

    if config.mcp_serve && !config.enable_stdio {
        info!(addr = %http_config.addr, "serving MCP over streamable HTTP");
        server::serve_streamable_http(core, http_config).await?;
        return Ok(());
    }

    if config.mcp_serve {
        let http_core = core.clone();
        info!(addr = %http_config.addr, "serving MCP over streamable HTTP");
        tokio::spawn(async move {
            if let Err(err) = server::serve_streamable_http(http_core, http_config).await {
                error!(%err, "streamable HTTP server exited");
            }
        });
    }

    info!("serving MCP over stdio");
    server::serve_stdio(core).await?;
    Ok(())
}
