//! MCP server implementation for orgkit.
//!
//! This crate wires the core services into rmcp tool handlers and exposes the
//! MCP-facing API surface for configuration, uploads, organization theming,
//! and PDF inspection.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use orgkit_core::services::CoreServices;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};

const SERVER_INSTRUCTIONS: &str = r"orgkit provides MCP tools for managing an organization's theme, logos, and files through its GraphQL API.

Workflow:
1. Check configuration with `config_status`. If incomplete, use `config_set` to store the
   API key, GraphQL endpoint, organization id, and user id. `config_get` shows the current
   values with the API key masked; `config_reset` restores defaults.
2. Upload documents, avatars, and general images with `upload_file`. Do NOT use it for
   organization logos; logo and branding changes go through `update_organization_theme`.
3. Manage theming with `update_organization_theme`. Colors belong in `theme_tokens`
   (`ref.palette.*`, `comp.layout.*`, format #RRGGBB); the flat `theme` object accepts only
   a limited field set and rejects legacy color fields.
4. Inspect logos with `list_organization_logos`, `verify_organization_logo`, and
   `get_logo_download_url` (returns a temporary URL).
5. Read PDF contents with `view_pdf`.

Notes:
- Object ids and user ids default to the configured values when omitted.
- `health` returns `ok`.";

/// MCP server wrapper around the core services and tool routers.
#[derive(Clone)]
pub struct OrgkitMcp {
    tool_router: ToolRouter<Self>,
    core: Arc<CoreServices>,
}

impl OrgkitMcp {
    /// Creates a new server using core services by value.
    #[must_use]
    pub fn new(core: CoreServices) -> Self {
        Self::with_core(Arc::new(core))
    }

    /// Creates a new server using a shared core-services handle.
    #[must_use]
    pub fn with_core(core: Arc<CoreServices>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_config()
            + Self::tool_router_upload()
            + Self::tool_router_theme()
            + Self::tool_router_pdf();
        Self { tool_router, core }
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl OrgkitMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for OrgkitMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
