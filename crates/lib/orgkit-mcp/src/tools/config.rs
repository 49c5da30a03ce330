use orgkit_core::config::ConfigUpdate;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::OrgkitMcp;
use crate::helpers;

/// Parameters for a partial configuration update.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ConfigSetParams {
    pub api_key: Option<String>,
    pub graphql_endpoint: Option<String>,
    pub organization_id: Option<String>,
    pub user_id: Option<String>,
    /// Request timeout in milliseconds, between 1000 and 30000.
    pub timeout_ms: Option<u64>,
    /// Transport retry budget, between 0 and 5.
    pub retries: Option<u32>,
}

#[tool_router(router = tool_router_config, vis = "pub")]
impl OrgkitMcp {
    #[tool(description = "Show the current server configuration with the API key masked.")]
    async fn config_get(&self) -> Result<CallToolResult, ErrorData> {
        let display = self.core.config().display().await;
        Ok(CallToolResult::success(vec![Content::json(display)?]))
    }

    #[tool(
        description = "Update the server configuration. Only the provided fields change; the rest are preserved."
    )]
    async fn config_set(
        &self,
        Parameters(params): Parameters<ConfigSetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let updated = self
            .core
            .config()
            .apply(ConfigUpdate {
                api_key: params.api_key,
                graphql_endpoint: params.graphql_endpoint,
                organization_id: params.organization_id,
                user_id: params.user_id,
                timeout_ms: params.timeout_ms,
                retries: params.retries,
            })
            .await
            .map_err(helpers::map_config_err)?;
        Ok(CallToolResult::success(vec![Content::json(
            json!({ "updated": updated }),
        )?]))
    }

    #[tool(description = "Check whether the configuration is complete and free of placeholder values.")]
    async fn config_status(&self) -> Result<CallToolResult, ErrorData> {
        let status = self.core.config().status().await;
        Ok(CallToolResult::success(vec![Content::json(status)?]))
    }

    #[tool(description = "Reset the configuration to defaults: empty credentials, 30000 ms timeout, 3 retries.")]
    async fn config_reset(&self) -> Result<CallToolResult, ErrorData> {
        self.core
            .config()
            .reset()
            .await
            .map_err(helpers::map_config_err)?;
        let display = self.core.config().display().await;
        Ok(CallToolResult::success(vec![Content::json(display)?]))
    }
}
