use orgkit_core::organization::ThemeUpdate;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::OrgkitMcp;
use crate::helpers;

const DEFAULT_LOGO_LIMIT: usize = 10;

/// Parameters for updating organization theme and branding.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateOrganizationThemeParams {
    /// Organization id; defaults to the configured value.
    pub organization_id: Option<String>,
    /// URL for the favicon.
    pub favicon_link: Option<String>,
    /// Title for the browser tab.
    pub browser_tab_title: Option<String>,
    /// Theme token configuration. Colors live under `ref.palette.*` and
    /// `comp.layout.*` and must use the #RRGGBB format.
    pub theme_tokens: Option<Value>,
    /// Simple theme settings with a limited field set. Color fields such as
    /// primaryColor or backgroundColor are rejected here; use theme_tokens.
    pub theme: Option<Map<String, Value>>,
}

/// Parameters for listing organization logos.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListOrganizationLogosParams {
    /// Organization id; defaults to the configured value.
    pub organization_id: Option<String>,
    /// Maximum number of logos to return, between 1 and 50. Defaults to 10.
    pub limit: Option<usize>,
}

/// Parameters for resolving a logo download URL.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GetLogoDownloadUrlParams {
    pub file_document_id: String,
}

/// Parameters for verifying the most recent organization logo.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VerifyOrganizationLogoParams {
    /// Organization id; defaults to the configured value.
    pub organization_id: Option<String>,
}

#[tool_router(router = tool_router_theme, vis = "pub")]
impl OrgkitMcp {
    #[tool(
        description = "Update organization theme, branding, and visual design settings. Primary tool for logo and theme customization. Complex colors belong in theme_tokens; the flat theme object has a limited field set."
    )]
    async fn update_organization_theme(
        &self,
        Parameters(params): Parameters<UpdateOrganizationThemeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let organization = self
            .core
            .organization()
            .update_theme(ThemeUpdate {
                organization_id: params.organization_id,
                favicon_link: params.favicon_link,
                browser_tab_title: params.browser_tab_title,
                theme_tokens: params.theme_tokens,
                theme: params.theme,
            })
            .await
            .map_err(helpers::map_organization_err)?;
        Ok(CallToolResult::success(vec![Content::json(json!({
            "success": true,
            "organization": organization,
        }))?]))
    }

    #[tool(description = "List logo files associated with an organization, newest first.")]
    async fn list_organization_logos(
        &self,
        Parameters(params): Parameters<ListOrganizationLogosParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let limit = params.limit.unwrap_or(DEFAULT_LOGO_LIMIT);
        let logos = self
            .core
            .organization()
            .list_logos(params.organization_id, limit)
            .await
            .map_err(helpers::map_organization_err)?;
        Ok(CallToolResult::success(vec![Content::json(logos)?]))
    }

    #[tool(
        description = "Get a temporary download URL for a logo file document. The URL expires; use it promptly."
    )]
    async fn get_logo_download_url(
        &self,
        Parameters(params): Parameters<GetLogoDownloadUrlParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let grant = self
            .core
            .organization()
            .logo_download_url(&params.file_document_id)
            .await
            .map_err(helpers::map_organization_err)?;
        Ok(CallToolResult::success(vec![Content::json(grant)?]))
    }

    #[tool(
        description = "Verify that an organization has a logo and return the most recent logo's details."
    )]
    async fn verify_organization_logo(
        &self,
        Parameters(params): Parameters<VerifyOrganizationLogoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let logo = self
            .core
            .organization()
            .verify_logo(params.organization_id)
            .await
            .map_err(helpers::map_organization_err)?;
        Ok(CallToolResult::success(vec![Content::json(json!({
            "hasLogo": logo.is_some(),
            "logo": logo,
        }))?]))
    }
}
