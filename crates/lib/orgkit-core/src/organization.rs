//! Organization theme and logo operations.
//!
//! Thin composition over the GraphQL client: theme and token validation runs
//! before any network call, and organization ids resolved from the config
//! store are checked against known placeholder values.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::info;

use crate::config::{self, ConfigError, ConfigStore};
use crate::graphql::{GraphqlClient, GraphqlError};
use crate::theme::{self, ThemeError};

const UPDATE_ORGANIZATION: &str = r"
mutation updateOrganization($input: UpdateOrganizationInput!) {
    updateOrganization(input: $input) {
        organization {
            id
            name
        }
    }
}";

const FILE_DOCUMENTS: &str = r"
query fileDocuments($input: FileDocumentsInput!) {
    fileDocuments(input: $input) {
        fileDocuments {
            id
            name
            fileName
            type
            permissionType
            createdAt
        }
    }
}";

const REQUEST_PRESIGNED_DOWNLOAD_URL: &str = r"
mutation requestPresignedDownloadUrl($input: RequestPresignedDownloadUrlInput!) {
    requestPresignedDownloadUrl(input: $input) {
        presignedUrl
        expiresAt
    }
}";

const MAX_LOGO_LIMIT: usize = 50;

#[derive(Debug)]
pub enum OrganizationError {
    Config(ConfigError),
    Theme(ThemeError),
    PlaceholderOrganizationId(String),
    LimitOutOfRange(usize),
    MissingFileDocumentId,
    MissingDownloadUrl,
    Graphql(GraphqlError),
}

impl fmt::Display for OrganizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Theme(err) => write!(f, "{err}"),
            Self::PlaceholderOrganizationId(value) => write!(
                f,
                "invalid organization id: '{value}' looks like a placeholder; configure \
                 ORGANIZATION_ID or provide a real id"
            ),
            Self::LimitOutOfRange(limit) => {
                write!(f, "limit must be between 1 and {MAX_LOGO_LIMIT} (got {limit})")
            }
            Self::MissingFileDocumentId => write!(f, "file document id is required"),
            Self::MissingDownloadUrl => {
                write!(f, "no download URL returned by requestPresignedDownloadUrl")
            }
            Self::Graphql(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for OrganizationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Theme(err) => Some(err),
            Self::Graphql(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for OrganizationError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ThemeError> for OrganizationError {
    fn from(err: ThemeError) -> Self {
        Self::Theme(err)
    }
}

impl From<GraphqlError> for OrganizationError {
    fn from(err: GraphqlError) -> Self {
        Self::Graphql(err)
    }
}

/// Partial theme update; only the provided fields reach the mutation input.
#[derive(Debug, Clone, Default)]
pub struct ThemeUpdate {
    pub organization_id: Option<String>,
    pub favicon_link: Option<String>,
    pub browser_tab_title: Option<String>,
    pub theme_tokens: Option<Value>,
    pub theme: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Logo file-document entry as returned by the `fileDocuments` query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub permission_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Time-limited download grant for a stored file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadGrant {
    pub presigned_url: String,
    #[serde(default)]
    pub expires_at: Option<Value>,
}

#[derive(Clone)]
pub struct OrganizationService {
    graphql: GraphqlClient,
    config: Arc<ConfigStore>,
}

impl OrganizationService {
    #[must_use]
    pub fn new(graphql: GraphqlClient, config: Arc<ConfigStore>) -> Self {
        Self { graphql, config }
    }

    /// Updates theme, branding, and token settings for an organization.
    /// Validation runs entirely before the mutation is sent.
    ///
    /// # Errors
    /// Returns an [`OrganizationError`] for validation or GraphQL failures.
    pub async fn update_theme(
        &self,
        update: ThemeUpdate,
    ) -> Result<OrganizationSummary, OrganizationError> {
        let ThemeUpdate {
            organization_id,
            favicon_link,
            browser_tab_title,
            theme_tokens,
            theme,
        } = update;

        if let Some(tokens) = theme_tokens.as_ref() {
            theme::validate_theme_tokens(tokens)?;
        }
        if let Some(theme) = theme.as_ref() {
            theme::validate_legacy_theme(theme)?;
        }
        let org_id = self.resolve_organization_id(organization_id).await?;

        let mut input = Map::new();
        input.insert("organizationId".to_string(), Value::String(org_id.clone()));
        if let Some(favicon_link) = favicon_link {
            input.insert("faviconLink".to_string(), Value::String(favicon_link));
        }
        if let Some(browser_tab_title) = browser_tab_title {
            input.insert(
                "browserTabTitle".to_string(),
                Value::String(browser_tab_title),
            );
        }
        if let Some(tokens) = theme_tokens {
            input.insert("themeTokens".to_string(), tokens);
        }
        if let Some(theme) = theme {
            input.insert("theme".to_string(), Value::Object(theme));
        }

        info!("updating organization theme for {org_id}");
        let data = self
            .graphql
            .execute(UPDATE_ORGANIZATION, json!({ "input": input }))
            .await?;
        let organization = data
            .get("updateOrganization")
            .and_then(|value| value.get("organization"))
            .cloned()
            .unwrap_or(Value::Null);
        Ok(
            serde_json::from_value(organization).unwrap_or(OrganizationSummary {
                id: Some(org_id),
                name: None,
            }),
        )
    }

    /// Lists logo file documents for an organization, newest first.
    ///
    /// # Errors
    /// Returns [`OrganizationError::LimitOutOfRange`] for a limit outside
    /// `[1, 50]`, or validation/GraphQL failures.
    pub async fn list_logos(
        &self,
        organization_id: Option<String>,
        limit: usize,
    ) -> Result<Vec<LogoDocument>, OrganizationError> {
        if !(1..=MAX_LOGO_LIMIT).contains(&limit) {
            return Err(OrganizationError::LimitOutOfRange(limit));
        }
        let org_id = self.resolve_organization_id(organization_id).await?;

        info!("listing logos for organization {org_id}");
        let variables = json!({
            "input": {
                "objectType": "ORGANIZATION",
                "objectId": org_id,
                "type": "LOGO",
                "limit": limit,
            },
        });
        let data = self.graphql.execute(FILE_DOCUMENTS, variables).await?;
        let documents = data
            .get("fileDocuments")
            .and_then(|value| value.get("fileDocuments"))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(serde_json::from_value(documents).unwrap_or_default())
    }

    /// Most recent logo for an organization, when one exists.
    ///
    /// # Errors
    /// Returns validation or GraphQL failures from the underlying listing.
    pub async fn verify_logo(
        &self,
        organization_id: Option<String>,
    ) -> Result<Option<LogoDocument>, OrganizationError> {
        let logos = self.list_logos(organization_id, 1).await?;
        Ok(logos.into_iter().next())
    }

    /// Resolves a temporary download URL for a stored file document.
    ///
    /// # Errors
    /// Returns [`OrganizationError::MissingDownloadUrl`] when the API returns
    /// no URL, or GraphQL failures.
    pub async fn logo_download_url(
        &self,
        file_document_id: &str,
    ) -> Result<DownloadGrant, OrganizationError> {
        if file_document_id.trim().is_empty() {
            return Err(OrganizationError::MissingFileDocumentId);
        }

        info!("requesting download URL for file document {file_document_id}");
        let variables = json!({ "input": { "fileDocumentId": file_document_id } });
        let data = self
            .graphql
            .execute(REQUEST_PRESIGNED_DOWNLOAD_URL, variables)
            .await?;
        let grant = data
            .get("requestPresignedDownloadUrl")
            .cloned()
            .unwrap_or(Value::Null);
        let grant: DownloadGrant =
            serde_json::from_value(grant).map_err(|_| OrganizationError::MissingDownloadUrl)?;
        if grant.presigned_url.is_empty() {
            return Err(OrganizationError::MissingDownloadUrl);
        }
        Ok(grant)
    }

    async fn resolve_organization_id(
        &self,
        supplied: Option<String>,
    ) -> Result<String, OrganizationError> {
        let org_id = match supplied {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.config.require(config::ORGANIZATION_ID).await?,
        };
        if config::is_placeholder(&org_id) {
            return Err(OrganizationError::PlaceholderOrganizationId(org_id));
        }
        Ok(org_id)
    }
}
