use std::path::PathBuf;
use std::str::FromStr;

use orgkit_core::upload::{
    FileType, InvalidEnumValue, ObjectType, PermissionType, UploadRequest,
};
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

/// Parameters for uploading a file and registering its document record.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UploadFileParams {
    /// Path to the local file to upload.
    pub file_path: String,
    /// Name for the file; defaults to the file name from the path.
    pub file_name: Option<String>,
    /// ORGANIZATION, USER, or CLIENT. Defaults to ORGANIZATION.
    pub object_type: Option<String>,
    /// Id of the object; defaults to the configured organization id.
    pub object_id: Option<String>,
    /// AVATAR, DOCUMENT, or IMAGE. Defaults to DOCUMENT.
    pub file_type: Option<String>,
    /// User id; defaults to the configured user id.
    pub user_id: Option<String>,
    /// PUBLIC, PRIVATE, or RESTRICTED. Defaults to PUBLIC.
    pub permission_type: Option<String>,
}

fn parse_or_default<T>(value: Option<String>, default: T) -> Result<T, ErrorData>
where
    T: FromStr<Err = InvalidEnumValue>,
{
    value.map_or(Ok(default), |value| {
        value.parse().map_err(helpers::invalid_params)
    })
}

#[tool_router(router = tool_router_upload, vis = "pub")]
impl OrgkitMcp {
    #[tool(
        description = "Upload a file to object storage and create its file document record. Use for documents, user avatars, and general images. Do NOT use for organization logos; use update_organization_theme instead."
    )]
    async fn upload_file(
        &self,
        Parameters(params): Parameters<UploadFileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let object_type = parse_or_default(params.object_type, ObjectType::Organization)?;
        let file_type = parse_or_default(params.file_type, FileType::Document)?;
        let permission_type = parse_or_default(params.permission_type, PermissionType::Public)?;

        let outcome = self
            .core
            .uploader()
            .upload(UploadRequest {
                file_path: PathBuf::from(params.file_path),
                file_name: params.file_name,
                object_type,
                object_id: params.object_id,
                file_type,
                user_id: params.user_id,
                permission_type,
            })
            .await
            .map_err(helpers::map_upload_err)?;

        Ok(CallToolResult::success(vec![Content::json(json!({
            "success": true,
            "fileDocument": outcome.file_document,
            "fileInfo": {
                "originalPath": outcome.source_path,
                "fileName": outcome.file_name,
                "fileSize": outcome.file_size,
                "contentType": outcome.content_type,
            },
        }))?]))
    }
}
