//! Three-phase file upload workflow.
//!
//! Phase 1 requests a temporary signed URL and server timestamp, phase 2
//! transfers the file bytes with a direct PUT to object storage, and phase 3
//! registers the file-document metadata record. Phases execute strictly in
//! order and there is no compensation on partial failure: a phase-1 grant is
//! left unconsumed when the transfer fails. Storage writes under a fixed key
//! are idempotent, so a failed upload is safe to retry from the top.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::config::{self, ConfigError, ConfigStore};
use crate::graphql::{GraphqlClient, GraphqlError};

/// Timeout for the binary transfer to object storage.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

const FETCH_FILE_UPLOAD_URL: &str = r"
query fetchFileUploadUrl($input: FetchFileUploadUrlInput!) {
    fetchFileUploadUrl(input: $input) {
        temporarySignedURL
        timestamp
    }
}";

const CREATE_FILE_DOCUMENT: &str = r"
mutation createFileDocument($input: CreateFileDocumentInput!) {
    createFileDocument(input: $input) {
        fileDocument {
            id
            name
            fileName
            s3Key
            type
        }
    }
}";

/// A value outside one of the upload enumerations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEnumValue {
    pub name: &'static str,
    pub value: String,
    pub allowed: &'static str,
}

impl fmt::Display for InvalidEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            name,
            value,
            allowed,
        } = self;
        write!(f, "{name} must be {allowed} (got '{value}')")
    }
}

impl std::error::Error for InvalidEnumValue {}

macro_rules! upload_enum {
    ($name:ident, $label:literal, $allowed:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(InvalidEnumValue {
                        name: $label,
                        value: value.to_string(),
                        allowed: $allowed,
                    }),
                }
            }
        }
    };
}

upload_enum!(ObjectType, "object_type", "ORGANIZATION, USER, or CLIENT", {
    Organization => "ORGANIZATION",
    User => "USER",
    Client => "CLIENT",
});

upload_enum!(FileType, "file_type", "AVATAR, DOCUMENT, or IMAGE", {
    Avatar => "AVATAR",
    Document => "DOCUMENT",
    Image => "IMAGE",
});

upload_enum!(PermissionType, "permission_type", "PUBLIC, PRIVATE, or RESTRICTED", {
    Public => "PUBLIC",
    Private => "PRIVATE",
    Restricted => "RESTRICTED",
});

/// Workflow phase an upload failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadPhase {
    RequestUrl,
    Transfer,
    Register,
}

impl fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RequestUrl => "request-url",
            Self::Transfer => "transfer",
            Self::Register => "register",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum UploadError {
    Config(ConfigError),
    FileNotFound(PathBuf),
    PlaceholderId {
        field: &'static str,
        value: String,
    },
    Graphql {
        phase: UploadPhase,
        source: GraphqlError,
    },
    MissingSignedUrl,
    Read(io::Error),
    Transfer(reqwest::Error),
    TransferRejected {
        status: StatusCode,
    },
    MissingDocumentId,
}

impl UploadError {
    /// Phase the failure occurred in, when it maps to one.
    #[must_use]
    pub const fn phase(&self) -> Option<UploadPhase> {
        match self {
            Self::Graphql { phase, .. } => Some(*phase),
            Self::MissingSignedUrl => Some(UploadPhase::RequestUrl),
            Self::Read(_) | Self::Transfer(_) | Self::TransferRejected { .. } => {
                Some(UploadPhase::Transfer)
            }
            Self::MissingDocumentId => Some(UploadPhase::Register),
            Self::Config(_) | Self::FileNotFound(_) | Self::PlaceholderId { .. } => None,
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::PlaceholderId { field, value } => write!(
                f,
                "invalid {field}: '{value}' looks like a placeholder; omit it to use the \
                 configured value or provide a real id"
            ),
            Self::Graphql { phase, source } => {
                write!(f, "upload failed during {phase} phase: {source}")
            }
            Self::MissingSignedUrl => {
                write!(f, "no signed upload URL returned by fetchFileUploadUrl")
            }
            Self::Read(err) => write!(f, "failed to read file: {err}"),
            Self::Transfer(err) => write!(f, "failed to upload file to storage: {err}"),
            Self::TransferRejected { status } => {
                write!(f, "storage rejected upload with HTTP {status}")
            }
            Self::MissingDocumentId => write!(f, "createFileDocument returned no document id"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Graphql { source, .. } => Some(source),
            Self::Read(err) => Some(err),
            Self::Transfer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for UploadError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Parameters for one upload call; the session state is never persisted.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub file_name: Option<String>,
    pub object_type: ObjectType,
    pub object_id: Option<String>,
    pub file_type: FileType,
    pub user_id: Option<String>,
    pub permission_type: PermissionType,
}

/// Metadata record created after a successful storage write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub s3_key: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Result of a completed upload, including locally computed file metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file_document: FileDocument,
    pub file_name: String,
    pub source_path: PathBuf,
    pub file_size: usize,
    pub content_type: String,
}

/// Orchestrates the signed-URL, transfer, and registration phases.
#[derive(Clone)]
pub struct Uploader {
    graphql: GraphqlClient,
    http: reqwest::Client,
    config: Arc<ConfigStore>,
}

impl Uploader {
    #[must_use]
    pub fn new(http: reqwest::Client, config: Arc<ConfigStore>) -> Self {
        let graphql = GraphqlClient::new(http.clone(), config.clone());
        Self {
            graphql,
            http,
            config,
        }
    }

    /// Runs the full upload workflow for one file.
    ///
    /// # Errors
    /// Returns an [`UploadError`], tagged with the failing phase where the
    /// failure occurred past the preconditions.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, UploadError> {
        let UploadRequest {
            file_path,
            file_name,
            object_type,
            object_id,
            file_type,
            user_id,
            permission_type,
        } = request;

        let is_file = tokio::fs::metadata(&file_path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(UploadError::FileNotFound(file_path));
        }

        let object_id = match object_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.config.require(config::ORGANIZATION_ID).await?,
        };
        let user_id = match user_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.config.require(config::USER_ID).await?,
        };
        if config::is_placeholder(&object_id) {
            return Err(UploadError::PlaceholderId {
                field: "object id",
                value: object_id,
            });
        }
        if config::is_placeholder(&user_id) {
            return Err(UploadError::PlaceholderId {
                field: "user id",
                value: user_id,
            });
        }

        let file_name = file_name.unwrap_or_else(|| {
            file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        info!("requesting signed upload URL for {file_name}");
        let variables = json!({
            "input": {
                "objectType": object_type.as_str(),
                "objectId": object_id,
                "fileName": file_name,
                "type": file_type.as_str(),
                "userId": user_id,
                "generateUniqueFileName": true,
            },
        });
        let data = self
            .graphql
            .execute(FETCH_FILE_UPLOAD_URL, variables)
            .await
            .map_err(|source| UploadError::Graphql {
                phase: UploadPhase::RequestUrl,
                source,
            })?;
        let grant = data
            .get("fetchFileUploadUrl")
            .cloned()
            .unwrap_or(Value::Null);
        let signed_url = grant
            .get("temporarySignedURL")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or(UploadError::MissingSignedUrl)?;
        // The registration mutation needs this exact timestamp for the record
        // to resolve to the stored object.
        let timestamp = grant.get("timestamp").cloned().unwrap_or(Value::Null);

        info!("transferring {file_name} to object storage");
        let bytes = tokio::fs::read(&file_path)
            .await
            .map_err(UploadError::Read)?;
        let file_size = bytes.len();
        let response = self
            .http
            .put(&signed_url)
            .timeout(TRANSFER_TIMEOUT)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(UploadError::Transfer)?;
        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::TransferRejected { status });
        }

        info!("registering file document for {file_name}");
        let variables = json!({
            "input": {
                "fileName": file_name,
                "objectId": object_id,
                "objectType": object_type.as_str(),
                "name": file_name,
                "type": file_type.as_str(),
                "permissionType": permission_type.as_str(),
                "sourceType": file_type.as_str(),
                "timestamp": timestamp,
            },
        });
        let data = self
            .graphql
            .execute(CREATE_FILE_DOCUMENT, variables)
            .await
            .map_err(|source| UploadError::Graphql {
                phase: UploadPhase::Register,
                source,
            })?;
        let document = data
            .get("createFileDocument")
            .and_then(|value| value.get("fileDocument"))
            .cloned()
            .unwrap_or(Value::Null);
        let has_id = document
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        if !has_id {
            return Err(UploadError::MissingDocumentId);
        }
        let file_document: FileDocument =
            serde_json::from_value(document).map_err(|_| UploadError::MissingDocumentId)?;
        info!("file document created: {}", file_document.id);

        let content_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(UploadOutcome {
            file_document,
            file_name,
            source_path: file_path,
            file_size,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_values() {
        assert_eq!("ORGANIZATION".parse(), Ok(ObjectType::Organization));
        assert_eq!("IMAGE".parse(), Ok(FileType::Image));
        assert_eq!("RESTRICTED".parse(), Ok(PermissionType::Restricted));
    }

    #[test]
    fn rejects_values_outside_enumeration() {
        let err = "TEAM".parse::<ObjectType>().expect_err("should reject");
        assert_eq!(err.name, "object_type");
        assert_eq!(
            err.to_string(),
            "object_type must be ORGANIZATION, USER, or CLIENT (got 'TEAM')"
        );
    }

    #[test]
    fn tags_failures_with_their_phase() {
        assert_eq!(
            UploadError::MissingSignedUrl.phase(),
            Some(UploadPhase::RequestUrl)
        );
        assert_eq!(
            UploadError::TransferRejected {
                status: StatusCode::FORBIDDEN
            }
            .phase(),
            Some(UploadPhase::Transfer)
        );
        assert_eq!(
            UploadError::MissingDocumentId.phase(),
            Some(UploadPhase::Register)
        );
        assert_eq!(UploadError::FileNotFound(PathBuf::from("x")).phase(), None);
    }

    #[test]
    fn deserializes_file_document_wire_shape() {
        let document: FileDocument = serde_json::from_value(json!({
            "id": "doc_1",
            "name": "logo.png",
            "fileName": "logo.png",
            "s3Key": "org/logo.png",
            "type": "IMAGE",
        }))
        .expect("should deserialize");
        assert_eq!(document.id, "doc_1");
        assert_eq!(document.s3_key.as_deref(), Some("org/logo.png"));
        assert_eq!(document.kind.as_deref(), Some("IMAGE"));
    }
}
