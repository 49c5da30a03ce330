use std::borrow::Cow;
use std::fmt;

use orgkit_core::config::ConfigError;
use orgkit_core::graphql::GraphqlError;
use orgkit_core::organization::OrganizationError;
use orgkit_core::pdf::PdfError;
use orgkit_core::upload::UploadError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub(crate) fn invalid_params(message: impl fmt::Display) -> ErrorData {
    mcp_err(ErrorCode::INVALID_PARAMS, message.to_string())
}

pub(crate) fn internal(message: impl fmt::Display) -> ErrorData {
    mcp_err(ErrorCode::INTERNAL_ERROR, message.to_string())
}

pub(crate) fn map_config_err(err: ConfigError) -> ErrorData {
    match err {
        ConfigError::Io(_) => internal(err),
        ConfigError::Missing(_) | ConfigError::OutOfRange { .. } => invalid_params(err),
    }
}

pub(crate) fn map_graphql_err(err: GraphqlError) -> ErrorData {
    match err {
        GraphqlError::Config(err) => map_config_err(err),
        GraphqlError::Transport(_)
        | GraphqlError::Http { .. }
        | GraphqlError::Decode(_)
        | GraphqlError::Api { .. } => internal(err),
    }
}

pub(crate) fn map_upload_err(err: UploadError) -> ErrorData {
    match err {
        UploadError::Config(err) => map_config_err(err),
        UploadError::FileNotFound(_) | UploadError::PlaceholderId { .. } => invalid_params(err),
        UploadError::Graphql { .. }
        | UploadError::MissingSignedUrl
        | UploadError::Read(_)
        | UploadError::Transfer(_)
        | UploadError::TransferRejected { .. }
        | UploadError::MissingDocumentId => internal(err),
    }
}

pub(crate) fn map_organization_err(err: OrganizationError) -> ErrorData {
    match err {
        OrganizationError::Config(err) => map_config_err(err),
        OrganizationError::Graphql(err) => map_graphql_err(err),
        OrganizationError::Theme(_)
        | OrganizationError::PlaceholderOrganizationId(_)
        | OrganizationError::LimitOutOfRange(_)
        | OrganizationError::MissingFileDocumentId => invalid_params(err),
        OrganizationError::MissingDownloadUrl => internal(err),
    }
}

pub(crate) fn map_pdf_err(err: PdfError) -> ErrorData {
    match err {
        PdfError::NotFound(_) | PdfError::NotPdf(_) | PdfError::PageLimitOutOfRange(_) => {
            invalid_params(err)
        }
        PdfError::Encrypted | PdfError::Io(_) | PdfError::Parse(_) => internal(err),
    }
}
