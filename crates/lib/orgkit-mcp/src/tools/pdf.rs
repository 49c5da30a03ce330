use std::path::PathBuf;

use orgkit_core::pdf;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::OrgkitMcp;
use crate::helpers;

/// Parameters for reading a PDF file.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ViewPdfParams {
    /// Path to the local PDF file.
    pub file_path: String,
    /// Maximum number of pages to extract, between 1 and 100. Defaults to 10.
    pub max_pages: Option<usize>,
    /// Include document metadata in the result. Defaults to true.
    pub include_metadata: Option<bool>,
    /// Include extracted text in the result. Defaults to true.
    pub include_text: Option<bool>,
}

#[tool_router(router = tool_router_pdf, vis = "pub")]
impl OrgkitMcp {
    #[tool(
        description = "Read a local PDF file: extract text from the leading pages and report page count, file size, and document metadata."
    )]
    async fn view_pdf(
        &self,
        Parameters(params): Parameters<ViewPdfParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let path = PathBuf::from(params.file_path);
        let max_pages = params.max_pages.unwrap_or(pdf::DEFAULT_PAGE_LIMIT);
        let include_metadata = params.include_metadata.unwrap_or(true);
        let include_text = params.include_text.unwrap_or(true);

        // lopdf parsing is synchronous; keep it off the async executor.
        let summary = tokio::task::spawn_blocking(move || pdf::inspect(&path, max_pages))
            .await
            .map_err(helpers::internal)?
            .map_err(helpers::map_pdf_err)?;

        let mut body = json!({
            "pageCount": summary.page_count,
            "extractedPages": summary.extracted_pages,
            "fileSize": summary.file_size,
            "fileSizeFormatted": summary.file_size_formatted,
            "modifiedAt": summary.modified_at,
        });
        if let Value::Object(map) = &mut body {
            if include_text {
                map.insert("text".to_string(), Value::String(summary.text));
            }
            if include_metadata {
                map.insert(
                    "metadata".to_string(),
                    serde_json::to_value(summary.metadata).map_err(helpers::internal)?,
                );
            }
        }
        Ok(CallToolResult::success(vec![Content::json(body)?]))
    }
}
