//! MCP tool modules.
//!
//! Tools are grouped by domain: configuration management, file upload,
//! organization theme/logo operations, and PDF inspection.

pub mod config;
pub mod pdf;
pub mod theme;
pub mod upload;
