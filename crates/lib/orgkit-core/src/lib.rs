//! Core types and services for orgkit.
//!
//! This crate owns the flat-file configuration store, the GraphQL client with
//! its normalized error taxonomy, the three-phase file upload workflow, the
//! organization theme/logo operations, and PDF inspection helpers.

pub mod config;
pub mod graphql;
pub mod organization;
pub mod pdf;
pub mod services;
pub mod theme;
pub mod upload;
