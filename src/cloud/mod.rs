//! Subsurface cloud file service module
//!
//! This module talks to the cloud file service holding drilling, production
//! and monthly regulatory reports. It covers authentication, metadata queries,
//! file download and the orchestration of a full download run.

pub mod types;
pub mod errors;
pub mod window;
pub mod query;
pub mod auth;
pub mod client;
pub mod naming;
pub mod downloader;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::*;
pub use errors::CloudError;

// Re-export commonly used items
pub use client::{CloudClient, HttpCloudClient};
pub use query::{build_query, FileQuery, QueryVariant};
pub use window::{resolve_time_window, ResolvedTimeWindow};
pub use naming::{build_output_paths, generate_file_name, safe_encode};
pub use orchestrator::{build_queries, validate_configuration, DownloadOrchestrator};
