//! Report download engine for the subsurface cloud file service.
//!
//! A run reads a [`models::DownloadConfiguration`], validates it, obtains a
//! token, queries file metadata for every configured report kind and writes
//! the matched files to disk. See [`cloud::DownloadOrchestrator`].

pub mod cli;
pub mod cloud;
pub mod config;
pub mod models;
