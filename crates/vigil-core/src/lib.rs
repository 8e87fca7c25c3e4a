//! Core types, configuration, and error handling for the vigil pipeline.
//!
//! This crate provides the shared foundation used by the other vigil crates:
//! - [`VigilError`] — unified error type using `thiserror`
//! - [`VigilConfig`] — configuration loaded from `.vigil.toml`
//! - Shared types: [`PullRequest`], [`PrFile`], [`Finding`], [`Severity`],
//!   [`ReviewResult`], [`TriageResult`], [`ValidationStatus`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ModelConfig, ReviewConfig, VigilConfig};
pub use error::VigilError;
pub use types::{
    FileStatus, Finding, OutputFormat, PrFile, PrSummary, PullRequest, ReviewResult,
    ReviewSummary, Severity, Timing, TriageFile, TriageResult, ValidationStatus,
    DEDUP_PREFIX_LEN,
};

/// A convenience `Result` type for vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
