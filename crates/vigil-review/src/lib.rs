//! Model-backed pull request review.
//!
//! The pipeline: fetch PR metadata and diff from GitHub, fit the diff to
//! a character budget, run the two-temperature review ensemble, validate
//! the merged candidates, and report findings with stage timings.
//!
//! The [`orchestrator::Orchestrator`] ties the stages together over two
//! seams: [`github::PullRequestSource`] for the PR provider and
//! [`model::CompletionModel`] for the language model.

pub mod ensemble;
pub mod findings;
pub mod github;
pub mod model;
pub mod orchestrator;
pub mod prompt;

pub use ensemble::{ReviewEngine, PASS_TEMPERATURES, VALIDATION_THRESHOLD};
pub use findings::{parse_findings, parse_findings_checked, strip_code_fence};
pub use github::{parse_pr_reference, GithubClient, PullRequestSource};
pub use model::{CompletionModel, ModelClient};
pub use orchestrator::Orchestrator;
