//! Two-pass review ensemble with a validation round.
//!
//! The same review prompt runs twice concurrently at different sampling
//! temperatures: T=0 for the deterministic read, T=0.3 for diversity.
//! Both passes always settle; a failed pass is logged and contributes
//! nothing. Merged candidates are deduplicated in pass order, then sent
//! through a validation pass unless there are too few to justify the
//! round trip.

use std::collections::HashSet;

use tracing::warn;
use vigil_core::{Finding, ValidationStatus, VigilError};

use crate::findings::{parse_findings, parse_findings_checked};
use crate::model::CompletionModel;
use crate::prompt;

/// Sampling temperatures for the two concurrent review passes.
pub const PASS_TEMPERATURES: [f64; 2] = [0.0, 0.3];

/// With this many candidates or fewer, validation is skipped.
pub const VALIDATION_THRESHOLD: usize = 2;

/// The review ensemble: two concurrent passes, merge, validate.
///
/// Generic over the model so tests can drive it with scripted responses.
pub struct ReviewEngine<M> {
    model: M,
    max_findings: usize,
}

impl<M: CompletionModel> ReviewEngine<M> {
    pub fn new(model: M, max_findings: usize) -> Self {
        Self {
            model,
            max_findings,
        }
    }

    /// Run the full ensemble against an already-budgeted diff.
    ///
    /// Never fails: model errors on either review pass are absorbed, and
    /// a failed validation pass falls back to the unvalidated candidates.
    /// The returned status records what the validation stage actually did.
    pub async fn review(&self, pr_title: &str, diff: &str) -> (Vec<Finding>, ValidationStatus) {
        let review_prompt = prompt::build_review_prompt(pr_title, diff);

        let (pass_0, pass_1) = tokio::join!(
            self.model
                .complete(prompt::SYSTEM_REVIEW, &review_prompt, PASS_TEMPERATURES[0]),
            self.model
                .complete(prompt::SYSTEM_REVIEW, &review_prompt, PASS_TEMPERATURES[1]),
        );

        let mut candidates: Vec<Finding> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (temperature, pass) in PASS_TEMPERATURES.iter().zip([pass_0, pass_1]) {
            match pass {
                Ok(text) => {
                    for finding in parse_findings(&text) {
                        if seen.insert(finding.dedup_key()) {
                            candidates.push(finding);
                        }
                    }
                }
                Err(e) => warn!("review pass at T={temperature} failed: {e}"),
            }
        }

        if candidates.len() <= VALIDATION_THRESHOLD {
            return (candidates, ValidationStatus::Skipped);
        }

        match self.validate(pr_title, diff, &candidates).await {
            Ok(validated) => (
                validated.into_iter().take(self.max_findings).collect(),
                ValidationStatus::Validated,
            ),
            Err(e) => {
                warn!("validation failed, returning unvalidated candidates: {e}");
                (
                    candidates.into_iter().take(self.max_findings).collect(),
                    ValidationStatus::Unavailable,
                )
            }
        }
    }

    /// Ask the model to verify each candidate against the diff.
    ///
    /// Uses the checked parser: a validator that answers with unusable
    /// JSON counts as unavailable, not as a verdict of zero bugs.
    async fn validate(
        &self,
        pr_title: &str,
        diff: &str,
        candidates: &[Finding],
    ) -> Result<Vec<Finding>, VigilError> {
        let candidates_text = prompt::render_candidates(candidates);
        let validate_prompt = prompt::build_validate_prompt(pr_title, diff, &candidates_text);
        let text = self
            .model
            .complete(prompt::SYSTEM_VALIDATE, &validate_prompt, 0.0)
            .await?;
        parse_findings_checked(&text)
    }
}
