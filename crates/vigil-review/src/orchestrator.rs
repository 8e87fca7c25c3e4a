//! End-to-end pipeline: fetch, triage, budget, review, report.

use std::time::Instant;

use vigil_core::{
    PrSummary, ReviewResult, ReviewSummary, Timing, TriageFile, TriageResult, VigilConfig,
    VigilError,
};
use vigil_triage::{fit_to_budget, NoiseFilter};

use crate::ensemble::ReviewEngine;
use crate::github::PullRequestSource;
use crate::model::CompletionModel;

/// Drives one review or triage run over a single pull request.
///
/// Metadata and diff are fetched concurrently and both are required: a
/// failure of either fetch fails the run before any model call is made.
/// Model and validation failures past that point are absorbed by the
/// ensemble and recorded in the result instead.
pub struct Orchestrator<S, M> {
    source: S,
    engine: ReviewEngine<M>,
    filter: NoiseFilter,
    diff_budget: usize,
}

impl<S: PullRequestSource, M: CompletionModel> Orchestrator<S, M> {
    pub fn new(source: S, model: M, config: &VigilConfig) -> Self {
        Self {
            source,
            engine: ReviewEngine::new(model, config.review.max_findings),
            filter: NoiseFilter::from_config(&config.review),
            diff_budget: config.review.diff_budget,
        }
    }

    /// Run the full review pipeline.
    ///
    /// The summary counts partition the PR's file list exactly: every
    /// changed file is either analyzed or skipped as noise.
    ///
    /// # Errors
    ///
    /// Returns an error if either the metadata or the diff fetch fails.
    pub async fn review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<ReviewResult, VigilError> {
        let start = Instant::now();

        let (pr, diff) = tokio::try_join!(
            self.source.fetch_pr(owner, repo, number),
            self.source.fetch_diff(owner, repo, number),
        )?;

        let files_skipped = pr
            .files
            .iter()
            .filter(|f| self.filter.is_noise(&f.path))
            .count();
        let files_analyzed = pr.files.len() - files_skipped;

        let budgeted = fit_to_budget(&diff, self.diff_budget);
        let triage_ms = start.elapsed().as_millis() as u64;

        let review_start = Instant::now();
        let (findings, validation) = self.engine.review(&pr.title, &budgeted).await;
        let review_ms = review_start.elapsed().as_millis() as u64;

        Ok(ReviewResult {
            pr: PrSummary::from(&pr),
            summary: ReviewSummary {
                total_findings: findings.len(),
                files_analyzed,
                files_skipped,
            },
            findings,
            validation,
            timing: Timing {
                triage_ms,
                review_ms,
                total_ms: start.elapsed().as_millis() as u64,
            },
        })
    }

    /// Rank the PR's reviewable files by change size, without model calls.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata fetch fails.
    pub async fn triage(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<TriageResult, VigilError> {
        let start = Instant::now();
        let pr = self.source.fetch_pr(owner, repo, number).await?;

        let mut files: Vec<TriageFile> = pr
            .files
            .iter()
            .filter(|f| !self.filter.is_noise(&f.path))
            .map(|f| TriageFile {
                path: f.path.clone(),
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
                total_changes: f.additions + f.deletions,
            })
            .collect();
        // Stable sort: equal-size files keep their PR order.
        files.sort_by(|a, b| b.total_changes.cmp(&a.total_changes));

        let files_skipped = pr.files.len() - files.len();
        Ok(TriageResult {
            pr: PrSummary::from(&pr),
            summary: ReviewSummary {
                total_findings: 0,
                files_analyzed: files.len(),
                files_skipped,
            },
            files,
            timing_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::{FileStatus, PrFile, PullRequest, ValidationStatus};

    struct StaticSource {
        pr: PullRequest,
        diff: Option<String>,
    }

    impl PullRequestSource for StaticSource {
        async fn fetch_pr(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<PullRequest, VigilError> {
            Ok(self.pr.clone())
        }

        async fn fetch_diff(
            &self,
            _owner: &str,
            _repo: &str,
            _number: u64,
        ) -> Result<String, VigilError> {
            self.diff.clone().ok_or(VigilError::Upstream {
                service: "github",
                status: 502,
                body: "diff unavailable".into(),
            })
        }
    }

    /// Model that answers every call with the same issues payload.
    struct FixedModel(String);

    impl CompletionModel for FixedModel {
        async fn complete(
            &self,
            _system: &str,
            _prompt: &str,
            _temperature: f64,
        ) -> Result<String, VigilError> {
            Ok(self.0.clone())
        }
    }

    fn file(path: &str, additions: u64, deletions: u64) -> PrFile {
        PrFile {
            path: path.into(),
            status: FileStatus::Modified,
            additions,
            deletions,
        }
    }

    fn sample_pr() -> PullRequest {
        PullRequest {
            number: 9,
            title: "Harden session handling".into(),
            state: "open".into(),
            additions: 160,
            deletions: 45,
            changed_files: 4,
            files: vec![
                file("src/session.rs", 100, 30),
                file("Cargo.lock", 40, 10),
                file("src/auth.rs", 15, 5),
                file("dist/app.min.js", 5, 0),
            ],
        }
    }

    fn orchestrator(
        diff: Option<&str>,
        response: &str,
    ) -> Orchestrator<StaticSource, FixedModel> {
        let source = StaticSource {
            pr: sample_pr(),
            diff: diff.map(String::from),
        };
        Orchestrator::new(
            source,
            FixedModel(response.into()),
            &VigilConfig::default(),
        )
    }

    #[tokio::test]
    async fn file_counts_partition_the_pr() {
        let orch = orchestrator(Some("diff --git a/x b/x\n+1\n"), r#"{"issues": []}"#);
        let result = orch.review("o", "r", 9).await.unwrap();
        assert_eq!(result.summary.files_analyzed, 2);
        assert_eq!(result.summary.files_skipped, 2);
        assert_eq!(
            result.summary.files_analyzed + result.summary.files_skipped,
            sample_pr().files.len()
        );
    }

    #[tokio::test]
    async fn review_reports_findings_and_timing() {
        let orch = orchestrator(
            Some("diff --git a/x b/x\n+1\n"),
            r#"{"issues": ["session id reused after logout"]}"#,
        );
        let result = orch.review("o", "r", 9).await.unwrap();
        assert_eq!(result.summary.total_findings, 1);
        assert_eq!(result.findings[0].issue, "session id reused after logout");
        // Identical passes dedup to one finding, below the threshold
        assert_eq!(result.validation, ValidationStatus::Skipped);
        assert!(result.timing.total_ms >= result.timing.review_ms);
        assert_eq!(result.pr.number, 9);
    }

    #[tokio::test]
    async fn failed_diff_fetch_fails_the_run() {
        let orch = orchestrator(None, r#"{"issues": []}"#);
        let result = orch.review("o", "r", 9).await;
        assert!(matches!(
            result,
            Err(VigilError::Upstream { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn triage_ranks_by_total_changes() {
        let orch = orchestrator(None, "{}");
        let result = orch.triage("o", "r", 9).await.unwrap();
        let paths: Vec<&str> = result.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/session.rs", "src/auth.rs"]);
        assert_eq!(result.files[0].total_changes, 130);
        assert_eq!(result.summary.files_skipped, 2);
        assert_eq!(result.summary.total_findings, 0);
    }

    #[tokio::test]
    async fn config_skip_patterns_reach_the_filter() {
        let mut config = VigilConfig::default();
        config.review.skip_patterns = vec!["src/auth.rs".into()];
        let source = StaticSource {
            pr: sample_pr(),
            diff: Some("diff --git a/x b/x\n+1\n".into()),
        };
        let orch = Orchestrator::new(source, FixedModel("{}".into()), &config);
        let result = orch.review("o", "r", 9).await.unwrap();
        assert_eq!(result.summary.files_analyzed, 1);
        assert_eq!(result.summary.files_skipped, 3);
    }
}
