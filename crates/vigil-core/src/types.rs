use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of characters of the lowercased issue text used as a dedup key.
pub const DEDUP_PREFIX_LEN: usize = 80;

/// Change status of a file within a pull request.
///
/// # Examples
///
/// ```
/// use vigil_core::FileStatus;
///
/// let status: FileStatus = serde_json::from_str("\"added\"").unwrap();
/// assert_eq!(status, FileStatus::Added);
///
/// // Unknown provider statuses degrade to `modified`.
/// let status: FileStatus = serde_json::from_str("\"changed\"").unwrap();
/// assert_eq!(status, FileStatus::Modified);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// New file.
    Added,
    /// Existing file changed in place.
    Modified,
    /// File deleted.
    Removed,
    /// File moved to a new path.
    Renamed,
}

impl FileStatus {
    /// Map a provider status string, treating anything unrecognized as a
    /// modification. GitHub also emits `changed`, `copied`, `unchanged`.
    pub fn from_provider(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "added" => FileStatus::Added,
            "removed" | "deleted" => FileStatus::Removed,
            "renamed" => FileStatus::Renamed,
            _ => FileStatus::Modified,
        }
    }
}

impl<'de> Deserialize<'de> for FileStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let status = String::deserialize(deserializer)?;
        Ok(FileStatus::from_provider(&status))
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Renamed => write!(f, "renamed"),
        }
    }
}

/// A single file entry in a pull request, used for file-level reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrFile {
    /// Path relative to the repository root.
    pub path: String,
    /// Change status.
    pub status: FileStatus,
    /// Lines added in this file.
    pub additions: u64,
    /// Lines deleted in this file.
    pub deletions: u64,
}

/// Immutable snapshot of a pull request, fetched once per review.
///
/// # Examples
///
/// ```
/// use vigil_core::{FileStatus, PrFile, PullRequest};
///
/// let pr = PullRequest {
///     number: 42,
///     title: "Fix off-by-one".into(),
///     state: "open".into(),
///     additions: 3,
///     deletions: 2,
///     changed_files: 1,
///     files: vec![PrFile {
///         path: "src/loop.c".into(),
///         status: FileStatus::Modified,
///         additions: 3,
///         deletions: 2,
///     }],
/// };
/// assert_eq!(pr.files.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number.
    pub number: u64,
    /// PR title.
    pub title: String,
    /// Provider state string (`"open"`, `"closed"`, ...).
    pub state: String,
    /// Total lines added.
    pub additions: u64,
    /// Total lines deleted.
    pub deletions: u64,
    /// Number of changed files.
    pub changed_files: u64,
    /// Per-file change entries.
    pub files: Vec<PrFile>,
}

/// The PR metadata subset echoed back in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrSummary {
    /// PR number.
    pub number: u64,
    /// PR title.
    pub title: String,
    /// Provider state string.
    pub state: String,
    /// Total lines added.
    pub additions: u64,
    /// Total lines deleted.
    pub deletions: u64,
    /// Number of changed files.
    pub changed_files: u64,
}

impl From<&PullRequest> for PrSummary {
    fn from(pr: &PullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.clone(),
            state: pr.state.clone(),
            additions: pr.additions,
            deletions: pr.deletions,
            changed_files: pr.changed_files,
        }
    }
}

/// Severity attached to a finding by the model.
///
/// # Examples
///
/// ```
/// use vigil_core::Severity;
///
/// let s: Severity = "HIGH".parse().unwrap();
/// assert_eq!(s, Severity::High);
/// assert_eq!(s.to_string(), "high");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Must be fixed before merging.
    Critical,
    /// Likely defect with real impact.
    High,
    /// Worth investigating.
    Medium,
    /// Minor issue.
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// One defect reported by the model.
///
/// # Examples
///
/// ```
/// use vigil_core::Finding;
///
/// let finding = Finding {
///     issue: "Loop bound excludes the last element".into(),
///     evidence: Some("for (i = 0; i < n - 1; i++)".into()),
///     severity: None,
///     file: Some("src/loop.c".into()),
/// };
/// assert!(finding.evidence.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Description of the issue.
    pub issue: String,
    /// Code quoted from the diff that demonstrates the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    /// Model-assigned severity, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// File the issue refers to, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Finding {
    /// Near-duplicate detection key: the lowercased first
    /// [`DEDUP_PREFIX_LEN`] characters of the issue text.
    ///
    /// Deliberately coarse; two distinct issues sharing a long preamble
    /// will collapse. Kept for compatibility with existing consumers.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::Finding;
    ///
    /// let finding = Finding {
    ///     issue: "Race Condition in cache refresh".into(),
    ///     evidence: None,
    ///     severity: None,
    ///     file: None,
    /// };
    /// assert_eq!(finding.dedup_key(), "race condition in cache refresh");
    /// ```
    pub fn dedup_key(&self) -> String {
        self.issue
            .to_lowercase()
            .chars()
            .take(DEDUP_PREFIX_LEN)
            .collect()
    }
}

/// Outcome of the second-pass validation stage.
///
/// Distinguishes "the validator confirmed zero issues" from "the validator
/// was unavailable and the candidates passed through unverified" — the two
/// carry very different confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Too few candidates to justify a validation round trip.
    Skipped,
    /// The validator ran and its verdict is reflected in the findings.
    Validated,
    /// The validator failed; findings are the unvalidated candidates.
    Unavailable,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Skipped => write!(f, "skipped"),
            ValidationStatus::Validated => write!(f, "validated"),
            ValidationStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// File counts reported alongside the findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSummary {
    /// Number of findings in the result.
    pub total_findings: usize,
    /// Files that were eligible for analysis.
    pub files_analyzed: usize,
    /// Files classified as noise.
    pub files_skipped: usize,
}

/// Stage timings in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    /// Time to fetch PR metadata and diff.
    pub triage_ms: u64,
    /// Time spent in the ensemble and validation stages.
    pub review_ms: u64,
    /// Wall-clock total.
    pub total_ms: u64,
}

/// The complete output of one review run.
///
/// Invariant: `summary.files_analyzed + summary.files_skipped` equals the
/// PR's file count, and every finding came from the ensemble merge or
/// survived validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResult {
    /// PR metadata subset.
    pub pr: PrSummary,
    /// Final findings.
    pub findings: Vec<Finding>,
    /// File counts.
    pub summary: ReviewSummary,
    /// What the validation stage did.
    pub validation: ValidationStatus,
    /// Stage timings.
    pub timing: Timing,
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Review: PR #{} — {}", self.pr.number, self.pr.title)?;
        writeln!(
            f,
            "Files: {} analyzed, {} skipped | Validation: {} | {}ms total",
            self.summary.files_analyzed,
            self.summary.files_skipped,
            self.validation,
            self.timing.total_ms,
        )?;
        writeln!(f)?;

        if self.findings.is_empty() {
            writeln!(f, "No issues found.")?;
        } else {
            for (i, finding) in self.findings.iter().enumerate() {
                let severity = finding
                    .severity
                    .map(|s| format!(" [{s}]"))
                    .unwrap_or_default();
                writeln!(f, "{}.{severity} {}", i + 1, finding.issue)?;
                if let Some(file) = &finding.file {
                    writeln!(f, "   File: {file}")?;
                }
                if let Some(evidence) = &finding.evidence {
                    writeln!(f, "   Evidence: {evidence}")?;
                }
            }
        }

        Ok(())
    }
}

impl ReviewResult {
    /// Render the review result as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::{
    ///     PrSummary, ReviewResult, ReviewSummary, Timing, ValidationStatus,
    /// };
    ///
    /// let result = ReviewResult {
    ///     pr: PrSummary {
    ///         number: 1,
    ///         title: "t".into(),
    ///         state: "open".into(),
    ///         additions: 0,
    ///         deletions: 0,
    ///         changed_files: 0,
    ///     },
    ///     findings: vec![],
    ///     summary: ReviewSummary {
    ///         total_findings: 0,
    ///         files_analyzed: 0,
    ///         files_skipped: 0,
    ///     },
    ///     validation: ValidationStatus::Skipped,
    ///     timing: Timing { triage_ms: 0, review_ms: 0, total_ms: 0 },
    /// };
    /// assert!(result.to_markdown().contains("# Review"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "# Review: PR #{} — {}\n\n",
            self.pr.number, self.pr.title
        ));
        out.push_str(&format!(
            "**Files:** {} analyzed, {} skipped | **Validation:** {} | **Total:** {}ms\n\n",
            self.summary.files_analyzed,
            self.summary.files_skipped,
            self.validation,
            self.timing.total_ms,
        ));

        if self.findings.is_empty() {
            out.push_str("No issues found.\n");
        } else {
            for (i, finding) in self.findings.iter().enumerate() {
                let severity = finding
                    .severity
                    .map(|s| format!(" ({s})"))
                    .unwrap_or_default();
                out.push_str(&format!("## {}.{severity} {}\n\n", i + 1, finding.issue));
                if let Some(file) = &finding.file {
                    out.push_str(&format!("`{file}`\n\n"));
                }
                if let Some(evidence) = &finding.evidence {
                    out.push_str(&format!("```\n{evidence}\n```\n\n"));
                }
            }
        }
        out
    }
}

/// One file in a triage ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageFile {
    /// Path relative to the repository root.
    pub path: String,
    /// Change status.
    pub status: FileStatus,
    /// Lines added.
    pub additions: u64,
    /// Lines deleted.
    pub deletions: u64,
    /// `additions + deletions`, the ranking key.
    pub total_changes: u64,
}

/// Output of the triage-only mode: files ranked by change size,
/// noise filtered out, without any model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageResult {
    /// PR metadata subset.
    pub pr: PrSummary,
    /// Non-noise files sorted by `total_changes` descending.
    pub files: Vec<TriageFile>,
    /// File counts.
    pub summary: ReviewSummary,
    /// Wall-clock duration in milliseconds.
    pub timing_ms: u64,
}

impl fmt::Display for TriageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Triage: PR #{} — {}", self.pr.number, self.pr.title)?;
        writeln!(
            f,
            "Files: {} ranked, {} skipped as noise | {}ms",
            self.summary.files_analyzed, self.summary.files_skipped, self.timing_ms,
        )?;
        for (i, file) in self.files.iter().enumerate() {
            writeln!(
                f,
                "{:>3}. {} ({}, +{}/-{})",
                i + 1,
                file.path,
                file.status,
                file.additions,
                file.deletions,
            )?;
        }
        Ok(())
    }
}

impl TriageResult {
    /// Render the triage ranking as a markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "# Triage: PR #{} — {}\n\n",
            self.pr.number, self.pr.title
        ));
        out.push_str(&format!(
            "**Files:** {} ranked, {} skipped as noise\n\n",
            self.summary.files_analyzed, self.summary.files_skipped,
        ));
        if self.files.is_empty() {
            out.push_str("No reviewable files.\n");
            return out;
        }
        out.push_str("| Rank | File | Status | +/- |\n");
        out.push_str("|------|------|--------|-----|\n");
        for (i, file) in self.files.iter().enumerate() {
            out.push_str(&format!(
                "| {} | `{}` | {} | +{}/-{} |\n",
                i + 1,
                file.path,
                file.status,
                file.additions,
                file.deletions,
            ));
        }
        out
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap`.
///
/// # Examples
///
/// ```
/// use vigil_core::OutputFormat;
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pr() -> PullRequest {
        PullRequest {
            number: 7,
            title: "Refactor session store".into(),
            state: "open".into(),
            additions: 120,
            deletions: 40,
            changed_files: 3,
            files: vec![
                PrFile {
                    path: "src/session.rs".into(),
                    status: FileStatus::Modified,
                    additions: 100,
                    deletions: 30,
                },
                PrFile {
                    path: "Cargo.lock".into(),
                    status: FileStatus::Modified,
                    additions: 20,
                    deletions: 10,
                },
            ],
        }
    }

    #[test]
    fn pr_summary_copies_metadata() {
        let pr = sample_pr();
        let summary = PrSummary::from(&pr);
        assert_eq!(summary.number, 7);
        assert_eq!(summary.title, pr.title);
        assert_eq!(summary.changed_files, 3);
    }

    #[test]
    fn dedup_key_lowercases_and_bounds() {
        let long_issue = "X".repeat(200);
        let finding = Finding {
            issue: long_issue,
            evidence: None,
            severity: None,
            file: None,
        };
        let key = finding.dedup_key();
        assert_eq!(key.len(), DEDUP_PREFIX_LEN);
        assert!(key.chars().all(|c| c == 'x'));
    }

    #[test]
    fn dedup_key_shorter_than_prefix_is_whole_issue() {
        let finding = Finding {
            issue: "Tiny".into(),
            evidence: None,
            severity: None,
            file: None,
        };
        assert_eq!(finding.dedup_key(), "tiny");
    }

    #[test]
    fn severity_from_str() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("High".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("MEDIUM".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!("low".parse::<Severity>().unwrap(), Severity::Low);
        assert!("blocker".parse::<Severity>().is_err());
    }

    #[test]
    fn file_status_unknown_degrades_to_modified() {
        let status: FileStatus = serde_json::from_str("\"copied\"").unwrap();
        assert_eq!(status, FileStatus::Modified);
    }

    #[test]
    fn finding_omits_empty_optionals_in_json() {
        let finding = Finding {
            issue: "x".into(),
            evidence: None,
            severity: None,
            file: None,
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert!(json.get("evidence").is_none());
        assert!(json.get("severity").is_none());
        assert!(json.get("file").is_none());
    }

    #[test]
    fn review_result_serializes_snake_case() {
        let result = ReviewResult {
            pr: PrSummary::from(&sample_pr()),
            findings: vec![],
            summary: ReviewSummary {
                total_findings: 0,
                files_analyzed: 1,
                files_skipped: 1,
            },
            validation: ValidationStatus::Skipped,
            timing: Timing {
                triage_ms: 10,
                review_ms: 20,
                total_ms: 30,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["summary"]["total_findings"], 0);
        assert_eq!(json["summary"]["files_analyzed"], 1);
        assert_eq!(json["timing"]["triage_ms"], 10);
        assert_eq!(json["validation"], "skipped");
    }

    #[test]
    fn display_and_markdown_output() {
        let result = ReviewResult {
            pr: PrSummary::from(&sample_pr()),
            findings: vec![Finding {
                issue: "Session id reused after logout".into(),
                evidence: Some("self.id = old_id".into()),
                severity: Some(Severity::High),
                file: Some("src/session.rs".into()),
            }],
            summary: ReviewSummary {
                total_findings: 1,
                files_analyzed: 1,
                files_skipped: 1,
            },
            validation: ValidationStatus::Validated,
            timing: Timing {
                triage_ms: 1,
                review_ms: 2,
                total_ms: 3,
            },
        };
        let text = format!("{result}");
        assert!(text.contains("[high]"));
        assert!(text.contains("Session id reused"));

        let md = result.to_markdown();
        assert!(md.contains("# Review"));
        assert!(md.contains("`src/session.rs`"));
    }

    #[test]
    fn triage_markdown_table() {
        let result = TriageResult {
            pr: PrSummary::from(&sample_pr()),
            files: vec![TriageFile {
                path: "src/session.rs".into(),
                status: FileStatus::Modified,
                additions: 100,
                deletions: 30,
                total_changes: 130,
            }],
            summary: ReviewSummary {
                total_findings: 0,
                files_analyzed: 1,
                files_skipped: 1,
            },
            timing_ms: 12,
        };
        let md = result.to_markdown();
        assert!(md.contains("| 1 | `src/session.rs` |"));
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
