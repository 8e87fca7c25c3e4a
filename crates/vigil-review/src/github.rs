use serde::Deserialize;
use vigil_core::{FileStatus, PrFile, PullRequest, VigilError};

const API_BASE: &str = "https://api.github.com";
const FILES_PER_PAGE: usize = 100;

/// Source of pull request metadata and diffs.
///
/// Abstracted so the orchestrator can be tested against scripted pull
/// requests without a network.
#[allow(async_fn_in_trait)]
pub trait PullRequestSource {
    /// Fetch PR metadata including the per-file change list.
    async fn fetch_pr(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, VigilError>;

    /// Fetch the unified diff for the PR.
    async fn fetch_diff(&self, owner: &str, repo: &str, number: u64)
        -> Result<String, VigilError>;
}

#[derive(Deserialize)]
struct PrWire {
    number: u64,
    title: String,
    state: String,
    additions: u64,
    deletions: u64,
    changed_files: u64,
}

#[derive(Deserialize)]
struct FileWire {
    filename: String,
    status: FileStatus,
    additions: u64,
    deletions: u64,
}

/// GitHub REST client for fetching pull requests and their diffs.
///
/// # Examples
///
/// ```no_run
/// use vigil_review::github::GithubClient;
///
/// let client = GithubClient::new(Some("ghp_xxxx")).unwrap();
/// ```
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
}

impl GithubClient {
    /// Create a client from an explicit token or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Config`] if no token is available, or
    /// [`VigilError::Transport`] if the HTTP client cannot be built.
    pub fn new(token: Option<&str>) -> Result<Self, VigilError> {
        let token = match token {
            Some(t) => t.to_string(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                VigilError::Config(
                    "GITHUB_TOKEN not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
                )
            })?,
        };

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| VigilError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { http, token })
    }

    fn get(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .header("Accept", accept)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "vigil")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, VigilError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VigilError::Upstream {
                service: "github",
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Fetch the per-file change list, following pagination.
    async fn fetch_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PrFile>, VigilError> {
        let mut files = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{API_BASE}/repos/{owner}/{repo}/pulls/{number}/files?per_page={FILES_PER_PAGE}&page={page}"
            );
            let response = self
                .get(&url, "application/vnd.github+json")
                .send()
                .await
                .map_err(|e| VigilError::Transport(format!("failed to fetch PR files: {e}")))?;
            let batch: Vec<FileWire> = Self::check(response)
                .await?
                .json()
                .await
                .map_err(|e| VigilError::Transport(format!("failed to parse PR files: {e}")))?;

            let batch_len = batch.len();
            files.extend(batch.into_iter().map(|f| PrFile {
                path: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
            }));

            if batch_len < FILES_PER_PAGE {
                return Ok(files);
            }
            page += 1;
        }
    }
}

impl PullRequestSource for GithubClient {
    /// Fetch PR metadata and the full file list.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Upstream`] on non-success API responses
    /// (carrying the status and body), [`VigilError::Transport`] on
    /// connection or parsing failures.
    async fn fetch_pr(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, VigilError> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/pulls/{number}");
        let response = self
            .get(&url, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| VigilError::Transport(format!("failed to fetch PR: {e}")))?;
        let pr: PrWire = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| VigilError::Transport(format!("failed to parse PR: {e}")))?;

        let files = self.fetch_files(owner, repo, number).await?;

        Ok(PullRequest {
            number: pr.number,
            title: pr.title,
            state: pr.state,
            additions: pr.additions,
            deletions: pr.deletions,
            changed_files: pr.changed_files,
            files,
        })
    }

    async fn fetch_diff(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<String, VigilError> {
        let url = format!("{API_BASE}/repos/{owner}/{repo}/pulls/{number}");
        let response = self
            .get(&url, "application/vnd.github.v3.diff")
            .send()
            .await
            .map_err(|e| VigilError::Transport(format!("failed to fetch PR diff: {e}")))?;
        Self::check(response)
            .await?
            .text()
            .await
            .map_err(|e| VigilError::Transport(format!("failed to read diff response: {e}")))
    }
}

/// Parse a PR reference string (`owner/repo#number`) into its components.
///
/// # Errors
///
/// Returns [`VigilError::Input`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use vigil_review::github::parse_pr_reference;
///
/// let (owner, repo, num) = parse_pr_reference("octocat/hello-world#42").unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(num, 42);
/// ```
pub fn parse_pr_reference(pr_ref: &str) -> Result<(String, String, u64), VigilError> {
    let Some((owner_repo, number_str)) = pr_ref.split_once('#') else {
        return Err(VigilError::Input(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let Some((owner, repo)) = owner_repo.split_once('/') else {
        return Err(VigilError::Input(format!(
            "invalid PR reference '{pr_ref}', expected owner/repo#number"
        )));
    };
    let number: u64 = number_str
        .parse()
        .map_err(|_| VigilError::Input(format!("invalid PR number: {number_str}")))?;
    Ok((owner.to_string(), repo.to_string(), number))
}
