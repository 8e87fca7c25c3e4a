use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VigilError;

/// Top-level configuration loaded from `.vigil.toml`.
///
/// Built once at process start and passed by reference into the clients
/// and the orchestrator; nothing reads configuration mid-pipeline.
///
/// # Examples
///
/// ```
/// use vigil_core::VigilConfig;
///
/// let config = VigilConfig::default();
/// assert_eq!(config.review.max_findings, 15);
/// assert_eq!(config.review.diff_budget, 80_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    /// Model provider settings.
    #[serde(default)]
    pub model: ModelConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl VigilConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Io`] if the file cannot be read, or
    /// [`VigilError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vigil_core::VigilConfig;
    /// use std::path::Path;
    ///
    /// let config = VigilConfig::from_file(Path::new(".vigil.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VigilError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_core::VigilConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_findings = 5
    /// "#;
    /// let config = VigilConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_findings, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VigilError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Model provider configuration (OpenAI-compatible chat completions).
///
/// # Examples
///
/// ```
/// use vigil_core::ModelConfig;
///
/// let config = ModelConfig::default();
/// assert_eq!(config.model, "gpt-4o");
/// assert_eq!(config.request_timeout_secs, 45);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key; falls back to `OPENAI_API_KEY` at client construction.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Per-call deadline for completion requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o".into()
}

fn default_request_timeout_secs() -> u64 {
    45
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use vigil_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_findings, 15);
/// assert!(config.skip_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Maximum findings returned per review (default: 15).
    #[serde(default = "default_max_findings")]
    pub max_findings: usize,
    /// Character budget for diff content sent to the model (default: 80000).
    #[serde(default = "default_diff_budget")]
    pub diff_budget: usize,
    /// Additional glob patterns treated as noise files.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

fn default_max_findings() -> usize {
    15
}

fn default_diff_budget() -> usize {
    80_000
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_findings: default_max_findings(),
            diff_budget: default_diff_budget(),
            skip_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = VigilConfig::default();
        assert_eq!(config.model.model, "gpt-4o");
        assert!(config.model.api_key.is_none());
        assert!(config.model.base_url.is_none());
        assert_eq!(config.model.request_timeout_secs, 45);
        assert_eq!(config.review.max_findings, 15);
        assert_eq!(config.review.diff_budget, 80_000);
        assert!(config.review.skip_patterns.is_empty());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[review]
max_findings = 8
diff_budget = 40000
"#;
        let config = VigilConfig::from_toml(toml).unwrap();
        assert_eq!(config.review.max_findings, 8);
        assert_eq!(config.review.diff_budget, 40_000);
        // Untouched sections keep their defaults
        assert_eq!(config.model.model, "gpt-4o");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[model]
model = "gpt-4o-mini"
base_url = "http://localhost:11434"
request_timeout_secs = 20

[review]
max_findings = 5
skip_patterns = ["*.gen.ts", "fixtures/**"]
"#;
        let config = VigilConfig::from_toml(toml).unwrap();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(
            config.model.base_url.as_deref(),
            Some("http://localhost:11434")
        );
        assert_eq!(config.model.request_timeout_secs, 20);
        assert_eq!(config.review.skip_patterns, vec!["*.gen.ts", "fixtures/**"]);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = VigilConfig::from_toml("").unwrap();
        assert_eq!(config.review.max_findings, 15);
        assert_eq!(config.model.model, "gpt-4o");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = VigilConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }
}
