//! Tolerant parsing of model responses into findings.
//!
//! Models asked for JSON still wrap it in markdown fences, emit bare
//! string arrays instead of objects, or return prose. The ensemble path
//! absorbs all of that: a malformed response becomes zero findings and a
//! warning, never an error. The validation path uses the checked variant
//! so an unusable verdict is distinguishable from a verdict of "no bugs".

use serde::Deserialize;
use tracing::warn;
use vigil_core::{Finding, VigilError};

#[derive(Deserialize)]
struct IssuesResponse {
    #[serde(default)]
    issues: Vec<serde_json::Value>,
}

/// Strip a surrounding markdown code fence, with optional `json` tag.
///
/// # Examples
///
/// ```
/// use vigil_review::findings::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
/// assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
/// assert_eq!(strip_code_fence("{}"), "{}");
/// ```
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(after_fence) = trimmed.strip_prefix("```") {
        let content = after_fence.strip_prefix("json").unwrap_or(after_fence);
        if let Some(end) = content.rfind("```") {
            return content[..end].trim().to_string();
        }
        return content.trim().to_string();
    }
    trimmed.to_string()
}

/// Parse a model response into findings, absorbing malformed input.
///
/// Accepts an `{"issues": [...]}` object whose entries are either bare
/// strings or objects with `issue` and optional `evidence`, `severity`,
/// `file` keys. Entries of any other shape, and entries with an empty or
/// missing `issue`, are dropped. Non-JSON input yields an empty list.
///
/// # Examples
///
/// ```
/// use vigil_review::findings::parse_findings;
///
/// let findings = parse_findings(r#"{"issues": ["bug one", "bug two"]}"#);
/// assert_eq!(findings.len(), 2);
///
/// assert!(parse_findings("I could not find any issues.").is_empty());
/// ```
pub fn parse_findings(text: &str) -> Vec<Finding> {
    match parse_findings_checked(text) {
        Ok(findings) => findings,
        Err(e) => {
            warn!("failed to parse model response as JSON: {e}");
            Vec::new()
        }
    }
}

/// Parse a model response into findings, surfacing malformed input.
///
/// Same entry handling as [`parse_findings`], but input that is not a
/// JSON object is an error instead of an empty list.
///
/// # Errors
///
/// Returns [`VigilError::Serialization`] when the fenced-stripped text is
/// not valid JSON.
pub fn parse_findings_checked(text: &str) -> Result<Vec<Finding>, VigilError> {
    let cleaned = strip_code_fence(text);
    let response: IssuesResponse = serde_json::from_str(&cleaned)?;

    let findings = response
        .issues
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(issue) => Some(Finding {
                issue,
                evidence: None,
                severity: None,
                file: None,
            }),
            serde_json::Value::Object(map) => {
                let issue = map
                    .get("issue")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                if issue.is_empty() {
                    return None;
                }
                Some(Finding {
                    issue,
                    evidence: map
                        .get("evidence")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    severity: map
                        .get("severity")
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse().ok()),
                    file: map.get("file").and_then(|v| v.as_str()).map(String::from),
                })
            }
            _ => None,
        })
        .collect();

    Ok(findings)
}
