//! Prompt templates for the review and validation passes.
//!
//! Templates are plain strings with `{pr_title}`, `{diff}`, and
//! `{candidates}` placeholders filled by literal substitution. No escaping
//! is applied; diff content containing brace sequences passes through
//! untouched because each placeholder is replaced exactly once by name.

use vigil_core::Finding;

pub const SYSTEM_REVIEW: &str = "You are a precise code reviewer. Only report real bugs you are confident about. Always respond with valid JSON.";

pub const SYSTEM_VALIDATE: &str = "You are a precise reviewer. Verify each issue against the actual diff. Only keep confirmed bugs. Always respond with valid JSON.";

pub const PROMPT_REVIEW: &str = r#"You are a world-class code reviewer. Review this PR and find ONLY real, concrete bugs.

PR Title: {pr_title}

PR Diff:
{diff}

Look specifically for these categories of issues:
1. Logic errors: wrong conditions, off-by-one, incorrect algorithms, broken control flow, inverted booleans
2. Concurrency bugs: race conditions, missing locks, unsafe shared state, deadlocks, unhandled async promises
3. Null/undefined safety: missing null checks, possible NPE, Optional.get() without isPresent(), uninitialized variables
4. Error handling: swallowed exceptions, missing error propagation, wrong error types
5. Data correctness: wrong translations, wrong constants, incorrect mappings, copy-paste errors, stale cache data
6. Security: SSRF, XSS, injection, auth bypass, exposed secrets, unsafe deserialization, origin validation bypass
7. Type mismatches: wrong return types, incompatible casts, API contract violations, schema errors
8. Breaking changes: removed public APIs without migration, changed behavior silently
9. State consistency: asymmetric cache trust, orphaned data, inconsistent updates across related fields
10. Naming/contract bugs: method name typos that break interfaces, property names that don't match expected contracts

Rules:
- ONLY report issues you are highly confident about (>90% sure)
- Be specific: name the file, function/variable, and exactly what's wrong
- Naming typos ARE bugs if they would cause a runtime error or break an API contract
- Do NOT report: style preferences, missing tests, docs, "could be improved"
- Do NOT report issues about code that was only deleted/removed
- Maximum 10 issues. Quality over quantity.

For each issue, provide it as a JSON object with "issue" (description) and "evidence" (quote the specific code lines from the diff that prove this is a bug).

Respond with ONLY a JSON object:
{"issues": [{"issue": "description", "evidence": "the specific code"}]}"#;

pub const PROMPT_VALIDATE: &str = r#"You are a senior code reviewer doing final validation. You have the PR diff and candidate issues.

PR Title: {pr_title}

PR Diff (for verification):
{diff}

Candidate Issues:
{candidates}

For each candidate, verify against the actual diff:
1. Can you find the specific code that's buggy? If yes, keep it.
2. Is this a real bug that would cause incorrect behavior in production? If yes, keep it.
3. Is this about deleted/removed code being replaced? If so, DROP it.
4. Is this speculative or theoretical ("could potentially...")? If so, DROP it.
5. Is this about style, naming conventions, or missing tests? If so, DROP it.

Return ONLY the issues that are verified real bugs with evidence in the diff.

Respond with ONLY a JSON object:
{"issues": ["verified issue 1", "verified issue 2", ...]}"#;

/// Fill the review template.
///
/// # Examples
///
/// ```
/// use vigil_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("Fix parser", "diff --git a/p.rs b/p.rs");
/// assert!(prompt.contains("PR Title: Fix parser"));
/// assert!(prompt.contains("diff --git a/p.rs"));
/// ```
pub fn build_review_prompt(pr_title: &str, diff: &str) -> String {
    PROMPT_REVIEW
        .replace("{pr_title}", pr_title)
        .replace("{diff}", diff)
}

/// Fill the validation template with the diff and the rendered candidates.
pub fn build_validate_prompt(pr_title: &str, diff: &str, candidates: &str) -> String {
    PROMPT_VALIDATE
        .replace("{pr_title}", pr_title)
        .replace("{diff}", diff)
        .replace("{candidates}", candidates)
}

/// Render candidate findings as a numbered list for the validation prompt.
///
/// # Examples
///
/// ```
/// use vigil_core::Finding;
/// use vigil_review::prompt::render_candidates;
///
/// let findings = vec![Finding {
///     issue: "Off-by-one in loop bound".into(),
///     evidence: Some("i < n - 1".into()),
///     severity: None,
///     file: None,
/// }];
/// let text = render_candidates(&findings);
/// assert!(text.starts_with("1. Off-by-one"));
/// assert!(text.contains("Evidence: i < n - 1"));
/// ```
pub fn render_candidates(candidates: &[Finding]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut line = format!("{}. {}", i + 1, f.issue);
            if let Some(ref evidence) = f.evidence {
                line.push_str(&format!("\n   Evidence: {evidence}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_prompt_fills_both_placeholders() {
        let prompt = build_review_prompt("Add cache", "diff --git a/c.rs b/c.rs\n+x");
        assert!(prompt.contains("PR Title: Add cache"));
        assert!(prompt.contains("+x"));
        assert!(!prompt.contains("{pr_title}"));
        assert!(!prompt.contains("{diff}"));
    }

    #[test]
    fn validate_prompt_fills_all_placeholders() {
        let prompt = build_validate_prompt("Title", "the-diff", "1. candidate");
        assert!(prompt.contains("PR Diff (for verification):\nthe-diff"));
        assert!(prompt.contains("Candidate Issues:\n1. candidate"));
        assert!(!prompt.contains("{candidates}"));
    }

    #[test]
    fn diff_braces_pass_through_literally() {
        let diff = "fn main() { let m = HashMap::new(); }";
        let prompt = build_review_prompt("t", diff);
        assert!(prompt.contains(diff));
    }

    #[test]
    fn candidates_numbered_with_optional_evidence() {
        let findings = vec![
            Finding {
                issue: "first".into(),
                evidence: Some("code".into()),
                severity: None,
                file: None,
            },
            Finding {
                issue: "second".into(),
                evidence: None,
                severity: None,
                file: None,
            },
        ];
        let text = render_candidates(&findings);
        assert_eq!(text, "1. first\n   Evidence: code\n2. second");
    }

    #[test]
    fn empty_candidates_render_empty() {
        assert_eq!(render_candidates(&[]), "");
    }
}
