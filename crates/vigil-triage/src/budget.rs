//! Diff budgeting: fit a unified diff into a character budget while
//! keeping the content most likely to contain reviewable bugs.
//!
//! The diff is split into per-file segments at the `diff --git` boundary,
//! each segment is scored by expected review value, and the highest-value
//! segments are packed first-fit into the budget. Balanced modify-in-place
//! changes outrank pure additions or deletions; tests, docs, lockfiles,
//! and structured config are deprioritized but never hard-excluded.

/// Default character budget for diff content sent to the model.
pub const DEFAULT_DIFF_BUDGET: usize = 80_000;

const FILE_MARKER: &str = "diff --git ";

/// Keyword groups matched case-insensitively against a segment's header
/// line, each multiplying the running score. Groups compound when a path
/// matches more than one.
const PENALTIES: &[(&[&str], f64)] = &[
    (&["test", "spec", "mock", "__test__", "fixture"], 0.3),
    (&[".md", ".adoc", ".txt", ".rst", "changelog", "readme"], 0.2),
    (&[".snap", ".lock", "package-lock", "yarn.lock"], 0.1),
    (&[".json", ".yaml", ".yml", ".toml", ".xml"], 0.5),
];

/// Fit `diff` into `budget` characters.
///
/// Diffs already within budget are returned byte-for-byte. Over-budget
/// diffs are split into per-file segments, scored, and repacked highest
/// value first; a segment that does not fit is skipped and later segments
/// are still tried. If nothing fits (one oversized segment, or a blob
/// with no file markers), the raw diff is hard-truncated to the budget.
///
/// The returned text never exceeds `budget` bytes.
///
/// # Examples
///
/// ```
/// use vigil_triage::budget::fit_to_budget;
///
/// let diff = "diff --git a/x.rs b/x.rs\n+let x = 1;\n";
/// assert_eq!(fit_to_budget(diff, 1000), diff);
/// ```
pub fn fit_to_budget(diff: &str, budget: usize) -> String {
    if diff.len() <= budget {
        return diff.to_string();
    }

    if !diff.contains(FILE_MARKER) {
        return hard_truncate(diff, budget).to_string();
    }

    let mut segments: Vec<(f64, &str)> = diff
        .split(FILE_MARKER)
        .skip(1)
        .filter(|body| !body.trim().is_empty())
        .map(|body| (segment_score(body), body))
        .collect();

    // Stable sort: ties keep original diff order.
    segments.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut packed = String::new();
    for (_, body) in &segments {
        let segment_len = FILE_MARKER.len() + body.len();
        if packed.len() + segment_len > budget {
            continue;
        }
        packed.push_str(FILE_MARKER);
        packed.push_str(body);
    }

    if packed.is_empty() {
        hard_truncate(diff, budget).to_string()
    } else {
        packed
    }
}

/// Expected review value of one per-file segment.
///
/// Base score `adds + dels + 2*min(adds, dels)`: the min term rewards
/// balanced modify-in-place hunks, which are more likely to carry logic
/// changes than pure additions or deletions. Keyword penalties then
/// multiply the score down for paths unlikely to contain real bugs.
fn segment_score(body: &str) -> f64 {
    let (adds, dels) = line_counts(body);
    let mut score = (adds + dels + 2 * adds.min(dels)) as f64;

    let header = body.lines().next().unwrap_or("").to_lowercase();
    for (keywords, factor) in PENALTIES {
        if keywords.iter().any(|kw| header.contains(kw)) {
            score *= factor;
        }
    }
    score
}

fn line_counts(body: &str) -> (usize, usize) {
    let mut adds = 0;
    let mut dels = 0;
    for line in body.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            adds += 1;
        } else if line.starts_with('-') {
            dels += 1;
        }
    }
    (adds, dels)
}

/// Truncate to at most `max` bytes without splitting a UTF-8 character.
fn hard_truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
