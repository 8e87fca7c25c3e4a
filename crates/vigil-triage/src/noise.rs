//! Classification of file paths that are not worth reviewing.
//!
//! Lockfiles, minified bundles, source maps, build output, generated code,
//! and test snapshots carry no reviewable logic. They are counted as
//! skipped for reporting; the diff budget separately deprioritizes them.

use vigil_core::ReviewConfig;

const NOISE_EXACT: &[&str] = &[
    "pnpm-lock.yaml",
    "package-lock.json",
    "yarn.lock",
    "npm-shrinkwrap.json",
    "bun.lockb",
    "Cargo.lock",
    "Gemfile.lock",
    "poetry.lock",
    "Pipfile.lock",
    "uv.lock",
    "go.sum",
    "composer.lock",
    "packages.lock.json",
    "pubspec.lock",
    "Package.resolved",
    "mix.lock",
    ".DS_Store",
    "Thumbs.db",
];

const NOISE_SUFFIXES: &[&str] = &[
    ".min.js",
    ".min.css",
    ".map",
    ".chunk.js",
    ".bundle.js",
    ".lock",
    ".snap",
];

const NOISE_PREFIXES: &[&str] = &[
    "dist/",
    "build/",
    ".next/",
    "__generated__/",
    "__snapshots__/",
    ".turbo/",
];

/// Check a path against the fixed noise tables.
///
/// Pure function over the path string; no filesystem access.
///
/// # Examples
///
/// ```
/// use vigil_triage::noise::is_noise;
///
/// assert!(is_noise("Cargo.lock"));
/// assert!(is_noise("dist/bundle.js"));
/// assert!(!is_noise("src/main.rs"));
/// ```
pub fn is_noise(path: &str) -> bool {
    let filename = path.rsplit('/').next().unwrap_or(path);

    if NOISE_EXACT.iter().any(|n| filename == *n) {
        return true;
    }

    if NOISE_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
        return true;
    }

    if NOISE_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }

    false
}

/// Noise classifier combining the fixed tables with user glob patterns.
///
/// # Examples
///
/// ```
/// use vigil_triage::noise::NoiseFilter;
///
/// let filter = NoiseFilter::new(&["*.gen.ts".into()]);
/// assert!(filter.is_noise("api.gen.ts"));
/// assert!(filter.is_noise("yarn.lock"));
/// assert!(!filter.is_noise("src/api.ts"));
/// ```
#[derive(Debug, Default)]
pub struct NoiseFilter {
    extra: Vec<glob::Pattern>,
}

impl NoiseFilter {
    /// Build a filter from additional glob patterns. Invalid patterns are
    /// ignored rather than rejected, matching how they are sourced from
    /// optional user configuration.
    pub fn new(patterns: &[String]) -> Self {
        let extra = patterns
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect();
        Self { extra }
    }

    /// Build a filter from review configuration.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(&config.skip_patterns)
    }

    /// Check whether `path` is noise.
    pub fn is_noise(&self, path: &str) -> bool {
        is_noise(path) || self.extra.iter().any(|p| p.matches(path))
    }
}
