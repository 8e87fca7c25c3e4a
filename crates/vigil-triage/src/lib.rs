//! Pre-model triage for pull request diffs.
//!
//! Two concerns live here, both pure string/path logic with no I/O:
//!
//! - [`noise`] — classify changed files that carry no reviewable logic
//!   (lockfiles, minified bundles, build output, snapshots)
//! - [`budget`] — fit an oversized diff into a character budget by
//!   scoring per-file segments and packing the highest-value ones first

pub mod budget;
pub mod noise;

pub use budget::{fit_to_budget, DEFAULT_DIFF_BUDGET};
pub use noise::{is_noise, NoiseFilter};
