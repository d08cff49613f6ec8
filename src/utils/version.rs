//! Version comparison utilities.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Compare two version strings
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(ver_a), Ok(ver_b)) = (Version::parse(a), Version::parse(b)) {
        return ver_a.cmp(&ver_b);
    }

    // Dotted numeric versions such as "2.31" or "1.2.3.4" are common in binaries
    if let (Some(num_a), Some(num_b)) = (numeric_parts(a), numeric_parts(b)) {
        return num_a.cmp(&num_b);
    }

    a.cmp(b)
}

fn numeric_parts(v: &str) -> Option<Vec<u64>> {
    v.split('.').map(|p| p.parse::<u64>().ok()).collect()
}

/// How specific a version string is: number of dot-separated parts, then length.
///
/// Used to pick the more detailed of two versions for the same component.
#[must_use]
pub fn version_specificity(v: &str) -> (usize, usize) {
    let v = v.trim();
    if v.is_empty() {
        return (0, 0);
    }
    (v.split('.').count(), v.len())
}

/// Direction of a version change between two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionDirection {
    Upgrade,
    Downgrade,
    Changed,
}

impl VersionDirection {
    /// Classify a change from `old` to `new`.
    #[must_use]
    pub fn classify(old: &str, new: &str) -> Self {
        match compare_versions(old, new) {
            Ordering::Less => Self::Upgrade,
            Ordering::Greater => Self::Downgrade,
            Ordering::Equal => Self::Changed,
        }
    }
}
