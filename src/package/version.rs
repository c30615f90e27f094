//! Version helpers shared by the backends and the resolution engine.

use super::Pkg;

/// Version sentinel understood by `go install`.
pub const LATEST: &str = "latest";

/// Check if two version strings match.
///
/// Handles the 'v' prefix flexibly (e.g., "v1.0.0" matches "1.0.0").
/// Two empty versions never match: an unknown version is not up to date.
pub fn versions_match(v1: &str, v2: &str) -> bool {
    if v1.is_empty() || v2.is_empty() {
        return false;
    }
    let n1 = v1.strip_prefix('v').unwrap_or(v1);
    let n2 = v2.strip_prefix('v').unwrap_or(v2);
    n1 == n2
}

/// Keep only packages whose path ends with `query` (case-sensitive).
///
/// Applying it twice with the same query is the same as applying it once.
pub fn suffix_filter(pkgs: Vec<Pkg>, query: &str) -> Vec<Pkg> {
    pkgs.into_iter()
        .filter(|pkg| pkg.path.ends_with(query))
        .collect()
}
