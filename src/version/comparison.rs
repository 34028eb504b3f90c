//! Release selection over lists of action tags.
//!
//! # Examples
//!
//! ```rust
//! use awf_cli::version::VersionComparator;
//!
//! let releases: Vec<String> = ["v4", "v5", "v5.0.0", "v5.0.1", "v6", "v6.1.0-rc.1"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! // Stay on the current major
//! assert_eq!(VersionComparator::select_release("v5.0.0", &releases, false), Some("v5.0.1"));
//! // Or take the newest stable release overall
//! assert_eq!(VersionComparator::select_release("v5.0.0", &releases, true), Some("v6"));
//! ```

use super::ActionVersion;

/// Version comparison utilities for action tags.
///
/// Tags that do not parse as versions are ignored.
pub struct VersionComparator;

impl VersionComparator {
    /// Picks the release to move `current` to.
    ///
    /// When `current` is not a version the greatest release overall is
    /// returned. Otherwise the candidates are the releases sharing
    /// `current`'s major version, or all releases when `allow_major` is set.
    /// Pre-releases are candidates only when `current` is itself a
    /// pre-release.
    pub fn select_release<'a, S: AsRef<str>>(
        current: &str,
        releases: &'a [S],
        allow_major: bool,
    ) -> Option<&'a str> {
        let tags = releases.iter().map(|tag| tag.as_ref());
        match ActionVersion::parse(current) {
            Some(current) => {
                let allow_pre = !current.pre.is_empty();
                Self::best(tags, |v| {
                    (allow_major || v.same_major(&current)) && (allow_pre || v.pre.is_empty())
                })
            }
            None => Self::best(tags, |v| v.pre.is_empty()),
        }
    }

    fn best<'a>(
        tags: impl Iterator<Item = &'a str>,
        keep: impl Fn(&ActionVersion) -> bool,
    ) -> Option<&'a str> {
        tags.filter_map(|tag| ActionVersion::parse(tag).map(|version| (version, tag)))
            .filter(|(version, _)| keep(version))
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, tag)| tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_within_major() {
        let releases = tags(&["v4", "v5", "v5.0.0", "v5.0.1", "v6"]);
        assert_eq!(VersionComparator::select_release("v5.0.0", &releases, false), Some("v5.0.1"));
        assert_eq!(VersionComparator::select_release("v4", &releases, false), Some("v4"));
        assert_eq!(VersionComparator::select_release("v7", &releases, false), None);
    }

    #[test]
    fn test_select_prefers_major_tag_on_tie() {
        let releases = tags(&["v8.0.0", "v8"]);
        assert_eq!(VersionComparator::select_release("v8", &releases, false), Some("v8"));
    }

    #[test]
    fn test_select_allow_major_and_invalid_current() {
        let releases = tags(&["v1.0.0", "nightly", "v3.1", "v2.9.9"]);
        assert_eq!(VersionComparator::select_release("v1.0.0", &releases, true), Some("v3.1"));
        assert_eq!(VersionComparator::select_release("main", &releases, false), Some("v3.1"));
        assert_eq!(VersionComparator::select_release("v1", &tags(&["nightly"]), true), None);
    }

    #[test]
    fn test_stable_pins_skip_prereleases() {
        let releases = tags(&["v1.9.0", "v2.0.0-rc.1", "v1.10.0-beta.1"]);
        assert_eq!(VersionComparator::select_release("v1.9.0", &releases, true), Some("v1.9.0"));
        assert_eq!(VersionComparator::select_release("v1", &releases, false), Some("v1.9.0"));
        assert_eq!(VersionComparator::select_release("main", &releases, false), Some("v1.9.0"));
        let only_pre = tags(&["v3.0.0-rc.1"]);
        assert_eq!(VersionComparator::select_release("v3", &only_pre, false), None);
    }

    #[test]
    fn test_prerelease_pins_may_move_to_prereleases() {
        let releases = tags(&["v2.0.0-rc.1", "v2.0.0-rc.2", "v1.9.0"]);
        assert_eq!(
            VersionComparator::select_release("v2.0.0-rc.1", &releases, false),
            Some("v2.0.0-rc.2")
        );
        let released = tags(&["v2.0.0-rc.2", "v2.0.0"]);
        assert_eq!(
            VersionComparator::select_release("v2.0.0-rc.1", &released, false),
            Some("v2.0.0")
        );
    }
}
