//! Precision-aware semantic versions for GitHub Action tags.
//!
//! Action repositories publish tags at several precisions at once: `v4`,
//! `v4.2` and `v4.2.1` may all exist, with the short tags moved forward on
//! each release. [`ActionVersion`] keeps track of how many components a tag
//! spelled out so that, among numerically equal tags, the less precise one
//! can be preferred (`v8` over `v8.0.0`), following the major-tag
//! convention.
//!
//! # Accepted forms
//!
//! | Tag | Precision |
//! |-----|-----------|
//! | `v8` | [`Precision::Major`] |
//! | `v8.1` | [`Precision::MajorMinor`] |
//! | `v8.1.2`, `v8.1.2-rc.1` | [`Precision::Full`] |
//! | `v8.1.2.3` | [`Precision::Extended`] |
//!
//! The leading `v` is optional. Anything else (`latest`, `main`, `v1.x`) is
//! not a version.

pub mod comparison;

pub use comparison::VersionComparator;

use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// How many numeric components a tag spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision {
    /// `vN`
    Major,
    /// `vN.N`
    MajorMinor,
    /// `vN.N.N`
    Full,
    /// `vN.N.N.N`
    Extended,
}

/// A parsed action tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionVersion {
    /// Major component
    pub major: u64,
    /// Minor component (0 when absent)
    pub minor: u64,
    /// Patch component (0 when absent)
    pub patch: u64,
    /// Fourth component of extended tags (0 when absent)
    pub build: u64,
    /// Components present in the original tag
    pub precision: Precision,
    /// Pre-release suffix of full tags (`rc.1` in `v1.2.3-rc.1`)
    pub pre: Prerelease,
}

impl ActionVersion {
    /// Parse a tag; `None` when it is not a version.
    pub fn parse(tag: &str) -> Option<Self> {
        let text = tag.trim();
        let text = text.strip_prefix('v').unwrap_or(text);
        let (numbers, pre) = match text.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (text, None),
        };

        let parts: Vec<u64> = numbers
            .split('.')
            .map(|part| {
                let valid = !part.is_empty()
                    && part.bytes().all(|b| b.is_ascii_digit())
                    && (part == "0" || !part.starts_with('0'));
                if valid { part.parse().ok() } else { None }
            })
            .collect::<Option<_>>()?;

        let precision = match parts.len() {
            1 => Precision::Major,
            2 => Precision::MajorMinor,
            3 => Precision::Full,
            4 => Precision::Extended,
            _ => return None,
        };
        let pre = match pre {
            Some(pre) if precision == Precision::Full => Prerelease::new(pre).ok()?,
            Some(_) => return None,
            None => Prerelease::EMPTY,
        };

        let component = |i: usize| parts.get(i).copied().unwrap_or(0);
        Some(Self {
            major: component(0),
            minor: component(1),
            patch: component(2),
            build: component(3),
            precision,
            pre,
        })
    }

    /// Numeric comparison ignoring precision.
    pub fn cmp_numeric(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.build)
            .cmp(&(other.major, other.minor, other.patch, other.build))
            .then_with(|| cmp_pre(&self.pre, &other.pre))
    }

    /// Whether both versions share a major component.
    pub fn same_major(&self, other: &Self) -> bool {
        self.major == other.major
    }
}

/// A release sorts above its pre-releases.
fn cmp_pre(a: &Prerelease, b: &Prerelease) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

impl Ord for ActionVersion {
    /// Numeric order first; on a tie the less precise tag is greater.
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_numeric(other).then_with(|| other.precision.cmp(&self.precision))
    }
}

impl PartialOrd for ActionVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ActionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major)?;
        if self.precision >= Precision::MajorMinor {
            write!(f, ".{}", self.minor)?;
        }
        if self.precision >= Precision::Full {
            write!(f, ".{}", self.patch)?;
        }
        if self.precision == Precision::Extended {
            write!(f, ".{}", self.build)?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}
