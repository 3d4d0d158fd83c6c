use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Release identifier of one asset bundle, e.g. `9.2.1`.
///
/// Ordering: by `major`, then `minor`, then `patch` (total order). Immutable once built.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns `true` if this version was released before `other`.
    pub fn is_older_than(&self, other: &Self) -> bool {
        self < other
    }

    /// Returns `true` if this version was released after `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }

    /// Parse the canonical `major.minor.patch` form.
    ///
    /// Returns `None` for anything else: missing or extra segments, empty
    /// segments, signs, or non-digit characters. Version logs contain
    /// non-release entries, and callers treat those as "not a version".
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = text.split('.');
        let major = parse_segment(segments.next()?)?;
        let minor = parse_segment(segments.next()?)?;
        let patch = parse_segment(segments.next()?)?;
        if segments.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

fn parse_segment(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({}.{}.{})", self.major, self.minor, self.patch)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TypeError::InvalidVersion(s.to_string()))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Build the ordered (oldest-first) history of versions to process.
///
/// `candidates` is a version log ordered newest-first. Entries older than
/// `min` are dropped. Scanning stops at the first entry that is not a
/// version: everything past it is treated as unusable history.
pub fn versions_since<S: AsRef<str>>(candidates: &[S], min: &Version) -> Vec<Version> {
    let mut versions = Vec::new();
    for candidate in candidates {
        let Some(version) = Version::parse(candidate.as_ref()) else {
            break;
        };
        if version.is_older_than(min) {
            continue;
        }
        versions.push(version);
    }
    versions.reverse();
    versions
}
