// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Version of a package release.
///
/// Ordinary releases carry an opaque version string ordered by
/// [`compare_releases`]. Packages tracked straight from a git remote use the
/// sentinel [`Version::Head`], which sorts after every release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    Release(String),
    Head(HeadState),
}

/// Freshness of a git-tracked installation relative to its remote.
/// Ordered so the up to date head is the preferred candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeadState {
    Unknown,
    Behind,
    UpToDate,
}

impl Version {
    pub fn is_head(&self) -> bool {
        matches!(self, Version::Head(_))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Release(v) => v.fmt(f),
            Version::Head(HeadState::UpToDate) => "HEAD".fmt(f),
            Version::Head(HeadState::Behind) => "HEAD*".fmt(f),
            Version::Head(HeadState::Unknown) => "HEAD?".fmt(f),
        }
    }
}

impl std::str::FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(InvalidVersion),
            "HEAD" => Ok(Version::Head(HeadState::UpToDate)),
            "HEAD*" => Ok(Version::Head(HeadState::Behind)),
            "HEAD?" => Ok(Version::Head(HeadState::Unknown)),
            release => Ok(Version::Release(release.to_owned())),
        }
    }
}

impl TryFrom<String> for Version {
    type Error = InvalidVersion;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Release(a), Version::Release(b)) => compare_releases(a, b),
            (Version::Release(_), Version::Head(_)) => Ordering::Less,
            (Version::Head(_), Version::Release(_)) => Ordering::Greater,
            (Version::Head(a), Version::Head(b)) => a.cmp(b),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("empty version string")]
pub struct InvalidVersion;

/// Compare two release strings by alternating non-digit / digit chunks.
/// Digit chunks compare numerically, so `1.10 > 1.9` and `1.2a < 1.2b`.
pub fn compare_releases(a: &str, b: &str) -> Ordering {
    let mut lhs = a;
    let mut rhs = b;

    while !lhs.is_empty() || !rhs.is_empty() {
        let (l_text, l_rest) = split_chunk(lhs, false);
        let (r_text, r_rest) = split_chunk(rhs, false);

        match l_text.cmp(r_text) {
            Ordering::Equal => {}
            other => return other,
        }

        let (l_num, l_rest) = split_chunk(l_rest, true);
        let (r_num, r_rest) = split_chunk(r_rest, true);

        match compare_numeric(l_num, r_num) {
            Ordering::Equal => {}
            other => return other,
        }

        lhs = l_rest;
        rhs = r_rest;
    }

    Ordering::Equal
}

fn split_chunk(s: &str, digits: bool) -> (&str, &str) {
    let end = s
        .find(|c: char| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod test {
    use super::*;

    fn release(s: &str) -> Version {
        Version::Release(s.to_owned())
    }

    #[test]
    fn release_ordering() {
        assert!(release("1.10") > release("1.9"));
        assert!(release("1.2b") > release("1.2a"));
        assert!(release("2.0") < release("2.0.1"));
        assert!(release("0.9.3") < release("0.10"));
        assert_eq!(release("1.02.0").cmp(&release("1.2.0")), Ordering::Equal);
    }

    #[test]
    fn head_sorts_last() {
        assert!(Version::Head(HeadState::UpToDate) > release("999"));
        assert!(release("0.1") < Version::Head(HeadState::Behind));
    }

    #[test]
    fn rendering_round_trip() {
        for raw in ["3.12.1", "HEAD", "HEAD*", "HEAD?"] {
            let version: Version = raw.parse().unwrap();
            assert_eq!(version.to_string(), raw);
        }
        assert!("".parse::<Version>().is_err());
    }
}
