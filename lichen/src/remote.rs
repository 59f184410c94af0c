// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use thiserror::Error;
use url::Url;

/// Which side of the remote contract a configured source speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Opam,
    Git,
}

/// A configured package source.
///
/// Opam remotes address an index server, git remotes a repository of spec
/// files tracked at `index/`. Two remotes are considered the same source
/// when either their rendered forms or their hostnames coincide.
#[derive(Debug, Clone)]
pub struct Remote {
    scheme: Scheme,
    url: Url,
}

impl Remote {
    /// Parse a remote, deriving the scheme from the URL shape.
    /// Bare `host[:port]` input becomes an opam remote.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let url = if input.contains("://") {
            Url::parse(input).map_err(|_| Error::Invalid(input.to_owned()))?
        } else {
            Url::parse(&format!("opam://{input}")).map_err(|_| Error::Invalid(input.to_owned()))?
        };

        let scheme = if looks_git(&url) {
            Scheme::Git
        } else {
            Scheme::Opam
        };

        Ok(Self { scheme, url })
    }

    /// Parse a remote that is a git repository regardless of its URL shape
    pub fn parse_git(input: &str) -> Result<Self, Error> {
        let remote = Self::parse(input)?;

        if remote.scheme == Scheme::Git {
            return Ok(remote);
        }

        // Tag non-git-looking URLs so the scheme survives a config round trip
        let tagged = format!("git+{}", remote.url);
        let url = Url::parse(&tagged).map_err(|_| Error::Invalid(input.to_owned()))?;

        Ok(Self {
            scheme: Scheme::Git,
            url,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL handed to `git`, with any `git+` tag stripped
    pub fn git_url(&self) -> String {
        self.url
            .as_str()
            .strip_prefix("git+")
            .unwrap_or(self.url.as_str())
            .to_owned()
    }

    /// Same-source test used for duplicate detection
    pub fn matches(&self, other: &Remote) -> bool {
        self.url.as_str() == other.url.as_str()
            || (!self.hostname().is_empty() && self.hostname() == other.hostname())
    }

    /// Removal matching: rendered form or hostname equality against `input`
    pub fn matches_str(&self, input: &str) -> bool {
        self.url.as_str() == input || (!self.hostname().is_empty() && self.hostname() == input)
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.as_str().fmt(f)
    }
}

fn looks_git(url: &Url) -> bool {
    url.scheme() == "git"
        || url.scheme().starts_with("git+")
        || url.path().ends_with(".git")
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid remote url {0:?}")]
    Invalid(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bare_host_is_opam() {
        let remote = Remote::parse("packages.example:4000").unwrap();
        assert_eq!(remote.scheme(), Scheme::Opam);
        assert_eq!(remote.hostname(), "packages.example");
        assert_eq!(remote.port(), Some(4000));
        assert_eq!(remote.to_string(), "opam://packages.example:4000");
    }

    #[test]
    fn git_detection() {
        for input in [
            "git://forge.example/specs",
            "https://forge.example/specs.git",
        ] {
            assert_eq!(Remote::parse(input).unwrap().scheme(), Scheme::Git);
        }

        let tagged = Remote::parse_git("https://forge.example/specs").unwrap();
        assert_eq!(tagged.scheme(), Scheme::Git);
        assert_eq!(tagged.git_url(), "https://forge.example/specs");

        // the tag survives rendering + reparsing
        let reparsed = Remote::parse(&tagged.to_string()).unwrap();
        assert_eq!(reparsed.scheme(), Scheme::Git);
    }

    #[test]
    fn matching_by_render_or_host() {
        let a = Remote::parse("opam://host.example:9999").unwrap();
        let b = Remote::parse("host.example").unwrap();
        let c = Remote::parse("other.example").unwrap();

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert!(a.matches_str("opam://host.example:9999"));
        assert!(a.matches_str("host.example"));
        assert!(!a.matches_str("other.example"));
    }
}
