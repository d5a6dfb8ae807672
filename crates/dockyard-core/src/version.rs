//! Upstream release versions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A validated upstream release version.
///
/// The original text is kept verbatim: image tags and the `STRAPI_VERSION`
/// build argument use [`as_str`](Self::as_str) with no normalization.
/// Comparison follows semver precedence.
///
/// # Examples
///
/// ```
/// use dockyard_core::ReleaseVersion;
///
/// let rc: ReleaseVersion = "5.0.0-rc.1".parse().unwrap();
/// let ga: ReleaseVersion = "5.0.0".parse().unwrap();
/// assert!(rc < ga);
/// assert_eq!(rc.as_str(), "5.0.0-rc.1");
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    raw: String,
    parsed: semver::Version,
}

impl ReleaseVersion {
    /// Parse a version string.
    ///
    /// Surrounding whitespace is trimmed. Build metadata (`+...`) is rejected
    /// because it cannot appear in a Docker tag.
    pub fn parse(input: &str) -> crate::Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(crate::Error::InvalidVersion {
                input: input.to_owned(),
                reason: "empty version".to_owned(),
            });
        }

        let parsed = semver::Version::parse(raw).map_err(|e| crate::Error::InvalidVersion {
            input: input.to_owned(),
            reason: e.to_string(),
        })?;

        if !parsed.build.is_empty() {
            return Err(crate::Error::InvalidVersion {
                input: input.to_owned(),
                reason: "build metadata is not allowed in image tags".to_owned(),
            });
        }

        Ok(Self {
            raw: raw.to_owned(),
            parsed,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn semver(&self) -> &semver::Version {
        &self.parsed
    }

    pub fn is_prerelease(&self) -> bool {
        !self.parsed.pre.is_empty()
    }
}

impl FromStr for ReleaseVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed
            .cmp(&other.parsed)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_text_verbatim() {
        let v = ReleaseVersion::parse("5.1.0").unwrap();
        assert_eq!(v.as_str(), "5.1.0");
        assert_eq!(v.to_string(), "5.1.0");
        assert!(!v.is_prerelease());
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let v = ReleaseVersion::parse("  5.0.0\n").unwrap();
        assert_eq!(v.as_str(), "5.0.0");
    }

    #[test]
    fn parse_accepts_prerelease() {
        let v = ReleaseVersion::parse("5.0.0-rc.1").unwrap();
        assert_eq!(v.as_str(), "5.0.0-rc.1");
        assert!(v.is_prerelease());
    }

    #[test]
    fn parse_rejects_empty() {
        let err = ReleaseVersion::parse("   ").unwrap_err().to_string();
        assert!(err.contains("empty version"), "got: {err}");
    }

    #[test]
    fn parse_rejects_non_semver() {
        assert!(ReleaseVersion::parse("v5.0.0").is_err());
        assert!(ReleaseVersion::parse("5.0").is_err());
        assert!(ReleaseVersion::parse("latest").is_err());
    }

    #[test]
    fn parse_rejects_build_metadata() {
        let err = ReleaseVersion::parse("5.0.0+build.7")
            .unwrap_err()
            .to_string();
        assert!(err.contains("build metadata"), "got: {err}");
    }

    #[test]
    fn ordering_follows_semver_precedence() {
        let a = ReleaseVersion::parse("4.25.9").unwrap();
        let b = ReleaseVersion::parse("5.0.0-beta.2").unwrap();
        let c = ReleaseVersion::parse("5.0.0").unwrap();
        let d = ReleaseVersion::parse("5.10.0").unwrap();
        assert!(a < b && b < c && c < d);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(s in "\\PC*") {
                let _ = ReleaseVersion::parse(&s);
            }

            #[test]
            fn valid_triples_roundtrip_verbatim(
                major in 0u64..1000,
                minor in 0u64..1000,
                patch in 0u64..1000,
            ) {
                let text = format!("{major}.{minor}.{patch}");
                let v = ReleaseVersion::parse(&text).unwrap();
                prop_assert_eq!(v.as_str(), text.as_str());
            }

            #[test]
            fn ordering_matches_semver(
                a in (0u64..50, 0u64..50, 0u64..50),
                b in (0u64..50, 0u64..50, 0u64..50),
            ) {
                let va = ReleaseVersion::parse(&format!("{}.{}.{}", a.0, a.1, a.2)).unwrap();
                let vb = ReleaseVersion::parse(&format!("{}.{}.{}", b.0, b.1, b.2)).unwrap();
                prop_assert_eq!(va.cmp(&vb), va.semver().cmp(vb.semver()));
            }
        }
    }
}
