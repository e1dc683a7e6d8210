//! # Version keys
//!
//! Every version and constraint boundary is reduced to a [`VersionKey`]:
//! a fixed-schema tuple compared strictly left to right.
//!
//! ```text
//! (epoch, major, minor, patch, pre_alpha, pre_beta, pre_rc, post1, post2, dev)
//! ```
//!
//! Pre-release, post-release and dev-release fields that were not present in the
//! input hold [`Bound::Unbounded`], which sorts after every real number.
//! This is what makes `2.8.2` newer than `2.8.2rc1`: both share the release fields,
//! but the final release carries `Unbounded` in `pre_rc` where the release candidate carries `1`.
//!
//! The same rule applies to post and dev releases, so `2.8.2.post1` sorts *before* `2.8.2`
//! and `2.8.2.dev0` sorts before `2.8.2`. Consumers expecting PEP 440's placement of
//! post-releases should be aware of this.

use std::{fmt, str::FromStr};

use bon::Builder;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::{ParseError, constraint::pep440};

/// A single numeric field of a [`VersionKey`] which may be absent.
///
/// Absent fields are `Unbounded`, which orders after any `Finite` value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bound {
    /// A number parsed from the input.
    Finite(u64),

    /// The field was not present in the input.
    #[default]
    Unbounded,
}

impl Bound {
    /// The parsed number, if the field was present.
    pub fn finite(self) -> Option<u64> {
        match self {
            Bound::Finite(n) => Some(n),
            Bound::Unbounded => None,
        }
    }
}

impl From<u64> for Bound {
    fn from(value: u64) -> Self {
        Bound::Finite(value)
    }
}

impl From<Option<u64>> for Bound {
    fn from(value: Option<u64>) -> Self {
        value.map(Bound::Finite).unwrap_or_default()
    }
}

/// The totally ordered tuple representation of a version.
///
/// Fields are declared in comparison order; the derived `Ord` is the
/// lexicographic tuple comparison.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Builder, CopyGetters,
)]
#[getset(get_copy = "pub")]
pub struct VersionKey {
    /// The epoch, `N!`; defaults to 0.
    #[builder(default)]
    epoch: u64,

    /// The first release segment.
    #[builder(default)]
    major: u64,

    /// The second release segment, 0 when absent.
    #[builder(default)]
    minor: u64,

    /// The third release segment, 0 when absent.
    #[builder(default)]
    patch: u64,

    /// The number of an alpha pre-release (`a`, `alpha`).
    #[builder(default, into)]
    pre_alpha: Bound,

    /// The number of a beta pre-release (`b`, `beta`).
    #[builder(default, into)]
    pre_beta: Bound,

    /// The number of a release candidate (`rc`, `c`, `pre`, `preview`).
    #[builder(default, into)]
    pre_rc: Bound,

    /// The number of a short-form post-release (`-N`).
    #[builder(default, into)]
    post1: Bound,

    /// The number of a verbose post-release (`postN`, `revN`, `rN`).
    #[builder(default, into)]
    post2: Bound,

    /// The number of a dev-release (`devN`).
    #[builder(default, into)]
    dev: Bound,
}

impl VersionKey {
    /// The epoch followed by the three stored release segments.
    ///
    /// The compatible-release comparator matches on a prefix of this array.
    pub fn head(&self) -> [u64; 4] {
        [self.epoch, self.major, self.minor, self.patch]
    }
}

/// A concrete version, such as `1!2.8.2rc1.post3.dev4+ubuntu.1`.
///
/// Only the first three release segments participate in ordering;
/// the remainder is kept for rendering and counted in the release specificity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct Version {
    /// The ordering key for this version.
    #[getset(get_copy = "pub")]
    key: VersionKey,

    /// Every release segment supplied in the input.
    #[getset(get = "pub")]
    release: Vec<u64>,

    /// The local version label after `+`, which never participates in ordering.
    #[getset(get = "pub")]
    local: Option<String>,
}

impl Version {
    pub(crate) fn new(key: VersionKey, release: Vec<u64>, local: Option<String>) -> Self {
        Self {
            key,
            release,
            local,
        }
    }

    /// Parse a concrete version.
    ///
    /// The input carries no comparator and may not contain a wildcard.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        pep440::parse_version(input)
    }

    /// The number of release segments explicitly supplied.
    pub fn release_specificity(&self) -> usize {
        self.release.len()
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = &self.key;
        if key.epoch != 0 {
            write!(f, "{}!", key.epoch)?;
        }

        let mut is_first = true;
        for segment in &self.release {
            if is_first {
                is_first = false;
                write!(f, "{segment}")?;
            } else {
                write!(f, ".{segment}")?;
            }
        }

        if let Some(n) = key.pre_alpha.finite() {
            write!(f, "a{n}")?;
        }
        if let Some(n) = key.pre_beta.finite() {
            write!(f, "b{n}")?;
        }
        if let Some(n) = key.pre_rc.finite() {
            write!(f, "rc{n}")?;
        }
        if let Some(n) = key.post1.finite() {
            write!(f, "-{n}")?;
        }
        if let Some(n) = key.post2.finite() {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = key.dev.finite() {
            write!(f, ".dev{n}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}
