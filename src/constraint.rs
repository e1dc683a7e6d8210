//! # Version Constraints
//!
//! A [`Constraint`] is a [`Comparator`] paired with a boundary [`Version`].
//! Evaluating a constraint reduces the candidate to its [`VersionKey`]
//! and compares the two keys according to the comparator:
//!
//! - `==`, `!=`: full key equality.
//! - `>`, `>=`, `<`, `<=`: key ordering.
//! - `~=`: the candidate is at least the boundary, and shares the first `s` fields
//!   of `(epoch, major, minor, patch)` with it, `s` being the boundary's release specificity.
//!   `~=2.8.2` therefore means `>=2.8.2, ==2.8.*` and `~=2.8` means `>=2.8, ==2.*`.
//!
//! ```
//! # use pipreq::Constraint;
//! let constraint = Constraint::parse("~=2.8.2").unwrap();
//! assert!(constraint.likes("2.8.3.dev0").unwrap());
//! assert!(!constraint.likes("2.9.0").unwrap());
//! ```
//!
//! The string grammar lives in the `pep440` submodule.

use std::{fmt, str::FromStr};

use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{ParseError, Version, VersionKey};

pub(crate) mod pep440;

/// The comparison operator of a [`Constraint`].
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum Comparator {
    /// `~=`: same release prefix, not older than the boundary.
    #[strum(serialize = "~=")]
    #[serde(rename = "~=")]
    Compatible,

    /// `==`; `===` is accepted as a synonym.
    #[strum(to_string = "==", serialize = "===")]
    #[serde(rename = "==", alias = "===")]
    Equal,

    /// `!=`
    #[strum(serialize = "!=")]
    #[serde(rename = "!=")]
    NotEqual,

    /// `<`
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Less,

    /// `<=`
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    LessOrEqual,

    /// `>`
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Greater,

    /// `>=`
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Comparator {
    /// The comparator accepting exactly the versions this one rejects.
    ///
    /// `~=` has no single-comparator complement.
    pub fn negate(self) -> Option<Self> {
        match self {
            Comparator::Equal => Some(Comparator::NotEqual),
            Comparator::NotEqual => Some(Comparator::Equal),
            Comparator::Greater => Some(Comparator::LessOrEqual),
            Comparator::LessOrEqual => Some(Comparator::Greater),
            Comparator::Less => Some(Comparator::GreaterOrEqual),
            Comparator::GreaterOrEqual => Some(Comparator::Less),
            Comparator::Compatible => None,
        }
    }
}

/// A single version constraint, such as `>=2.8.2`.
///
/// Constraints are immutable once parsed.
/// Wildcard constraints (`==2.8.*`) are stored in their rewritten form (`~=2.8.0`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct Constraint {
    /// The comparison operator.
    #[getset(get_copy = "pub")]
    comparator: Comparator,

    /// The boundary version.
    #[getset(get = "pub")]
    version: Version,
}

impl Constraint {
    pub(crate) fn new(comparator: Comparator, version: Version) -> Self {
        Self {
            comparator,
            version,
        }
    }

    /// Parse a constraint string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        pep440::parse_constraint(input)
    }

    /// The ordering key of the boundary version.
    pub fn key(&self) -> VersionKey {
        self.version.key()
    }

    /// The number of release segments supplied for the boundary version.
    pub fn release_specificity(&self) -> usize {
        self.version.release_specificity()
    }

    /// The same boundary with the complementary comparator, if one exists.
    pub fn negate(&self) -> Option<Self> {
        self.comparator
            .negate()
            .map(|comparator| Self::new(comparator, self.version.clone()))
    }

    /// Report whether the candidate version satisfies this constraint.
    pub fn matches(&self, candidate: &Version) -> bool {
        let floor = self.key();
        let key = candidate.key();
        match self.comparator {
            Comparator::Equal => key == floor,
            Comparator::NotEqual => key != floor,
            Comparator::Less => key < floor,
            Comparator::LessOrEqual => key <= floor,
            Comparator::Greater => key > floor,
            Comparator::GreaterOrEqual => key >= floor,
            Comparator::Compatible => {
                // Epoch is the first field, so the last specified release segment is left free.
                let prefix = self.release_specificity().min(4);
                key >= floor && key.head()[..prefix] == floor.head()[..prefix]
            }
        }
    }

    /// Parse the candidate version and report whether it satisfies this constraint.
    pub fn likes(&self, candidate: &str) -> Result<bool, ParseError> {
        let candidate = Version::parse(candidate)?;
        Ok(self.matches(&candidate))
    }
}

impl FromStr for Constraint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator, self.version)
    }
}

impl Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Constraint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Constraint::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An ordered list of constraints that a version must satisfy together.
///
/// An empty list places no restriction on the version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// Iterate over the constraints in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.0.iter()
    }

    /// The number of constraints.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every constraint is satisfied; true when empty.
    pub fn all_match(&self, candidate: &Version) -> bool {
        self.0.iter().all(|c| c.matches(candidate))
    }

    /// Whether any constraint is satisfied; false when empty.
    pub fn any_match(&self, candidate: &Version) -> bool {
        self.0.iter().any(|c| c.matches(candidate))
    }
}

impl From<Vec<Constraint>> for Constraints {
    fn from(constraints: Vec<Constraint>) -> Self {
        Self(constraints)
    }
}

impl FromIterator<Constraint> for Constraints {
    fn from_iter<T: IntoIterator<Item = Constraint>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Constraints {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut is_first = true;
        for constraint in &self.0 {
            if is_first {
                is_first = false;
                write!(f, "{constraint}")?;
            } else {
                write!(f, ",{constraint}")?;
            }
        }
        Ok(())
    }
}
