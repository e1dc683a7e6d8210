use std::{collections::BTreeMap, fmt, path::PathBuf};

use bon::Builder;
use derive_more::Display;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

use crate::{Constraints, ParseError, Version};

/// Where a dependency is installed from, when it is not resolved from an index by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Location {
    /// An editable install (`-e <target>`), either a local path or a VCS URL.
    #[display("{_0}")]
    Editable(String),

    /// A local distribution or project directory (`./dist/pkg.whl`).
    #[display("{}", _0.display())]
    Wheel(PathBuf),

    /// A remote distribution (`https://host/pkg.tar.gz`).
    #[display("{_0}")]
    DistributionUrl(String),

    /// A direct reference for a named package (`pkg @ https://host/pkg.whl`).
    #[display("{_0}")]
    PackageUrl(String),
}

/// A single requirement declared in a manifest.
///
/// ```
/// # use pipreq::{Constraint, Dependency};
/// let dependency = Dependency::builder()
///     .name("requests")
///     .constraints(vec![Constraint::parse(">=2.8.1").unwrap()].into())
///     .build();
///
/// assert!(dependency.likes_version("2.8.3").unwrap());
/// assert!(!dependency.likes_version("2.8.0").unwrap());
/// ```
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Builder, Getters, CopyGetters, Serialize, Deserialize,
)]
pub struct Dependency {
    /// The package name; absent for location-only requirements.
    #[builder(into)]
    #[getset(get = "pub")]
    name: Option<String>,

    /// Constraints the installed version must satisfy together.
    #[builder(default)]
    #[getset(get = "pub")]
    constraints: Constraints,

    /// Environment markers, mapping the marker name to its raw comparison (`>=3.8`).
    #[builder(default)]
    #[getset(get = "pub")]
    env_markers: BTreeMap<String, String>,

    /// Optional feature sets requested for the package.
    #[builder(default)]
    #[getset(get = "pub")]
    extras: Vec<String>,

    /// Where the package is installed from, if not by name.
    #[getset(get = "pub")]
    location: Option<Location>,

    /// Whether this is an editable install.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    editable: bool,
}

impl Dependency {
    /// Report whether the version satisfies every constraint of this dependency.
    ///
    /// A dependency without constraints likes every version,
    /// in which case the version is not parsed at all.
    pub fn likes_version(&self, version: &str) -> Result<bool, ParseError> {
        if self.constraints.is_empty() {
            return Ok(true);
        }

        let version = Version::parse(version)?;
        Ok(self.constraints.all_match(&version))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "Undefined"),
        }
    }
}
