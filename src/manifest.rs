//! # Manifests
//!
//! A manifest is a requirements file: one requirement per line,
//! optionally including further manifests with `-r <path>`.
//!
//! [`ManifestReader`] reads a manifest depth-first. The dependencies of a nested
//! manifest are inserted at the point of its `-r` line, before the remainder of the
//! including manifest. Nested paths are tried as written first, then relative to
//! the directory of the including manifest.
//!
//! Lines that cannot be turned into a dependency do not fail the read;
//! each is recorded as a [`Diagnostic`] and logged as a warning.
//! Reading fails only when a manifest cannot be read, when a manifest includes
//! itself, or when a requirement carries a malformed version constraint.
//!
//! ```no_run
//! # use pipreq::{LocationPolicy, ManifestReader};
//! # fn main() -> Result<(), pipreq::Error> {
//! let manifest = ManifestReader::builder()
//!     .policy(LocationPolicy::Record)
//!     .build()
//!     .parse("requirements.txt")?;
//!
//! for dependency in manifest.dependencies() {
//!     println!("{dependency}: {}", dependency.constraints());
//! }
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use bon::Builder;
use derive_more::Display;
use fs_err as fs;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum::EnumString;
use tracing::{debug, info, warn};

use crate::{
    Constraint, Dependency, LineResult, ManifestError, RequirementLineParser, UnsupportedForm,
};

/// How the reader treats requirements installed from a location
/// (editable installs, local paths, distribution URLs and package URLs).
///
/// Constraints file references (`-c`) have no counterpart in a [`Dependency`]
/// and are reported as unsupported under either policy.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LocationPolicy {
    /// Report each location form as unsupported and skip the line.
    #[default]
    Reject,

    /// Record the location in [`Dependency::location`] without a diagnostic.
    Record,
}

/// A line of a manifest that did not produce a dependency.
#[derive(Clone, Debug, PartialEq, Eq, Display, Getters, CopyGetters)]
#[display("{form} ({}:{line})", path.display())]
pub struct Diagnostic {
    /// The manifest containing the line.
    #[getset(get = "pub")]
    path: PathBuf,

    /// The 1-based number of the line; for continued lines, the first physical line.
    #[getset(get_copy = "pub")]
    line: usize,

    /// Why the line did not produce a dependency.
    #[getset(get = "pub")]
    form: UnsupportedForm,
}

/// The result of reading a manifest and everything it includes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Manifest {
    /// Dependencies in the order they were declared, nested manifests expanded in place.
    dependencies: Vec<Dependency>,

    /// Lines that did not produce a dependency, in the order they were read.
    diagnostics: Vec<Diagnostic>,
}

impl Manifest {
    /// Consume the manifest, keeping only its dependencies.
    pub fn into_dependencies(self) -> Vec<Dependency> {
        self.dependencies
    }
}

impl IntoIterator for Manifest {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.into_iter()
    }
}

/// Reads manifests from disk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Builder, CopyGetters)]
pub struct ManifestReader {
    /// How requirements installed from a location are treated.
    #[builder(default)]
    #[getset(get_copy = "pub")]
    policy: LocationPolicy,
}

impl ManifestReader {
    /// Read the manifest at `path` along with every manifest it includes.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
        let mut manifest = Manifest::default();
        self.read(path.as_ref(), &mut Vec::new(), &mut manifest)?;
        Ok(manifest)
    }

    /// Read manifest content that is already in memory.
    ///
    /// `origin` is reported in diagnostics and errors, and anchors the
    /// resolution of nested manifests, which are read from disk.
    #[tracing::instrument(skip_all, fields(origin = %origin.as_ref().display()))]
    pub fn parse_str(
        &self,
        content: &str,
        origin: impl AsRef<Path>,
    ) -> Result<Manifest, ManifestError> {
        let origin = origin.as_ref();
        let mut manifest = Manifest::default();
        let mut stack = vec![identity(origin)];
        self.scan(content, origin, &mut stack, &mut manifest)?;
        Ok(manifest)
    }

    fn read(
        &self,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        manifest: &mut Manifest,
    ) -> Result<(), ManifestError> {
        let id = identity(path);
        if stack.contains(&id) {
            return Err(ManifestError::CyclicInclusion {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        stack.push(id);
        let scanned = self.scan(&content, path, stack, manifest);
        stack.pop();
        scanned
    }

    fn scan(
        &self,
        content: &str,
        path: &Path,
        stack: &mut Vec<PathBuf>,
        manifest: &mut Manifest,
    ) -> Result<(), ManifestError> {
        let parser = RequirementLineParser::new(self.policy);
        for (number, line) in logical_lines(content) {
            let parsed = parser
                .parse_line(&line)
                .map_err(|source| ManifestError::Line {
                    path: path.to_path_buf(),
                    line: number,
                    source,
                })?;

            match parsed {
                LineResult::Skip => {}
                LineResult::NestedFile(nested) => {
                    let nested = resolve(path, &nested);
                    info!(path = %nested.display(), "scanning nested manifest");
                    self.read(&nested, stack, manifest)?;
                }
                LineResult::Unsupported(forms) => {
                    for form in forms {
                        let diagnostic = Diagnostic {
                            path: path.to_path_buf(),
                            line: number,
                            form,
                        };
                        warn!("{diagnostic}");
                        manifest.diagnostics.push(diagnostic);
                    }
                }
                LineResult::Dependency(dependency) => {
                    let keys = dependency
                        .constraints()
                        .iter()
                        .map(Constraint::key)
                        .collect::<Vec<_>>();
                    debug!(
                        name = %dependency,
                        constraints = ?keys,
                        path = %path.display(),
                        "found dependency"
                    );
                    manifest.dependencies.push(dependency);
                }
            }
        }

        info!(
            count = manifest.dependencies.len(),
            path = %path.display(),
            "found dependencies"
        );
        Ok(())
    }
}

/// Canonical form of a manifest path, used to detect inclusion cycles.
fn identity(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// A nested manifest path as written if it exists, otherwise relative to the including manifest.
fn resolve(including: &Path, nested: &Path) -> PathBuf {
    if nested.exists() {
        return nested.to_path_buf();
    }

    match including.parent() {
        Some(dir) => dir.join(nested),
        None => nested.to_path_buf(),
    }
}

/// Lines with trailing backslash continuations joined,
/// each paired with the 1-based number of its first physical line.
fn logical_lines(content: &str) -> impl Iterator<Item = (usize, String)> + '_ {
    let mut lines = content.lines().enumerate();
    std::iter::from_fn(move || {
        let (index, first) = lines.next()?;
        let mut line = first.to_string();
        while let Some(continued) = line.trim_end().strip_suffix('\\') {
            let end = continued.len();
            line.truncate(end);
            match lines.next() {
                Some((_, next)) => line.push_str(next),
                None => break,
            }
        }
        Some((index + 1, line))
    })
}
