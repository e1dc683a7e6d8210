#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

mod constraint;
mod dependency;
mod error;
mod line;
mod manifest;
mod version;

pub use constraint::{Comparator, Constraint, Constraints};
pub use dependency::{Dependency, Location};
pub use error::*;
pub use line::{LineField, LineResult, RequirementLineParser, UnsupportedForm};
pub use manifest::{Diagnostic, LocationPolicy, Manifest, ManifestReader};
pub use version::{Bound, Version, VersionKey};
