use std::path::PathBuf;

use thiserror::Error;

/// Records all errors reported by this library.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Errors encountered while parsing a constraint or version string.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Errors encountered while reading a manifest.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors encountered when parsing a [`Constraint`](crate::Constraint)
/// or a [`Version`](crate::Version) from a string.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The input did not match the version constraint grammar.
    #[error("malformed constraint {input:?}: {message}")]
    MalformedConstraint {
        /// The input originally provided to the parser.
        input: String,

        /// Describes what about the input was rejected.
        message: String,
    },
}

impl ParseError {
    /// Create a [`ParseError::MalformedConstraint`] error.
    pub fn malformed(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConstraint {
            input: input.into(),
            message: message.into(),
        }
    }
}

/// Errors encountered when reading a manifest with a
/// [`ManifestReader`](crate::ManifestReader).
///
/// Problems with the _content_ of individual lines (a missing package name,
/// a location form the reader is configured to reject) are not errors;
/// they are reported as [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("read manifest {}", path.display())]
    Io {
        /// The manifest being read.
        path: PathBuf,

        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A nested manifest reference leads back to a manifest that is
    /// still being read.
    #[error("manifest {} includes itself", path.display())]
    CyclicInclusion {
        /// The manifest referenced a second time.
        path: PathBuf,
    },

    /// A requirement line carried a malformed constraint.
    #[error("parse requirement at {}:{line}", path.display())]
    Line {
        /// The manifest containing the line.
        path: PathBuf,

        /// The 1-based line number.
        line: usize,

        /// The cause of the error.
        #[source]
        source: ParseError,
    },
}
