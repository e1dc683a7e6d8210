//! # Requirement lines
//!
//! Each manifest line is parsed on its own by [`RequirementLineParser`].
//! Lines are normalized before matching: surrounding whitespace, inline
//! comments and trailing per-requirement options (`--hash=...`) are removed,
//! and so is every remaining space, which is why
//! `docopt >= 0.6` and `docopt>=0.6` are equivalent.
//!
//! A normalized line takes one of these shapes, each yielding a [`LineResult`]:
//!
//! | Shape                              | Result                                              |
//! |------------------------------------|-----------------------------------------------------|
//! | blank or `# comment`               | [`LineResult::Skip`]                                |
//! | `-r <path>`, `--requirement <path>`| [`LineResult::NestedFile`]                          |
//! | `-c <path>`, `--constraint <path>` | [`LineField::ConstraintsFile`], always unsupported  |
//! | `-e <target>`, `--editable <target>`| [`LineField::Editable`]                            |
//! | `./<path>`, `../<path>`, `/<path>` | [`LineField::Wheel`]                                |
//! | `http(s)://<url>`                  | [`LineField::DistributionUrl`]                      |
//! | `name[extras] @ <url>`             | [`LineField::PackageUrl`]                           |
//! | `name[extras] <constraints>; <markers>` | [`LineResult::Dependency`]                     |
//! | any other `-option`                | [`UnsupportedForm::Option`]                         |
//!
//! Whether the location shapes are reported or recorded is decided by [`LocationPolicy`].

use std::{collections::BTreeMap, path::PathBuf};

use derive_more::Display;
use lazy_regex::{regex, regex_captures, regex_is_match};

use crate::{Constraint, Constraints, Dependency, Location, LocationPolicy, ParseError};

/// A location-like field of the requirement line grammar.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum LineField {
    /// `-c <path>`
    #[strum(serialize = "con_file")]
    ConstraintsFile,

    /// `-e <target>`
    #[strum(serialize = "editable")]
    Editable,

    /// `./<path>`
    #[strum(serialize = "wheel")]
    Wheel,

    /// `https://<url>`
    #[strum(serialize = "dist_url")]
    DistributionUrl,

    /// `name @ <url>`
    #[strum(serialize = "package_url")]
    PackageUrl,
}

/// A line form that was recognized but cannot be turned into a [`Dependency`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum UnsupportedForm {
    /// The line matched the grammar but names no package.
    #[display("cannot resolve requirement -- probably unsupported format")]
    Unresolvable,

    /// A pip option other than the nested file and editable options.
    #[display("option '{_0}' not supported")]
    Option(String),

    /// A location form declined by [`LocationPolicy::Reject`],
    /// or a constraints file reference.
    #[display("'{_0}' not supported")]
    Field(LineField),
}

/// The outcome of parsing one requirement line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineResult {
    /// A blank or comment line.
    Skip,

    /// A reference to another manifest, to be read in place of this line.
    ///
    /// The path is exactly as written; resolving it is up to the reader.
    NestedFile(PathBuf),

    /// The line cannot be turned into a dependency, for every reason listed.
    Unsupported(Vec<UnsupportedForm>),

    /// A requirement.
    Dependency(Dependency),
}

/// Parses single requirement lines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RequirementLineParser {
    policy: LocationPolicy,
}

/// The populated groups of a matched line; empty groups are `None`.
#[derive(Debug, Default)]
struct Groups<'a> {
    req_file: Option<&'a str>,
    con_file: Option<&'a str>,
    editable: Option<&'a str>,
    wheel: Option<&'a str>,
    dist_url: Option<&'a str>,
    package: Option<&'a str>,
    extras: Option<&'a str>,
    package_url: Option<&'a str>,
    version: Option<&'a str>,
    env_markers: Option<&'a str>,
}

impl<'a> Groups<'a> {
    /// Every group but `version` is optional and `version` accepts any run
    /// without `;`, so every normalized line matches.
    fn capture(line: &'a str) -> Self {
        let pattern = regex!(
            r"(?x)
            ^
            (?: (?: --requirement | -r ) =? (?P<req_file> .* ) )?
            (?: (?: --constraint | -c ) =? (?P<con_file> .* ) )?
            (?: (?: --editable | -e ) =? (?P<editable> [^;]* ) )?
            (?P<wheel> (?: \.{1,2}/ | / ) [^;]* )?
            (?P<dist_url> https?:// [^;]* )?
            (?P<package> [^\[<>~=!@;]+ )?
            (?: \[ (?P<extras> [^\]]* ) \] )?
            (?: @ (?P<package_url> [^;]* ) )?
            (?P<version> [^;]* )
            (?: ; (?P<env_markers> .* ) )?
            $"
        );

        let captures = pattern.captures(line);
        let group = |name: &str| {
            captures
                .as_ref()
                .and_then(|captures| captures.name(name))
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
        };

        Self {
            req_file: group("req_file"),
            con_file: group("con_file"),
            editable: group("editable"),
            wheel: group("wheel"),
            dist_url: group("dist_url"),
            package: group("package"),
            extras: group("extras"),
            package_url: group("package_url"),
            version: group("version"),
            env_markers: group("env_markers"),
        }
    }

    /// The populated location fields, in precedence order.
    fn locations(&self) -> Vec<LineField> {
        [
            (LineField::Editable, self.editable),
            (LineField::Wheel, self.wheel),
            (LineField::DistributionUrl, self.dist_url),
            (LineField::PackageUrl, self.package_url),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|_| field))
        .collect()
    }

    fn location(&self) -> Option<Location> {
        if let Some(target) = self.editable {
            return Some(Location::Editable(target.to_string()));
        }
        if let Some(path) = self.wheel {
            return Some(Location::Wheel(PathBuf::from(path)));
        }
        if let Some(url) = self.dist_url {
            return Some(Location::DistributionUrl(url.to_string()));
        }
        self.package_url
            .map(|url| Location::PackageUrl(url.to_string()))
    }
}

impl RequirementLineParser {
    /// Create a parser that handles location forms according to `policy`.
    pub fn new(policy: LocationPolicy) -> Self {
        Self { policy }
    }

    /// The location policy of this parser.
    pub fn policy(&self) -> LocationPolicy {
        self.policy
    }

    /// Parse a single manifest line.
    ///
    /// Only a malformed version constraint is an error;
    /// every other problem with the line is reported as [`LineResult::Unsupported`].
    pub fn parse_line(&self, line: &str) -> Result<LineResult, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(LineResult::Skip);
        }

        // Inline comments and trailing per-requirement options (`--hash=...`).
        let line = regex!(r"\s+(?:#|--).*$").replace(line, "");
        if let Some(option) = unsupported_option(&line) {
            return Ok(LineResult::Unsupported(vec![UnsupportedForm::Option(
                option.to_string(),
            )]));
        }

        let line = line.split_whitespace().collect::<String>();
        let groups = Groups::capture(&line);

        if let Some(path) = groups.req_file {
            return Ok(LineResult::NestedFile(PathBuf::from(path)));
        }
        if groups.con_file.is_some() {
            return Ok(LineResult::Unsupported(vec![UnsupportedForm::Field(
                LineField::ConstraintsFile,
            )]));
        }

        let locations = groups.locations();
        if self.policy == LocationPolicy::Reject && !locations.is_empty() {
            let forms = locations.into_iter().map(UnsupportedForm::Field).collect();
            return Ok(LineResult::Unsupported(forms));
        }
        if groups.package.is_none() && locations.is_empty() {
            return Ok(LineResult::Unsupported(vec![UnsupportedForm::Unresolvable]));
        }

        let dependency = Dependency::builder()
            .maybe_name(groups.package)
            .constraints(parse_constraints(groups.version)?)
            .env_markers(parse_env_markers(groups.env_markers))
            .extras(split_list(groups.extras).map(String::from).collect())
            .maybe_location(groups.location())
            .editable(groups.editable.is_some())
            .build();
        Ok(LineResult::Dependency(dependency))
    }
}

/// The name of a leading pip option this parser does not model, if any.
fn unsupported_option(line: &str) -> Option<&str> {
    if !line.starts_with('-') {
        return None;
    }

    let option = line
        .split(|c: char| c == '=' || c.is_whitespace())
        .next()
        .unwrap_or(line);
    // A short form either stands alone or has a path or URL attached (`-rdev.txt`),
    // so `-cache-dir` is an option of its own.
    let supported = regex_is_match!(
        r"^(?:-[rce](?:$|.*[./:\\])|--(?:requirement|constraint|editable)$)",
        option
    );
    (!supported).then_some(option)
}

fn split_list(list: Option<&str>) -> impl Iterator<Item = &str> {
    list.into_iter()
        .flat_map(|list| list.split(','))
        .filter(|item| !item.is_empty())
}

fn parse_constraints(clause: Option<&str>) -> Result<Constraints, ParseError> {
    split_list(clause).map(Constraint::parse).collect()
}

/// Marker clauses are split on commas; each entry maps the marker name
/// to the rest of the entry with quotes removed.
/// Entries without a name (`; <`) are dropped.
fn parse_env_markers(clause: Option<&str>) -> BTreeMap<String, String> {
    split_list(clause)
        .map(|marker| marker.replace(['\'', '"'], ""))
        .filter_map(|marker| {
            let (_, name, comparison) = regex_captures!(r"^([^<>~=!]+)(.*)$", &marker)?;
            Some((name.to_string(), comparison.to_string()))
        })
        .collect()
}
