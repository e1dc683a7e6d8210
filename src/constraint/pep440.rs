//! # Constraint grammar
//!
//! Parses `[comparator][N!]N(.N)*[.*][{a|b|rc|...}N][-N|.postN][.devN][+local]`
//! into the fixed-width [`VersionKey`] schema.
//!
//! - Comparators: `==`, `===`, `!=`, `>`, `>=`, `<`, `<=`, `~=`.
//!   `===` is evaluated as `==`.
//! - Separators between tags may be `.`, `-`, `_` or nothing.
//! - Tag labels are case-insensitive and normalize to three buckets:
//!   `a`/`alpha`, `b`/`beta`, and `rc`/`c`/`pre`/`preview`.
//! - Post-releases come in a short form (`-N`, stored in `post1`)
//!   and a verbose form (`postN`, `revN`, `rN`, stored in `post2`).
//! - A tag present without a number defaults to `0`.
//! - A trailing `.*` wildcard is only accepted as the final release segment of an `==`
//!   constraint, and nothing may follow it. It is rewritten as `~=` with the wildcard
//!   replaced by `0`, so `==2.8.*` parses as `~=2.8.0`.
//!
//! The whole input must be consumed; trailing text is rejected.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::{alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{eof, map_res, opt, recognize, value},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated},
};
use tracing::debug;

use super::{Comparator, Constraint};
use crate::{Bound, ParseError, Version, VersionKey};

/// The pre-release tag, normalized to its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreRelease {
    /// `aN` | `alphaN`
    Alpha(u64),

    /// `bN` | `betaN`
    Beta(u64),

    /// `rcN` | `cN` | `preN` | `previewN`
    Rc(u64),
}

impl PreRelease {
    fn parse(input: &str) -> IResult<&str, Self> {
        fn alpha(input: &str) -> IResult<&str, PreRelease> {
            let (input, _) = alt((tag_no_case("alpha"), tag_no_case("a"))).parse(input)?;
            let (input, number) = number_suffix(input)?;
            Ok((input, PreRelease::Alpha(number)))
        }
        fn beta(input: &str) -> IResult<&str, PreRelease> {
            let (input, _) = alt((tag_no_case("beta"), tag_no_case("b"))).parse(input)?;
            let (input, number) = number_suffix(input)?;
            Ok((input, PreRelease::Beta(number)))
        }
        fn rc(input: &str) -> IResult<&str, PreRelease> {
            let (input, _) = alt((
                tag_no_case("preview"),
                tag_no_case("pre"),
                tag_no_case("rc"),
                tag_no_case("c"),
            ))
            .parse(input)?;
            let (input, number) = number_suffix(input)?;
            Ok((input, PreRelease::Rc(number)))
        }
        preceded(opt(separator), alt((alpha, beta, rc))).parse(input)
    }
}

/// The post-release tag; the two spellings occupy different key fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostRelease {
    /// `-N`
    Short(u64),

    /// `postN` | `revN` | `rN`
    Long(u64),
}

impl PostRelease {
    fn parse(input: &str) -> IResult<&str, Self> {
        fn short(input: &str) -> IResult<&str, PostRelease> {
            preceded(char('-'), number)
                .map(PostRelease::Short)
                .parse(input)
        }
        fn long(input: &str) -> IResult<&str, PostRelease> {
            let (input, _) = opt(separator).parse(input)?;
            let (input, _) = alt((tag_no_case("post"), tag_no_case("rev"), tag_no_case("r")))
                .parse(input)?;
            let (input, number) = number_suffix(input)?;
            Ok((input, PostRelease::Long(number)))
        }
        alt((short, long)).parse(input)
    }
}

/// Everything the grammar extracts from a version, before it is folded into a key.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Parsed<'a> {
    epoch: u64,
    release: Vec<u64>,
    wildcard: bool,
    pre_release: Option<PreRelease>,
    post_release: Option<PostRelease>,
    dev_release: Option<u64>,
    local: Option<&'a str>,
}

impl Parsed<'_> {
    fn into_version(self) -> Version {
        if self.release.len() > 3 {
            debug!(
                release = ?self.release,
                "release segments beyond the third do not participate in ordering"
            );
        }

        let segment = |i: usize| self.release.get(i).copied().unwrap_or(0);
        let (alpha, beta, rc) = match self.pre_release {
            Some(PreRelease::Alpha(n)) => (Some(n), None, None),
            Some(PreRelease::Beta(n)) => (None, Some(n), None),
            Some(PreRelease::Rc(n)) => (None, None, Some(n)),
            None => (None, None, None),
        };
        let (post1, post2) = match self.post_release {
            Some(PostRelease::Short(n)) => (Some(n), None),
            Some(PostRelease::Long(n)) => (None, Some(n)),
            None => (None, None),
        };

        let key = VersionKey::builder()
            .epoch(self.epoch)
            .major(segment(0))
            .minor(segment(1))
            .patch(segment(2))
            .pre_alpha(Bound::from(alpha))
            .pre_beta(Bound::from(beta))
            .pre_rc(Bound::from(rc))
            .post1(Bound::from(post1))
            .post2(Bound::from(post2))
            .dev(Bound::from(self.dev_release))
            .build();

        Version::new(key, self.release, self.local.map(String::from))
    }
}

fn number(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>()).parse(input)
}

/// An optional number after a tag label, itself optionally separated from the label.
fn number_suffix(input: &str) -> IResult<&str, u64> {
    opt(preceded(opt(separator), number))
        .map(|n| n.unwrap_or(0))
        .parse(input)
}

fn separator(input: &str) -> IResult<&str, char> {
    one_of("-_.").parse(input)
}

fn comparator(input: &str) -> IResult<&str, Comparator> {
    alt((
        value(Comparator::Equal, tag("===")),
        value(Comparator::Equal, tag("==")),
        value(Comparator::NotEqual, tag("!=")),
        value(Comparator::Compatible, tag("~=")),
        value(Comparator::GreaterOrEqual, tag(">=")),
        value(Comparator::LessOrEqual, tag("<=")),
        value(Comparator::Greater, tag(">")),
        value(Comparator::Less, tag("<")),
    ))
    .parse(input)
}

fn version(input: &str) -> IResult<&str, Parsed<'_>> {
    fn epoch(input: &str) -> IResult<&str, u64> {
        terminated(number, char('!')).parse(input)
    }

    fn release(input: &str) -> IResult<&str, (Vec<u64>, bool)> {
        let (input, first) = number(input)?;
        let (input, rest) = many0(preceded(char('.'), number)).parse(input)?;
        let (input, wildcard) = opt(tag(".*")).parse(input)?;

        let mut segments = vec![first];
        segments.extend(rest);
        Ok((input, (segments, wildcard.is_some())))
    }

    fn dev_release(input: &str) -> IResult<&str, u64> {
        let (input, _) = opt(separator).parse(input)?;
        let (input, _) = tag_no_case("dev").parse(input)?;
        number_suffix(input)
    }

    fn local(input: &str) -> IResult<&str, &str> {
        preceded(
            char('+'),
            recognize(separated_list1(one_of("-_."), alphanumeric1)),
        )
        .parse(input)
    }

    let (input, epoch) = opt(epoch).parse(input)?;
    let (input, (release, wildcard)) = release(input)?;
    if wildcard {
        // Nothing may follow a wildcard; the caller's `eof` rejects any leftovers.
        let parsed = Parsed {
            epoch: epoch.unwrap_or(0),
            release,
            wildcard,
            pre_release: None,
            post_release: None,
            dev_release: None,
            local: None,
        };
        return Ok((input, parsed));
    }

    let (input, pre_release) = opt(PreRelease::parse).parse(input)?;
    let (input, post_release) = opt(PostRelease::parse).parse(input)?;
    let (input, dev_release) = opt(dev_release).parse(input)?;
    let (input, local) = opt(local).parse(input)?;

    Ok((
        input,
        Parsed {
            epoch: epoch.unwrap_or(0),
            release,
            wildcard,
            pre_release,
            post_release,
            dev_release,
            local,
        },
    ))
}

fn describe(input: &str, err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    let message = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) if e.input.is_empty() => {
            String::from("unexpected end of input")
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            format!("unexpected input at {:?}", e.input)
        }
        nom::Err::Incomplete(_) => String::from("incomplete input"),
    };
    ParseError::malformed(input, message)
}

/// Parse a constraint such as `~=2.8.2` or `==2.8.*`.
#[tracing::instrument(level = "trace")]
pub(crate) fn parse_constraint(input: &str) -> Result<Constraint, ParseError> {
    let (_, (comparator, parsed)) = (
        delimited(multispace0, comparator, multispace0),
        terminated(version, (multispace0, eof)),
    )
        .parse(input.trim())
        .map_err(|e| describe(input, e))?;

    if !parsed.wildcard {
        return Ok(Constraint::new(comparator, parsed.into_version()));
    }

    if comparator != Comparator::Equal {
        return Err(ParseError::malformed(
            input,
            format!("wildcard is only permitted with '==', not '{comparator}'"),
        ));
    }

    let mut parsed = parsed;
    parsed.release.push(0);
    Ok(Constraint::new(
        Comparator::Compatible,
        parsed.into_version(),
    ))
}

/// Parse a concrete version such as `2.8.3.dev0`.
#[tracing::instrument(level = "trace")]
pub(crate) fn parse_version(input: &str) -> Result<Version, ParseError> {
    let (_, parsed) = terminated(version, eof)
        .parse(input.trim())
        .map_err(|e| describe(input, e))?;

    if parsed.wildcard {
        return Err(ParseError::malformed(
            input,
            "a concrete version may not contain a wildcard",
        ));
    }

    Ok(parsed.into_version())
}
