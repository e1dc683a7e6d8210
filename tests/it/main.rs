//! Tests for the crate.

use simple_test_case::test_case;

use pipreq::*;

mod manifest;

#[test_case(">=2.8.2", "2.8.2", true; "floor_inclusive")]
#[test_case(">=2.8.2", "2.8.1", false; "below_floor")]
#[test_case(">=2.8.2", "2.8.1rc9", false; "rc_below_floor")]
#[test_case(">=2.8.2", "2.8.3.dev0", true; "dev_of_next_patch")]
#[test_case("~=2.8.2", "2.8.2", true; "compatible_floor")]
#[test_case("~=2.8.2", "2.8.1", false; "compatible_below_floor")]
#[test_case("~=2.8.2", "2.9.0", false; "compatible_next_minor")]
#[test_case("~=2.8.2", "2.8.3.dev0", true; "compatible_dev_of_next_patch")]
#[test]
fn likes(constraint: &str, version: &str, expected: bool) {
    let constraint = Constraint::parse(constraint).expect("must parse constraint");
    assert_eq!(constraint.likes(version), Ok(expected));
}

#[test_case("==2.8.2"; "equal")]
#[test_case(" >= 1!2.0rc3 "; "padded")]
#[test_case("<1.0.dev4"; "dev")]
#[test]
fn constraint_roundtrip(input: &str) {
    let constraint = Constraint::parse(input).expect("must parse constraint");
    let serialized = serde_json::to_string(&constraint).expect("must serialize");
    let deserialized: Constraint = serde_json::from_str(&serialized).expect("must deserialize");
    assert_eq!(constraint, deserialized);
}

#[test_case(Comparator::Equal, r#""==""#; "equal")]
#[test_case(Comparator::Compatible, r#""~=""#; "compatible")]
#[test_case(Comparator::GreaterOrEqual, r#"">=""#; "greater_or_equal")]
#[test]
fn serializes_comparator(comparator: Comparator, expected: &str) {
    assert_eq!(
        serde_json::to_string(&comparator).expect("must serialize"),
        expected
    );
}

#[test]
fn version_roundtrip() {
    let version = Version::parse("1!2.8.2rc1.post3+local.7").expect("must parse version");
    let serialized = serde_json::to_string(&version).expect("must serialize");
    assert_eq!(serialized, r#""1!2.8.2rc1.post3+local.7""#);
    let deserialized: Version = serde_json::from_str(&serialized).expect("must deserialize");
    assert_eq!(version, deserialized);
}

#[test]
fn error_wraps_parse_error() {
    let err = Constraint::parse(">=rickroll").expect_err("must reject constraint");
    let wrapped = Error::from(err.clone());
    assert_eq!(wrapped.to_string(), err.to_string());
    assert!(err.to_string().starts_with(r#"malformed constraint ">=rickroll""#));
}
