use crate::ServerVersion;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};

#[test]
fn given_identifiers_and_aliases_when_parse_then_map_to_versions() {
    // When/Then
    assert_that!("16.0.3".parse::<ServerVersion>(), ok(eq(&ServerVersion::V16_0_3)));
    assert_that!("1603".parse::<ServerVersion>(), ok(eq(&ServerVersion::V16_0_3)));
    assert_that!("17.5.1".parse::<ServerVersion>(), ok(eq(&ServerVersion::V17_5_1)));
    assert_that!("1751".parse::<ServerVersion>(), ok(eq(&ServerVersion::V17_5_1)));
    assert_that!(" v17.5.1 ".parse::<ServerVersion>(), ok(eq(&ServerVersion::V17_5_1)));
}

#[test]
fn given_unknown_version_when_parse_then_validation_error() {
    // When
    let result = "18.0.0".parse::<ServerVersion>();

    // Then
    assert_that!(result, err(anything()));
    assert!(result.unwrap_err().is_validation());
}

#[test]
fn given_version_when_binary_then_matches_shipped_executable() {
    // When/Then
    assert_eq!(ServerVersion::V16_0_3.binary(), "florida-1603");
    assert_eq!(ServerVersion::V17_5_1.binary(), "florida-17.5.1");
}

#[test]
fn given_version_when_display_then_canonical_identifier() {
    // When/Then
    assert_eq!(ServerVersion::V16_0_3.to_string(), "16.0.3");
    assert_eq!(ServerVersion::V17_5_1.label(), "v17.5.1");
}
