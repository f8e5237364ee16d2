use crate::{Cli, Commands, SettingsArgs};

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use fp_config::{ServerConfig, ServerVersion};
use googletest::assert_that;
use googletest::prelude::{eq, none, some};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("fpctl").chain(args.iter().copied())).unwrap()
}

#[test]
fn given_cli_definition_when_built_then_consistent() {
    // When/Then
    Cli::command().debug_assert();
}

#[test]
fn given_stop_without_yes_when_parsed_then_unconfirmed() {
    // When
    let cli = parse(&["stop"]);

    // Then
    assert!(matches!(cli.command, Commands::Stop { yes: false }));
}

#[test]
fn given_stop_with_yes_when_parsed_then_confirmed() {
    // When
    let cli = parse(&["stop", "--yes"]);

    // Then
    assert!(matches!(cli.command, Commands::Stop { yes: true }));
}

#[test]
fn given_start_with_all_settings_when_parsed_then_fields_set() {
    // When
    let cli = parse(&[
        "start",
        "--port",
        "8080",
        "--params",
        "--verbose -x",
        "--version",
        "1603",
    ]);

    // Then
    let Commands::Start(args) = cli.command else {
        panic!("expected start");
    };
    assert_that!(args.port.as_deref(), some(eq("8080")));
    assert_that!(args.params.as_deref(), some(eq("--verbose -x")));
    assert_that!(args.version, some(eq(ServerVersion::V16_0_3)));
}

#[test]
fn given_switch_with_unknown_version_when_parsed_then_rejected() {
    // When
    let result = Cli::try_parse_from(["fpctl", "switch", "18.0.0"]);

    // Then
    assert!(result.is_err());
}

#[test]
fn given_switch_with_alias_when_parsed_then_version_resolved() {
    // When
    let cli = parse(&["switch", "v1751"]);

    // Then
    assert!(matches!(
        cli.command,
        Commands::Switch {
            version: ServerVersion::V17_5_1
        }
    ));
}

#[test]
fn given_global_config_dir_after_subcommand_when_parsed_then_set() {
    // When
    let cli = parse(&["status", "--config-dir", "/tmp/panel"]);

    // Then
    assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/panel")));
}

#[test]
fn given_no_config_dir_when_parsed_then_none() {
    // When
    let cli = parse(&["watch"]);

    // Then
    assert_that!(cli.config_dir, none());
}

#[test]
fn given_partial_args_when_draft_then_stored_values_fill_gaps() {
    // Given
    let stored = ServerConfig {
        port: 9000,
        parameters: "-v".into(),
        version: ServerVersion::V16_0_3,
        running: true,
    };
    let args = SettingsArgs {
        port: Some("8080".into()),
        ..SettingsArgs::default()
    };

    // When
    let draft = args.draft(&stored);

    // Then
    assert_eq!(draft.port, "8080");
    assert_eq!(draft.parameters, "-v");
    assert_that!(draft.version, eq(ServerVersion::V16_0_3));
}

#[test]
fn given_invalid_port_text_when_draft_then_passed_through_for_validation() {
    // Given
    let args = SettingsArgs {
        port: Some("abc".into()),
        ..SettingsArgs::default()
    };

    // When
    let draft = args.draft(&ServerConfig::default());

    // Then
    assert_eq!(draft.port, "abc");
}
