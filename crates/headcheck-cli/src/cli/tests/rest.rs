//! Tests for add, import, status, completions, man.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::{CommandFactory, Parser};

#[test]
fn cli_parse_add() {
    match parse(&[
        "headcheck",
        "add",
        "0123456789abcdef0123456789abcdef",
        "https://mirror.example/x",
    ]) {
        CliCommand::Add { hash, url } => {
            assert_eq!(hash, "0123456789abcdef0123456789abcdef");
            assert_eq!(url, "https://mirror.example/x");
        }
        _ => panic!("expected Add"),
    }
}

#[test]
fn cli_parse_add_requires_url() {
    assert!(Cli::try_parse_from(["headcheck", "add", "0123456789abcdef0123456789abcdef"]).is_err());
}

#[test]
fn cli_parse_import() {
    match parse(&["headcheck", "import", "list.txt"]) {
        CliCommand::Import { path } => assert_eq!(path, std::path::PathBuf::from("list.txt")),
        _ => panic!("expected Import"),
    }
}

#[test]
fn cli_parse_status() {
    match parse(&["headcheck", "status"]) {
        CliCommand::Status { objects } => assert!(objects.is_none()),
        _ => panic!("expected Status"),
    }
    match parse(&["headcheck", "status", "--objects", "/srv/objects"]) {
        CliCommand::Status { objects } => {
            assert_eq!(objects.as_deref(), Some(std::path::Path::new("/srv/objects")))
        }
        _ => panic!("expected Status with --objects"),
    }
}

#[test]
fn cli_parse_completions_and_man() {
    match parse(&["headcheck", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
    assert!(matches!(parse(&["headcheck", "man"]), CliCommand::Man));
    assert!(Cli::try_parse_from(["headcheck", "completions", "cmd.exe"]).is_err());
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn cli_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["headcheck", "download"]).is_err());
    assert!(Cli::try_parse_from(["headcheck"]).is_err());
}
