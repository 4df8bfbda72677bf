//! Tests for the fetch-headers subcommand.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_fetch_headers_defaults() {
    match parse(&["headcheck", "fetch-headers"]) {
        CliCommand::FetchHeaders {
            workers,
            recheck,
            rate_limit,
            batch_size,
        } => {
            assert!(workers.is_none());
            assert!(!recheck);
            assert!(rate_limit.is_none());
            assert!(batch_size.is_none());
        }
        _ => panic!("expected FetchHeaders"),
    }
}

#[test]
fn cli_parse_fetch_headers_overrides() {
    match parse(&[
        "headcheck",
        "fetch-headers",
        "--workers",
        "8",
        "--recheck",
        "--rate-limit",
        "20",
        "-b",
        "100",
    ]) {
        CliCommand::FetchHeaders {
            workers,
            recheck,
            rate_limit,
            batch_size,
        } => {
            assert_eq!(workers, Some(8));
            assert!(recheck);
            assert_eq!(rate_limit, Some(20));
            assert_eq!(batch_size, Some(100));
        }
        _ => panic!("expected FetchHeaders"),
    }
}

#[test]
fn cli_parse_fetch_headers_negative_rate_limit() {
    match parse(&["headcheck", "fetch-headers", "--rate-limit", "-1"]) {
        CliCommand::FetchHeaders { rate_limit, .. } => assert_eq!(rate_limit, Some(-1)),
        _ => panic!("expected FetchHeaders"),
    }
    match parse(&["headcheck", "fetch-headers", "--batch-size", "7"]) {
        CliCommand::FetchHeaders { batch_size, .. } => assert_eq!(batch_size, Some(7)),
        _ => panic!("expected FetchHeaders"),
    }
}

#[test]
fn cli_parse_fetch_headers_rejects_non_numeric() {
    assert!(Cli::try_parse_from(["headcheck", "fetch-headers", "--workers", "many"]).is_err());
    assert!(Cli::try_parse_from(["headcheck", "fetch-headers", "-b", "-3"]).is_err());
}

#[test]
fn cli_parse_global_db_after_subcommand() {
    let cli = Cli::try_parse_from(["headcheck", "fetch-headers", "--db", "/tmp/items.db"]).unwrap();
    assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/items.db")));
    assert!(matches!(cli.command, CliCommand::FetchHeaders { .. }));
}
