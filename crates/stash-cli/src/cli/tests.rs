//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::Path;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_get_defaults() {
    let cli = parse(&["stash", "get", "https://example.com/file.zip"]);
    match cli.command {
        CliCommand::Get {
            identifier,
            extract,
            force_download,
            force_extract,
        } => {
            assert_eq!(identifier, "https://example.com/file.zip");
            assert!(!extract);
            assert!(!force_download);
            assert!(!force_extract);
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_flags() {
    let cli = parse(&[
        "stash",
        "get",
        "https://example.com/file.zip",
        "--extract",
        "--force-download",
        "--force-extract",
    ]);
    match cli.command {
        CliCommand::Get {
            extract,
            force_download,
            force_extract,
            ..
        } => {
            assert!(extract);
            assert!(force_download);
            assert!(force_extract);
        }
        _ => panic!("expected Get with flags"),
    }
}

#[test]
fn cli_parse_global_overrides() {
    let cli = parse(&[
        "stash",
        "--root",
        "/tmp/cache",
        "--expire-days",
        "7",
        "list",
    ]);
    assert_eq!(cli.root.as_deref(), Some(Path::new("/tmp/cache")));
    assert_eq!(cli.expire_days, Some(7));
    assert!(matches!(
        cli.command,
        CliCommand::List {
            expired: false,
            details: false
        }
    ));
}

#[test]
fn cli_parse_list_expired_details() {
    let cli = parse(&["stash", "list", "--expired", "--details"]);
    assert!(matches!(
        cli.command,
        CliCommand::List {
            expired: true,
            details: true
        }
    ));
}

#[test]
fn cli_parse_remove() {
    let cli = parse(&["stash", "remove", "42"]);
    match cli.command {
        CliCommand::Remove { key } => assert_eq!(key, "42"),
        _ => panic!("expected Remove"),
    }
}

#[test]
fn cli_parse_download_and_upload() {
    let cli = parse(&["stash", "download", "https://example.com/a.bin", "/tmp/a.bin"]);
    match cli.command {
        CliCommand::Download { url, dest } => {
            assert_eq!(url, "https://example.com/a.bin");
            assert_eq!(dest, Path::new("/tmp/a.bin"));
        }
        _ => panic!("expected Download"),
    }

    let cli = parse(&["stash", "upload", "/tmp/a.bin", "/backup/a.bin"]);
    match cli.command {
        CliCommand::Upload { src, url } => {
            assert_eq!(src, Path::new("/tmp/a.bin"));
            assert_eq!(url, "/backup/a.bin");
        }
        _ => panic!("expected Upload"),
    }
}
