//! Command-line parsing

use clap::Parser;

use itreality::cli::{Cli, Commands, OutputFormat};
use itreality_core::domain::SubscriptionTier;

#[test]
fn test_collect_defaults_to_pretty_output() {
    let cli = Cli::try_parse_from(["itreality", "collect", "acme.com"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Pretty);
    match cli.command {
        Commands::Collect(args) => {
            assert_eq!(args.domain, "acme.com");
            assert!(args.contact_email.is_none());
        }
        other => panic!("expected collect, got {other:?}"),
    }
}

#[test]
fn test_format_flag_is_global() {
    let cli = Cli::try_parse_from(["itreality", "report", "acme.com", "--format", "json"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Json);
}

#[test]
fn test_snapshot_parses_tier_and_user() {
    let cli = Cli::try_parse_from([
        "itreality",
        "snapshot",
        "acme.com",
        "--email",
        "owner@acme.com",
        "--tier",
        "basic",
        "--user-id",
        "5f0c6a3e-8f7b-4c1e-9d55-2b7a3f1e9c10",
    ])
    .unwrap();

    match cli.command {
        Commands::Snapshot(args) => {
            assert_eq!(args.tier, SubscriptionTier::Basic);
            assert!(args.user_id.is_some());
            assert_eq!(args.email, "owner@acme.com");
        }
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[test]
fn test_snapshot_requires_email() {
    assert!(Cli::try_parse_from(["itreality", "snapshot", "acme.com"]).is_err());
}

#[test]
fn test_snapshot_rejects_unknown_tier() {
    let result = Cli::try_parse_from([
        "itreality",
        "snapshot",
        "acme.com",
        "--email",
        "owner@acme.com",
        "--tier",
        "platinum",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_tick_watch_flag() {
    let cli = Cli::try_parse_from(["itreality", "tick", "--watch"]).unwrap();
    assert!(matches!(cli.command, Commands::Tick(args) if args.watch));
}
