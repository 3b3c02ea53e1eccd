use std::path::PathBuf;

use clap::Parser;

use super::{styled_command, Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

#[test]
fn sync_takes_a_directory() {
    let cli = parse(&["rolodex", "sync", "exports/2025-01-06"]);
    match cli.command {
        Commands::Sync(args) => {
            assert_eq!(args.sync_dir, PathBuf::from("exports/2025-01-06"));
            assert!(!args.json);
        }
        other => panic!("expected Sync, got {:?}", other),
    }
}

#[test]
fn global_paths_and_clock_parse_before_subcommand() {
    let cli = parse(&[
        "rolodex",
        "-C",
        "/crm",
        "--people-dir",
        "/crm/contacts",
        "--addressbook",
        "/tmp/ab",
        "--as-of",
        "2025-01-06 08:00",
        "people",
    ]);
    assert_eq!(cli.root, PathBuf::from("/crm"));
    assert_eq!(cli.people_dir, Some(PathBuf::from("/crm/contacts")));
    assert_eq!(cli.addressbook, Some(PathBuf::from("/tmp/ab")));
    assert_eq!(cli.as_of.as_deref(), Some("2025-01-06 08:00"));
    assert!(matches!(cli.command, Commands::People(_)));
}

#[test]
fn resolve_accepts_name_and_json() {
    let cli = parse(&["rolodex", "resolve", "+14155551234", "--name", "Jane", "--json"]);
    match cli.command {
        Commands::Resolve(args) => {
            assert_eq!(args.handle, "+14155551234");
            assert_eq!(args.name.as_deref(), Some("Jane"));
            assert!(args.json);
        }
        other => panic!("expected Resolve, got {:?}", other),
    }
}

#[test]
fn new_contacts_defaults_to_one_day() {
    let cli = parse(&["rolodex", "new-contacts"]);
    match cli.command {
        Commands::NewContacts(args) => {
            assert_eq!(args.days, 1);
            assert!(args.event.is_none());
        }
        other => panic!("expected NewContacts, got {:?}", other),
    }

    let cli = parse(&["rolodex", "new-contacts", "-d", "3", "-e", "Demo Day"]);
    match cli.command {
        Commands::NewContacts(args) => {
            assert_eq!(args.days, 3);
            assert_eq!(args.event.as_deref(), Some("Demo Day"));
        }
        other => panic!("expected NewContacts, got {:?}", other),
    }
}

#[test]
fn new_contacts_days_must_fit_the_window() {
    for days in ["0", "36501", "4000000000"] {
        let result = Cli::try_parse_from(["rolodex", "new-contacts", "--days", days]);
        assert!(result.is_err(), "--days {days} should be rejected");
    }
    let cli = parse(&["rolodex", "new-contacts", "--days", "36500"]);
    assert!(matches!(cli.command, Commands::NewContacts(args) if args.days == 36_500));
}

#[test]
fn completions_take_a_known_shell() {
    let cli = parse(&["rolodex", "completions", "zsh", "--install"]);
    match cli.command {
        Commands::Completions(args) => {
            assert_eq!(args.shell, Some(clap_complete::Shell::Zsh));
            assert!(args.install);
        }
        other => panic!("expected Completions, got {:?}", other),
    }
    assert!(Cli::try_parse_from(["rolodex", "completions", "tcsh"]).is_err());
}

#[test]
fn verbose_and_quiet_conflict() {
    let result = Cli::try_parse_from(["rolodex", "-v", "-q", "people"]);
    assert!(result.is_err());
}

#[test]
fn command_definition_is_consistent() {
    styled_command().debug_assert();
}
