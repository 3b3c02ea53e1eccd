use std::path::PathBuf;

use clap::Parser;

use super::{app_options, emit_report};

fn unique_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn app_options_carry_global_flags() {
    let cli = crate::cli::Cli::parse_from([
        "rolodex",
        "-C",
        "/crm",
        "--addressbook",
        "/tmp/ab",
        "--as-of",
        "2025-01-06",
        "people",
    ]);
    let options = app_options(&cli);
    assert_eq!(options.root, PathBuf::from("/crm"));
    assert_eq!(options.addressbook, Some(PathBuf::from("/tmp/ab")));
    assert_eq!(options.as_of.as_deref(), Some("2025-01-06"));
}

#[test]
fn emit_report_creates_parent_directories() {
    let dir = unique_dir("rolodex-main-test");
    let path = dir.join("reports/nested/NEW_CONTACTS.md");
    emit_report(Some(&path), "# New Contacts\n").expect("report should be written");
    assert_eq!(
        std::fs::read_to_string(&path).expect("report should be readable"),
        "# New Contacts\n"
    );
    let _ = std::fs::remove_dir_all(dir);
}
