use super::{App, AppError, AppOptions, EMAILS_RECEIVED_EXPORT, IMESSAGE_EXPORT, SLACK_EXPORT};
use crate::reports;
use crate::resolver::{Classification, KnownReason};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const IMESSAGES: &str = "# iMessage Recent Threads Export
**Exported:** 2025-01-06 08:00

---

# Thread 1: Jane Doe
**Identifier:** +14155551234
**Last Message:** 2025-01-05 18:30:00
**Message Count:** 2

## Messages

**Jane Doe** [2025-01-05 18:30:00]
> see you tomorrow

---

# Thread 2: Ana Lima
**Identifier:** +15550102030
**Last Message:** 2025-01-04 10:00:00
**Message Count:** 3

## Messages

**Ana Lima** [2025-01-04 10:00:00]
> great meeting you

---

# Thread 3: +19998887777
**Identifier:** +19998887777
**Last Message:** 2025-01-03 12:00:00

## Messages

**+19998887777** [2025-01-03 12:00:00]
> hey it's Sam from the meetup
";

const EMAILS: &str = "Date  From  Subject  Body
----  ----  ----  ----
2025-01-04 08:30  Jane <jane@example.com>  Lunch?  Thursday works
2025-01-05 09:00  Bo Chen <invitations@linkedin.com>  Bo Chen requested to connect  Founder
";

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("rolodex-app-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(root.join("people")).expect("temp workspace should be creatable");
    std::fs::create_dir_all(root.join("addressbook")).expect("addressbook dir should be creatable");
    std::fs::write(
        root.join("people/jane-doe.md"),
        "# Jane Doe\n- **Last Updated:** 2025-01-05\n- **Email:** jane@example.com\nCell: +1 415 555 1234\n",
    )
    .expect("person file should be writable");
    root
}

fn open_app(root: &Path) -> App {
    App::open(AppOptions {
        root: root.to_path_buf(),
        addressbook: Some(root.join("addressbook")),
        as_of: Some("2025-01-06 08:00".to_string()),
        ..AppOptions::default()
    })
    .expect("app should open")
}

#[test]
fn sync_writes_reports_for_present_exports() {
    let root = unique_workspace();
    let sync_dir = root.join("sync");
    std::fs::create_dir_all(&sync_dir).expect("sync dir should be creatable");
    std::fs::write(sync_dir.join(IMESSAGE_EXPORT), IMESSAGES).expect("export should be writable");
    std::fs::write(sync_dir.join(EMAILS_RECEIVED_EXPORT), EMAILS)
        .expect("export should be writable");

    let app = open_app(&root);
    let summary = app.sync(&sync_dir).expect("sync should succeed");
    assert_eq!(summary.imessage_contacts, 3);
    assert_eq!(summary.named_candidates, 1);
    assert_eq!(summary.unknown_candidates, 1);
    assert_eq!(summary.platform_candidates, 1);
    assert_eq!(summary.received_contacts, 1);
    assert!(summary.skipped.contains(&SLACK_EXPORT.to_string()));
    assert!(!sync_dir.join(reports::SLACK_CONTACTS).exists());

    let candidates = std::fs::read_to_string(sync_dir.join(reports::NEW_PEOPLE_CANDIDATES))
        .expect("candidates report should exist");
    assert!(candidates.contains("*Generated: 2025-01-06 08:00*"));
    assert!(candidates.contains("- **Ana Lima**"));
    assert!(candidates.contains("- **+19998887777**"));
    assert!(!candidates.contains("- **Jane Doe**"));
    assert!(candidates.contains("- **Bo Chen** (via `invitations@linkedin.com`)"));

    let touchpoints = std::fs::read_to_string(sync_dir.join(reports::RECENT_PEOPLE_TOUCHPOINTS))
        .expect("touchpoints report should exist");
    assert!(touchpoints.contains("### Jane Doe"));
    assert!(touchpoints.contains("- **Latest iMessage:** 2025-01-05 18:30:00"));

    let outreach = std::fs::read_to_string(sync_dir.join(reports::OUTREACH_DRAFTS))
        .expect("outreach report should exist");
    assert!(outreach.contains("### Ana Lima"));
    assert!(sync_dir.join(reports::IMESSAGE_CONTACTS).exists());
    assert!(sync_dir.join(reports::EMAIL_RECEIVED_CONTACTS).exists());
    assert!(!sync_dir.join(reports::EMAIL_SENT_CONTACTS).exists());
}

#[test]
fn sync_of_empty_dir_only_writes_outreach_and_touchpoints() {
    let root = unique_workspace();
    let sync_dir = root.join("empty-sync");
    std::fs::create_dir_all(&sync_dir).expect("sync dir should be creatable");

    let summary = open_app(&root).sync(&sync_dir).expect("sync should succeed");
    assert_eq!(summary.skipped.len(), 4);
    assert_eq!(summary.written.len(), 2);
    assert!(sync_dir.join(reports::OUTREACH_DRAFTS).exists());
    assert!(!sync_dir.join(reports::NEW_PEOPLE_CANDIDATES).exists());
}

#[test]
fn sync_rejects_missing_directory() {
    let root = unique_workspace();
    let err = open_app(&root)
        .sync(&root.join("nope"))
        .expect_err("missing sync dir should fail");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn candidates_reads_one_export() {
    let root = unique_workspace();
    let export = root.join("threads.md");
    std::fs::write(&export, IMESSAGES).expect("export should be writable");

    let run = open_app(&root).candidates(&export).expect("candidates should run");
    assert_eq!(run.observed, 3);
    assert_eq!(run.candidates.known, 1);
    assert_eq!(run.candidates.named[0].display_name(), "Ana Lima");
    assert!(run.report.starts_with("# New People Candidates (from iMessages)\n"));

    let missing = open_app(&root).candidates(&root.join("missing.md"));
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
fn resolve_handle_reports_classification() {
    let root = unique_workspace();
    let app = open_app(&root);

    let known = app
        .resolve_handle("(415) 555-1234", None)
        .expect("resolve should succeed");
    assert_eq!(
        known.classification,
        Classification::Known {
            reason: KnownReason::Phone
        }
    );
    assert_eq!(known.summary, "known (phone on file)");

    let unknown = app
        .resolve_handle("+1 999 888 7777", None)
        .expect("resolve should succeed");
    assert_eq!(
        unknown.classification,
        Classification::UnknownCandidate {
            phone: "+19998887777".to_string()
        }
    );

    let err = app
        .resolve_handle(" ", Some(""))
        .expect_err("empty input should fail");
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[test]
fn people_dir_falls_back_to_config_then_default() {
    let root = unique_workspace();
    assert_eq!(open_app(&root).people_dir(), root.join("people"));
    assert_eq!(open_app(&root).list_people().len(), 1);

    std::fs::write(root.join(".rolodex.toml"), "[paths]\npeople_dir = \"crm/people\"\n")
        .expect("config should be writable");
    assert_eq!(open_app(&root).people_dir(), root.join("crm/people"));
    assert!(open_app(&root).list_people().is_empty());
}

#[test]
fn invalid_as_of_is_rejected() {
    let root = unique_workspace();
    let result = App::open(AppOptions {
        root,
        as_of: Some("next tuesday".to_string()),
        ..AppOptions::default()
    });
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
}

#[test]
fn new_contacts_with_empty_addressbook_reports_none() {
    let root = unique_workspace();
    let app = open_app(&root);
    let view = app
        .new_contacts(1, None)
        .expect("new contacts should succeed");
    assert!(view.contacts.is_empty());
    assert_eq!(view.report, "# New Contacts (Last 1 Day)\n\n*No new contacts found.*");

    let err = app.new_contacts(0, None).expect_err("zero days should fail");
    assert!(matches!(err, AppError::InvalidArgument(_)));
}

#[test]
fn new_contacts_rejects_windows_before_the_earliest_date() {
    let root = unique_workspace();
    let err = open_app(&root)
        .new_contacts(u32::MAX, None)
        .expect_err("huge window should fail");
    assert!(matches!(err, AppError::InvalidArgument(_)));
}
