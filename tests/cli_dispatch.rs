use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

const IMESSAGES: &str = "# iMessage Recent Threads Export

# Thread 1: Jane Doe
**Identifier:** +14155551234
**Last Message:** 2025-01-05 18:30:00

## Messages

**Jane Doe** [2025-01-05 18:30:00]
> see you tomorrow

---

# Thread 2: Ana Lima
**Identifier:** +15550102030
**Last Message:** 2025-01-04 10:00:00

## Messages

**Ana Lima** [2025-01-04 10:00:00]
> great meeting you

---

# Thread 3: 72975
**Identifier:** 72975

## Messages

**72975** [2025-01-04 11:00:00]
> Your verification code is 991002
";

const SLACK: &str = "# Slack Export\n\n## general\nMessages: 2\n\n**Ana** [2025-01-05 09:00:00]\n> standup notes\n";

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn setup_crm(root: &Path) {
    std::fs::create_dir_all(root.join("people")).expect("people dir should be creatable");
    std::fs::create_dir_all(root.join("addressbook")).expect("addressbook dir should be creatable");
    std::fs::write(
        root.join("people/jane-doe.md"),
        "# Jane Doe\n- **Last Updated:** 2025-01-05\nCell: +1 415 555 1234\n",
    )
    .expect("person file should be writable");
}

fn run_rolodex(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rolodex"))
        .env_remove("ROLODEX_PEOPLE_DIR")
        .env_remove("ROLODEX_CONFIG")
        .env("NO_COLOR", "1")
        .arg("--root")
        .arg(root)
        .arg("--addressbook")
        .arg(root.join("addressbook"))
        .arg("--as-of")
        .arg("2025-01-06 08:00")
        .args(args)
        .output()
        .expect("rolodex command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn sync_writes_reports_and_summarizes() {
    let root = unique_workspace("rolodex-cli-sync");
    setup_crm(&root);
    let sync_dir = root.join("sync");
    std::fs::create_dir_all(&sync_dir).expect("sync dir should be creatable");
    std::fs::write(sync_dir.join("imessages.md"), IMESSAGES).expect("export should be writable");
    std::fs::write(sync_dir.join("slack.md"), SLACK).expect("export should be writable");

    let output = run_rolodex(&root, &["sync", sync_dir.to_str().expect("utf8 path"), "--json"]);
    assert_success(&output);
    let summary = stdout_json(&output);
    assert_eq!(summary["imessage_contacts"], 3);
    assert_eq!(summary["named_candidates"], 1);
    assert_eq!(summary["slack_channels"], 1);
    assert_eq!(
        summary["skipped"],
        serde_json::json!(["emails_received.md", "emails_sent.md"])
    );

    let candidates = std::fs::read_to_string(sync_dir.join("NEW_PEOPLE_CANDIDATES.md"))
        .expect("candidates report should exist");
    assert!(candidates.contains("- **Ana Lima**"));
    assert!(!candidates.contains("72975"));
    assert!(sync_dir.join("SLACK_CONTACTS.md").exists());
    assert!(sync_dir.join("OUTREACH_DRAFTS.md").exists());
    assert!(sync_dir.join("RECENT_PEOPLE_TOUCHPOINTS.md").exists());
    assert!(!sync_dir.join("EMAIL_SENT_CONTACTS.md").exists());

    let plain = run_rolodex(&root, &["sync", sync_dir.to_str().expect("utf8 path")]);
    assert_success(&plain);
    let stdout = String::from_utf8_lossy(&plain.stdout);
    assert!(stdout.contains("wrote"));
    assert!(stdout.contains("skipped emails_sent.md"));
}

#[test]
fn candidates_print_report_or_json() {
    let root = unique_workspace("rolodex-cli-candidates");
    setup_crm(&root);
    let export = root.join("threads.md");
    std::fs::write(&export, IMESSAGES).expect("export should be writable");
    let export = export.to_str().expect("utf8 path");

    let report = run_rolodex(&root, &["candidates", export]);
    assert_success(&report);
    let stdout = String::from_utf8_lossy(&report.stdout);
    assert!(stdout.starts_with("# New People Candidates (from iMessages)\n*Generated: 2025-01-06 08:00*"));

    let json = run_rolodex(&root, &["candidates", export, "--json"]);
    assert_success(&json);
    let value = stdout_json(&json);
    assert_eq!(value["known"], 1);
    assert_eq!(value["excluded"], 1);
    assert_eq!(value["named"][0]["name"], "Ana Lima");

    let out_path = root.join("out/candidates.md");
    let written = run_rolodex(
        &root,
        &["candidates", export, "-o", out_path.to_str().expect("utf8 path")],
    );
    assert_success(&written);
    assert!(out_path.exists());
}

#[test]
fn resolve_and_people_report_json() {
    let root = unique_workspace("rolodex-cli-resolve");
    setup_crm(&root);

    let known = run_rolodex(&root, &["resolve", "4155551234", "--json"]);
    assert_success(&known);
    let value = stdout_json(&known);
    assert_eq!(value["classification"]["kind"], "known");
    assert_eq!(value["classification"]["reason"], "phone");

    let unknown = run_rolodex(&root, &["resolve", "+19998887777"]);
    assert_success(&unknown);
    assert!(String::from_utf8_lossy(&unknown.stdout).contains("unknown-number candidate"));

    let people = run_rolodex(&root, &["people", "--json"]);
    assert_success(&people);
    let value = stdout_json(&people);
    assert_eq!(value.as_array().map(Vec::len), Some(1));
    assert_eq!(value[0]["slug"], "jane-doe");
}

#[test]
fn new_contacts_with_empty_addressbook() {
    let root = unique_workspace("rolodex-cli-new");
    setup_crm(&root);

    let output = run_rolodex(&root, &["new-contacts", "--days", "2"]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout)
        .starts_with("# New Contacts (Last 2 Days)\n\n*No new contacts found.*"));
}

#[test]
fn failures_exit_nonzero() {
    let root = unique_workspace("rolodex-cli-fail");
    setup_crm(&root);

    let missing = run_rolodex(&root, &["sync", root.join("nope").to_str().expect("utf8 path")]);
    assert_failure(&missing);
    assert!(String::from_utf8_lossy(&missing.stderr).contains("sync directory not found"));

    assert_failure(&run_rolodex(&root, &["candidates", "missing.md"]));
    assert_failure(&run_rolodex(&root, &["new-contacts", "--days", "0"]));

    let bad_clock = Command::new(env!("CARGO_BIN_EXE_rolodex"))
        .arg("--root")
        .arg(&root)
        .arg("--as-of")
        .arg("soon")
        .arg("people")
        .output()
        .expect("rolodex command should run");
    assert_failure(&bad_clock);
}
