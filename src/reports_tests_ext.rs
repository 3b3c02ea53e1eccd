use std::path::Path;

use super::{
    candidates_report, email_directory, imessage_directory, imessage_draft, new_contact_draft,
    new_contacts_report, outreach_report, slack_directory, touchpoints_report, TouchpointSources,
    NAMED_HEADING, UNKNOWN_HEADING,
};
use crate::config::ReportLimits;
use crate::directory::RecentContact;
use crate::domain::contact::{MessagePreview, ObservedContact};
use crate::domain::timestamp::{parse_timestamp, Timestamp};
use crate::export::email::{EmailContact, EmailSummary};
use crate::export::slack::SlackChannel;
use crate::people::{PeopleIndex, PersonRecord};
use crate::resolver::{Candidate, CandidateSet, PlatformCandidate};

fn at(raw: &str) -> Timestamp {
    parse_timestamp(raw).expect("fixture timestamp should parse")
}

fn preview(date: &str, sender: &str, text: &str) -> MessagePreview {
    MessagePreview {
        date: date.to_string(),
        sender: sender.to_string(),
        preview: text.to_string(),
    }
}

fn observed(thread: usize, name: &str, identifier: &str, last: &str) -> ObservedContact {
    let mut contact = ObservedContact::new(name, identifier, last);
    contact.thread = thread;
    contact.message_count = "4".to_string();
    contact
}

fn candidate(name: &str, identifier: &str, last: &str) -> Candidate {
    Candidate {
        contact: observed(1, name, identifier, last),
        resolved_name: None,
    }
}

#[test]
fn candidates_report_lists_named_then_limited_unknowns() {
    let mut named = candidate("Ana Lima", "+15550102030", "2025-01-05 10:00:00");
    named.contact.recent = vec![
        preview("2025-01-03", "Ana Lima", "one"),
        preview("2025-01-04", "Me", "two"),
        preview("2025-01-05", "Ana Lima", "three"),
        preview("2025-01-05", "Ana Lima", "four"),
    ];
    let set = CandidateSet {
        named: vec![named],
        unknown: (0..3)
            .map(|idx| candidate("", &format!("+1999888000{idx}"), "2025-01-01"))
            .collect(),
        ..CandidateSet::default()
    };
    let limits = ReportLimits {
        unknown_limit: 2,
        ..ReportLimits::default()
    };

    let report = candidates_report(&set, &[], &limits, at("2025-01-06 08:00"));
    assert!(report.starts_with(
        "# New People Candidates (from iMessages)\n*Generated: 2025-01-06 08:00*\n\n"
    ));
    assert!(report.contains("- **Named candidates:** 1\n- **Unknown-number candidates:** 3\n"));
    assert!(report.contains(&format!(
        "{NAMED_HEADING}\n\n- **Ana Lima**\n  - Phone/ID: +15550102030\n  - Last message: 2025-01-05 10:00:00\n  - Recent previews:\n    - [2025-01-04] Me: two\n"
    )));
    assert!(!report.contains("] Ana Lima: one"));
    assert!(report.contains(UNKNOWN_HEADING));
    assert!(report.contains("- **+19998880001**\n"));
    assert!(!report.contains("- **+19998880002**"));
    assert!(report.contains("*...and 1 more unknown-number candidates*"));
    assert!(!report.contains("platform-mediated"));
}

#[test]
fn empty_candidate_lists_omit_their_sections() {
    let report = candidates_report(
        &CandidateSet::default(),
        &[],
        &ReportLimits::default(),
        at("2025-01-06"),
    );
    assert!(!report.contains(NAMED_HEADING));
    assert!(!report.contains(UNKNOWN_HEADING));
}

#[test]
fn platform_candidates_are_appended_to_the_candidate_report() {
    let platform = vec![PlatformCandidate {
        name: "Bo Chen".to_string(),
        email: "invitations@linkedin.com".to_string(),
        date: "2025-01-03 10:00".to_string(),
        subject: "Bo Chen requested to connect".to_string(),
        snippet: String::new(),
    }];
    let report = candidates_report(
        &CandidateSet::default(),
        &platform,
        &ReportLimits::default(),
        at("2025-01-06"),
    );
    assert!(report.contains("## 📧 Candidates from emails (platform-mediated)"));
    assert!(report.contains("- **Bo Chen** (via `invitations@linkedin.com`)\n  - Date: 2025-01-03 10:00\n"));
    assert!(!report.contains("Snippet"));
}

#[test]
fn imessage_directory_splits_recent_and_inactive() {
    let mut active = observed(2, "Ana Lima", "+15550102030", "2025-01-05 10:00:00");
    active.recent = vec![preview("2025-01-05", "Ana Lima", "see you")];
    let quiet_recent = observed(3, "No Previews", "+15550000003", "2025-01-04 10:00:00");
    let old = observed(1, "", "+15550000001", "2024-10-01 09:00:00");

    let report = imessage_directory(
        &[old, active, quiet_recent],
        &ReportLimits::default(),
        at("2025-01-06 08:00"),
    );
    assert!(report.contains("- **Total Threads:** 3\n"));
    assert!(report.contains("- **Recently Active (last ~14 days):** 1\n"));
    assert!(report.contains("- **Older / Inactive:** 1\n"));
    assert!(report.contains("### 2. **Ana Lima**\n\n- **Phone/ID:** +15550102030\n"));
    assert!(report.contains("- **[2025-01-05] Ana Lima:** see you\n"));
    assert!(report.contains("## 💤 Inactive Contacts\n\n- **+15550000001** - Last: 2024-10-01\n"));
    assert!(!report.contains("No Previews"));
}

#[test]
fn slack_directory_orders_by_message_count() {
    let channel = |name: &str, count| SlackChannel {
        channel: name.to_string(),
        message_count: count,
        recent: Vec::new(),
    };
    let report = slack_directory(
        &[channel("quiet", 2), channel("busy", 40)],
        at("2025-01-06"),
    );
    assert!(report.contains("- **Total Messages:** 42\n"));
    let busy = report.find("## busy").expect("busy channel listed");
    let quiet = report.find("## quiet").expect("quiet channel listed");
    assert!(busy < quiet);
}

fn email_contact(name: &str, email: &str, subjects: &[&str]) -> EmailContact {
    EmailContact {
        name: name.to_string(),
        email: email.to_string(),
        count: subjects.len(),
        last_date: "2025-01-04 08:30".to_string(),
        emails: subjects
            .iter()
            .map(|subject| EmailSummary {
                date: "2025-01-04 08:30".to_string(),
                subject: subject.to_string(),
                preview: String::new(),
            })
            .collect(),
    }
}

#[test]
fn email_directory_shows_counts_and_recent_subjects() {
    let report = email_directory(
        &[
            email_contact("Sam", "sam@startup.io", &["Intro"]),
            email_contact("Jane Doe", "jane@example.com", &["Lunch?", "Re: Lunch?"]),
        ],
        at("2025-01-06"),
    );
    assert!(report.contains("- **Total Emails:** 3\n"));
    assert!(report.find("## Jane Doe").expect("jane") < report.find("## Sam").expect("sam"));
    assert!(report.contains("- **[2025-01-04 08:30]** Re: Lunch?\n"));
    assert!(!report.contains("*Preview:*"));
}

#[test]
fn touchpoints_match_threads_by_phone_then_name_and_emails() {
    let jane = PersonRecord::parse(
        Path::new("people/jane-doe.md"),
        "# Jane Doe\n- **Last Updated:** 2025-01-05\nPhone +1 415 555 1234, jane@example.com\n",
    );
    let bob = PersonRecord::parse(
        Path::new("people/bob.md"),
        "# Bob Stone\n- **Last Updated:** 2025-01-02\n",
    );
    let stale = PersonRecord::parse(
        Path::new("people/stale.md"),
        "# Stale\n- **Last Updated:** 2024-01-01\n",
    );
    let people = PeopleIndex::from_records([jane, bob, stale]);

    let mut jane_thread = observed(1, "J", "+14155551234", "2025-01-05 18:30:00");
    jane_thread.recent = vec![preview("2025-01-05", "J", "see you")];
    let bob_thread = observed(2, "Bob Stone", "bob@stone.dev", "2025-01-03 09:00:00");
    let received = vec![email_contact("Jane", "Jane@Example.com", &["Lunch?"])];

    let report = touchpoints_report(
        &people,
        &TouchpointSources {
            imessage: &[jane_thread, bob_thread],
            received: &received,
            sent: &[],
        },
        14,
        at("2025-01-06"),
    );
    assert!(report.contains("- **People scanned:** 3\n- **Recently updated:** 2\n"));
    assert!(report.find("### Jane Doe").expect("jane") < report.find("### Bob Stone").expect("bob"));
    assert!(report.contains("- **File:** people/jane-doe.md\n- **Last Updated:** 2025-01-05\n"));
    assert!(report.contains("- **Latest iMessage:** 2025-01-05 18:30:00\n  - Preview: [2025-01-05] J: see you\n"));
    assert!(report.contains("- **Latest iMessage:** 2025-01-03 09:00:00\n"));
    assert!(report.contains("- **Latest Email:**\n  - Received: 2025-01-04 08:30\n    - Subject: Lunch?\n"));
    assert!(report.contains("- **Latest Email:** (no match in this sync export)\n"));
    assert!(!report.contains("### Stale"));
}

#[test]
fn touchpoints_without_recent_people_say_so() {
    let report = touchpoints_report(
        &PeopleIndex::default(),
        &TouchpointSources {
            imessage: &[],
            received: &[],
            sent: &[],
        },
        14,
        at("2025-01-06"),
    );
    assert!(report.ends_with("_No recently updated people files found._\n"));
}

#[test]
fn outreach_report_drafts_by_first_name() {
    let ana = candidate("Ana Lima", "+15550102030", "2025-01-05");
    let targets = vec![&ana];
    let report = outreach_report(&targets, &[], 25, at("2025-01-06"));
    assert!(report.contains("**DRAFTS ONLY.**"));
    assert!(report.contains("### Ana Lima\n\n- **To:** `+15550102030`\n- **Last seen:** 2025-01-05\n"));
    assert!(report.contains(
        "  - Hey Ana, great meeting you at [event/place] — want to grab a drink/coffee sometime next week?\n"
    ));
    assert!(report.contains("- iMessage: `Hey {first}, great meeting you"));
    assert!(!report.contains("## LinkedIn invite email drafts"));
    assert_eq!(
        imessage_draft("Ana"),
        "Hey Ana, great meeting you at [event/place] — want to grab a drink/coffee sometime next week?"
    );
}

#[test]
fn new_contacts_report_renders_drafts_and_empty_state() {
    assert_eq!(
        new_contacts_report(&[], 1, None),
        "# New Contacts (Last 1 Day)\n\n*No new contacts found.*"
    );

    let contacts = vec![RecentContact {
        name: "Ana Lima".to_string(),
        first_name: "Ana".to_string(),
        phone: "+15550102030".to_string(),
        added: at("2025-01-09 18:45"),
    }];
    let report = new_contacts_report(&contacts, 3, Some("Demo Day"));
    assert_eq!(
        report,
        "# New Contacts (Last 3 Days)\n\n## Ready to Message\n\n### Ana Lima\n- **Phone:** +15550102030\n- **Added:** 2025-01-09 18:45\n- **Draft:** Hey Ana, great meeting you at Demo Day — want to grab coffee next week?\n"
    );
    assert_eq!(
        new_contact_draft("Unknown", None),
        "Hey there, great meeting you — want to grab coffee next week?"
    );
}

#[test]
fn reports_are_stable_for_identical_inputs() {
    let set = CandidateSet {
        named: vec![candidate("Ana Lima", "+15550102030", "2025-01-05")],
        ..CandidateSet::default()
    };
    let limits = ReportLimits::default();
    let generated = at("2025-01-06 08:00");
    assert_eq!(
        candidates_report(&set, &[], &limits, generated),
        candidates_report(&set, &[], &limits, generated)
    );
}

#[test]
fn oversized_windows_include_everything_instead_of_failing() {
    let people = PeopleIndex::from_records([PersonRecord::parse(
        Path::new("people/old.md"),
        "# Old Friend\n- **Last Updated:** 1999-03-01\n",
    )]);
    let report = touchpoints_report(
        &people,
        &TouchpointSources {
            imessage: &[],
            received: &[],
            sent: &[],
        },
        i64::MAX,
        at("2025-01-06"),
    );
    assert!(report.contains("### Old Friend"));

    let limits = ReportLimits {
        recent_days: i64::MAX,
        ..ReportLimits::default()
    };
    let old = observed(1, "Old Friend", "+15550000001", "1999-03-01 09:00:00");
    let report = imessage_directory(&[old], &limits, at("2025-01-06"));
    assert!(report.contains("- **Older / Inactive:** 0\n"));
}
