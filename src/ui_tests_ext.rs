use std::path::PathBuf;

use super::{format_candidate, summary_counts, Palette};
use crate::app::SyncSummary;
use crate::domain::contact::ObservedContact;
use crate::resolver::Candidate;

fn plain() -> Palette {
    Palette { enabled: false }
}

#[test]
fn summary_counts_skip_sources_that_were_absent() {
    let summary = SyncSummary {
        sync_dir: PathBuf::from("sync"),
        imessage_contacts: 12,
        named_candidates: 3,
        unknown_candidates: 4,
        sent_contacts: 2,
        ..SyncSummary::default()
    };
    assert_eq!(
        summary_counts(&summary),
        vec![
            "imessage: 12 threads, 3 named, 4 unknown".to_string(),
            "email: 0 received, 2 sent".to_string(),
        ]
    );
    assert!(summary_counts(&SyncSummary::default()).is_empty());
}

#[test]
fn candidate_rows_prefer_resolved_names() {
    let candidate = Candidate {
        contact: ObservedContact::new("+15550102030", "+15550102030", "2025-01-04 10:00:00"),
        resolved_name: Some("Ana Lima".to_string()),
    };
    assert_eq!(
        format_candidate(&candidate, &plain()),
        "Ana Lima +15550102030 (last 2025-01-04 10:00:00)"
    );

    let undated = Candidate {
        contact: ObservedContact::new("Sam Park", "sam@startup.io", ""),
        resolved_name: None,
    };
    assert_eq!(
        format_candidate(&undated, &plain()),
        "Sam Park sam@startup.io (last unknown)"
    );
}

#[test]
fn palette_only_paints_when_enabled() {
    assert_eq!(plain().ok("done"), "done");
    assert_eq!(Palette { enabled: true }.ok("done"), "\x1b[32mdone\x1b[0m");
}
