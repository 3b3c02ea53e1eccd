use std::path::Path;

use super::{
    is_phone_shaped, outreach_targets, platform_candidates, Classification, ExclusionReason,
    KnownReason, Resolver,
};
use crate::config::FilterRules;
use crate::directory::{ContactDirectory, DirectoryEntry, HandleKind};
use crate::domain::contact::{MessagePreview, ObservedContact};
use crate::export::email::parse_rows;
use crate::people::{PeopleIndex, PersonRecord};

fn people(files: &[(&str, &str)]) -> PeopleIndex {
    PeopleIndex::from_records(
        files
            .iter()
            .map(|(file, text)| PersonRecord::parse(Path::new(file), text)),
    )
}

fn directory(entries: &[(&str, &str)]) -> ContactDirectory {
    ContactDirectory::from_entries(entries.iter().map(|(handle, name)| DirectoryEntry {
        kind: if handle.contains('@') {
            HandleKind::Email
        } else {
            HandleKind::Phone
        },
        handle: handle.to_string(),
        name: name.to_string(),
    }))
}

fn contact(name: &str, identifier: &str, last: &str) -> ObservedContact {
    ObservedContact::new(name, identifier, last)
}

fn with_preview(mut contact: ObservedContact, text: &str) -> ObservedContact {
    contact.recent.push(MessagePreview {
        date: "2025-01-01".to_string(),
        sender: contact.name.clone(),
        preview: text.to_string(),
    });
    contact
}

fn jane_people() -> PeopleIndex {
    people(&[(
        "jane-doe.md",
        "# Jane Doe\n- **Email:** jane@example.com\nCell: +14155551234\n",
    )])
}

#[test]
fn scenario_known_person_and_unknown_number() {
    let people = jane_people();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let set = resolver.resolve(&[
        contact("Jane Doe", "+14155551234", "2025-01-01"),
        contact("", "+19998887777", "2025-01-05"),
    ]);
    assert_eq!(set.known, 1);
    assert!(set.named.is_empty());
    assert_eq!(set.unknown.len(), 1);
    assert_eq!(set.unknown[0].contact.identifier, "+19998887777");
}

#[test]
fn bare_ten_digit_identifier_matches_person_phone() {
    let people = jane_people();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let decision = resolver.classify(&contact("", "4155551234", "2025-01-02"));
    assert_eq!(
        decision.classification,
        Classification::Known {
            reason: KnownReason::Phone
        }
    );
}

#[test]
fn formatting_variants_of_one_number_match_the_same_person() {
    let people = jane_people();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    for handle in ["+1 (415) 555-1234", "14155551234", "+14155551234"] {
        let decision = resolver.classify(&contact("", handle, ""));
        assert!(
            matches!(decision.classification, Classification::Known { .. }),
            "{handle} should be known"
        );
    }
}

#[test]
fn repeated_unknown_number_is_listed_once() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let set = resolver.resolve(&[
        contact("", "+1 (999) 888-7777", "2025-01-03"),
        contact("+19998887777", "+19998887777", "2025-01-04"),
    ]);
    assert_eq!(set.unknown.len(), 1);
    assert_eq!(set.duplicates, 1);
}

#[test]
fn relationship_labels_never_become_candidates() {
    let people = PeopleIndex::default();
    let directory = directory(&[("+15550001111", "Mom")]);
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let set = resolver.resolve(&[
        contact("mom", "+15550002222", "2025-01-03"),
        contact("", "+15550001111", "2025-01-04"),
    ]);
    assert!(set.named.is_empty());
    assert!(set.unknown.is_empty());
    assert_eq!(set.excluded, 2);
}

#[test]
fn verification_code_previews_are_dropped() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let sender = with_preview(
        contact("", "+15557654321", "2025-01-03"),
        "Your Verification Code is 123456",
    );
    assert_eq!(
        resolver.classify(&sender).classification,
        Classification::Excluded {
            reason: ExclusionReason::SystemMarker("verification code".to_string())
        }
    );
    let set = resolver.resolve(&[sender]);
    assert!(set.named.is_empty() && set.unknown.is_empty());
}

#[test]
fn short_codes_and_placeholders_are_system_senders() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    assert_eq!(
        resolver.classify(&contact("", "72975", "")).classification,
        Classification::Excluded {
            reason: ExclusionReason::ShortCode
        }
    );
    assert_eq!(
        resolver.classify(&contact("Unknown", "+15550009999", "")).classification,
        Classification::Excluded {
            reason: ExclusionReason::Placeholder
        }
    );
}

#[test]
fn late_directory_names_are_still_screened() {
    let people = people(&[("ana-lima.md", "# Ana Lima\n")]);
    let directory = directory(&[("+15550001111", "Mom"), ("+15550102030", "Ana Lima")]);
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let decision = resolver.classify(&contact("mom@family.net", "+15550001111", ""));
    assert_eq!(
        decision.classification,
        Classification::Excluded {
            reason: ExclusionReason::Relationship
        }
    );
    assert_eq!(decision.resolved_name.as_deref(), Some("Mom"));

    let decision = resolver.classify(&contact("ana@lima.org", "+15550102030", ""));
    assert_eq!(
        decision.classification,
        Classification::Known {
            reason: KnownReason::Name
        }
    );
}

#[test]
fn directory_names_promote_raw_numbers() {
    let people = PeopleIndex::default();
    let directory = directory(&[("+1 (555) 010-2030", "Ana Lima")]);
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let decision = resolver.classify(&contact("+15550102030", "+15550102030", ""));
    assert_eq!(decision.classification, Classification::NamedCandidate);
    assert_eq!(decision.resolved_name.as_deref(), Some("Ana Lima"));
}

#[test]
fn resolved_name_is_checked_against_people() {
    let people = people(&[("ana-lima.md", "# Ana Lima\n")]);
    let directory = directory(&[("+15550102030", "Ana Lima")]);
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let decision = resolver.classify(&contact("", "+15550102030", ""));
    assert_eq!(
        decision.classification,
        Classification::Known {
            reason: KnownReason::Name
        }
    );
}

#[test]
fn first_and_last_words_match_names_with_middle_parts() {
    let people = people(&[("robert-smith.md", "# Robert Smith\n")]);
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    assert_eq!(
        resolver
            .classify(&contact("Robert J. Smith", "+15550000001", ""))
            .classification,
        Classification::Known {
            reason: KnownReason::FirstLastName
        }
    );
    assert_eq!(
        resolver
            .classify(&contact("Robert Smithson", "+15550000001", ""))
            .classification,
        Classification::NamedCandidate
    );
}

#[test]
fn email_identifiers_are_known_or_named() {
    let people = jane_people();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    assert_eq!(
        resolver.classify(&contact("", "JANE@example.com", "")).classification,
        Classification::Known {
            reason: KnownReason::Email
        }
    );
    assert_eq!(
        resolver.classify(&contact("", "sam@startup.io", "")).classification,
        Classification::NamedCandidate
    );
    assert_eq!(
        resolver
            .classify(&contact("jane@example.com", "chat123", ""))
            .classification,
        Classification::Known {
            reason: KnownReason::EmailName
        }
    );
}

#[test]
fn handles_without_name_phone_or_email_are_unreachable() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    assert_eq!(
        resolver.classify(&contact("", "chat8812", "")).classification,
        Classification::Excluded {
            reason: ExclusionReason::Unreachable
        }
    );
}

#[test]
fn candidates_sort_newest_first_with_unparsable_last() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let set = resolver.resolve(&[
        contact("Old Friend", "+15550000001", "2024-12-31 23:59:59"),
        contact("No Date", "+15550000002", "garbage"),
        contact("New Friend", "+15550000003", "2025-01-02 08:00"),
    ]);
    let order: Vec<&str> = set.named.iter().map(|c| c.display_name()).collect();
    assert_eq!(order, vec!["New Friend", "Old Friend", "No Date"]);
}

#[test]
fn resolving_twice_gives_identical_results() {
    let people = jane_people();
    let directory = directory(&[("+15550102030", "Ana Lima")]);
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);
    let contacts = vec![
        contact("", "+15550102030", "2025-01-02"),
        contact("", "+19998887777", "2025-01-01"),
        contact("Sam Park", "sam@startup.io", "2025-01-03"),
    ];
    assert_eq!(resolver.resolve(&contacts), resolver.resolve(&contacts));
}

#[test]
fn outreach_needs_a_direct_handle_and_a_real_name() {
    let people = PeopleIndex::default();
    let directory = ContactDirectory::default();
    let rules = FilterRules::default();
    let resolver = Resolver::new(&people, &directory, &rules);

    let set = resolver.resolve(&[
        contact("Ana Lima", "+15550102030", "2025-01-03"),
        contact("", "sam@startup.io", "2025-01-02"),
        contact("Group Chat", "chat99", "2025-01-01"),
    ]);
    assert_eq!(set.named.len(), 3);
    let targets: Vec<&str> = outreach_targets(&set, 25)
        .into_iter()
        .map(|c| c.display_name())
        .collect();
    assert_eq!(targets, vec!["Ana Lima"]);
    assert!(outreach_targets(&set, 0).is_empty());
}

#[test]
fn phone_shape_accepts_plus_numbers_and_long_digit_runs() {
    assert!(is_phone_shaped("+1 555"));
    assert!(is_phone_shaped("4155551234"));
    assert!(!is_phone_shaped("12345"));
    assert!(!is_phone_shaped("Jane"));
}

#[test]
fn platform_candidates_come_from_linkedin_invites() {
    let people = people(&[("known-person.md", "# Known Person\n")]);
    let rows = parse_rows(
        "Date  From  Subject  Body\n----  ----  ----  ----\n\
         2025-01-02 09:00  Ana Lima <invitations@linkedin.com>  Ana Lima requested to connect  Founder at Cafe Uno\n\
         2025-01-03 10:00  Bo Chen <messages-noreply@linkedin.com>  New message  Bo just messaged you\n\
         2025-01-04 11:00  Known Person <invitations@linkedin.com>  Known Person requested to connect  Hi\n\
         2025-01-05 12:00  Dee <dee@example.com>  requested to connect  not a platform\n\
         2025-01-06 12:00  invitations@linkedin.com  requested to connect  bare sender\n",
    );
    let candidates = platform_candidates(&rows, &people);
    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bo Chen", "Ana Lima"]);
    assert_eq!(candidates[1].snippet, "Founder at Cafe Uno");
    assert_eq!(candidates[1].email, "invitations@linkedin.com");
}
