use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{extract_phones, parse_last_updated, PeopleIndex, PersonRecord};
use crate::domain::timestamp::parse_timestamp;

fn unique_people_dir() -> PathBuf {
    let root = std::env::temp_dir().join(format!("rolodex-people-ext-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&root).expect("people dir should be creatable");
    root
}

fn write_person(dir: &Path, file: &str, contents: &str) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, contents).expect("person file should be writable");
    path
}

const JANE: &str = r#"# Jane Doe

- **Name:** Janet Doe aka "JD"
- **Email:** Jane.Doe@Example.com
- **Company:** Acme

Met at the conference, texted from +1 (415) 555-1234 afterwards.
Her assistant is reachable at assistant@acme.io.

## Last Updated
Edited by hand.

2025-12-10
"#;

#[test]
fn parse_collects_names_aliases_emails_phones_and_date() {
    let record = PersonRecord::parse(Path::new("/tmp/people/Jane-Doe.md"), JANE);

    assert_eq!(record.slug, "jane-doe");
    assert_eq!(record.title.as_deref(), Some("Jane Doe"));
    assert!(record.names.contains("Jane Doe"));
    assert!(record.names.contains("Janet Doe aka \"JD\""));
    assert!(record.names.contains("JD"));
    assert!(record.emails.contains("jane.doe@example.com"));
    assert!(record.emails.contains("assistant@acme.io"));
    assert!(record.phones.contains("+14155551234"));
    assert_eq!(record.last_updated, parse_timestamp("2025-12-10"));
}

#[test]
fn last_updated_field_wins_over_section() {
    let text = "# X\n- **Last Updated:** 2025-03-04\n\n## Last Updated\n2020-01-01\n";
    assert_eq!(parse_last_updated(text), parse_timestamp("2025-03-04"));
}

#[test]
fn crlf_files_keep_their_last_updated_date() {
    let record = PersonRecord::parse(
        Path::new("people/jane-doe.md"),
        "# Jane Doe\r\n- **Name:** JD\r\n- **Last Updated:** 2025-01-05\r\n",
    );
    assert_eq!(record.title.as_deref(), Some("Jane Doe"));
    assert!(record.names.contains("JD"));
    assert_eq!(record.last_updated, parse_timestamp("2025-01-05"));

    let text = "# X\r\n\r\n## Last Updated\r\n2025-01-05\r\n";
    assert_eq!(parse_last_updated(text), parse_timestamp("2025-01-05"));
}

#[test]
fn last_updated_section_only_searches_nearby_lines() {
    let mut text = String::from("# X\n\n## Last Updated\n");
    for _ in 0..12 {
        text.push_str("filler\n");
    }
    text.push_str("2025-01-01\n");
    assert_eq!(parse_last_updated(&text), None);
}

#[test]
fn second_level_heading_is_not_a_title() {
    let record = PersonRecord::parse(Path::new("a.md"), "## Notes\nnothing here\n");
    assert!(record.title.is_none());
    assert!(record.names.is_empty());
}

#[test]
fn phone_scan_requires_leading_plus_and_enough_digits() {
    let phones = extract_phones("call 415-555-1234 or +44 20 7946 0958 or +1 234");
    assert_eq!(phones.len(), 1);
    assert!(phones.contains("+442079460958"));
}

#[test]
fn index_aggregates_slugified_names_and_matches_phone_variants() {
    let dir = unique_people_dir();
    write_person(&dir, "jane-doe.md", JANE);
    write_person(&dir, "bob.md", "# Robert \"Bob\" Smith\n- **Name:** Bobby\n");
    write_person(&dir, "notes.txt", "# Not A Person\n");

    let index = PeopleIndex::load(&dir);
    assert_eq!(index.records.len(), 2);
    assert!(index.slugs.contains("jane-doe"));
    assert!(index.slugs.contains("bob"));
    assert!(index.knows_slug("jd"));
    assert!(index.knows_slug("robert-bob-smith"));
    assert!(index.knows_slug("bobby"));
    assert!(!index.knows_slug("not-a-person"));
    assert!(!index.knows_slug(""));

    assert!(index.knows_phone("+14155551234"));
    assert!(index.knows_phone("14155551234"));
    assert!(index.knows_phone("4155551234"));
    assert!(index.knows_phone("+1 (415) 555-1234"));
    assert!(!index.knows_phone("+14155559999"));
    assert!(!index.knows_phone(""));

    assert!(index.knows_email(" JANE.DOE@example.com"));
    assert!(!index.knows_email("stranger@example.com"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_directory_yields_empty_index() {
    let dir = unique_people_dir().join("absent");
    let index = PeopleIndex::load(&dir);
    assert!(index.records.is_empty());
    assert!(index.slugs.is_empty());
}

#[test]
fn unreadable_file_contributes_only_its_slug() {
    let dir = unique_people_dir();
    let path = write_person(&dir, "Broken.md", "placeholder");
    std::fs::remove_file(&path).expect("file should be removable");

    let record = PersonRecord::load(&path);
    assert_eq!(record, PersonRecord::empty(&path));
    assert_eq!(record.slug, "broken");
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn updated_since_returns_newest_first() {
    let old = PersonRecord::parse(Path::new("old.md"), "# Old\n- **Last Updated:** 2025-01-01\n");
    let mid = PersonRecord::parse(Path::new("mid.md"), "# Mid\n- **Last Updated:** 2025-06-01\n");
    let new = PersonRecord::parse(Path::new("new.md"), "# New\n- **Last Updated:** 2025-06-10\n");
    let undated = PersonRecord::parse(Path::new("undated.md"), "# Undated\n");
    let index = PeopleIndex::from_records([old, mid, new, undated]);

    let cutoff = parse_timestamp("2025-05-01").expect("cutoff should parse");
    let recent: Vec<String> = index
        .updated_since(cutoff)
        .into_iter()
        .map(|record| record.display_name())
        .collect();
    assert_eq!(recent, vec!["New".to_string(), "Mid".to_string()]);
}
