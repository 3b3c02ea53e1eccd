//! Index of the hand-maintained person files under `people/`.
//!
//! Parsing is best-effort pattern matching: a malformed file yields a partial
//! record and an unreadable one an empty record, never an error.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::identity::{normalize_email, normalize_phone, phone_key, slugify};
use crate::domain::timestamp::{self, Timestamp};

/// Lines after a `## Last Updated` heading searched for a date.
const LAST_UPDATED_WINDOW: usize = 10;

fn re_title() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*#[ \t]+(.+?)[ \t\r]*$").expect("title regex"))
}

fn re_name_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*-[ \t]*\*\*Name:\*\*[ \t]*(.+?)[ \t\r]*$").expect("name regex")
    })
}

fn re_alias() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)aka\s+["'“‘](.+?)["'”’]"#).expect("alias regex"))
}

fn re_email() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex")
    })
}

fn re_phone() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+\d[\d()\s.\-]{7,}\d").expect("phone regex"))
}

fn re_last_updated_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*-[ \t]*\*\*Last Updated:\*\*[ \t]*(\d{4}-\d{2}-\d{2})[ \t\r]*$")
            .expect("last updated field regex")
    })
}

fn re_last_updated_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*##[ \t]+Last Updated[ \t\r]*$").expect("last updated heading regex")
    })
}

fn re_date() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("date regex"))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PersonRecord {
    pub path: PathBuf,
    pub slug: String,
    pub title: Option<String>,
    pub names: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    #[serde(serialize_with = "serialize_date")]
    pub last_updated: Option<Timestamp>,
}

impl PersonRecord {
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            slug: slug_for_path(path),
            title: None,
            names: BTreeSet::new(),
            emails: BTreeSet::new(),
            phones: BTreeSet::new(),
            last_updated: None,
        }
    }

    pub fn parse(path: &Path, text: &str) -> Self {
        let mut record = Self::empty(path);

        record.title = re_title()
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|title| !title.is_empty());
        if let Some(title) = record.title.clone() {
            record.names.insert(title);
        }
        for caps in re_name_field().captures_iter(text) {
            let value = caps[1].trim();
            if !value.is_empty() {
                record.names.insert(value.to_string());
            }
        }
        let aliases: Vec<String> = record
            .names
            .iter()
            .flat_map(|name| re_alias().captures_iter(name))
            .map(|caps| caps[1].trim().to_string())
            .filter(|alias| !alias.is_empty())
            .collect();
        record.names.extend(aliases);

        record.emails = extract_emails(text);
        record.phones = extract_phones(text);
        record.last_updated = parse_last_updated(text);
        record
    }

    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(err) => {
                log::warn!("could not read person file {}: {}", path.display(), err);
                Self::empty(path)
            }
        }
    }

    /// Title if present, else the filename stem.
    pub fn display_name(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.slug.clone())
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Aggregate lookup sets across every person file; the only interface the
/// resolver uses to decide whether someone is already known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleIndex {
    pub records: Vec<PersonRecord>,
    pub slugs: BTreeSet<String>,
    pub names: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    phone_keys: BTreeSet<String>,
}

impl PeopleIndex {
    /// Scans `dir` for `*.md` files. A missing directory gives an empty index.
    pub fn load(dir: &Path) -> Self {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("people directory {} unavailable: {}", dir.display(), err);
                return Self::default();
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let index = Self::from_records(paths.iter().map(|path| PersonRecord::load(path)));
        log::info!(
            "indexed {} people ({} names, {} emails, {} phones)",
            index.records.len(),
            index.names.len(),
            index.emails.len(),
            index.phones.len()
        );
        index
    }

    pub fn from_records(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            index.slugs.insert(record.slug.clone());
            index
                .names
                .extend(record.names.iter().map(|name| slugify(name)));
            index.emails.extend(record.emails.iter().cloned());
            for phone in &record.phones {
                index.phones.insert(phone.clone());
                if let Some(key) = phone_key(phone) {
                    index.phone_keys.insert(key);
                }
            }
            index.records.push(record);
        }
        index
    }

    pub fn knows_email(&self, raw: &str) -> bool {
        let email = normalize_email(raw);
        !email.is_empty() && self.emails.contains(&email)
    }

    /// Matches on the normalized token or the canonical phone key, so
    /// `4155551234` finds a person filed under `+1 415 555 1234`.
    pub fn knows_phone(&self, raw: &str) -> bool {
        let token = normalize_phone(raw);
        if token.is_empty() {
            return false;
        }
        self.phones.contains(&token)
            || phone_key(&token).is_some_and(|key| self.phone_keys.contains(&key))
    }

    pub fn knows_slug(&self, slug: &str) -> bool {
        !slug.is_empty() && (self.slugs.contains(slug) || self.names.contains(slug))
    }

    /// Records updated on or after `cutoff`, newest first.
    pub fn updated_since(&self, cutoff: Timestamp) -> Vec<&PersonRecord> {
        let mut recent: Vec<&PersonRecord> = self
            .records
            .iter()
            .filter(|record| record.last_updated.is_some_and(|updated| updated >= cutoff))
            .collect();
        recent.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        recent
    }
}

pub fn extract_emails(text: &str) -> BTreeSet<String> {
    re_email()
        .find_iter(text)
        .map(|m| normalize_email(m.as_str()))
        .collect()
}

pub fn extract_phones(text: &str) -> BTreeSet<String> {
    re_phone()
        .find_iter(text)
        .map(|m| normalize_phone(m.as_str()))
        .filter(|phone| !phone.is_empty())
        .collect()
}

/// `- **Last Updated:** YYYY-MM-DD`, or a `## Last Updated` heading followed
/// within a few lines by a date.
pub fn parse_last_updated(text: &str) -> Option<Timestamp> {
    if let Some(caps) = re_last_updated_field().captures(text) {
        return timestamp::parse_timestamp(&caps[1]);
    }
    let heading = re_last_updated_heading().find(text)?;
    text[heading.end()..]
        .lines()
        .skip(1)
        .take(LAST_UPDATED_WINDOW)
        .find_map(|line| re_date().find(line))
        .and_then(|m| timestamp::parse_timestamp(m.as_str()))
}

fn slug_for_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn serialize_date<S>(value: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(ts) => serializer.serialize_some(&timestamp::format_date(*ts)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[path = "people_tests_ext.rs"]
mod tests_ext;
