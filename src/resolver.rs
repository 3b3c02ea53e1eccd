//! Classifies observed contacts against the people index and the contact
//! directory.
//!
//! Each contact runs through a fixed decision order: directory resolution of
//! raw handles, relationship labels, system-sender heuristics, the
//! already-known checks (email, phone, name slug, first+last slug), and
//! finally candidate filing. Name matching is a heuristic; two different
//! people whose first and last words coincide are treated as one.

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::config::FilterRules;
use crate::directory::ContactDirectory;
use crate::domain::contact::ObservedContact;
use crate::domain::identity::{
    first_last_slug, is_email_shaped, is_phone_number, normalize_email, phone_key, slugify,
};
use crate::domain::timestamp;
use crate::export::email::EmailRow;
use crate::people::PeopleIndex;

const PLACEHOLDER_NAMES: [&str; 2] = ["unknown", "identifier"];
const PLATFORM_DOMAIN: &str = "linkedin.com";
const PLATFORM_PHRASES: [&str; 2] = ["requested to connect", "just messaged you"];
const PLATFORM_SNIPPET_CHARS: usize = 200;

fn re_short_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4,6}$").expect("short code regex"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownReason {
    Email,
    Phone,
    Name,
    FirstLastName,
    EmailName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum ExclusionReason {
    Relationship,
    ShortCode,
    Placeholder,
    SystemMarker(String),
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Classification {
    Known { reason: KnownReason },
    NamedCandidate,
    /// Carries the canonical phone key used to fold repeated numbers.
    UnknownCandidate { phone: String },
    Excluded { reason: ExclusionReason },
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Known { reason } => write!(f, "known ({})", known_label(*reason)),
            Classification::NamedCandidate => write!(f, "named candidate"),
            Classification::UnknownCandidate { phone } => {
                write!(f, "unknown-number candidate ({phone})")
            }
            Classification::Excluded { reason } => match reason {
                ExclusionReason::Relationship => write!(f, "excluded (relationship label)"),
                ExclusionReason::ShortCode => write!(f, "excluded (short-code sender)"),
                ExclusionReason::Placeholder => write!(f, "excluded (placeholder name)"),
                ExclusionReason::SystemMarker(marker) => {
                    write!(f, "excluded (system message: \"{marker}\")")
                }
                ExclusionReason::Unreachable => write!(f, "excluded (no name, phone or email)"),
            },
        }
    }
}

fn known_label(reason: KnownReason) -> &'static str {
    match reason {
        KnownReason::Email => "email on file",
        KnownReason::Phone => "phone on file",
        KnownReason::Name => "name on file",
        KnownReason::FirstLastName => "first and last name on file",
        KnownReason::EmailName => "name is an email on file",
    }
}

/// Outcome for one contact: the classification plus any name the directory
/// supplied along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub classification: Classification,
    pub resolved_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub contact: ObservedContact,
    pub resolved_name: Option<String>,
}

impl Candidate {
    pub fn display_name(&self) -> &str {
        match self.resolved_name.as_deref() {
            Some(name) => name,
            None => self.contact.display(),
        }
    }
}

/// Disjoint results of one resolver run. Known, excluded and folded
/// duplicate contacts are only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateSet {
    pub named: Vec<Candidate>,
    pub unknown: Vec<Candidate>,
    pub known: usize,
    pub excluded: usize,
    pub duplicates: usize,
}

pub struct Resolver<'a> {
    people: &'a PeopleIndex,
    directory: &'a ContactDirectory,
    rules: &'a FilterRules,
}

impl<'a> Resolver<'a> {
    pub fn new(
        people: &'a PeopleIndex,
        directory: &'a ContactDirectory,
        rules: &'a FilterRules,
    ) -> Self {
        Self {
            people,
            directory,
            rules,
        }
    }

    pub fn classify(&self, contact: &ObservedContact) -> Decision {
        let identifier = contact.identifier.trim();
        let mut name = contact.name.trim().to_string();
        let mut resolved_name = None;

        if name.is_empty() || is_phone_number(&name) {
            if let Some(found) = self.lookup(identifier, &name) {
                name = found.to_string();
                resolved_name = Some(name.clone());
            }
        }
        let decide = |classification| Decision {
            classification,
            resolved_name: resolved_name.clone(),
        };

        if self.rules.is_excluded_name(&name) {
            return decide(Classification::Excluded {
                reason: ExclusionReason::Relationship,
            });
        }
        if let Some(reason) = self.system_reason(contact) {
            return decide(Classification::Excluded { reason });
        }
        if let Some(reason) = self.known_reason(identifier, &name) {
            return decide(Classification::Known { reason });
        }

        let name_is_real = !name.is_empty() && !is_phone_number(&name) && !is_email_shaped(&name);
        if name_is_real || is_email_shaped(identifier) {
            return decide(Classification::NamedCandidate);
        }

        let number = if is_phone_shaped(identifier) {
            identifier
        } else if is_phone_shaped(&name) {
            name.as_str()
        } else {
            return decide(Classification::Excluded {
                reason: ExclusionReason::Unreachable,
            });
        };
        if let Some(found) = self.lookup(identifier, &name) {
            // A late directory name faces the same name checks as an early one.
            let classification = if self.rules.is_excluded_name(found) {
                Classification::Excluded {
                    reason: ExclusionReason::Relationship,
                }
            } else if let Some(reason) = self.known_reason(identifier, found) {
                Classification::Known { reason }
            } else {
                Classification::NamedCandidate
            };
            return Decision {
                classification,
                resolved_name: Some(found.to_string()),
            };
        }
        match phone_key(number) {
            Some(phone) => decide(Classification::UnknownCandidate { phone }),
            None => decide(Classification::Excluded {
                reason: ExclusionReason::Unreachable,
            }),
        }
    }

    /// Classifies every contact, folds repeated unknown numbers and orders
    /// both candidate lists by last message, newest first.
    pub fn resolve(&self, contacts: &[ObservedContact]) -> CandidateSet {
        let mut set = CandidateSet::default();
        let mut seen_unknown = HashSet::new();

        for contact in contacts {
            let decision = self.classify(contact);
            log::debug!(
                "{} ({}): {}",
                contact.display(),
                contact.identifier,
                decision.classification
            );
            let candidate = Candidate {
                contact: contact.clone(),
                resolved_name: decision.resolved_name,
            };
            match decision.classification {
                Classification::Known { .. } => set.known += 1,
                Classification::Excluded { .. } => set.excluded += 1,
                Classification::NamedCandidate => set.named.push(candidate),
                Classification::UnknownCandidate { phone } => {
                    if seen_unknown.insert(phone) {
                        set.unknown.push(candidate);
                    } else {
                        set.duplicates += 1;
                    }
                }
            }
        }

        sort_by_last_message(&mut set.named);
        sort_by_last_message(&mut set.unknown);
        log::info!(
            "resolved {} contacts: {} named, {} unknown, {} known, {} excluded",
            contacts.len(),
            set.named.len(),
            set.unknown.len(),
            set.known,
            set.excluded
        );
        set
    }

    fn lookup(&self, identifier: &str, name: &str) -> Option<&'a str> {
        let handle = if identifier.is_empty() { name } else { identifier };
        self.directory.resolve(handle)
    }

    fn system_reason(&self, contact: &ObservedContact) -> Option<ExclusionReason> {
        let name = contact.name.trim();
        let identifier = contact.identifier.trim();
        if re_short_code().is_match(name) || re_short_code().is_match(identifier) {
            return Some(ExclusionReason::ShortCode);
        }
        if PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str())
            || PLACEHOLDER_NAMES.contains(&identifier.to_lowercase().as_str())
        {
            return Some(ExclusionReason::Placeholder);
        }
        self.rules
            .system_marker_in(&contact.preview_text())
            .map(|marker| ExclusionReason::SystemMarker(marker.to_string()))
    }

    fn known_reason(&self, identifier: &str, name: &str) -> Option<KnownReason> {
        if is_email_shaped(identifier) && self.people.knows_email(identifier) {
            return Some(KnownReason::Email);
        }
        let phone_known = [identifier, name]
            .iter()
            .any(|value| is_phone_shaped(value) && self.people.knows_phone(value));
        if phone_known {
            return Some(KnownReason::Phone);
        }
        if !name.is_empty() && !is_phone_number(name) && !is_email_shaped(name) {
            if self.people.knows_slug(&slugify(name)) {
                return Some(KnownReason::Name);
            }
            if first_last_slug(name).is_some_and(|slug| self.people.knows_slug(&slug)) {
                return Some(KnownReason::FirstLastName);
            }
        }
        if is_email_shaped(name) && self.people.knows_email(name) {
            return Some(KnownReason::EmailName);
        }
        None
    }
}

/// `+` followed by digits, or a bare run of seven or more digits.
pub fn is_phone_shaped(value: &str) -> bool {
    let value = value.trim();
    (value.starts_with('+') && value.chars().any(|c| c.is_ascii_digit())) || is_phone_number(value)
}

fn sort_by_last_message(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        timestamp::sort_key(&b.contact.last_message)
            .cmp(&timestamp::sort_key(&a.contact.last_message))
    });
}

/// Named candidates reachable directly by phone or email, newest first.
pub fn outreach_targets(set: &CandidateSet, limit: usize) -> Vec<&Candidate> {
    set.named
        .iter()
        .filter(|candidate| {
            let identifier = candidate.contact.identifier.trim();
            let name = candidate.display_name();
            (is_phone_shaped(identifier) || is_email_shaped(identifier))
                && !name.is_empty()
                && !is_phone_number(name)
                && !is_email_shaped(name)
        })
        .take(limit)
        .collect()
}

/// A person surfaced through a platform notification email (a LinkedIn
/// connection request or message) rather than a direct thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformCandidate {
    pub name: String,
    pub email: String,
    pub date: String,
    pub subject: String,
    pub snippet: String,
}

pub fn platform_candidates(rows: &[EmailRow], people: &PeopleIndex) -> Vec<PlatformCandidate> {
    let mut candidates: Vec<PlatformCandidate> = rows
        .iter()
        .filter_map(|row| {
            let sender = row.sender();
            if !sender.bracketed {
                return None;
            }
            let email = normalize_email(&sender.email);
            let subject = row.subject.to_lowercase();
            let body = row.body.to_lowercase();
            let invited = PLATFORM_PHRASES
                .iter()
                .any(|phrase| subject.contains(phrase) || body.contains(phrase));
            if !email.contains(PLATFORM_DOMAIN) || !invited {
                return None;
            }
            if !sender.name.is_empty() && people.knows_slug(&slugify(&sender.name)) {
                return None;
            }
            Some(PlatformCandidate {
                name: sender.name,
                email,
                date: row.date.clone(),
                subject: row.subject.clone(),
                snippet: row.body.chars().take(PLATFORM_SNIPPET_CHARS).collect(),
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.date.cmp(&a.date));
    candidates
}

#[cfg(test)]
#[path = "resolver_tests_ext.rs"]
mod tests_ext;
