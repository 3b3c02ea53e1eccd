//! Markdown report writers. Every function is pure: the generation time is
//! passed in, so identical inputs render identical bytes.

use std::collections::HashMap;


use crate::config::ReportLimits;
use crate::directory::RecentContact;
use crate::domain::contact::{MessagePreview, ObservedContact};
use crate::domain::identity::{first_name, is_email_shaped, normalize_email, phone_key, slugify};
use crate::domain::timestamp::{self, Timestamp};
use crate::export::email::EmailContact;
use crate::export::slack::SlackChannel;
use crate::people::{PeopleIndex, PersonRecord};
use crate::resolver::{Candidate, CandidateSet, PlatformCandidate};

pub const IMESSAGE_CONTACTS: &str = "IMESSAGE_CONTACTS.md";
pub const NEW_PEOPLE_CANDIDATES: &str = "NEW_PEOPLE_CANDIDATES.md";
pub const SLACK_CONTACTS: &str = "SLACK_CONTACTS.md";
pub const EMAIL_RECEIVED_CONTACTS: &str = "EMAIL_RECEIVED_CONTACTS.md";
pub const EMAIL_SENT_CONTACTS: &str = "EMAIL_SENT_CONTACTS.md";
pub const RECENT_PEOPLE_TOUCHPOINTS: &str = "RECENT_PEOPLE_TOUCHPOINTS.md";
pub const OUTREACH_DRAFTS: &str = "OUTREACH_DRAFTS.md";

pub const NAMED_HEADING: &str = "## ✅ Named candidates (recommended)";
pub const UNKNOWN_HEADING: &str = "## 🤷 Unknown-number candidates (manual triage)";
const SUMMARY_HEADING: &str = "## 📊 Summary";
const INACTIVE_LIMIT: usize = 20;
const CHANNEL_PREVIEWS: usize = 5;
const EMAIL_PREVIEWS: usize = 5;

const IMESSAGE_DRAFT_TEMPLATE: &str =
    "Hey {first}, great meeting you at [event/place] — want to grab a drink/coffee sometime next week?";
const LINKEDIN_DRAFT_TEMPLATE: &str =
    "Great meeting you at [event/place] — just accepted your connection request. Want to grab a drink/coffee sometime next week?";

fn generated_line(generated: Timestamp) -> String {
    format!("*Generated: {}*\n\n", timestamp::format_minutes(generated))
}

fn last<T>(items: &[T], count: usize) -> &[T] {
    &items[items.len().saturating_sub(count)..]
}

fn preview_line(indent: &str, message: &MessagePreview) -> String {
    format!(
        "{indent}- [{}] {}: {}\n",
        message.date, message.sender, message.preview
    )
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Resolver output: named candidates first, then unknown numbers up to the
/// configured limit, then any platform-mediated email candidates.
pub fn candidates_report(
    set: &CandidateSet,
    platform: &[PlatformCandidate],
    limits: &ReportLimits,
    generated: Timestamp,
) -> String {
    let mut out = String::new();
    out.push_str("# New People Candidates (from iMessages)\n");
    out.push_str(&generated_line(generated));
    out.push_str("This report is a best-effort diff of iMessage contacts against `people/*.md`.\n\n");

    out.push_str(&format!("{SUMMARY_HEADING}\n\n"));
    out.push_str(&format!("- **Named candidates:** {}\n", set.named.len()));
    out.push_str(&format!(
        "- **Unknown-number candidates:** {}\n\n",
        set.unknown.len()
    ));

    if !set.named.is_empty() {
        out.push_str(&format!("{NAMED_HEADING}\n\n"));
        for candidate in &set.named {
            out.push_str(&named_entry(candidate, limits.named_previews));
        }
        out.push('\n');
    }

    if !set.unknown.is_empty() {
        out.push_str(&format!("{UNKNOWN_HEADING}\n\n"));
        out.push_str("*These phone numbers could not be resolved to a contact name.*\n\n");
        for candidate in set.unknown.iter().take(limits.unknown_limit) {
            out.push_str(&unknown_entry(candidate, limits.unknown_previews));
        }
        if set.unknown.len() > limits.unknown_limit {
            out.push_str(&format!(
                "\n*...and {} more unknown-number candidates*\n",
                set.unknown.len() - limits.unknown_limit
            ));
        }
        out.push('\n');
    }

    if !platform.is_empty() {
        out.push_str(&platform_section(platform, limits.outreach_limit));
    }
    out
}

fn named_entry(candidate: &Candidate, previews: usize) -> String {
    let contact = &candidate.contact;
    let mut out = format!("- **{}**\n", candidate.display_name());
    if !contact.identifier.is_empty() {
        out.push_str(&format!("  - Phone/ID: {}\n", contact.identifier));
    }
    out.push_str(&format!("  - Last message: {}\n", contact.last_message));
    out.push_str(&recent_previews(&contact.recent, previews));
    out
}

fn unknown_entry(candidate: &Candidate, previews: usize) -> String {
    let contact = &candidate.contact;
    let display = if contact.identifier.is_empty() {
        &contact.name
    } else {
        &contact.identifier
    };
    let mut out = format!("- **{display}**\n");
    out.push_str(&format!("  - Last message: {}\n", contact.last_message));
    out.push_str(&recent_previews(&contact.recent, previews));
    out
}

fn recent_previews(recent: &[MessagePreview], count: usize) -> String {
    if recent.is_empty() || count == 0 {
        return String::new();
    }
    let mut out = String::from("  - Recent previews:\n");
    for message in last(recent, count) {
        out.push_str(&preview_line("    ", message));
    }
    out
}

fn platform_section(platform: &[PlatformCandidate], limit: usize) -> String {
    let mut out = String::from("\n## 📧 Candidates from emails (platform-mediated)\n\n");
    out.push_str("These are extracted from received emails where the sender email is a platform address (e.g. LinkedIn),\n");
    out.push_str("but the sender *name* appears to be a real person.\n\n");
    for candidate in platform.iter().take(limit) {
        out.push_str(&format!(
            "- **{}** (via `{}`)\n",
            candidate.name, candidate.email
        ));
        out.push_str(&format!("  - Date: {}\n", candidate.date));
        out.push_str(&format!("  - Subject: {}\n", candidate.subject));
        if !candidate.snippet.is_empty() {
            out.push_str(&format!("  - Snippet: {}\n", candidate.snippet));
        }
    }
    if platform.len() > limit {
        out.push_str(&format!("\n*...and {} more*\n", platform.len() - limit));
    }
    out.push('\n');
    out
}

fn is_recent(contact: &ObservedContact, cutoff: Timestamp) -> bool {
    timestamp::parse_timestamp(&contact.last_message).is_some_and(|last| last >= cutoff)
}

/// Directory of every iMessage thread, split into recently active and
/// inactive contacts around `as_of - recent_days`.
pub fn imessage_directory(
    contacts: &[ObservedContact],
    limits: &ReportLimits,
    as_of: Timestamp,
) -> String {
    let cutoff = timestamp::days_before(as_of, limits.recent_days).unwrap_or(Timestamp::MIN);
    let mut recent: Vec<&ObservedContact> = contacts
        .iter()
        .filter(|contact| is_recent(contact, cutoff) && !contact.recent.is_empty())
        .collect();
    let inactive: Vec<&ObservedContact> = contacts
        .iter()
        .filter(|contact| !is_recent(contact, cutoff))
        .collect();

    let mut out = String::new();
    out.push_str("# iMessage Contact Directory\n");
    out.push_str(&generated_line(as_of));
    out.push_str("---\n\n");

    out.push_str(&format!("{SUMMARY_HEADING}\n\n"));
    out.push_str(&format!("- **Total Threads:** {}\n", contacts.len()));
    out.push_str(&format!(
        "- **Recently Active (last ~{} days):** {}\n",
        limits.recent_days,
        recent.len()
    ));
    out.push_str(&format!("- **Older / Inactive:** {}\n\n", inactive.len()));
    out.push_str("---\n\n");

    out.push_str("## 🔥 Recently Active Contacts\n\n");
    recent.sort_by(|a, b| {
        timestamp::sort_key(&b.last_message).cmp(&timestamp::sort_key(&a.last_message))
    });
    for contact in recent {
        out.push_str(&format!(
            "### {}. **{}**\n\n",
            contact.thread,
            contact.display()
        ));
        if !contact.name.is_empty() && !contact.identifier.is_empty() {
            out.push_str(&format!("- **Phone/ID:** {}\n", contact.identifier));
        }
        out.push_str(&format!("- **Last Message:** {}\n", contact.last_message));
        out.push_str(&format!("- **Total Messages:** {}\n", contact.message_count));
        out.push_str(&format!(
            "\n**Recent Activity ({} messages):**\n\n",
            contact.recent.len()
        ));
        for message in last(&contact.recent, 3) {
            out.push_str(&format!(
                "- **[{}] {}:** {}\n",
                message.date, message.sender, message.preview
            ));
        }
        out.push_str("\n---\n\n");
    }

    if !inactive.is_empty() {
        out.push_str("## 💤 Inactive Contacts\n\n");
        for contact in inactive.iter().take(INACTIVE_LIMIT) {
            out.push_str(&format!(
                "- **{}** - Last: {}\n",
                contact.display(),
                truncate(&contact.last_message, 10)
            ));
        }
        if inactive.len() > INACTIVE_LIMIT {
            out.push_str(&format!(
                "\n*...and {} more inactive contacts*\n",
                inactive.len() - INACTIVE_LIMIT
            ));
        }
    }
    out
}

pub fn slack_directory(channels: &[SlackChannel], generated: Timestamp) -> String {
    let mut sorted: Vec<&SlackChannel> = channels.iter().collect();
    sorted.sort_by(|a, b| b.message_count.cmp(&a.message_count));

    let mut out = String::new();
    out.push_str("# Slack Conversation Directory\n");
    out.push_str(&generated_line(generated));
    out.push_str("---\n\n");
    out.push_str(&format!("{SUMMARY_HEADING}\n\n"));
    out.push_str(&format!("- **Total Conversations:** {}\n", channels.len()));
    let total: usize = channels.iter().map(|channel| channel.message_count).sum();
    out.push_str(&format!("- **Total Messages:** {total}\n\n"));
    out.push_str("---\n\n");

    for channel in sorted {
        out.push_str(&format!("## {}\n\n", channel.channel));
        out.push_str(&format!("- **Messages:** {}\n", channel.message_count));
        if !channel.recent.is_empty() {
            out.push_str("\n**Recent Messages:**\n\n");
            for message in last(&channel.recent, CHANNEL_PREVIEWS) {
                out.push_str(&format!(
                    "- **[{}] {}:** {}\n",
                    message.date, message.sender, message.preview
                ));
            }
        }
        out.push_str("\n---\n\n");
    }
    out
}

pub fn email_directory(contacts: &[EmailContact], generated: Timestamp) -> String {
    let mut sorted: Vec<&EmailContact> = contacts.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));

    let mut out = String::new();
    out.push_str("# Email Contact Directory\n");
    out.push_str(&generated_line(generated));
    out.push_str("---\n\n");
    out.push_str(&format!("{SUMMARY_HEADING}\n\n"));
    out.push_str(&format!("- **Total Contacts:** {}\n", contacts.len()));
    let total: usize = contacts.iter().map(|contact| contact.count).sum();
    out.push_str(&format!("- **Total Emails:** {total}\n\n"));
    out.push_str("---\n\n");

    for contact in sorted {
        let name = if contact.name.is_empty() {
            &contact.email
        } else {
            &contact.name
        };
        out.push_str(&format!("## {name}\n\n"));
        out.push_str(&format!("- **Email:** {}\n", contact.email));
        out.push_str(&format!("- **Message Count:** {}\n", contact.count));
        out.push_str(&format!("- **Last Contact:** {}\n", contact.last_date));
        if !contact.emails.is_empty() {
            out.push_str("\n**Recent Emails:**\n\n");
            for email in last(&contact.emails, EMAIL_PREVIEWS) {
                out.push_str(&format!("- **[{}]** {}\n", email.date, email.subject));
                if !email.preview.is_empty() {
                    out.push_str(&format!("  *Preview:* {}\n", email.preview));
                }
            }
        }
        out.push_str("\n---\n\n");
    }
    out
}

/// Latest touchpoints for every person file updated within the window.
pub struct TouchpointSources<'a> {
    pub imessage: &'a [ObservedContact],
    pub received: &'a [EmailContact],
    pub sent: &'a [EmailContact],
}

pub fn touchpoints_report(
    people: &PeopleIndex,
    sources: &TouchpointSources<'_>,
    days: i64,
    as_of: Timestamp,
) -> String {
    let mut by_phone: HashMap<String, &ObservedContact> = HashMap::new();
    let mut by_name: HashMap<String, &ObservedContact> = HashMap::new();
    for contact in sources.imessage {
        if contact.identifier.starts_with('+') {
            if let Some(key) = phone_key(&contact.identifier) {
                by_phone.insert(key, contact);
            }
        }
        if let Some(name) = contact.real_name() {
            by_name.insert(slugify(name), contact);
        }
    }
    let received = email_lookup(sources.received);
    let sent = email_lookup(sources.sent);
    let cutoff = timestamp::days_before(as_of, days).unwrap_or(Timestamp::MIN);
    let recent = people.updated_since(cutoff);

    let mut out = String::new();
    out.push_str("# Recent People Touchpoints (for follow-ups)\n");
    out.push_str(&generated_line(as_of));
    out.push_str(&format!(
        "People included: `people/*.md` where Last Updated is within the last ~{days} days.\n\n"
    ));
    out.push_str(&format!("{SUMMARY_HEADING}\n\n"));
    out.push_str(&format!("- **People scanned:** {}\n", people.records.len()));
    out.push_str(&format!("- **Recently updated:** {}\n\n", recent.len()));

    if recent.is_empty() {
        out.push_str("_No recently updated people files found._\n");
        return out;
    }

    out.push_str("## Recently updated people\n\n");
    for record in recent {
        out.push_str(&format!("### {}\n\n", record.display_name()));
        out.push_str(&format!("- **File:** people/{}\n", record.file_name()));
        let updated = record
            .last_updated
            .map(timestamp::format_date)
            .unwrap_or_else(|| "Unknown".to_string());
        out.push_str(&format!("- **Last Updated:** {updated}\n"));

        let thread = record
            .phones
            .iter()
            .filter_map(|phone| phone_key(phone))
            .find_map(|key| by_phone.get(&key).copied())
            .or_else(|| {
                record
                    .names
                    .iter()
                    .find_map(|name| by_name.get(&slugify(name)).copied())
            });
        match thread {
            Some(contact) => {
                out.push_str(&format!("- **Latest iMessage:** {}\n", contact.last_message));
                if let Some(message) = contact.recent.last() {
                    out.push_str(&format!(
                        "  - Preview: [{}] {}: {}\n",
                        message.date, message.sender, message.preview
                    ));
                }
            }
            None => out.push_str("- **Latest iMessage:** (no match in this sync export)\n"),
        }

        out.push_str(&email_touchpoint(record, &received, &sent));
        out.push('\n');
    }
    out
}

fn email_lookup(contacts: &[EmailContact]) -> HashMap<String, &EmailContact> {
    contacts
        .iter()
        .filter(|contact| !contact.email.is_empty())
        .map(|contact| (normalize_email(&contact.email), contact))
        .collect()
}

fn email_touchpoint(
    record: &PersonRecord,
    received: &HashMap<String, &EmailContact>,
    sent: &HashMap<String, &EmailContact>,
) -> String {
    let matched = record
        .emails
        .iter()
        .map(|email| normalize_email(email))
        .find(|email| received.contains_key(email) || sent.contains_key(email));
    let Some(email) = matched else {
        return "- **Latest Email:** (no match in this sync export)\n".to_string();
    };

    let mut out = String::from("- **Latest Email:**\n");
    for (label, lookup) in [("Received", received), ("Sent", sent)] {
        let Some(contact) = lookup.get(&email) else {
            continue;
        };
        if contact.last_date.is_empty() {
            continue;
        }
        out.push_str(&format!("  - {label}: {}\n", contact.last_date));
        if let Some(latest) = contact.emails.last() {
            out.push_str(&format!("    - Subject: {}\n", latest.subject));
        }
    }
    out
}

pub fn imessage_draft(name: &str) -> String {
    let first = first_name(name).unwrap_or(name);
    IMESSAGE_DRAFT_TEMPLATE.replace("{first}", first)
}

/// Review-only follow-up drafts. Nothing here is ever sent.
pub fn outreach_report(
    targets: &[&Candidate],
    platform: &[PlatformCandidate],
    limit: usize,
    generated: Timestamp,
) -> String {
    let mut out = String::new();
    out.push_str("# Outreach Drafts (New Contacts)\n");
    out.push_str(&generated_line(generated));
    out.push_str("**DRAFTS ONLY.** Review/edit before sending. Nothing is sent automatically.\n\n");
    out.push_str("Suggested default (edit the bracketed parts):\n");
    out.push_str(&format!("- iMessage: `{IMESSAGE_DRAFT_TEMPLATE}`\n"));
    out.push_str(&format!("- LinkedIn: `{LINKEDIN_DRAFT_TEMPLATE}`\n\n"));

    if !targets.is_empty() {
        out.push_str("## iMessage drafts\n\n");
        for candidate in targets.iter().take(limit) {
            let name = candidate.display_name();
            out.push_str(&format!("### {name}\n\n"));
            out.push_str(&format!("- **To:** `{}`\n", candidate.contact.identifier));
            out.push_str(&format!(
                "- **Last seen:** {}\n",
                candidate.contact.last_message
            ));
            out.push_str("- **Draft:**\n");
            out.push_str(&format!("  - {}\n\n", imessage_draft(name)));
        }
    }

    if !platform.is_empty() {
        out.push_str("## LinkedIn invite email drafts\n\n");
        for candidate in platform.iter().take(limit) {
            let name = if candidate.name.is_empty() {
                "Unknown"
            } else {
                candidate.name.as_str()
            };
            let first = first_name(name).unwrap_or(name);
            out.push_str(&format!("### {name}\n\n"));
            out.push_str(&format!("- **Source:** `{}`\n", candidate.email));
            out.push_str(&format!("- **Date:** {}\n", candidate.date));
            out.push_str(&format!("- **Subject:** {}\n", candidate.subject));
            if !candidate.snippet.is_empty() {
                out.push_str(&format!("- **Snippet:** {}\n", candidate.snippet));
            }
            out.push_str("- **Draft:**\n");
            out.push_str(&format!(
                "  - Great meeting you at [event/place], {first} — just accepted your connection request. Want to grab a drink/coffee sometime next week?\n\n"
            ));
        }
    }
    out
}

/// Follow-up line for a freshly added contact; `there` stands in for a
/// missing first name.
pub fn new_contact_draft(name: &str, event: Option<&str>) -> String {
    let first = if name == "Unknown" || is_email_shaped(name) {
        "there"
    } else {
        first_name(name).unwrap_or("there")
    };
    match event.map(str::trim).filter(|event| !event.is_empty()) {
        Some(event) => {
            format!("Hey {first}, great meeting you at {event} — want to grab coffee next week?")
        }
        None => format!("Hey {first}, great meeting you — want to grab coffee next week?"),
    }
}

pub fn new_contacts_report(contacts: &[RecentContact], days: u32, event: Option<&str>) -> String {
    let mut lines = Vec::new();
    let label = if days == 1 { "Day" } else { "Days" };
    lines.push(format!("# New Contacts (Last {days} {label})"));
    lines.push(String::new());

    if contacts.is_empty() {
        lines.push("*No new contacts found.*".to_string());
        return lines.join("\n");
    }

    lines.push("## Ready to Message".to_string());
    lines.push(String::new());
    for contact in contacts {
        lines.push(format!("### {}", contact.name));
        lines.push(format!("- **Phone:** {}", contact.phone));
        lines.push(format!(
            "- **Added:** {}",
            timestamp::format_minutes(contact.added)
        ));
        lines.push(format!(
            "- **Draft:** {}",
            new_contact_draft(&contact.name, event)
        ));
        lines.push(String::new());
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "reports_tests_ext.rs"]
mod tests_ext;
