use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::imessage::truncate_chars;
use crate::config::FilterRules;

const PREVIEW_CHARS: usize = 100;

fn re_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-+\s*-+").expect("separator regex"))
}

fn re_columns() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("column regex"))
}

fn re_sender() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.*?)\s*<(.+?)>").expect("sender regex"))
}

/// One data row of an email table export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRow {
    pub date: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSender {
    pub name: String,
    pub email: String,
    /// True when the From column carried `Name <address>`.
    pub bracketed: bool,
}

impl EmailRow {
    pub fn sender(&self) -> EmailSender {
        match re_sender().captures(&self.from) {
            Some(caps) => EmailSender {
                name: caps[1].trim().to_string(),
                email: caps[2].trim().to_string(),
                bracketed: true,
            },
            None => EmailSender {
                name: self.from.clone(),
                email: self.from.clone(),
                bracketed: false,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailSummary {
    pub date: String,
    pub subject: String,
    pub preview: String,
}

/// Everything one correspondent sent (or was sent) in the export window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailContact {
    pub name: String,
    pub email: String,
    pub count: usize,
    pub last_date: String,
    pub emails: Vec<EmailSummary>,
}

/// Rows after the dashed separator, split on runs of two or more spaces.
/// Title, `Timeframe:` and column-header lines are skipped, as are rows with
/// fewer than three columns.
pub fn parse_rows(text: &str) -> Vec<EmailRow> {
    let mut rows = Vec::new();
    let mut in_data = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if re_separator().is_match(line) {
            in_data = true;
            continue;
        }
        if line.starts_with('#') || line.starts_with("Timeframe:") {
            continue;
        }
        if line.contains("Date") && line.contains("From") && line.contains("Subject") {
            continue;
        }
        if !in_data {
            continue;
        }
        let parts: Vec<&str> = re_columns().split(line.trim()).collect();
        if parts.len() < 3 {
            continue;
        }
        rows.push(EmailRow {
            date: parts[0].trim().to_string(),
            from: parts[1].trim().to_string(),
            subject: parts[2].trim().to_string(),
            body: parts.get(3).map(|body| body.trim()).unwrap_or_default().to_string(),
        });
    }
    rows
}

/// Groups rows by lowercased sender address in first-seen order, dropping
/// newsletters and transactional senders.
pub fn summarize(rows: &[EmailRow], rules: &FilterRules) -> Vec<EmailContact> {
    let mut contacts: Vec<EmailContact> = Vec::new();
    let mut by_email: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if !row.from.contains('@') {
            continue;
        }
        let sender = row.sender();
        if rules.should_exclude_email(&sender.email, &row.subject) {
            log::debug!("skipping email from {} ({})", sender.email, row.subject);
            continue;
        }

        let key = sender.email.to_lowercase();
        let slot = *by_email.entry(key).or_insert_with(|| {
            contacts.push(EmailContact {
                name: String::new(),
                email: String::new(),
                count: 0,
                last_date: String::new(),
                emails: Vec::new(),
            });
            contacts.len() - 1
        });
        let contact = &mut contacts[slot];
        contact.count += 1;
        contact.name = sender.name;
        contact.email = sender.email;
        if contact.last_date.is_empty() || row.date > contact.last_date {
            contact.last_date = row.date.clone();
        }
        contact.emails.push(EmailSummary {
            date: row.date.clone(),
            subject: row.subject.clone(),
            preview: truncate_chars(&row.body, PREVIEW_CHARS),
        });
    }
    contacts
}

#[cfg(test)]
mod tests {
    use super::{parse_rows, summarize};
    use crate::config::FilterRules;

    const EXPORT: &str = "# Emails Received\nTimeframe: last 7 days\n\nDate              From                              Subject             Body\n----------------  --------------------------------  ------------------  ----\n2025-01-03 10:00  Jane Doe <Jane@Example.com>       Lunch?              Are you free Thursday\n2025-01-01 09:00  noreply@shop.com                  Your order          Shipped\n2025-01-04 08:30  Jane Doe <jane@example.com>       Re: Lunch?          Great, see you\n2025-01-02 12:00  Sam <sam@startup.io>              Intro\nbroken line\n";

    #[test]
    fn parse_rows_skips_headers_and_short_rows() {
        let rows = parse_rows(EXPORT);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].date, "2025-01-03 10:00");
        assert_eq!(rows[0].from, "Jane Doe <Jane@Example.com>");
        assert_eq!(rows[0].subject, "Lunch?");
        assert_eq!(rows[0].body, "Are you free Thursday");
        assert_eq!(rows[3].body, "");

        let sender = rows[0].sender();
        assert_eq!(sender.name, "Jane Doe");
        assert_eq!(sender.email, "Jane@Example.com");
        assert!(sender.bracketed);
        assert!(!rows[1].sender().bracketed);
    }

    #[test]
    fn summarize_groups_case_insensitively_and_filters_noise() {
        let contacts = summarize(&parse_rows(EXPORT), &FilterRules::default());
        assert_eq!(contacts.len(), 2);

        let jane = &contacts[0];
        assert_eq!(jane.count, 2);
        assert_eq!(jane.email, "jane@example.com");
        assert_eq!(jane.last_date, "2025-01-04 08:30");
        assert_eq!(jane.emails.len(), 2);

        assert_eq!(contacts[1].name, "Sam");
    }

    #[test]
    fn rows_before_the_separator_are_ignored() {
        assert!(parse_rows("2025-01-03 10:00  a@b.co  Subject  Body\n").is_empty());
    }
}
