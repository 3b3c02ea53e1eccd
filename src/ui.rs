use std::io::{self, IsTerminal};

use crate::app::{CandidateRun, HandleView, SyncSummary};
use crate::directory::RecentContact;
use crate::domain::timestamp;
use crate::people::PersonRecord;
use crate::resolver::{Candidate, Classification};

pub fn print_sync_summary(summary: &SyncSummary) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("Synced {}", summary.sync_dir.display()))
    );
    for line in summary_counts(summary) {
        println!("  {line}");
    }
    for path in &summary.written {
        println!("{} {}", palette.ok("wrote"), path.display());
    }
    for file in &summary.skipped {
        println!("{} {file} (not found)", palette.dim("skipped"));
    }
}

fn summary_counts(summary: &SyncSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.imessage_contacts > 0 {
        lines.push(format!(
            "imessage: {} threads, {} named, {} unknown",
            summary.imessage_contacts, summary.named_candidates, summary.unknown_candidates
        ));
    }
    if summary.slack_channels > 0 {
        lines.push(format!("slack: {} channels", summary.slack_channels));
    }
    if summary.received_contacts > 0 || summary.sent_contacts > 0 {
        lines.push(format!(
            "email: {} received, {} sent",
            summary.received_contacts, summary.sent_contacts
        ));
    }
    if summary.platform_candidates > 0 {
        lines.push(format!(
            "platform candidates: {}",
            summary.platform_candidates
        ));
    }
    lines
}

pub fn print_candidate_run(run: &CandidateRun) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("Candidates in {}", run.export.display()))
    );
    for candidate in &run.candidates.named {
        println!("{}", format_candidate(candidate, &palette));
    }
    for candidate in &run.candidates.unknown {
        println!("{}", format_candidate(candidate, &palette));
    }
    println!(
        "{}",
        palette.dim(&format!(
            "{} observed: {} named, {} unknown, {} known, {} excluded",
            run.observed,
            run.candidates.named.len(),
            run.candidates.unknown.len(),
            run.candidates.known,
            run.candidates.excluded
        ))
    );
}

fn format_candidate(candidate: &Candidate, palette: &Palette) -> String {
    let last = if candidate.contact.last_message.is_empty() {
        "unknown"
    } else {
        candidate.contact.last_message.as_str()
    };
    format!(
        "{} {} {}",
        palette.name(candidate.display_name()),
        candidate.contact.identifier,
        palette.dim(&format!("(last {last})"))
    )
}

pub fn print_handle(view: &HandleView) {
    let palette = Palette::auto();
    let label = match &view.classification {
        Classification::Known { .. } => palette.ok(&view.summary),
        Classification::Excluded { .. } => palette.dim(&view.summary),
        _ => palette.warn(&view.summary),
    };
    println!("{} {}", palette.name(&view.handle), label);
    if let Some(name) = view.resolved_name.as_deref() {
        println!("  {}", palette.dim(&format!("contacts name: {name}")));
    }
}

pub fn print_people(people: &[PersonRecord]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("People"));
    if people.is_empty() {
        println!("{}", palette.dim("no person files found"));
        return;
    }
    for person in people {
        let updated = person
            .last_updated
            .map(timestamp::format_date)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {} {}",
            palette.name(&person.display_name()),
            palette.dim(&person.file_name()),
            palette.dim(&format!("updated {updated}"))
        );
    }
    println!("{}", palette.dim(&format!("{} person file(s)", people.len())));
}

pub fn print_new_contacts(contacts: &[RecentContact], days: u32) {
    let palette = Palette::auto();
    println!(
        "{}",
        palette.heading(&format!("New contacts (last {days} day(s))"))
    );
    if contacts.is_empty() {
        println!("{}", palette.dim("no new contacts found"));
        return;
    }
    for contact in contacts {
        println!(
            "{} {} {}",
            palette.name(&contact.name),
            contact.phone,
            palette.dim(&timestamp::format_minutes(contact.added))
        );
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn name(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn ok(&self, text: &str) -> String {
        self.paint("32", text)
    }

    fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }
}

#[cfg(test)]
#[path = "ui_tests_ext.rs"]
mod tests_ext;
