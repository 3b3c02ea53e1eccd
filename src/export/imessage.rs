use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::grammar::{self, Line};
use crate::domain::contact::{MessagePreview, ObservedContact};

pub const MESSAGES_HEADING: &str = "Messages";
pub const SELF_SENDER: &str = "Me";

const PREVIEW_SOURCE_MESSAGES: usize = 8;
const PREVIEW_SCAN_CHARS: usize = 200;
const PREVIEW_CHARS: usize = 150;

const ARTIFACT_PREVIEWS: [&str; 3] = [
    "nsattributedstring",
    "streamtyped@nsattributedstring",
    "nsmutableattributedstring",
];
const ARTIFACT_PREFIXES: [&str; 2] = ["x$versiony$archivert$topx$objects", ")at_0_"];

fn re_thread_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Thread (\d+): ?(.*)$").expect("thread heading regex"))
}

/// One conversation block of an iMessage thread export.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Thread {
    pub number: usize,
    pub title: String,
    pub identifier: String,
    pub first_message: String,
    pub last_message: String,
    pub message_count: String,
    pub messages: Vec<ThreadMessage>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThreadMessage {
    pub sender: String,
    pub timestamp: String,
    pub text: String,
}

impl Thread {
    #[cfg(test)]
    pub fn to_lines(&self) -> Vec<Line> {
        let mut lines = vec![
            Line::heading(1, format!("Thread {}: {}", self.number, self.title)),
            Line::field("Identifier", &self.identifier),
            Line::field("First Message", &self.first_message),
            Line::field("Last Message", &self.last_message),
            Line::field("Message Count", &self.message_count),
            Line::Blank,
            Line::heading(2, MESSAGES_HEADING),
            Line::Blank,
        ];
        for message in &self.messages {
            lines.push(Line::MessageHeader {
                sender: message.sender.clone(),
                timestamp: message.timestamp.clone(),
            });
            let mut text_lines = message.text.split('\n');
            lines.push(Line::Quote(
                text_lines.next().unwrap_or_default().to_string(),
            ));
            lines.extend(text_lines.map(|line| Line::Text(line.to_string())));
            lines.push(Line::Blank);
        }
        lines
    }

    /// Observed contact for the resolver; `None` when the block names nobody.
    pub fn observe(&self) -> Option<ObservedContact> {
        let name = self
            .messages
            .iter()
            .map(|message| message.sender.trim())
            .find(|sender| !sender.is_empty() && *sender != SELF_SENDER)
            .unwrap_or(self.title.trim());
        if name.is_empty() && self.identifier.trim().is_empty() {
            return None;
        }

        let start = self.messages.len().saturating_sub(PREVIEW_SOURCE_MESSAGES);
        let recent = self.messages[start..]
            .iter()
            .filter_map(preview_for)
            .collect();

        let mut contact = ObservedContact::new(name, &self.identifier, &self.last_message);
        contact.thread = self.number;
        contact.message_count = self.message_count.trim().to_string();
        contact.recent = recent;
        Some(contact)
    }
}

/// Parses every `# Thread N: name` block. Text outside a block is ignored and
/// missing metadata fields default to empty strings.
pub fn parse_threads(text: &str) -> Vec<Thread> {
    let mut threads = Vec::new();
    let mut current: Option<Thread> = None;
    let mut in_messages = false;
    let mut open_message = false;

    for line in grammar::tokenize(text) {
        if let Line::Heading { level: 1, text } = &line {
            if let Some(caps) = re_thread_heading().captures(text) {
                threads.extend(current.take());
                current = Some(Thread {
                    number: caps[1].parse().unwrap_or(threads.len() + 1),
                    title: caps[2].trim().to_string(),
                    ..Thread::default()
                });
                in_messages = false;
                open_message = false;
                continue;
            }
        }
        let Some(thread) = current.as_mut() else {
            continue;
        };

        match line {
            Line::Heading { level: 2, text } if text == MESSAGES_HEADING => {
                in_messages = true;
                open_message = false;
            }
            Line::Field { key, value, .. } if !in_messages => match key.as_str() {
                "Identifier" => thread.identifier = value,
                "First Message" => thread.first_message = value,
                "Last Message" => thread.last_message = value,
                "Message Count" => thread.message_count = value,
                _ => {}
            },
            Line::MessageHeader { sender, timestamp } => {
                in_messages = true;
                open_message = true;
                thread.messages.push(ThreadMessage {
                    sender,
                    timestamp,
                    text: String::new(),
                });
            }
            Line::Quote(text) | Line::Text(text) if open_message => {
                if let Some(message) = thread.messages.last_mut() {
                    if !message.text.is_empty() {
                        message.text.push('\n');
                    }
                    message.text.push_str(&text);
                }
            }
            Line::Blank | Line::Rule => open_message = false,
            _ => {}
        }
    }
    threads.extend(current);
    threads
}

pub fn observe_threads(threads: &[Thread]) -> Vec<ObservedContact> {
    threads.iter().filter_map(Thread::observe).collect()
}

/// Full export document: a header followed by rule-separated thread blocks.
/// Builds fixtures in the format the parser reads.
#[cfg(test)]
pub fn render_export(threads: &[Thread], exported_at: &str) -> String {
    let mut lines = vec![
        Line::heading(1, "iMessage Recent Threads Export"),
        Line::field("Exported", exported_at),
        Line::field("Thread Count", threads.len().to_string()),
        Line::Blank,
        Line::Rule,
        Line::Blank,
    ];
    for thread in threads {
        lines.extend(thread.to_lines());
        lines.push(Line::Blank);
        lines.push(Line::Rule);
        lines.push(Line::Blank);
    }
    grammar::render(&lines)
}

fn preview_for(message: &ThreadMessage) -> Option<MessagePreview> {
    let flattened = truncate_chars(&message.text, PREVIEW_SCAN_CHARS).replace('\n', " ");
    let preview = flattened.trim();
    if preview.is_empty() {
        return None;
    }
    let lowered = preview.to_lowercase();
    if ARTIFACT_PREVIEWS.contains(&lowered.as_str())
        || ARTIFACT_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }
    Some(MessagePreview {
        date: truncate_chars(&message.timestamp, 10),
        sender: message.sender.clone(),
        preview: truncate_chars(preview, PREVIEW_CHARS),
    })
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::{observe_threads, parse_threads, render_export, Thread, ThreadMessage};

    const EXPORT: &str = r#"# iMessage Recent Threads Export
**Exported:** 2025-01-06 08:00
**Thread Count:** 3

---

# Thread 1: Jane Doe
**Identifier:** +14155551234
**First Message:** 2024-12-01 09:00:00
**Last Message:** 2025-01-05 18:30:00
**Message Count:** 3

## Messages

**Me** [2024-12-01 09:00:00]
> Great meeting you!

**Jane Doe** [2025-01-05 18:00:00]
> Likewise, see you
at the launch

**Jane Doe** [2025-01-05 18:30:00]
> NSAttributedString

---

# Thread 2: +19998887777
**Identifier:** +19998887777
**Last Message:** 2025-01-04 12:00:00

## Messages

**Me** [2025-01-04 12:00:00]
> who is this?

---

# Thread 3:
## Messages
"#;

    #[test]
    fn parses_metadata_and_multiline_messages() {
        let threads = parse_threads(EXPORT);
        assert_eq!(threads.len(), 3);

        let jane = &threads[0];
        assert_eq!(jane.number, 1);
        assert_eq!(jane.title, "Jane Doe");
        assert_eq!(jane.identifier, "+14155551234");
        assert_eq!(jane.last_message, "2025-01-05 18:30:00");
        assert_eq!(jane.message_count, "3");
        assert_eq!(jane.messages.len(), 3);
        assert_eq!(jane.messages[1].text, "Likewise, see you\nat the launch");

        let unknown = &threads[1];
        assert_eq!(unknown.first_message, "");
        assert_eq!(unknown.message_count, "");
    }

    #[test]
    fn observe_prefers_first_other_sender_and_filters_artifacts() {
        let contacts = observe_threads(&parse_threads(EXPORT));
        assert_eq!(contacts.len(), 2, "nameless block without identifier is dropped");

        let jane = &contacts[0];
        assert_eq!(jane.name, "Jane Doe");
        assert_eq!(jane.thread, 1);
        assert_eq!(jane.recent.len(), 2);
        assert_eq!(jane.recent[1].preview, "Likewise, see you at the launch");
        assert_eq!(jane.recent[1].date, "2025-01-05");

        let unknown = &contacts[1];
        assert_eq!(unknown.name, "+19998887777", "falls back to thread title");
        assert_eq!(unknown.identifier, "+19998887777");
    }

    #[test]
    fn previews_are_capped_and_limited_to_recent_messages() {
        let messages = (0..12)
            .map(|idx| ThreadMessage {
                sender: "Sam".to_string(),
                timestamp: format!("2025-01-{:02} 10:00:00", idx + 1),
                text: "x".repeat(400),
            })
            .collect();
        let thread = Thread {
            number: 4,
            title: "Sam".to_string(),
            identifier: "sam@example.com".to_string(),
            messages,
            ..Thread::default()
        };
        let contact = thread.observe().expect("thread should be observed");
        assert_eq!(contact.recent.len(), 8);
        assert_eq!(contact.recent[0].date, "2025-01-05");
        assert!(contact.recent.iter().all(|m| m.preview.chars().count() == 150));
    }

    #[test]
    fn rendered_export_parses_back_to_the_same_threads() {
        let threads = parse_threads(EXPORT);
        let rendered = render_export(&threads[..2], "2025-01-06 08:00");
        assert_eq!(parse_threads(&rendered), threads[..2].to_vec());
    }
}
