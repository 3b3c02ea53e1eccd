use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::grammar::{self, Line};
use super::imessage::truncate_chars;
use crate::domain::contact::MessagePreview;

const RECENT_MESSAGES: usize = 5;
const PREVIEW_CHARS: usize = 150;

fn re_message_count() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Messages: (\d+)\s*$").expect("message count regex"))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SlackChannel {
    pub channel: String,
    pub message_count: usize,
    pub recent: Vec<MessagePreview>,
}

/// Parses `## <channel>` sections. A heading only opens a channel when the
/// very next line is `Messages: <n>`.
pub fn parse_channels(text: &str) -> Vec<SlackChannel> {
    let mut channels = Vec::new();
    let mut pending: Option<String> = None;
    let mut current: Option<(SlackChannel, Vec<(String, String, String)>)> = None;
    let mut open_message = false;

    for line in grammar::tokenize(text) {
        if let Some(channel) = pending.take() {
            let count = match &line {
                Line::Text(raw) => re_message_count()
                    .captures(raw)
                    .and_then(|caps| caps[1].parse::<usize>().ok()),
                _ => None,
            };
            if let Some(message_count) = count {
                channels.extend(current.take().map(finish));
                current = Some((
                    SlackChannel {
                        channel,
                        message_count,
                        recent: Vec::new(),
                    },
                    Vec::new(),
                ));
                open_message = false;
                continue;
            }
        }

        match line {
            Line::Heading { level: 2, text } => {
                pending = Some(text);
                open_message = false;
            }
            Line::MessageHeader { sender, timestamp } => {
                if let Some((_, messages)) = current.as_mut() {
                    messages.push((sender, timestamp, String::new()));
                    open_message = true;
                }
            }
            Line::Quote(text) | Line::Text(text) if open_message => {
                if let Some((_, messages)) = current.as_mut() {
                    if let Some((_, _, body)) = messages.last_mut() {
                        if !body.is_empty() {
                            body.push('\n');
                        }
                        body.push_str(&text);
                    }
                }
            }
            Line::Blank | Line::Rule => open_message = false,
            _ => {}
        }
    }
    channels.extend(current.map(finish));
    channels
}

fn finish((mut channel, messages): (SlackChannel, Vec<(String, String, String)>)) -> SlackChannel {
    let start = messages.len().saturating_sub(RECENT_MESSAGES);
    channel.recent = messages[start..]
        .iter()
        .map(|(sender, timestamp, text)| MessagePreview {
            date: timestamp.clone(),
            sender: sender.clone(),
            preview: truncate_chars(text, PREVIEW_CHARS)
                .replace('\n', " ")
                .trim()
                .to_string(),
        })
        .collect();
    channel
}

#[cfg(test)]
mod tests {
    use super::parse_channels;

    const EXPORT: &str = "# Slack Export\n\n## general\nMessages: 7\n\n**Ana** [2025-01-01 09:00:00]\n> one\n\n**Bo** [2025-01-01 09:01:00]\n> two\nlines\n\n**Ana** [2025-01-01 09:02:00]\n> three\n\n**Ana** [2025-01-01 09:03:00]\n> four\n\n**Ana** [2025-01-01 09:04:00]\n> five\n\n**Cy** [2025-01-01 09:05:00]\n> six\n\n## Notes\nnot a channel\n\n## DM: Dana\nMessages: 1\n\n**Dana** [2025-01-02 10:00:00]\n> hello\n\n---\n";

    #[test]
    fn parses_channels_with_counts_and_last_five_messages() {
        let channels = parse_channels(EXPORT);
        assert_eq!(channels.len(), 2);

        let general = &channels[0];
        assert_eq!(general.channel, "general");
        assert_eq!(general.message_count, 7);
        assert_eq!(general.recent.len(), 5);
        assert_eq!(general.recent[0].preview, "two lines");
        assert_eq!(general.recent[4].sender, "Cy");
        assert_eq!(general.recent[4].date, "2025-01-01 09:05:00");

        assert_eq!(channels[1].channel, "DM: Dana");
        assert_eq!(channels[1].recent[0].preview, "hello");
    }

    #[test]
    fn heading_without_count_line_is_not_a_channel() {
        assert!(parse_channels("## general\n\nMessages: 3\n").is_empty());
    }
}
