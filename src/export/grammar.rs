//! Tagged-line grammar shared by the export writers and readers.
//!
//! Every export line is exactly one of these tokens. Parsers consume tokens
//! instead of matching raw text. The test-only renderer writes the same
//! tokens back out for fixtures.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// `# text`, `## text`, ...
    Heading { level: usize, text: String },
    /// `**Key:** value`, optionally as a `- ` bullet.
    Field {
        key: String,
        value: String,
        bullet: bool,
    },
    /// `**sender** [YYYY-MM-DD[ HH:MM[:SS]]]`
    MessageHeader { sender: String, timestamp: String },
    /// `> text`
    Quote(String),
    /// `---`
    Rule,
    Blank,
    Text(String),
}

fn re_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})[ \t]+(.*?)[ \t]*$").expect("heading regex"))
}

fn re_message_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\*\*(.*?)\*\* \[(\d{4}-\d{2}-\d{2}(?: [\d:]+)?)\][ \t]*$")
            .expect("message header regex")
    })
}

fn re_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*(-[ \t]+)?\*\*([^*]+?):\*\*[ \t]*(.*?)[ \t]*$").expect("field regex")
    })
}

fn re_rule() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-{3,}[ \t]*$").expect("rule regex"))
}

impl Line {
    pub fn classify(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Line::Blank;
        }
        if re_rule().is_match(raw) {
            return Line::Rule;
        }
        if let Some(text) = raw.strip_prefix('>') {
            let text = text.strip_prefix(' ').unwrap_or(text);
            return Line::Quote(text.to_string());
        }
        if let Some(caps) = re_heading().captures(raw) {
            return Line::Heading {
                level: caps[1].len(),
                text: caps[2].to_string(),
            };
        }
        if let Some(caps) = re_message_header().captures(raw) {
            return Line::MessageHeader {
                sender: caps[1].to_string(),
                timestamp: caps[2].to_string(),
            };
        }
        if let Some(caps) = re_field().captures(raw) {
            return Line::Field {
                key: caps[2].trim().to_string(),
                value: caps[3].to_string(),
                bullet: caps.get(1).is_some(),
            };
        }
        Line::Text(raw.to_string())
    }

    #[cfg(test)]
    pub fn render(&self) -> String {
        match self {
            Line::Heading { level, text } => format!("{} {}", "#".repeat(*level), text),
            Line::Field { key, value, bullet } => {
                let prefix = if *bullet { "- " } else { "" };
                if value.is_empty() {
                    format!("{prefix}**{key}:**")
                } else {
                    format!("{prefix}**{key}:** {value}")
                }
            }
            Line::MessageHeader { sender, timestamp } => format!("**{sender}** [{timestamp}]"),
            Line::Quote(text) => format!("> {text}"),
            Line::Rule => "---".to_string(),
            Line::Blank => String::new(),
            Line::Text(text) => text.clone(),
        }
    }

    #[cfg(test)]
    pub fn heading(level: usize, text: impl Into<String>) -> Self {
        Line::Heading {
            level,
            text: text.into(),
        }
    }

    #[cfg(test)]
    pub fn field(key: impl Into<String>, value: impl Into<String>) -> Self {
        Line::Field {
            key: key.into(),
            value: value.into(),
            bullet: false,
        }
    }
}

pub fn tokenize(text: &str) -> Vec<Line> {
    text.lines().map(Line::classify).collect()
}

#[cfg(test)]
pub fn render(lines: &[Line]) -> String {
    lines
        .iter()
        .map(Line::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{render, tokenize, Line};

    #[test]
    fn classifies_each_line_kind() {
        let text = "# Thread 1: Jane\n**Identifier:** +14155551234\n- **Name:** JD\n\n## Messages\n**Jane** [2025-01-05 10:00:00]\n> hi there\ncontinued\n---";
        let lines = tokenize(text);
        assert_eq!(
            lines,
            vec![
                Line::heading(1, "Thread 1: Jane"),
                Line::field("Identifier", "+14155551234"),
                Line::Field {
                    key: "Name".to_string(),
                    value: "JD".to_string(),
                    bullet: true,
                },
                Line::Blank,
                Line::heading(2, "Messages"),
                Line::MessageHeader {
                    sender: "Jane".to_string(),
                    timestamp: "2025-01-05 10:00:00".to_string(),
                },
                Line::Quote("hi there".to_string()),
                Line::Text("continued".to_string()),
                Line::Rule,
            ]
        );
    }

    #[test]
    fn message_header_requires_dated_brackets() {
        assert_eq!(
            Line::classify("**Me** [2025-01-05]"),
            Line::MessageHeader {
                sender: "Me".to_string(),
                timestamp: "2025-01-05".to_string(),
            }
        );
        assert_eq!(
            Line::classify("**bold** statement"),
            Line::Text("**bold** statement".to_string())
        );
        assert!(matches!(
            Line::classify("#hashtag"),
            Line::Text(ref text) if text == "#hashtag"
        ));
    }

    #[test]
    fn render_reproduces_canonical_lines() {
        let text = "# Thread 2: Sam\n**Last Message:** 2025-01-05 10:00:00\n\n**Sam** [2025-01-05 10:00:00]\n> yo\n\n---";
        assert_eq!(render(&tokenize(text)), text);
    }
}
