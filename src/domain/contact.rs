use serde::Serialize;

use super::identity::{is_email_shaped, is_phone_number};

/// One contact as seen in a parsed export, rebuilt on every run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ObservedContact {
    pub thread: usize,
    pub name: String,
    pub identifier: String,
    pub last_message: String,
    pub message_count: String,
    pub recent: Vec<MessagePreview>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessagePreview {
    pub date: String,
    pub sender: String,
    pub preview: String,
}

impl ObservedContact {
    pub fn new(name: &str, identifier: &str, last_message: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            identifier: identifier.trim().to_string(),
            last_message: last_message.trim().to_string(),
            ..Self::default()
        }
    }

    /// Name suitable for a heading: the name unless it is a raw handle.
    pub fn real_name(&self) -> Option<&str> {
        let name = self.name.trim();
        if name.is_empty() || is_phone_number(name) || is_email_shaped(name) {
            None
        } else {
            Some(name)
        }
    }

    pub fn display(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.identifier
        } else {
            &self.name
        }
    }

    pub fn preview_text(&self) -> String {
        self.recent
            .iter()
            .map(|message| message.preview.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::{MessagePreview, ObservedContact};

    #[test]
    fn real_name_rejects_raw_handles() {
        assert_eq!(
            ObservedContact::new(" Jane Doe ", "+1", "").real_name(),
            Some("Jane Doe")
        );
        assert!(ObservedContact::new("+14155551234", "", "").real_name().is_none());
        assert!(ObservedContact::new("a@b.co", "", "").real_name().is_none());
        assert!(ObservedContact::new("", "x", "").real_name().is_none());
    }

    #[test]
    fn display_falls_back_to_identifier() {
        assert_eq!(ObservedContact::new("", "+1999", "").display(), "+1999");
        assert_eq!(ObservedContact::new("Sam", "+1999", "").display(), "Sam");
    }

    #[test]
    fn preview_text_joins_all_previews() {
        let mut contact = ObservedContact::new("Sam", "+1999", "");
        contact.recent = vec![
            MessagePreview {
                date: "2025-01-01".to_string(),
                sender: "Sam".to_string(),
                preview: "hello".to_string(),
            },
            MessagePreview {
                date: "2025-01-02".to_string(),
                sender: "Me".to_string(),
                preview: "there".to_string(),
            },
        ];
        assert_eq!(contact.preview_text(), "hello there");
    }
}
