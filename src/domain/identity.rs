//! Normalization of handles and names into comparison-ready identity tokens.
//!
//! Tokens are compared by exact string equality; there is no fuzzy matching.

/// Characters stripped when deciding whether a name field is really a number.
const PHONE_PUNCTUATION: [char; 5] = ['+', '-', '(', ')', ' '];
const MIN_PHONE_DIGITS: usize = 7;
const NANP_LOCAL_DIGITS: usize = 10;

/// Digits only, keeping a leading `+` when the input started with one.
/// Returns an empty string when no digits remain.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

/// The three spellings under which a phone handle is registered and looked up:
/// as given, without the leading `+`, and with `+ ( ) space -` removed.
pub fn phone_variants(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut variants = vec![trimmed.to_string()];
    if let Some(rest) = trimmed.strip_prefix('+') {
        push_unique(&mut variants, rest.to_string());
    }
    let stripped: String = trimmed
        .chars()
        .filter(|c| !PHONE_PUNCTUATION.contains(c))
        .collect();
    if !stripped.is_empty() {
        push_unique(&mut variants, stripped);
    }
    variants
}

/// Canonical comparison key for a phone number: `+` and digits, with a bare
/// ten-digit North American number given its `1` country code.
///
/// `+1 (415) 555-1234`, `14155551234` and `4155551234` share one key.
pub fn phone_key(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.len() == NANP_LOCAL_DIGITS && !raw.trim().starts_with('+') {
        return Some(format!("+1{digits}"));
    }
    Some(format!("+{digits}"))
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_email_shaped(value: &str) -> bool {
    value.contains('@')
}

/// True when `name` is a raw phone number that failed to resolve to a person.
pub fn is_phone_number(name: &str) -> bool {
    let cleaned: String = name
        .chars()
        .filter(|c| !PHONE_PUNCTUATION.contains(c))
        .collect();
    cleaned.len() >= MIN_PHONE_DIGITS && cleaned.chars().all(|c| c.is_ascii_digit())
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Slug of the first and last whitespace-separated words, for names carrying a
/// middle name or nickname. `None` for single-word names.
pub fn first_last_slug(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }
    Some(slugify(&format!("{} {}", parts[0], parts[parts.len() - 1])))
}

pub fn first_name(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
