use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = ".rolodex.toml";
pub const DEFAULT_PEOPLE_DIR: &str = "people";
/// Upper bound for any day-count window, about a century.
pub const MAX_WINDOW_DAYS: i64 = 36_500;
const ADDRESSBOOK_SUFFIX: &str = "Library/Application Support/AddressBook";

/// Family labels that never surface as new people.
const EXCLUDE_NAMES: [&str; 7] = ["dad", "mom", "mum", "mother", "father", "grandma", "grandpa"];

/// Preview phrases typical of verification codes, delivery notices, text-blast
/// services and NSAttributedString residue leaking into exported text.
const SYSTEM_MARKERS: [&str; 16] = [
    "verification code",
    "one-time passcode",
    "we'll never ask you for it",
    "track your order",
    "estimated delivery window",
    "your order",
    "reply at http",
    "reply at https",
    "view at:",
    "sent a text blast",
    "support@",
    "noreply",
    "no-reply",
    "x$versiony$archivert$topx$objects",
    "nsattributedstring",
    "streamtyped@nsattributedstring",
];

const EMAIL_EXCLUDE_PATTERNS: [&str; 57] = [
    "@newsletter.",
    "@email.",
    "@mail.",
    "@e.",
    "@news.",
    "@offers.",
    "@promo.",
    "@marketing.",
    "@notifications.",
    "@alerts.",
    "@updates.",
    "@digest.",
    "@info.",
    "noreply@",
    "no-reply@",
    "donotreply@",
    "@noreply.",
    "@no-reply.",
    "@substack.com",
    "@beehiiv.com",
    "@mailchimp.com",
    "@sendgrid.net",
    "@amazonaws.com",
    "@mailgun.org",
    "@constantcontact.com",
    "@hubspot.com",
    "@linkedin.com",
    "@slack.com",
    "@github.com",
    "@twitter.com",
    "@facebook.com",
    "@instagram.com",
    "@reddit.com",
    "@discord.com",
    "@paypal.com",
    "@stripe.com",
    "@venmo.com",
    "@square.com",
    "@shopify.com",
    "adamandeve",
    "bodybuilding.com",
    "nordstrom",
    "cookunity",
    "ubereats",
    "doordash",
    "producthunt",
    "parkmobile",
    "experian",
    "rocketmoney",
    "capitalone",
    "schwab",
    "savethechildren",
    "hims.com",
    "nytimes",
    "@notification",
    "@mailer.",
    "@bulk.",
];

const SUBJECT_EXCLUDE_PATTERNS: [&str; 9] = [
    "unsubscribe",
    "verification code",
    "password reset",
    "your order",
    "your receipt",
    "payment received",
    "budget update",
    "price alert",
    "just scheduled",
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    paths: RawPaths,
    #[serde(default)]
    filters: RawFilters,
    #[serde(default)]
    reports: RawReports,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPaths {
    people_dir: Option<PathBuf>,
    addressbook_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilters {
    #[serde(default)]
    exclude_names: Vec<String>,
    #[serde(default)]
    system_markers: Vec<String>,
    #[serde(default)]
    email_exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReports {
    recent_days: Option<i64>,
    unknown_limit: Option<usize>,
    named_previews: Option<usize>,
    unknown_previews: Option<usize>,
    outreach_limit: Option<usize>,
}

/// Static heuristics applied by the resolver and the email parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRules {
    pub exclude_names: BTreeSet<String>,
    pub system_markers: Vec<String>,
    pub email_exclude_patterns: Vec<String>,
    pub subject_exclude_patterns: Vec<String>,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            exclude_names: EXCLUDE_NAMES.iter().map(|name| name.to_string()).collect(),
            system_markers: to_strings(&SYSTEM_MARKERS),
            email_exclude_patterns: to_strings(&EMAIL_EXCLUDE_PATTERNS),
            subject_exclude_patterns: to_strings(&SUBJECT_EXCLUDE_PATTERNS),
        }
    }
}

impl FilterRules {
    pub fn is_excluded_name(&self, name: &str) -> bool {
        self.exclude_names.contains(&name.trim().to_lowercase())
    }

    /// First marker contained in the lowercased text.
    pub fn system_marker_in(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.system_markers
            .iter()
            .find(|marker| lowered.contains(marker.as_str()))
            .map(String::as_str)
    }

    pub fn should_exclude_email(&self, email: &str, subject: &str) -> bool {
        let email = email.to_lowercase();
        let subject = subject.to_lowercase();
        self.email_exclude_patterns
            .iter()
            .any(|pattern| email.contains(pattern.as_str()))
            || self
                .subject_exclude_patterns
                .iter()
                .any(|pattern| subject.contains(pattern.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    pub recent_days: i64,
    pub unknown_limit: usize,
    pub named_previews: usize,
    pub unknown_previews: usize,
    pub outreach_limit: usize,
}

impl ReportLimits {
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.recent_days) {
            return Err(format!(
                "reports.recent_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                self.recent_days
            ));
        }
        Ok(())
    }
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            recent_days: 14,
            unknown_limit: 50,
            named_previews: 3,
            unknown_previews: 2,
            outreach_limit: 25,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub people_dir: Option<PathBuf>,
    pub addressbook_root: Option<PathBuf>,
    pub rules: FilterRules,
    pub limits: ReportLimits,
}

impl Config {
    /// Loads `explicit` if given (it must exist), else `<root>/.rolodex.toml`
    /// when present, else the built-in defaults.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    log::debug!("no config at {}, using defaults", candidate.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?;
        config
            .limits
            .validate()
            .map_err(|message| ConfigError::Invalid {
                path: path.clone(),
                message,
            })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let raw: RawConfig = toml::from_str(text)?;
        let mut rules = FilterRules::default();
        rules.exclude_names.extend(
            raw.filters
                .exclude_names
                .iter()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty()),
        );
        extend_lowercase(&mut rules.system_markers, &raw.filters.system_markers);
        extend_lowercase(
            &mut rules.email_exclude_patterns,
            &raw.filters.email_exclude_patterns,
        );

        let defaults = ReportLimits::default();
        let limits = ReportLimits {
            recent_days: raw.reports.recent_days.unwrap_or(defaults.recent_days),
            unknown_limit: raw.reports.unknown_limit.unwrap_or(defaults.unknown_limit),
            named_previews: raw.reports.named_previews.unwrap_or(defaults.named_previews),
            unknown_previews: raw
                .reports
                .unknown_previews
                .unwrap_or(defaults.unknown_previews),
            outreach_limit: raw.reports.outreach_limit.unwrap_or(defaults.outreach_limit),
        };

        Ok(Self {
            people_dir: raw.paths.people_dir,
            addressbook_root: raw.paths.addressbook_root,
            rules,
            limits,
        })
    }
}

pub fn default_addressbook_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(ADDRESSBOOK_SUFFIX))
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn extend_lowercase(target: &mut Vec<String>, extra: &[String]) {
    for value in extra {
        let value = value.trim().to_lowercase();
        if !value.is_empty() && !target.contains(&value) {
            target.push(value);
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(path) => write!(f, "config file '{}' not found", path.display()),
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => {
                write!(f, "invalid config '{}': {}", path.display(), source)
            }
            ConfigError::Invalid { path, message } => {
                write!(f, "invalid config '{}': {}", path.display(), message)
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Missing(_) => None,
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, FilterRules, ReportLimits};
    use std::path::PathBuf;

    fn unique_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rolodex-config-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let root = unique_dir();
        let config = Config::load(None, &root).expect("missing default config is fine");
        assert_eq!(config, Config::default());
        assert_eq!(config.limits.unknown_limit, 50);
        assert!(config.rules.is_excluded_name(" Mom "));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let root = unique_dir();
        let err = Config::load(Some(&root.join("nope.toml")), &root)
            .expect_err("explicit missing config should fail");
        assert!(matches!(err, ConfigError::Missing(_)));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn config_file_extends_filters_and_overrides_limits() {
        let root = unique_dir();
        std::fs::write(
            root.join(".rolodex.toml"),
            r#"
[paths]
people_dir = "crm/people"

[filters]
exclude_names = ["Aunt Sue"]
system_markers = ["Appointment Reminder"]

[reports]
unknown_limit = 5
"#,
        )
        .expect("config should be writable");

        let config = Config::load(None, &root).expect("config should load");
        assert_eq!(config.people_dir, Some(PathBuf::from("crm/people")));
        assert!(config.rules.is_excluded_name("aunt sue"));
        assert!(config.rules.is_excluded_name("dad"));
        assert_eq!(
            config.rules.system_marker_in("Your APPOINTMENT REMINDER for Tue"),
            Some("appointment reminder")
        );
        assert_eq!(config.limits.unknown_limit, 5);
        assert_eq!(config.limits.recent_days, ReportLimits::default().recent_days);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let root = unique_dir();
        let path = root.join("bad.toml");
        std::fs::write(&path, "[reports]\nunknwn_limit = 3\n").expect("config should be writable");
        let err = Config::load(Some(&path), &root).expect_err("typo should be rejected");
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("bad.toml"));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn recent_days_outside_the_window_is_rejected() {
        let root = unique_dir();
        let path = root.join("days.toml");
        for value in ["0", "-3", "36501", "9223372036854775807"] {
            std::fs::write(&path, format!("[reports]\nrecent_days = {value}\n"))
                .expect("config should be writable");
            let err = Config::load(Some(&path), &root).expect_err("bad window should be rejected");
            assert!(matches!(err, ConfigError::Invalid { .. }), "{value}: {err}");
            assert!(err.to_string().contains("recent_days"));
        }

        std::fs::write(&path, "[reports]\nrecent_days = 36500\n").expect("config should be writable");
        let config = Config::load(Some(&path), &root).expect("upper bound is allowed");
        assert_eq!(config.limits.recent_days, 36_500);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn email_rules_match_sender_and_subject_patterns() {
        let rules = FilterRules::default();
        assert!(rules.should_exclude_email("News@Substack.com", "hello"));
        assert!(rules.should_exclude_email("friend@example.com", "Your Receipt from Cafe"));
        assert!(!rules.should_exclude_email("friend@example.com", "lunch?"));
    }
}
