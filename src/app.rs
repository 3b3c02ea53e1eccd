use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{self, Config, ConfigError};
use crate::directory::{self, ContactDirectory, RecentContact};
use crate::domain::contact::ObservedContact;
use crate::domain::timestamp::{self, Timestamp};
use crate::export::{email, imessage, slack};
use crate::people::{PeopleIndex, PersonRecord};
use crate::reports;
use crate::resolver::{self, CandidateSet, Decision, Resolver};

pub const IMESSAGE_EXPORT: &str = "imessages.md";
pub const SLACK_EXPORT: &str = "slack.md";
pub const EMAILS_RECEIVED_EXPORT: &str = "emails_received.md";
pub const EMAILS_SENT_EXPORT: &str = "emails_sent.md";

/// Values from the command line; anything unset falls back to the config
/// file and then to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub root: PathBuf,
    pub people_dir: Option<PathBuf>,
    pub addressbook: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub as_of: Option<String>,
}

pub struct App {
    people_dir: PathBuf,
    addressbook_root: Option<PathBuf>,
    config: Config,
    as_of: Timestamp,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateRun {
    pub export: PathBuf,
    pub observed: usize,
    #[serde(flatten)]
    pub candidates: CandidateSet,
    #[serde(skip)]
    pub report: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HandleView {
    pub handle: String,
    pub name: String,
    pub classification: resolver::Classification,
    pub resolved_name: Option<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewContactsView {
    pub days: u32,
    pub contacts: Vec<RecentContact>,
    #[serde(skip)]
    pub report: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub sync_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub imessage_contacts: usize,
    pub named_candidates: usize,
    pub unknown_candidates: usize,
    pub slack_channels: usize,
    pub received_contacts: usize,
    pub sent_contacts: usize,
    pub platform_candidates: usize,
}

impl App {
    pub fn open(options: AppOptions) -> Result<Self, AppError> {
        let config = Config::load(options.config.as_deref(), &options.root)?;
        let people_dir = options
            .people_dir
            .or_else(|| config.people_dir.clone().map(|dir| options.root.join(dir)))
            .unwrap_or_else(|| options.root.join(config::DEFAULT_PEOPLE_DIR));
        let addressbook_root = options
            .addressbook
            .or_else(|| config.addressbook_root.clone())
            .or_else(config::default_addressbook_root);
        let as_of = match options.as_of.as_deref() {
            Some(raw) => timestamp::parse_timestamp(raw).ok_or_else(|| {
                AppError::InvalidArgument(format!(
                    "invalid --as-of '{raw}': expected YYYY-MM-DD[ HH:MM[:SS]]"
                ))
            })?,
            None => timestamp::now_local(),
        };
        log::debug!(
            "people dir {}, as of {}",
            people_dir.display(),
            timestamp::format_minutes(as_of)
        );
        Ok(Self {
            people_dir,
            addressbook_root,
            config,
            as_of,
        })
    }

    pub fn people_dir(&self) -> &Path {
        &self.people_dir
    }

    pub fn people_index(&self) -> PeopleIndex {
        PeopleIndex::load(&self.people_dir)
    }

    pub fn contact_directory(&self) -> ContactDirectory {
        match self.addressbook_root.as_deref() {
            Some(root) => {
                let directory = ContactDirectory::load(root);
                if directory.is_empty() {
                    log::warn!(
                        "no contact handles found under {}; phone numbers stay unresolved",
                        root.display()
                    );
                }
                directory
            }
            None => {
                log::warn!("no contacts store configured; phone numbers stay unresolved");
                ContactDirectory::default()
            }
        }
    }

    pub fn list_people(&self) -> Vec<PersonRecord> {
        self.people_index().records
    }

    pub fn candidates(&self, export: &Path) -> Result<CandidateRun, AppError> {
        let text = read_export(export)?;
        let contacts = imessage::observe_threads(&imessage::parse_threads(&text));
        let people = self.people_index();
        let directory = self.contact_directory();
        let set = Resolver::new(&people, &directory, &self.config.rules).resolve(&contacts);
        let report = reports::candidates_report(&set, &[], &self.config.limits, self.as_of);
        Ok(CandidateRun {
            export: export.to_path_buf(),
            observed: contacts.len(),
            candidates: set,
            report,
        })
    }

    pub fn resolve_handle(&self, handle: &str, name: Option<&str>) -> Result<HandleView, AppError> {
        let name = name.unwrap_or_default();
        if handle.trim().is_empty() && name.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "a handle or --name is required".to_string(),
            ));
        }
        let people = self.people_index();
        let directory = self.contact_directory();
        let contact = ObservedContact::new(name, handle, "");
        let Decision {
            classification,
            resolved_name,
        } = Resolver::new(&people, &directory, &self.config.rules).classify(&contact);
        Ok(HandleView {
            handle: contact.identifier,
            name: contact.name,
            summary: classification.to_string(),
            classification,
            resolved_name,
        })
    }

    pub fn new_contacts(&self, days: u32, event: Option<&str>) -> Result<NewContactsView, AppError> {
        if days == 0 {
            return Err(AppError::InvalidArgument(
                "--days must be at least 1".to_string(),
            ));
        }
        let root = self.addressbook_root.as_deref().ok_or_else(|| {
            AppError::NotFound("no contacts store configured (pass --addressbook)".to_string())
        })?;
        let cutoff = timestamp::days_before(self.as_of, i64::from(days)).ok_or_else(|| {
            AppError::InvalidArgument(format!("--days {days} reaches before the earliest date"))
        })?;
        let contacts = directory::recent_contacts(root, cutoff);
        let report = reports::new_contacts_report(&contacts, days, event);
        Ok(NewContactsView {
            days,
            contacts,
            report,
        })
    }

    /// Turns the raw exports in `sync_dir` into the contact directories and
    /// follow-up reports. Missing exports skip their reports; a missing
    /// directory is an error.
    pub fn sync(&self, sync_dir: &Path) -> Result<SyncSummary, AppError> {
        if !sync_dir.is_dir() {
            return Err(AppError::NotFound(format!(
                "sync directory not found: {}",
                sync_dir.display()
            )));
        }
        let limits = &self.config.limits;
        let people = self.people_index();
        let mut summary = SyncSummary {
            sync_dir: sync_dir.to_path_buf(),
            ..SyncSummary::default()
        };

        let received_rows = match read_optional(sync_dir, EMAILS_RECEIVED_EXPORT, &mut summary)? {
            Some(text) => email::parse_rows(&text),
            None => Vec::new(),
        };
        let platform = resolver::platform_candidates(&received_rows, &people);
        summary.platform_candidates = platform.len();

        let contacts = read_optional(sync_dir, IMESSAGE_EXPORT, &mut summary)?
            .map(|text| imessage::observe_threads(&imessage::parse_threads(&text)));
        let mut candidates = CandidateSet::default();
        if let Some(contacts) = contacts.as_deref() {
            summary.imessage_contacts = contacts.len();
            write_report(
                sync_dir,
                reports::IMESSAGE_CONTACTS,
                &reports::imessage_directory(contacts, limits, self.as_of),
                &mut summary,
            )?;
            let directory = self.contact_directory();
            candidates = Resolver::new(&people, &directory, &self.config.rules).resolve(contacts);
            summary.named_candidates = candidates.named.len();
            summary.unknown_candidates = candidates.unknown.len();
            write_report(
                sync_dir,
                reports::NEW_PEOPLE_CANDIDATES,
                &reports::candidates_report(&candidates, &platform, limits, self.as_of),
                &mut summary,
            )?;
        }

        if let Some(text) = read_optional(sync_dir, SLACK_EXPORT, &mut summary)? {
            let channels = slack::parse_channels(&text);
            summary.slack_channels = channels.len();
            write_report(
                sync_dir,
                reports::SLACK_CONTACTS,
                &reports::slack_directory(&channels, self.as_of),
                &mut summary,
            )?;
        }

        let received = email::summarize(&received_rows, &self.config.rules);
        if sync_dir.join(EMAILS_RECEIVED_EXPORT).is_file() {
            summary.received_contacts = received.len();
            write_report(
                sync_dir,
                reports::EMAIL_RECEIVED_CONTACTS,
                &reports::email_directory(&received, self.as_of),
                &mut summary,
            )?;
        }

        let sent = match read_optional(sync_dir, EMAILS_SENT_EXPORT, &mut summary)? {
            Some(text) => {
                let sent = email::summarize(&email::parse_rows(&text), &self.config.rules);
                summary.sent_contacts = sent.len();
                write_report(
                    sync_dir,
                    reports::EMAIL_SENT_CONTACTS,
                    &reports::email_directory(&sent, self.as_of),
                    &mut summary,
                )?;
                sent
            }
            None => Vec::new(),
        };

        if self.people_dir.is_dir() {
            let sources = reports::TouchpointSources {
                imessage: contacts.as_deref().unwrap_or_default(),
                received: &received,
                sent: &sent,
            };
            write_report(
                sync_dir,
                reports::RECENT_PEOPLE_TOUCHPOINTS,
                &reports::touchpoints_report(&people, &sources, limits.recent_days, self.as_of),
                &mut summary,
            )?;
        } else {
            log::warn!(
                "people directory {} missing; skipping touchpoints",
                self.people_dir.display()
            );
        }

        let targets = resolver::outreach_targets(&candidates, limits.outreach_limit);
        write_report(
            sync_dir,
            reports::OUTREACH_DRAFTS,
            &reports::outreach_report(&targets, &platform, limits.outreach_limit, self.as_of),
            &mut summary,
        )?;

        log::info!(
            "sync wrote {} report(s), skipped {} export(s)",
            summary.written.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}

fn read_export(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("export not found: {}", path.display()))
        }
        _ => AppError::Io(err),
    })
}

fn read_optional(
    sync_dir: &Path,
    file: &str,
    summary: &mut SyncSummary,
) -> Result<Option<String>, AppError> {
    let path = sync_dir.join(file);
    if !path.is_file() {
        log::warn!("skipping {file}: not found in {}", sync_dir.display());
        summary.skipped.push(file.to_string());
        return Ok(None);
    }
    Ok(Some(std::fs::read_to_string(&path)?))
}

fn write_report(
    sync_dir: &Path,
    file: &str,
    contents: &str,
    summary: &mut SyncSummary,
) -> Result<(), AppError> {
    let path = sync_dir.join(file);
    std::fs::write(&path, contents)?;
    log::debug!("wrote {}", path.display());
    summary.written.push(path);
    Ok(())
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(ConfigError),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
            AppError::Config(err) => write!(f, "config error: {}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(message) => write!(f, "{}", message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        AppError::Json(value)
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        AppError::Config(value)
    }
}

#[cfg(test)]
mod tests;
