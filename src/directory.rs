//! Merged `handle -> name` table built from the macOS Contacts (AddressBook)
//! databases: the primary store plus every `Sources/*/` account store.

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use uuid::Uuid;

use crate::domain::identity::{is_email_shaped, normalize_email, phone_key, phone_variants};
use crate::domain::timestamp::{self, Timestamp};

pub const ADDRESSBOOK_DB: &str = "AddressBook-v22.abcddb";
pub const SOURCES_DIR: &str = "Sources";
const UNKNOWN_NAME: &str = "Unknown";

const DISPLAY_NAME_SQL: &str = "COALESCE(
        NULLIF(TRIM(COALESCE(r.ZFIRSTNAME, '') || ' ' || COALESCE(r.ZLASTNAME, '')), ''),
        r.ZORGANIZATION,
        'Unknown'
    )";

#[derive(Debug)]
pub enum DirectoryError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::Io { path, source } => {
                write!(f, "could not snapshot {}: {}", path.display(), source)
            }
            DirectoryError::Db { path, source } => {
                write!(f, "could not query {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for DirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DirectoryError::Io { source, .. } => Some(source),
            DirectoryError::Db { source, .. } => Some(source),
        }
    }
}

/// Every AddressBook database under `root`: the primary store first, then the
/// per-account stores in path order. Missing files are simply absent.
pub fn discover_databases(root: &Path) -> Vec<PathBuf> {
    let mut databases = Vec::new();
    let main = root.join(ADDRESSBOOK_DB);
    if main.is_file() {
        databases.push(main);
    }
    if let Ok(entries) = std::fs::read_dir(root.join(SOURCES_DIR)) {
        let mut sources: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path().join(ADDRESSBOOK_DB))
            .filter(|path| path.is_file())
            .collect();
        sources.sort();
        databases.extend(sources);
    }
    databases
}

/// Private copy of a live database (with its `-wal`/`-shm` siblings) in a
/// unique temp directory; queries never touch the original file. The copy is
/// removed on drop.
pub struct Snapshot {
    dir: PathBuf,
    db: PathBuf,
    source: PathBuf,
}

impl Snapshot {
    pub fn create(source: &Path) -> Result<Self, DirectoryError> {
        let io_err = |err| DirectoryError::Io {
            path: source.to_path_buf(),
            source: err,
        };
        let dir = std::env::temp_dir().join(format!("rolodex-contacts-{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).map_err(io_err)?;
        let snapshot = Self {
            db: dir.join("contacts.copy.db"),
            dir,
            source: source.to_path_buf(),
        };
        std::fs::copy(source, &snapshot.db).map_err(io_err)?;
        for suffix in ["-wal", "-shm"] {
            let sibling = sibling_path(source, suffix);
            if sibling.is_file() {
                if let Err(err) = std::fs::copy(&sibling, sibling_path(&snapshot.db, suffix)) {
                    log::debug!("skipping {}: {}", sibling.display(), err);
                }
            }
        }
        Ok(snapshot)
    }

    pub fn open(&self) -> Result<Connection, DirectoryError> {
        Connection::open_with_flags(
            &self.db,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| self.db_error(err))
    }

    fn db_error(&self, source: rusqlite::Error) -> DirectoryError {
        DirectoryError::Db {
            path: self.source.clone(),
            source,
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Phone,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub kind: HandleKind,
    pub handle: String,
    pub name: String,
}

/// Handle lookups resolved against every registered spelling. Later
/// insertions overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDirectory {
    names: HashMap<String, String>,
    databases: usize,
}

impl ContactDirectory {
    /// Loads every database under `root`. Databases that cannot be copied,
    /// opened or queried are skipped with a warning.
    pub fn load(root: &Path) -> Self {
        let mut directory = Self::default();
        for path in discover_databases(root) {
            match read_database(&path) {
                Ok(entries) => {
                    log::debug!("{}: {} handles", path.display(), entries.len());
                    directory.databases += 1;
                    directory.extend(entries);
                }
                Err(err) => log::warn!("skipping contacts database: {err}"),
            }
        }
        log::info!(
            "loaded {} contact handles from {} database(s)",
            directory.len(),
            directory.database_count()
        );
        directory
    }

    #[cfg(test)]
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut directory = Self::default();
        directory.extend(entries);
        directory
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = DirectoryEntry>) {
        for entry in entries {
            match entry.kind {
                HandleKind::Phone => self.insert_phone(&entry.handle, &entry.name),
                HandleKind::Email => self.insert_email(&entry.handle, &entry.name),
            }
        }
    }

    pub fn insert_phone(&mut self, handle: &str, name: &str) {
        let name = name.trim();
        if name.is_empty() || name == UNKNOWN_NAME {
            return;
        }
        let mut keys = phone_variants(handle);
        keys.extend(phone_key(handle));
        for key in keys {
            self.names.insert(key, name.to_string());
        }
    }

    pub fn insert_email(&mut self, handle: &str, name: &str) {
        let name = name.trim();
        let email = normalize_email(handle);
        if email.is_empty() || name.is_empty() || name == UNKNOWN_NAME {
            return;
        }
        self.names.insert(email, name.to_string());
    }

    /// Display name for a raw handle, trying each phone spelling and finally
    /// the canonical phone key.
    pub fn resolve(&self, identifier: &str) -> Option<&str> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }
        if is_email_shaped(identifier) {
            return self
                .names
                .get(&normalize_email(identifier))
                .map(String::as_str);
        }
        phone_variants(identifier)
            .into_iter()
            .chain(phone_key(identifier))
            .find_map(|key| self.names.get(&key))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn database_count(&self) -> usize {
        self.databases
    }
}

pub fn read_database(path: &Path) -> Result<Vec<DirectoryEntry>, DirectoryError> {
    let snapshot = Snapshot::create(path)?;
    let conn = snapshot.open()?;
    read_handles(&conn).map_err(|err| snapshot.db_error(err))
}

fn read_handles(conn: &Connection) -> rusqlite::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();
    let queries = [
        (
            HandleKind::Phone,
            format!(
                "SELECT p.ZFULLNUMBER, {DISPLAY_NAME_SQL}
                 FROM ZABCDPHONENUMBER p
                 JOIN ZABCDRECORD r ON p.ZOWNER = r.Z_PK
                 WHERE p.ZFULLNUMBER IS NOT NULL AND p.ZFULLNUMBER != ''"
            ),
        ),
        (
            HandleKind::Email,
            format!(
                "SELECT e.ZADDRESS, {DISPLAY_NAME_SQL}
                 FROM ZABCDEMAILADDRESS e
                 JOIN ZABCDRECORD r ON e.ZOWNER = r.Z_PK
                 WHERE e.ZADDRESS IS NOT NULL AND e.ZADDRESS != ''"
            ),
        ),
    ];
    for (kind, sql) in queries {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(DirectoryEntry {
                kind,
                handle: row.get::<_, String>(0)?.trim().to_string(),
                name: row.get::<_, String>(1)?.trim().to_string(),
            })
        })?;
        for row in rows {
            entries.push(row?);
        }
    }
    Ok(entries)
}

/// A Contacts record created inside the lookback window.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecentContact {
    pub name: String,
    pub first_name: String,
    pub phone: String,
    #[serde(serialize_with = "serialize_minutes")]
    pub added: Timestamp,
}

/// Records created at or after `cutoff` that carry a phone number, one per
/// phone across all databases, newest first.
pub fn recent_contacts(root: &Path, cutoff: Timestamp) -> Vec<RecentContact> {
    let mut contacts = Vec::new();
    let mut seen_phones = HashSet::new();
    for path in discover_databases(root) {
        let rows = Snapshot::create(&path).and_then(|snapshot| {
            let conn = snapshot.open()?;
            read_recent(&conn, cutoff).map_err(|err| snapshot.db_error(err))
        });
        match rows {
            Ok(rows) => {
                for contact in rows {
                    if seen_phones.insert(contact.phone.clone()) {
                        contacts.push(contact);
                    }
                }
            }
            Err(err) => log::warn!("skipping contacts database: {err}"),
        }
    }
    contacts.sort_by(|a, b| b.added.cmp(&a.added));
    contacts
}

fn read_recent(conn: &Connection, cutoff: Timestamp) -> rusqlite::Result<Vec<RecentContact>> {
    let mut stmt = conn.prepare(
        "SELECT r.ZFIRSTNAME, r.ZLASTNAME, r.ZORGANIZATION, r.ZCREATIONDATE, p.ZFULLNUMBER
         FROM ZABCDRECORD r
         LEFT JOIN ZABCDPHONENUMBER p ON p.ZOWNER = r.Z_PK
         WHERE r.ZCREATIONDATE >= ?1
         ORDER BY r.ZCREATIONDATE DESC",
    )?;
    let rows = stmt.query_map(params![timestamp::to_core_data(cutoff)], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, f64>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut contacts = Vec::new();
    for row in rows {
        let (first, last, organization, created, phone) = row?;
        let phone = phone.unwrap_or_default().trim().to_string();
        if phone.is_empty() {
            continue;
        }
        let first = first.unwrap_or_default().trim().to_string();
        let last = last.unwrap_or_default().trim().to_string();
        let organization = organization.unwrap_or_default().trim().to_string();
        let mut name = format!("{first} {last}").trim().to_string();
        if name.is_empty() {
            name = if organization.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                organization
            };
        }
        contacts.push(RecentContact {
            name,
            first_name: first,
            phone,
            added: timestamp::from_core_data(created),
        });
    }
    Ok(contacts)
}

fn serialize_minutes<S>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&timestamp::format_minutes(*value))
}
