//! Roster record store contracts and flat-file implementation.
//!
//! # Responsibility
//! - Read and write the whole roster as one JSON array.
//! - Normalize legacy records (missing flags, missing ids) on read and
//!   persist generated ids right away so they stay stable across loads.
//! - Offer a lenient scan for callers that must survive malformed records.
//!
//! # Invariants
//! - Writes go temp file -> fsync -> rename under a process-wide lock.
//! - Strict `load` fails on the first malformed record instead of dropping it.
//! - Output field order is fixed so unmodified round trips are byte-identical.

use crate::model::entry::{
    format_expiration_date, parse_expiration_date, NotificationId, NotificationSchedule,
    RosterEntry,
};
use crate::repo::seed::SeedDataset;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use uuid::Uuid;

static WRITE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub type StoreResult<T> = Result<T, StorageError>;

/// Record store failure. In-memory state is never mutated when one is returned.
#[derive(Debug)]
pub enum StorageError {
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidRecord {
        index: usize,
        reason: String,
    },
    Serialize(serde_json::Error),
    InvalidSeed(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io {
                action,
                path,
                source,
            } => write!(f, "failed to {action} `{}`: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "roster file `{}` is not valid: {source}", path.display())
            }
            Self::InvalidRecord { index, reason } => {
                write!(f, "invalid roster record at index {index}: {reason}")
            }
            Self::Serialize(err) => write!(f, "failed to serialize roster: {err}"),
            Self::InvalidSeed(message) => write!(f, "invalid seed dataset: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
            Self::InvalidRecord { .. } | Self::InvalidSeed(_) => None,
        }
    }
}

/// One persisted record that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position inside the persisted array.
    pub index: usize,
    pub reason: String,
}

/// Result of a lenient scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub entries: Vec<RosterEntry>,
    pub rejected: Vec<RejectedRecord>,
}

/// Record store contract.
pub trait RosterRepository {
    /// Returns the full persisted roster, seeding it on first use.
    fn load(&self) -> StoreResult<Vec<RosterEntry>>;
    /// Replaces the persisted roster with `entries`.
    fn save(&self, entries: &[RosterEntry]) -> StoreResult<()>;
    /// Reads whatever decodes; never seeds.
    fn scan(&self) -> StoreResult<ScanReport>;
}

impl<R: RosterRepository + ?Sized> RosterRepository for &R {
    fn load(&self) -> StoreResult<Vec<RosterEntry>> {
        (**self).load()
    }

    fn save(&self, entries: &[RosterEntry]) -> StoreResult<()> {
        (**self).save(entries)
    }

    fn scan(&self) -> StoreResult<ScanReport> {
        (**self).scan()
    }
}

/// Wire shape of one record in `pessoas.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct PersistedEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    nome: String,
    #[serde(rename = "LPNA")]
    lpna: String,
    vencimento: String,
    #[serde(rename = "notificationId", default)]
    notification_id: Option<String>,
    #[serde(rename = "notificationsEnabled", default)]
    notifications_enabled: Option<bool>,
    #[serde(rename = "cardVisible", default)]
    card_visible: Option<bool>,
}

/// Roster store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRosterRepository {
    path: PathBuf,
    seed: SeedDataset,
}

impl JsonFileRosterRepository {
    /// Creates a store at `path` seeded from the bundled dataset.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_seed(path, SeedDataset::bundled())
    }

    pub fn with_seed(path: impl Into<PathBuf>, seed: SeedDataset) -> Self {
        Self {
            path: path.into(),
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(&self) -> StoreResult<Vec<Value>> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| StorageError::Io {
            action: "read",
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str::<Vec<Value>>(&text).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn seed_locked(&self) -> StoreResult<Vec<RosterEntry>> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another writer may have created the file while we waited.
        if self.path.exists() {
            drop(_guard);
            return self.load();
        }

        let entries = self.seed.entries()?;
        write_atomic(&self.path, &encode_entries(&entries)?)?;
        info!(
            "event=roster_seed module=repo status=ok entries={}",
            entries.len()
        );
        Ok(entries)
    }

    /// Strictly decodes every record; also returns how many ids were generated.
    fn decode_all(&self) -> StoreResult<(Vec<RosterEntry>, usize)> {
        let mut entries = Vec::new();
        let mut assigned = 0;
        for (index, value) in self.read_records()?.into_iter().enumerate() {
            let decoded = decode_record(value)
                .map_err(|reason| StorageError::InvalidRecord { index, reason })?;
            if decoded.id_assigned {
                assigned += 1;
            }
            entries.push(decoded.entry);
        }
        Ok((entries, assigned))
    }

    /// Writes generated ids back so every later load sees the same ids.
    fn persist_assigned_ids_locked(&self) -> StoreResult<Vec<RosterEntry>> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Re-read under the lock; a concurrent loader may have written ids already.
        let (entries, assigned) = self.decode_all()?;
        if assigned > 0 {
            write_atomic(&self.path, &encode_entries(&entries)?)?;
            info!(
                "event=roster_assign_ids module=repo status=ok assigned={}",
                assigned
            );
        }
        Ok(entries)
    }
}

impl RosterRepository for JsonFileRosterRepository {
    fn load(&self) -> StoreResult<Vec<RosterEntry>> {
        let started_at = Instant::now();
        if !self.path.exists() {
            return self.seed_locked();
        }

        let result = self.decode_all().and_then(|(entries, assigned)| {
            if assigned == 0 {
                Ok(entries)
            } else {
                self.persist_assigned_ids_locked()
            }
        });

        match &result {
            Ok(entries) => info!(
                "event=roster_load module=repo status=ok entries={} duration_ms={}",
                entries.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=roster_load module=repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn save(&self, entries: &[RosterEntry]) -> StoreResult<()> {
        let started_at = Instant::now();
        let text = encode_entries(entries)?;
        let _guard = WRITE_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match write_atomic(&self.path, &text) {
            Ok(()) => {
                info!(
                    "event=roster_save module=repo status=ok entries={} duration_ms={}",
                    entries.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=roster_save module=repo status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn scan(&self) -> StoreResult<ScanReport> {
        if !self.path.exists() {
            info!("event=roster_scan module=repo status=skip reason=missing_file");
            return Ok(ScanReport::default());
        }

        let mut report = ScanReport::default();
        for (index, value) in self.read_records()?.into_iter().enumerate() {
            match decode_entry(value) {
                Ok(entry) => report.entries.push(entry),
                Err(reason) => {
                    warn!(
                        "event=roster_scan module=repo status=skip index={} reason={}",
                        index, reason
                    );
                    report.rejected.push(RejectedRecord { index, reason });
                }
            }
        }
        Ok(report)
    }
}

/// One decoded record plus whether its id had to be generated.
pub(crate) struct DecodedEntry {
    pub(crate) entry: RosterEntry,
    pub(crate) id_assigned: bool,
}

/// Decodes one persisted JSON value, applying legacy defaults.
pub(crate) fn decode_entry(value: Value) -> Result<RosterEntry, String> {
    decode_record(value).map(|decoded| decoded.entry)
}

pub(crate) fn decode_record(value: Value) -> Result<DecodedEntry, String> {
    let record: PersistedEntry = serde_json::from_value(value).map_err(|err| err.to_string())?;
    let expiration_date =
        parse_expiration_date(&record.vencimento).map_err(|err| err.to_string())?;

    let (id, id_assigned) = match record.id.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => (id, false),
        Some(Err(_)) | None => (Uuid::new_v4(), true),
    };
    let schedule = match record.notification_id {
        Some(handle) if !handle.trim().is_empty() => {
            NotificationSchedule::Scheduled(NotificationId::new(handle))
        }
        _ => NotificationSchedule::NoSchedule,
    };

    let mut entry = RosterEntry::with_id(id, record.nome, record.lpna, expiration_date);
    entry.notifications_enabled = record.notifications_enabled.unwrap_or(true);
    entry.card_visible = record.card_visible.unwrap_or(true);
    entry.schedule = schedule;
    Ok(DecodedEntry { entry, id_assigned })
}

pub(crate) fn encode_entries(entries: &[RosterEntry]) -> StoreResult<String> {
    let records = entries.iter().map(to_persisted).collect::<Vec<_>>();
    serde_json::to_string_pretty(&records).map_err(StorageError::Serialize)
}

fn to_persisted(entry: &RosterEntry) -> PersistedEntry {
    PersistedEntry {
        id: Some(entry.id.to_string()),
        nome: entry.name.clone(),
        lpna: entry.license_id.clone(),
        vencimento: format_expiration_date(entry.expiration_date),
        notification_id: entry
            .schedule
            .notification_id()
            .map(|id| id.as_str().to_string()),
        notifications_enabled: Some(entry.notifications_enabled),
        card_visible: Some(entry.card_visible),
    }
}

fn write_atomic(path: &Path, text: &str) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            action: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = path.with_extension(format!("json.tmp-{}", std::process::id()));
    let write_result = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(text.as_bytes())?;
        file.sync_all()
    })();
    if let Err(source) = write_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(StorageError::Io {
            action: "write",
            path: tmp_path,
            source,
        });
    }

    std::fs::rename(&tmp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        StorageError::Io {
            action: "replace",
            path: path.to_path_buf(),
            source,
        }
    })
}
