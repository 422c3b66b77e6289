//! ECG record persistence.
//!
//! A small document store behind the [`RecordStore`] trait. Two backends:
//! - [`MemoryStore`]: process-lifetime, used when no path is configured.
//! - [`JsonlStore`]: one JSON document per line, appended on insert and
//!   replayed on open.
//!
//! `id_ecg` is a unique key in both backends.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sample::now_ms;

/// A saved ECG recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcgRecord {
    /// Document id.
    pub id: String,
    /// Numeric record key (creation time in ms), unique per store.
    #[serde(rename = "idECG")]
    pub id_ecg: u64,
    /// Opaque signal payload as submitted.
    pub signal: serde_json::Value,
    /// Patient identifier.
    pub patient: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl EcgRecord {
    /// New record keyed by the current time.
    pub fn new(signal: serde_json::Value, patient: impl Into<String>) -> Self {
        let ms = now_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            id_ecg: ms,
            signal,
            patient: patient.into(),
            created_at: format_iso8601(Duration::from_millis(ms)),
        }
    }
}

/// Errors from a [`RecordStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("duplicate key: idECG {0} already exists")]
    Duplicate(u64),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Document store for [`EcgRecord`]s.
pub trait RecordStore: Send + Sync {
    /// Persist `record`. Fails with [`StoreError::Duplicate`] on a repeated `id_ecg`.
    fn insert(&self, record: EcgRecord) -> Result<(), StoreError>;

    fn get(&self, id_ecg: u64) -> Result<Option<EcgRecord>, StoreError>;

    /// Records for `patient`, oldest first.
    fn list_for_patient(&self, patient: &str) -> Result<Vec<EcgRecord>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<u64, EcgRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: EcgRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        if records.contains_key(&record.id_ecg) {
            return Err(StoreError::Duplicate(record.id_ecg));
        }
        records.insert(record.id_ecg, record);
        Ok(())
    }

    fn get(&self, id_ecg: u64) -> Result<Option<EcgRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&id_ecg).cloned())
    }

    fn list_for_patient(&self, patient: &str) -> Result<Vec<EcgRecord>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .values()
            .filter(|r| r.patient == patient)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().map_err(|_| StoreError::Poisoned)?.len())
    }
}

// ---------------------------------------------------------------------------
// JsonlStore
// ---------------------------------------------------------------------------

struct JsonlInner {
    writer: BufWriter<File>,
    records: BTreeMap<u64, EcgRecord>,
}

/// Append-only JSON-lines file store.
pub struct JsonlStore {
    path: PathBuf,
    inner: Mutex<JsonlInner>,
}

impl JsonlStore {
    /// Open (or create) the store at `path`, loading existing records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut records = BTreeMap::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: EcgRecord = serde_json::from_str(&line)?;
                match records.entry(record.id_ecg) {
                    Entry::Vacant(slot) => {
                        slot.insert(record);
                    }
                    Entry::Occupied(_) => {
                        log::warn!(
                            "{} holds more than one record with idECG {}",
                            path.display(),
                            record.id_ecg
                        );
                        return Err(StoreError::Duplicate(record.id_ecg));
                    }
                }
            }
            log::info!("loaded {} ECG records from {}", records.len(), path.display());
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(JsonlInner {
                writer: BufWriter::new(file),
                records,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlStore {
    fn insert(&self, record: EcgRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        if inner.records.contains_key(&record.id_ecg) {
            return Err(StoreError::Duplicate(record.id_ecg));
        }
        let line = serde_json::to_string(&record)?;
        writeln!(inner.writer, "{line}")?;
        inner.writer.flush()?;
        inner.records.insert(record.id_ecg, record);
        Ok(())
    }

    fn get(&self, id_ecg: u64) -> Result<Option<EcgRecord>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.records.get(&id_ecg).cloned())
    }

    fn list_for_patient(&self, patient: &str) -> Result<Vec<EcgRecord>, StoreError> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .records
            .values()
            .filter(|r| r.patient == patient)
            .cloned()
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().map_err(|_| StoreError::Poisoned)?.records.len())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a duration-since-epoch as an ISO-8601 UTC timestamp with milliseconds.
/// Example: `2026-02-15T01:30:00.250Z`
fn format_iso8601(since_epoch: Duration) -> String {
    let secs = since_epoch.as_secs();
    let (year, month, day) = civil_from_days(secs / 86_400);
    let of_day = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        of_day / 3_600,
        of_day / 60 % 60,
        of_day % 60,
        since_epoch.subsec_millis()
    )
}

/// Gregorian (year, month, day) for a count of days since 1970-01-01.
///
/// Howard Hinnant's `civil_from_days`: years are counted from March so the
/// leap day is the last day of its year, in 400-year eras of 146 097 days.
fn civil_from_days(days: u64) -> (u64, u32, u32) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = era * 400 + yoe + u64::from(month <= 2);
    (year, month, day)
}
