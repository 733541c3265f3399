//! CSV archive for the review log.
//!
//! Rolling up moves every entry of the JSONL log into an append-only CSV
//! file and then retires the log file. Entries are copied verbatim; nothing
//! is edited or dropped.

use crate::lock::open_lock_file;
use crate::review_log::read_entries_locked;
use crate::{Error, Result, ReviewLogEntry};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    flashcard_id: String,
    reviewer_id: String,
    recall_score: f64,
    interval_days: u32,
    next_review_at: String,
    reviewed_at: String,
}

impl From<&ReviewLogEntry> for CsvRow {
    fn from(entry: &ReviewLogEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            flashcard_id: entry.flashcard_id.to_string(),
            reviewer_id: entry.reviewer_id.clone(),
            recall_score: entry.recall_score,
            interval_days: entry.interval_days,
            next_review_at: entry.next_review_at.to_rfc3339(),
            reviewed_at: entry.reviewed_at.to_rfc3339(),
        }
    }
}

impl TryFrom<CsvRow> for ReviewLogEntry {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let parse_id = |s: &str| {
            Uuid::parse_str(s).map_err(|e| Error::Other(format!("Invalid UUID {}: {}", s, e)))
        };
        let parse_time = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::Other(format!("Invalid timestamp {}: {}", s, e)))
        };

        Ok(ReviewLogEntry {
            id: parse_id(&row.id)?,
            flashcard_id: parse_id(&row.flashcard_id)?,
            reviewer_id: row.reviewer_id,
            recall_score: row.recall_score,
            interval_days: row.interval_days,
            next_review_at: parse_time(&row.next_review_at)?,
            reviewed_at: parse_time(&row.reviewed_at)?,
        })
    }
}

/// Roll the review log into the CSV archive and retire the log
///
/// This function:
/// 1. Takes the log's exclusive lock, so no review can append meanwhile
/// 2. Reads all entries from the log
/// 3. Appends them to the CSV file (creates with headers if needed)
/// 4. Syncs the CSV to disk
/// 5. Renames the log to `<name>.processed`, still under the lock
/// 6. Returns the number of entries archived
///
/// A review waiting on the lock appends to a fresh log once the rename is
/// done. The log is renamed rather than deleted so it can be recovered by
/// hand; see [`cleanup_processed_logs`].
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let lock = open_lock_file(log_path)?;
    lock.lock_exclusive()?;
    let archived = archive_locked(log_path, csv_path);
    lock.unlock()?;
    archived
}

fn archive_locked(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = read_entries_locked(log_path)?;

    if entries.is_empty() {
        tracing::info!("No entries in review log to archive");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Headers only go into a fresh file
    let needs_headers = file.metadata()?.len() == 0;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for entry in &entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    file.sync_all()?;

    tracing::info!("Archived {} review entries to {:?}", entries.len(), csv_path);

    let processed_path = processed_path(log_path);
    std::fs::rename(log_path, &processed_path)?;
    tracing::info!("Retired review log to {:?}", processed_path);

    Ok(entries.len())
}

/// Read every entry from the CSV archive
///
/// Rows that fail to parse are skipped with a warning.
pub fn read_archive(csv_path: &Path) -> Result<Vec<ReviewLogEntry>> {
    if !csv_path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;

    let mut entries = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result.map_err(Error::from).and_then(ReviewLogEntry::try_from) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping archive row: {}", e),
        }
    }

    Ok(entries)
}

/// Remove retired log files from a directory
///
/// This removes every `*.processed` file in the given directory.
pub fn cleanup_processed_logs(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed log: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed review logs", count);
    }

    Ok(count)
}

fn processed_path(log_path: &Path) -> std::path::PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(".processed");
    name.into()
}
