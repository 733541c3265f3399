//! Append-only review log.
//!
//! Every review appends one [`ReviewLogEntry`] as a JSON line. Entries are
//! never rewritten; the archive module moves whole files into CSV instead.

use crate::lock::open_lock_file;
use crate::{Result, ReviewLogEntry};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Destination for review log entries
pub trait ReviewLogSink {
    fn append(&mut self, entry: &ReviewLogEntry) -> Result<()>;
}

/// JSONL review log guarded by a sidecar `<log>.lock`
#[derive(Debug)]
pub struct JsonlReviewLog {
    path: PathBuf,
}

impl JsonlReviewLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewLogSink for JsonlReviewLog {
    fn append(&mut self, entry: &ReviewLogEntry) -> Result<()> {
        // Held across open and write so a rollup cannot retire the file in between
        let lock = open_lock_file(&self.path)?;
        lock.lock_exclusive()?;
        let appended = append_line(&self.path, entry);
        lock.unlock()?;
        appended?;

        tracing::debug!(
            "Appended review {} for card {} to log",
            entry.id,
            entry.flashcard_id
        );
        Ok(())
    }
}

/// Append one entry; caller holds the log lock
fn append_line(path: &Path, entry: &ReviewLogEntry) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;

    // A crash mid-append can leave an unterminated line behind
    let mut line = String::new();
    if !ends_with_newline(&mut file)? {
        tracing::warn!("Review log {:?} ends with a torn line", path);
        line.push('\n');
    }
    line.push_str(&serde_json::to_string(entry)?);
    line.push('\n');

    let mut writer = std::io::BufWriter::new(&file);
    writer.write_all(line.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// In-memory sink, handy for callers that persist entries elsewhere
impl ReviewLogSink for Vec<ReviewLogEntry> {
    fn append(&mut self, entry: &ReviewLogEntry) -> Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// Read all entries from a review log file
///
/// Lines that fail to parse (e.g. a torn final line after a crash) are
/// skipped with a warning.
pub fn read_entries(path: &Path) -> Result<Vec<ReviewLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let lock = open_lock_file(path)?;
    lock.lock_shared()?;
    let entries = read_entries_locked(path);
    lock.unlock()?;
    entries
}

/// [`read_entries`] for callers already holding the log lock
pub(crate) fn read_entries_locked(path: &Path) -> Result<Vec<ReviewLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<ReviewLogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Skipping review log line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Read {} entries from review log", entries.len());
    Ok(entries)
}
