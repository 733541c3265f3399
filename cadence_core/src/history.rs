//! Review history loading.
//!
//! History is read from both the live review log and the CSV archive, so a
//! card's record stays complete across rollups.

use crate::{Result, ReviewLogEntry};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Aggregate figures over a set of review entries
#[derive(Clone, Debug, PartialEq)]
pub struct HistorySummary {
    pub total: usize,
    pub lapses: usize,
    pub mean_score: Option<f64>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Load review entries from the log and the archive
///
/// Returns entries sorted by `reviewed_at`, newest first, optionally
/// restricted to one flashcard. Entries present in both sources (e.g. a
/// rollup interrupted before the log was retired) appear once.
pub fn load_review_history(
    log_path: &Path,
    csv_path: &Path,
    flashcard_id: Option<Uuid>,
) -> Result<Vec<ReviewLogEntry>> {
    let wanted = |entry: &ReviewLogEntry| flashcard_id.map_or(true, |id| entry.flashcard_id == id);

    let mut seen_ids = HashSet::new();
    let mut entries = Vec::new();

    let logged = crate::review_log::read_entries(log_path)?;
    for entry in logged.into_iter().filter(|e| wanted(e)) {
        if seen_ids.insert(entry.id) {
            entries.push(entry);
        }
    }
    tracing::debug!("Loaded {} entries from review log", entries.len());

    let archived = crate::archive::read_archive(csv_path)?;
    let mut archived_count = 0;
    for entry in archived.into_iter().filter(|e| wanted(e)) {
        if seen_ids.insert(entry.id) {
            entries.push(entry);
            archived_count += 1;
        }
    }
    tracing::debug!("Loaded {} entries from archive", archived_count);

    entries.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));

    tracing::info!("Loaded {} review entries", entries.len());
    Ok(entries)
}

/// Summarize a set of review entries
pub fn summarize(entries: &[ReviewLogEntry]) -> HistorySummary {
    let total = entries.len();
    let lapses = entries.iter().filter(|e| e.is_lapse()).count();
    let mean_score = (total > 0)
        .then(|| entries.iter().map(|e| e.recall_score).sum::<f64>() / total as f64);
    let last_reviewed_at = entries.iter().map(|e| e.reviewed_at).max();

    HistorySummary {
        total,
        lapses,
        mean_score,
        last_reviewed_at,
    }
}
