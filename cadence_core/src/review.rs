//! Review submission: validate, schedule, persist, log.
//!
//! This is the boundary where raw scores are checked. The scheduler
//! accepts anything and clamps; here a malformed score is an error the user
//! sees.

use crate::scheduler::{schedule_next_review, ScheduleInput, ScheduleResult};
use crate::scheduler::{MAX_RECALL_SCORE, MIN_RECALL_SCORE};
use crate::review_log::ReviewLogSink;
use crate::{Deck, Error, Flashcard, Rating, Result, ReviewLogEntry};
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

/// A learner's answer for one card
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewRequest {
    pub flashcard_id: Uuid,
    pub reviewer_id: String,
    pub recall_score: f64,
}

/// What a review changed
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewOutcome {
    /// The card as saved, with its new scheduling state
    pub flashcard: Flashcard,
    pub schedule: ScheduleResult,
    pub entry: ReviewLogEntry,
}

/// Accept only finite scores within [0, 5]
pub fn validate_recall_score(score: f64) -> Result<f64> {
    if score.is_finite() && (MIN_RECALL_SCORE..=MAX_RECALL_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(Error::InvalidScore(format!(
            "recall score must be a number between {} and {}, got {}",
            MIN_RECALL_SCORE, MAX_RECALL_SCORE, score
        )))
    }
}

/// Parse a score given as a number or as a rating name
pub fn parse_recall_score(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if let Ok(rating) = trimmed.parse::<Rating>() {
        return Ok(rating.score());
    }

    let score: f64 = trimmed.parse().map_err(|_| {
        Error::InvalidScore(format!(
            "'{}' is neither a number nor a rating (again, hard, good, easy)",
            trimmed
        ))
    })?;
    validate_recall_score(score)
}

/// Record one review
///
/// The card's state is read, rescheduled and written back under the deck's
/// exclusive lock, stamped with `last_reviewed_at = now`. Once the new
/// state is saved, a [`ReviewLogEntry`] is appended to `sink`.
pub fn submit_review<S>(
    deck_path: &Path,
    sink: &mut S,
    request: &ReviewRequest,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome>
where
    S: ReviewLogSink + ?Sized,
{
    let score = validate_recall_score(request.recall_score)?;
    if request.reviewer_id.trim().is_empty() {
        return Err(Error::Other("reviewer id must not be empty".into()));
    }

    let (flashcard, schedule) = Deck::update(deck_path, |deck| {
        let card = deck
            .get_mut(request.flashcard_id)
            .ok_or_else(|| Error::NotFound(request.flashcard_id.to_string()))?;

        let schedule = schedule_next_review(&ScheduleInput::from_state(&card.review, score, now));
        schedule.apply_to(&mut card.review, now);
        Ok((card.clone(), schedule))
    })?;

    let entry = ReviewLogEntry {
        id: Uuid::new_v4(),
        flashcard_id: flashcard.id,
        reviewer_id: request.reviewer_id.clone(),
        recall_score: score,
        interval_days: schedule.interval_days,
        next_review_at: schedule.next_review_at,
        reviewed_at: now,
    };
    sink.append(&entry)?;

    tracing::info!(
        "Reviewed card {} with score {}: interval {}d, repetition {}, ease {:.2}, next {}",
        flashcard.id,
        score,
        schedule.interval_days,
        schedule.repetition_count,
        schedule.ease_factor,
        schedule.next_review_at.to_rfc3339()
    );

    Ok(ReviewOutcome {
        flashcard,
        schedule,
        entry,
    })
}
