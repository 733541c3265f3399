//! Review scheduler: decides when a flashcard is shown next.
//!
//! An SM-2 style scheduler working at whole-day granularity:
//! - Every review adjusts the card's ease factor (quadratic penalty for low scores)
//! - A score below 3 is a lapse: streak reset, back in one day
//! - Passing reviews step 1 day → 3 days → previous interval × ease
//!
//! The scheduler is a pure function of its input. It performs no I/O, never
//! reads the clock (except in [`schedule_next_review_now`]) and never fails:
//! out-of-range numbers are clamped instead of rejected.

use crate::ReviewState;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Lowest ease a card can reach
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Highest ease a card can reach
pub const MAX_EASE_FACTOR: f64 = 3.5;

/// Ease given to new cards
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

pub const MIN_RECALL_SCORE: f64 = 0.0;
pub const MAX_RECALL_SCORE: f64 = 5.0;

/// Scores below this are lapses
pub const PASSING_SCORE: f64 = 3.0;

/// Interval after the second consecutive passing review
pub const GRADUATING_INTERVAL_DAYS: u32 = 3;

/// Everything the scheduler needs to place the next review
///
/// Numeric fields are plain `f64` so that values read from storage or other
/// callers can be passed through untouched; the scheduler normalizes them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduleInput {
    pub recall_score: f64,
    pub ease_factor: f64,
    pub interval_days: f64,
    pub repetition_count: f64,
    pub now: DateTime<Utc>,
}

impl ScheduleInput {
    /// Build an input from a card's stored state
    pub fn from_state(state: &ReviewState, recall_score: f64, now: DateTime<Utc>) -> Self {
        Self {
            recall_score,
            ease_factor: state.ease_factor,
            interval_days: f64::from(state.interval_days),
            repetition_count: f64::from(state.repetition_count),
            now,
        }
    }
}

/// The updated scheduling fields of a card
///
/// `last_reviewed_at` is not part of the result; whoever persists the
/// result stamps it with the same `now` (see [`ScheduleResult::apply_to`]).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub next_review_at: DateTime<Utc>,
}

impl ScheduleResult {
    /// Write this result into a card's state, recording when it was reviewed
    pub fn apply_to(&self, state: &mut ReviewState, reviewed_at: DateTime<Utc>) {
        state.ease_factor = self.ease_factor;
        state.interval_days = self.interval_days;
        state.repetition_count = self.repetition_count;
        state.next_review_at = self.next_review_at;
        state.last_reviewed_at = Some(reviewed_at);
    }

    pub fn is_lapse(&self) -> bool {
        self.repetition_count == 0
    }
}

/// Compute a card's next scheduling state after a review
///
/// ## Rules
///
/// 1. **Normalize**: score into [0, 5], ease into [1.3, 3.5], interval and
///    repetition count rounded to whole numbers, negatives to 0.
///
/// 2. **Ease**: with `penalty = 5 - score`, the new ease is
///    `ease + 0.1 - penalty * (0.08 + penalty * 0.02)`, clamped.
///    Applied on every review, lapses included.
///
/// 3. **Lapse** (score < 3): repetition count 0, interval 1 day.
///
/// 4. **Pass** (score >= 3): repetition count + 1, then
///    - 1st in a row → 1 day
///    - 2nd in a row → 3 days
///    - later → `round(previous interval * new ease)`, at least 1 day
///
/// 5. `next_review_at = now + interval` whole days, saturating at the last
///    representable instant; ease is reported rounded to two decimals.
///
pub fn schedule_next_review(input: &ScheduleInput) -> ScheduleResult {
    let score = clamp_score(input.recall_score);
    let previous_interval = whole_number(input.interval_days);
    let previous_repetitions = whole_number(input.repetition_count);

    let ease = next_ease(clamp_ease(input.ease_factor), score);

    let (interval_days, repetition_count) = if score < PASSING_SCORE {
        (1, 0)
    } else {
        let repetitions = previous_repetitions.saturating_add(1);
        let interval = match repetitions {
            0 | 1 => 1,
            2 => GRADUATING_INTERVAL_DAYS,
            // Uses the ease computed above, not the one the card came in with
            _ => grow_interval(previous_interval, ease),
        };
        (interval, repetitions)
    };

    ScheduleResult {
        ease_factor: round_ease(ease),
        interval_days,
        repetition_count,
        next_review_at: add_days(input.now, interval_days),
    }
}

/// Schedule relative to the current wall-clock time
///
/// Thin wrapper for callers that do not need reproducible output.
pub fn schedule_next_review_now(state: &ReviewState, recall_score: f64) -> ScheduleResult {
    schedule_next_review(&ScheduleInput::from_state(state, recall_score, Utc::now()))
}

/// Clamp an ease factor into range; NaN falls back to the default ease
pub fn clamp_ease(ease: f64) -> f64 {
    if ease.is_nan() {
        DEFAULT_EASE_FACTOR
    } else {
        ease.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        MIN_RECALL_SCORE
    } else {
        score.clamp(MIN_RECALL_SCORE, MAX_RECALL_SCORE)
    }
}

/// Round to nearest, negatives and NaN to 0, saturating at `u32::MAX`
fn whole_number(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn next_ease(ease: f64, score: f64) -> f64 {
    let penalty = MAX_RECALL_SCORE - score;
    clamp_ease(ease + (0.1 - penalty * (0.08 + penalty * 0.02)))
}

fn grow_interval(previous_interval: u32, ease: f64) -> u32 {
    whole_number(f64::from(previous_interval) * ease).max(1)
}

fn round_ease(ease: f64) -> f64 {
    (ease * 100.0).round() / 100.0
}

fn add_days(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
