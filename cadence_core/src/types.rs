//! Core domain types for the Cadence review system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Per-card scheduling state
//! - Flashcards and where they came from
//! - Review log entries
//! - Named recall ratings

use crate::scheduler::clamp_ease;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Scheduling State
// ============================================================================

/// Scheduling state carried by every flashcard
///
/// Mutated once per review, and only with the output of
/// [`schedule_next_review`](crate::scheduler::schedule_next_review).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetition_count: u32,
    pub next_review_at: DateTime<Utc>,
    #[serde(default)]
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl ReviewState {
    /// State of a card that has never been reviewed: due at `created_at`.
    pub fn new(created_at: DateTime<Utc>, initial_ease: f64) -> Self {
        Self {
            ease_factor: clamp_ease(initial_ease),
            interval_days: 0,
            repetition_count: 0,
            next_review_at: created_at,
            last_reviewed_at: None,
        }
    }

    /// A card is due once its next review time has been reached
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

// ============================================================================
// Flashcards
// ============================================================================

/// Where a flashcard came from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardSource {
    #[default]
    Manual,
    QuizMiss,
    Concept,
}

impl FromStr for CardSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(CardSource::Manual),
            "quiz_miss" | "quiz-miss" => Ok(CardSource::QuizMiss),
            "concept" => Ok(CardSource::Concept),
            other => Err(Error::Other(format!("Unknown card source: {}", other))),
        }
    }
}

impl fmt::Display for CardSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardSource::Manual => "manual",
            CardSource::QuizMiss => "quiz_miss",
            CardSource::Concept => "concept",
        };
        f.write_str(name)
    }
}

/// A flashcard together with its scheduling state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub source: CardSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_title: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub review: ReviewState,
}

impl Flashcard {
    pub fn new(
        front: impl Into<String>,
        back: impl Into<String>,
        source: CardSource,
        created_at: DateTime<Utc>,
        initial_ease: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            front: front.into(),
            back: back.into(),
            source,
            concept_title: None,
            created_at,
            review: ReviewState::new(created_at, initial_ease),
        }
    }
}

// ============================================================================
// Review Log
// ============================================================================

/// One immutable row of the review history
///
/// Written once per review and never edited. It is an audit trail only; the
/// scheduler reads a card's current [`ReviewState`], never its history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReviewLogEntry {
    pub id: Uuid,
    pub flashcard_id: Uuid,
    pub reviewer_id: String,
    pub recall_score: f64,
    pub interval_days: u32,
    pub next_review_at: DateTime<Utc>,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLogEntry {
    /// Whether the raw score counted as a failure
    pub fn is_lapse(&self) -> bool {
        self.recall_score < crate::scheduler::PASSING_SCORE
    }
}

// ============================================================================
// Ratings
// ============================================================================

/// Named recall buttons and the scores they submit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub fn score(self) -> f64 {
        match self {
            Rating::Again => 2.0,
            Rating::Hard => 3.0,
            Rating::Good => 4.0,
            Rating::Easy => 5.0,
        }
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            other => Err(Error::InvalidScore(format!("unknown rating '{}'", other))),
        }
    }
}
