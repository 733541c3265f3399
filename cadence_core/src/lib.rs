#![forbid(unsafe_code)]

//! Core domain model and business logic for the Cadence review system.
//!
//! This crate provides:
//! - Domain types (flashcards, scheduling state, review log entries)
//! - The spaced-repetition scheduler
//! - Persistence (deck file, review log, CSV archive)
//! - Due queue and review history queries
//! - Review submission

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod scheduler;
pub mod lock;
pub mod deck;
pub mod review_log;
pub mod archive;
pub mod history;
pub mod queue;
pub mod review;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use scheduler::{schedule_next_review, schedule_next_review_now, ScheduleInput, ScheduleResult};
pub use deck::Deck;
pub use review_log::{JsonlReviewLog, ReviewLogSink};
pub use history::{load_review_history, summarize, HistorySummary};
pub use queue::{due_cards, queue_summary, upcoming, QueueSummary};
pub use review::{parse_recall_score, submit_review, ReviewOutcome, ReviewRequest};
