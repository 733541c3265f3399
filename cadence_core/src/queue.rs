//! Due queue: which flashcards should be reviewed now.
//!
//! Because cards store an absolute `next_review_at`, "due" is a plain
//! comparison against the current time.

use crate::{Deck, Flashcard};
use chrono::{DateTime, Utc};

/// Counts for a deck at a point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSummary {
    pub total: usize,
    pub due_now: usize,
    /// Earliest review time among cards that are not yet due
    pub next_due_at: Option<DateTime<Utc>>,
}

/// Due cards, most overdue first, at most `limit` of them
pub fn due_cards(deck: &Deck, now: DateTime<Utc>, limit: usize) -> Vec<&Flashcard> {
    let mut due: Vec<_> = deck.cards.iter().filter(|c| c.review.is_due(now)).collect();
    sort_by_due_date(&mut due);
    due.truncate(limit);
    due
}

/// All cards ordered by when they come due, at most `limit` of them
pub fn upcoming(deck: &Deck, limit: usize) -> Vec<&Flashcard> {
    let mut cards: Vec<_> = deck.cards.iter().collect();
    sort_by_due_date(&mut cards);
    cards.truncate(limit);
    cards
}

pub fn queue_summary(deck: &Deck, now: DateTime<Utc>) -> QueueSummary {
    let due_now = deck.cards.iter().filter(|c| c.review.is_due(now)).count();
    let next_due_at = deck
        .cards
        .iter()
        .filter(|c| !c.review.is_due(now))
        .map(|c| c.review.next_review_at)
        .min();

    QueueSummary {
        total: deck.cards.len(),
        due_now,
        next_due_at,
    }
}

fn sort_by_due_date(cards: &mut [&Flashcard]) {
    cards.sort_by_key(|c| (c.review.next_review_at, c.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CardSource;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap()
    }

    fn card(front: &str, due_in_hours: i64) -> Flashcard {
        let mut c = Flashcard::new(front, "back", CardSource::Manual, now() - Duration::days(30), 2.5);
        c.review.next_review_at = now() + Duration::hours(due_in_hours);
        c
    }

    fn deck() -> Deck {
        Deck {
            cards: vec![
                card("tomorrow", 24),
                card("overdue", -48),
                card("exactly now", 0),
                card("in an hour", 1),
                card("yesterday", -24),
            ],
        }
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let deck = Deck {
            cards: vec![card("now", 0), card("later", 1)],
        };
        let due: Vec<_> = due_cards(&deck, now(), 10).iter().map(|c| c.front.as_str()).collect();
        assert_eq!(due, vec!["now"]);
        assert_eq!(queue_summary(&deck, now()).due_now, 1);
    }

    #[test]
    fn test_due_cards_most_overdue_first() {
        let deck = deck();
        let fronts: Vec<_> = due_cards(&deck, now(), 10)
            .iter()
            .map(|c| c.front.as_str())
            .collect();
        assert_eq!(fronts, vec!["overdue", "yesterday", "exactly now"]);
    }

    #[test]
    fn test_due_cards_respects_limit() {
        let deck = deck();
        assert_eq!(due_cards(&deck, now(), 2).len(), 2);
    }

    #[test]
    fn test_ties_break_on_creation_time() {
        let mut older = card("older", -1);
        let mut newer = card("newer", -1);
        older.created_at = now() - Duration::days(10);
        newer.created_at = now() - Duration::days(5);
        let deck = Deck {
            cards: vec![newer, older],
        };

        let fronts: Vec<_> = due_cards(&deck, now(), 10)
            .iter()
            .map(|c| c.front.as_str())
            .collect();
        assert_eq!(fronts, vec!["older", "newer"]);
    }

    #[test]
    fn test_upcoming_includes_everything_in_order() {
        let deck = deck();
        let fronts: Vec<_> = upcoming(&deck, 100).iter().map(|c| c.front.as_str()).collect();
        assert_eq!(
            fronts,
            vec!["overdue", "yesterday", "exactly now", "in an hour", "tomorrow"]
        );
    }

    #[test]
    fn test_queue_summary() {
        let summary = queue_summary(&deck(), now());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.due_now, 3);
        assert_eq!(summary.next_due_at, Some(now() + Duration::hours(1)));

        let empty = queue_summary(&Deck::default(), now());
        assert_eq!(
            empty,
            QueueSummary {
                total: 0,
                due_now: 0,
                next_due_at: None
            }
        );
    }
}
