//! Flashcard deck persistence with file locking.
//!
//! The deck is a single JSON file holding every card and its scheduling
//! state. Readers and writers coordinate through an advisory lock on a
//! sidecar `<deck>.lock` file, so a review's load-modify-save cycle cannot
//! interleave with another process doing the same.

use crate::lock::open_lock_file;
use crate::{Error, Flashcard, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// All flashcards of one learner
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Deck {
    #[serde(default)]
    pub cards: Vec<Flashcard>,
}

impl Deck {
    /// Load a deck with shared locking
    ///
    /// Returns an empty deck if the file doesn't exist. A deck that exists
    /// but cannot be read or parsed is an error: replacing it with an empty
    /// one would lose every card on the next save.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No deck file found at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let lock = open_lock_file(path)?;
        lock.lock_shared()?;
        let deck = read_deck(path);
        lock.unlock()?;
        deck
    }

    /// Save the deck with exclusive locking
    pub fn save(&self, path: &Path) -> Result<()> {
        let lock = open_lock_file(path)?;
        lock.lock_exclusive()?;
        let saved = write_deck(self, path);
        lock.unlock()?;
        saved
    }

    /// Load the deck, modify it, and save it back under one exclusive lock
    ///
    /// The closure's return value is handed back to the caller. If the
    /// closure fails nothing is written.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut Deck) -> Result<T>,
    {
        let lock = open_lock_file(path)?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<T> {
            let mut deck = if path.exists() {
                read_deck(path)?
            } else {
                Deck::default()
            };
            let value = f(&mut deck)?;
            write_deck(&deck, path)?;
            Ok(value)
        })();

        lock.unlock()?;
        result
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Add a card, returning a reference to the stored copy
    pub fn add_card(&mut self, card: Flashcard) -> &Flashcard {
        tracing::debug!("Adding flashcard {}", card.id);
        self.cards.push(card);
        &self.cards[self.cards.len() - 1]
    }

    pub fn get(&self, id: Uuid) -> Option<&Flashcard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Flashcard> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// Find a card by full id or by a unique prefix of its id
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&Flashcard> {
        let needle = id_or_prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::NotFound("empty id".into()));
        }

        if let Ok(id) = Uuid::parse_str(&needle) {
            return self
                .get(id)
                .ok_or_else(|| Error::NotFound(id_or_prefix.to_string()));
        }

        let mut matches = self
            .cards
            .iter()
            .filter(|c| c.id.to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(card), None) => Ok(card),
            (Some(_), Some(_)) => Err(Error::AmbiguousId(id_or_prefix.to_string())),
            (None, _) => Err(Error::NotFound(id_or_prefix.to_string())),
        }
    }
}

/// Read and parse the deck file; caller holds the lock
fn read_deck(path: &Path) -> Result<Deck> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|file| std::io::BufReader::new(file).read_to_string(&mut contents))
        .map_err(|e| Error::State(format!("Failed to read deck {:?}: {}", path, e)))?;

    let deck: Deck = serde_json::from_str(&contents)
        .map_err(|e| Error::State(format!("Failed to parse deck {:?}: {}", path, e)))?;

    tracing::debug!("Loaded {} cards from {:?}", deck.cards.len(), path);
    Ok(deck)
}

/// Atomically replace the deck file; caller holds the lock
///
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
fn write_deck(deck: &Deck, path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::State(format!("Deck path {:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(deck)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {} cards to {:?}", deck.cards.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::lock_path;
    use crate::CardSource;
    use chrono::{TimeZone, Utc};

    fn card(front: &str) -> Flashcard {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Flashcard::new(front, "answer", CardSource::Manual, created, 2.5)
    }

    fn card_with_id(id: u128) -> Flashcard {
        let mut c = card("fixed");
        c.id = Uuid::from_u128(id);
        c
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");

        let mut deck = Deck::default();
        deck.add_card(card("capital of France?"));
        deck.add_card(card("2 + 2?"));
        deck.save(&deck_path).unwrap();

        let loaded = Deck::load(&deck_path).unwrap();
        assert_eq!(loaded, deck);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("nonexistent.json");

        let deck = Deck::load(&deck_path).unwrap();
        assert!(deck.is_empty());
        assert!(!lock_path(&deck_path).exists());
    }

    #[test]
    fn test_corrupted_deck_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");
        std::fs::write(&deck_path, "{ invalid json }").unwrap();

        let err = Deck::load(&deck_path).unwrap_err();
        assert!(matches!(err, Error::State(_)));

        // A failed update must leave the file untouched
        let result = Deck::update(&deck_path, |deck| {
            deck.add_card(card("never saved"));
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(&deck_path).unwrap(),
            "{ invalid json }"
        );
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");

        let id = Deck::update(&deck_path, |deck| Ok(deck.add_card(card("first")).id)).unwrap();

        Deck::update(&deck_path, |deck| {
            let c = deck.get_mut(id).unwrap();
            c.review.interval_days = 6;
            Ok(())
        })
        .unwrap();

        let loaded = Deck::load(&deck_path).unwrap();
        assert_eq!(loaded.get(id).unwrap().review.interval_days, 6);
    }

    #[test]
    fn test_failed_closure_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");

        let result: Result<()> = Deck::update(&deck_path, |deck| {
            deck.add_card(card("discarded"));
            Err(Error::Other("abort".into()))
        });

        assert!(result.is_err());
        assert!(!deck_path.exists());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");

        Deck::default().save(&deck_path).unwrap();

        // Only the deck and its lock file remain, no stray temp files
        let mut names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["deck.json", "deck.json.lock"]);
    }

    #[test]
    fn test_concurrent_updates_lose_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let deck_path = temp_dir.path().join("deck.json");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = deck_path.clone();
                std::thread::spawn(move || {
                    Deck::update(&path, |deck| {
                        deck.add_card(card(&format!("card {}", i)));
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(Deck::load(&deck_path).unwrap().len(), 8);
    }

    #[test]
    fn test_resolve_by_full_id_and_prefix() {
        let mut deck = Deck::default();
        deck.add_card(card_with_id(0xaaaa_0000_0000_0000_0000_0000_0000_0001));
        deck.add_card(card_with_id(0xbbbb_0000_0000_0000_0000_0000_0000_0002));

        let full = "aaaa0000-0000-0000-0000-000000000001";
        assert_eq!(deck.resolve(full).unwrap().id.to_string(), full);
        assert_eq!(
            deck.resolve("BBBB").unwrap().id,
            Uuid::from_u128(0xbbbb_0000_0000_0000_0000_0000_0000_0002)
        );
    }

    #[test]
    fn test_resolve_errors() {
        let mut deck = Deck::default();
        deck.add_card(card_with_id(0xabc1_0000_0000_0000_0000_0000_0000_0000));
        deck.add_card(card_with_id(0xabc2_0000_0000_0000_0000_0000_0000_0000));

        assert!(matches!(deck.resolve("abc"), Err(Error::AmbiguousId(_))));
        assert!(matches!(deck.resolve("ffff"), Err(Error::NotFound(_))));
        assert!(matches!(deck.resolve("  "), Err(Error::NotFound(_))));
        assert!(matches!(
            deck.resolve("abc30000-0000-0000-0000-000000000000"),
            Err(Error::NotFound(_))
        ));
    }
}
