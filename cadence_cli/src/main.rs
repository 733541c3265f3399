use cadence_core::*;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Spaced-repetition flashcard review scheduler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this RFC 3339 instant as the current time
    #[arg(long, global = true, value_parser = parse_timestamp)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a flashcard
    Add {
        /// Prompt side
        #[arg(long)]
        front: String,

        /// Answer side
        #[arg(long)]
        back: String,

        /// Where the card came from (manual, quiz_miss, concept)
        #[arg(long, default_value = "manual", value_parser = parse_source)]
        source: CardSource,

        /// Concept the card belongs to
        #[arg(long)]
        concept: Option<String>,
    },

    /// List every card by due date
    List,

    /// Show the cards due for review (default)
    Due,

    /// Record how well a card was recalled
    Review {
        /// Card id or unique id prefix
        card: String,

        /// 0-5, or again / hard / good / easy
        #[arg(allow_hyphen_values = true, value_parser = parse_score)]
        score: f64,

        /// Reviewer id for the review log
        #[arg(long)]
        reviewer: Option<String>,
    },

    /// Show review history, for one card or all of them
    History {
        /// Card id or unique id prefix
        card: Option<String>,
    },

    /// Archive the review log to CSV
    Rollup {
        /// Remove retired log files after the rollup
        #[arg(long)]
        cleanup: bool,
    },
}

/// File layout under the data directory
struct DataPaths {
    deck: PathBuf,
    log_dir: PathBuf,
    log: PathBuf,
    archive: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let log_dir = data_dir.join("log");
        Self {
            deck: data_dir.join("deck.json"),
            log: log_dir.join("reviews.jsonl"),
            log_dir,
            archive: data_dir.join("reviews.csv"),
        }
    }
}

fn main() -> Result<()> {
    cadence_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);
    tracing::debug!("Using data directory {:?}", data_dir);

    // The only place the wall clock is consulted
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command.unwrap_or(Commands::Due) {
        Commands::Add {
            front,
            back,
            source,
            concept,
        } => cmd_add(&paths, &config, front, back, source, concept, now),
        Commands::List => cmd_list(&paths, &config, now),
        Commands::Due => cmd_due(&paths, &config, now),
        Commands::Review {
            card,
            score,
            reviewer,
        } => {
            let reviewer = reviewer.unwrap_or_else(|| config.review.reviewer.clone());
            cmd_review(&paths, &card, score, reviewer, now)
        }
        Commands::History { card } => cmd_history(&paths, card.as_deref()),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

fn cmd_add(
    paths: &DataPaths,
    config: &Config,
    front: String,
    back: String,
    source: CardSource,
    concept: Option<String>,
    now: DateTime<Utc>,
) -> Result<()> {
    if front.trim().is_empty() || back.trim().is_empty() {
        return Err(Error::Other("front and back must not be empty".into()));
    }

    let mut card = Flashcard::new(front, back, source, now, config.cards.initial_ease_factor);
    card.concept_title = concept;

    let card = Deck::update(&paths.deck, |deck| Ok(deck.add_card(card).clone()))?;

    println!("✓ Added card {}", card.id);
    println!("  Front: {}", card.front);
    println!("  Due:   {}", format_when(card.review.next_review_at));
    Ok(())
}

fn cmd_list(paths: &DataPaths, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let deck = Deck::load(&paths.deck)?;
    let cards = upcoming(&deck, config.queue.list_limit);

    println!("Queue ({})", deck.len());
    for card in cards {
        let marker = if card.review.is_due(now) { "*" } else { " " };
        println!(
            "{} {}  due {}  interval {}d  ease {:.2}  {}",
            marker,
            short_id(card),
            format_when(card.review.next_review_at),
            card.review.interval_days,
            card.review.ease_factor,
            card.front
        );
    }
    Ok(())
}

fn cmd_due(paths: &DataPaths, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let deck = Deck::load(&paths.deck)?;
    let summary = queue_summary(&deck, now);
    let due = due_cards(&deck, now, config.queue.due_limit);

    if due.is_empty() {
        println!("No cards due right now.");
        if let Some(next) = summary.next_due_at {
            println!("  Next card due {}", format_when(next));
        }
        return Ok(());
    }

    println!("Due now ({})", summary.due_now);
    for card in due {
        println!("  {}  {}", short_id(card), card.front);
        if let Some(concept) = &card.concept_title {
            println!("            concept: {}", concept);
        }
    }
    Ok(())
}

fn cmd_review(
    paths: &DataPaths,
    card: &str,
    score: f64,
    reviewer: String,
    now: DateTime<Utc>,
) -> Result<()> {
    let flashcard_id = Deck::load(&paths.deck)?.resolve(card)?.id;

    let request = ReviewRequest {
        flashcard_id,
        reviewer_id: reviewer,
        recall_score: score,
    };
    let mut log = JsonlReviewLog::new(&paths.log);
    let outcome = submit_review(&paths.deck, &mut log, &request, now)?;

    let review = &outcome.flashcard.review;
    println!(
        "✓ Review saved. Next due: {}",
        format_when(review.next_review_at)
    );
    println!(
        "  Interval {}d, ease {:.2}, streak {}",
        review.interval_days, review.ease_factor, review.repetition_count
    );
    if outcome.schedule.is_lapse() {
        println!("  Lapse - streak reset");
    }
    Ok(())
}

fn cmd_history(paths: &DataPaths, card: Option<&str>) -> Result<()> {
    let flashcard_id = match card {
        Some(card) => Some(Deck::load(&paths.deck)?.resolve(card)?.id),
        None => None,
    };

    let entries = load_review_history(&paths.log, &paths.archive, flashcard_id)?;
    if entries.is_empty() {
        println!("No reviews recorded yet.");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "  {}  card {}  score {}  -> {}d, next {}",
            format_when(entry.reviewed_at),
            &entry.flashcard_id.to_string()[..8],
            entry.recall_score,
            entry.interval_days,
            format_when(entry.next_review_at)
        );
    }

    let summary = summarize(&entries);
    println!();
    println!(
        "{} reviews, {} lapses, mean score {:.2}",
        summary.total,
        summary.lapses,
        summary.mean_score.unwrap_or_default()
    );
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if paths.log.exists() {
        let count = cadence_core::archive::log_to_csv_and_archive(&paths.log, &paths.archive)?;
        println!("✓ Archived {} reviews to CSV", count);
        println!("  CSV: {}", paths.archive.display());
    } else {
        println!("No review log found - nothing to roll up.");
    }

    if cleanup {
        let cleaned = cadence_core::archive::cleanup_processed_logs(&paths.log_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed review logs", cleaned);
        }
    }

    Ok(())
}

fn short_id(card: &Flashcard) -> String {
    card.id.to_string()[..8].to_string()
}

fn format_when(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn parse_source(s: &str) -> std::result::Result<CardSource, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_score(s: &str) -> std::result::Result<f64, String> {
    parse_recall_score(s).map_err(|e| e.to_string())
}
