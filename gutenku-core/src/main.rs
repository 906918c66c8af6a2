//! GutenKu command-line entry point
//!
//! Fetches and parses public-domain books into a local library, trains the
//! language model, and generates haiku from the library.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use gutenku_common::events::{EventBus, EventSink, NullSink};
use gutenku_core::extractors::{GutenbergClient, QuoteExtractor};
use gutenku_core::genetic::GeneticOptimizer;
use gutenku_core::language::{FlowMode, LanguageModel};
use gutenku_core::parsing::{BookParser, ParsingOptions};
use gutenku_core::services::{
    BookRepository, GenerationOptions, Generator, GeneratorDeps, HaikuGenerator,
    InMemoryBookRepository, InMemoryHaikuCache, InMemoryStatsCounter, TextCardRenderer,
};
use gutenku_core::validators::{QualityScorer, ScoreThresholds};
use gutenku_core::{EngineConfig, RawBookText};
use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Event bus capacity for progress printing
const EVENT_BUS_CAPACITY: usize = 1024;

/// Command-line arguments for gutenku
#[derive(Parser, Debug)]
#[command(name = "gutenku")]
#[command(about = "Haiku from public-domain books")]
#[command(version)]
struct Args {
    /// Config file (overrides GUTENKU_CONFIG and the platform default)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data folder holding the model and library
    #[arg(long, global = true, env = "GUTENKU_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download books, parse them and add valid ones to the library
    Fetch {
        /// Gutenberg book ids
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Fail instead of reporting books with too few chapters
        #[arg(long)]
        strict: bool,
    },

    /// Parse a local text file and report segmentation results
    Parse {
        file: PathBuf,

        /// Source id recorded for the book
        #[arg(long, default_value_t = 1)]
        id: i64,

        /// Add the book to the library when valid
        #[arg(long)]
        store: bool,
    },

    /// Train the language model on the library (and any extra files)
    Train {
        /// Additional plain-text files
        files: Vec<PathBuf>,

        /// Start from an empty model instead of extending the saved one
        #[arg(long)]
        fresh: bool,
    },

    /// Generate one haiku
    Generate {
        /// Words at least one verse must contain
        #[arg(short, long, value_delimiter = ',')]
        filter: Vec<String>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Evolve candidates instead of greedy selection
        #[arg(long)]
        genetic: bool,

        /// Disable every score gate
        #[arg(long)]
        no_gates: bool,

        /// Render a text card
        #[arg(long)]
        card: bool,

        /// Print JSON instead of plain verses
        #[arg(long)]
        json: bool,

        /// Print progress events to stderr
        #[arg(long)]
        events: bool,
    },

    /// Run the genetic optimizer on one chapter, printing each generation
    Evolve {
        /// Library book by source id (random when omitted)
        #[arg(long)]
        book: Option<i64>,

        /// Chapter position within the book (random when omitted)
        #[arg(long)]
        chapter: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data_dir) = args.data_dir.clone() {
        config.storage.data_dir = Some(data_dir);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(data_dir = %config.data_dir().display(), "Starting GutenKu");

    match args.command {
        Command::Fetch { ids, strict } => fetch(&config, &ids, strict).await,
        Command::Parse { file, id, store } => parse(&config, file, id, store).await,
        Command::Train { files, fresh } => train(&config, &files, fresh).await,
        Command::Generate {
            filter,
            seed,
            genetic,
            no_gates,
            card,
            json,
            events,
        } => {
            let mut options = GenerationOptions {
                thresholds: if no_gates {
                    ScoreThresholds::disabled()
                } else {
                    config.thresholds.clone()
                },
                use_genetic: genetic,
                genetic: config.genetic.clone(),
                seed,
                ..Default::default()
            }
            .with_filter(filter);
            if let Some(seed) = seed {
                options.genetic.seed = Some(seed);
            }
            generate(&config, options, card, json, events).await
        }
        Command::Evolve {
            book,
            chapter,
            seed,
        } => evolve(&config, book, chapter, seed).await,
    }
}

async fn load_model(config: &EngineConfig) -> Option<Arc<LanguageModel>> {
    let path = config.model_path();
    match LanguageModel::load(&path).await {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Language model unavailable, flow scoring disabled");
            None
        }
    }
}

fn parser(config: &EngineConfig, strict: bool) -> BookParser {
    BookParser::new(ParsingOptions {
        validation: config.validation.clone(),
        fail_on_invalid_book: strict,
    })
}

async fn fetch(config: &EngineConfig, ids: &[i64], strict: bool) -> Result<()> {
    let client = GutenbergClient::with_base_url(&config.fetch.base_url, config.fetch.retry.clone())
        .context("Failed to build HTTP client")?;
    let parser = parser(config, strict);
    let library_path = config.library_path();
    let library = InMemoryBookRepository::load_json(&library_path)
        .await
        .context("Failed to load library")?;

    let mut added = 0usize;
    for &id in ids {
        let raw = match client.fetch_book(id).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(book_id = id, error = %e, "Skipping book");
                continue;
            }
        };
        let result = match parser.parse(&raw) {
            Ok(result) => result,
            Err(e) if strict => return Err(e).with_context(|| format!("Book {id} is invalid")),
            Err(e) => {
                warn!(book_id = id, error = %e, "Skipping book");
                continue;
            }
        };
        for error in &result.errors {
            warn!(book_id = id, error = %error, "Parse problem");
        }
        if let Some(book) = result.parsed_book {
            library.insert_book(&book).await?;
            println!(
                "{id}: {} by {} ({} chapters, pattern {})",
                book.metadata.title,
                book.metadata.author,
                book.chapters.len(),
                result.pattern_used.unwrap_or("none")
            );
            added += 1;
        }
    }

    library.save_json(&library_path).await?;
    info!(added, requested = ids.len(), "Fetch finished");
    Ok(())
}

async fn parse(config: &EngineConfig, file: PathBuf, id: i64, store: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let raw = RawBookText::new(text, id).context("Invalid book text")?;
    let result = parser(config, false).parse(&raw)?;

    println!("pattern:  {}", result.pattern_used.unwrap_or("none"));
    println!("segments: {}", result.stats.raw_segments);
    println!("valid:    {}", result.stats.valid_chapters);
    println!("rejected: {}", result.stats.rejected_chapters);
    for warning in &result.warnings {
        println!("warning:  {warning}");
    }
    for error in &result.errors {
        println!("error:    {error}");
    }

    if store {
        let Some(book) = result.parsed_book else {
            bail!("Book is not valid, not stored");
        };
        let library_path = config.library_path();
        let library = InMemoryBookRepository::load_json(&library_path).await?;
        library.insert_book(&book).await?;
        library.save_json(&library_path).await?;
        println!("stored:   {} by {}", book.metadata.title, book.metadata.author);
    }
    Ok(())
}

async fn train(config: &EngineConfig, files: &[PathBuf], fresh: bool) -> Result<()> {
    let model_path = config.model_path();
    let mut model = LanguageModel::new();
    if !fresh && model_path.exists() {
        model
            .ensure_loaded(&model_path)
            .await
            .context("Failed to load existing model")?;
    }

    let library = InMemoryBookRepository::load_json(&config.library_path()).await?;
    let books = library.select_random_books(usize::MAX).await?;
    for book in &books {
        for chapter in &book.chapters {
            model.train(&chapter.content);
        }
        info!(book = %book.metadata.title, "Trained on book");
    }
    for file in files {
        let text = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        model.train(&text);
        info!(file = %file.display(), "Trained on file");
    }

    if model.is_empty() {
        bail!("Nothing to train on: the library is empty and no files were given");
    }
    model.save(&model_path).await.context("Failed to save model")?;
    println!(
        "model: {} words, {} bigrams, {} trigrams -> {}",
        model.vocabulary_size(),
        model.total_bigrams(),
        model.total_trigrams(),
        model_path.display()
    );
    Ok(())
}

fn print_events(bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Ok(line) = serde_json::to_string(&event) {
                        eprintln!("{line}");
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    eprintln!("... {skipped} events skipped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Waits for the event printer; returns false if the task panicked or was cancelled
async fn finish_printer(printer: tokio::task::JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Event printer task failed");
            false
        }
    }
}

async fn generate(
    config: &EngineConfig,
    options: GenerationOptions,
    card: bool,
    json: bool,
    show_events: bool,
) -> Result<()> {
    let library = InMemoryBookRepository::load_json(&config.library_path()).await?;
    let bus = EventBus::new(EVENT_BUS_CAPACITY);
    let printer = show_events.then(|| print_events(&bus));
    let events: Arc<dyn EventSink> = if show_events {
        Arc::new(bus.clone())
    } else {
        Arc::new(NullSink)
    };

    let deps = GeneratorDeps {
        books: Arc::new(library),
        cache: Arc::new(InMemoryHaikuCache::new()),
        stats: Arc::new(InMemoryStatsCounter::new()),
        renderer: Arc::new(TextCardRenderer),
        events,
    };
    let generator =
        HaikuGenerator::new(deps, load_model(config).await).with_limits(config.generator.clone());

    let outcome = match generator.generate(&options).await {
        Ok(Some(haiku)) if card => generator.append_image(haiku, &options).await.map(Some),
        other => other,
    };
    drop(generator);
    drop(bus);
    if let Some(printer) = printer {
        finish_printer(printer).await;
    }

    let haiku = match outcome {
        Ok(Some(haiku)) => haiku,
        Ok(None) => bail!("The library is empty; run `gutenku fetch <ids>` first"),
        Err(e) => {
            eprintln!("{}: {e}", e.code());
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&haiku)?);
    } else if let Some(image) = &haiku.image {
        print!("{}", String::from_utf8_lossy(&image.data));
    } else {
        for verse in &haiku.verses {
            println!("{verse}");
        }
        println!("  - {}, {}", haiku.book.author, haiku.book.title);
    }
    Ok(())
}

async fn evolve(
    config: &EngineConfig,
    book_id: Option<i64>,
    chapter_index: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let library = InMemoryBookRepository::load_json(&config.library_path()).await?;
    let book = match book_id {
        Some(id) => library
            .find_by_source_id(id)
            .await?
            .with_context(|| format!("Book {id} is not in the library"))?,
        None => library
            .select_random_books(1)
            .await?
            .pop()
            .context("The library is empty; run `gutenku fetch <ids>` first")?,
    };
    let chapter = match chapter_index {
        Some(index) => book
            .chapters
            .iter()
            .find(|c| c.index == index)
            .with_context(|| format!("Chapter {index} not found"))?,
        None => book
            .chapters
            .choose(&mut rand::thread_rng())
            .context("Book has no chapters")?,
    };

    let pools = QuoteExtractor::new().extract(&chapter.content).pools();
    println!(
        "{} / chapter {}: {} five-syllable, {} seven-syllable quotes",
        book.metadata.title,
        chapter.index,
        pools.five_syllable.len(),
        pools.seven_syllable.len()
    );

    let mut genetic = config.genetic.clone();
    if seed.is_some() {
        genetic.seed = seed;
    }
    let scorer = QualityScorer::new(load_model(config).await).with_flow_mode(FlowMode::Smoothed);
    let optimizer = GeneticOptimizer::new(genetic, scorer);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, stopping after this generation");
            ctrl_c.cancel();
        }
    });

    let stream = optimizer.evolve_stream(&pools, cancel);
    futures::pin_mut!(stream);
    while let Some(snapshot) = stream.next().await {
        let best = snapshot
            .best
            .as_ref()
            .map(|c| c.verses.join(" / "))
            .unwrap_or_default();
        println!(
            "gen {:>4}  best {:>7.3}  avg {:>7.3}  div {:.2}  {}",
            snapshot.generation, snapshot.best_fitness, snapshot.average_fitness, snapshot.diversity, best
        );
        if snapshot.is_complete {
            let reason = snapshot
                .stop_reason
                .map(|r| r.to_string())
                .unwrap_or_default();
            println!("stopped: {reason} after {} evaluations", snapshot.evaluations);
            for (rank, candidate) in snapshot.top_candidates.iter().enumerate() {
                println!("#{} ({:.3})", rank + 1, candidate.fitness);
                for verse in &candidate.verses {
                    println!("    {verse}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_printer_ends_when_bus_drops() {
        let bus = EventBus::new(8);
        let printer = print_events(&bus);
        drop(bus);
        assert!(finish_printer(printer).await);
    }

    #[tokio::test]
    async fn test_failed_printer_is_reported() {
        let printer = tokio::spawn(async { panic!("printer crashed") });
        assert!(!finish_printer(printer).await);
    }
}
