//! Integration tests for the book-to-haiku pipeline
//!
//! Parses a synthetic book, extracts quotes, and generates through both the
//! greedy selector and the genetic optimizer.

use std::sync::Arc;

use gutenku_common::events::{EventBus, EventSink, HaikuEvent, NullSink};
use gutenku_core::extractors::{ExtractionTier, QuoteExtractor};
use gutenku_core::genetic::GeneticConfig;
use gutenku_core::nlp::count_syllables;
use gutenku_core::parsing::{BookParser, ParsingOptions, ValidationConfig};
use gutenku_core::selection::{VerseSelector, HAIKU_PATTERN};
use gutenku_core::services::{
    BookRepository, GenerationOptions, Generator, GeneratorDeps, GeneratorLimits, HaikuGenerator,
    InMemoryBookRepository, InMemoryHaikuCache, InMemoryStatsCounter, StatsCounter,
    TextCardRenderer,
};
use gutenku_core::validators::{QualityScorer, ScoreThresholds};
use gutenku_core::{GenerationError, ParsedBook, RawBookText, GENERATION_EXHAUSTED_CODE};
use rand::rngs::StdRng;
use rand::SeedableRng;

const PARAGRAPH: &str = "The cold wind blows hard, the moon rose on the still lake. \
    Soft rain falls on grass; birds sing through the long dark night! \
    Stars shine on the sea, deep snow lies on the high hill.";

/// Test helper: header plus `chapters` chapters of four paragraphs
fn book_text(chapters: usize) -> String {
    let mut text = String::from("Title: The Quiet Pond\nAuthor: A. Writer\n\n");
    for c in 1..=chapters {
        text.push_str(&format!("\n\nCHAPTER {c}\n\n"));
        text.push_str(&[PARAGRAPH; 4].join("\n\n"));
    }
    text
}

fn parse_book(chapters: usize) -> ParsedBook {
    let options = ParsingOptions {
        validation: ValidationConfig {
            min_paragraphs: 3,
            min_chapters: 2,
            exclude_boilerplate: true,
        },
        fail_on_invalid_book: false,
    };
    let raw = RawBookText::new(book_text(chapters), 1234).unwrap();
    BookParser::new(options)
        .parse(&raw)
        .unwrap()
        .parsed_book
        .expect("synthetic book should be valid")
}

struct Harness {
    generator: HaikuGenerator,
    stats: Arc<InMemoryStatsCounter>,
}

/// Test helper: generator over a library holding one parsed book
async fn harness(events: Arc<dyn EventSink>, books: &[ParsedBook]) -> Harness {
    let library = InMemoryBookRepository::new();
    for book in books {
        library.insert_book(book).await.unwrap();
    }
    let stats = Arc::new(InMemoryStatsCounter::new());
    let deps = GeneratorDeps {
        books: Arc::new(library),
        cache: Arc::new(InMemoryHaikuCache::new()),
        stats: stats.clone(),
        renderer: Arc::new(TextCardRenderer),
        events,
    };
    Harness {
        generator: HaikuGenerator::new(deps, None),
        stats,
    }
}

fn open_options(seed: u64) -> GenerationOptions {
    GenerationOptions {
        thresholds: ScoreThresholds::disabled(),
        ..Default::default()
    }
    .with_seed(seed)
}

#[test]
fn test_book_to_haiku_by_selection() {
    let book = parse_book(3);
    assert_eq!(book.chapters.len(), 3);
    assert_eq!(book.metadata.source_id, 1234);

    let outcome = QuoteExtractor::new().extract(book.chapters[0].content());
    assert_eq!(outcome.tier, Some(ExtractionTier::Punctuation));
    assert_eq!(outcome.quotes.len(), 24);

    let selector = VerseSelector::new(QualityScorer::new(None), ScoreThresholds::disabled());
    let mut rng = StdRng::seed_from_u64(11);
    let selected = selector.select(&outcome.quotes, &mut rng);

    assert!(selected.is_success());
    let candidate = selected.candidate.unwrap();
    assert!(candidate.source_indices.windows(2).all(|w| w[0] < w[1]));
    for (verse, expected) in candidate.verses.iter().zip(HAIKU_PATTERN) {
        assert_eq!(count_syllables(verse), expected, "verse {verse:?}");
    }
    assert!(candidate.metrics.total_score.is_finite());
}

#[tokio::test]
async fn test_generator_serves_from_library() {
    let h = harness(Arc::new(NullSink), &[parse_book(3)]).await;

    let haiku = h.generator.generate(&open_options(5)).await.unwrap().unwrap();

    assert_eq!(haiku.book.title, "The Quiet Pond");
    assert_eq!(haiku.book.author, "A. Writer");
    assert_eq!(haiku.verses.len(), 3);
    assert!(haiku
        .verses
        .iter()
        .all(|v| v.chars().next().is_some_and(char::is_uppercase)));
    assert!(!haiku.cached);
    assert_eq!(haiku.total_quotes, 24);
    assert_eq!(h.stats.haiku_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_same_seed_same_haiku() {
    let h = harness(Arc::new(NullSink), &[parse_book(3)]).await;

    let first = h.generator.generate(&open_options(99)).await.unwrap().unwrap();
    let second = h.generator.generate(&open_options(99)).await.unwrap().unwrap();

    assert_eq!(first.verses, second.verses);
    assert_eq!(first.chapter_index, second.chapter_index);
}

#[tokio::test]
async fn test_filter_word_appears_in_verses() {
    let h = harness(Arc::new(NullSink), &[parse_book(3)]).await;
    let options = open_options(3).with_filter(["Snow"]);

    let haiku = h.generator.generate(&options).await.unwrap().unwrap();

    assert!(haiku.verses.iter().any(|v| v.to_lowercase().contains("snow")));
}

#[tokio::test]
async fn test_unmatched_filter_exhausts() {
    let h = harness(Arc::new(NullSink), &[parse_book(3)]).await;
    let generator = h.generator.with_limits(GeneratorLimits {
        max_attempts: 6,
        ..Default::default()
    });
    let options = open_options(1).with_filter(["zebra"]);

    let err = generator.generate(&options).await.unwrap_err();

    assert!(matches!(err, GenerationError::Exhausted { attempts: 6 }));
    assert_eq!(err.code(), GENERATION_EXHAUSTED_CODE);
}

#[tokio::test]
async fn test_empty_library_yields_none() {
    let h = harness(Arc::new(NullSink), &[]).await;
    assert!(h.generator.generate(&open_options(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_events_reach_subscribers() {
    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let h = harness(Arc::new(bus.clone()), &[parse_book(3)]).await;

    let haiku = h.generator.generate(&open_options(8)).await.unwrap().unwrap();

    let mut considered = 0;
    let mut generated = None;
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.request_id(), haiku.id);
        match event {
            HaikuEvent::QuoteConsidered { .. } => considered += 1,
            HaikuEvent::HaikuGenerated {
                verses, cache_used, ..
            } => generated = Some((verses, cache_used)),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert!(considered >= 24);
    assert_eq!(generated, Some((haiku.verses.clone(), false)));
}

#[tokio::test]
async fn test_genetic_generation_reports_progress() {
    let bus = EventBus::new(4096);
    let mut rx = bus.subscribe();
    let h = harness(Arc::new(bus.clone()), &[parse_book(2)]).await;
    let options = GenerationOptions {
        use_genetic: true,
        genetic: GeneticConfig {
            population_size: 20,
            elite_count: 2,
            max_generations: 8,
            seed: Some(3),
            ..Default::default()
        },
        ..open_options(3)
    };

    let haiku = h.generator.generate(&options).await.unwrap().unwrap();
    assert_eq!(haiku.verses.len(), 3);

    let mut generations = Vec::new();
    let mut completed = false;
    while let Ok(event) = rx.try_recv() {
        if let HaikuEvent::EvolutionProgress {
            generation,
            is_complete,
            ..
        } = event
        {
            generations.push(generation);
            completed |= is_complete;
        }
    }
    assert!(!generations.is_empty());
    assert!(generations.len() <= 8);
    assert!(completed);
}

#[tokio::test]
async fn test_card_attached_on_request() {
    let h = harness(Arc::new(NullSink), &[parse_book(3)]).await;
    let options = open_options(4);

    let haiku = h.generator.generate(&options).await.unwrap().unwrap();
    let haiku = h.generator.append_image(haiku, &options).await.unwrap();

    let image = haiku.image.expect("card rendered");
    assert_eq!(image.mime_type, "text/plain");
    let card = String::from_utf8(image.data).unwrap();
    for verse in &haiku.verses {
        assert!(card.contains(verse.as_str()));
    }
}
