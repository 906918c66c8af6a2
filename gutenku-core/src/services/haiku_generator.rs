//! Haiku generation service
//!
//! Drives the request-time pipeline: optional cache sampling, chapter
//! selection, quote extraction, greedy or genetic verse selection, filter
//! word checks and post-processing. All per-request settings travel in a
//! `GenerationOptions` value; the generator itself holds only collaborators.
//!
//! # Attempt loop
//! - Filter words select chapters containing them; otherwise chapters come
//!   from a rotating pool of random books
//! - The current book is swapped every `max_attempts_in_book` attempts
//! - Control is yielded to the scheduler every `chunk_size` attempts
//! - After `max_attempts` the request fails with `GenerationError::Exhausted`

use super::repositories::{
    BookRepository, ChapterWithBook, HaikuCache, ImageRenderer, RenderedImage, StatsCounter,
    StoredBook,
};
use crate::error::{GenerationError, GenerationResult};
use crate::extractors::QuoteExtractor;
use crate::genetic::{GeneticConfig, GeneticOptimizer};
use crate::language::{FlowMode, LanguageModel};
use crate::selection::VerseSelector;
use crate::types::{BookMetadata, HaikuCandidate, QualityMetrics, Quote, VersePools};
use crate::validators::{QualityScorer, ScoreThresholds};
use async_trait::async_trait;
use chrono::Utc;
use gutenku_common::events::{EventSink, HaikuEvent};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

static EDGE_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^['"“”‘’]|['"“”‘’]$|\.\.\.$|\.$|,$|!$|;$|\?$"#)
        .expect("valid edge punctuation pattern")
});

// ============================================================================
// Options and Results
// ============================================================================

/// Attempt budget of the generation loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorLimits {
    pub max_attempts: usize,
    pub max_attempts_in_book: usize,
    /// Attempts between scheduler yields
    pub chunk_size: usize,
    pub book_pool_size: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            max_attempts: 500,
            max_attempts_in_book: 50,
            chunk_size: 10,
            book_pool_size: 10,
        }
    }
}

/// Per-request generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub thresholds: ScoreThresholds,
    pub use_cache: bool,
    /// Cache is only sampled once it holds this many live entries
    pub min_cached_docs: usize,
    /// `None` keeps cached haikus forever
    pub cache_ttl_secs: Option<u64>,
    pub theme: String,
    pub filter_words: Vec<String>,
    /// Evolve candidates instead of greedy selection
    pub use_genetic: bool,
    pub genetic: GeneticConfig,
    /// Seeds chapter choice and verse selection
    pub seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            thresholds: ScoreThresholds::default(),
            use_cache: false,
            min_cached_docs: 100,
            cache_ttl_secs: None,
            theme: "default".to_string(),
            filter_words: Vec::new(),
            use_genetic: false,
            genetic: GeneticConfig::default(),
            seed: None,
        }
    }
}

impl GenerationOptions {
    /// Require at least one of `words` in the generated verses
    pub fn with_filter<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter_words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        self.filter_words.sort();
        self.filter_words.dedup();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Haiku ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedHaiku {
    pub id: Uuid,
    pub book: BookMetadata,
    pub chapter_index: usize,
    /// Post-processed verses
    pub verses: Vec<String>,
    /// Verses as selected from the chapter
    pub raw_verses: Vec<String>,
    pub source_indices: [usize; 3],
    pub total_quotes: usize,
    pub metrics: QualityMetrics,
    pub execution_time_ms: u64,
    /// Served from the cache rather than generated
    pub cached: bool,
    pub image: Option<RenderedImage>,
}

/// Trim, collapse whitespace, strip edge quotes and trailing punctuation,
/// capitalize
pub fn clean_verses<S: AsRef<str>>(verses: &[S]) -> Vec<String> {
    verses
        .iter()
        .map(|verse| {
            let collapsed = WHITESPACE.replace_all(verse.as_ref().trim(), " ");
            let stripped = EDGE_PUNCTUATION.replace_all(&collapsed, "");
            let mut chars = stripped.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn verses_contain_filter_word(verses: &[String], filter_words: &[String]) -> bool {
    filter_words.is_empty()
        || verses.iter().any(|verse| {
            let lower = verse.to_lowercase();
            filter_words.iter().any(|word| lower.contains(word.as_str()))
        })
}

// ============================================================================
// Generator Contract
// ============================================================================

/// Capability shared by every haiku generator
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a haiku; `Ok(None)` when no source material exists at all
    async fn generate(&self, options: &GenerationOptions) -> GenerationResult<Option<GeneratedHaiku>>;

    /// Attach a rendered card
    async fn append_image(
        &self,
        haiku: GeneratedHaiku,
        options: &GenerationOptions,
    ) -> GenerationResult<GeneratedHaiku>;
}

// ============================================================================
// Haiku Generator
// ============================================================================

/// Collaborators of the generator, wired once at startup
#[derive(Clone)]
pub struct GeneratorDeps {
    pub books: Arc<dyn BookRepository>,
    pub cache: Arc<dyn HaikuCache>,
    pub stats: Arc<dyn StatsCounter>,
    pub renderer: Arc<dyn ImageRenderer>,
    pub events: Arc<dyn EventSink>,
}

/// Haiku generator over a book repository
pub struct HaikuGenerator {
    deps: GeneratorDeps,
    model: Option<Arc<LanguageModel>>,
    extractor: QuoteExtractor,
    limits: GeneratorLimits,
}

/// Where the next chapter comes from
enum ChapterSource {
    Filtered(Vec<ChapterWithBook>),
    BookPool {
        pool: Vec<StoredBook>,
        current: Option<StoredBook>,
    },
}

impl HaikuGenerator {
    pub fn new(deps: GeneratorDeps, model: Option<Arc<LanguageModel>>) -> Self {
        Self {
            deps,
            model,
            extractor: QuoteExtractor::new(),
            limits: GeneratorLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: GeneratorLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_extractor(mut self, extractor: QuoteExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    fn has_model(&self) -> bool {
        self.model.as_ref().is_some_and(|model| !model.is_empty())
    }

    /// Thresholds for this request; flow gates are dropped without a model
    fn effective_thresholds(&self, options: &GenerationOptions) -> ScoreThresholds {
        let mut thresholds = options.thresholds.clone();
        if !self.has_model() && (thresholds.markov > 0.0 || thresholds.trigram > 0.0) {
            warn!("Language model not available - disabling markov validation");
            thresholds.markov = 0.0;
            thresholds.trigram = 0.0;
        }
        thresholds
    }

    async fn next_book(&self, pool: &mut Vec<StoredBook>) -> GenerationResult<Option<StoredBook>> {
        if pool.is_empty() {
            *pool = self
                .deps
                .books
                .select_random_books(self.limits.book_pool_size)
                .await?;
            debug!(books = pool.len(), "Book pool refilled");
        }
        Ok(pool.pop())
    }

    async fn sample_cache(&self, options: &GenerationOptions) -> Option<GeneratedHaiku> {
        let sampled = match options.seed {
            Some(seed) => {
                self.deps
                    .cache
                    .sample_deterministic(seed, options.min_cached_docs)
                    .await
            }
            None => self.deps.cache.sample_one(options.min_cached_docs).await,
        };
        match sampled {
            Ok(hit) => hit.map(|haiku| GeneratedHaiku {
                cached: true,
                ..haiku
            }),
            Err(e) => {
                warn!(error = %e, "Haiku cache read failed, generating fresh");
                None
            }
        }
    }

    fn emit_quotes(&self, request_id: Uuid, quotes: &[Quote]) {
        for quote in quotes {
            self.deps.events.emit(HaikuEvent::QuoteConsidered {
                request_id,
                quote: quote.text.clone(),
                syllables: quote.syllable_count,
                source_index: quote.source_index,
                timestamp: Utc::now(),
            });
        }
    }

    /// One chapter's worth of work: extract, then select or evolve
    fn candidate_from_chapter(
        &self,
        content: &str,
        options: &GenerationOptions,
        thresholds: &ScoreThresholds,
        rng: &mut StdRng,
        request_id: Uuid,
    ) -> (Option<HaikuCandidate>, usize) {
        let outcome = self.extractor.extract(content);
        let quotes = outcome.quotes;
        if quotes.is_empty() {
            return (None, 0);
        }
        self.emit_quotes(request_id, &quotes);

        let candidate = if options.use_genetic {
            let scorer = QualityScorer::new(self.model.clone()).with_flow_mode(FlowMode::Smoothed);
            let optimizer = GeneticOptimizer::new(options.genetic.clone(), scorer);
            let pools = VersePools::from_quotes(&quotes);
            let mut best = None;
            for snapshot in optimizer.run(&pools) {
                self.deps.events.emit(HaikuEvent::EvolutionProgress {
                    request_id,
                    generation: snapshot.generation,
                    max_generations: snapshot.max_generations,
                    best_fitness: snapshot.best_fitness,
                    average_fitness: snapshot.average_fitness,
                    best_verses: snapshot
                        .best
                        .as_ref()
                        .map(HaikuCandidate::verses)
                        .unwrap_or_default(),
                    is_complete: snapshot.is_complete,
                    timestamp: Utc::now(),
                });
                if snapshot.is_complete {
                    best = snapshot.top_candidates.into_iter().next();
                }
            }
            best
        } else {
            let scorer = QualityScorer::new(self.model.clone());
            VerseSelector::new(scorer, thresholds.clone())
                .select(&quotes, rng)
                .candidate
        };
        (candidate, quotes.len())
    }

    async fn generate_fresh(
        &self,
        options: &GenerationOptions,
        request_id: Uuid,
        started: Instant,
    ) -> GenerationResult<Option<GeneratedHaiku>> {
        let thresholds = self.effective_thresholds(options);
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut source = if options.filter_words.is_empty() {
            ChapterSource::BookPool {
                pool: Vec::new(),
                current: None,
            }
        } else {
            let chapters = self.deps.books.filtered_chapters(&options.filter_words).await?;
            info!(
                filter = ?options.filter_words,
                chapters = chapters.len(),
                "Filtered chapters loaded"
            );
            if chapters.is_empty() {
                ChapterSource::BookPool {
                    pool: Vec::new(),
                    current: None,
                }
            } else {
                ChapterSource::Filtered(chapters)
            }
        };

        for attempt in 1..=self.limits.max_attempts {
            let picked = match &mut source {
                ChapterSource::Filtered(chapters) => chapters
                    .choose(&mut rng)
                    .map(|c| (c.book.clone(), c.chapter.clone())),
                ChapterSource::BookPool { pool, current } => {
                    if current.is_none() {
                        *current = self.next_book(pool).await?;
                    }
                    let Some(book) = current.as_ref() else {
                        info!("Library is empty, nothing to generate from");
                        return Ok(None);
                    };
                    let chapter = book.chapters.choose(&mut rng).cloned();
                    let picked = chapter.map(|c| (book.metadata.clone(), c));
                    if attempt % self.limits.max_attempts_in_book.max(1) == 0 || picked.is_none() {
                        *current = None;
                    }
                    picked
                }
            };

            if let Some((book, chapter)) = picked {
                let (candidate, total_quotes) = self.candidate_from_chapter(
                    &chapter.content,
                    options,
                    &thresholds,
                    &mut rng,
                    request_id,
                );

                if let Some(candidate) = candidate {
                    let verses = clean_verses(&candidate.verses);
                    if verses_contain_filter_word(&verses, &options.filter_words) {
                        info!(
                            %request_id,
                            attempt,
                            book = %book.title,
                            chapter = chapter.index,
                            score = candidate.fitness,
                            "Haiku generated"
                        );
                        return Ok(Some(GeneratedHaiku {
                            id: request_id,
                            book,
                            chapter_index: chapter.index,
                            verses,
                            raw_verses: candidate.verses(),
                            source_indices: candidate.source_indices,
                            total_quotes,
                            metrics: candidate.metrics,
                            execution_time_ms: started.elapsed().as_millis() as u64,
                            cached: false,
                            image: None,
                        }));
                    }
                    debug!(attempt, "Candidate lacks filter words");
                }
            }

            if attempt % self.limits.chunk_size.max(1) == 0 {
                tokio::task::yield_now().await;
            }
        }

        warn!(
            %request_id,
            attempts = self.limits.max_attempts,
            filter = ?options.filter_words,
            "Generation exhausted"
        );
        self.deps.events.emit(HaikuEvent::GenerationExhausted {
            request_id,
            attempts: self.limits.max_attempts,
            timestamp: Utc::now(),
        });
        Err(GenerationError::Exhausted {
            attempts: self.limits.max_attempts,
        })
    }

    /// Cache and counter writes; failures are logged, never surfaced
    async fn record(&self, haiku: &GeneratedHaiku, options: &GenerationOptions) {
        if options.use_cache {
            if let Err(e) = self.deps.cache.store(haiku, options.cache_ttl()).await {
                warn!(error = %e, "Failed to cache haiku");
            }
        }
        if let Err(e) = self.deps.stats.increment_haiku_count().await {
            warn!(error = %e, "Failed to increment haiku counter");
        }
    }
}

#[async_trait]
impl Generator for HaikuGenerator {
    async fn generate(&self, options: &GenerationOptions) -> GenerationResult<Option<GeneratedHaiku>> {
        let started = Instant::now();
        let request_id = Uuid::new_v4();

        if options.use_cache {
            if let Some(haiku) = self.sample_cache(options).await {
                debug!(%request_id, "Serving cached haiku");
                self.deps.events.emit(HaikuEvent::HaikuGenerated {
                    request_id,
                    verses: haiku.verses.clone(),
                    book_title: haiku.book.title.clone(),
                    total_score: haiku.metrics.total_score,
                    cache_used: true,
                    timestamp: Utc::now(),
                });
                return Ok(Some(haiku));
            }
        }

        let generated = self.generate_fresh(options, request_id, started).await?;
        if let Some(haiku) = &generated {
            self.record(haiku, options).await;
            self.deps.events.emit(HaikuEvent::HaikuGenerated {
                request_id,
                verses: haiku.verses.clone(),
                book_title: haiku.book.title.clone(),
                total_score: haiku.metrics.total_score,
                cache_used: false,
                timestamp: Utc::now(),
            });
        }
        Ok(generated)
    }

    async fn append_image(
        &self,
        mut haiku: GeneratedHaiku,
        options: &GenerationOptions,
    ) -> GenerationResult<GeneratedHaiku> {
        let image = self.deps.renderer.render(&haiku, &options.theme).await?;
        haiku.image = Some(image);
        Ok(haiku)
    }
}
