//! Narrow repository interfaces consumed by generation
//!
//! Implementations are wired once at startup and shared as trait objects.
//! The in-memory versions back the CLI (persisted as JSON) and the tests.

use crate::error::{GenerationError, GenerationResult};
use crate::types::{BookMetadata, ParsedBook};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::haiku_generator::GeneratedHaiku;

// ============================================================================
// Stored Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChapter {
    pub id: Uuid,
    /// Position among the book's valid chapters
    pub index: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBook {
    pub id: Uuid,
    pub metadata: BookMetadata,
    pub chapters: Vec<StoredChapter>,
}

impl StoredBook {
    pub fn from_parsed(parsed: &ParsedBook) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata: parsed.metadata.clone(),
            chapters: parsed
                .chapters
                .iter()
                .map(|chapter| StoredChapter {
                    id: Uuid::new_v4(),
                    index: chapter.index(),
                    content: chapter.content().to_string(),
                })
                .collect(),
        }
    }
}

/// Chapter together with the book it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterWithBook {
    pub book: BookMetadata,
    pub chapter: StoredChapter,
}

/// Rendered haiku card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

// ============================================================================
// Traits
// ============================================================================

/// Book and chapter lookup
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Up to `count` distinct random books
    async fn select_random_books(&self, count: usize) -> GenerationResult<Vec<StoredBook>>;

    /// Chapters containing any of `words` (case-insensitive, whole word)
    async fn filtered_chapters(&self, words: &[String]) -> GenerationResult<Vec<ChapterWithBook>>;

    async fn find_by_source_id(&self, source_id: i64) -> GenerationResult<Option<StoredBook>>;

    /// Store a parsed book, replacing any book with the same source id
    async fn insert_book(&self, parsed: &ParsedBook) -> GenerationResult<Uuid>;

    async fn count(&self) -> GenerationResult<usize>;
}

/// Haiku cache with TTL and sampling
#[async_trait]
pub trait HaikuCache: Send + Sync {
    async fn store(&self, haiku: &GeneratedHaiku, ttl: Option<Duration>) -> GenerationResult<()>;

    /// One random cached haiku, only once at least `min_cached` are live
    async fn sample_one(&self, min_cached: usize) -> GenerationResult<Option<GeneratedHaiku>>;

    /// Same haiku for the same seed while the cache is unchanged
    async fn sample_deterministic(
        &self,
        seed: u64,
        min_cached: usize,
    ) -> GenerationResult<Option<GeneratedHaiku>>;
}

/// Global counters
#[async_trait]
pub trait StatsCounter: Send + Sync {
    async fn increment_haiku_count(&self) -> GenerationResult<()>;
    async fn haiku_count(&self) -> GenerationResult<u64>;
}

/// Image rendering collaborator
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, haiku: &GeneratedHaiku, theme: &str) -> GenerationResult<RenderedImage>;
}

// ============================================================================
// In-memory Implementations
// ============================================================================

fn contains_word(text: &str, words: &[String]) -> bool {
    crate::nlp::lowercase_words(text)
        .iter()
        .any(|word| words.iter().any(|wanted| wanted.eq_ignore_ascii_case(word)))
}

/// Book library held in memory, optionally persisted as a JSON file
#[derive(Debug, Default)]
pub struct InMemoryBookRepository {
    books: RwLock<Vec<StoredBook>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<StoredBook>) -> Self {
        Self {
            books: RwLock::new(books),
        }
    }

    /// Load a library file; a missing file yields an empty library
    pub async fn load_json(path: &Path) -> GenerationResult<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let books: Vec<StoredBook> = serde_json::from_slice(&bytes)
                    .map_err(|e| GenerationError::Repository(format!("{}: {}", path.display(), e)))?;
                info!(path = %path.display(), books = books.len(), "Library loaded");
                Ok(Self::with_books(books))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No library file, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(GenerationError::Repository(format!("{}: {}", path.display(), e))),
        }
    }

    pub async fn save_json(&self, path: &Path) -> GenerationResult<()> {
        let books = self.books.read().await;
        let bytes = serde_json::to_vec_pretty(&*books)
            .map_err(|e| GenerationError::Repository(e.to_string()))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GenerationError::Repository(e.to_string()))?;
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|e| GenerationError::Repository(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), books = books.len(), "Library saved");
        Ok(())
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn select_random_books(&self, count: usize) -> GenerationResult<Vec<StoredBook>> {
        let books = self.books.read().await;
        Ok(books
            .choose_multiple(&mut rand::thread_rng(), count)
            .cloned()
            .collect())
    }

    async fn filtered_chapters(&self, words: &[String]) -> GenerationResult<Vec<ChapterWithBook>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .flat_map(|book| {
                book.chapters
                    .iter()
                    .filter(|chapter| contains_word(&chapter.content, words))
                    .map(|chapter| ChapterWithBook {
                        book: book.metadata.clone(),
                        chapter: chapter.clone(),
                    })
            })
            .collect())
    }

    async fn find_by_source_id(&self, source_id: i64) -> GenerationResult<Option<StoredBook>> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .find(|book| book.metadata.source_id == source_id)
            .cloned())
    }

    async fn insert_book(&self, parsed: &ParsedBook) -> GenerationResult<Uuid> {
        let stored = StoredBook::from_parsed(parsed);
        let id = stored.id;
        let mut books = self.books.write().await;
        books.retain(|book| book.metadata.source_id != parsed.metadata.source_id);
        books.push(stored);
        Ok(id)
    }

    async fn count(&self) -> GenerationResult<usize> {
        Ok(self.books.read().await.len())
    }
}

#[derive(Debug)]
struct CacheEntry {
    haiku: GeneratedHaiku,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Haiku cache held in memory; expired entries are purged on access
#[derive(Debug, Default)]
pub struct InMemoryHaikuCache {
    entries: Mutex<Vec<CacheEntry>>,
}

impl InMemoryHaikuCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.is_live(now));
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl HaikuCache for InMemoryHaikuCache {
    async fn store(&self, haiku: &GeneratedHaiku, ttl: Option<Duration>) -> GenerationResult<()> {
        let mut entries = self.entries.lock().await;
        entries.push(CacheEntry {
            haiku: haiku.clone(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        });
        Ok(())
    }

    async fn sample_one(&self, min_cached: usize) -> GenerationResult<Option<GeneratedHaiku>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.is_live(now));
        if entries.is_empty() || entries.len() < min_cached {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..entries.len());
        Ok(Some(entries[index].haiku.clone()))
    }

    async fn sample_deterministic(
        &self,
        seed: u64,
        min_cached: usize,
    ) -> GenerationResult<Option<GeneratedHaiku>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|entry| entry.is_live(now));
        if entries.is_empty() || entries.len() < min_cached {
            return Ok(None);
        }
        let index = (seed % entries.len() as u64) as usize;
        Ok(Some(entries[index].haiku.clone()))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStatsCounter {
    haikus: AtomicU64,
}

impl InMemoryStatsCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsCounter for InMemoryStatsCounter {
    async fn increment_haiku_count(&self) -> GenerationResult<()> {
        self.haikus.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn haiku_count(&self) -> GenerationResult<u64> {
        Ok(self.haikus.load(Ordering::Relaxed))
    }
}

/// Renders a haiku as a framed plain-text card
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCardRenderer;

impl TextCardRenderer {
    fn frame_char(theme: &str) -> char {
        match theme {
            "minimal" => ' ',
            "classic" => '*',
            _ => '~',
        }
    }
}

#[async_trait]
impl ImageRenderer for TextCardRenderer {
    async fn render(&self, haiku: &GeneratedHaiku, theme: &str) -> GenerationResult<RenderedImage> {
        let frame = Self::frame_char(theme);
        let attribution = format!("- {}, {}", haiku.book.author, haiku.book.title);
        let width = haiku
            .verses
            .iter()
            .map(|verse| verse.chars().count())
            .chain(std::iter::once(attribution.chars().count()))
            .max()
            .unwrap_or(0)
            + 4;
        let border: String = std::iter::repeat(frame).take(width).collect();

        let mut card = String::new();
        card.push_str(&border);
        card.push('\n');
        for line in haiku.verses.iter().chain(std::iter::once(&attribution)) {
            card.push_str(&format!("{frame} {line:<inner$} {frame}\n", inner = width - 4));
        }
        card.push_str(&border);
        card.push('\n');

        Ok(RenderedImage {
            mime_type: "text/plain".to_string(),
            data: card.into_bytes(),
        })
    }
}
