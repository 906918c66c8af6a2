//! Error types for gutenku-core
//!
//! Faults are split by concern so callers can tell expected outcomes apart
//! from genuine failures:
//! - [`FetchError`]: retrieving source text (retryable unless client-side)
//! - [`ParseError`]: metadata and insufficient-chapter faults
//! - [`ModelError`]: language model persistence
//! - [`GenerationError`]: generation exhaustion plus collaborator faults
//! - [`ValidationError`]: domain value constructors

use thiserror::Error;

/// Stable identifier surfaced when generation runs out of attempts
pub const GENERATION_EXHAUSTED_CODE: &str = "GENERATION_EXHAUSTED";

/// Domain value rejected at construction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Book content is empty")]
    EmptyContent,

    #[error("Invalid source id: {0} (must be positive)")]
    InvalidSourceId(i64),

    #[error("Chapter content too short: {length} chars (minimum {minimum})")]
    ChapterTooShort { length: usize, minimum: usize },
}

/// Failure retrieving source text over the network
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success HTTP status
    #[error("HTTP {status} fetching book {book_id}")]
    Status { book_id: i64, status: u16 },

    /// Attempt exceeded its timeout
    #[error("Timed out fetching book {book_id}")]
    Timeout { book_id: i64 },

    /// Connection or protocol failure
    #[error("Network error fetching book {book_id}: {message}")]
    Network { book_id: i64, message: String },

    /// Response arrived but could not become a RawBookText
    #[error("Invalid content for book {book_id}: {source}")]
    InvalidContent {
        book_id: i64,
        #[source]
        source: ValidationError,
    },
}

impl FetchError {
    /// Client-side (4xx-class) and content failures are never retried
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => !(400..500).contains(status),
            FetchError::Timeout { .. } | FetchError::Network { .. } => true,
            FetchError::InvalidContent { .. } => false,
        }
    }
}

/// Book parsing fault
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Failed to extract {field} from book {book_id}")]
    Metadata { field: &'static str, book_id: i64 },

    #[error("Insufficient chapters: found {found}, required {required}")]
    InsufficientChapters { found: usize, required: usize },
}

/// Language model persistence fault
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed model file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model file is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Haiku generation fault
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Every attempt failed structure or score gates.
    ///
    /// Has no partial result; callers should try another source or relax filters.
    #[error("Generation exhausted after {attempts} attempts; try a different source or relax filters")]
    Exhausted { attempts: usize },

    /// Cache collaborator failure (non-fatal inside generation)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Book/chapter repository failure
    #[error("Repository error: {0}")]
    Repository(String),

    /// Image rendering collaborator failure
    #[error("Render error: {0}")]
    Render(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl GenerationError {
    /// Stable machine-readable identifier for presentation layers
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::Exhausted { .. } => GENERATION_EXHAUSTED_CODE,
            GenerationError::Cache(_) => "CACHE_ERROR",
            GenerationError::Repository(_) => "REPOSITORY_ERROR",
            GenerationError::Render(_) => "RENDER_ERROR",
            GenerationError::Model(_) => "MODEL_ERROR",
        }
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
