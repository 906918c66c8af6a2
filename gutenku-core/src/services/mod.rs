//! Request-time services and their collaborators

pub mod haiku_generator;
pub mod repositories;

pub use haiku_generator::{
    clean_verses, GeneratedHaiku, GenerationOptions, Generator, GeneratorDeps, GeneratorLimits,
    HaikuGenerator,
};
pub use repositories::{
    BookRepository, ChapterWithBook, HaikuCache, ImageRenderer, InMemoryBookRepository,
    InMemoryHaikuCache, InMemoryStatsCounter, RenderedImage, StatsCounter, StoredBook,
    StoredChapter, TextCardRenderer,
};
