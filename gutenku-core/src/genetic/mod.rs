//! Genetic search over verse pools
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Evolution Loop              │
//! ├─────────────────────────────────────┤
//! │  Selection │ Crossover │ Mutation   │
//! ├─────────────────────────────────────┤
//! │   Fitness (QualityScorer + cache)   │
//! ├─────────────────────────────────────┤
//! │   Genome → [five, seven, five]      │
//! └─────────────────────────────────────┘
//! ```

pub mod chromosome;
pub mod config;
pub mod operators;
pub mod optimizer;
pub mod population;

pub use chromosome::{Chromosome, GeneBounds};
pub use config::{CrossoverOperator, GeneticConfig, MutationOperator, SelectionMethod};
pub use optimizer::{
    EvolutionProgress, EvolutionRun, GeneticOptimizer, StopReason, MIN_FIVE_SYLLABLE_POOL,
    MIN_SEVEN_SYLLABLE_POOL,
};
pub use population::Individual;
