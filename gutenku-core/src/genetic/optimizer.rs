//! Genetic Optimizer
//!
//! Evolves index triples over the five/seven/five verse pools, using the
//! quality scorer as fitness. Unlike greedy selection, genomes may reference
//! quotes in any source order.
//!
//! # Run loop
//! ```text
//! Initialize ─► Evaluate ─► Select ─► Crossover/Mutate ─► Elitism ─┐
//!                  ▲                                               │
//!                  └──────────── not converged ◄───────────────────┘
//! ```
//! One `EvolutionProgress` snapshot is produced per generation. The run stops
//! on a fitness plateau, the generation cap, the evaluation budget, the time
//! limit or cancellation; cancellation is observed between generations only.
//!
//! Pools too small to evolve over are sampled instead, producing a single
//! terminal snapshot.

use super::chromosome::{Chromosome, GeneBounds};
use super::config::GeneticConfig;
use super::operators::{crossover, mutate, select_parent};
use super::population::{average_fitness, diversity, sort_by_fitness, top_candidates, Individual};
use crate::types::{HaikuCandidate, VersePools};
use crate::validators::QualityScorer;
use futures::Stream;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Below this many five-syllable quotes the optimizer samples instead
pub const MIN_FIVE_SYLLABLE_POOL: usize = 5;
/// Below this many seven-syllable quotes the optimizer samples instead
pub const MIN_SEVEN_SYLLABLE_POOL: usize = 4;

/// Draws allowed per requested sample before giving up on distinctness
const SAMPLE_ATTEMPTS_PER_CANDIDATE: usize = 20;

/// Why a run finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    MaxGenerations,
    EvaluationBudget,
    TimeLimit,
    Cancelled,
    /// Pools were too small to evolve; candidates were sampled
    Sampled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::Converged => "converged",
            StopReason::MaxGenerations => "max_generations",
            StopReason::EvaluationBudget => "evaluation_budget",
            StopReason::TimeLimit => "time_limit",
            StopReason::Cancelled => "cancelled",
            StopReason::Sampled => "sampled",
        };
        f.write_str(name)
    }
}

/// Per-generation snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionProgress {
    /// 1-based generation index (0 for sampled runs)
    pub generation: usize,
    pub max_generations: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    /// Unique genomes over population size
    pub diversity: f64,
    pub best: Option<HaikuCandidate>,
    pub evaluations: usize,
    pub is_complete: bool,
    pub stop_reason: Option<StopReason>,
    /// Ranked results; filled on the terminal snapshot only
    pub top_candidates: Vec<HaikuCandidate>,
}

/// Genetic Optimizer
#[derive(Debug, Clone)]
pub struct GeneticOptimizer {
    config: GeneticConfig,
    scorer: QualityScorer,
}

impl GeneticOptimizer {
    pub fn new(config: GeneticConfig, scorer: QualityScorer) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Start a run over `pools`
    pub fn run(&self, pools: &VersePools) -> EvolutionRun {
        self.run_with_cancel(pools, CancellationToken::new())
    }

    pub fn run_with_cancel(&self, pools: &VersePools, cancel: CancellationToken) -> EvolutionRun {
        EvolutionRun::new(self.config.clone(), self.scorer.clone(), pools.clone(), cancel)
    }

    /// Run to completion and return the ranked top candidates
    pub fn evolve(&self, pools: &VersePools) -> Vec<HaikuCandidate> {
        self.run(pools)
            .last()
            .map(|snapshot| snapshot.top_candidates)
            .unwrap_or_default()
    }

    /// Progressive variant: one snapshot per generation, yielding to the
    /// scheduler between generations
    pub fn evolve_stream(
        &self,
        pools: &VersePools,
        cancel: CancellationToken,
    ) -> impl Stream<Item = EvolutionProgress> + Send + 'static {
        let run = self.run_with_cancel(pools, cancel);
        async_stream::stream! {
            for snapshot in run {
                yield snapshot;
                tokio::task::yield_now().await;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Evolve,
    Sample,
}

/// An in-flight optimization; iterate it to advance one generation at a time
pub struct EvolutionRun {
    config: GeneticConfig,
    scorer: QualityScorer,
    pools: VersePools,
    bounds: GeneBounds,
    cancel: CancellationToken,
    rng: StdRng,
    mode: RunMode,
    population: Vec<Individual>,
    cache: HashMap<Chromosome, HaikuCandidate>,
    best_history: Vec<f64>,
    generation: usize,
    evaluations: usize,
    started: Instant,
    finished: bool,
}

impl EvolutionRun {
    fn new(
        config: GeneticConfig,
        scorer: QualityScorer,
        pools: VersePools,
        cancel: CancellationToken,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let bounds = GeneBounds::of(&pools);
        let mode = if bounds.five < MIN_FIVE_SYLLABLE_POOL || bounds.seven < MIN_SEVEN_SYLLABLE_POOL
        {
            RunMode::Sample
        } else {
            RunMode::Evolve
        };

        Self {
            config,
            scorer,
            pools,
            bounds,
            cancel,
            rng,
            mode,
            population: Vec::new(),
            cache: HashMap::new(),
            best_history: Vec::new(),
            generation: 0,
            evaluations: 0,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn evaluate(&mut self, chromosome: Chromosome) -> Option<HaikuCandidate> {
        if self.config.use_evaluation_cache {
            if let Some(hit) = self.cache.get(&chromosome) {
                return Some(hit.clone());
            }
        }
        let [a, b, c] = chromosome.quotes(&self.pools)?;
        let candidate = self.scorer.score(
            [a.text.clone(), b.text.clone(), c.text.clone()],
            [a.source_index, b.source_index, c.source_index],
            self.pools.total(),
        );
        self.evaluations += 1;
        if self.config.use_evaluation_cache {
            self.cache.insert(chromosome, candidate.clone());
        }
        Some(candidate)
    }

    fn evaluate_population(&mut self) {
        let mut population = std::mem::take(&mut self.population);
        for individual in population.iter_mut().filter(|i| !i.is_evaluated()) {
            if let Some(candidate) = self.evaluate(individual.chromosome) {
                individual.fitness = candidate.fitness;
                individual.candidate = Some(candidate);
            }
        }
        sort_by_fitness(&mut population);
        self.population = population;
    }

    fn initialize(&mut self) {
        self.population = (0..self.config.population_size)
            .map(|_| Individual::unevaluated(Chromosome::random(self.bounds, &mut self.rng)))
            .collect();
    }

    /// Replace the population with elites plus offspring
    fn breed(&mut self) {
        let size = self.config.population_size;
        let mut next = Vec::with_capacity(size);

        for elite in self.population.iter().take(self.config.elite_count) {
            next.push(elite.clone());
        }

        while next.len() < size {
            // Select parents by index to avoid borrow conflicts
            let first = select_parent(
                &self.population,
                self.config.selection,
                self.config.tournament_size,
                &mut self.rng,
            );
            let second = select_parent(
                &self.population,
                self.config.selection,
                self.config.tournament_size,
                &mut self.rng,
            );

            let mut child = if self.rng.gen::<f64>() < self.config.crossover_rate {
                crossover(
                    &self.population[first].chromosome,
                    &self.population[second].chromosome,
                    self.config.crossover,
                    &mut self.rng,
                )
            } else {
                self.population[first].chromosome
            };
            mutate(
                &mut child,
                self.config.mutation,
                self.config.mutation_rate,
                self.bounds,
                &mut self.rng,
            );
            next.push(Individual::unevaluated(child));
        }

        self.population = next;
    }

    fn stop_reason(&self) -> Option<StopReason> {
        if self.generation >= self.config.max_generations {
            return Some(StopReason::MaxGenerations);
        }
        if self.evaluations >= self.config.max_evaluations {
            return Some(StopReason::EvaluationBudget);
        }
        if self.started.elapsed() >= self.config.time_limit() {
            return Some(StopReason::TimeLimit);
        }
        let window = self.config.convergence_window;
        if window > 0 && self.best_history.len() > window {
            let latest = self.best_history[self.best_history.len() - 1];
            let earlier = self.best_history[self.best_history.len() - 1 - window];
            if latest - earlier < self.config.convergence_threshold {
                return Some(StopReason::Converged);
            }
        }
        None
    }

    fn snapshot(&self, stop_reason: Option<StopReason>) -> EvolutionProgress {
        let best = self.population.first().and_then(|i| i.candidate.clone());
        EvolutionProgress {
            generation: self.generation,
            max_generations: self.config.max_generations,
            best_fitness: best.as_ref().map(|c| c.fitness).unwrap_or(0.0),
            average_fitness: average_fitness(&self.population),
            diversity: diversity(&self.population),
            best,
            evaluations: self.evaluations,
            is_complete: stop_reason.is_some(),
            stop_reason,
            top_candidates: if stop_reason.is_some() {
                top_candidates(&self.population, self.config.return_count)
            } else {
                Vec::new()
            },
        }
    }

    fn finish(&mut self, reason: StopReason) -> EvolutionProgress {
        self.finished = true;
        let snapshot = self.snapshot(Some(reason));
        info!(
            generation = snapshot.generation,
            best_fitness = snapshot.best_fitness,
            evaluations = snapshot.evaluations,
            stop_reason = %reason,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Evolution finished"
        );
        snapshot
    }

    /// Draw up to `return_count` distinct genomes and score them
    fn sample(&mut self) -> EvolutionProgress {
        if self.bounds.is_viable() {
            let wanted = self.config.return_count.min(self.bounds.search_space());
            let mut seen = HashSet::new();
            let mut attempts = 0;
            while seen.len() < wanted && attempts < wanted * SAMPLE_ATTEMPTS_PER_CANDIDATE {
                attempts += 1;
                let chromosome = Chromosome::random(self.bounds, &mut self.rng);
                if seen.insert(chromosome) {
                    if let Some(candidate) = self.evaluate(chromosome) {
                        self.population.push(Individual {
                            chromosome,
                            fitness: candidate.fitness,
                            candidate: Some(candidate),
                        });
                    }
                }
            }
            sort_by_fitness(&mut self.population);
        }
        debug!(
            five = self.bounds.five,
            seven = self.bounds.seven,
            sampled = self.population.len(),
            "Pools too small to evolve, sampled instead"
        );
        self.finish(StopReason::Sampled)
    }
}

impl Iterator for EvolutionRun {
    type Item = EvolutionProgress;

    fn next(&mut self) -> Option<EvolutionProgress> {
        if self.finished {
            return None;
        }
        if self.mode == RunMode::Sample {
            return Some(self.sample());
        }

        if self.generation == 0 {
            self.initialize();
        } else {
            if self.cancel.is_cancelled() {
                return Some(self.finish(StopReason::Cancelled));
            }
            self.breed();
        }

        self.evaluate_population();
        self.generation += 1;
        let best = self.population.first().map(|i| i.fitness).unwrap_or(0.0);
        self.best_history.push(best);

        match self.stop_reason() {
            Some(reason) => Some(self.finish(reason)),
            None => {
                let snapshot = self.snapshot(None);
                debug!(
                    generation = snapshot.generation,
                    best_fitness = snapshot.best_fitness,
                    average_fitness = snapshot.average_fitness,
                    diversity = snapshot.diversity,
                    "Generation evaluated"
                );
                Some(snapshot)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quote;
    use futures::StreamExt;

    fn small_pools() -> VersePools {
        VersePools {
            five_syllable: vec![
                Quote::new("an old silent pond", 0, 5),
                Quote::new("silence returns now", 2, 5),
            ],
            seven_syllable: vec![
                Quote::new("a frog jumps into the pond", 1, 7),
                Quote::new("the river runs to the sea", 3, 7),
            ],
        }
    }

    fn rich_pools() -> VersePools {
        let five = [
            "an old silent pond",
            "silence returns now",
            "morning light on snow",
            "the moon on the lake",
            "wind across the field",
            "a crow on the branch",
            "leaves fall in the rain",
        ];
        let seven = [
            "a frog jumps into the pond",
            "the river runs to the sea",
            "soft rain falls upon the hill",
            "the pine trees bend in the wind",
            "birds sing beneath the willow",
        ];
        VersePools {
            five_syllable: five
                .iter()
                .enumerate()
                .map(|(i, text)| Quote::new(*text, i * 2, 5))
                .collect(),
            seven_syllable: seven
                .iter()
                .enumerate()
                .map(|(i, text)| Quote::new(*text, i * 2 + 1, 7))
                .collect(),
        }
    }

    fn optimizer(config: GeneticConfig) -> GeneticOptimizer {
        GeneticOptimizer::new(config, QualityScorer::new(None))
    }

    #[test]
    fn test_small_pools_terminate_with_sampled_snapshot() {
        let config = GeneticConfig {
            population_size: 10,
            max_generations: 5,
            seed: Some(1),
            ..Default::default()
        };
        let snapshots: Vec<_> = optimizer(config.clone()).run(&small_pools()).collect();
        assert_eq!(snapshots.len(), 1);
        let last = snapshots.last().unwrap();
        assert!(last.is_complete);
        assert_eq!(last.stop_reason, Some(StopReason::Sampled));
        assert!(last.top_candidates.len() <= config.return_count);
        assert!(!last.top_candidates.is_empty());
    }

    #[test]
    fn test_empty_pool_completes_with_no_candidates() {
        let pools = VersePools::default();
        let top = optimizer(GeneticConfig::default()).evolve(&pools);
        assert!(top.is_empty());
    }

    #[test]
    fn test_runs_until_generation_cap() {
        let config = GeneticConfig {
            population_size: 20,
            elite_count: 2,
            max_generations: 5,
            convergence_window: 0,
            seed: Some(42),
            ..Default::default()
        };
        let snapshots: Vec<_> = optimizer(config).run(&rich_pools()).collect();
        assert_eq!(snapshots.len(), 5);
        assert!(snapshots[..4].iter().all(|s| !s.is_complete && s.top_candidates.is_empty()));

        let last = snapshots.last().unwrap();
        assert!(last.is_complete);
        assert_eq!(last.generation, 5);
        assert_eq!(last.stop_reason, Some(StopReason::MaxGenerations));
        assert!(!last.top_candidates.is_empty() && last.top_candidates.len() <= 5);
        for pair in last.top_candidates.windows(2) {
            assert!(pair[0].fitness >= pair[1].fitness);
        }
    }

    #[test]
    fn test_elitism_never_loses_best() {
        let config = GeneticConfig {
            population_size: 30,
            max_generations: 15,
            convergence_window: 0,
            seed: Some(5),
            ..Default::default()
        };
        let bests: Vec<f64> = optimizer(config)
            .run(&rich_pools())
            .map(|s| s.best_fitness)
            .collect();
        for pair in bests.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_converges_on_plateau() {
        let config = GeneticConfig {
            population_size: 30,
            max_generations: 500,
            convergence_window: 3,
            convergence_threshold: 1000.0,
            seed: Some(8),
            ..Default::default()
        };
        let last = optimizer(config).run(&rich_pools()).last().unwrap();
        assert_eq!(last.stop_reason, Some(StopReason::Converged));
        assert_eq!(last.generation, 4);
    }

    #[test]
    fn test_evaluation_budget() {
        let config = GeneticConfig {
            population_size: 30,
            max_evaluations: 10,
            convergence_window: 0,
            seed: Some(9),
            ..Default::default()
        };
        let last = optimizer(config).run(&rich_pools()).last().unwrap();
        assert_eq!(last.stop_reason, Some(StopReason::EvaluationBudget));
        assert_eq!(last.generation, 1);
    }

    #[test]
    fn test_same_seed_same_result() {
        let config = GeneticConfig {
            population_size: 20,
            max_generations: 6,
            seed: Some(77),
            ..Default::default()
        };
        let a = optimizer(config.clone()).evolve(&rich_pools());
        let b = optimizer(config).evolve(&rich_pools());
        let indices = |v: &[HaikuCandidate]| v.iter().map(|c| c.source_indices).collect::<Vec<_>>();
        assert_eq!(indices(&a), indices(&b));
    }

    #[test]
    fn test_cancellation_between_generations() {
        let config = GeneticConfig {
            population_size: 20,
            convergence_window: 0,
            seed: Some(3),
            ..Default::default()
        };
        let cancel = CancellationToken::new();
        let mut run = optimizer(config).run_with_cancel(&rich_pools(), cancel.clone());
        let first = run.next().unwrap();
        assert!(!first.is_complete);

        cancel.cancel();
        let last = run.next().unwrap();
        assert_eq!(last.stop_reason, Some(StopReason::Cancelled));
        assert_eq!(last.generation, 1);
        assert!(run.next().is_none());
    }

    #[tokio::test]
    async fn test_stream_emits_every_generation() {
        let config = GeneticConfig {
            population_size: 10,
            max_generations: 3,
            convergence_window: 0,
            seed: Some(11),
            ..Default::default()
        };
        let snapshots: Vec<_> = optimizer(config)
            .evolve_stream(&rich_pools(), CancellationToken::new())
            .collect()
            .await;
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots.iter().filter(|s| s.is_complete).count(), 1);
        assert!(snapshots.last().unwrap().is_complete);
    }
}
