//! Population bookkeeping

use super::chromosome::Chromosome;
use crate::types::HaikuCandidate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Individual in population
#[derive(Debug, Clone)]
pub struct Individual {
    pub chromosome: Chromosome,
    pub fitness: f64,
    /// Scored haiku, absent until evaluated
    pub candidate: Option<HaikuCandidate>,
}

impl Individual {
    pub fn new(chromosome: Chromosome, fitness: f64) -> Self {
        Self {
            chromosome,
            fitness,
            candidate: None,
        }
    }

    pub fn unevaluated(chromosome: Chromosome) -> Self {
        Self::new(chromosome, f64::NEG_INFINITY)
    }

    pub fn is_evaluated(&self) -> bool {
        self.candidate.is_some()
    }
}

fn by_fitness_desc(a: &Individual, b: &Individual) -> Ordering {
    b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal)
}

/// Sort by fitness (descending)
pub fn sort_by_fitness(individuals: &mut [Individual]) {
    individuals.sort_by(by_fitness_desc);
}

pub fn average_fitness(individuals: &[Individual]) -> f64 {
    if individuals.is_empty() {
        return 0.0;
    }
    individuals.iter().map(|i| i.fitness).sum::<f64>() / individuals.len() as f64
}

/// Unique genomes over population size
pub fn diversity(individuals: &[Individual]) -> f64 {
    if individuals.is_empty() {
        return 0.0;
    }
    let unique: HashSet<Chromosome> = individuals.iter().map(|i| i.chromosome).collect();
    unique.len() as f64 / individuals.len() as f64
}

/// Best `count` distinct genomes, best first
pub fn top_candidates(individuals: &[Individual], count: usize) -> Vec<HaikuCandidate> {
    let mut sorted: Vec<&Individual> = individuals.iter().collect();
    sorted.sort_by(|a, b| by_fitness_desc(a, b));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|individual| seen.insert(individual.chromosome))
        .filter_map(|individual| individual.candidate.clone())
        .take(count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(genes: [usize; 3], fitness: f64) -> Individual {
        Individual {
            chromosome: Chromosome::new(genes),
            fitness,
            candidate: Some(HaikuCandidate {
                verses: [String::new(), String::new(), String::new()],
                source_indices: genes,
                metrics: Default::default(),
                fitness,
            }),
        }
    }

    #[test]
    fn test_statistics() {
        let pop = vec![
            individual([0, 0, 0], 1.0),
            individual([0, 0, 0], 1.0),
            individual([1, 0, 0], 4.0),
            individual([2, 0, 0], 2.0),
        ];
        assert_eq!(average_fitness(&pop), 2.0);
        assert_eq!(diversity(&pop), 0.75);
        assert_eq!(average_fitness(&[]), 0.0);
    }

    #[test]
    fn test_top_candidates_are_distinct_and_sorted() {
        let pop = vec![
            individual([0, 0, 0], 1.0),
            individual([1, 0, 0], 4.0),
            individual([1, 0, 0], 4.0),
            individual([2, 0, 0], 2.0),
        ];
        let top = top_candidates(&pop, 5);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].fitness, 4.0);
        assert_eq!(top[1].fitness, 2.0);
        assert_eq!(top_candidates(&pop, 1).len(), 1);
    }

    #[test]
    fn test_sort_handles_unevaluated() {
        let mut pop = vec![
            Individual::unevaluated(Chromosome::new([0, 0, 0])),
            individual([1, 0, 0], 3.0),
        ];
        sort_by_fitness(&mut pop);
        assert_eq!(pop[0].fitness, 3.0);
        assert!(!pop[1].is_evaluated());
    }
}
