//! Selection, crossover and mutation operators

use super::chromosome::{Chromosome, GeneBounds};
use super::config::{CrossoverOperator, MutationOperator, SelectionMethod};
use super::population::Individual;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Floor added to shifted roulette weights so the weakest can still be drawn
const ROULETTE_FLOOR: f64 = 1e-6;

/// Pick a parent index. `population` must be sorted by fitness, best first.
pub fn select_parent<R: Rng + ?Sized>(
    population: &[Individual],
    method: SelectionMethod,
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    match method {
        SelectionMethod::Tournament => tournament(population, tournament_size, rng),
        SelectionMethod::Roulette => roulette(population, rng),
        SelectionMethod::Rank => rank(population, rng),
    }
}

/// Tournament selection - returns index to avoid borrow conflicts
fn tournament<R: Rng + ?Sized>(population: &[Individual], size: usize, rng: &mut R) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].fitness;

    for _ in 1..size.max(1) {
        let idx = rng.gen_range(0..population.len());
        if population[idx].fitness > best_fitness {
            best_idx = idx;
            best_fitness = population[idx].fitness;
        }
    }

    best_idx
}

fn roulette<R: Rng + ?Sized>(population: &[Individual], rng: &mut R) -> usize {
    let min = population
        .iter()
        .map(|individual| individual.fitness)
        .fold(f64::INFINITY, f64::min);
    let weights = population
        .iter()
        .map(|individual| individual.fitness - min + ROULETTE_FLOOR);
    match WeightedIndex::new(weights) {
        Ok(distribution) => distribution.sample(rng),
        Err(_) => rng.gen_range(0..population.len()),
    }
}

fn rank<R: Rng + ?Sized>(population: &[Individual], rng: &mut R) -> usize {
    let n = population.len();
    // best (index 0) gets weight n, worst gets 1
    let weights = (0..n).map(|i| (n - i) as f64);
    match WeightedIndex::new(weights) {
        Ok(distribution) => distribution.sample(rng),
        Err(_) => rng.gen_range(0..n),
    }
}

pub fn crossover<R: Rng + ?Sized>(
    first: &Chromosome,
    second: &Chromosome,
    operator: CrossoverOperator,
    rng: &mut R,
) -> Chromosome {
    let (a, b) = (first.genes(), second.genes());
    let genes = match operator {
        CrossoverOperator::SinglePoint => {
            let point = rng.gen_range(1..3);
            std::array::from_fn(|i| if i < point { a[i] } else { b[i] })
        }
        CrossoverOperator::Uniform => {
            std::array::from_fn(|i| if rng.gen_bool(0.5) { a[i] } else { b[i] })
        }
    };
    Chromosome::new(genes)
}

pub fn mutate<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    operator: MutationOperator,
    rate: f64,
    bounds: GeneBounds,
    rng: &mut R,
) {
    match operator {
        MutationOperator::RandomReset => {
            for position in 0..3 {
                if rng.gen::<f64>() < rate {
                    chromosome.set_gene(position, rng.gen_range(0..bounds.limit(position)));
                }
            }
        }
        MutationOperator::Swap => {
            if rng.gen::<f64>() < rate {
                chromosome.swap_outer();
            }
        }
    }
}
