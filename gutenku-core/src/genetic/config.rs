//! Genetic search configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parent selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Best of `tournament_size` random individuals
    #[default]
    Tournament,
    /// Fitness-proportional, shifted so the weakest keeps a small chance
    Roulette,
    /// Proportional to rank rather than raw fitness
    Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverOperator {
    #[default]
    SinglePoint,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOperator {
    /// Each gene is redrawn from its pool with probability `mutation_rate`
    #[default]
    RandomReset,
    /// The two five-syllable genes trade places with probability `mutation_rate`
    Swap,
}

/// Genetic search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Population size
    pub population_size: usize,
    /// Elite count (copied unchanged into the next generation)
    pub elite_count: usize,
    pub max_generations: usize,
    /// Minimum best-fitness gain over `convergence_window` generations
    pub convergence_threshold: f64,
    pub convergence_window: usize,
    pub selection: SelectionMethod,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub crossover: CrossoverOperator,
    pub mutation_rate: f64,
    pub mutation: MutationOperator,
    /// Memoize fitness per genome
    pub use_evaluation_cache: bool,
    /// Candidates returned by a finished run
    pub return_count: usize,
    /// Scorer invocations allowed per run
    pub max_evaluations: usize,
    pub time_limit_secs: u64,
    /// Random seed
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            elite_count: 6,
            max_generations: 500,
            convergence_threshold: 0.005,
            convergence_window: 30,
            selection: SelectionMethod::Tournament,
            tournament_size: 7,
            crossover_rate: 0.9,
            crossover: CrossoverOperator::SinglePoint,
            mutation_rate: 0.12,
            mutation: MutationOperator::RandomReset,
            use_evaluation_cache: true,
            return_count: 5,
            max_evaluations: 50_000,
            time_limit_secs: 30,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    /// Reject settings the optimizer cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size must be positive".to_string());
        }
        if self.elite_count > self.population_size {
            return Err(format!(
                "elite_count ({}) exceeds population_size ({})",
                self.elite_count, self.population_size
            ));
        }
        if self.tournament_size == 0 {
            return Err("tournament_size must be positive".to_string());
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must be within [0, 1], got {rate}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneticConfig::default();
        assert_eq!(config.population_size, 150);
        assert_eq!(config.elite_count, 6);
        assert_eq!(config.tournament_size, 7);
        assert_eq!(config.return_count, 5);
        assert_eq!(config.time_limit(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let config = GeneticConfig {
            elite_count: 20,
            population_size: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = GeneticConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("mutation_rate"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GeneticConfig =
            toml::from_str("population_size = 40\nselection = \"rank\"\n").unwrap();
        assert_eq!(config.population_size, 40);
        assert_eq!(config.selection, SelectionMethod::Rank);
        assert_eq!(config.max_generations, 500);
    }
}
