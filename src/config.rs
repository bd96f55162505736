//! Run configuration.

use crate::error::{EvolveError, Result};
use crate::operators::crossover::CrossoverStrategy;
use crate::operators::selection::SelectionStrategy;
use serde::{Deserialize, Serialize};

/// Settings for a [`GeneticAlgorithm`](crate::algorithms::genetic::GeneticAlgorithm) run.
///
/// Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Number of evaluate/select/recombine/mutate cycles.
    pub nb_generations: usize,
    /// Maximum number of positions mutated per individual per generation.
    pub mutation_size: usize,
    /// Chance that a position picked for mutation is redrawn.
    pub mutation_probability: f64,
    /// Chance that a parent pair is recombined instead of copied.
    pub crossover_probability: f64,
    /// Parents retained by selection each generation.
    pub selection_size: usize,
    /// Top-level seed; a fixed seed reproduces the whole run.
    pub seed: u64,
    /// Best individuals copied unmutated into the next generation.
    pub elitism: usize,
    /// Rescale objective weights to unit absolute sum before scoring.
    pub normalize_weights: bool,
    pub selection: SelectionStrategy,
    pub crossover: CrossoverStrategy,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            nb_generations: 20,
            mutation_size: 1,
            mutation_probability: 0.3,
            crossover_probability: 0.5,
            selection_size: 20,
            seed: 1234,
            elitism: 0,
            normalize_weights: false,
            selection: SelectionStrategy::default(),
            crossover: CrossoverStrategy::default(),
        }
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EvolveError::invalid_config(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

impl GaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(EvolveError::invalid_config(
                "population_size",
                "must be at least 1",
            ));
        }
        if self.nb_generations == 0 {
            return Err(EvolveError::invalid_config(
                "nb_generations",
                "must be at least 1",
            ));
        }
        if self.selection_size == 0 || self.selection_size > self.population_size {
            return Err(EvolveError::InvalidSelectionSize {
                requested: self.selection_size,
                available: self.population_size,
            });
        }
        if self.elitism > self.population_size {
            return Err(EvolveError::invalid_config(
                "elitism",
                format!(
                    "must not exceed population_size ({}), got {}",
                    self.population_size, self.elitism
                ),
            ));
        }
        check_probability("mutation_probability", self.mutation_probability)?;
        check_probability("crossover_probability", self.crossover_probability)?;
        self.selection.validate()?;
        self.crossover.validate()?;
        Ok(())
    }
}
