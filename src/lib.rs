//! Seeded, reproducible genetic search over typed, bounded parameters.
//!
//! Describe the search space as a list of [`Parameter`]s, hand a
//! [`FitnessFunction`] and one signed weight per objective to a
//! [`GeneticAlgorithm`], and get back the best parameter values found along
//! with a per-generation [`GeneticHistory`].
//!
//! ```rust
//! use param_evolve::{GaConfig, GeneticAlgorithm, ParamMap, Parameter};
//!
//! let parameters = vec![
//!     Parameter::integer("x", -10, 10)?,
//!     Parameter::real("y", 0.0, 1.0, 0.25)?.with_seed(7),
//!     Parameter::categorical("mode", ["fast", "slow"])?.with_seed(8),
//! ];
//!
//! // Maximize -(x^2), minimize y.
//! let fitness = |p: &ParamMap| {
//!     let x = p.real("x").unwrap_or_default();
//!     vec![-(x * x), p.real("y").unwrap_or_default()]
//! };
//!
//! let ga = GeneticAlgorithm::new(GaConfig {
//!     population_size: 20,
//!     nb_generations: 10,
//!     selection_size: 10,
//!     ..GaConfig::default()
//! });
//! let result = ga.evolve(&parameters, &fitness, &[1.0, -1.0])?;
//!
//! assert_eq!(result.history.nb_generations(), 10);
//! assert!(result.best.contains("mode"));
//! # Ok::<(), param_evolve::EvolveError>(())
//! ```

pub use crate::algorithms::genetic::{Evolution, GeneticAlgorithm, Phase, Progress, Run};
pub use crate::config::GaConfig;
pub use crate::error::{EvolveError, Result};
pub use crate::fitness::{FitnessRecord, ObjectiveWeights};
pub use crate::history::{GenerationStats, GeneticHistory, HallOfFame};
pub use crate::individual::{Individual, ParamMap};
pub use crate::operators::crossover::{Crossover, CrossoverStrategy};
pub use crate::operators::selection::{Selection, SelectionStrategy};
pub use crate::parameter::{Parameter, ParameterKind, SearchSpace, Value};

/// A user-supplied objective.
///
/// Receives the individual's values keyed by parameter name and returns one
/// value per objective, in the same order as the objective weights. A
/// function may ignore parameters it does not need.
pub trait FitnessFunction: Send + Sync {
    fn evaluate(&self, params: &ParamMap) -> Vec<f64>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&ParamMap) -> Vec<f64> + Send + Sync,
{
    fn evaluate(&self, params: &ParamMap) -> Vec<f64> {
        self(params)
    }
}

pub mod config;
pub mod error;
pub mod fitness;
pub mod history;
pub mod individual;
pub mod parameter;

pub mod operators {
    pub mod crossover;
    pub mod selection;
}

pub mod algorithms {
    pub mod genetic;
}
