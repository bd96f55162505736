//! Generational genetic algorithm.
//!
//! Each generation runs the same cycle:
//!
//! 1. **Evaluate** every individual through the fitness function and fold the
//!    objective values into one weighted score.
//! 2. **Select** `selection_size` parents with the installed [`Selection`].
//! 3. **Recombine** shuffled parent pairs with the installed [`Crossover`]
//!    (or copy them) until the next population is full.
//! 4. **Mutate** every new individual.
//! 5. **Record** the generation's statistics and update the hall of fame.
//!
//! # Determinism
//!
//! The driver owns one [`Pcg64`] seeded from [`GaConfig::seed`]. Every
//! individual's stream is seeded from it, and the caller's parameters are
//! cloned at the start of a run, so the same seed, parameters and fitness
//! function always give the same result and the same history. Parallel
//! evaluation (the `parallel` feature) gathers results in population order
//! before anything reads them.
//!
//! # Example
//!
//! ```rust
//! use param_evolve::{GaConfig, GeneticAlgorithm, ParamMap, Parameter};
//! use std::ops::ControlFlow;
//!
//! let parameters = vec![Parameter::integer("n", 0, 100)?];
//! let ga = GeneticAlgorithm::new(GaConfig {
//!     population_size: 16,
//!     nb_generations: 50,
//!     selection_size: 8,
//!     ..GaConfig::default()
//! });
//!
//! // Stop as soon as the optimum shows up.
//! let fitness = |p: &ParamMap| vec![p.real("n").unwrap_or_default()];
//! let result = ga.evolve_with_callback(&parameters, &fitness, &[1.0], |progress| {
//!     if progress.stats.hall_of_fame_score >= 100.0 {
//!         ControlFlow::Break(())
//!     } else {
//!         ControlFlow::Continue(())
//!     }
//! })?;
//! assert!(result.history.nb_generations() <= 50);
//! # Ok::<(), param_evolve::EvolveError>(())
//! ```

use crate::FitnessFunction;
use crate::config::GaConfig;
use crate::error::{EvolveError, Result};
use crate::fitness::{FitnessRecord, ObjectiveWeights, ranked_positions};
use crate::history::{GenerationStats, GeneticHistory, HallOfFame};
use crate::individual::{Individual, ParamMap};
use crate::operators::crossover::{Crossover, CrossoverStrategy};
use crate::operators::selection::{Selection, SelectionStrategy};
use crate::parameter::{Parameter, SearchSpace};
use rand::Rng;
use rand::prelude::{SeedableRng, SliceRandom};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where a [`Run`] is in the generational cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Uninitialized,
    InitializingPopulation,
    Evaluating,
    Selecting,
    Recombining,
    Mutating,
    Recording,
    Terminated,
}

/// Passed to the callback of [`GeneticAlgorithm::evolve_with_callback`] after
/// every generation.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Zero-based index of the generation just recorded.
    pub generation: usize,
    pub nb_generations: usize,
    pub stats: GenerationStats,
    pub hall_of_fame: Option<&'a HallOfFame>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    /// Parameter values of the best individual seen.
    pub best: ParamMap,
    /// Its raw objective values, in fitness-function order.
    pub best_objectives: Vec<f64>,
    /// Its weighted aggregate score.
    pub best_score: f64,
    pub history: GeneticHistory,
}

/// The evolution driver.
///
/// Selection and crossover are type parameters so custom strategies plug in
/// without boxing. By default both come from the [`GaConfig`]; installing a
/// custom strategy with [`with_selection`](Self::with_selection) or
/// [`with_crossover`](Self::with_crossover) replaces the configured one.
#[derive(Debug, Clone)]
pub struct GeneticAlgorithm<S = SelectionStrategy, C = CrossoverStrategy> {
    config: GaConfig,
    selection: S,
    crossover: C,
}

impl GeneticAlgorithm {
    pub fn new(config: GaConfig) -> Self {
        Self {
            selection: config.selection.clone(),
            crossover: config.crossover.clone(),
            config,
        }
    }
}

impl Default for GeneticAlgorithm {
    fn default() -> Self {
        Self::new(GaConfig::default())
    }
}

impl<S, C> GeneticAlgorithm<S, C> {
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    pub fn selection(&self) -> &S {
        &self.selection
    }

    pub fn crossover(&self) -> &C {
        &self.crossover
    }

    pub fn with_selection<S2: Selection>(self, selection: S2) -> GeneticAlgorithm<S2, C> {
        GeneticAlgorithm {
            config: self.config,
            selection,
            crossover: self.crossover,
        }
    }

    pub fn with_crossover<C2: Crossover>(self, crossover: C2) -> GeneticAlgorithm<S, C2> {
        GeneticAlgorithm {
            config: self.config,
            selection: self.selection,
            crossover,
        }
    }
}

impl<S: Selection, C: Crossover> GeneticAlgorithm<S, C> {
    /// Validates the inputs and seeds the initial population.
    ///
    /// `parameters` is cloned, so the caller's parameter streams are never
    /// advanced by a run.
    #[instrument(level = "debug", skip_all, fields(parameters = parameters.len(), objectives = objective_weights.len(), seed = self.config.seed))]
    pub fn start<'a, F>(
        &'a self,
        parameters: &[Parameter],
        fitness: &'a F,
        objective_weights: &[f64],
    ) -> Result<Run<'a, S, C, F>>
    where
        F: FitnessFunction + ?Sized,
    {
        let space = SearchSpace::new(parameters.to_vec())?;
        self.config.validate()?;
        let mut weights = ObjectiveWeights::new(objective_weights)?;
        if self.config.normalize_weights {
            weights = weights.normalized();
        }

        let mut run = Run {
            algorithm: self,
            fitness,
            weights,
            space,
            rng: Pcg64::seed_from_u64(self.config.seed),
            population: Vec::new(),
            history: GeneticHistory::new(),
            phase: Phase::Uninitialized,
            generation: 0,
        };
        run.initialize();
        Ok(run)
    }

    /// Runs `nb_generations` generations and returns the best individual
    /// found together with the full history.
    pub fn evolve<F>(
        &self,
        parameters: &[Parameter],
        fitness: &F,
        objective_weights: &[f64],
    ) -> Result<Evolution>
    where
        F: FitnessFunction + ?Sized,
    {
        self.evolve_with_callback(parameters, fitness, objective_weights, |_| {
            ControlFlow::Continue(())
        })
    }

    /// Like [`evolve`](Self::evolve), calling `on_generation` between
    /// generations. Returning [`ControlFlow::Break`] ends the run early with
    /// the generations recorded so far.
    pub fn evolve_with_callback<F, P>(
        &self,
        parameters: &[Parameter],
        fitness: &F,
        objective_weights: &[f64],
        mut on_generation: P,
    ) -> Result<Evolution>
    where
        F: FitnessFunction + ?Sized,
        P: FnMut(&Progress<'_>) -> ControlFlow<()>,
    {
        let mut run = self.start(parameters, fitness, objective_weights)?;
        while let Some(stats) = run.step()? {
            let progress = Progress {
                generation: stats.generation,
                nb_generations: self.config.nb_generations,
                stats,
                hall_of_fame: run.history().hall_of_fame(),
            };
            if on_generation(&progress).is_break() {
                tracing::info!(generation = stats.generation, "run stopped by callback");
                break;
            }
        }
        run.finish()
    }
}

/// A run in progress, advanced one generation at a time.
pub struct Run<'a, S, C, F: ?Sized> {
    algorithm: &'a GeneticAlgorithm<S, C>,
    fitness: &'a F,
    weights: ObjectiveWeights,
    space: SearchSpace,
    rng: Pcg64,
    population: Vec<Individual>,
    history: GeneticHistory,
    phase: Phase,
    generation: usize,
}

impl<S, C, F: ?Sized> Run<'_, S, C, F> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Generations completed so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    /// The population about to be evaluated next.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn history(&self) -> &GeneticHistory {
        &self.history
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    /// Ends the run and hands back the hall of fame and history.
    pub fn finish(self) -> Result<Evolution> {
        let best = self
            .history
            .hall_of_fame()
            .cloned()
            .ok_or(EvolveError::EmptyHistory)?;
        Ok(Evolution {
            best: best.values,
            best_objectives: best.objectives,
            best_score: best.score,
            history: self.history,
        })
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!(from = ?self.phase, to = ?phase, generation = self.generation, "phase transition");
        self.phase = phase;
    }

    fn initialize(&mut self) {
        self.enter(Phase::InitializingPopulation);
        let size = self.algorithm.config.population_size;
        let mut population = Vec::with_capacity(size);
        for _ in 0..size {
            let seed = self.rng.random();
            population.push(Individual::random(&mut self.space, seed));
        }
        self.population = population;
        self.enter(Phase::Evaluating);
    }
}

impl<S: Selection, C: Crossover, F: FitnessFunction + ?Sized> Run<'_, S, C, F> {
    /// Runs one full generation. Returns `None` once the generation budget is
    /// spent. Any error terminates the run.
    pub fn step(&mut self) -> Result<Option<GenerationStats>> {
        if self.phase == Phase::Terminated {
            return Ok(None);
        }
        match self.advance() {
            Ok(stats) => Ok(Some(stats)),
            Err(err) => {
                tracing::error!(generation = self.generation, phase = ?self.phase, error = %err, "run aborted");
                self.enter(Phase::Terminated);
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<GenerationStats> {
        let algorithm = self.algorithm;
        let config = &algorithm.config;

        self.enter(Phase::Evaluating);
        let records = self.evaluate()?;

        self.enter(Phase::Selecting);
        let selected = algorithm.selection.select(
            &self.population,
            &records,
            config.selection_size,
            &mut self.rng,
        )?;

        self.enter(Phase::Recombining);
        let mut next = Vec::with_capacity(config.population_size);
        for &i in ranked_positions(&records).iter().take(config.elitism) {
            next.push(self.population[i].clone());
        }
        let parents = selected
            .iter()
            .map(|&i| {
                self.population
                    .get(i)
                    .ok_or_else(|| EvolveError::InvalidSelectionSize {
                        requested: i + 1,
                        available: self.population.len(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        recombine(
            &algorithm.crossover,
            &parents,
            config.population_size,
            config.crossover_probability,
            &self.space,
            &mut self.rng,
            &mut next,
        )?;

        self.enter(Phase::Mutating);
        for child in next.iter_mut().skip(config.elitism) {
            child.mutate(
                &mut self.space,
                config.mutation_size,
                config.mutation_probability,
            )?;
        }

        self.enter(Phase::Recording);
        let stats = self
            .history
            .record(self.generation, &self.population, &records)?;
        tracing::info!(
            generation = self.generation,
            best = stats.best_score,
            mean = stats.mean_score,
            hall_of_fame = stats.hall_of_fame_score,
            "generation recorded"
        );

        self.population = next;
        self.generation += 1;
        if self.generation >= config.nb_generations {
            self.enter(Phase::Terminated);
        } else {
            self.enter(Phase::Evaluating);
        }
        Ok(stats)
    }

    /// Scores the current population in population order.
    fn evaluate(&self) -> Result<Vec<FitnessRecord>> {
        let fitness = self.fitness;
        let score = |individual: &Individual| -> Result<Vec<f64>> {
            Ok(fitness.evaluate(&individual.as_named_mapping()?))
        };

        #[cfg(feature = "parallel")]
        let raw: Vec<Result<Vec<f64>>> = self.population.par_iter().map(score).collect();
        #[cfg(not(feature = "parallel"))]
        let raw: Vec<Result<Vec<f64>>> = self.population.iter().map(score).collect();

        raw.into_iter()
            .map(|objectives| self.weights.aggregate(objectives?))
            .collect()
    }
}

/// Fills `next` up to `target` with children of shuffled parent pairs.
///
/// An odd parent group pairs its last member with one drawn again at random.
/// Pairs are recombined with `crossover_probability` and copied otherwise.
fn recombine<C: Crossover, R: Rng>(
    crossover: &C,
    parents: &[&Individual],
    target: usize,
    crossover_probability: f64,
    space: &SearchSpace,
    rng: &mut R,
    next: &mut Vec<Individual>,
) -> Result<()> {
    if parents.is_empty() {
        if next.len() < target {
            return Err(EvolveError::InvalidSelectionSize {
                requested: 0,
                available: target,
            });
        }
        return Ok(());
    }

    while next.len() < target {
        let mut order: Vec<usize> = (0..parents.len()).collect();
        order.shuffle(&mut *rng);
        if order.len() % 2 == 1 {
            order.push(rng.random_range(0..parents.len()));
        }

        for pair in order.chunks_exact(2) {
            if next.len() >= target {
                break;
            }
            let (p1, p2) = (parents[pair[0]], parents[pair[1]]);
            let (child1, child2) = if rng.random_bool(crossover_probability) {
                crossover.crossover(p1, p2, &mut *rng)?
            } else {
                (
                    p1.offspring(p1.values().to_vec(), rng.random()),
                    p2.offspring(p2.values().to_vec(), rng.random()),
                )
            };
            child1.validate(space)?;
            next.push(child1);
            if next.len() < target {
                child2.validate(space)?;
                next.push(child2);
            }
        }
    }
    Ok(())
}
