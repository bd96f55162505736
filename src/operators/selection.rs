//! Parent selection.
//!
//! A [`Selection`] picks which individuals of an evaluated population get to
//! reproduce. It returns positions into the population rather than the
//! individuals themselves; the driver clones whatever it needs. Ties in
//! aggregate score always go to the earlier position so that a seeded run
//! stays reproducible.

use crate::error::{EvolveError, Result};
use crate::fitness::{FitnessRecord, compare_scores, ranked_positions};
use crate::individual::Individual;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

/// A pluggable parent-selection policy.
pub trait Selection {
    /// Returns `selection_size` positions into `population`, in selection
    /// order. `records[i]` is the fitness of `population[i]`.
    fn select<R: Rng>(
        &self,
        population: &[Individual],
        records: &[FitnessRecord],
        selection_size: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>>;
}

fn check_inputs(
    population: &[Individual],
    records: &[FitnessRecord],
    selection_size: usize,
) -> Result<()> {
    if records.len() != population.len() {
        return Err(EvolveError::ShapeMismatch {
            expected: population.len(),
            actual: records.len(),
        });
    }
    if selection_size > population.len() {
        return Err(EvolveError::InvalidSelectionSize {
            requested: selection_size,
            available: population.len(),
        });
    }
    Ok(())
}

/// Runs `selection_size` tournaments of `size` distinct contestants each.
fn select_tournament<R: Rng>(
    records: &[FitnessRecord],
    size: usize,
    selection_size: usize,
    rng: &mut R,
) -> Result<Vec<usize>> {
    let n = records.len();
    let contestants = size.min(n);
    (0..selection_size)
        .map(|_| {
            rand::seq::index::sample(&mut *rng, n, contestants)
                .into_iter()
                .reduce(|w, i| match compare_scores(records[i].score, records[w].score) {
                    Ordering::Greater => i,
                    Ordering::Equal if i < w => i,
                    _ => w,
                })
                .ok_or(EvolveError::InvalidSelectionSize {
                    requested: selection_size,
                    available: n,
                })
        })
        .collect()
}

/// Linear ranking: the best of `n` gets weight `n`, the worst weight `1`.
fn select_rank<R: Rng>(
    records: &[FitnessRecord],
    selection_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    let order = ranked_positions(records);
    let n = order.len() as u64;
    let total = n * (n + 1) / 2;
    (0..selection_size)
        .map(|_| {
            let spin = rng.random_range(0..total);
            let mut cumulative = 0u64;
            for (rank, &position) in order.iter().enumerate() {
                cumulative += n - rank as u64;
                if spin < cumulative {
                    return position;
                }
            }
            order[order.len() - 1]
        })
        .collect()
}

fn select_truncation(records: &[FitnessRecord], selection_size: usize) -> Vec<usize> {
    let mut order = ranked_positions(records);
    order.truncate(selection_size);
    order
}

/// Built-in selection policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Best of `size` distinct random contestants, repeated per slot.
    /// Individuals may be chosen more than once.
    Tournament { size: usize },
    /// Roulette over linear rank weights; insensitive to score scale.
    Rank,
    /// The `selection_size` best individuals, each exactly once.
    Truncation,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::Tournament { size: 3 }
    }
}

impl SelectionStrategy {
    pub fn tournament(size: usize) -> Result<Self> {
        let strategy = Self::Tournament { size };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn rank() -> Self {
        Self::Rank
    }

    pub fn truncation() -> Self {
        Self::Truncation
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Tournament { size: 0 } => Err(EvolveError::invalid_config(
                "selection",
                "tournament size must be at least 1",
            )),
            _ => Ok(()),
        }
    }
}

impl Selection for SelectionStrategy {
    #[instrument(level = "debug", skip(self, population, records, rng), fields(strategy = ?self, population = population.len()))]
    fn select<R: Rng>(
        &self,
        population: &[Individual],
        records: &[FitnessRecord],
        selection_size: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        check_inputs(population, records, selection_size)?;
        self.validate()?;
        Ok(match self {
            Self::Tournament { size } => select_tournament(records, *size, selection_size, rng)?,
            Self::Rank => select_rank(records, selection_size, rng),
            Self::Truncation => select_truncation(records, selection_size),
        })
    }
}
