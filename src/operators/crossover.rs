//! Recombination of two parents into two children.
//!
//! Every built-in strategy only exchanges whole position values between the
//! parents and never synthesizes a new value, so children are legal in
//! every domain their parents were legal in.

use crate::error::{EvolveError, Result};
use crate::individual::Individual;
use crate::parameter::Value;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A pluggable crossover policy.
pub trait Crossover {
    /// Produces two children with the parents' shape. The parents are left
    /// untouched.
    fn crossover<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        rng: &mut R,
    ) -> Result<(Individual, Individual)>;
}

fn check_parents(parent1: &Individual, parent2: &Individual) -> Result<()> {
    if !parent1.is_initialized() || !parent2.is_initialized() {
        return Err(EvolveError::UninitializedIndividual);
    }
    if parent1.layout() != parent2.layout() {
        return Err(EvolveError::ShapeMismatch {
            expected: parent1.len(),
            actual: parent2.len(),
        });
    }
    Ok(())
}

/// Swaps each position independently with `swap_probability`.
fn crossover_uniform<R: Rng>(
    rng: &mut R,
    lhs: &[Value],
    rhs: &[Value],
    swap_probability: f64,
) -> (Vec<Value>, Vec<Value>) {
    lhs.iter()
        .zip(rhs)
        .map(|(a, b)| {
            if rng.random_bool(swap_probability) {
                (b.clone(), a.clone())
            } else {
                (a.clone(), b.clone())
            }
        })
        .unzip()
}

/// Exchanges the tails starting at `point`.
fn crossover_single_point(lhs: &[Value], rhs: &[Value], point: usize) -> (Vec<Value>, Vec<Value>) {
    let mut first = lhs[..point].to_vec();
    first.extend_from_slice(&rhs[point..]);
    let mut second = rhs[..point].to_vec();
    second.extend_from_slice(&lhs[point..]);
    (first, second)
}

/// Exchanges the segment `[start, end)`.
fn crossover_two_point(
    lhs: &[Value],
    rhs: &[Value],
    start: usize,
    end: usize,
) -> (Vec<Value>, Vec<Value>) {
    let mut first = lhs.to_vec();
    let mut second = rhs.to_vec();
    first[start..end].clone_from_slice(&rhs[start..end]);
    second[start..end].clone_from_slice(&lhs[start..end]);
    (first, second)
}

/// Built-in crossover policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrossoverStrategy {
    /// Each position is swapped between the children with
    /// `swap_probability`.
    Uniform { swap_probability: f64 },
    /// One cut point in `1..len`; the tails are exchanged. Parents with a
    /// single parameter are copied.
    SinglePoint,
    /// Two cut points; the middle segment is exchanged. Falls back to a
    /// single cut for two parameters.
    TwoPoint,
}

impl Default for CrossoverStrategy {
    fn default() -> Self {
        Self::Uniform {
            swap_probability: 0.5,
        }
    }
}

impl CrossoverStrategy {
    pub fn uniform(swap_probability: f64) -> Result<Self> {
        let strategy = Self::Uniform { swap_probability };
        strategy.validate()?;
        Ok(strategy)
    }

    pub fn single_point() -> Self {
        Self::SinglePoint
    }

    pub fn two_point() -> Self {
        Self::TwoPoint
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Uniform { swap_probability } if !(0.0..=1.0).contains(swap_probability) => {
                Err(EvolveError::invalid_config(
                    "crossover",
                    format!("uniform swap probability must be within [0, 1], got {swap_probability}"),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Crossover for CrossoverStrategy {
    #[instrument(level = "debug", skip(self, parent1, parent2, rng), fields(strategy = ?self, len = parent1.len()))]
    fn crossover<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        rng: &mut R,
    ) -> Result<(Individual, Individual)> {
        check_parents(parent1, parent2)?;
        self.validate()?;

        let (lhs, rhs) = (parent1.values(), parent2.values());
        let n = lhs.len();
        let (first, second) = match self {
            Self::Uniform { swap_probability } => {
                crossover_uniform(&mut *rng, lhs, rhs, *swap_probability)
            }
            Self::SinglePoint if n < 2 => (lhs.to_vec(), rhs.to_vec()),
            Self::SinglePoint => {
                let point = rng.random_range(1..n);
                crossover_single_point(lhs, rhs, point)
            }
            Self::TwoPoint if n < 2 => (lhs.to_vec(), rhs.to_vec()),
            Self::TwoPoint if n == 2 => crossover_single_point(lhs, rhs, 1),
            Self::TwoPoint => {
                let start = rng.random_range(1..n - 1);
                let end = rng.random_range(start + 1..n);
                crossover_two_point(lhs, rhs, start, end)
            }
        };

        let child1 = parent1.offspring(first, rng.random());
        let child2 = parent2.offspring(second, rng.random());
        Ok((child1, child2))
    }
}
