//! Objective weighting and score ordering.

use crate::error::{EvolveError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Compare two scores, treating NaN as less than all other values.
/// This ensures NaN-scored individuals sort to the end (lowest priority).
pub fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Position of the best record. Ties go to the earliest position.
pub fn best_position(records: &[FitnessRecord]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, record) in records.iter().enumerate() {
        match best {
            Some(b) if compare_scores(record.score, records[b].score) != Ordering::Greater => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Positions sorted best first. The sort is stable, so equal scores keep
/// their input order.
pub fn ranked_positions(records: &[FitnessRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| compare_scores(records[b].score, records[a].score));
    order
}

/// Raw objective values of one individual and their weighted aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub objectives: Vec<f64>,
    /// Higher is always better; the weight signs already encode direction.
    pub score: f64,
}

impl FitnessRecord {
    pub fn is_better_than(&self, other: &FitnessRecord) -> bool {
        compare_scores(self.score, other.score) == Ordering::Greater
    }
}

/// Signed per-objective weights. Positive weights maximize their objective,
/// negative weights minimize it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights(Vec<f64>);

impl ObjectiveWeights {
    pub fn new(weights: impl Into<Vec<f64>>) -> Result<Self> {
        let weights = weights.into();
        if weights.is_empty() {
            return Err(EvolveError::invalid_config(
                "objective_weights",
                "must contain at least one weight",
            ));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(EvolveError::invalid_config(
                "objective_weights",
                format!("must be finite, got {w}"),
            ));
        }
        Ok(Self(weights))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Scales the weights so their absolute values sum to one. Signs are kept.
    /// All-zero weights are returned unchanged.
    pub fn normalized(&self) -> Self {
        let total: f64 = self.0.iter().map(|w| w.abs()).sum();
        if total == 0.0 {
            return self.clone();
        }
        Self(self.0.iter().map(|w| w / total).collect())
    }

    /// Weighted sum of `objectives`.
    pub fn aggregate(&self, objectives: Vec<f64>) -> Result<FitnessRecord> {
        if objectives.len() != self.0.len() {
            return Err(EvolveError::FitnessArity {
                expected: self.0.len(),
                actual: objectives.len(),
            });
        }
        let score = objectives.iter().zip(&self.0).map(|(o, w)| o * w).sum();
        Ok(FitnessRecord { objectives, score })
    }
}
