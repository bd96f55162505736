//! Per-generation run log and hall of fame.

use crate::error::Result;
use crate::fitness::{FitnessRecord, best_position, compare_scores};
use crate::individual::{Individual, ParamMap};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Zero-based generation index.
    pub generation: usize,
    pub best_score: f64,
    /// Mean over the finite scores; NaN if there are none.
    pub mean_score: f64,
    pub worst_score: f64,
    /// Individuals whose aggregate score was NaN.
    pub nan_count: usize,
    /// Hall-of-fame score after this generation was recorded.
    pub hall_of_fame_score: f64,
}

/// The best individual seen so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallOfFame {
    /// Generation in which this individual was evaluated.
    pub generation: usize,
    pub values: ParamMap,
    pub objectives: Vec<f64>,
    pub score: f64,
}

/// Append-only log of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneticHistory {
    run_log: Vec<GenerationStats>,
    hall_of_fame: Option<HallOfFame>,
}

impl GeneticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_generations(&self) -> usize {
        self.run_log.len()
    }

    pub fn entries(&self) -> &[GenerationStats] {
        &self.run_log
    }

    pub fn last(&self) -> Option<&GenerationStats> {
        self.run_log.last()
    }

    pub fn hall_of_fame(&self) -> Option<&HallOfFame> {
        self.hall_of_fame.as_ref()
    }

    /// Hall-of-fame score after each generation. Never decreases.
    pub fn best_scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.run_log.iter().map(|s| s.hall_of_fame_score)
    }

    /// Summarizes an evaluated population and replaces the hall of fame only
    /// when this generation's best strictly improves on it.
    pub(crate) fn record(
        &mut self,
        generation: usize,
        population: &[Individual],
        records: &[FitnessRecord],
    ) -> Result<GenerationStats> {
        debug_assert_eq!(population.len(), records.len());

        let mut finite_sum = 0.0;
        let mut finite_count = 0usize;
        let mut worst = f64::NAN;
        for record in records {
            if record.score.is_nan() {
                continue;
            }
            finite_sum += record.score;
            finite_count += 1;
            if worst.is_nan() || record.score < worst {
                worst = record.score;
            }
        }
        let nan_count = records.len() - finite_count;
        if nan_count > 0 {
            tracing::warn!(generation, nan_count, "NaN aggregate scores in generation");
        }

        let best = best_position(records);
        if let Some(i) = best {
            let improves = self.hall_of_fame.as_ref().is_none_or(|hof| {
                compare_scores(records[i].score, hof.score) == Ordering::Greater
            });
            if improves {
                tracing::debug!(
                    generation,
                    score = records[i].score,
                    "hall of fame replaced"
                );
                self.hall_of_fame = Some(HallOfFame {
                    generation,
                    values: population[i].as_named_mapping()?,
                    objectives: records[i].objectives.clone(),
                    score: records[i].score,
                });
            }
        }

        let stats = GenerationStats {
            generation,
            best_score: best.map_or(f64::NAN, |i| records[i].score),
            mean_score: if finite_count == 0 {
                f64::NAN
            } else {
                finite_sum / finite_count as f64
            },
            worst_score: worst,
            nan_count,
            hall_of_fame_score: self.hall_of_fame.as_ref().map_or(f64::NAN, |h| h.score),
        };
        self.run_log.push(stats);
        Ok(stats)
    }
}
