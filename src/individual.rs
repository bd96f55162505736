//! Candidate solutions.

use crate::error::{EvolveError, Result};
use crate::parameter::{Layout, SearchSpace, Value};
use rand::prelude::SeedableRng;
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

/// One concrete value per parameter, aligned with the search space's order.
///
/// An individual keeps its own [`Pcg64`] stream for choosing which positions
/// to mutate. Replacement values come from the parameters' streams, which the
/// [`SearchSpace`] owns, so the space is passed in explicitly whenever new
/// values are needed.
#[derive(Debug, Clone)]
pub struct Individual {
    layout: Arc<Layout>,
    values: Vec<Value>,
    rng: Pcg64,
}

impl PartialEq for Individual {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.layout == other.layout
    }
}

impl Individual {
    /// Creates an individual with no values yet.
    pub fn new(space: &SearchSpace, seed: u64) -> Self {
        Self {
            layout: Arc::clone(space.layout()),
            values: Vec::new(),
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Creates an individual and fills every position with a random draw.
    pub fn random(space: &mut SearchSpace, seed: u64) -> Self {
        let mut individual = Self::new(space, seed);
        individual.values = (0..space.len()).map(|i| space.draw(i)).collect();
        individual
    }

    /// Creates an individual from explicit values, rejecting any value that is
    /// not legal for its position.
    pub fn from_values(space: &SearchSpace, values: Vec<Value>, seed: u64) -> Result<Self> {
        space.validate(&values)?;
        Ok(Self {
            layout: Arc::clone(space.layout()),
            values,
            rng: Pcg64::seed_from_u64(seed),
        })
    }

    /// A child with the same shape as `self`, holding `values` and a fresh
    /// stream. Used by crossover operators; the values are not validated here.
    pub fn offspring(&self, values: Vec<Value>, seed: u64) -> Self {
        debug_assert_eq!(values.len(), self.layout.len());
        Self {
            layout: Arc::clone(&self.layout),
            values,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    /// Overwrites every position with a fresh draw from its parameter.
    pub fn randomize(&mut self, space: &mut SearchSpace) -> Result<&mut Self> {
        space.check_shape(&self.layout)?;
        self.values = (0..space.len()).map(|i| space.draw(i)).collect();
        Ok(self)
    }

    /// Picks `mutation_size` distinct positions (clamped to the number of
    /// parameters) and redraws each one with probability
    /// `mutation_probability`.
    ///
    /// At most `mutation_size` positions change per call.
    pub fn mutate(
        &mut self,
        space: &mut SearchSpace,
        mutation_size: usize,
        mutation_probability: f64,
    ) -> Result<&mut Self> {
        if !self.is_initialized() {
            return Err(EvolveError::UninitializedIndividual);
        }
        if !(0.0..=1.0).contains(&mutation_probability) {
            return Err(EvolveError::invalid_config(
                "mutation_probability",
                format!("must be within [0, 1], got {mutation_probability}"),
            ));
        }
        space.check_shape(&self.layout)?;

        let amount = mutation_size.min(self.values.len());
        let positions = rand::seq::index::sample(&mut self.rng, self.values.len(), amount);
        for position in positions.into_iter() {
            if self.rng.random_bool(mutation_probability) {
                self.values[position] = space.draw(position);
            }
        }
        Ok(self)
    }

    pub fn is_initialized(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of positions in the individual's shape.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.layout
            .position(name)
            .and_then(|position| self.values.get(position))
    }

    /// Name to value mapping handed to the fitness function.
    pub fn as_named_mapping(&self) -> Result<ParamMap> {
        if !self.is_initialized() {
            return Err(EvolveError::UninitializedIndividual);
        }
        Ok(self
            .layout
            .names()
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect())
    }

    /// Checks the shape and every value against `space`.
    pub fn validate(&self, space: &SearchSpace) -> Result<()> {
        if !self.is_initialized() {
            return Err(EvolveError::UninitializedIndividual);
        }
        space.check_shape(&self.layout)?;
        space.validate(&self.values)
    }

    /// Restarts the individual's own stream.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64::seed_from_u64(seed);
    }
}

/// Parameter values keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap(BTreeMap<String, Value>);

impl ParamMap {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn real(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_real)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for ParamMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ParamMap {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
