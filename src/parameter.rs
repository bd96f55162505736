//! Search-space dimensions.
//!
//! A [`Parameter`] names one dimension of the search space and knows how to
//! draw a legal value from it. Integer and real parameters describe a closed
//! range discretized at a fixed step; categorical and flag parameters list
//! their members explicitly.
//!
//! Every parameter owns a seeded [`Pcg64`] stream. Drawing a value advances
//! only that stream, so two parameters never interfere with each other and a
//! run is reproducible as long as the draw order stays the same.

use crate::error::{EvolveError, Result};
use rand::prelude::SeedableRng;
use rand::Rng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Seed given to a parameter's stream when the caller does not pick one.
pub const DEFAULT_PARAMETER_SEED: u64 = 1234;

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float. Integers are widened.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Real(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Identity used for categorical membership: reals compare by bit pattern
    /// so that a `NaN` category can still be found again.
    fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Real(a), Value::Real(b)) => a.to_bits() == b.to_bits() || a == b,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Real(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Text(v.to_string())
    }
}

/// The declared shape of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    Integer { min: i64, max: i64, step: i64 },
    Real { min: f64, max: f64, step: f64 },
    Categorical,
    Flag,
}

/// Members of a discretized range are generated on demand rather than stored.
#[derive(Debug, Clone)]
enum Domain {
    Integer {
        min: i64,
        step: i64,
        count: u128,
    },
    Real {
        min: f64,
        max: f64,
        step: f64,
        count: u128,
        /// `10^d` for the decimal places of `min` and `step`, when they have
        /// a short decimal form.
        scale: Option<f64>,
    },
    Explicit(Vec<Value>),
}

/// Relative slack when counting the steps of a real range, so that
/// `[10, 20]` at `0.1` keeps `20` despite rounding.
const REAL_STEP_EPSILON: f64 = 1e-9;

/// Longest decimal expansion snapped to.
const MAX_DECIMAL_PLACES: i32 = 15;

/// Absolute slack on `x * 10^d` when looking for a whole number.
const DECIMAL_SLACK: f64 = 1e-6;

/// Number of decimal places needed to write `x`, if it is at most
/// [`MAX_DECIMAL_PLACES`].
fn decimal_places(x: f64) -> Option<i32> {
    (0..=MAX_DECIMAL_PLACES).find(|&d| {
        let scaled = x * 10f64.powi(d);
        (scaled - scaled.round()).abs() <= DECIMAL_SLACK
    })
}

impl Domain {
    fn len(&self) -> u128 {
        match self {
            Domain::Integer { count, .. } | Domain::Real { count, .. } => *count,
            Domain::Explicit(values) => values.len() as u128,
        }
    }

    /// Caller guarantees `k < self.len()`.
    fn member(&self, k: u128) -> Value {
        match self {
            Domain::Integer { min, step, .. } => {
                Value::Int((*min as i128 + k as i128 * *step as i128) as i64)
            }
            Domain::Real {
                min,
                max,
                step,
                scale,
                ..
            } => {
                let raw = min + k as f64 * step;
                // `round(x * 10^d) / 10^d` is the closest f64 to the decimal
                // grid point, so `-0.3 + 1 * 0.1` comes out as `-0.2`.
                let snapped = scale.map_or(raw, |scale| (raw * scale).round() / scale);
                Value::Real(snapped.clamp(*min, *max))
            }
            Domain::Explicit(values) => values[k as usize].clone(),
        }
    }

    fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Domain::Integer { min, step, count }, Value::Int(v)) => {
                let offset = *v as i128 - *min as i128;
                offset >= 0
                    && offset % *step as i128 == 0
                    && ((offset / *step as i128) as u128) < *count
            }
            (Domain::Real { min, step, count, .. }, Value::Real(v)) => {
                if !v.is_finite() {
                    return false;
                }
                let k = ((v - min) / step).round();
                if k < 0.0 || k >= *count as f64 {
                    return false;
                }
                match self.member(k as u128) {
                    Value::Real(expected) => (expected - v).abs() <= step * REAL_STEP_EPSILON,
                    _ => false,
                }
            }
            (Domain::Explicit(values), v) => values.iter().any(|m| m.same_as(v)),
            _ => false,
        }
    }
}

/// One dimension of the search space.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    kind: ParameterKind,
    domain: Domain,
    seed: u64,
    rng: Pcg64,
}

impl Parameter {
    fn build(name: &str, kind: ParameterKind, domain: Domain) -> Result<Self> {
        if name.is_empty() {
            return Err(EvolveError::invalid_domain(name, "name must not be empty"));
        }
        if domain.len() == 0 {
            return Err(EvolveError::invalid_domain(name, "domain is empty"));
        }
        Ok(Self {
            name: name.to_owned(),
            kind,
            domain,
            seed: DEFAULT_PARAMETER_SEED,
            rng: Pcg64::seed_from_u64(DEFAULT_PARAMETER_SEED),
        })
    }

    /// Integer parameter over `[min, max]` with unit step.
    pub fn integer(name: &str, min: i64, max: i64) -> Result<Self> {
        Self::integer_stepped(name, min, max, 1)
    }

    /// Integer parameter over `min, min + step, ...` up to and including `max`
    /// when it lies on the grid.
    pub fn integer_stepped(name: &str, min: i64, max: i64, step: i64) -> Result<Self> {
        if step <= 0 {
            return Err(EvolveError::invalid_domain(
                name,
                format!("step must be positive, got {step}"),
            ));
        }
        if max < min {
            return Err(EvolveError::invalid_domain(
                name,
                format!("max ({max}) is smaller than min ({min})"),
            ));
        }
        // At most 2^64 members, which always fits.
        let count = ((max as i128 - min as i128) / step as i128 + 1) as u128;
        Self::build(
            name,
            ParameterKind::Integer { min, max, step },
            Domain::Integer { min, step, count },
        )
    }

    /// Real parameter over `[min, max]` discretized at `step`.
    pub fn real(name: &str, min: f64, max: f64, step: f64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(EvolveError::invalid_domain(
                name,
                "bounds and step must be finite",
            ));
        }
        if step <= 0.0 {
            return Err(EvolveError::invalid_domain(
                name,
                format!("step must be positive, got {step}"),
            ));
        }
        if max < min {
            return Err(EvolveError::invalid_domain(
                name,
                format!("max ({max}) is smaller than min ({min})"),
            ));
        }
        let steps = ((max - min) / step + REAL_STEP_EPSILON).floor();
        if !steps.is_finite() || steps >= u128::MAX as f64 {
            return Err(EvolveError::invalid_domain(
                name,
                "range has more values than can be indexed",
            ));
        }
        Self::build(
            name,
            ParameterKind::Real { min, max, step },
            Domain::Real {
                min,
                max,
                step,
                count: steps as u128 + 1,
                scale: decimal_places(min)
                    .zip(decimal_places(step))
                    .map(|(a, b)| 10f64.powi(a.max(b))),
            },
        )
    }

    /// Categorical parameter over an explicit set of distinct values.
    pub fn categorical<I, V>(name: &str, categories: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut members: Vec<Value> = Vec::new();
        for category in categories {
            let category = category.into();
            if members.iter().any(|m| m.same_as(&category)) {
                return Err(EvolveError::invalid_domain(
                    name,
                    format!("category `{category}` is listed more than once"),
                ));
            }
            members.push(category);
        }
        if members.is_empty() {
            return Err(EvolveError::invalid_domain(name, "no categories given"));
        }
        Self::build(name, ParameterKind::Categorical, Domain::Explicit(members))
    }

    /// Boolean flag parameter over `{0, 1}`.
    pub fn flag(name: &str) -> Result<Self> {
        Self::build(
            name,
            ParameterKind::Flag,
            Domain::Explicit(vec![Value::Int(0), Value::Int(1)]),
        )
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Restarts the parameter's stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = Pcg64::seed_from_u64(seed);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of legal values.
    pub fn len(&self) -> u128 {
        self.domain.len()
    }

    /// Always false: construction rejects empty domains.
    pub fn is_empty(&self) -> bool {
        self.domain.len() == 0
    }

    /// The k-th legal value, in ascending order for ranges and declaration
    /// order for explicit sets.
    pub fn value_at(&self, k: u128) -> Option<Value> {
        (k < self.domain.len()).then(|| self.domain.member(k))
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.domain.len()).map(|k| self.domain.member(k))
    }

    /// Draws a value uniformly from the domain, advancing this parameter's
    /// stream only.
    pub fn draw_random(&mut self) -> Value {
        let k = self.rng.random_range(0..self.domain.len());
        self.domain.member(k)
    }

    pub fn validate(&self, value: &Value) -> bool {
        self.domain.contains(value)
    }
}

/// Ordered parameter names plus a name to position index.
///
/// Shared by every individual built from the same [`SearchSpace`].
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Layout {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A validated, ordered set of parameters: non-empty, with unique names.
///
/// The space owns each parameter's random stream; individuals only borrow it
/// when they need fresh values.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    parameters: Vec<Parameter>,
    layout: Arc<Layout>,
}

impl SearchSpace {
    pub fn new(parameters: Vec<Parameter>) -> Result<Self> {
        if parameters.is_empty() {
            return Err(EvolveError::NoParameters);
        }
        let mut index = HashMap::with_capacity(parameters.len());
        for (position, parameter) in parameters.iter().enumerate() {
            if index.insert(parameter.name.clone(), position).is_some() {
                return Err(EvolveError::DuplicateParameterName {
                    name: parameter.name.clone(),
                });
            }
        }
        let names = parameters.iter().map(|p| p.name.clone()).collect();
        Ok(Self {
            parameters,
            layout: Arc::new(Layout { names, index }),
        })
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.layout.position(name).map(|i| &self.parameters[i])
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    /// Caller guarantees `position < self.len()`.
    pub(crate) fn draw(&mut self, position: usize) -> Value {
        self.parameters[position].draw_random()
    }

    pub(crate) fn check_shape(&self, layout: &Layout) -> Result<()> {
        if std::ptr::eq(Arc::as_ptr(&self.layout), layout) || *self.layout == *layout {
            Ok(())
        } else {
            Err(EvolveError::ShapeMismatch {
                expected: self.layout.len(),
                actual: layout.len(),
            })
        }
    }

    /// Checks that `values` has one legal value per parameter.
    pub fn validate(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.parameters.len() {
            return Err(EvolveError::ShapeMismatch {
                expected: self.parameters.len(),
                actual: values.len(),
            });
        }
        for (parameter, value) in self.parameters.iter().zip(values) {
            if !parameter.validate(value) {
                return Err(EvolveError::ValueOutOfDomain {
                    name: parameter.name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}
