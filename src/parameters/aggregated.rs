//! Reduction of a set of child parameters to one value.
use super::{Inputs, Parameter};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::store::ParameterId;
use crate::timestep::Timestep;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub type CustomAggFunc = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// How an `AggregatedParameter` reduces its children's values.
///
/// Reductions see the whole value set at once. On an empty set each built-in
/// returns its identity: `sum = 0`, `product = 1`, `max = -inf`,
/// `min = +inf`; `mean` has none and returns `NaN`. A `NaN` child makes
/// `max` and `min` `NaN` as well.
#[derive(Clone)]
pub enum AggFunc {
    Mean,
    Sum,
    Max,
    Min,
    Product,
    Custom(CustomAggFunc),
}

impl AggFunc {
    pub fn custom(f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Max | Self::Min if values.iter().any(|v| v.is_nan()) => f64::NAN,
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Product => values.iter().product(),
            Self::Custom(f) => f(values),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Max => "max",
            Self::Min => "min",
            Self::Product => "product",
            Self::Custom(_) => "custom",
        }
    }
}

impl Default for AggFunc {
    fn default() -> Self { Self::Mean }
}

impl fmt::Debug for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AggFunc::{}", self.name())
    }
}

impl FromStr for AggFunc {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "product" => Ok(Self::Product),
            other => Err(ParameterError::UnknownAggFunc(other.to_string())),
        }
    }
}

/// A set of parameters combined by an `AggFunc`.
///
/// Membership is a true set: adding a child twice has no effect.
#[derive(Debug, Clone, Default)]
pub struct AggregatedParameter {
    parameters: BTreeSet<ParameterId>,
    agg_func: AggFunc,
}

impl AggregatedParameter {
    pub fn new(parameters: impl IntoIterator<Item = ParameterId>, agg_func: AggFunc) -> Self {
        Self { parameters: parameters.into_iter().collect(), agg_func }
    }

    pub fn len(&self) -> usize { self.parameters.len() }
    pub fn is_empty(&self) -> bool { self.parameters.is_empty() }
    pub fn contains(&self, id: ParameterId) -> bool { self.parameters.contains(&id) }
    pub fn agg_func(&self) -> &AggFunc { &self.agg_func }
}

impl Parameter for AggregatedParameter {
    fn type_name(&self) -> &'static str { "aggregated" }

    fn children(&self) -> Vec<ParameterId> { self.parameters.iter().copied().collect() }

    fn value(&self, _: &Timestep, _: &ScenarioIndex, inputs: &Inputs<'_>) -> Result<f64, ParameterError> {
        let values = self
            .parameters
            .iter()
            .map(|&p| inputs.value(p))
            .collect::<Result<SmallVec<[f64; 8]>, _>>()?;
        Ok(self.agg_func.apply(&values))
    }

    fn add_child(&mut self, child: ParameterId) -> Result<bool, ParameterError> {
        Ok(self.parameters.insert(child))
    }

    fn remove_child(&mut self, child: ParameterId) -> Result<bool, ParameterError> {
        Ok(self.parameters.remove(&child))
    }
}
