use super::{Bounds, Inputs, Parameter, Tunable};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::timestep::Timestep;

/// A single scalar, identical for every timestep and scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantParameter {
    value: f64,
    bounds: Bounds,
}

impl ConstantParameter {
    pub const SIZE: usize = 1;

    /// Bounds default to `[0, +inf)`.
    pub fn new(value: f64) -> Self {
        Self { value, bounds: Bounds::unbounded_above(Self::SIZE) }
    }

    pub fn with_bounds(value: f64, lower: f64, upper: f64) -> Self {
        Self { value, bounds: Bounds::broadcast(Self::SIZE, lower, upper) }
    }

    pub fn get(&self) -> f64 { self.value }
}

impl Parameter for ConstantParameter {
    fn type_name(&self) -> &'static str { "constant" }

    fn value(&self, _: &Timestep, _: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        Ok(self.value)
    }

    fn as_tunable(&self) -> Option<&dyn Tunable> { Some(self) }
    fn as_tunable_mut(&mut self) -> Option<&mut dyn Tunable> { Some(self) }
}

impl Tunable for ConstantParameter {
    fn size(&self) -> usize { Self::SIZE }
    fn lower_bounds(&self) -> &[f64] { &self.bounds.lower }
    fn upper_bounds(&self) -> &[f64] { &self.bounds.upper }
    fn current_values(&self) -> Vec<f64> { vec![self.value] }

    /// Takes the first element; extra elements are ignored.
    fn update(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        self.value = *values.first().ok_or(ParameterError::EmptyUpdate)?;
        Ok(())
    }
}
