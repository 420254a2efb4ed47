use super::{Bounds, Inputs, Parameter, Tunable};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::timestep::Timestep;

/// Twelve values, one per calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyProfileParameter {
    values: [f64; 12],
    bounds: Bounds,
}

impl MonthlyProfileParameter {
    pub const SIZE: usize = 12;

    pub fn new(values: &[f64]) -> Result<Self, ParameterError> {
        Self::with_bounds(values, 0.0, f64::INFINITY)
    }

    pub fn with_bounds(values: &[f64], lower: f64, upper: f64) -> Result<Self, ParameterError> {
        let values: [f64; 12] = values.try_into().map_err(|_| ParameterError::InvalidProfileLength {
            profile: "monthly",
            expected: Self::SIZE,
            actual: values.len(),
        })?;
        Ok(Self { values, bounds: Bounds::broadcast(Self::SIZE, lower, upper) })
    }

    pub fn with_bound_vectors(values: &[f64], lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, ParameterError> {
        let mut p = Self::new(values)?;
        p.bounds = Bounds::from_vectors(Self::SIZE, lower, upper)?;
        Ok(p)
    }

    pub fn values(&self) -> &[f64; 12] { &self.values }
}

impl Parameter for MonthlyProfileParameter {
    fn type_name(&self) -> &'static str { "monthlyprofile" }

    fn value(&self, timestep: &Timestep, _: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        Ok(self.values[(timestep.month() - 1) as usize])
    }

    fn as_tunable(&self) -> Option<&dyn Tunable> { Some(self) }
    fn as_tunable_mut(&mut self) -> Option<&mut dyn Tunable> { Some(self) }
}

impl Tunable for MonthlyProfileParameter {
    fn size(&self) -> usize { Self::SIZE }
    fn lower_bounds(&self) -> &[f64] { &self.bounds.lower }
    fn upper_bounds(&self) -> &[f64] { &self.bounds.upper }
    fn current_values(&self) -> Vec<f64> { self.values.to_vec() }

    fn update(&mut self, values: &[f64]) -> Result<(), ParameterError> {
        if values.len() != Self::SIZE {
            return Err(ParameterError::InvalidUpdateLength { expected: Self::SIZE, actual: values.len() });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }
}
