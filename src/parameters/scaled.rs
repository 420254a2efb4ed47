use super::{Inputs, Parameter};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::store::ParameterId;
use crate::timestep::Timestep;

/// `scale * profile`. Read-only: not tunable.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledProfileParameter {
    scale: f64,
    profile: ParameterId,
}

impl ScaledProfileParameter {
    pub fn new(scale: f64, profile: ParameterId) -> Self {
        Self { scale, profile }
    }

    pub fn scale(&self) -> f64 { self.scale }
}

impl Parameter for ScaledProfileParameter {
    fn type_name(&self) -> &'static str { "scaledprofile" }

    fn children(&self) -> Vec<ParameterId> { vec![self.profile] }

    fn value(&self, _: &Timestep, _: &ScenarioIndex, inputs: &Inputs<'_>) -> Result<f64, ParameterError> {
        Ok(self.scale * inputs.value(self.profile)?)
    }
}
