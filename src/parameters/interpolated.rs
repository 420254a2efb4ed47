//! Reservoir level from current storage volume.
use super::{Inputs, Parameter};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::timestep::Timestep;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("Volume {value} is outside the interpolation range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
    #[error("Got {volumes} volumes but {levels} levels")]
    LengthMismatch { volumes: usize, levels: usize },
    #[error("Interpolation needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("Volumes must be strictly increasing (position {0})")]
    NotIncreasing(usize),
    #[error("Unknown interpolation kind '{0}'")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationKind {
    #[default]
    Linear,
    /// Closest point; ties go to the lower point.
    Nearest,
    Previous,
    Next,
}

impl FromStr for InterpolationKind {
    type Err = InterpolationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            "previous" => Ok(Self::Previous),
            "next" => Ok(Self::Next),
            other => Err(InterpolationError::UnknownKind(other.to_string())),
        }
    }
}

/// One-dimensional interpolator over a fixed, validated table.
#[derive(Debug, Clone, PartialEq)]
pub struct Interp1d {
    x: Vec<f64>,
    y: Vec<f64>,
    kind: InterpolationKind,
    bounds_error: bool,
}

impl Interp1d {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        kind: InterpolationKind,
        bounds_error: bool,
    ) -> Result<Self, InterpolationError> {
        if x.len() != y.len() {
            return Err(InterpolationError::LengthMismatch { volumes: x.len(), levels: y.len() });
        }
        if x.len() < 2 {
            return Err(InterpolationError::TooFewPoints(x.len()));
        }
        if let Some(pos) = x.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(InterpolationError::NotIncreasing(pos + 1));
        }
        Ok(Self { x, y, kind, bounds_error })
    }

    pub fn kind(&self) -> InterpolationKind { self.kind }

    pub fn eval(&self, v: f64) -> Result<f64, InterpolationError> {
        let n = self.x.len();
        let (min, max) = (self.x[0], self.x[n - 1]);
        if v.is_nan() || ((v < min || v > max) && self.bounds_error) {
            return Err(InterpolationError::OutOfRange { value: v, min, max });
        }
        if v <= min {
            return Ok(self.y[0]);
        }
        if v >= max {
            return Ok(self.y[n - 1]);
        }

        // x[hi - 1] <= v < x[hi]
        let hi = self.x.partition_point(|&x| x <= v);
        let lo = hi - 1;
        if self.x[lo] == v {
            return Ok(self.y[lo]);
        }
        let (x0, x1, y0, y1) = (self.x[lo], self.x[hi], self.y[lo], self.y[hi]);
        Ok(match self.kind {
            InterpolationKind::Linear => y0 + (v - x0) * (y1 - y0) / (x1 - x0),
            InterpolationKind::Nearest => {
                if v - x0 <= x1 - v { y0 } else { y1 }
            }
            InterpolationKind::Previous => y0,
            InterpolationKind::Next => y1,
        })
    }
}

/// Level of a storage node, interpolated from its current volume.
///
/// Depends on the live network state, so it is only meaningful after the
/// solver has written the volumes of the current timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedLevelParameter {
    node: String,
    interp: Interp1d,
}

impl InterpolatedLevelParameter {
    pub fn new(node: impl Into<String>, interp: Interp1d) -> Self {
        Self { node: node.into(), interp }
    }

    pub fn node(&self) -> &str { &self.node }
}

impl Parameter for InterpolatedLevelParameter {
    fn type_name(&self) -> &'static str { "interpolatedlevel" }

    fn value(&self, _: &Timestep, scenario_index: &ScenarioIndex, inputs: &Inputs<'_>) -> Result<f64, ParameterError> {
        let volume = inputs.state().volume(&self.node, scenario_index.global_id)?;
        Ok(self.interp.eval(volume)?)
    }

    fn reads_network_state(&self) -> bool { true }
}
