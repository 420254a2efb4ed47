//! Error types shared by the parameter graph.
//!
//! Every failure raised while building, setting up or evaluating the graph is a
//! `ParameterError` (or wraps one). `ParameterError::kind` buckets the variants
//! into the four classes callers act on differently.
use crate::data::{AlignmentError, FrameError};
use crate::parameters::interpolated::InterpolationError;
use crate::store::ParameterId;
use thiserror::Error;

/// Broad class of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad declarative or programmatic input. Fix the model, do not retry.
    Configuration,
    /// A feature that is not implemented yet.
    CapabilityGap,
    /// A reference to something that does not exist.
    Lookup,
    /// Failure while evaluating a timestep.
    Runtime,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Unknown aggregation function '{0}'")]
    UnknownAggFunc(String),
    #[error("{expected} values must be given for a {profile} profile, got {actual}")]
    InvalidProfileLength { profile: &'static str, expected: usize, actual: usize },
    #[error("Update expects {expected} values, got {actual}")]
    InvalidUpdateLength { expected: usize, actual: usize },
    #[error("Update requires at least one value")]
    EmptyUpdate,
    #[error("Bounds vectors must have length {size} (lower={lower}, upper={upper})")]
    BoundsLength { size: usize, lower: usize, upper: usize },
    #[error("Scenario must be given for a table input with {columns} columns")]
    ScenarioRequired { columns: usize },
    #[error("Scenario '{scenario}' size ({size}) is different to the number of columns ({columns}) in the table input")]
    ScenarioSizeMismatch { scenario: String, size: usize, columns: usize },
    #[error("Scenario '{0}' is not defined in the model")]
    UnknownScenario(String),
    #[error("Series has {actual} values but the model has {expected} timesteps")]
    SeriesLength { expected: usize, actual: usize },
    #[error(transparent)]
    Alignment(#[from] AlignmentError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("Parameter {child} is not a child of {parent}")]
    ChildNotFound { parent: ParameterId, child: ParameterId },
    #[error("Parameter type '{0}' has a fixed set of children")]
    FixedChildren(&'static str),
    #[error("Parameter {0} does not exist")]
    UnknownParameter(ParameterId),
    #[error("No volume recorded for storage node '{0}'")]
    UnknownNode(String),
    #[error("Value of parameter {0} requested before it was computed")]
    NotEvaluated(ParameterId),
    #[error("Parameter '{0}' used before setup")]
    NotSetUp(String),
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
    #[error("Error calculating value for parameter '{name}': {source}")]
    Calculation { name: String, #[source] source: Box<ParameterError> },
}

impl ParameterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAggFunc(_)
            | Self::InvalidProfileLength { .. }
            | Self::InvalidUpdateLength { .. }
            | Self::EmptyUpdate
            | Self::BoundsLength { .. }
            | Self::ScenarioRequired { .. }
            | Self::ScenarioSizeMismatch { .. }
            | Self::SeriesLength { .. }
            | Self::Frame(_)
            | Self::FixedChildren(_) => ErrorKind::Configuration,
            Self::Alignment(e) => e.kind(),
            Self::ChildNotFound { .. }
            | Self::UnknownParameter(_)
            | Self::UnknownScenario(_)
            | Self::UnknownNode(_) => ErrorKind::Lookup,
            Self::NotEvaluated(_) | Self::NotSetUp(_) | Self::Interpolation(_) => ErrorKind::Runtime,
            Self::Calculation { source, .. } => source.kind(),
        }
    }
}

/// Structural errors raised by the parameter store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph topology is frozen between setup and reset")]
    Frozen,
    #[error("Parameter {0} does not exist")]
    UnknownParameter(ParameterId),
    #[error("A parameter named '{0}' already exists")]
    DuplicateName(String),
    #[error("Cycle detected involving parameter {0}")]
    CycleDetected(ParameterId),
    #[error("Error setting up parameter '{name}': {source}")]
    Setup { name: String, #[source] source: ParameterError },
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Frozen | Self::DuplicateName(_) | Self::CycleDetected(_) => ErrorKind::Configuration,
            Self::UnknownParameter(_) => ErrorKind::Lookup,
            Self::Setup { source, .. } => source.kind(),
            Self::Parameter(e) => e.kind(),
        }
    }
}
