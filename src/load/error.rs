use crate::data::FrameError;
use crate::error::{ErrorKind, GraphError, ParameterError};
use crate::parameters::interpolated::InterpolationError;
use crate::timestep::TimestepError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Parameter type name '{name}' is already registered to {existing}, cannot register {new}")]
    Conflict { name: String, existing: &'static str, new: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Unknown parameter type '{0}'")]
    UnknownType(String),
    #[error("No parameter named '{0}' has been loaded")]
    UnknownReference(String),
    #[error("Missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("Key '{key}' must be {expected}")]
    InvalidValue { key: String, expected: &'static str },
    #[error("Invalid aggregation function: {0}")]
    InvalidAggFunc(String),
    #[error("A parameter declaration must be a number, a name or an object, got {0}")]
    InvalidDeclaration(String),
    #[error("{0} not implemented")]
    NotImplemented(&'static str),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Timestep(#[from] TimestepError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownType(_) | Self::UnknownReference(_) => ErrorKind::Lookup,
            Self::NotImplemented(_) => ErrorKind::CapabilityGap,
            Self::Parameter(e) => e.kind(),
            Self::Graph(e) => e.kind(),
            _ => ErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid(key: &str, expected: &'static str) -> Self {
        Self::InvalidValue { key: key.to_string(), expected }
    }
}
