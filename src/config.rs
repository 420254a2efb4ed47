use crate::scenario::ScenarioCollection;
use crate::timestep::Timestepper;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Extract(#[from] figment::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Everything a run needs besides the parameter graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub timestepper: Timestepper,
    #[serde(default)]
    pub scenarios: ScenarioCollection,
    /// Evaluate scenarios of a timestep in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool { true }

impl RunConfig {
    pub fn new(timestepper: Timestepper) -> Self {
        Self { timestepper, scenarios: ScenarioCollection::default(), parallel: default_parallel() }
    }

    /// Reads a TOML file, then applies `HYDRO__` environment overrides
    /// (`HYDRO__PARALLEL=false`, `HYDRO__TIMESTEPPER__END=2001-01-01`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HYDRO__").split("__"));
        Ok(figment.extract()?)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}
