//! Parameter evaluation graph for a water-resource network simulator.
//!
//! Parameters are arena nodes in a `ParameterStore`, linked by id. A `Model`
//! sets the store up on a timestepper grid, evaluates it once per timestep for
//! every scenario of the ensemble and hands the values to a `Solver`, which
//! writes back the network state read by state-dependent parameters.
//! Graphs can be built in code or declared as JSON and built with a `Loader`.
pub mod analysis;
pub mod compute;
pub mod config;
pub mod data;
pub mod display;
pub mod error;
pub mod load;
pub mod model;
pub mod parameters;
pub mod scenario;
pub mod state;
pub mod store;
pub mod timestep;
pub mod tuning;

pub use config::RunConfig;
pub use error::{ErrorKind, GraphError, ParameterError};
pub use load::{InlineTableSource, LoadError, Loader, TypeRegistry};
pub use model::{Model, ModelError, NullSolver, Recording, Solver};
pub use parameters::{Parameter, Tunable};
pub use scenario::{Scenario, ScenarioCollection, ScenarioIndex};
pub use state::NetworkState;
pub use store::{ParameterId, ParameterStore};
pub use timestep::{Frequency, Timestep, Timestepper};
pub use tuning::TuningProblem;
