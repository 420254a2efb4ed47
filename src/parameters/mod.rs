//! The parameter contract and the built-in parameter types.
//!
//! A parameter produces one `f64` per (timestep, scenario). Parameters live in
//! a `ParameterStore` arena and refer to the parameters they depend on
//! (their children) by `ParameterId`. Child values are never pulled by
//! recursion: the engine computes every parameter once per (timestep,
//! scenario) in topological order and a parameter reads its children's
//! results from the per-scenario `Ledger` through `Inputs`.
use crate::compute::Ledger;
use crate::error::ParameterError;
use crate::scenario::{ScenarioCollection, ScenarioIndex};
use crate::state::NetworkState;
use crate::store::ParameterId;
use crate::timestep::{DatetimeIndex, Timestep};
use std::fmt::Debug;

pub mod aggregated;
pub mod constant;
pub mod dataframe;
pub mod function;
pub mod interpolated;
pub mod kernels;
pub mod monthly;
pub mod properties;
pub mod scaled;

pub use aggregated::{AggFunc, AggregatedParameter};
pub use constant::ConstantParameter;
pub use dataframe::DataFrameParameter;
pub use function::FunctionParameter;
pub use interpolated::{Interp1d, InterpolatedLevelParameter, InterpolationKind};
pub use kernels::{
    ArrayIndexedParameter, ArrayIndexedScenarioParameter, ConstantScenarioParameter, DailyProfileParameter,
};
pub use monthly::MonthlyProfileParameter;
pub use properties::Properties;
pub use scaled::ScaledProfileParameter;

/// Read access to already computed values while evaluating one parameter.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    ledger: &'a Ledger,
    state: &'a NetworkState,
}

impl<'a> Inputs<'a> {
    pub fn new(ledger: &'a Ledger, state: &'a NetworkState) -> Self {
        Self { ledger, state }
    }

    /// Value of a child for the current (timestep, scenario).
    #[inline]
    pub fn value(&self, id: ParameterId) -> Result<f64, ParameterError> {
        self.ledger.require(id)
    }

    pub fn state(&self) -> &'a NetworkState { self.state }
}

/// Everything a parameter may consult while preparing for a run.
///
/// Parameters that derive new kernels at setup hand them to `spawn`; the store
/// inserts them as generated children of the spawning parameter once its
/// `setup` returns.
pub struct SetupContext<'a> {
    pub index: &'a DatetimeIndex,
    pub scenarios: &'a ScenarioCollection,
    next_id: usize,
    spawned: Vec<Box<dyn Parameter>>,
}

impl<'a> SetupContext<'a> {
    pub(crate) fn new(index: &'a DatetimeIndex, scenarios: &'a ScenarioCollection, next_id: usize) -> Self {
        Self { index, scenarios, next_id, spawned: Vec::new() }
    }

    /// Reserves an id for `parameter`. The id becomes valid when the caller's
    /// `setup` returns `Ok`.
    pub fn spawn(&mut self, parameter: Box<dyn Parameter>) -> ParameterId {
        let id = ParameterId::new(self.next_id + self.spawned.len());
        self.spawned.push(parameter);
        id
    }

    pub(crate) fn into_spawned(self) -> Vec<Box<dyn Parameter>> { self.spawned }
}

/// A node of the parameter graph.
///
/// `value` must not mutate anything: it is called concurrently for every
/// scenario of a timestep. Mutable, time-evolving state belongs in `after`.
pub trait Parameter: Send + Sync + Debug {
    /// Short type name, also used as the registry key.
    fn type_name(&self) -> &'static str;

    /// Parameters this one reads. Order is irrelevant.
    fn children(&self) -> Vec<ParameterId> { Vec::new() }

    fn value(
        &self,
        timestep: &Timestep,
        scenario_index: &ScenarioIndex,
        inputs: &Inputs<'_>,
    ) -> Result<f64, ParameterError>;

    /// Prepares derived state for a run. Called once per run, after every
    /// child has been set up.
    fn setup(&mut self, _ctx: &mut SetupContext<'_>) -> Result<(), ParameterError> { Ok(()) }

    /// Called once per timestep after every parameter was evaluated for
    /// every scenario.
    fn after(&mut self, _timestep: &Timestep) -> Result<(), ParameterError> { Ok(()) }

    /// Returns to the pre-setup state.
    fn reset(&mut self) {}

    /// Adds a child. Returns `false` if it was already present.
    fn add_child(&mut self, _child: ParameterId) -> Result<bool, ParameterError> {
        Err(ParameterError::FixedChildren(self.type_name()))
    }

    /// Removes a child. Returns `false` if it was not present.
    fn remove_child(&mut self, _child: ParameterId) -> Result<bool, ParameterError> {
        Err(ParameterError::FixedChildren(self.type_name()))
    }

    /// True if `value` reads the live network state, which makes it valid
    /// only after the solver has written the current timestep's state.
    fn reads_network_state(&self) -> bool { false }

    fn as_tunable(&self) -> Option<&dyn Tunable> { None }

    fn as_tunable_mut(&mut self) -> Option<&mut dyn Tunable> { None }
}

/// A parameter an optimizer may treat as part of a flat decision vector.
pub trait Tunable {
    fn size(&self) -> usize;
    fn lower_bounds(&self) -> &[f64];
    fn upper_bounds(&self) -> &[f64];
    fn current_values(&self) -> Vec<f64>;
    /// Replaces the whole value vector.
    fn update(&mut self, values: &[f64]) -> Result<(), ParameterError>;
}

/// Per-element bounds shared by the tunable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    /// Broadcasts scalar bounds to `size` elements.
    pub fn broadcast(size: usize, lower: f64, upper: f64) -> Self {
        Self { lower: vec![lower; size], upper: vec![upper; size] }
    }

    pub fn from_vectors(size: usize, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, ParameterError> {
        if lower.len() != size || upper.len() != size {
            return Err(ParameterError::BoundsLength { size, lower: lower.len(), upper: upper.len() });
        }
        Ok(Self { lower, upper })
    }

    pub fn unbounded_above(size: usize) -> Self { Self::broadcast(size, 0.0, f64::INFINITY) }
}
