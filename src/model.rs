//! Run driver: owns the store, the run configuration and the network state,
//! and steps the parameter graph through the timestepper's grid.
//!
//! One timestep is:
//! 1. every scheduled parameter evaluated once per scenario,
//! 2. the `Solver` hook writes the network state for the timestep,
//! 3. state-dependent parameters and their dependants are re-evaluated,
//! 4. `after` is called on every parameter.
use crate::compute::{Compiler, Engine, Ledger, Program};
use crate::config::RunConfig;
use crate::error::{ErrorKind, GraphError, ParameterError};
use crate::scenario::ScenarioIndex;
use crate::state::NetworkState;
use crate::store::{ParameterId, ParameterStore};
use crate::timestep::{Timestep, TimestepError};
use crate::tuning::TuningProblem;
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Timestep(#[from] TimestepError),
    #[error("Model must be set up before it can be stepped")]
    NotSetUp,
    #[error("Scenario member {global_id} out of range (ensemble has {count})")]
    ScenarioOutOfRange { global_id: usize, count: usize },
    #[error("Solver failed at {date}: {message}")]
    Solver { date: NaiveDateTime, message: String },
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Graph(e) => e.kind(),
            Self::Parameter(e) => e.kind(),
            Self::Timestep(_) => ErrorKind::Configuration,
            Self::ScenarioOutOfRange { .. } => ErrorKind::Lookup,
            Self::NotSetUp | Self::Solver { .. } => ErrorKind::Runtime,
        }
    }
}

/// Writes the network state of a timestep from the parameter values of the
/// first evaluation pass.
pub trait Solver {
    fn solve(
        &mut self,
        timestep: &Timestep,
        scenarios: &[ScenarioIndex],
        ledgers: &[Ledger],
        state: &mut NetworkState,
    ) -> Result<(), ModelError>;
}

impl<F> Solver for F
where
    F: FnMut(&Timestep, &[ScenarioIndex], &[Ledger], &mut NetworkState) -> Result<(), ModelError>,
{
    fn solve(
        &mut self,
        timestep: &Timestep,
        scenarios: &[ScenarioIndex],
        ledgers: &[Ledger],
        state: &mut NetworkState,
    ) -> Result<(), ModelError> {
        self(timestep, scenarios, ledgers, state)
    }
}

/// Leaves the network state untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSolver;

impl Solver for NullSolver {
    fn solve(&mut self, _: &Timestep, _: &[ScenarioIndex], _: &[Ledger], _: &mut NetworkState) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Values of selected parameters for every (timestep, scenario) of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    targets: Vec<ParameterId>,
    timesteps: Vec<Timestep>,
    scenario_count: usize,
    values: Vec<f64>,
}

impl Recording {
    pub fn targets(&self) -> &[ParameterId] { &self.targets }
    pub fn timesteps(&self) -> &[Timestep] { &self.timesteps }
    pub fn scenario_count(&self) -> usize { self.scenario_count }

    /// Value of the `k`-th target at timestep `t` for scenario member
    /// `global_id`.
    pub fn get(&self, t: usize, global_id: usize, k: usize) -> Option<f64> {
        let n = self.targets.len();
        if t >= self.timesteps.len() || global_id >= self.scenario_count || k >= n {
            return None;
        }
        self.values.get((t * self.scenario_count + global_id) * n + k).copied()
    }

    /// Time series of the `k`-th target for one scenario member.
    pub fn series(&self, global_id: usize, k: usize) -> Vec<f64> {
        (0..self.timesteps.len()).filter_map(|t| self.get(t, global_id, k)).collect()
    }
}

struct RunState {
    program: Program,
    timesteps: Vec<Timestep>,
    scenarios: Vec<ScenarioIndex>,
    ledgers: Vec<Ledger>,
    position: usize,
}

pub struct Model {
    store: ParameterStore,
    config: RunConfig,
    state: NetworkState,
    run: Option<RunState>,
}

impl Model {
    pub fn new(store: ParameterStore, config: RunConfig) -> Self {
        Self { store, config, state: NetworkState::new(), run: None }
    }

    pub fn store(&self) -> &ParameterStore { &self.store }

    /// Topology edits fail with `GraphError::Frozen` while set up.
    pub fn store_mut(&mut self) -> &mut ParameterStore { &mut self.store }

    pub fn config(&self) -> &RunConfig { &self.config }
    pub fn state(&self) -> &NetworkState { &self.state }
    pub fn state_mut(&mut self) -> &mut NetworkState { &mut self.state }
    pub fn is_set_up(&self) -> bool { self.run.is_some() }

    /// Sets up the store on the configured grid and rewinds to the first
    /// timestep.
    pub fn setup(&mut self) -> Result<(), ModelError> {
        self.run = None;
        let index = self.config.timestepper.datetime_index()?;
        self.store.setup(&index, &self.config.scenarios)?;
        let program = Compiler::new(&self.store).compile()?;

        let timesteps: Vec<Timestep> = index
            .stamps
            .iter()
            .enumerate()
            .map(|(i, &date)| Timestep { index: i, date, frequency: index.frequency })
            .collect();
        let scenarios = self.config.scenarios.indices();
        let ledgers = (0..scenarios.len()).map(|_| Ledger::with_capacity(program.size)).collect();

        info!(
            timesteps = timesteps.len(),
            scenarios = scenarios.len(),
            state_dependent = program.state_dependent.len(),
            "Model set up"
        );
        self.run = Some(RunState { program, timesteps, scenarios, ledgers, position: 0 });
        Ok(())
    }

    /// Advances one timestep. Returns `None` once the grid is exhausted.
    pub fn step(&mut self, solver: &mut dyn Solver) -> Result<Option<Timestep>, ModelError> {
        let run = self.run.as_mut().ok_or(ModelError::NotSetUp)?;
        let Some(&timestep) = run.timesteps.get(run.position) else {
            return Ok(None);
        };
        let parallel = self.config.parallel;

        Engine::run_all(&run.program, &self.store, &timestep, &run.scenarios, &self.state, &mut run.ledgers, parallel)?;
        solver.solve(&timestep, &run.scenarios, &run.ledgers, &mut self.state)?;
        Engine::refresh_all(&run.program, &self.store, &timestep, &run.scenarios, &self.state, &mut run.ledgers, parallel)?;
        self.store.after(&timestep)?;

        run.position += 1;
        debug!(index = timestep.index, date = %timestep.date, "Timestep complete");
        Ok(Some(timestep))
    }

    /// Sets up and runs the whole grid, recording `targets` after every
    /// timestep.
    pub fn run(&mut self, solver: &mut dyn Solver, targets: &[ParameterId]) -> Result<Recording, ModelError> {
        if let Some(&missing) = targets.iter().find(|&&id| self.store.get(id).is_none()) {
            return Err(GraphError::UnknownParameter(missing).into());
        }
        self.setup()?;

        let mut values = Vec::new();
        let mut timesteps = Vec::new();
        while let Some(timestep) = self.step(solver)? {
            let run = self.run.as_ref().ok_or(ModelError::NotSetUp)?;
            for ledger in &run.ledgers {
                for &id in targets {
                    values.push(ledger.require(id)?);
                }
            }
            timesteps.push(timestep);
        }

        let scenario_count = self.run.as_ref().map_or(0, |r| r.scenarios.len());
        info!(timesteps = timesteps.len(), scenarios = scenario_count, "Run finished");
        Ok(Recording { targets: targets.to_vec(), timesteps, scenario_count, values })
    }

    /// Returns the store to its pre-setup state.
    pub fn reset(&mut self) {
        self.store.reset();
        self.run = None;
    }

    pub fn tuning_problem(&self) -> TuningProblem { TuningProblem::from_store(&self.store) }

    /// Writes a full decision vector into the tunable parameters.
    pub fn update_tunables(&mut self, values: &[f64]) -> Result<(), ModelError> {
        TuningProblem::from_store(&self.store).apply(&mut self.store, values)?;
        Ok(())
    }

    /// Value of `id` for scenario member `global_id` at the last completed
    /// timestep.
    pub fn value(&self, id: ParameterId, global_id: usize) -> Result<f64, ModelError> {
        let run = self.run.as_ref().ok_or(ModelError::NotSetUp)?;
        let ledger = run
            .ledgers
            .get(global_id)
            .ok_or(ModelError::ScenarioOutOfRange { global_id, count: run.ledgers.len() })?;
        Ok(ledger.require(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TimeSeriesFrame;
    use crate::parameters::{
        AggFunc, AggregatedParameter, ConstantParameter, DataFrameParameter, Interp1d, InterpolatedLevelParameter,
        InterpolationKind, MonthlyProfileParameter,
    };
    use crate::scenario::{Scenario, ScenarioCollection};
    use crate::timestep::{date, Frequency, Timestepper};
    use rstest::rstest;

    fn daily_config(days: u32, scenarios: Vec<Scenario>, parallel: bool) -> RunConfig {
        let mut config = RunConfig::new(Timestepper::new(date(2000, 1, 1), date(2000, 1, days), Frequency::Days(1)));
        config.scenarios = ScenarioCollection::new(scenarios);
        config.parallel = parallel;
        config
    }

    #[test]
    fn test_state_refresh_after_solve() {
        let mut store = ParameterStore::new();
        let interp = Interp1d::new(vec![0.0, 100.0], vec![0.0, 10.0], InterpolationKind::Linear, true).unwrap();
        let level = store.insert(InterpolatedLevelParameter::new("res", interp), None).unwrap();
        let one = store.wrap_constant(1.0).unwrap();
        let total = store.insert(AggregatedParameter::new([level, one], AggFunc::Sum), None).unwrap();

        let mut model = Model::new(store, daily_config(3, vec![Scenario::new("s", 2)], false));
        model.state_mut().set_volumes("res", vec![0.0, 0.0]);

        let mut solver = |ts: &Timestep,
                          scenarios: &[ScenarioIndex],
                          _: &[Ledger],
                          state: &mut NetworkState|
         -> Result<(), ModelError> {
            for si in scenarios {
                let volume = 10.0 * (ts.index + 1) as f64 + 50.0 * si.global_id as f64;
                state.set_volume("res", si.global_id, volume)?;
            }
            Ok(())
        };
        let recording = model.run(&mut solver, &[total, level]).unwrap();

        assert_eq!(recording.timesteps().len(), 3);
        assert_eq!(recording.get(0, 0, 0), Some(2.0));
        assert_eq!(recording.get(1, 1, 0), Some(8.0));
        assert_eq!(recording.series(0, 1), vec![1.0, 2.0, 3.0]);
        assert_eq!(recording.get(3, 0, 0), None);
        assert_eq!(model.value(total, 1).unwrap(), 9.0);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_parallel_matches_serial(#[case] parallel: bool) {
        let build = |parallel: bool| {
            let mut store = ParameterStore::new();
            let index: Vec<_> = (1..=5).map(|d| date(2000, 1, d)).collect();
            let frame = TimeSeriesFrame::table(
                index,
                Some(Frequency::Days(1)),
                vec![("a".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]), ("b".into(), vec![10.0, 20.0, 30.0, 40.0, 50.0])],
            )
            .unwrap();
            let df = store.insert(DataFrameParameter::new(frame).with_scenario("s"), None).unwrap();
            let profile = store.insert(MonthlyProfileParameter::new(&[0.5; 12]).unwrap(), None).unwrap();
            let total = store.insert(AggregatedParameter::new([df, profile], AggFunc::Product), None).unwrap();
            (Model::new(store, daily_config(5, vec![Scenario::new("s", 2)], parallel)), total)
        };

        let (mut model, total) = build(parallel);
        let (mut reference, reference_total) = build(!parallel);
        let recording = model.run(&mut NullSolver, &[total]).unwrap();
        assert_eq!(recording, reference.run(&mut NullSolver, &[reference_total]).unwrap());
        assert_eq!(recording.series(1, 0), vec![5.0, 10.0, 15.0, 20.0, 25.0]);
    }

    #[test]
    fn test_tuning_round_trip() {
        let mut store = ParameterStore::new();
        let c = store.insert(ConstantParameter::with_bounds(2.0, 0.0, 10.0), None).unwrap();
        let m = store.insert(MonthlyProfileParameter::new(&[1.0; 12]).unwrap(), None).unwrap();
        let total = store.insert(AggregatedParameter::new([c, m], AggFunc::Sum), None).unwrap();
        let mut model = Model::new(store, daily_config(2, vec![], true));

        let mut x = model.tuning_problem().current().to_vec();
        assert_eq!(x.len(), 13);
        x[0] = 4.0;
        model.update_tunables(&x).unwrap();
        assert_eq!(model.tuning_problem().current(), x.as_slice());

        let recording = model.run(&mut NullSolver, &[total]).unwrap();
        assert_eq!(recording.series(0, 0), vec![5.0, 5.0]);

        let err = model.update_tunables(&x[1..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut store = ParameterStore::new();
        let c = store.wrap_constant(1.0).unwrap();
        let mut model = Model::new(store, daily_config(1, vec![], false));

        assert_eq!(model.step(&mut NullSolver).unwrap_err(), ModelError::NotSetUp);
        assert!(matches!(model.value(c, 0), Err(ModelError::NotSetUp)));

        model.setup().unwrap();
        assert!(model.store().is_frozen());
        assert_eq!(model.step(&mut NullSolver).unwrap().map(|t| t.index), Some(0));
        assert_eq!(model.step(&mut NullSolver).unwrap(), None);
        assert_eq!(
            model.value(c, 3).unwrap_err(),
            ModelError::ScenarioOutOfRange { global_id: 3, count: 1 }
        );

        model.reset();
        assert!(!model.is_set_up());
        assert!(!model.store().is_frozen());

        let err = model.run(&mut NullSolver, &[ParameterId::new(9)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }

    #[test]
    fn test_missing_state_is_runtime_lookup() {
        let mut store = ParameterStore::new();
        let interp = Interp1d::new(vec![0.0, 1.0], vec![0.0, 1.0], InterpolationKind::Linear, true).unwrap();
        let level = store.insert(InterpolatedLevelParameter::new("res", interp), None).unwrap();
        let mut model = Model::new(store, daily_config(1, vec![], false));

        let err = model.run(&mut NullSolver, &[level]).unwrap_err();
        assert!(matches!(err, ModelError::Parameter(ParameterError::Calculation { .. })));
        assert_eq!(err.kind(), ErrorKind::Lookup);
    }
}
