use super::ledger::Ledger;
use super::program::Program;
use crate::error::ParameterError;
use crate::parameters::Inputs;
use crate::scenario::ScenarioIndex;
use crate::state::NetworkState;
use crate::store::{ParameterId, ParameterStore};
use crate::timestep::Timestep;
use rayon::prelude::*;

pub struct Engine;

impl Engine {
    /// Evaluates every scheduled parameter for one scenario.
    pub fn run(
        program: &Program,
        store: &ParameterStore,
        timestep: &Timestep,
        scenario_index: &ScenarioIndex,
        state: &NetworkState,
        ledger: &mut Ledger,
    ) -> Result<(), ParameterError> {
        ledger.ensure_capacity(program.size);
        ledger.clear();
        Self::evaluate(&program.order, store, timestep, scenario_index, state, ledger)
    }

    /// Recomputes the state-dependent part of an already evaluated ledger.
    pub fn refresh(
        program: &Program,
        store: &ParameterStore,
        timestep: &Timestep,
        scenario_index: &ScenarioIndex,
        state: &NetworkState,
        ledger: &mut Ledger,
    ) -> Result<(), ParameterError> {
        ledger.invalidate(program.state_dependent.iter().copied());
        Self::evaluate(&program.state_dependent, store, timestep, scenario_index, state, ledger)
    }

    /// Runs `run` for the whole ensemble, one ledger per scenario.
    pub fn run_all(
        program: &Program,
        store: &ParameterStore,
        timestep: &Timestep,
        scenarios: &[ScenarioIndex],
        state: &NetworkState,
        ledgers: &mut [Ledger],
        parallel: bool,
    ) -> Result<(), ParameterError> {
        Self::for_each_scenario(scenarios, ledgers, parallel, |si, ledger| {
            Self::run(program, store, timestep, si, state, ledger)
        })
    }

    pub fn refresh_all(
        program: &Program,
        store: &ParameterStore,
        timestep: &Timestep,
        scenarios: &[ScenarioIndex],
        state: &NetworkState,
        ledgers: &mut [Ledger],
        parallel: bool,
    ) -> Result<(), ParameterError> {
        if program.state_dependent.is_empty() {
            return Ok(());
        }
        Self::for_each_scenario(scenarios, ledgers, parallel, |si, ledger| {
            Self::refresh(program, store, timestep, si, state, ledger)
        })
    }

    fn for_each_scenario<F>(
        scenarios: &[ScenarioIndex],
        ledgers: &mut [Ledger],
        parallel: bool,
        f: F,
    ) -> Result<(), ParameterError>
    where
        F: Fn(&ScenarioIndex, &mut Ledger) -> Result<(), ParameterError> + Sync,
    {
        if parallel {
            scenarios
                .par_iter()
                .zip(ledgers.par_iter_mut())
                .try_for_each(|(si, ledger)| f(si, ledger))
        } else {
            scenarios
                .iter()
                .zip(ledgers.iter_mut())
                .try_for_each(|(si, ledger)| f(si, ledger))
        }
    }

    fn evaluate(
        ids: &[ParameterId],
        store: &ParameterStore,
        timestep: &Timestep,
        scenario_index: &ScenarioIndex,
        state: &NetworkState,
        ledger: &mut Ledger,
    ) -> Result<(), ParameterError> {
        for &id in ids {
            let parameter = store.get(id).ok_or(ParameterError::UnknownParameter(id))?;
            let value = parameter
                .value(timestep, scenario_index, &Inputs::new(ledger, state))
                .map_err(|e| ParameterError::Calculation {
                    name: store.name(id).unwrap_or_default().to_string(),
                    source: Box::new(e),
                })?;
            ledger.insert(id, value);
        }
        Ok(())
    }
}
