//! Adapter from an external table to a kernel on the model grid.
use super::kernels::{ArrayIndexedParameter, ArrayIndexedScenarioParameter};
use super::{Inputs, Parameter, SetupContext};
use crate::data::{align_and_resample, TimeSeriesFrame};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::store::ParameterId;
use crate::timestep::Timestep;
use serde_json::{Map, Value};
use tracing::debug;

/// Holds a raw table and, after setup, the kernel that serves it.
///
/// At setup the table is aligned and resampled onto the model grid. A single
/// column becomes an `ArrayIndexedParameter`; several columns need a scenario
/// with one member per column and become an `ArrayIndexedScenarioParameter`
/// (column `i` serves member `i`). The kernel is a generated child owned by
/// this parameter and is dropped again on reset.
#[derive(Debug, Clone)]
pub struct DataFrameParameter {
    frame: TimeSeriesFrame,
    scenario: Option<String>,
    metadata: Map<String, Value>,
    resolved: Option<ParameterId>,
}

impl DataFrameParameter {
    pub fn new(frame: TimeSeriesFrame) -> Self {
        Self { frame, scenario: None, metadata: Map::new(), resolved: None }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn frame(&self) -> &TimeSeriesFrame { &self.frame }
    pub fn scenario(&self) -> Option<&str> { self.scenario.as_deref() }
    pub fn metadata(&self) -> &Map<String, Value> { &self.metadata }
    pub fn resolved(&self) -> Option<ParameterId> { self.resolved }
}

impl Parameter for DataFrameParameter {
    fn type_name(&self) -> &'static str { "dataframe" }

    fn children(&self) -> Vec<ParameterId> { self.resolved.into_iter().collect() }

    fn value(&self, _: &Timestep, _: &ScenarioIndex, inputs: &Inputs<'_>) -> Result<f64, ParameterError> {
        let kernel = self.resolved.ok_or_else(|| ParameterError::NotSetUp(self.type_name().to_string()))?;
        inputs.value(kernel)
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), ParameterError> {
        self.resolved = None;
        let aligned = align_and_resample(&self.frame, ctx.index)?;
        let columns = aligned.column_count();

        let kernel: Box<dyn Parameter> = if columns == 1 {
            Box::new(ArrayIndexedParameter::new(aligned.column(0).unwrap_or_default().to_vec()))
        } else {
            let scenario = self.scenario.as_ref().ok_or(ParameterError::ScenarioRequired { columns })?;
            let (_, s) = ctx
                .scenarios
                .get(scenario)
                .ok_or_else(|| ParameterError::UnknownScenario(scenario.clone()))?;
            if s.size != columns {
                return Err(ParameterError::ScenarioSizeMismatch {
                    scenario: scenario.clone(),
                    size: s.size,
                    columns,
                });
            }
            Box::new(ArrayIndexedScenarioParameter::new(scenario.clone(), aligned.rows()))
        };

        let id = ctx.spawn(kernel);
        debug!(kernel = %id, columns, scenario = ?self.scenario, "Resolved table onto model grid");
        self.resolved = Some(id);
        Ok(())
    }

    fn reset(&mut self) { self.resolved = None; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Ledger;
    use crate::error::ErrorKind;
    use crate::scenario::{Scenario, ScenarioCollection};
    use crate::state::NetworkState;
    use crate::timestep::{date, Frequency, Timestepper};

    fn daily_table(columns: usize, days: usize) -> TimeSeriesFrame {
        let index = (0..days).map(|k| Frequency::Days(1).offset(date(2000, 1, 1), k).unwrap()).collect();
        let columns = (0..columns)
            .map(|c| (format!("c{}", c), (0..days).map(|d| (c * 100 + d) as f64).collect()))
            .collect();
        TimeSeriesFrame::table(index, None, columns).unwrap()
    }

    fn grid() -> crate::timestep::DatetimeIndex {
        Timestepper::new(date(2000, 1, 1), date(2000, 1, 5), Frequency::Days(1))
            .datetime_index()
            .unwrap()
    }

    #[test]
    fn test_single_column_spawns_array_kernel() {
        let index = grid();
        let scenarios = ScenarioCollection::default();
        let mut p = DataFrameParameter::new(daily_table(1, 10));
        let mut ctx = SetupContext::new(&index, &scenarios, 7);
        p.setup(&mut ctx).unwrap();

        assert_eq!(p.resolved(), Some(ParameterId(7)));
        assert_eq!(p.children(), vec![ParameterId(7)]);
        let spawned = ctx.into_spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].type_name(), "arrayindexed");

        p.reset();
        assert!(p.children().is_empty());
    }

    #[test]
    fn test_value_before_setup_fails() {
        let p = DataFrameParameter::new(daily_table(1, 10));
        let (ledger, state) = (Ledger::new(), NetworkState::new());
        let ts = Timestep { index: 0, date: date(2000, 1, 1), frequency: Frequency::Days(1) };
        let err = p.value(&ts, &ScenarioIndex::new(0, vec![]), &Inputs::new(&ledger, &state)).unwrap_err();
        assert!(matches!(err, ParameterError::NotSetUp(_)));
    }

    #[test]
    fn test_multi_column_needs_matching_scenario() {
        let index = grid();
        let scenarios = ScenarioCollection::new(vec![Scenario::new("inflow", 3)]);

        let mut p = DataFrameParameter::new(daily_table(2, 10));
        let err = p.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap_err();
        assert_eq!(err, ParameterError::ScenarioRequired { columns: 2 });

        let mut p = DataFrameParameter::new(daily_table(2, 10)).with_scenario("inflow");
        let err = p.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap_err();
        assert_eq!(err, ParameterError::ScenarioSizeMismatch { scenario: "inflow".into(), size: 3, columns: 2 });
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(p.resolved().is_none());
    }

    #[test]
    fn test_table_starting_late_is_rejected() {
        let index = Timestepper::new(date(1999, 12, 31), date(2000, 1, 5), Frequency::Days(1))
            .datetime_index()
            .unwrap();
        let scenarios = ScenarioCollection::default();
        let mut p = DataFrameParameter::new(daily_table(1, 10));
        let err = p.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap_err();
        assert!(matches!(err, ParameterError::Alignment(_)));
    }
}
