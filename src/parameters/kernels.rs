//! Leaf kernels: parameters that only look up precomputed data by timestep
//! and/or scenario member.
use super::{Inputs, Parameter, SetupContext};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::timestep::Timestep;

/// A named scenario axis resolved to its position at setup.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioBinding {
    name: String,
    position: Option<usize>,
}

impl ScenarioBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), position: None }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Resolves the axis and checks it has `members` members.
    pub fn resolve(&mut self, ctx: &SetupContext<'_>, members: usize) -> Result<(), ParameterError> {
        let (position, scenario) = ctx
            .scenarios
            .get(&self.name)
            .ok_or_else(|| ParameterError::UnknownScenario(self.name.clone()))?;
        if scenario.size != members {
            return Err(ParameterError::ScenarioSizeMismatch {
                scenario: self.name.clone(),
                size: scenario.size,
                columns: members,
            });
        }
        self.position = Some(position);
        Ok(())
    }

    pub fn member(&self, scenario_index: &ScenarioIndex) -> Result<usize, ParameterError> {
        self.position
            .and_then(|p| scenario_index.indices.get(p).copied())
            .ok_or_else(|| ParameterError::NotSetUp(self.name.clone()))
    }

    pub fn reset(&mut self) { self.position = None; }
}

fn check_series_length(actual: usize, ctx: &SetupContext<'_>) -> Result<(), ParameterError> {
    if actual < ctx.index.len() {
        return Err(ParameterError::SeriesLength { expected: ctx.index.len(), actual });
    }
    Ok(())
}

/// One value per timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayIndexedParameter {
    values: Vec<f64>,
}

impl ArrayIndexedParameter {
    pub fn new(values: Vec<f64>) -> Self { Self { values } }
    pub fn values(&self) -> &[f64] { &self.values }
}

impl Parameter for ArrayIndexedParameter {
    fn type_name(&self) -> &'static str { "arrayindexed" }

    fn value(&self, timestep: &Timestep, _: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        self.values
            .get(timestep.index)
            .copied()
            .ok_or(ParameterError::SeriesLength { expected: timestep.index + 1, actual: self.values.len() })
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), ParameterError> {
        check_series_length(self.values.len(), ctx)
    }
}

/// One value per (timestep, member of one scenario axis).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayIndexedScenarioParameter {
    scenario: ScenarioBinding,
    /// Row per timestep, column per scenario member.
    values: Vec<Vec<f64>>,
}

impl ArrayIndexedScenarioParameter {
    pub fn new(scenario: impl Into<String>, values: Vec<Vec<f64>>) -> Self {
        Self { scenario: ScenarioBinding::new(scenario), values }
    }

    fn width(&self) -> usize { self.values.first().map_or(0, Vec::len) }
}

impl Parameter for ArrayIndexedScenarioParameter {
    fn type_name(&self) -> &'static str { "arrayindexedscenario" }

    fn value(&self, timestep: &Timestep, scenario_index: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        let member = self.scenario.member(scenario_index)?;
        self.values
            .get(timestep.index)
            .and_then(|row| row.get(member))
            .copied()
            .ok_or(ParameterError::SeriesLength { expected: timestep.index + 1, actual: self.values.len() })
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), ParameterError> {
        check_series_length(self.values.len(), ctx)?;
        let width = self.width();
        if let Some(row) = self.values.iter().find(|row| row.len() != width) {
            return Err(ParameterError::ScenarioSizeMismatch {
                scenario: self.scenario.name().to_string(),
                size: width,
                columns: row.len(),
            });
        }
        self.scenario.resolve(ctx, width)
    }

    fn reset(&mut self) { self.scenario.reset(); }
}

/// One value per member of one scenario axis, constant in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantScenarioParameter {
    scenario: ScenarioBinding,
    values: Vec<f64>,
}

impl ConstantScenarioParameter {
    pub fn new(scenario: impl Into<String>, values: Vec<f64>) -> Self {
        Self { scenario: ScenarioBinding::new(scenario), values }
    }
}

impl Parameter for ConstantScenarioParameter {
    fn type_name(&self) -> &'static str { "constantscenario" }

    fn value(&self, _: &Timestep, scenario_index: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        let member = self.scenario.member(scenario_index)?;
        self.values
            .get(member)
            .copied()
            .ok_or_else(|| ParameterError::NotSetUp(self.scenario.name().to_string()))
    }

    fn setup(&mut self, ctx: &mut SetupContext<'_>) -> Result<(), ParameterError> {
        self.scenario.resolve(ctx, self.values.len())
    }

    fn reset(&mut self) { self.scenario.reset(); }
}

/// 366 values, one per day of a leap year.
///
/// In non-leap years 29 February is skipped, so a given calendar date maps to
/// the same value every year.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProfileParameter {
    values: Vec<f64>,
}

impl DailyProfileParameter {
    pub const SIZE: usize = 366;

    pub fn new(values: Vec<f64>) -> Result<Self, ParameterError> {
        if values.len() != Self::SIZE {
            return Err(ParameterError::InvalidProfileLength {
                profile: "daily",
                expected: Self::SIZE,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }
}

impl Parameter for DailyProfileParameter {
    fn type_name(&self) -> &'static str { "dailyprofile" }

    fn value(&self, timestep: &Timestep, _: &ScenarioIndex, _: &Inputs<'_>) -> Result<f64, ParameterError> {
        let mut i = (timestep.day_of_year() - 1) as usize;
        // Day 59 (0-based) is 29 Feb in a leap year.
        if !timestep.is_leap_year() && i >= 59 {
            i += 1;
        }
        Ok(self.values[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Ledger;
    use crate::scenario::{Scenario, ScenarioCollection};
    use crate::state::NetworkState;
    use crate::timestep::{date, Frequency, Timestepper};

    fn ts(index: usize, y: i32, m: u32, d: u32) -> Timestep {
        Timestep { index, date: date(y, m, d), frequency: Frequency::Days(1) }
    }

    fn eval(p: &dyn Parameter, t: &Timestep, si: &ScenarioIndex) -> Result<f64, ParameterError> {
        let (ledger, state) = (Ledger::new(), NetworkState::new());
        p.value(t, si, &Inputs::new(&ledger, &state))
    }

    #[test]
    fn test_daily_profile_skips_feb_29_in_common_years() {
        let p = DailyProfileParameter::new((0..366).map(f64::from).collect()).unwrap();
        let si = ScenarioIndex::new(0, vec![]);
        assert_eq!(eval(&p, &ts(0, 2001, 3, 1), &si).unwrap(), 60.0);
        assert_eq!(eval(&p, &ts(0, 2000, 3, 1), &si).unwrap(), 60.0);
        assert_eq!(eval(&p, &ts(0, 2000, 2, 29), &si).unwrap(), 59.0);
        assert_eq!(eval(&p, &ts(0, 2001, 12, 31), &si).unwrap(), 365.0);
        assert!(DailyProfileParameter::new(vec![0.0; 365]).is_err());
    }

    #[test]
    fn test_scenario_kernels_need_setup_and_matching_size() {
        let index = Timestepper::new(date(2000, 1, 1), date(2000, 1, 2), Frequency::Days(1))
            .datetime_index()
            .unwrap();
        let scenarios = ScenarioCollection::new(vec![Scenario::new("inflow", 2)]);
        let si = ScenarioIndex::new(1, vec![1]);

        let mut p = ArrayIndexedScenarioParameter::new("inflow", vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert!(matches!(eval(&p, &ts(0, 2000, 1, 1), &si), Err(ParameterError::NotSetUp(_))));
        p.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap();
        assert_eq!(eval(&p, &ts(1, 2000, 1, 2), &si).unwrap(), 4.0);

        let mut bad = ConstantScenarioParameter::new("inflow", vec![1.0, 2.0, 3.0]);
        let err = bad.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap_err();
        assert!(matches!(err, ParameterError::ScenarioSizeMismatch { size: 2, columns: 3, .. }));
    }

    #[test]
    fn test_array_indexed_must_cover_grid() {
        let index = Timestepper::new(date(2000, 1, 1), date(2000, 1, 3), Frequency::Days(1))
            .datetime_index()
            .unwrap();
        let scenarios = ScenarioCollection::default();
        let mut p = ArrayIndexedParameter::new(vec![1.0, 2.0]);
        let err = p.setup(&mut SetupContext::new(&index, &scenarios, 0)).unwrap_err();
        assert_eq!(err, ParameterError::SeriesLength { expected: 3, actual: 2 });
    }
}
