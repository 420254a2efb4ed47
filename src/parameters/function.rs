use super::{Inputs, Parameter};
use crate::error::ParameterError;
use crate::scenario::ScenarioIndex;
use crate::store::ParameterId;
use crate::timestep::Timestep;
use std::fmt;
use std::sync::Arc;

pub type ParameterFn =
    Arc<dyn Fn(&Inputs<'_>, &Timestep, &ScenarioIndex) -> Result<f64, ParameterError> + Send + Sync>;

/// A user closure over declared dependencies.
///
/// The closure may only read the ids listed in `dependencies`; anything else
/// is not guaranteed to be computed yet and fails with `NotEvaluated`.
#[derive(Clone)]
pub struct FunctionParameter {
    dependencies: Vec<ParameterId>,
    func: ParameterFn,
}

impl FunctionParameter {
    pub fn new(
        dependencies: impl IntoIterator<Item = ParameterId>,
        func: impl Fn(&Inputs<'_>, &Timestep, &ScenarioIndex) -> Result<f64, ParameterError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self { dependencies: dependencies.into_iter().collect(), func: Arc::new(func) }
    }
}

impl fmt::Debug for FunctionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionParameter")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl Parameter for FunctionParameter {
    fn type_name(&self) -> &'static str { "function" }

    fn children(&self) -> Vec<ParameterId> { self.dependencies.clone() }

    fn value(&self, timestep: &Timestep, scenario_index: &ScenarioIndex, inputs: &Inputs<'_>) -> Result<f64, ParameterError> {
        (self.func)(inputs, timestep, scenario_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::Ledger;
    use crate::state::NetworkState;
    use crate::timestep::{date, Frequency};

    #[test]
    fn test_closure_reads_dependencies_and_calendar() {
        let a = ParameterId(3);
        let p = FunctionParameter::new([a], move |inputs, ts, si| {
            Ok(inputs.value(a)? * f64::from(ts.month()) + si.global_id as f64)
        });
        let mut ledger = Ledger::new();
        ledger.insert(a, 2.0);
        let state = NetworkState::new();
        let ts = Timestep { index: 0, date: date(2000, 4, 1), frequency: Frequency::Days(1) };

        let v = p.value(&ts, &ScenarioIndex::new(1, vec![1]), &Inputs::new(&ledger, &state)).unwrap();
        assert_eq!(v, 9.0);
        assert_eq!(p.children(), vec![a]);
    }
}
