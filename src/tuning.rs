//! Flattens every tunable parameter into one decision vector.
use crate::error::ParameterError;
use crate::store::{ParameterId, ParameterStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    id: ParameterId,
    offset: usize,
    size: usize,
}

/// The tunable parameters of a store, in id order, laid out end to end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TuningProblem {
    segments: Vec<Segment>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    current: Vec<f64>,
}

impl TuningProblem {
    pub fn from_store(store: &ParameterStore) -> Self {
        let mut problem = Self::default();
        for (id, tunable) in store.tunables() {
            let offset = problem.lower.len();
            problem.segments.push(Segment { id, offset, size: tunable.size() });
            problem.lower.extend_from_slice(tunable.lower_bounds());
            problem.upper.extend_from_slice(tunable.upper_bounds());
            problem.current.extend(tunable.current_values());
        }
        problem
    }

    /// Length of the decision vector.
    pub fn len(&self) -> usize { self.lower.len() }
    pub fn is_empty(&self) -> bool { self.lower.is_empty() }

    pub fn lower_bounds(&self) -> &[f64] { &self.lower }
    pub fn upper_bounds(&self) -> &[f64] { &self.upper }

    /// Values at the time the problem was built.
    pub fn current(&self) -> &[f64] { &self.current }

    pub fn parameters(&self) -> impl Iterator<Item = ParameterId> + '_ {
        self.segments.iter().map(|s| s.id)
    }

    /// Writes a full decision vector back into the store.
    pub fn apply(&self, store: &mut ParameterStore, values: &[f64]) -> Result<(), ParameterError> {
        if values.len() != self.len() {
            return Err(ParameterError::InvalidUpdateLength { expected: self.len(), actual: values.len() });
        }
        for segment in &self.segments {
            let tunable = store
                .tunable_mut(segment.id)
                .ok_or(ParameterError::UnknownParameter(segment.id))?;
            tunable.update(&values[segment.offset..segment.offset + segment.size])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ConstantParameter, MonthlyProfileParameter, ScaledProfileParameter};

    #[test]
    fn test_layout_and_apply() {
        let mut store = ParameterStore::new();
        let c = store.insert(ConstantParameter::with_bounds(5.0, 1.0, 10.0), None).unwrap();
        let m = store.insert(MonthlyProfileParameter::new(&[0.5; 12]).unwrap(), None).unwrap();
        store.insert(ScaledProfileParameter::new(2.0, m), None).unwrap();

        let problem = TuningProblem::from_store(&store);
        assert_eq!(problem.len(), 13);
        assert_eq!(problem.parameters().collect::<Vec<_>>(), vec![c, m]);
        assert_eq!(problem.lower_bounds()[0], 1.0);
        assert_eq!(problem.upper_bounds()[1], f64::INFINITY);
        assert_eq!(problem.current()[0], 5.0);

        let mut x = problem.current().to_vec();
        x[0] = 7.0;
        x[12] = 3.0;
        problem.apply(&mut store, &x).unwrap();
        assert_eq!(TuningProblem::from_store(&store).current(), x.as_slice());

        assert_eq!(
            problem.apply(&mut store, &x[..12]),
            Err(ParameterError::InvalidUpdateLength { expected: 13, actual: 12 })
        );
    }
}
