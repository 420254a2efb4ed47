//! ledger.rs
//! Per-scenario store of parameter values for one timestep.

use crate::error::ParameterError;
use crate::store::ParameterId;

/// Dense slot per parameter. `None` means "not computed for this timestep".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    values: Vec<Option<f64>>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(size: usize) -> Self {
        Self { values: vec![None; size] }
    }

    pub fn ensure_capacity(&mut self, size: usize) {
        if self.values.len() < size {
            self.values.resize(size, None);
        }
    }

    #[inline(always)]
    pub fn get(&self, id: ParameterId) -> Option<f64> {
        self.values.get(id.index()).copied().flatten()
    }

    /// Like `get`, but a missing value is an evaluation-order error.
    pub fn require(&self, id: ParameterId) -> Result<f64, ParameterError> {
        self.get(id).ok_or(ParameterError::NotEvaluated(id))
    }

    #[inline(always)]
    pub fn insert(&mut self, id: ParameterId, value: f64) {
        let idx = id.index();
        if idx >= self.values.len() {
            self.values.resize(idx + 1, None);
        }
        self.values[idx] = Some(value);
    }

    pub fn invalidate(&mut self, ids: impl IntoIterator<Item = ParameterId>) {
        for id in ids {
            if let Some(slot) = self.values.get_mut(id.index()) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|slot| *slot = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_grows_and_invalidate_clears() {
        let mut ledger = Ledger::new();
        ledger.insert(ParameterId(3), 1.5);
        assert_eq!(ledger.get(ParameterId(3)), Some(1.5));
        assert_eq!(ledger.get(ParameterId(1)), None);

        ledger.invalidate([ParameterId(3), ParameterId(10)]);
        assert_eq!(ledger.get(ParameterId(3)), None);
        assert_eq!(ledger.require(ParameterId(3)), Err(ParameterError::NotEvaluated(ParameterId(3))));
    }
}
