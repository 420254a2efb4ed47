use crate::error::GraphError;
use crate::store::{ParameterId, ParameterStore};
use std::collections::BTreeMap;

/// Keyed parameter slots of a network component (e.g. `"max_flow"`).
///
/// Every entry is a parameter. Raw numbers are wrapped into a new constant
/// parameter on insertion, so consumers never distinguish the two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: BTreeMap<String, ParameterId>,
}

impl Properties {
    pub fn new() -> Self { Self::default() }

    /// Wraps `value` in a constant parameter and stores it under `key`.
    pub fn set_value(
        &mut self,
        store: &mut ParameterStore,
        key: impl Into<String>,
        value: f64,
    ) -> Result<ParameterId, GraphError> {
        let id = store.wrap_constant(value)?;
        self.entries.insert(key.into(), id);
        Ok(id)
    }

    pub fn set_parameter(
        &mut self,
        store: &ParameterStore,
        key: impl Into<String>,
        id: ParameterId,
    ) -> Result<(), GraphError> {
        if store.get(id).is_none() {
            return Err(GraphError::UnknownParameter(id));
        }
        self.entries.insert(key.into(), id);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<ParameterId> { self.entries.get(key).copied() }

    pub fn remove(&mut self, key: &str) -> Option<ParameterId> { self.entries.remove(key) }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ParameterId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ConstantParameter, Parameter};

    #[test]
    fn test_raw_values_become_constants() {
        let mut store = ParameterStore::new();
        let mut props = Properties::new();
        let id = props.set_value(&mut store, "max_flow", 12.5).unwrap();

        assert_eq!(props.get("max_flow"), Some(id));
        assert_eq!(store.get(id).unwrap().type_name(), "constant");
        let tunable = store.get(id).and_then(|p| p.as_tunable()).unwrap();
        assert_eq!(tunable.current_values(), vec![12.5]);
    }

    #[test]
    fn test_existing_parameters_are_stored_as_is() {
        let mut store = ParameterStore::new();
        let existing = store.insert(ConstantParameter::new(1.0), None).unwrap();
        let mut props = Properties::new();
        props.set_parameter(&store, "cost", existing).unwrap();
        assert_eq!(props.iter().collect::<Vec<_>>(), vec![("cost", existing)]);
        assert_eq!(
            props.set_parameter(&store, "cost", ParameterId(99)),
            Err(GraphError::UnknownParameter(ParameterId(99)))
        );
    }
}
