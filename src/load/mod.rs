//! Declarative (JSON) construction of parameter graphs.
//!
//! A declaration is a number (wrapped into a constant), a string naming an
//! already loaded parameter, or an object whose `type` selects a constructor
//! from the `TypeRegistry`. Objects may carry a `name` and a `comment`.
pub mod builtins;
pub mod error;
pub mod registry;
pub mod table;

pub use error::{LoadError, RegistryError};
pub use registry::{normalise, Constructor, LoadParameter, TypeRegistry};
pub use table::{InlineTableSource, TableSource};

use crate::data::TimeSeriesFrame;
use crate::store::{ParameterId, ParameterStore};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

pub struct Loader<'a> {
    store: &'a mut ParameterStore,
    registry: &'a TypeRegistry,
    tables: &'a dyn TableSource,
    /// Named declarations not loaded yet; resolved on first reference.
    pending: HashMap<String, Value>,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a mut ParameterStore, registry: &'a TypeRegistry, tables: &'a dyn TableSource) -> Self {
        Self { store, registry, tables, pending: HashMap::new() }
    }

    pub fn store(&self) -> &ParameterStore { self.store }

    /// Loads one declaration and returns the id of the resulting parameter.
    pub fn load_parameter(&mut self, data: &Value) -> Result<ParameterId, LoadError> {
        match data {
            Value::Number(n) => {
                let value = n.as_f64().ok_or_else(|| LoadError::InvalidDeclaration(n.to_string()))?;
                Ok(self.store.wrap_constant(value)?)
            }
            Value::String(name) => self.resolve_reference(name),
            Value::Object(map) => self.load_object(map, None),
            other => Err(LoadError::InvalidDeclaration(other.to_string())),
        }
    }

    /// Loads a map of `name -> declaration`. Declarations may reference each
    /// other by name in any order.
    pub fn load_parameters(&mut self, data: &Map<String, Value>) -> Result<Vec<ParameterId>, LoadError> {
        self.pending.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
        let mut ids = Vec::with_capacity(data.len());
        for name in data.keys() {
            ids.push(self.resolve_reference(name)?);
        }
        Ok(ids)
    }

    pub fn load_dataframe(&self, data: &Map<String, Value>) -> Result<TimeSeriesFrame, LoadError> {
        self.tables.load(data)
    }

    fn resolve_reference(&mut self, name: &str) -> Result<ParameterId, LoadError> {
        if let Some(id) = self.store.by_name(name) {
            return Ok(id);
        }
        let data = self
            .pending
            .remove(name)
            .ok_or_else(|| LoadError::UnknownReference(name.to_string()))?;
        match data {
            Value::Object(map) => self.load_object(&map, Some(name)),
            Value::Number(n) => {
                let value = n.as_f64().ok_or_else(|| LoadError::InvalidDeclaration(n.to_string()))?;
                Ok(self.store.insert(crate::parameters::ConstantParameter::new(value), Some(name))?)
            }
            other => Err(LoadError::InvalidDeclaration(other.to_string())),
        }
    }

    fn load_object(&mut self, data: &Map<String, Value>, name: Option<&str>) -> Result<ParameterId, LoadError> {
        let type_name = required_str(data, "type")?;
        let constructor = self
            .registry
            .get(type_name)
            .ok_or_else(|| LoadError::UnknownType(type_name.to_string()))?;
        let name = match name {
            Some(n) => Some(n.to_string()),
            None => optional_str(data, "name")?.map(str::to_string),
        };
        let comment = optional_str(data, "comment")?.map(str::to_string);

        let parameter = constructor(self, data)?;
        let id = self.store.insert_boxed(parameter, name.as_deref(), comment)?;
        debug!(id = %id, kind = type_name, "Loaded parameter");
        Ok(id)
    }
}

pub(crate) fn required<'v>(data: &'v Map<String, Value>, key: &'static str) -> Result<&'v Value, LoadError> {
    data.get(key).ok_or(LoadError::MissingKey(key))
}

pub(crate) fn required_str<'v>(data: &'v Map<String, Value>, key: &'static str) -> Result<&'v str, LoadError> {
    required(data, key)?.as_str().ok_or_else(|| LoadError::invalid(key, "a string"))
}

pub(crate) fn optional_str<'v>(data: &'v Map<String, Value>, key: &'static str) -> Result<Option<&'v str>, LoadError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| LoadError::invalid(key, "a string")),
    }
}

pub(crate) fn as_f64(value: &Value, key: &str) -> Result<f64, LoadError> {
    value.as_f64().ok_or_else(|| LoadError::invalid(key, "a number"))
}

pub(crate) fn required_f64(data: &Map<String, Value>, key: &'static str) -> Result<f64, LoadError> {
    as_f64(required(data, key)?, key)
}

pub(crate) fn optional_f64(data: &Map<String, Value>, key: &'static str) -> Result<Option<f64>, LoadError> {
    data.get(key).map(|v| as_f64(v, key)).transpose()
}

pub(crate) fn f64_array(value: &Value, key: &str) -> Result<Vec<f64>, LoadError> {
    value
        .as_array()
        .ok_or_else(|| LoadError::invalid(key, "an array of numbers"))?
        .iter()
        .map(|v| as_f64(v, key))
        .collect()
}

pub(crate) fn optional_bool(data: &Map<String, Value>, key: &'static str) -> Result<Option<bool>, LoadError> {
    data.get(key)
        .map(|v| v.as_bool().ok_or_else(|| LoadError::invalid(key, "a boolean")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scenario::ScenarioIndex;
    use crate::state::NetworkState;
    use crate::timestep::{date, Frequency, Timestep};
    use serde_json::json;

    fn ts(m: u32) -> Timestep {
        Timestep { index: 0, date: date(2001, m, 1), frequency: Frequency::Days(1) }
    }

    fn eval(store: &ParameterStore, id: ParameterId, t: &Timestep) -> f64 {
        store.value(id, t, &ScenarioIndex::new(0, vec![]), &NetworkState::new()).unwrap()
    }

    #[test]
    fn test_numbers_strings_and_objects() {
        let mut store = ParameterStore::new();
        let registry = TypeRegistry::with_builtins().unwrap();
        let mut loader = Loader::new(&mut store, &registry, &InlineTableSource);

        let c = loader.load_parameter(&json!(3.5)).unwrap();
        let named = loader.load_parameter(&json!({"type": "constant", "value": 2.0, "name": "two"})).unwrap();
        let by_ref = loader.load_parameter(&json!("two")).unwrap();
        assert_eq!(named, by_ref);

        let agg = loader
            .load_parameter(&json!({
                "type": "AggregatedParameter",
                "agg_func": "sum",
                "parameters": [1.5, "two", {"type": "scaledprofile", "scale": 2.0, "profile": 0.25}]
            }))
            .unwrap();
        assert_eq!(eval(&store, agg, &ts(1)), 4.0);
        assert_eq!(eval(&store, c, &ts(1)), 3.5);
    }

    #[test]
    fn test_named_declarations_resolve_in_any_order() {
        let mut store = ParameterStore::new();
        let registry = TypeRegistry::with_builtins().unwrap();
        let mut loader = Loader::new(&mut store, &registry, &InlineTableSource);
        let decls = json!({
            "demand": {"type": "scaledprofile", "scale": 10.0, "profile": "profile"},
            "profile": {"type": "monthlyprofile", "values": [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]}
        });
        let ids = loader.load_parameters(decls.as_object().unwrap()).unwrap();

        assert_eq!(store.name(ids[0]), Some("demand"));
        assert_eq!(eval(&store, ids[0], &ts(3)), 30.0);
    }

    #[test]
    fn test_load_errors() {
        let mut store = ParameterStore::new();
        let registry = TypeRegistry::with_builtins().unwrap();
        let mut loader = Loader::new(&mut store, &registry, &InlineTableSource);

        let err = loader.load_parameter(&json!("missing")).unwrap_err();
        assert_eq!(err, LoadError::UnknownReference("missing".into()));
        assert_eq!(err.kind(), ErrorKind::Lookup);

        let err = loader.load_parameter(&json!({"type": "nope"})).unwrap_err();
        assert_eq!(err, LoadError::UnknownType("nope".into()));

        let err = loader.load_parameter(&json!({"type": "aggregated", "agg_func": 3})).unwrap_err();
        assert!(matches!(err, LoadError::InvalidAggFunc(_)));

        let err = loader.load_parameter(&json!({"type": "aggregated", "agg_func": "median"})).unwrap_err();
        assert!(matches!(err, LoadError::InvalidAggFunc(_)));

        let err = loader.load_parameter(&json!({"type": "scaledprofile", "profile": 1.0})).unwrap_err();
        assert_eq!(err, LoadError::MissingKey("scale"));

        let err = loader.load_parameter(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDeclaration(_)));
    }
}
