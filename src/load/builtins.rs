//! `LoadParameter` implementations of the built-in parameter types.
use super::registry::{LoadParameter, TypeRegistry};
use super::RegistryError;
use super::{as_f64, f64_array, optional_bool, optional_f64, optional_str, required, required_f64, required_str};
use super::{LoadError, Loader};
use crate::parameters::{
    AggFunc, AggregatedParameter, ArrayIndexedParameter, ArrayIndexedScenarioParameter, Bounds,
    ConstantParameter, ConstantScenarioParameter, DailyProfileParameter, DataFrameParameter, Interp1d,
    InterpolatedLevelParameter, InterpolationKind, MonthlyProfileParameter, ScaledProfileParameter,
};
use serde_json::{Map, Value};

pub(crate) fn register_all(registry: &mut TypeRegistry) -> Result<(), RegistryError> {
    registry.register::<ConstantParameter>()?;
    registry.register::<MonthlyProfileParameter>()?;
    registry.register::<AggregatedParameter>()?;
    registry.register::<ScaledProfileParameter>()?;
    registry.register::<DataFrameParameter>()?;
    registry.register::<InterpolatedLevelParameter>()?;
    registry.register::<ArrayIndexedParameter>()?;
    registry.register::<ArrayIndexedScenarioParameter>()?;
    registry.register::<ConstantScenarioParameter>()?;
    registry.register::<DailyProfileParameter>()?;
    Ok(())
}

/// Scalar or per-element bounds.
fn bounds(data: &Map<String, Value>, size: usize) -> Result<Bounds, LoadError> {
    let side = |key: &'static str, default: f64| -> Result<Vec<f64>, LoadError> {
        match data.get(key) {
            None => Ok(vec![default; size]),
            Some(v @ Value::Array(_)) => f64_array(v, key),
            Some(v) => Ok(vec![as_f64(v, key)?; size]),
        }
    };
    Ok(Bounds::from_vectors(size, side("lower_bounds", 0.0)?, side("upper_bounds", f64::INFINITY)?)?)
}

impl LoadParameter for ConstantParameter {
    const TYPE_NAME: &'static str = "constant";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let value = required_f64(data, "value")?;
        let lower = optional_f64(data, "lower_bounds")?.unwrap_or(0.0);
        let upper = optional_f64(data, "upper_bounds")?.unwrap_or(f64::INFINITY);
        Ok(Self::with_bounds(value, lower, upper))
    }
}

impl LoadParameter for MonthlyProfileParameter {
    const TYPE_NAME: &'static str = "monthlyprofile";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let values = f64_array(required(data, "values")?, "values")?;
        let Bounds { lower, upper } = bounds(data, Self::SIZE)?;
        Ok(Self::with_bound_vectors(&values, lower, upper)?)
    }
}

impl LoadParameter for AggregatedParameter {
    const TYPE_NAME: &'static str = "aggregated";

    fn load(loader: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        // Checked before any child is inserted into the store.
        let agg_func = match data.get("agg_func") {
            None => AggFunc::default(),
            Some(Value::String(name)) => name.parse().map_err(|_| LoadError::InvalidAggFunc(name.clone()))?,
            Some(other) => return Err(LoadError::InvalidAggFunc(format!("\"{}\" is not callable", other))),
        };
        let decls = match data.get("parameters") {
            None => &[][..],
            Some(decls) => decls.as_array().ok_or_else(|| LoadError::invalid("parameters", "an array"))?.as_slice(),
        };
        let mut parameters = Vec::with_capacity(decls.len());
        for decl in decls {
            parameters.push(loader.load_parameter(decl)?);
        }
        Ok(Self::new(parameters, agg_func))
    }
}

impl LoadParameter for ScaledProfileParameter {
    const TYPE_NAME: &'static str = "scaledprofile";

    fn load(loader: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let scale = required_f64(data, "scale")?;
        let profile = loader.load_parameter(required(data, "profile")?)?;
        Ok(Self::new(scale, profile))
    }
}

impl LoadParameter for DataFrameParameter {
    const TYPE_NAME: &'static str = "dataframe";

    fn load(loader: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        if data.contains_key("scenario") {
            return Err(LoadError::NotImplemented("Loading scenarios for a table"));
        }
        let frame = loader.load_dataframe(data)?;
        let metadata = match data.get("metadata") {
            None => Map::new(),
            Some(Value::Object(m)) => m.clone(),
            Some(_) => return Err(LoadError::invalid("metadata", "an object")),
        };
        Ok(Self::new(frame).with_metadata(metadata))
    }
}

impl LoadParameter for InterpolatedLevelParameter {
    const TYPE_NAME: &'static str = "interpolatedlevel";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let node = required_str(data, "node")?;
        let volumes = f64_array(required(data, "volumes")?, "volumes")?;
        let levels = f64_array(required(data, "levels")?, "levels")?;
        let kind = optional_str(data, "kind")?
            .map(str::parse::<InterpolationKind>)
            .transpose()?
            .unwrap_or_default();
        let bounds_error = optional_bool(data, "bounds_error")?.unwrap_or(true);
        Ok(Self::new(node, Interp1d::new(volumes, levels, kind, bounds_error)?))
    }
}

impl LoadParameter for ArrayIndexedParameter {
    const TYPE_NAME: &'static str = "arrayindexed";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        Ok(Self::new(f64_array(required(data, "values")?, "values")?))
    }
}

impl LoadParameter for ArrayIndexedScenarioParameter {
    const TYPE_NAME: &'static str = "arrayindexedscenario";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let scenario = required_str(data, "scenario")?;
        let rows = required(data, "values")?
            .as_array()
            .ok_or_else(|| LoadError::invalid("values", "an array of rows"))?
            .iter()
            .map(|row| f64_array(row, "values"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(scenario, rows))
    }
}

impl LoadParameter for ConstantScenarioParameter {
    const TYPE_NAME: &'static str = "constantscenario";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        let scenario = required_str(data, "scenario")?;
        Ok(Self::new(scenario, f64_array(required(data, "values")?, "values")?))
    }
}

impl LoadParameter for DailyProfileParameter {
    const TYPE_NAME: &'static str = "dailyprofile";

    fn load(_: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError> {
        Ok(Self::new(f64_array(required(data, "values")?, "values")?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::load::InlineTableSource;
    use crate::parameters::Parameter;
    use crate::store::ParameterStore;
    use serde_json::json;

    fn load_one(store: &mut ParameterStore, decl: Value) -> Result<crate::store::ParameterId, LoadError> {
        let registry = TypeRegistry::with_builtins().unwrap();
        Loader::new(store, &registry, &InlineTableSource).load_parameter(&decl)
    }

    #[test]
    fn test_tunable_bounds_from_declaration() {
        let mut store = ParameterStore::new();
        let (zeros, twos) = (vec![0.0; 12], vec![2.0; 12]);
        let id = load_one(
            &mut store,
            json!({"type": "monthlyprofile", "values": zeros, "lower_bounds": 1.0, "upper_bounds": twos}),
        )
        .unwrap();
        let tunable = store.get(id).and_then(|p| p.as_tunable()).unwrap();
        assert_eq!(tunable.lower_bounds(), &[1.0; 12]);
        assert_eq!(tunable.upper_bounds(), &[2.0; 12]);

        let short = vec![0.0; 11];
        let err = load_one(&mut store, json!({"type": "monthlyprofile", "values": short})).unwrap_err();
        assert!(matches!(err, LoadError::Parameter(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_bad_agg_func_loads_no_children() {
        let mut store = ParameterStore::new();
        let err = load_one(
            &mut store,
            json!({"type": "aggregated", "agg_func": "median", "parameters": [1.5, {"type": "constant", "value": 2.0}]}),
        )
        .unwrap_err();
        assert_eq!(err, LoadError::InvalidAggFunc("median".into()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_dataframe_declaration() {
        let mut store = ParameterStore::new();
        let decl = json!({
            "type": "dataframe",
            "index": ["2000-01-01", "2000-01-02"],
            "values": [1.0, 2.0],
            "metadata": {"source": "gauge 12"}
        });
        let id = load_one(&mut store, decl).unwrap();
        assert_eq!(store.get(id).unwrap().type_name(), "dataframe");

        let err = load_one(
            &mut store,
            json!({"type": "dataframe", "scenario": "inflow", "index": ["2000-01-01"], "values": [1.0]}),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::NotImplemented(_)));
        assert_eq!(err.kind(), ErrorKind::CapabilityGap);
    }

    #[test]
    fn test_interpolated_level_declaration() {
        let mut store = ParameterStore::new();
        let id = load_one(
            &mut store,
            json!({"type": "InterpolatedLevelParameter", "node": "res", "volumes": [0, 10], "levels": [1, 2], "kind": "nearest"}),
        )
        .unwrap();
        assert!(store.get(id).unwrap().reads_network_state());

        let err = load_one(
            &mut store,
            json!({"type": "interpolatedlevel", "node": "res", "volumes": [10, 0], "levels": [1, 2]}),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Interpolation(_)));
    }
}
