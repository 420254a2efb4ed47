//! Maps declarative type names to parameter constructors.
use super::error::{LoadError, RegistryError};
use super::Loader;
use crate::parameters::Parameter;
use serde_json::{Map, Value};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

pub type Constructor = fn(&mut Loader<'_>, &Map<String, Value>) -> Result<Box<dyn Parameter>, LoadError>;

/// A parameter type that can be built from a declaration object.
pub trait LoadParameter: Parameter + Sized + 'static {
    /// Registry key, before normalisation.
    const TYPE_NAME: &'static str;

    fn load(loader: &mut Loader<'_>, data: &Map<String, Value>) -> Result<Self, LoadError>;
}

fn construct<P: LoadParameter>(
    loader: &mut Loader<'_>,
    data: &Map<String, Value>,
) -> Result<Box<dyn Parameter>, LoadError> {
    Ok(Box::new(P::load(loader, data)?))
}

/// Lowercases and strips a trailing `parameter`, so `"MonthlyProfileParameter"`,
/// `"monthlyprofile"` and `"monthlyProfile"` are one key.
pub fn normalise(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix("parameter") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => lower,
    }
}

#[derive(Clone, Copy)]
struct Entry {
    type_id: TypeId,
    rust_name: &'static str,
    constructor: Constructor,
}

#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, e)| (k, e.rust_name)))
            .finish()
    }
}

impl TypeRegistry {
    pub fn new() -> Self { Self::default() }

    /// A registry holding every built-in loadable type.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        super::builtins::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Registers `P` under its normalised `TYPE_NAME`. Registering the same
    /// type twice is a no-op; a different type under a taken name is an error.
    pub fn register<P: LoadParameter>(&mut self) -> Result<(), RegistryError> {
        let name = normalise(P::TYPE_NAME);
        let entry = Entry { type_id: TypeId::of::<P>(), rust_name: type_name::<P>(), constructor: construct::<P> };
        match self.entries.get(&name) {
            Some(existing) if existing.type_id == entry.type_id => Ok(()),
            Some(existing) => Err(RegistryError::Conflict { name, existing: existing.rust_name, new: entry.rust_name }),
            None => {
                self.entries.insert(name, entry);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Constructor> {
        self.entries.get(&normalise(name)).map(|e| e.constructor)
    }

    pub fn contains(&self, name: &str) -> bool { self.entries.contains_key(&normalise(name)) }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{AggregatedParameter, ConstantParameter};
    use rstest::rstest;

    #[rstest]
    #[case("ConstantParameter", "constant")]
    #[case("monthlyProfile", "monthlyprofile")]
    #[case("aggregated", "aggregated")]
    #[case("Parameter", "parameter")]
    fn test_normalise(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalise(raw), expected);
    }

    #[derive(Debug)]
    struct Impostor;

    impl Parameter for Impostor {
        fn type_name(&self) -> &'static str { "constant" }
        fn value(
            &self,
            _: &crate::timestep::Timestep,
            _: &crate::scenario::ScenarioIndex,
            _: &crate::parameters::Inputs<'_>,
        ) -> Result<f64, crate::error::ParameterError> {
            Ok(0.0)
        }
    }

    impl LoadParameter for Impostor {
        const TYPE_NAME: &'static str = "ConstantParameter";
        fn load(_: &mut Loader<'_>, _: &Map<String, Value>) -> Result<Self, LoadError> { Ok(Self) }
    }

    #[test]
    fn test_registration_conflicts() {
        let mut registry = TypeRegistry::with_builtins().unwrap();
        assert!(registry.contains("Aggregated"));
        assert_eq!(registry.register::<ConstantParameter>(), Ok(()));
        assert_eq!(registry.register::<AggregatedParameter>(), Ok(()));
        assert!(matches!(registry.register::<Impostor>(), Err(RegistryError::Conflict { .. })));
    }

    #[test]
    fn test_builtins_refuse_a_taken_name() {
        let mut registry = TypeRegistry::new();
        registry.register::<Impostor>().unwrap();
        let err = crate::load::builtins::register_all(&mut registry).unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { ref name, .. } if name == "constant"));
    }
}
