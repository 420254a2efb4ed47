//! Scenario ensemble bookkeeping.
//!
//! Each `Scenario` is one independent axis of variation with `size` members.
//! The ensemble is the cartesian product of all axes; every combination gets
//! a dense `global_id` used to slice per-scenario data and state.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub size: usize,
}

impl Scenario {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self { name: name.into(), size }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenarioIndex {
    pub global_id: usize,
    /// Member index along each scenario axis, in collection order.
    pub indices: Vec<usize>,
}

impl ScenarioIndex {
    pub fn new(global_id: usize, indices: Vec<usize>) -> Self {
        Self { global_id, indices }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioCollection {
    scenarios: Vec<Scenario>,
}

impl ScenarioCollection {
    pub fn new(scenarios: Vec<Scenario>) -> Self { Self { scenarios } }

    pub fn add(&mut self, scenario: Scenario) { self.scenarios.push(scenario); }

    pub fn len(&self) -> usize { self.scenarios.len() }
    pub fn is_empty(&self) -> bool { self.scenarios.is_empty() }

    /// Position and definition of the named scenario.
    pub fn get(&self, name: &str) -> Option<(usize, &Scenario)> {
        self.scenarios.iter().enumerate().find(|(_, s)| s.name == name)
    }

    /// Number of ensemble members. An empty collection is a single run.
    pub fn combination_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.size).product()
    }

    /// Every ensemble member, last axis varying fastest.
    pub fn indices(&self) -> Vec<ScenarioIndex> {
        let total = self.combination_count();
        (0..total)
            .map(|global_id| {
                let mut remainder = global_id;
                let mut indices = vec![0; self.scenarios.len()];
                for (slot, scenario) in indices.iter_mut().zip(&self.scenarios).rev() {
                    *slot = remainder % scenario.size;
                    remainder /= scenario.size;
                }
                ScenarioIndex::new(global_id, indices)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection_is_single_member() {
        let scenarios = ScenarioCollection::default();
        let indices = scenarios.indices();
        assert_eq!(indices, vec![ScenarioIndex::new(0, vec![])]);
    }

    #[test]
    fn test_cartesian_product_order() {
        let scenarios = ScenarioCollection::new(vec![Scenario::new("climate", 2), Scenario::new("demand", 3)]);
        let indices = scenarios.indices();
        assert_eq!(indices.len(), 6);
        assert_eq!(indices[1].indices, vec![0, 1]);
        assert_eq!(indices[3].indices, vec![1, 0]);
        assert_eq!(indices[5].global_id, 5);
        assert_eq!(scenarios.get("demand").map(|(i, s)| (i, s.size)), Some((1, 3)));
    }
}
