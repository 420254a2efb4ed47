//! Live network state visible to parameters during evaluation.
use crate::error::ParameterError;
use std::collections::HashMap;

/// Current storage volumes, one vector per storage node indexed by scenario
/// `global_id`. Written by the solver between evaluation passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkState {
    volumes: HashMap<String, Vec<f64>>,
}

impl NetworkState {
    pub fn new() -> Self { Self::default() }

    pub fn set_volumes(&mut self, node: impl Into<String>, volumes: Vec<f64>) {
        self.volumes.insert(node.into(), volumes);
    }

    pub fn set_volume(&mut self, node: &str, global_id: usize, volume: f64) -> Result<(), ParameterError> {
        let slot = self
            .volumes
            .get_mut(node)
            .and_then(|v| v.get_mut(global_id))
            .ok_or_else(|| ParameterError::UnknownNode(node.to_string()))?;
        *slot = volume;
        Ok(())
    }

    pub fn volume(&self, node: &str, global_id: usize) -> Result<f64, ParameterError> {
        self.volumes
            .get(node)
            .and_then(|v| v.get(global_id))
            .copied()
            .ok_or_else(|| ParameterError::UnknownNode(node.to_string()))
    }
}
