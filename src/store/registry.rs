use super::types::*;
use crate::analysis::topology;
use crate::compute::{Compiler, Engine, Ledger};
use crate::error::{GraphError, ParameterError};
use crate::parameters::{ConstantParameter, Parameter, SetupContext, Tunable};
use crate::scenario::{ScenarioCollection, ScenarioIndex};
use crate::state::NetworkState;
use crate::timestep::{DatetimeIndex, Timestep};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

#[derive(Debug)]
struct Slot {
    parameter: Box<dyn Parameter>,
    meta: ParameterMetadata,
    /// Parameters that read this one.
    parents: BTreeSet<ParameterId>,
}

/// Arena owning every parameter of a model.
///
/// Edges are owned by the parameters themselves (`Parameter::children`); the
/// store mirrors them as parent sets so that consumers can be found without
/// scanning. Topology may only change while the store is not set up.
#[derive(Debug, Default)]
pub struct ParameterStore {
    slots: Vec<Slot>,
    names: HashMap<String, ParameterId>,
    /// Slots below this index were inserted by the user; the rest were
    /// generated during setup.
    built_len: usize,
    frozen: bool,
    /// Evaluation order, children first. Valid while frozen.
    order: Vec<ParameterId>,
}

impl ParameterStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.slots.len() }
    pub fn is_empty(&self) -> bool { self.slots.is_empty() }
    pub fn is_frozen(&self) -> bool { self.frozen }

    pub fn insert<P: Parameter + 'static>(
        &mut self,
        parameter: P,
        name: Option<&str>,
    ) -> Result<ParameterId, GraphError> {
        self.insert_boxed(Box::new(parameter), name, None)
    }

    /// Inserts a parameter whose children must already be in the store.
    ///
    /// Unnamed parameters are named after their type (`constant`,
    /// `constant_1`, ...). An explicit name that is taken is an error.
    pub fn insert_boxed(
        &mut self,
        parameter: Box<dyn Parameter>,
        name: Option<&str>,
        comment: Option<String>,
    ) -> Result<ParameterId, GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        let children = parameter.children();
        if let Some(&missing) = children.iter().find(|c| c.index() >= self.slots.len()) {
            return Err(GraphError::UnknownParameter(missing));
        }
        let name = match name {
            Some(n) if self.names.contains_key(n) => return Err(GraphError::DuplicateName(n.to_string())),
            Some(n) => n.to_string(),
            None => self.unique_name(parameter.type_name()),
        };

        let id = self.push(parameter, ParameterMetadata { name, comment, generated: false }, &children);
        self.built_len = self.slots.len();
        Ok(id)
    }

    /// Wraps a raw number into a new constant parameter.
    pub fn wrap_constant(&mut self, value: f64) -> Result<ParameterId, GraphError> {
        self.insert(ConstantParameter::new(value), None)
    }

    fn unique_name(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while self.names.contains_key(&candidate) {
            candidate = format!("{}_{}", base, counter);
            counter += 1;
        }
        candidate
    }

    fn push(&mut self, parameter: Box<dyn Parameter>, meta: ParameterMetadata, children: &[ParameterId]) -> ParameterId {
        let id = ParameterId::new(self.slots.len());
        for child in children {
            self.slots[child.index()].parents.insert(id);
        }
        self.names.insert(meta.name.clone(), id);
        self.slots.push(Slot { parameter, meta, parents: BTreeSet::new() });
        id
    }

    fn slot(&self, id: ParameterId) -> Result<&Slot, GraphError> {
        self.slots.get(id.index()).ok_or(GraphError::UnknownParameter(id))
    }

    pub fn get(&self, id: ParameterId) -> Option<&dyn Parameter> {
        self.slots.get(id.index()).map(|s| s.parameter.as_ref())
    }

    pub fn metadata(&self, id: ParameterId) -> Option<&ParameterMetadata> {
        self.slots.get(id.index()).map(|s| &s.meta)
    }

    pub fn name(&self, id: ParameterId) -> Option<&str> {
        self.metadata(id).map(|m| m.name.as_str())
    }

    pub fn by_name(&self, name: &str) -> Option<ParameterId> { self.names.get(name).copied() }

    pub fn ids(&self) -> impl Iterator<Item = ParameterId> + '_ {
        (0..self.slots.len()).map(ParameterId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, &dyn Parameter)> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| (ParameterId::new(i), s.parameter.as_ref()))
    }

    pub fn children(&self, id: ParameterId) -> Result<Vec<ParameterId>, GraphError> {
        Ok(self.slot(id)?.parameter.children())
    }

    pub fn parents(&self, id: ParameterId) -> Result<&BTreeSet<ParameterId>, GraphError> {
        Ok(&self.slot(id)?.parents)
    }

    /// Adds `child` to a collection parameter. Returns `false` if it was
    /// already a member.
    pub fn add_child(&mut self, parent: ParameterId, child: ParameterId) -> Result<bool, GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        self.slot(parent)?;
        self.slot(child)?;
        if topology::upstream_from(self, &[child]).contains(&parent) {
            return Err(GraphError::CycleDetected(parent));
        }
        let added = self.slots[parent.index()].parameter.add_child(child)?;
        if added {
            self.slots[child.index()].parents.insert(parent);
        }
        Ok(added)
    }

    pub fn remove_child(&mut self, parent: ParameterId, child: ParameterId) -> Result<(), GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen);
        }
        self.slot(parent)?;
        self.slot(child)?;
        if !self.slots[parent.index()].parameter.remove_child(child)? {
            return Err(ParameterError::ChildNotFound { parent, child }.into());
        }
        self.slots[child.index()].parents.remove(&parent);
        Ok(())
    }

    /// Sets up every parameter, children first, and freezes the topology.
    ///
    /// A store that is already set up is reset first. On failure every
    /// generated kernel is dropped again and the store is left reset.
    pub fn setup(&mut self, index: &DatetimeIndex, scenarios: &ScenarioCollection) -> Result<(), GraphError> {
        if self.frozen {
            self.reset();
        }
        let order = topology::sort(self)?;
        for id in order {
            if let Err(e) = self.setup_one(id, index, scenarios) {
                self.reset();
                return Err(e);
            }
        }
        self.order = match topology::sort(self) {
            Ok(order) => order,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        self.frozen = true;
        info!(
            parameters = self.built_len,
            generated = self.slots.len() - self.built_len,
            "Parameter graph set up"
        );
        Ok(())
    }

    fn setup_one(
        &mut self,
        id: ParameterId,
        index: &DatetimeIndex,
        scenarios: &ScenarioCollection,
    ) -> Result<(), GraphError> {
        let next_id = self.slots.len();
        let mut ctx = SetupContext::new(index, scenarios, next_id);
        let slot = &mut self.slots[id.index()];
        slot.parameter
            .setup(&mut ctx)
            .map_err(|source| GraphError::Setup { name: slot.meta.name.clone(), source })?;

        // All spawned kernels take their reserved ids before any of them is
        // set up, since setting one up may spawn more.
        let mut generated = Vec::new();
        for kernel in ctx.into_spawned() {
            let children = kernel.children();
            if let Some(&missing) = children.iter().find(|c| c.index() >= self.slots.len()) {
                return Err(GraphError::UnknownParameter(missing));
            }
            let name = self.unique_name(&format!("{}.{}", self.slots[id.index()].meta.name, kernel.type_name()));
            let meta = ParameterMetadata { name, comment: None, generated: true };
            let kernel_id = self.push(kernel, meta, &children);
            self.slots[kernel_id.index()].parents.insert(id);
            debug!(owner = %id, kernel = %kernel_id, "Generated kernel");
            generated.push(kernel_id);
        }
        for kernel_id in generated {
            self.setup_one(kernel_id, index, scenarios)?;
        }
        Ok(())
    }

    /// Calls `after` on every parameter, children first.
    pub fn after(&mut self, timestep: &Timestep) -> Result<(), GraphError> {
        for &id in &self.order {
            let slot = &mut self.slots[id.index()];
            slot.parameter
                .after(timestep)
                .map_err(|e| ParameterError::Calculation { name: slot.meta.name.clone(), source: Box::new(e) })?;
        }
        Ok(())
    }

    /// Returns every parameter to its pre-setup state and unfreezes the
    /// topology. Safe to call on a store that was never set up.
    pub fn reset(&mut self) {
        let generated = self.slots.len() - self.built_len;
        for slot in self.slots.drain(self.built_len..) {
            self.names.remove(&slot.meta.name);
        }
        let built_len = self.built_len;
        for slot in &mut self.slots {
            slot.parents.retain(|p| p.index() < built_len);
            slot.parameter.reset();
        }
        self.order.clear();
        self.frozen = false;
        debug!(dropped = generated, "Parameter graph reset");
    }

    /// Evaluation order, children first. Empty unless set up.
    pub fn order(&self) -> &[ParameterId] { &self.order }

    /// Evaluates `id` and everything it depends on for one (timestep,
    /// scenario) without touching any run state.
    pub fn value(
        &self,
        id: ParameterId,
        timestep: &Timestep,
        scenario_index: &ScenarioIndex,
        state: &NetworkState,
    ) -> Result<f64, GraphError> {
        let program = Compiler::compile_for(self, &[id])?;
        let mut ledger = Ledger::with_capacity(self.len());
        Engine::run(&program, self, timestep, scenario_index, state, &mut ledger)?;
        Ok(ledger.require(id)?)
    }

    pub fn tunables(&self) -> impl Iterator<Item = (ParameterId, &dyn Tunable)> + '_ {
        self.iter().filter_map(|(id, p)| p.as_tunable().map(|t| (id, t)))
    }

    pub fn tunable_mut(&mut self, id: ParameterId) -> Option<&mut dyn Tunable> {
        self.slots.get_mut(id.index()).and_then(|s| s.parameter.as_tunable_mut())
    }
}
