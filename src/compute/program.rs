use crate::analysis::topology;
use crate::error::GraphError;
use crate::store::{ParameterId, ParameterStore};
use std::collections::HashSet;

/// Linear evaluation schedule for one timestep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Every scheduled parameter, children first.
    pub order: Vec<ParameterId>,
    /// Parameters that read the network state plus everything downstream of
    /// them, in `order` order. Re-evaluated once the solver has written the
    /// state of the current timestep.
    pub state_dependent: Vec<ParameterId>,
    /// Ledger slots needed.
    pub size: usize,
}

pub struct Compiler<'a> {
    store: &'a ParameterStore,
}

impl<'a> Compiler<'a> {
    pub fn new(store: &'a ParameterStore) -> Self {
        Self { store }
    }

    /// Schedules the whole store. Uses the order cached at setup when there
    /// is one.
    pub fn compile(&self) -> Result<Program, GraphError> {
        let order = if self.store.is_frozen() {
            self.store.order().to_vec()
        } else {
            topology::sort(self.store)?
        };
        Ok(self.finish(order))
    }

    /// Schedules only `targets` and what they depend on.
    pub fn compile_for(store: &ParameterStore, targets: &[ParameterId]) -> Result<Program, GraphError> {
        let compiler = Compiler::new(store);
        let needed = topology::upstream_from(store, targets);
        let full = compiler.compile()?;
        let order = full.order.into_iter().filter(|id| needed.contains(id)).collect();
        Ok(compiler.finish(order))
    }

    fn finish(&self, order: Vec<ParameterId>) -> Program {
        let roots: Vec<ParameterId> = order
            .iter()
            .copied()
            .filter(|&id| self.store.get(id).is_some_and(|p| p.reads_network_state()))
            .collect();
        let affected: HashSet<ParameterId> = topology::downstream_from(self.store, &roots);
        let state_dependent = order.iter().copied().filter(|id| affected.contains(id)).collect();
        Program { order, state_dependent, size: self.store.len() }
    }
}
