use crate::error::GraphError;
use crate::store::{ParameterId, ParameterStore};
use std::collections::{HashSet, VecDeque};

/// Performs a Topological Sort using Depth-First Search (DFS).
///
/// Returns every parameter so that each one appears after all of its
/// children. DFS post-order keeps a deep chain `a <- b <- c` contiguous in the
/// result, which keeps the ledger reads of one chain close together.
pub fn sort(store: &ParameterStore) -> Result<Vec<ParameterId>, GraphError> {
    let count = store.len();
    let mut order = Vec::with_capacity(count);
    let mut state = vec![VisitState::None; count];

    // Iterate every slot so that disconnected parameters are included.
    for i in 0..count {
        if state[i] == VisitState::None {
            visit(ParameterId::new(i), store, &mut state, &mut order)?;
        }
    }

    Ok(order)
}

#[derive(Clone, PartialEq, Eq)]
enum VisitState {
    None,
    Visiting, // Used for cycle detection
    Visited,
}

fn visit(
    node: ParameterId,
    store: &ParameterStore,
    state: &mut Vec<VisitState>,
    order: &mut Vec<ParameterId>,
) -> Result<(), GraphError> {
    let idx = node.index();
    if idx >= state.len() {
        return Err(GraphError::UnknownParameter(node));
    }

    match state[idx] {
        VisitState::Visited => return Ok(()),
        VisitState::Visiting => return Err(GraphError::CycleDetected(node)),
        VisitState::None => state[idx] = VisitState::Visiting,
    }

    for child in store.children(node)? {
        visit(child, store, state, order)?;
    }

    state[idx] = VisitState::Visited;
    order.push(node);
    Ok(())
}

/// Every parameter that reads any of `start_nodes`, directly or not,
/// including the start nodes themselves.
pub fn downstream_from(store: &ParameterStore, start_nodes: &[ParameterId]) -> HashSet<ParameterId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            if let Ok(parents) = store.parents(node) {
                queue.extend(parents.iter().copied());
            }
        }
    }
    visited
}

/// Every parameter any of `start_nodes` depends on, including the start
/// nodes themselves.
pub fn upstream_from(store: &ParameterStore, start_nodes: &[ParameterId]) -> HashSet<ParameterId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.insert(node) {
            if let Ok(children) = store.children(node) {
                queue.extend(children);
            }
        }
    }
    visited
}
