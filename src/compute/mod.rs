//! Per-timestep evaluation of the parameter graph.
pub mod engine;
pub mod ledger;
pub mod program;

pub use engine::Engine;
pub use ledger::Ledger;
pub use program::{Compiler, Program};
