//! Human-readable renderings of an evaluated parameter graph.
pub mod trace;

pub use trace::format_trace;
