//! Parameter arena and its handles.
pub mod registry;
pub mod types;

pub use registry::ParameterStore;
pub use types::{ParameterId, ParameterMetadata};
