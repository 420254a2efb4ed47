//! Graph analysis over the parameter store.
pub mod topology;
