//! External tables and their alignment onto the model grid.
pub mod align;
pub mod frame;

pub use align::{align_and_resample, AlignmentError};
pub use frame::{FrameError, TimeSeriesFrame};
