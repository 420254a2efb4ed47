//! Fits an external table onto the simulation grid.
use super::frame::TimeSeriesFrame;
use crate::error::ErrorKind;
use crate::timestep::{DatetimeIndex, Frequency};
use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Table starts ({first}) after the model starts ({start})")]
    StartsAfter { first: NaiveDateTime, start: NaiveDateTime },
    #[error("Table ends ({last}) before the model ends ({end})")]
    EndsBefore { last: NaiveDateTime, end: NaiveDateTime },
    #[error("Table is not aligned with the model start: first stamp in range is {first}, expected {start}")]
    Misaligned { first: NaiveDateTime, start: NaiveDateTime },
    #[error("Grid period starting {0} contains no table samples")]
    EmptyPeriod(NaiveDateTime),
    #[error("Model grid is empty")]
    EmptyGrid,
    #[error("Upsampling a table from {source_frequency} to {target} not implemented")]
    Upsampling { source_frequency: Frequency, target: Frequency },
}

impl AlignmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Upsampling { .. } => ErrorKind::CapabilityGap,
            _ => ErrorKind::Configuration,
        }
    }
}

/// Returns a frame indexed exactly by `grid`, one row per grid stamp.
///
/// The source is sliced to `[start, end]` of the grid, then row `i` is the
/// mean of every sliced sample in `[t_i, t_{i+1})`. The last row only sees
/// samples up to `end`. The source must cover the grid and be at least as
/// fine as it.
pub fn align_and_resample(
    frame: &TimeSeriesFrame,
    grid: &DatetimeIndex,
) -> Result<TimeSeriesFrame, AlignmentError> {
    let (start, end) = match (grid.first(), grid.last()) {
        (Some(s), Some(e)) => (s, e),
        _ => return Err(AlignmentError::EmptyGrid),
    };

    if frame.first_stamp() > start {
        return Err(AlignmentError::StartsAfter { first: frame.first_stamp(), start });
    }
    if frame.last_stamp() < end {
        return Err(AlignmentError::EndsBefore { last: frame.last_stamp(), end });
    }
    if !frame.frequency().is_finer_or_equal(&grid.frequency) {
        return Err(AlignmentError::Upsampling {
            source_frequency: frame.frequency(),
            target: grid.frequency,
        });
    }

    // The slice is `[start, end]`; the last period ends at `end` inclusive.
    let stamps = frame.index();
    let lo = stamps.partition_point(|t| *t < start);
    let hi = stamps.partition_point(|t| *t <= end);
    if stamps[lo] != start {
        return Err(AlignmentError::Misaligned { first: stamps[lo], start });
    }

    let mut columns = vec![Vec::with_capacity(grid.len()); frame.column_count()];
    let mut row = lo;
    for (i, period_start) in grid.stamps.iter().enumerate() {
        let first = row;
        match grid.stamps.get(i + 1) {
            Some(&period_end) => {
                while row < hi && stamps[row] < period_end {
                    row += 1;
                }
            }
            None => row = hi,
        }
        if row == first {
            return Err(AlignmentError::EmptyPeriod(*period_start));
        }
        let count = (row - first) as f64;
        for (c, out) in columns.iter_mut().enumerate() {
            let source = frame.column(c).unwrap_or_default();
            out.push(source[first..row].iter().sum::<f64>() / count);
        }
    }

    debug!(
        rows_in = hi - lo,
        rows_out = grid.len(),
        from = %frame.frequency(),
        to = %grid.frequency,
        "Aligned table onto model grid"
    );

    Ok(TimeSeriesFrame::from_parts(
        grid.stamps.clone(),
        grid.frequency,
        frame.column_names().to_vec(),
        columns,
    ))
}
