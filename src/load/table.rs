use super::{f64_array, optional_str, required, LoadError};
use crate::data::TimeSeriesFrame;
use crate::timestep::{parse_datetime, Frequency};
use serde_json::{Map, Value};

/// Resolves the table part of a declaration into a frame.
pub trait TableSource: Send + Sync {
    fn load(&self, data: &Map<String, Value>) -> Result<TimeSeriesFrame, LoadError>;
}

/// Reads tables embedded in the declaration itself:
///
/// ```json
/// {"index": ["2000-01-01", "2000-01-02"], "values": [1.0, 2.0], "freq": "D"}
/// {"index": [...], "columns": {"a": [...], "b": [...]}}
/// ```
///
/// Column order is declaration order. Without `freq` the frequency is
/// inferred from the index.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineTableSource;

impl TableSource for InlineTableSource {
    fn load(&self, data: &Map<String, Value>) -> Result<TimeSeriesFrame, LoadError> {
        if data.contains_key("url") {
            return Err(LoadError::NotImplemented("Loading tables from a url"));
        }

        let index = required(data, "index")?
            .as_array()
            .ok_or_else(|| LoadError::invalid("index", "an array of dates"))?
            .iter()
            .map(|v| {
                let raw = v.as_str().ok_or_else(|| LoadError::invalid("index", "an array of dates"))?;
                Ok(parse_datetime(raw)?)
            })
            .collect::<Result<Vec<_>, LoadError>>()?;
        let frequency = optional_str(data, "freq")?
            .map(str::parse::<Frequency>)
            .transpose()?;

        if let Some(values) = data.get("values") {
            return Ok(TimeSeriesFrame::series(index, frequency, f64_array(values, "values")?)?);
        }
        let columns = required(data, "columns")?
            .as_object()
            .ok_or_else(|| LoadError::invalid("columns", "an object of number arrays"))?
            .iter()
            .map(|(name, values)| Ok((name.clone(), f64_array(values, "columns")?)))
            .collect::<Result<Vec<_>, LoadError>>()?;
        Ok(TimeSeriesFrame::table(index, frequency, columns)?)
    }
}
