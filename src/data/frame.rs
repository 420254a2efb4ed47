//! In-memory, regularly indexed table of `f64` columns.
use crate::timestep::Frequency;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("Table has an empty index")]
    EmptyIndex,
    #[error("Table has no columns")]
    NoColumns,
    #[error("Table index is not strictly increasing at position {0}")]
    NotIncreasing(usize),
    #[error("Column '{column}' has {actual} values but the index has {expected}")]
    LengthMismatch { column: String, expected: usize, actual: usize },
    #[error("Table frequency is not given and cannot be inferred from the index")]
    UnknownFrequency,
    #[error("Table index does not follow frequency {frequency} at position {position}")]
    Irregular { frequency: Frequency, position: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesFrame {
    index: Vec<NaiveDateTime>,
    frequency: Frequency,
    names: Vec<String>,
    /// Column-major: `columns[c][row]`.
    columns: Vec<Vec<f64>>,
}

impl TimeSeriesFrame {
    /// A single unnamed series.
    pub fn series(
        index: Vec<NaiveDateTime>,
        frequency: Option<Frequency>,
        values: Vec<f64>,
    ) -> Result<Self, FrameError> {
        Self::table(index, frequency, vec![("value".to_string(), values)])
    }

    /// Named columns sharing one index. Column order is preserved.
    pub fn table(
        index: Vec<NaiveDateTime>,
        frequency: Option<Frequency>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, FrameError> {
        if index.is_empty() {
            return Err(FrameError::EmptyIndex);
        }
        if columns.is_empty() {
            return Err(FrameError::NoColumns);
        }
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(FrameError::NotIncreasing(pos + 1));
        }
        for (name, values) in &columns {
            if values.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    column: name.clone(),
                    expected: index.len(),
                    actual: values.len(),
                });
            }
        }

        let frequency = match frequency {
            Some(f) => f,
            None => Frequency::infer(&index).ok_or(FrameError::UnknownFrequency)?,
        };
        for (position, stamp) in index.iter().enumerate().skip(1) {
            if frequency.offset(index[0], position) != Some(*stamp) {
                return Err(FrameError::Irregular { frequency, position });
            }
        }

        let (names, columns) = columns.into_iter().unzip();
        Ok(Self { index, frequency, names, columns })
    }

    pub(crate) fn from_parts(
        index: Vec<NaiveDateTime>,
        frequency: Frequency,
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Self {
        Self { index, frequency, names, columns }
    }

    pub fn index(&self) -> &[NaiveDateTime] { &self.index }
    pub fn frequency(&self) -> Frequency { self.frequency }
    pub fn column_names(&self) -> &[String] { &self.names }
    pub fn column_count(&self) -> usize { self.columns.len() }
    pub fn row_count(&self) -> usize { self.index.len() }
    pub fn column(&self, c: usize) -> Option<&[f64]> { self.columns.get(c).map(Vec::as_slice) }

    pub fn first_stamp(&self) -> NaiveDateTime { self.index[0] }
    pub fn last_stamp(&self) -> NaiveDateTime { self.index[self.index.len() - 1] }

    /// Row-major copy: `rows[row][column]`.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.row_count())
            .map(|r| self.columns.iter().map(|col| col[r]).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestep::date;

    #[test]
    fn test_rejects_malformed_tables() {
        let idx = vec![date(2000, 1, 1), date(2000, 1, 2)];
        assert_eq!(TimeSeriesFrame::series(vec![], None, vec![]), Err(FrameError::EmptyIndex));
        assert!(matches!(
            TimeSeriesFrame::series(idx.clone(), None, vec![1.0]),
            Err(FrameError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(
            TimeSeriesFrame::series(vec![date(2000, 1, 2), date(2000, 1, 1)], None, vec![1.0, 2.0]),
            Err(FrameError::NotIncreasing(1))
        );
        assert_eq!(
            TimeSeriesFrame::series(vec![date(2000, 1, 1)], None, vec![1.0]),
            Err(FrameError::UnknownFrequency)
        );
        assert!(matches!(
            TimeSeriesFrame::series(idx, Some(Frequency::Days(7)), vec![1.0, 2.0]),
            Err(FrameError::Irregular { position: 1, .. })
        ));
    }

    #[test]
    fn test_rows_are_transposed_columns() {
        let idx = vec![date(2000, 1, 1), date(2000, 1, 2)];
        let frame = TimeSeriesFrame::table(
            idx,
            None,
            vec![("a".into(), vec![1.0, 2.0]), ("b".into(), vec![3.0, 4.0])],
        )
        .unwrap();
        assert_eq!(frame.frequency(), Frequency::Days(1));
        assert_eq!(frame.rows(), vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
        assert_eq!(frame.column_names(), &["a".to_string(), "b".to_string()]);
    }
}
