//! Collapse a dataset into one array with a `variable` dimension.

use chrono::{DateTime, Utc};
use ndarray::{Array5, Axis};

use nwp_grid::Dataset;

use crate::error::{StoreError, StoreResult};

/// Name of the stacked array.
pub const ARRAY_NAME: &str = "UKV";

/// A dataset collapsed into a single `(variable, init_time, step, y, x)`
/// array, the layout persisted artifacts use. A single chunk then holds
/// every variable for one time/step slice, which is the common read pattern.
#[derive(Debug)]
pub struct StackedDataset {
    /// Variable names along axis 0, in merge order.
    pub variables: Vec<String>,
    /// Initialisation times along axis 1.
    pub init_times: Vec<DateTime<Utc>>,
    pub steps: Vec<u32>,
    pub y: Vec<f64>,
    pub x: Vec<f64>,
    pub values: Array5<f32>,
}

impl StackedDataset {
    pub fn shape(&self) -> [u64; 5] {
        let d = self.values.dim();
        [d.0 as u64, d.1 as u64, d.2 as u64, d.3 as u64, d.4 as u64]
    }

    /// Chunk shape: one chunk per init time and step, half-height and
    /// half-width spatial tiles, every variable together.
    pub fn chunk_shape(&self) -> [u64; 5] {
        let d = self.values.dim();
        [
            (d.0 as u64).max(1),
            1,
            1,
            (d.3 as u64 / 2).max(1),
            (d.4 as u64 / 2).max(1),
        ]
    }
}

/// Stack every variable of `dataset` along a new leading `variable` axis and
/// rename the temporal axis to `init_time`.
pub fn stack(dataset: &Dataset) -> StoreResult<StackedDataset> {
    if dataset.variables.is_empty() {
        return Err(StoreError::EmptyDataset);
    }

    let views: Vec<_> = dataset.variables.iter().map(|v| v.values.view()).collect();
    let values = ndarray::stack(Axis(0), &views).map_err(|e| StoreError::Shape(e.to_string()))?;

    Ok(StackedDataset {
        variables: dataset.variables.iter().map(|v| v.name.clone()).collect(),
        init_times: dataset.times.clone(),
        steps: dataset.steps.clone(),
        y: dataset.y.clone(),
        x: dataset.x.clone(),
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::Array4;
    use nwp_grid::DataVariable;

    fn dataset() -> Dataset {
        Dataset {
            times: vec![Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()],
            steps: vec![0, 3],
            y: vec![2.0, 1.0],
            x: vec![10.0, 20.0, 30.0],
            variables: vec![
                DataVariable {
                    name: "t".to_string(),
                    values: Array4::from_elem((1, 2, 2, 3), 1.0),
                },
                DataVariable {
                    name: "vis".to_string(),
                    values: Array4::from_elem((1, 2, 2, 3), 2.0),
                },
            ],
        }
    }

    #[test]
    fn stacks_variables_along_leading_axis() {
        let stacked = stack(&dataset()).unwrap();
        assert_eq!(stacked.variables, vec!["t", "vis"]);
        assert_eq!(stacked.values.dim(), (2, 1, 2, 2, 3));
        assert_eq!(stacked.values[[0, 0, 0, 0, 0]], 1.0);
        assert_eq!(stacked.values[[1, 0, 1, 1, 2]], 2.0);
    }

    #[test]
    fn chunking_keeps_variables_together() {
        let stacked = stack(&dataset()).unwrap();
        assert_eq!(stacked.chunk_shape(), [2, 1, 1, 1, 1]);
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let ds = Dataset {
            times: vec![],
            steps: vec![],
            y: vec![],
            x: vec![],
            variables: vec![],
        };
        assert!(matches!(stack(&ds), Err(StoreError::EmptyDataset)));
    }
}
