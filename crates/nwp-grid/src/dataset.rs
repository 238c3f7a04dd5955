//! Dataset containers shared by the loader, aggregator and downstream stages.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3, Array4};

use crate::error::{GridError, GridResult};

/// One field from a single grid file: a named variable over `(step, y, x)`.
#[derive(Debug, Clone)]
pub struct GridVariable {
    pub name: String,
    /// Coordinate name of the fixed surface the field sits on,
    /// e.g. `heightAboveGround`.
    pub level_coordinate: String,
    pub values: Array3<f32>,
}

/// Contents of one decoded grid file, aligned on common dimensions.
///
/// Owned by the aggregator until folded into a [`DatasetBuilder`], then
/// dropped to bound peak memory.
#[derive(Debug, Clone)]
pub struct LoadedGrid {
    /// Forecast-run initialisation time.
    pub reference_time: DateTime<Utc>,
    /// Forecast lead times in hours, ascending.
    pub steps: Vec<u32>,
    /// Row coordinate (latitude), in storage order.
    pub latitudes: Vec<f64>,
    /// Column coordinate (longitude), in storage order.
    pub longitudes: Vec<f64>,
    pub variables: Vec<GridVariable>,
}

/// One variable in a merged dataset, over `(time, step, y, x)`.
#[derive(Debug, Clone)]
pub struct DataVariable {
    pub name: String,
    pub values: Array4<f32>,
}

/// A merged dataset: every variable shares the same coordinate vectors.
///
/// Before spatial normalisation `y`/`x` hold latitudes and longitudes; after
/// it they hold northings and eastings on the fixed target grid. Cells no
/// source file covered are NaN.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Initialisation times, ascending.
    pub times: Vec<DateTime<Utc>>,
    /// Lead times in hours, ascending.
    pub steps: Vec<u32>,
    pub y: Vec<f64>,
    pub x: Vec<f64>,
    /// Variables in first-merged order.
    pub variables: Vec<DataVariable>,
}

impl Dataset {
    pub fn variable(&self, name: &str) -> Option<&DataVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Accumulates 2-D field slices keyed by `(variable, time, step)` and
/// materialises them into one [`Dataset`] on NaN-filled, union coordinates.
///
/// Inserting the same `(variable, time, step)` twice keeps the later slice.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    y: Option<Vec<f64>>,
    x: Option<Vec<f64>>,
    times: BTreeSet<DateTime<Utc>>,
    steps: BTreeSet<u32>,
    /// Variable names in first-inserted order.
    order: Vec<String>,
    slices: HashMap<String, HashMap<(DateTime<Utc>, u32), Array2<f32>>>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the spatial coordinates, or verify they match the ones already
    /// set. Every folded grid must live on the same `(y, x)` grid.
    pub fn set_grid(&mut self, y: &[f64], x: &[f64]) -> GridResult<()> {
        match (&self.y, &self.x) {
            (None, _) | (_, None) => {
                self.y = Some(y.to_vec());
                self.x = Some(x.to_vec());
                Ok(())
            }
            (Some(have_y), Some(have_x)) => {
                if !coords_match(have_y, y) || !coords_match(have_x, x) {
                    return Err(GridError::IncompatibleGrids(format!(
                        "grid {}x{} does not match established grid {}x{}",
                        y.len(),
                        x.len(),
                        have_y.len(),
                        have_x.len()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Insert one 2-D slice. Last write wins on duplicate coordinates.
    pub fn insert(
        &mut self,
        variable: &str,
        time: DateTime<Utc>,
        step: u32,
        values: Array2<f32>,
    ) -> GridResult<()> {
        if let (Some(y), Some(x)) = (&self.y, &self.x) {
            if values.dim() != (y.len(), x.len()) {
                return Err(GridError::IncompatibleGrids(format!(
                    "slice {:?} does not match grid ({}, {})",
                    values.dim(),
                    y.len(),
                    x.len()
                )));
            }
        }

        self.times.insert(time);
        self.steps.insert(step);

        if !self.slices.contains_key(variable) {
            self.order.push(variable.to_string());
        }
        self.slices
            .entry(variable.to_string())
            .or_default()
            .insert((time, step), values);

        Ok(())
    }

    pub fn build(mut self) -> Dataset {
        let times: Vec<DateTime<Utc>> = self.times.into_iter().collect();
        let steps: Vec<u32> = self.steps.into_iter().collect();
        let y = self.y.take().unwrap_or_default();
        let x = self.x.take().unwrap_or_default();

        let variables = self
            .order
            .iter()
            .map(|name| {
                let mut values =
                    Array4::<f32>::from_elem((times.len(), steps.len(), y.len(), x.len()), f32::NAN);
                if let Some(slices) = self.slices.remove(name) {
                    for ((time, step), slice) in slices {
                        let ti = times.binary_search(&time).expect("time was recorded");
                        let si = steps.binary_search(&step).expect("step was recorded");
                        values
                            .index_axis_mut(ndarray::Axis(0), ti)
                            .index_axis_mut(ndarray::Axis(0), si)
                            .assign(&slice);
                    }
                }
                DataVariable {
                    name: name.clone(),
                    values,
                }
            })
            .collect();

        Dataset {
            times,
            steps,
            y,
            x,
            variables,
        }
    }
}

fn coords_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(l, r)| (l - r).abs() < 1e-9)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::arr2;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn builds_union_coordinates_with_nan_fill() {
        let mut builder = DatasetBuilder::new();
        builder.set_grid(&[60.0, 59.0], &[-2.0, -1.0]).unwrap();
        builder
            .insert("t", t0(), 0, arr2(&[[1.0, 2.0], [3.0, 4.0]]))
            .unwrap();
        builder
            .insert("t", t0(), 3, arr2(&[[5.0, 6.0], [7.0, 8.0]]))
            .unwrap();
        builder
            .insert("vis", t0(), 0, arr2(&[[9.0, 9.0], [9.0, 9.0]]))
            .unwrap();

        let ds = builder.build();
        assert_eq!(ds.steps, vec![0, 3]);
        assert_eq!(ds.times.len(), 1);

        let t = ds.variable("t").unwrap();
        assert_eq!(t.values.dim(), (1, 2, 2, 2));
        assert_eq!(t.values[[0, 1, 1, 1]], 8.0);

        // vis was never supplied at step 3, so that slice is NaN.
        let vis = ds.variable("vis").unwrap();
        assert_eq!(vis.values[[0, 0, 0, 0]], 9.0);
        assert!(vis.values[[0, 1, 0, 0]].is_nan());
    }

    #[test]
    fn duplicate_insert_keeps_later_value() {
        let mut builder = DatasetBuilder::new();
        builder.set_grid(&[60.0], &[-2.0]).unwrap();
        builder.insert("t", t0(), 0, arr2(&[[1.0]])).unwrap();
        builder.insert("t", t0(), 0, arr2(&[[2.0]])).unwrap();

        let ds = builder.build();
        assert_eq!(ds.variable("t").unwrap().values[[0, 0, 0, 0]], 2.0);
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let mut builder = DatasetBuilder::new();
        builder.set_grid(&[60.0, 59.0], &[-2.0, -1.0]).unwrap();
        let err = builder.set_grid(&[60.0], &[-2.0]).unwrap_err();
        assert!(matches!(err, GridError::IncompatibleGrids(_)));
    }

    #[test]
    fn empty_builder_yields_empty_dataset() {
        let ds = DatasetBuilder::new().build();
        assert!(ds.is_empty());
        assert!(ds.times.is_empty());
    }

    #[test]
    fn variables_keep_insertion_order() {
        let mut builder = DatasetBuilder::new();
        builder.set_grid(&[60.0], &[-2.0]).unwrap();
        builder.insert("vis", t0(), 0, arr2(&[[1.0]])).unwrap();
        builder.insert("t", t0(), 0, arr2(&[[2.0]])).unwrap();

        let ds = builder.build();
        let names: Vec<&str> = ds.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["vis", "t"]);
    }
}
