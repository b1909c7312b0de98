use serde::{Deserialize, Serialize};

use crate::dtype::Float;
use crate::error::{MlError, MlResult};

/// A fixed-length feature vector with an optional scalar label.
///
/// The label is a class id for classifiers (a non-negative integer stored as
/// `T`) or a real-valued target for regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Point<T: Float> {
    features: Vec<T>,
    label: Option<T>,
}

impl<T: Float> Point<T> {
    pub fn new(features: Vec<T>) -> Self {
        Point {
            features,
            label: None,
        }
    }

    pub fn labeled(features: Vec<T>, label: T) -> Self {
        Point {
            features,
            label: Some(label),
        }
    }

    pub fn features(&self) -> &[T] {
        &self.features
    }

    pub fn label(&self) -> Option<T> {
        self.label
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }
}

/// An ordered, immutable collection of points sharing one dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Dataset<T: Float> {
    points: Vec<Point<T>>,
    dim: usize,
}

impl<T: Float> Dataset<T> {
    /// Build a dataset, checking that every point has the same dimensionality.
    pub fn new(points: Vec<Point<T>>) -> MlResult<Self> {
        let dim = points.first().map(Point::dim).unwrap_or(0);
        if let Some(bad) = points.iter().find(|p| p.dim() != dim) {
            return Err(MlError::DimensionMismatch {
                expected: dim,
                got: bad.dim(),
            });
        }
        Ok(Dataset { points, dim })
    }

    /// One-feature labeled dataset from paired `x` / `y` slices.
    pub fn from_xy(xs: &[T], ys: &[T]) -> MlResult<Self> {
        if xs.len() != ys.len() {
            return Err(MlError::DimensionMismatch {
                expected: xs.len(),
                got: ys.len(),
            });
        }
        let points = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| Point::labeled(vec![x], y))
            .collect();
        Dataset::new(points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of features per point (0 for an empty dataset).
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn points(&self) -> &[Point<T>] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&Point<T>> {
        self.points.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point<T>> {
        self.points.iter()
    }

    /// Values of feature `j` across all points.
    pub fn column(&self, j: usize) -> MlResult<Vec<T>> {
        if j >= self.dim {
            return Err(MlError::DimensionMismatch {
                expected: self.dim,
                got: j + 1,
            });
        }
        Ok(self.points.iter().map(|p| p.features[j]).collect())
    }

    /// Real-valued labels; fails on the first unlabeled point.
    pub fn targets(&self) -> MlResult<Vec<T>> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, p)| p.label.ok_or(MlError::MissingLabel { index }))
            .collect()
    }

    /// Labels interpreted as class ids. A label must be a non-negative whole
    /// number that fits in `usize`.
    pub fn class_labels(&self) -> MlResult<Vec<usize>> {
        self.points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let label = p.label.ok_or(MlError::MissingLabel { index })?;
                let whole = (label - label.round()).abs() <= T::EPSILON;
                let in_range = label >= T::ZERO && label.to_f64() < usize::MAX as f64;
                if !label.is_finite() || !whole || !in_range {
                    return Err(MlError::InvalidLabel { index });
                }
                Ok(label.to_f64().round() as usize)
            })
            .collect()
    }

    /// Per-feature `(min, max)` over all points.
    pub fn feature_bounds(&self) -> Vec<(T, T)> {
        let mut bounds = vec![(T::INFINITY, T::NEG_INFINITY); self.dim];
        for p in &self.points {
            for (b, &v) in bounds.iter_mut().zip(&p.features) {
                b.0 = b.0.min(v);
                b.1 = b.1.max(v);
            }
        }
        bounds
    }

    /// Fail with `InvalidHyperparameter` when there are no points.
    pub fn require_non_empty(&self) -> MlResult<()> {
        if self.is_empty() {
            return Err(MlError::invalid("dataset", "dataset is empty"));
        }
        Ok(())
    }
}

impl<'a, T: Float> IntoIterator for &'a Dataset<T> {
    type Item = &'a Point<T>;
    type IntoIter = std::slice::Iter<'a, Point<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
