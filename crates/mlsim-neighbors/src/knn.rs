use std::cmp::Ordering;
use std::collections::BTreeMap;

use mlsim_core::{Dataset, DistanceMetric, Float, MlError, MlResult};
use serde::{Deserialize, Serialize};

/// One of the k closest training points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Neighbor<T: Float> {
    /// Position in the training dataset.
    pub index: usize,
    pub distance: T,
    pub label: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct KnnPrediction<T: Float> {
    pub label: usize,
    /// Nearest first.
    pub neighbors: Vec<Neighbor<T>>,
    /// `(label, count)` ascending by label.
    pub votes: Vec<(usize, usize)>,
}

/// K-Nearest Neighbors over a labeled training set.
///
/// Nothing is learned ahead of time: every query ranks the whole training set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    pub k: usize,
    pub metric: DistanceMetric,
}

impl KnnClassifier {
    pub fn new(k: usize) -> Self {
        KnnClassifier {
            k,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// `1 <= k <= n_train`.
    pub fn validate(&self, n_train: usize) -> MlResult<()> {
        validate_k(self.k, n_train)
    }

    /// The k nearest training points to `query`, sorted by distance.
    /// Equal distances keep training-set order.
    pub fn neighbors<T: Float>(
        &self,
        train: &Dataset<T>,
        query: &[T],
    ) -> MlResult<Vec<Neighbor<T>>> {
        self.validate(train.len())?;
        check_query(train, query)?;
        let labels = train.class_labels()?;
        let mut ranked: Vec<Neighbor<T>> = train
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(index, (point, label))| Neighbor {
                index,
                distance: self.metric.distance(point.features(), query),
                label,
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        ranked.truncate(self.k);
        Ok(ranked)
    }

    /// Majority label among the k nearest points. When several labels share
    /// the top count, the one owning the nearest neighbor wins.
    pub fn predict<T: Float>(
        &self,
        train: &Dataset<T>,
        query: &[T],
    ) -> MlResult<KnnPrediction<T>> {
        let neighbors = self.neighbors(train, query)?;

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for n in &neighbors {
            *counts.entry(n.label).or_insert(0) += 1;
        }
        let top = counts.values().copied().max().unwrap_or(0);
        let label = neighbors
            .iter()
            .map(|n| n.label)
            .find(|l| counts.get(l) == Some(&top))
            .unwrap_or(0);

        log::trace!("knn: k={} votes={:?} -> {}", self.k, counts, label);
        Ok(KnnPrediction {
            label,
            neighbors,
            votes: counts.into_iter().collect(),
        })
    }

    pub fn predict_all<T: Float>(
        &self,
        train: &Dataset<T>,
        queries: &Dataset<T>,
    ) -> MlResult<Vec<usize>> {
        queries
            .iter()
            .map(|q| self.predict(train, q.features()).map(|p| p.label))
            .collect()
    }

    /// Fraction of `test` points whose label matches the prediction.
    pub fn accuracy<T: Float>(&self, train: &Dataset<T>, test: &Dataset<T>) -> MlResult<T> {
        test.require_non_empty()?;
        let truth = test.class_labels()?;
        let predicted = self.predict_all(train, test)?;
        let correct = truth.iter().zip(&predicted).filter(|(a, b)| a == b).count();
        Ok(T::from_usize(correct) / T::from_usize(truth.len()))
    }
}

/// K-Nearest Neighbors regression: the mean target of the k nearest points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnnRegressor {
    pub k: usize,
    pub metric: DistanceMetric,
}

impl KnnRegressor {
    pub fn new(k: usize) -> Self {
        KnnRegressor {
            k,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// `1 <= k <= n_train`.
    pub fn validate(&self, n_train: usize) -> MlResult<()> {
        validate_k(self.k, n_train)
    }

    pub fn predict<T: Float>(&self, train: &Dataset<T>, query: &[T]) -> MlResult<T> {
        self.validate(train.len())?;
        check_query(train, query)?;
        let targets = train.targets()?;
        let mut ranked: Vec<(T, T)> = train
            .iter()
            .zip(targets)
            .map(|(p, y)| (self.metric.distance(p.features(), query), y))
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        let sum: T = ranked.iter().take(self.k).map(|&(_, y)| y).sum();
        Ok(sum / T::from_usize(self.k))
    }
}

fn validate_k(k: usize, n_train: usize) -> MlResult<()> {
    if k == 0 || k > n_train {
        return Err(MlError::invalid(
            "k",
            format!("must be in 1..={}, got {}", n_train, k),
        ));
    }
    Ok(())
}

fn check_query<T: Float>(train: &Dataset<T>, query: &[T]) -> MlResult<()> {
    if query.len() != train.dim() {
        return Err(MlError::DimensionMismatch {
            expected: train.dim(),
            got: query.len(),
        });
    }
    Ok(())
}
